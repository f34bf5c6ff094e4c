//! End-to-end flows through the public API with fake host devices.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::json;

use favella::{
    ConfigPatch, DiagnosticRelay, DiagnosticSink, Favella, FnSink, SpeakOptions, SpeakOutcome,
    SpeechDevice, SpeechRequest, VoiceDescriptor,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "favella=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Minimal speech device that records every enqueued request.
struct RecordingDevice {
    requests: Arc<Mutex<Vec<SpeechRequest>>>,
    voices: Vec<VoiceDescriptor>,
}

impl RecordingDevice {
    fn new(voices: Vec<VoiceDescriptor>) -> (Self, Arc<Mutex<Vec<SpeechRequest>>>) {
        let requests: Arc<Mutex<Vec<SpeechRequest>>> = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                requests: Arc::clone(&requests),
                voices,
            },
            requests,
        )
    }
}

impl SpeechDevice for RecordingDevice {
    fn enqueue(&mut self, request: SpeechRequest) {
        self.requests.lock().push(request);
    }

    fn pause(&mut self) {}

    fn resume(&mut self) {}

    fn cancel(&mut self) {
        self.requests.lock().clear();
    }

    fn is_speaking(&self) -> bool {
        false
    }

    fn is_pending(&self) -> bool {
        !self.requests.lock().is_empty()
    }

    fn is_paused(&self) -> bool {
        false
    }

    fn voices(&self) -> Vec<VoiceDescriptor> {
        self.voices.clone()
    }
}

#[test]
fn speak_resolves_alice_for_en_us() {
    init_tracing();
    let (device, requests) = RecordingDevice::new(vec![VoiceDescriptor::new("Alice", "en-US")]);
    let mut favella = Favella::builder().speech_device(device).build();

    let outcome = favella.speak("hi", SpeakOptions::new().language_tag("en-US"));

    assert_eq!(outcome, SpeakOutcome::Enqueued);
    let requests = requests.lock();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].voice.name, "Alice");
}

#[test]
fn diagnostics_flow_through_relay_curses_and_sink() {
    init_tracing();
    let (device, requests) = RecordingDevice::new(vec![VoiceDescriptor::new("Alice", "en-US")]);
    let reported: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink_log = Arc::clone(&reported);

    let favella = Favella::builder()
        .speech_device(device)
        .diagnostic_sink(FnSink(move |message: &str| {
            sink_log.lock().push(message.to_string())
        }))
        .curse_seed(3)
        .configure(
            &ConfigPatch::new()
                .with_curses(vec!["Argh".to_string()])
                .with_parental_control(false),
        )
        .build();

    // Splice the relay into a pretend host error channel.
    let shared = Arc::new(Mutex::new(favella));
    let mut relay = DiagnosticRelay::new(Arc::clone(&shared));
    relay.report("Error X");

    assert_eq!(requests.lock()[0].text, "Error X. Argh!");
    assert_eq!(*reported.lock(), vec!["Error X. Argh!".to_string()]);
}

#[test]
fn untyped_setup_blob_is_merged_leniently() {
    init_tracing();
    let (device, requests) = RecordingDevice::new(vec![
        VoiceDescriptor::new("Alice", "en-US"),
        VoiceDescriptor::new("Luca", "it-IT"),
    ]);
    let mut favella = Favella::builder().speech_device(device).build();

    let patch = ConfigPatch::from_value(&json!({
        "speak_defaults": { "language_tag": "it-IT", "rate": "fast", "pitch": 0.5 },
        "curses": 17,
        "parental_control": false,
    }));
    favella.configure(&patch);

    favella.speak("ciao", SpeakOptions::new());

    let requests = requests.lock();
    // The well-formed keys took effect, the malformed ones fell away.
    assert_eq!(requests[0].voice.name, "Luca");
    assert_eq!(requests[0].pitch, 0.5);
    assert_eq!(requests[0].rate, 1.0);
    assert!(favella.config().curses.is_empty());
}

#[test]
fn unknown_language_degrades_once_to_en_us() {
    init_tracing();
    let (device, requests) = RecordingDevice::new(vec![VoiceDescriptor::new("Alice", "en-US")]);
    let mut favella = Favella::builder().speech_device(device).build();

    let outcome = favella.speak("hallo", SpeakOptions::new().language_tag("de-DE"));

    assert_eq!(outcome, SpeakOutcome::Enqueued);
    assert_eq!(requests.lock()[0].voice.name, "Alice");
}
