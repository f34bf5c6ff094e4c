//! The favella speech controller
//!
//! Orchestrates every speak request: merges caller options over the stored
//! defaults, resolves a concrete voice, builds the request, and hands it to
//! the host speech device. Also owns the recognition session, the spoken
//! diagnostics path, and parrot mode.

use crossbeam_channel::{Receiver, TryRecvError};
use std::fmt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{Config, ConfigPatch, SpeakOptions};
use crate::curses::CurseInjector;
use crate::device::{
    RecognitionDevice, RecognitionEvent, RecognitionSettings, SpeechDevice, SpeechEvent,
    SpeechRequest,
};
use crate::diagnostics::{DiagnosticSink, TracingSink};
use crate::mute::MuteTarget;
use crate::voice::{VoiceCatalog, VoiceDescriptor};
use crate::FavellaError;

/// Spoken in place of empty or missing text.
pub const FALLBACK_TEXT: &str = "Something goes wrong";

/// Pitch used when parrot mode repeats a phrase.
const PARROT_PITCH: f32 = 0.1;

/// What became of a `speak()` call.
///
/// Failures are also reported through the caller's `on_error` slot;
/// `speak()` never panics or errors across the public boundary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpeakOutcome {
    /// The request reached the device queue.
    Enqueued,

    /// A mute gate, or a missing speech device, silenced the call.
    Suppressed,

    /// Voice resolution failed; the device was not called.
    Failed(FavellaError),
}

/// Accumulated recognition state delivered to `on_result`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Transcript {
    /// True when no interim text is outstanding.
    pub is_final: bool,

    /// Unconfirmed text that may still be revised.
    pub interim: String,

    /// Everything finalized since the session started.
    pub full: String,

    /// The text newly finalized by this event.
    pub partial: String,
}

pub type TranscriptCallback = Box<dyn FnMut(&Transcript) + Send>;
pub type RecognitionCallback = Box<dyn FnMut(&RecognitionEvent) + Send>;

/// Optional handler slots for a recognition session.
#[derive(Default)]
pub struct ListenHandlers {
    pub on_start: Option<RecognitionCallback>,
    pub on_result: Option<TranscriptCallback>,
    pub on_no_match: Option<RecognitionCallback>,
    pub on_error: Option<RecognitionCallback>,
    pub on_end: Option<RecognitionCallback>,
}

impl fmt::Debug for ListenHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenHandlers")
            .field("on_start", &self.on_start.is_some())
            .field("on_result", &self.on_result.is_some())
            .field("on_no_match", &self.on_no_match.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_end", &self.on_end.is_some())
            .finish()
    }
}

/// Per-call recognition overrides, merged over the stored recognition
/// defaults with the same presence rule `speak()` uses.
#[derive(Debug, Default)]
pub struct ListenOptions {
    pub language_tag: Option<String>,
    pub continuous: Option<bool>,
    pub interim_results: Option<bool>,
    pub handlers: ListenHandlers,
}

impl ListenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn language_tag(mut self, tag: impl Into<String>) -> Self {
        self.language_tag = Some(tag.into());
        self
    }

    pub fn continuous(mut self, continuous: bool) -> Self {
        self.continuous = Some(continuous);
        self
    }

    pub fn interim_results(mut self, interim: bool) -> Self {
        self.interim_results = Some(interim);
        self
    }

    pub fn on_start(mut self, callback: impl FnMut(&RecognitionEvent) + Send + 'static) -> Self {
        self.handlers.on_start = Some(Box::new(callback));
        self
    }

    pub fn on_result(mut self, callback: impl FnMut(&Transcript) + Send + 'static) -> Self {
        self.handlers.on_result = Some(Box::new(callback));
        self
    }

    pub fn on_no_match(mut self, callback: impl FnMut(&RecognitionEvent) + Send + 'static) -> Self {
        self.handlers.on_no_match = Some(Box::new(callback));
        self
    }

    pub fn on_error(mut self, callback: impl FnMut(&RecognitionEvent) + Send + 'static) -> Self {
        self.handlers.on_error = Some(Box::new(callback));
        self
    }

    pub fn on_end(mut self, callback: impl FnMut(&RecognitionEvent) + Send + 'static) -> Self {
        self.handlers.on_end = Some(Box::new(callback));
        self
    }

    fn as_patch(&self) -> crate::config::RecognitionDefaultsPatch {
        crate::config::RecognitionDefaultsPatch {
            language_tag: self.language_tag.clone(),
            continuous: self.continuous,
            interim_results: self.interim_results,
        }
    }
}

/// State of the single active recognition session.
struct ListenSession {
    events: Receiver<RecognitionEvent>,
    handlers: ListenHandlers,
    final_transcript: String,
    interim: String,
}

impl ListenSession {
    /// Fold a segment into the session and produce the transcript snapshot
    /// handed to `on_result`.
    fn ingest(&mut self, text: &str, is_final: bool) -> Transcript {
        if is_final {
            self.final_transcript.push_str(text);
            self.interim.clear();
            Transcript {
                is_final: true,
                interim: String::new(),
                full: self.final_transcript.clone(),
                partial: text.to_string(),
            }
        } else {
            self.interim = text.to_string();
            Transcript {
                is_final: false,
                interim: self.interim.clone(),
                full: self.final_transcript.clone(),
                partial: String::new(),
            }
        }
    }
}

/// The favella service instance.
///
/// Owns its configuration, the cached voice catalog, and the injected host
/// devices. Construct one with [`Favella::builder`]; several independent
/// instances can coexist.
pub struct Favella {
    config: Config,
    catalog: VoiceCatalog,
    curses: CurseInjector,
    speech: Option<Box<dyn SpeechDevice>>,
    recognition: Option<Box<dyn RecognitionDevice>>,
    sink: Box<dyn DiagnosticSink>,
    session: Option<ListenSession>,
    parrot: Option<String>,
}

impl fmt::Debug for Favella {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Favella")
            .field("config", &self.config)
            .field("catalog", &self.catalog)
            .field("supported", &self.speech.is_some())
            .field("listening", &self.session.is_some())
            .field("parrot", &self.parrot)
            .finish_non_exhaustive()
    }
}

impl Favella {
    pub fn builder() -> FavellaBuilder {
        FavellaBuilder::new()
    }

    /// Whether a speech device was injected at construction. When false the
    /// whole instance degrades to a silent no-op rather than failing
    /// callers.
    pub fn is_supported(&self) -> bool {
        self.speech.is_some()
    }

    /// Merge a configuration patch; the only mutation path besides the mute
    /// operations.
    pub fn configure(&mut self, patch: &ConfigPatch) {
        self.config.apply(patch);
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn mute(&mut self, target: MuteTarget) {
        self.config.mute.mute(target);
        match target {
            MuteTarget::All => info!("Ho perso la favella (I lost the power of speech)!"),
            MuteTarget::Diagnostics => info!("spoken diagnostics muted"),
        }
    }

    pub fn unmute(&mut self) {
        if self.config.mute.is_muted(MuteTarget::All) {
            info!("Ho riacquistato la favella (I recover the power of speech)!");
        } else if self.config.mute.is_muted(MuteTarget::Diagnostics) {
            info!("spoken diagnostics unmuted");
        }
        self.config.mute.unmute();
    }

    pub fn set_mute(&mut self, target: MuteTarget, value: bool) {
        self.config.mute.set(target, value);
    }

    pub fn is_muted(&self, target: MuteTarget) -> bool {
        self.config.mute.is_muted(target)
    }

    /// Speak a message.
    ///
    /// Options merge over the stored speak defaults by field presence; the
    /// voice comes from `voice_name` when set, else from the language tag,
    /// with the catalog's single `en-US` fallback step. Empty or blank text
    /// degrades to [`FALLBACK_TEXT`] instead of failing.
    pub fn speak(&mut self, text: &str, options: SpeakOptions) -> SpeakOutcome {
        if self.config.mute.is_muted(MuteTarget::All) {
            debug!("speak() suppressed, all speech is muted");
            return SpeakOutcome::Suppressed;
        }
        if self.speech.is_none() {
            debug!("speak() suppressed, no speech device");
            return SpeakOutcome::Suppressed;
        }

        let text = if text.trim().is_empty() {
            warn!("empty message, speaking fallback text");
            FALLBACK_TEXT
        } else {
            text
        };

        let merged = self.config.speak_defaults.merged(&options.as_patch());
        let requested = merged
            .voice_name
            .clone()
            .unwrap_or_else(|| merged.language_tag.clone());
        let mut handlers = options.handlers;

        let voice = match self.catalog.resolve(&requested) {
            Ok(voice) => voice.clone(),
            Err(err) => {
                warn!("no voice for '{}': {}", requested, err);
                handlers.dispatch(&SpeechEvent::Error(err.to_string()));
                return SpeakOutcome::Failed(err);
            }
        };
        debug!("Voice selected: {}", voice.name);

        let request = SpeechRequest {
            id: Uuid::new_v4(),
            text: text.to_string(),
            language_tag: voice.language_tag.clone(),
            volume: merged.volume,
            rate: merged.rate,
            pitch: merged.pitch,
            voice,
            handlers,
        };

        match self.speech.as_mut() {
            Some(device) => {
                device.enqueue(request);
                SpeakOutcome::Enqueued
            }
            None => SpeakOutcome::Suppressed,
        }
    }

    /// Pause any utterance being spoken. Forwards 1:1 to the device.
    pub fn pause(&mut self) {
        if let Some(device) = self.speech.as_mut() {
            device.pause();
        }
    }

    /// Resume a previously paused utterance.
    pub fn resume(&mut self) {
        if let Some(device) = self.speech.as_mut() {
            device.resume();
        }
    }

    /// Stop speaking and drop every queued utterance.
    pub fn cancel(&mut self) {
        if let Some(device) = self.speech.as_mut() {
            device.cancel();
        }
    }

    pub fn is_speaking(&self) -> bool {
        self.speech.as_ref().map(|d| d.is_speaking()).unwrap_or(false)
    }

    pub fn is_pending(&self) -> bool {
        self.speech.as_ref().map(|d| d.is_pending()).unwrap_or(false)
    }

    pub fn is_paused(&self) -> bool {
        self.speech.as_ref().map(|d| d.is_paused()).unwrap_or(false)
    }

    /// Cached voice list; `force` re-reads the device snapshot.
    pub fn voices(&mut self, force: bool) -> &[VoiceDescriptor] {
        if force || self.catalog.is_empty() {
            if let Some(device) = self.speech.as_ref() {
                self.catalog.refresh(device.voices());
            }
        }
        self.catalog.voices()
    }

    /// Host notification hook for "the device's voice list changed".
    pub fn voices_changed(&mut self) {
        if let Some(device) = self.speech.as_ref() {
            self.catalog.refresh(device.voices());
        }
    }

    /// Start a recognition session.
    ///
    /// Returns false when recognition is unsupported or a session is
    /// already active; a second call never starts a duplicate session.
    pub fn listen(&mut self, options: ListenOptions) -> bool {
        if self.session.is_some() {
            debug!("listen() ignored, already listening");
            return false;
        }
        let Some(device) = self.recognition.as_mut() else {
            debug!("listen() ignored, no recognition device");
            return false;
        };

        let merged = self.config.recognition_defaults.merged(&options.as_patch());
        let settings = RecognitionSettings {
            language_tag: merged.language_tag,
            continuous: merged.continuous,
            interim_results: merged.interim_results,
        };
        info!("listening ({})", settings.language_tag);
        let events = device.start(settings);
        self.session = Some(ListenSession {
            events,
            handlers: options.handlers,
            final_transcript: String::new(),
            interim: String::new(),
        });
        true
    }

    pub fn is_listening(&self) -> bool {
        self.session.is_some()
    }

    /// Stop the active session. `abort` discards pending partial results
    /// instead of letting them flush as finals.
    pub fn stop_listen(&mut self, abort: bool) {
        if self.session.is_none() {
            return;
        }
        if let Some(device) = self.recognition.as_mut() {
            if abort {
                device.abort();
            } else {
                device.stop();
            }
        }
    }

    /// Drain pending recognition events and dispatch them.
    ///
    /// Call this from the host event loop. Final segments accumulate into
    /// the session transcript; `on_result` receives the same snapshot shape
    /// every time. [`RecognitionEvent::Ended`] closes the session. Returns
    /// the number of events handled.
    pub fn poll(&mut self) -> usize {
        let mut handled = 0;
        let mut ended = false;
        let mut echoes: Vec<String> = Vec::new();

        if let Some(session) = self.session.as_mut() {
            loop {
                let event = match session.events.try_recv() {
                    Ok(event) => event,
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        ended = true;
                        break;
                    }
                };
                handled += 1;
                match &event {
                    RecognitionEvent::Started => {
                        if let Some(callback) = session.handlers.on_start.as_mut() {
                            callback(&event);
                        }
                    }
                    RecognitionEvent::Segment { text, is_final } => {
                        let transcript = session.ingest(text, *is_final);
                        if self.parrot.is_some()
                            && transcript.is_final
                            && !transcript.partial.is_empty()
                        {
                            echoes.push(transcript.partial.clone());
                        }
                        if let Some(callback) = session.handlers.on_result.as_mut() {
                            callback(&transcript);
                        }
                    }
                    RecognitionEvent::NoMatch => {
                        if let Some(callback) = session.handlers.on_no_match.as_mut() {
                            callback(&event);
                        }
                    }
                    RecognitionEvent::Error(message) => {
                        warn!("recognition error: {}", message);
                        if let Some(callback) = session.handlers.on_error.as_mut() {
                            callback(&event);
                        }
                    }
                    RecognitionEvent::Ended => {
                        if let Some(callback) = session.handlers.on_end.as_mut() {
                            callback(&event);
                        }
                        ended = true;
                    }
                }
                if ended {
                    break;
                }
            }
        }

        // Capture the echo language before a trailing Ended clears it, so a
        // phrase finalized in the same drain still gets repeated.
        let parrot_tag = self.parrot.clone();
        if ended {
            self.session = None;
            if self.parrot.take().is_some() {
                info!("parrot mode session ended");
            }
        }

        if let Some(language_tag) = parrot_tag {
            for text in echoes {
                info!("{}", text);
                self.speak(
                    &text,
                    SpeakOptions::new()
                        .language_tag(language_tag.clone())
                        .volume(1.0)
                        .rate(1.0)
                        .pitch(PARROT_PITCH),
                );
            }
        }

        handled
    }

    /// Toggle parrot mode: listen continuously and repeat every finalized
    /// phrase in the given language.
    pub fn parrot_mode(&mut self, language_tag: &str) {
        if self.is_listening() {
            self.parrot = None;
            self.stop_listen(false);
            self.speak("Parrot mode off", SpeakOptions::new());
            return;
        }

        let resolved = self
            .catalog
            .resolve(language_tag)
            .ok()
            .filter(|voice| voice.language_tag == language_tag)
            .cloned();
        let Some(voice) = resolved else {
            self.report_error("Language not supported. Parrot mode fail");
            return;
        };

        self.speak(
            "Parrot mode on",
            SpeakOptions::new().language_tag(voice.language_tag.clone()),
        );
        let started = self.listen(
            ListenOptions::new()
                .language_tag(voice.language_tag.clone())
                .continuous(true)
                .interim_results(false),
        );
        if started {
            self.parrot = Some(voice.language_tag);
        }
    }

    /// Route a diagnostic message through the spoken pipeline, then hand it
    /// to the sink. The sink always runs; diagnostics are never swallowed.
    ///
    /// When the diagnostics gate is clear the sink receives the same
    /// curse-injected text that was spoken; when it is raised the original
    /// message passes through untouched.
    pub fn report_error(&mut self, message: &str) {
        if self.config.mute.is_muted(MuteTarget::Diagnostics) {
            self.sink.report(message);
            return;
        }
        let spoken = self.curses.maybe_append(message, &self.config);
        self.speak(&spoken, SpeakOptions::new());
        self.sink.report(&spoken);
    }

    /// How do you say "favella"?
    pub fn introduce(&mut self) {
        match self.catalog.resolve("it-IT").ok().cloned() {
            Some(voice) if voice.language_tag == "it-IT" => {
                let tag = voice.language_tag.clone();
                self.speak("favella", SpeakOptions::new().language_tag(tag));
            }
            Some(voice) => {
                let tag = voice.language_tag.clone();
                let mut lines = vec![
                    "Sorry, I cannot pronounce properly because missing italian voice. I will try anyway.",
                    "favella.",
                ];
                if !self.config.parental_control {
                    lines.push("Shit!");
                }
                for line in lines {
                    self.speak(line, SpeakOptions::new().language_tag(tag.clone()));
                }
            }
            None => info!("Missing voice :("),
        }
    }
}

/// Builder for a [`Favella`] instance.
pub struct FavellaBuilder {
    config: Config,
    speech: Option<Box<dyn SpeechDevice>>,
    recognition: Option<Box<dyn RecognitionDevice>>,
    sink: Option<Box<dyn DiagnosticSink>>,
    curse_seed: Option<u64>,
}

impl FavellaBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            speech: None,
            recognition: None,
            sink: None,
            curse_seed: None,
        }
    }

    /// Inject the host speech-output device. Without one the built instance
    /// is a silent no-op.
    pub fn speech_device(mut self, device: impl SpeechDevice + 'static) -> Self {
        self.speech = Some(Box::new(device));
        self
    }

    /// Inject the host speech-recognition device.
    pub fn recognition_device(mut self, device: impl RecognitionDevice + 'static) -> Self {
        self.recognition = Some(Box::new(device));
        self
    }

    /// Replace the default [`TracingSink`] diagnostic sink.
    pub fn diagnostic_sink(mut self, sink: impl DiagnosticSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Apply an initial configuration patch.
    pub fn configure(mut self, patch: &ConfigPatch) -> Self {
        self.config.apply(patch);
        self
    }

    /// Seed curse selection, for deterministic tests.
    pub fn curse_seed(mut self, seed: u64) -> Self {
        self.curse_seed = Some(seed);
        self
    }

    pub fn build(self) -> Favella {
        let curses = match self.curse_seed {
            Some(seed) => CurseInjector::with_seed(seed),
            None => CurseInjector::new(),
        };
        let mut favella = Favella {
            config: self.config,
            catalog: VoiceCatalog::new(),
            curses,
            speech: self.speech,
            recognition: self.recognition,
            sink: self.sink.unwrap_or_else(|| Box::new(TracingSink)),
            session: None,
            parrot: None,
        };
        match favella.speech.as_mut() {
            Some(device) => {
                // A stale utterance from a previous owner must not play
                // over us.
                if device.is_speaking() {
                    device.cancel();
                }
                let voices = device.voices();
                favella.catalog.refresh(voices);
            }
            None => {
                info!("Sorry, speech synthesis is not supported on this host");
            }
        }
        favella
    }
}

impl Default for FavellaBuilder {
    fn default() -> Self {
        Self::new()
    }
}
