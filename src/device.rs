//! Device seams for the host speech subsystem
//!
//! The controller never touches platform audio directly; it depends on the
//! [`SpeechDevice`] and [`RecognitionDevice`] traits so hosts (and tests)
//! can supply their own implementations. Synthesis and recognition signal
//! processing live entirely behind these traits.

use crossbeam_channel::Receiver;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::voice::VoiceDescriptor;

/// Event dispatched by the speech-output device while an utterance plays.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpeechEvent {
    Started,
    Ended,
    Error(String),

    /// The device reached a word or sentence boundary.
    Boundary { char_index: usize },

    /// The device reached a named mark in the text.
    Mark { name: String },
}

pub type SpeechCallback = Box<dyn FnMut(&SpeechEvent) + Send>;

/// Optional per-request handler slots.
///
/// Unset slots stay unset on the request, leaving whatever defaults the
/// device carries in place.
#[derive(Default)]
pub struct SpeakHandlers {
    pub on_start: Option<SpeechCallback>,
    pub on_end: Option<SpeechCallback>,
    pub on_error: Option<SpeechCallback>,
    pub on_boundary: Option<SpeechCallback>,
    pub on_mark: Option<SpeechCallback>,
}

impl SpeakHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route an event to its slot, if one is set.
    pub fn dispatch(&mut self, event: &SpeechEvent) {
        let slot = match event {
            SpeechEvent::Started => &mut self.on_start,
            SpeechEvent::Ended => &mut self.on_end,
            SpeechEvent::Error(_) => &mut self.on_error,
            SpeechEvent::Boundary { .. } => &mut self.on_boundary,
            SpeechEvent::Mark { .. } => &mut self.on_mark,
        };
        if let Some(callback) = slot {
            callback(event);
        }
    }
}

impl fmt::Debug for SpeakHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpeakHandlers")
            .field("on_start", &self.on_start.is_some())
            .field("on_end", &self.on_end.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_boundary", &self.on_boundary.is_some())
            .field("on_mark", &self.on_mark.is_some())
            .finish()
    }
}

/// One utterance bound for the speech-output device.
///
/// Built per call from merged options plus the resolved voice, moved into
/// the device on enqueue and discarded once the device reports completion
/// or error.
#[derive(Debug)]
pub struct SpeechRequest {
    /// Request ID for tracking
    pub id: Uuid,

    /// The text to speak.
    pub text: String,

    /// The resolved voice this utterance is bound to.
    pub voice: VoiceDescriptor,

    /// Language of the resolved voice.
    pub language_tag: String,

    /// 0.0 to 1.0. Range validation belongs to the device.
    pub volume: f32,

    /// 0.1 to 10.0.
    pub rate: f32,

    /// 0.0 to 2.0.
    pub pitch: f32,

    /// Handler slots the device dispatches playback events into.
    pub handlers: SpeakHandlers,
}

/// Host text-to-speech output device.
///
/// The device owns the utterance queue: requests play in FIFO submission
/// order and at most one utterance plays at a time. This layer never
/// reorders or dispatches in parallel.
pub trait SpeechDevice: Send {
    /// Append a request to the playback queue.
    fn enqueue(&mut self, request: SpeechRequest);

    /// Pause the utterance currently being spoken.
    fn pause(&mut self);

    /// Resume a previously paused utterance.
    fn resume(&mut self);

    /// Stop speaking and drop every queued utterance.
    fn cancel(&mut self);

    fn is_speaking(&self) -> bool;

    fn is_pending(&self) -> bool;

    fn is_paused(&self) -> bool;

    /// Snapshot of the installable voices the device currently offers.
    fn voices(&self) -> Vec<VoiceDescriptor>;
}

/// Parameters handed to the recognition device when a session starts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionSettings {
    pub language_tag: String,

    /// Keep listening after the first final result.
    pub continuous: bool,

    /// Emit non-final segments while the speaker is still talking.
    pub interim_results: bool,
}

/// Event emitted by the recognition device during a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecognitionEvent {
    Started,

    /// A transcript segment. Non-final segments may still be revised; a
    /// final segment is settled and will not change.
    Segment { text: String, is_final: bool },

    /// Sound was captured but produced no usable transcript.
    NoMatch,

    Error(String),

    /// The session is over; no further events will arrive.
    Ended,
}

/// Host speech-recognition device.
pub trait RecognitionDevice: Send {
    /// Begin a session and return the event stream feeding it.
    fn start(&mut self, settings: RecognitionSettings) -> Receiver<RecognitionEvent>;

    /// Stop listening, letting pending partial results flush as finals.
    fn stop(&mut self);

    /// Stop immediately, discarding pending results.
    fn abort(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_routes_to_matching_slot() {
        use parking_lot::Mutex;
        use std::sync::Arc;

        let seen: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));
        let mut handlers = SpeakHandlers::new();

        let log = Arc::clone(&seen);
        handlers.on_start = Some(Box::new(move |_| log.lock().push("start")));
        let log = Arc::clone(&seen);
        handlers.on_error = Some(Box::new(move |_| log.lock().push("error")));

        handlers.dispatch(&SpeechEvent::Started);
        handlers.dispatch(&SpeechEvent::Ended); // no slot set, must be a no-op
        handlers.dispatch(&SpeechEvent::Error("boom".to_string()));

        assert_eq!(*seen.lock(), vec!["start", "error"]);
    }

    #[test]
    fn test_dispatch_passes_event_payload() {
        use parking_lot::Mutex;
        use std::sync::Arc;

        let index: Arc<Mutex<Option<usize>>> = Arc::new(Mutex::new(None));
        let mut handlers = SpeakHandlers::new();

        let slot = Arc::clone(&index);
        handlers.on_boundary = Some(Box::new(move |event| {
            if let SpeechEvent::Boundary { char_index } = event {
                *slot.lock() = Some(*char_index);
            }
        }));

        handlers.dispatch(&SpeechEvent::Boundary { char_index: 12 });
        assert_eq!(*index.lock(), Some(12));
    }

    #[test]
    fn test_handlers_debug_shows_set_slots() {
        let mut handlers = SpeakHandlers::new();
        handlers.on_end = Some(Box::new(|_| {}));
        let debug = format!("{:?}", handlers);
        assert!(debug.contains("on_end: true"));
        assert!(debug.contains("on_start: false"));
    }
}
