pub mod config;
pub mod controller;
pub mod curses;
pub mod device;
pub mod diagnostics;
pub mod mute;
pub mod voice;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FavellaError {
    #[error("No voice available for '{0}'")]
    VoiceUnavailable(String),

    #[error("Speech synthesis is not supported by the host")]
    DeviceUnsupported,

    #[error("Speech recognition is not supported by the host")]
    RecognitionUnsupported,
}

impl FavellaError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // The host may install or expose new voices at any time
            FavellaError::VoiceUnavailable(_) => true,
            // Missing platform capabilities do not appear at runtime
            FavellaError::DeviceUnsupported => false,
            FavellaError::RecognitionUnsupported => false,
        }
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            FavellaError::VoiceUnavailable(_) => {
                "No matching voice is installed. Message will be shown as text.".to_string()
            }
            FavellaError::DeviceUnsupported => {
                "Sorry, speech synthesis is not supported on this platform.".to_string()
            }
            FavellaError::RecognitionUnsupported => {
                "Sorry, speech recognition is not supported on this platform.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, FavellaError>;

// Re-export commonly used types
pub use config::{
    Config, ConfigPatch, RecognitionDefaults, RecognitionDefaultsPatch, SpeakDefaults,
    SpeakDefaultsPatch, SpeakOptions,
};
pub use controller::{
    Favella, FavellaBuilder, ListenHandlers, ListenOptions, SpeakOutcome, Transcript,
    FALLBACK_TEXT,
};
pub use curses::CurseInjector;
pub use device::{
    RecognitionDevice, RecognitionEvent, RecognitionSettings, SpeakHandlers, SpeechDevice,
    SpeechEvent, SpeechRequest,
};
pub use diagnostics::{DiagnosticRelay, DiagnosticSink, FnSink, TracingSink};
pub use mute::{MuteGate, MuteTarget};
pub use voice::{VoiceCatalog, VoiceDescriptor, FALLBACK_LANGUAGE};
