//! Voice catalog caching and fallback-aware resolution
//!
//! The host device owns the real voice list; this module caches a snapshot
//! of it and resolves logical voice requests (a voice name or a language
//! tag) to a concrete entry with a single, predictable fallback step.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{FavellaError, Result};

/// The universal fallback language. Resolution degrades to it exactly once
/// and never chains any further.
pub const FALLBACK_LANGUAGE: &str = "en-US";

/// A named, language-tagged synthetic voice offered by the host platform.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceDescriptor {
    /// Display name, unique within the catalog.
    pub name: String,

    /// BCP 47 tag such as "en-US" or "it-IT".
    pub language_tag: String,

    /// Whether the host considers this its default voice.
    pub is_default: bool,
}

impl VoiceDescriptor {
    pub fn new(name: impl Into<String>, language_tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            language_tag: language_tag.into(),
            is_default: false,
        }
    }
}

/// Cached, ordered snapshot of the voices the host device currently offers.
#[derive(Clone, Debug, Default)]
pub struct VoiceCatalog {
    voices: Vec<VoiceDescriptor>,
}

impl VoiceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cache with a fresh device snapshot.
    ///
    /// Entries are deduplicated by name; the last entry with a given name
    /// wins. Order is otherwise preserved.
    pub fn refresh(&mut self, list: Vec<VoiceDescriptor>) {
        let mut voices: Vec<VoiceDescriptor> = Vec::with_capacity(list.len());
        for voice in list {
            if let Some(existing) = voices.iter_mut().find(|v| v.name == voice.name) {
                *existing = voice;
            } else {
                voices.push(voice);
            }
        }
        debug!("voice catalog refreshed, {} voices", voices.len());
        self.voices = voices;
    }

    pub fn voices(&self) -> &[VoiceDescriptor] {
        &self.voices
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    /// Resolve a voice name or language tag to a concrete voice.
    ///
    /// An exact name match wins over a language-tag match. When nothing
    /// matches and `request` is not already [`FALLBACK_LANGUAGE`], the lookup
    /// retries with [`FALLBACK_LANGUAGE`] exactly once. Resolution over an
    /// unchanged catalog always returns the same entry.
    pub fn resolve(&self, request: &str) -> Result<&VoiceDescriptor> {
        if let Some(voice) = self.lookup(request) {
            return Ok(voice);
        }
        if request != FALLBACK_LANGUAGE && !self.voices.is_empty() {
            debug!(
                "Sorry, '{}' is not supported. Fallback to {}",
                request, FALLBACK_LANGUAGE
            );
            if let Some(voice) = self.lookup(FALLBACK_LANGUAGE) {
                return Ok(voice);
            }
        }
        Err(FavellaError::VoiceUnavailable(request.to_string()))
    }

    fn lookup(&self, request: &str) -> Option<&VoiceDescriptor> {
        self.voices
            .iter()
            .find(|v| v.name == request)
            .or_else(|| self.voices.iter().find(|v| v.language_tag == request))
    }
}
