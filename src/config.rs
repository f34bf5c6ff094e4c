//! Layered configuration with presence-based merging
//!
//! Stored configuration is concrete; patches carry `Option` per field so
//! that only explicitly provided values replace stored ones. An explicit
//! `false` or `0.0` counts as provided. The nested option groups
//! (`speak_defaults`, `recognition_defaults`) merge key-by-key against
//! their prior values, never wholesale, so a partial override cannot
//! silently discard the rest of the group.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::device::{SpeakHandlers, SpeechEvent};
use crate::mute::{MuteGate, MuteTarget};
use crate::voice::FALLBACK_LANGUAGE;

/// Stored speak option group; the base layer every `speak()` call merges
/// over.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpeakDefaults {
    /// Preferred voice by name; the language tag is used when unset.
    pub voice_name: Option<String>,

    pub language_tag: String,

    /// 0.0 to 1.0. Out-of-range values are passed through; range checks
    /// belong to the host device.
    pub volume: f32,

    /// 0.1 to 10.0.
    pub rate: f32,

    /// 0.0 to 2.0.
    pub pitch: f32,
}

impl Default for SpeakDefaults {
    fn default() -> Self {
        Self {
            voice_name: None,
            language_tag: FALLBACK_LANGUAGE.to_string(),
            volume: 1.0,
            rate: 1.0,
            pitch: 0.0,
        }
    }
}

impl SpeakDefaults {
    /// Merge a patch in place; only present fields replace stored values.
    pub fn apply(&mut self, patch: &SpeakDefaultsPatch) {
        if let Some(name) = &patch.voice_name {
            self.voice_name = Some(name.clone());
        }
        if let Some(tag) = &patch.language_tag {
            self.language_tag = tag.clone();
        }
        if let Some(volume) = patch.volume {
            self.volume = volume;
        }
        if let Some(rate) = patch.rate {
            self.rate = rate;
        }
        if let Some(pitch) = patch.pitch {
            self.pitch = pitch;
        }
    }

    /// Presence-merge producing a new value; neither input is mutated.
    pub fn merged(&self, patch: &SpeakDefaultsPatch) -> SpeakDefaults {
        let mut merged = self.clone();
        merged.apply(patch);
        merged
    }
}

/// Partial update for [`SpeakDefaults`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeakDefaultsPatch {
    pub voice_name: Option<String>,
    pub language_tag: Option<String>,
    pub volume: Option<f32>,
    pub rate: Option<f32>,
    pub pitch: Option<f32>,
}

impl SpeakDefaultsPatch {
    /// Read known keys out of untyped JSON, defensively ignoring keys whose
    /// values have the wrong shape.
    pub fn from_value(value: &Value) -> SpeakDefaultsPatch {
        let mut patch = SpeakDefaultsPatch::default();
        let Some(map) = value.as_object() else {
            return patch;
        };
        if let Some(name) = map.get("voice_name").and_then(Value::as_str) {
            patch.voice_name = Some(name.to_string());
        }
        if let Some(tag) = map.get("language_tag").and_then(Value::as_str) {
            patch.language_tag = Some(tag.to_string());
        }
        if let Some(volume) = map.get("volume").and_then(Value::as_f64) {
            patch.volume = Some(volume as f32);
        }
        if let Some(rate) = map.get("rate").and_then(Value::as_f64) {
            patch.rate = Some(rate as f32);
        }
        if let Some(pitch) = map.get("pitch").and_then(Value::as_f64) {
            patch.pitch = Some(pitch as f32);
        }
        patch
    }
}

/// Per-call speak overrides: the data fields of [`SpeakDefaultsPatch`] plus
/// the optional playback handler slots.
///
/// Merging never mutates this value; the controller derives a fresh merged
/// set per call and moves only the handlers into the request.
#[derive(Debug, Default)]
pub struct SpeakOptions {
    pub voice_name: Option<String>,
    pub language_tag: Option<String>,
    pub volume: Option<f32>,
    pub rate: Option<f32>,
    pub pitch: Option<f32>,
    pub handlers: SpeakHandlers,
}

impl SpeakOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn voice_name(mut self, name: impl Into<String>) -> Self {
        self.voice_name = Some(name.into());
        self
    }

    pub fn language_tag(mut self, tag: impl Into<String>) -> Self {
        self.language_tag = Some(tag.into());
        self
    }

    pub fn volume(mut self, volume: f32) -> Self {
        self.volume = Some(volume);
        self
    }

    pub fn rate(mut self, rate: f32) -> Self {
        self.rate = Some(rate);
        self
    }

    pub fn pitch(mut self, pitch: f32) -> Self {
        self.pitch = Some(pitch);
        self
    }

    pub fn on_start(
        mut self,
        callback: impl FnMut(&SpeechEvent) + Send + 'static,
    ) -> Self {
        self.handlers.on_start = Some(Box::new(callback));
        self
    }

    pub fn on_end(
        mut self,
        callback: impl FnMut(&SpeechEvent) + Send + 'static,
    ) -> Self {
        self.handlers.on_end = Some(Box::new(callback));
        self
    }

    pub fn on_error(
        mut self,
        callback: impl FnMut(&SpeechEvent) + Send + 'static,
    ) -> Self {
        self.handlers.on_error = Some(Box::new(callback));
        self
    }

    pub fn on_boundary(
        mut self,
        callback: impl FnMut(&SpeechEvent) + Send + 'static,
    ) -> Self {
        self.handlers.on_boundary = Some(Box::new(callback));
        self
    }

    pub fn on_mark(
        mut self,
        callback: impl FnMut(&SpeechEvent) + Send + 'static,
    ) -> Self {
        self.handlers.on_mark = Some(Box::new(callback));
        self
    }

    /// Data fields only; handlers ride along on the request instead.
    pub fn as_patch(&self) -> SpeakDefaultsPatch {
        SpeakDefaultsPatch {
            voice_name: self.voice_name.clone(),
            language_tag: self.language_tag.clone(),
            volume: self.volume,
            rate: self.rate,
            pitch: self.pitch,
        }
    }
}

/// Stored recognition option group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionDefaults {
    pub language_tag: String,

    /// Keep listening after the first final result.
    pub continuous: bool,

    /// Deliver non-final segments while the speaker is still talking.
    pub interim_results: bool,
}

impl Default for RecognitionDefaults {
    fn default() -> Self {
        Self {
            language_tag: FALLBACK_LANGUAGE.to_string(),
            continuous: false,
            interim_results: false,
        }
    }
}

impl RecognitionDefaults {
    pub fn apply(&mut self, patch: &RecognitionDefaultsPatch) {
        if let Some(tag) = &patch.language_tag {
            self.language_tag = tag.clone();
        }
        if let Some(continuous) = patch.continuous {
            self.continuous = continuous;
        }
        if let Some(interim) = patch.interim_results {
            self.interim_results = interim;
        }
    }

    pub fn merged(&self, patch: &RecognitionDefaultsPatch) -> RecognitionDefaults {
        let mut merged = self.clone();
        merged.apply(patch);
        merged
    }
}

/// Partial update for [`RecognitionDefaults`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionDefaultsPatch {
    pub language_tag: Option<String>,
    pub continuous: Option<bool>,
    pub interim_results: Option<bool>,
}

impl RecognitionDefaultsPatch {
    pub fn from_value(value: &Value) -> RecognitionDefaultsPatch {
        let mut patch = RecognitionDefaultsPatch::default();
        let Some(map) = value.as_object() else {
            return patch;
        };
        if let Some(tag) = map.get("language_tag").and_then(Value::as_str) {
            patch.language_tag = Some(tag.to_string());
        }
        if let Some(continuous) = map.get("continuous").and_then(Value::as_bool) {
            patch.continuous = Some(continuous);
        }
        if let Some(interim) = map.get("interim_results").and_then(Value::as_bool) {
            patch.interim_results = Some(interim);
        }
        patch
    }
}

/// Complete favella configuration, owned by the controller instance.
///
/// Mutable only through [`Config::apply`] (and the controller's mute
/// operations); nothing else writes it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Suppresses curse injection when set.
    pub parental_control: bool,

    /// Phrases optionally appended to spoken diagnostics.
    pub curses: Vec<String>,

    pub speak_defaults: SpeakDefaults,

    pub recognition_defaults: RecognitionDefaults,

    pub mute: MuteGate,
}

impl Config {
    /// Merge a partial patch into this configuration.
    ///
    /// A field replaces the stored value only when explicitly present,
    /// including explicit `false`/`0.0`. The nested option groups merge
    /// key-by-key; the curse list is replaced wholesale.
    pub fn apply(&mut self, patch: &ConfigPatch) {
        if let Some(parental_control) = patch.parental_control {
            self.parental_control = parental_control;
        }
        if let Some(curses) = &patch.curses {
            self.curses = curses.clone();
        }
        if let Some(speak) = &patch.speak_defaults {
            self.speak_defaults.apply(speak);
        }
        if let Some(recognition) = &patch.recognition_defaults {
            self.recognition_defaults.apply(recognition);
        }
        if let Some(enabled) = patch.enabled {
            self.mute.set(MuteTarget::All, !enabled);
        }
        if let Some(console_muted) = patch.console_muted {
            self.mute.set(MuteTarget::Diagnostics, console_muted);
        }
    }
}

/// Partial update for [`Config`]. Every field is optional; omitted fields
/// leave the stored values untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigPatch {
    pub parental_control: Option<bool>,

    /// Replaces the whole curse list when present.
    pub curses: Option<Vec<String>>,

    pub speak_defaults: Option<SpeakDefaultsPatch>,

    pub recognition_defaults: Option<RecognitionDefaultsPatch>,

    /// `false` raises the `All` mute gate.
    pub enabled: Option<bool>,

    /// `true` raises the `Diagnostics` mute gate.
    pub console_muted: Option<bool>,
}

impl ConfigPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parental_control(mut self, value: bool) -> Self {
        self.parental_control = Some(value);
        self
    }

    pub fn with_curses(mut self, curses: Vec<String>) -> Self {
        self.curses = Some(curses);
        self
    }

    pub fn with_speak_defaults(mut self, patch: SpeakDefaultsPatch) -> Self {
        self.speak_defaults = Some(patch);
        self
    }

    pub fn with_recognition_defaults(mut self, patch: RecognitionDefaultsPatch) -> Self {
        self.recognition_defaults = Some(patch);
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    pub fn with_console_muted(mut self, muted: bool) -> Self {
        self.console_muted = Some(muted);
        self
    }

    /// Build a patch from untyped JSON.
    ///
    /// Unknown keys and keys whose values have the wrong shape are ignored
    /// per key, never rejected as a whole. This is the documented lenient
    /// boundary for host-supplied setup blobs; typed callers use the struct
    /// directly (or its strict `Deserialize`).
    pub fn from_value(value: &Value) -> ConfigPatch {
        let mut patch = ConfigPatch::default();
        let Some(map) = value.as_object() else {
            return patch;
        };
        if let Some(parental_control) = map.get("parental_control").and_then(Value::as_bool) {
            patch.parental_control = Some(parental_control);
        }
        if let Some(list) = map.get("curses").and_then(Value::as_array) {
            patch.curses = Some(
                list.iter()
                    .filter_map(|curse| curse.as_str().map(str::to_string))
                    .collect(),
            );
        }
        if let Some(speak) = map.get("speak_defaults").filter(|v| v.is_object()) {
            patch.speak_defaults = Some(SpeakDefaultsPatch::from_value(speak));
        }
        if let Some(recognition) = map.get("recognition_defaults").filter(|v| v.is_object()) {
            patch.recognition_defaults = Some(RecognitionDefaultsPatch::from_value(recognition));
        }
        if let Some(enabled) = map.get("enabled").and_then(Value::as_bool) {
            patch.enabled = Some(enabled);
        }
        if let Some(console_muted) = map.get("console_muted").and_then(Value::as_bool) {
            patch.console_muted = Some(console_muted);
        }
        patch
    }
}
