//! Independent mute gates for speech output
//!
//! Two flags: `All` silences every `speak()` call, `Diagnostics` silences
//! only the spoken diagnostics path. Muting diagnostics never implies muting
//! speech, and vice versa.

use serde::{Deserialize, Serialize};

/// What to silence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MuteTarget {
    /// Every `speak()` call, including spoken diagnostics.
    All,

    /// Only spoken diagnostics; direct `speak()` calls keep working.
    Diagnostics,
}

/// Mute flags consulted before every speech request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MuteGate {
    all: bool,
    diagnostics: bool,
}

impl MuteGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise one gate, leaving the other untouched.
    pub fn mute(&mut self, target: MuteTarget) {
        self.set(target, true);
    }

    /// Clear both gates. Idempotent.
    pub fn unmute(&mut self) {
        self.all = false;
        self.diagnostics = false;
    }

    pub fn set(&mut self, target: MuteTarget, value: bool) {
        match target {
            MuteTarget::All => self.all = value,
            MuteTarget::Diagnostics => self.diagnostics = value,
        }
    }

    pub fn is_muted(&self, target: MuteTarget) -> bool {
        match target {
            MuteTarget::All => self.all,
            MuteTarget::Diagnostics => self.diagnostics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gates_start_clear() {
        let gate = MuteGate::new();
        assert!(!gate.is_muted(MuteTarget::All));
        assert!(!gate.is_muted(MuteTarget::Diagnostics));
    }

    #[test]
    fn test_diagnostics_does_not_imply_all() {
        let mut gate = MuteGate::new();
        gate.mute(MuteTarget::Diagnostics);

        assert!(gate.is_muted(MuteTarget::Diagnostics));
        assert!(!gate.is_muted(MuteTarget::All));
    }

    #[test]
    fn test_all_does_not_imply_diagnostics() {
        let mut gate = MuteGate::new();
        gate.mute(MuteTarget::All);

        assert!(gate.is_muted(MuteTarget::All));
        assert!(!gate.is_muted(MuteTarget::Diagnostics));
    }

    #[test]
    fn test_unmute_clears_both_and_is_idempotent() {
        let mut gate = MuteGate::new();
        gate.mute(MuteTarget::All);
        gate.mute(MuteTarget::Diagnostics);

        gate.unmute();
        assert!(!gate.is_muted(MuteTarget::All));
        assert!(!gate.is_muted(MuteTarget::Diagnostics));

        gate.unmute();
        assert!(!gate.is_muted(MuteTarget::All));
        assert!(!gate.is_muted(MuteTarget::Diagnostics));
    }

    #[test]
    fn test_set_accepts_explicit_false() {
        let mut gate = MuteGate::new();
        gate.set(MuteTarget::All, true);
        gate.set(MuteTarget::All, false);
        assert!(!gate.is_muted(MuteTarget::All));
    }
}
