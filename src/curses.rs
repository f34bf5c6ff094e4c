//! Random curse injection for spoken diagnostics
//!
//! Diagnostic messages may get one configured curse appended before they are
//! spoken. Parental control, or an empty curse list, turns the whole thing
//! into a pass-through. Pure given the configuration and the RNG state; no
//! I/O happens here.

use rand::{rngs::SmallRng, Rng, SeedableRng};
use std::fmt;

use crate::config::Config;

/// Appends one random configured curse to diagnostic messages.
pub struct CurseInjector {
    rng: SmallRng,
}

impl CurseInjector {
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
        }
    }

    /// Deterministic curse selection, for tests.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Return `message` with a random curse appended, or unchanged when
    /// parental control is on or no curses are configured.
    ///
    /// Selection is uniform but not cryptographically secure.
    pub fn maybe_append(&mut self, message: &str, config: &Config) -> String {
        if config.parental_control || config.curses.is_empty() {
            return message.to_string();
        }
        let index = self.rng.gen_range(0..config.curses.len());
        format!("{}. {}!", message, config.curses[index])
    }
}

impl Default for CurseInjector {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CurseInjector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurseInjector").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigPatch;

    fn config(curses: &[&str], parental_control: bool) -> Config {
        let mut config = Config::default();
        config.apply(
            &ConfigPatch::new()
                .with_curses(curses.iter().map(|c| c.to_string()).collect())
                .with_parental_control(parental_control),
        );
        config
    }

    #[test]
    fn test_parental_control_is_identity() {
        let config = config(&["Argh", "Dannazione"], true);
        let mut injector = CurseInjector::with_seed(7);
        assert_eq!(injector.maybe_append("Error X", &config), "Error X");
    }

    #[test]
    fn test_empty_curse_list_is_identity() {
        let config = config(&[], false);
        let mut injector = CurseInjector::with_seed(7);
        assert_eq!(injector.maybe_append("Error X", &config), "Error X");
    }

    #[test]
    fn test_single_curse_format() {
        let config = config(&["Argh"], false);
        let mut injector = CurseInjector::with_seed(7);
        assert_eq!(injector.maybe_append("Error X", &config), "Error X. Argh!");
    }

    #[test]
    fn test_selection_stays_inside_list() {
        let config = config(&["Argh", "Dannazione", "Mannaggia"], false);
        let mut injector = CurseInjector::with_seed(42);
        for _ in 0..50 {
            let spoken = injector.maybe_append("boom", &config);
            let curse = spoken
                .strip_prefix("boom. ")
                .and_then(|rest| rest.strip_suffix('!'))
                .unwrap();
            assert!(config.curses.iter().any(|c| c == curse));
        }
    }

    #[test]
    fn test_seeded_selection_is_reproducible() {
        let config = config(&["Argh", "Dannazione", "Mannaggia"], false);
        let mut first = CurseInjector::with_seed(9);
        let mut second = CurseInjector::with_seed(9);
        for _ in 0..10 {
            assert_eq!(
                first.maybe_append("boom", &config),
                second.maybe_append("boom", &config)
            );
        }
    }
}
