//! Playout and search configuration parameters.
//!
//! Playout strategies are configured from flat `key=value` tokens (keys are
//! case-insensitive); the search driver takes a plain struct.

use std::str::FromStr;
use std::time::Duration;

use playout_core::{Game, PlayoutError, Result};
use tracing::warn;

/// Options shared by every playout strategy.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayoutConfig {
    /// Maximum number of moves a playout applies. `None` means unlimited.
    pub turn_limit: Option<usize>,

    /// Probability of a uniformly random move instead of the greedy one.
    /// Only used by the statistics-driven strategies.
    pub epsilon: f64,
}

impl Default for PlayoutConfig {
    fn default() -> Self {
        Self {
            turn_limit: None,
            epsilon: 0.1,
        }
    }
}

impl PlayoutConfig {
    /// Create a config with the given turn limit.
    pub fn with_turn_limit(turn_limit: usize) -> Self {
        Self {
            turn_limit: Some(turn_limit),
            ..Default::default()
        }
    }

    /// Deduction puzzles can loop forever, so they need a positive cap.
    pub fn supports_game<G: Game>(&self, game: &G) -> bool {
        if game.is_deduction_puzzle() {
            self.turn_limit.is_some_and(|limit| limit > 0)
        } else {
            true
        }
    }

    /// Whether a playout that already applied `moves` moves must stop.
    pub fn limit_reached(&self, moves: usize) -> bool {
        self.turn_limit.is_some_and(|limit| moves >= limit)
    }

    /// Apply one option. Returns `Ok(false)` if the key is not recognised.
    pub(crate) fn set_option(&mut self, key: &str, value: &str) -> Result<bool> {
        match key {
            "playoutturnlimit" => {
                let limit: i64 = parse_value(key, value)?;
                self.turn_limit = usize::try_from(limit).ok();
            }
            "epsilon" => {
                let epsilon: f64 = parse_value(key, value)?;
                if !(0.0..=1.0).contains(&epsilon) {
                    return Err(invalid(key, value));
                }
                self.epsilon = epsilon;
            }
            _ => return Ok(false),
        }
        Ok(true)
    }
}

/// Parse a value for a known option.
pub(crate) fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| invalid(key, value))
}

pub(crate) fn invalid(key: &str, value: &str) -> PlayoutError {
    PlayoutError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

/// Feed every `key=value` token to `apply`.
///
/// Tokens without `=` (such as the strategy name) are skipped. Keys that
/// `apply` does not recognise are logged and ignored; malformed values abort
/// with the error `apply` returned.
pub(crate) fn apply_options<S: AsRef<str>>(
    tokens: &[S],
    mut apply: impl FnMut(&str, &str) -> Result<bool>,
) -> Result<()> {
    for token in tokens {
        let token = token.as_ref();
        let Some((key, value)) = token.split_once('=') else {
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        if !apply(&key, value.trim())? {
            warn!(token, "ignoring unknown playout option");
        }
    }
    Ok(())
}

/// Search driver parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchConfig {
    /// Number of simulations per search.
    pub num_simulations: usize,

    /// UCT exploration constant.
    pub exploration: f64,

    /// Longest move sequence tracked by the n-gram statistics.
    pub max_ngram_length: usize,

    /// Wall-clock budget, checked between whole simulations.
    pub time_limit: Option<Duration>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            num_simulations: 1000,
            exploration: std::f64::consts::SQRT_2,
            max_ngram_length: 3,
            time_limit: None,
        }
    }
}

impl SearchConfig {
    /// Create a new config with the specified number of simulations.
    pub fn with_simulations(num_simulations: usize) -> Self {
        Self {
            num_simulations,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::{Lights, TicTacToe};

    #[test]
    fn test_default_config() {
        let config = PlayoutConfig::default();
        assert_eq!(config.turn_limit, None);
        assert!((config.epsilon - 0.1).abs() < 1e-9);

        let search = SearchConfig::default();
        assert_eq!(search.num_simulations, 1000);
        assert_eq!(search.max_ngram_length, 3);
    }

    #[test]
    fn test_negative_turn_limit_is_unlimited() {
        let mut config = PlayoutConfig::with_turn_limit(10);
        assert!(config.set_option("playoutturnlimit", "-1").unwrap());
        assert_eq!(config.turn_limit, None);
    }

    #[test]
    fn test_malformed_value_is_an_error() {
        let mut config = PlayoutConfig::default();
        let err = config.set_option("playoutturnlimit", "ten").unwrap_err();
        assert_eq!(
            err,
            PlayoutError::InvalidValue {
                key: "playoutturnlimit".to_string(),
                value: "ten".to_string(),
            }
        );
        assert!(config.set_option("epsilon", "1.5").is_err());
    }

    #[test]
    fn test_apply_options_is_case_insensitive() {
        let mut config = PlayoutConfig::default();
        apply_options(&["mast", "PlayoutTurnLimit=25", "bogus=1"], |key, value| {
            config.set_option(key, value)
        })
        .unwrap();
        assert_eq!(config.turn_limit, Some(25));
    }

    #[test]
    fn test_puzzles_need_a_positive_limit() {
        let puzzle = Lights::new(4);
        assert!(!PlayoutConfig::default().supports_game(&puzzle));
        assert!(!PlayoutConfig::with_turn_limit(0).supports_game(&puzzle));
        assert!(PlayoutConfig::with_turn_limit(50).supports_game(&puzzle));
        assert!(PlayoutConfig::default().supports_game(&TicTacToe));
    }

    #[test]
    fn test_limit_reached() {
        let config = PlayoutConfig::with_turn_limit(3);
        assert!(!config.limit_reached(2));
        assert!(config.limit_reached(3));
        assert!(!PlayoutConfig::default().limit_reached(usize::MAX));
    }
}
