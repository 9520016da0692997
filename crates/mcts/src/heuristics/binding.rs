//! Lazy, once-only resolution of the heuristic a strategy plays with.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use playout_core::Game;
use tracing::{debug, warn};

use super::{from_description, load, Heuristic, Heuristics};

/// Where a heuristic strategy gets its heuristic from.
///
/// Resolution happens once, on first use, and the result is shared by every
/// playout afterwards:
///
/// 1. an injected heuristic, used as given;
/// 2. a description file; if it cannot be loaded the strategy runs without
///    a heuristic;
/// 3. the game's own description; if it is malformed, the default terms;
/// 4. the default terms.
pub struct HeuristicBinding<G: Game> {
    injected: Option<Arc<dyn Heuristic<G>>>,
    path: Option<PathBuf>,
    resolved: OnceLock<Option<Arc<dyn Heuristic<G>>>>,
}

impl<G: Game> HeuristicBinding<G> {
    /// Create an unresolved binding that falls back to the game's description.
    pub fn new() -> Self {
        Self {
            injected: None,
            path: None,
            resolved: OnceLock::new(),
        }
    }

    /// Use `heuristic` instead of resolving one. It is expected to be
    /// initialised already.
    pub fn inject(&mut self, heuristic: Arc<dyn Heuristic<G>>) {
        self.injected = Some(heuristic);
        self.resolved = OnceLock::new();
    }

    /// Load the heuristic from a description file.
    pub fn set_path(&mut self, path: impl Into<PathBuf>) {
        self.path = Some(path.into());
        self.resolved = OnceLock::new();
    }

    /// Configured description file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The heuristic for `game`, resolving it on first call.
    pub fn resolve(&self, game: &G) -> Option<Arc<dyn Heuristic<G>>> {
        self.resolved
            .get_or_init(|| self.resolve_uncached(game))
            .clone()
    }

    fn resolve_uncached(&self, game: &G) -> Option<Arc<dyn Heuristic<G>>> {
        if let Some(heuristic) = &self.injected {
            return Some(Arc::clone(heuristic));
        }

        let mut heuristics = if let Some(path) = &self.path {
            match load(path) {
                Ok(heuristics) => {
                    debug!(path = %path.display(), "loaded heuristic");
                    heuristics
                }
                Err(e) => {
                    warn!("{e}, playing without a heuristic");
                    return None;
                }
            }
        } else if let Some(description) = game.heuristics_description() {
            from_description(description).unwrap_or_else(|e| {
                warn!("Game heuristic unusable: {e}, using defaults");
                Heuristics::default_terms()
            })
        } else {
            Heuristics::default_terms()
        };

        heuristics.init(game);
        Some(Arc::new(heuristics))
    }
}

impl<G: Game> Default for HeuristicBinding<G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: Game> Clone for HeuristicBinding<G> {
    fn clone(&self) -> Self {
        Self {
            injected: self.injected.clone(),
            path: self.path.clone(),
            resolved: self.resolved.clone(),
        }
    }
}

impl<G: Game> fmt::Debug for HeuristicBinding<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeuristicBinding")
            .field("injected", &self.injected.is_some())
            .field("path", &self.path)
            .field("resolved", &self.resolved.get().is_some())
            .finish()
    }
}
