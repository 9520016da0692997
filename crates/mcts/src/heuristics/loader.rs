//! Heuristic descriptions in TOML.
//!
//! ```toml
//! [[term]]
//! kind = "material"
//! weight = 1.0
//!
//! [[term]]
//! kind = "mobility"
//! weight = 0.001
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use super::{Heuristics, WeightedTerm};

/// Errors raised while loading a heuristic description.
#[derive(Error, Debug)]
pub enum HeuristicError {
    #[error("Failed to read heuristic file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed heuristic description: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Heuristic description has no terms")]
    Empty,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Description {
    #[serde(default, rename = "term")]
    terms: Vec<WeightedTerm>,
}

/// Parse a heuristic from its TOML description.
pub fn from_description(text: &str) -> Result<Heuristics, HeuristicError> {
    let description: Description = toml::from_str(text)?;
    if description.terms.is_empty() {
        return Err(HeuristicError::Empty);
    }
    Ok(Heuristics::new(description.terms))
}

/// Read and parse a heuristic description file.
pub fn load(path: &Path) -> Result<Heuristics, HeuristicError> {
    let text = fs::read_to_string(path).map_err(|source| HeuristicError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    from_description(&text)
}
