use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where a matched call was observed
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: PathBuf,
    /// 1-based line of the call expression
    pub line: usize,
    /// 0-based byte column of the call expression
    pub column: usize,
}

impl SourceLocation {
    pub fn new(file: impl Into<PathBuf>, line: usize, column: usize) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

/// A lookup call whose arguments were both plain string literals
///
/// `category` and `raw_key` together form the natural key of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub category: String,
    pub raw_key: String,
    pub location: SourceLocation,
}

impl MatchRecord {
    pub fn new(
        category: impl Into<String>,
        raw_key: impl Into<String>,
        location: SourceLocation,
    ) -> Self {
        Self {
            category: category.into(),
            raw_key: raw_key.into(),
            location,
        }
    }
}

/// One generated constant: the identifier and the literal pair behind it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstantEntry {
    pub identifier: String,
    pub category: String,
    pub raw_key: String,
    /// Every place the key was observed, first occurrence first
    #[serde(default)]
    pub locations: Vec<SourceLocation>,
}

impl ConstantEntry {
    /// First observed location, if the entry came from source rather than a prior run
    pub fn first_location(&self) -> Option<&SourceLocation> {
        self.locations.first()
    }
}
