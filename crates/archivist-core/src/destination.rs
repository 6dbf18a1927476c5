use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Archive destination identifier
///
/// An opaque, externally chosen name. It becomes one path component under the
/// archive root, but no validation beyond "non-blank" happens here: whether the
/// resulting archive path is confined to the archive root is decided by the
/// path guard at transfer time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Destination(String);

impl Destination {
    /// Returns `None` for blank input, which callers treat as "no destination chosen".
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Destination(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Destination {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Destination::new(s).ok_or_else(|| anyhow::anyhow!("Destination must not be blank"))
    }
}

impl Display for Destination {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Destination {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
