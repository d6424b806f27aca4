//! Storage paths on the printer

use serde::{Deserialize, Serialize};
use std::fmt;

/// A file or folder path on one of the printer's storage volumes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilePath(String);

impl FilePath {
    /// Path on the attached USB drive
    pub fn usb(path: &str) -> Self {
        Self(format!("/usb/{}", path.trim_start_matches('/')))
    }

    /// Path on internal storage
    pub fn local(path: &str) -> Self {
        Self(format!("/local/{}", path.trim_start_matches('/')))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FilePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for FilePath {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_prefixes() {
        assert_eq!(FilePath::usb("model.ctb").as_str(), "/usb/model.ctb");
        assert_eq!(FilePath::local("/jobs/a.ctb").as_str(), "/local/jobs/a.ctb");
    }
}
