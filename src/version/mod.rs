//! Format versions and the bound resolver that decides which versions a graph can be exported at.

use crate::error::VersionError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

mod resolver;

pub use resolver::{BoundingComponent, VersionBounds, resolve_version_bounds};
pub(crate) use resolver::resolve_intrinsic_bounds;

/// Name of the top-level field carrying the format version of a serialized document.
pub const AGENTSPEC_VERSION_FIELD: &str = "agentspec_version";

/// Former name of [`AGENTSPEC_VERSION_FIELD`]. Accepted on read, never written.
pub const LEGACY_VERSION_FIELD: &str = "air_version";

/// Released versions of the serialization format, in release order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AgentSpecVersion {
    #[serde(rename = "25.3.0")]
    V25_3_0,
    #[serde(rename = "25.3.1")]
    V25_3_1,
    /// Pre-release format. Documents declaring it still load, with a warning.
    #[serde(rename = "25.4.0")]
    V25_4_0,
    #[serde(rename = "25.4.1")]
    V25_4_1,
    #[serde(rename = "25.4.2")]
    V25_4_2,
    #[serde(rename = "26.1.0")]
    V26_1_0,
    #[serde(rename = "26.2.0")]
    V26_2_0,
}

impl AgentSpecVersion {
    pub const CURRENT: Self = Self::V26_2_0;

    /// Lowest version a built-in component can be exported at.
    pub const DEFAULT_MIN: Self = Self::V25_4_1;

    pub const ALL: [Self; 7] = [
        Self::V25_3_0,
        Self::V25_3_1,
        Self::V25_4_0,
        Self::V25_4_1,
        Self::V25_4_2,
        Self::V26_1_0,
        Self::V26_2_0,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V25_3_0 => "25.3.0",
            Self::V25_3_1 => "25.3.1",
            Self::V25_4_0 => "25.4.0",
            Self::V25_4_1 => "25.4.1",
            Self::V25_4_2 => "25.4.2",
            Self::V26_1_0 => "26.1.0",
            Self::V26_2_0 => "26.2.0",
        }
    }

    /// Whether this is a pre-release value that is only tolerated on read.
    pub fn is_legacy(&self) -> bool {
        matches!(self, Self::V25_4_0)
    }

    /// The version a legacy value is loaded as.
    pub(crate) fn normalized(self) -> Self {
        if self.is_legacy() {
            Self::DEFAULT_MIN
        } else {
            self
        }
    }
}

impl fmt::Display for AgentSpecVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentSpecVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|version| version.as_str() == s.trim())
            .ok_or_else(|| VersionError::UnknownVersion(s.to_string()))
    }
}
