//! Configuration handling for tugtype.
//!
//! Configuration is read from TOML. Every field has a default, so an empty
//! file (or no file at all) yields a usable configuration:
//!
//! ```toml
//! [aligner]
//! python_version = "3.6"
//!
//! [callgraph]
//! module_id = "module"
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::{ConfigError, ConfigResult};

/// Tugtype configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Trace alignment settings.
    #[serde(default)]
    pub aligner: AlignerConfig,

    /// Call-graph settings.
    #[serde(default)]
    pub callgraph: CallGraphConfig,
}

/// Trace alignment settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AlignerConfig {
    /// Python version the traces were produced for.
    #[serde(default = "default_python_version")]
    pub python_version: PythonVersion,
}

/// Call-graph settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CallGraphConfig {
    /// Function id under which top-level calls are recorded.
    #[serde(default = "default_module_id")]
    pub module_id: String,
}

fn default_python_version() -> PythonVersion {
    PythonVersion::new(3, 7)
}

fn default_module_id() -> String {
    "module".to_string()
}

impl Default for AlignerConfig {
    fn default() -> Self {
        AlignerConfig {
            python_version: default_python_version(),
        }
    }
}

impl AlignerConfig {
    /// Configuration for a specific Python version.
    pub fn for_version(major: u8, minor: u8) -> Self {
        AlignerConfig {
            python_version: PythonVersion::new(major, minor),
        }
    }

    /// True when the bytecode places the stores of a multi-line assignment
    /// on the last line of the assigned expression rather than on the
    /// target's own line. This is the case before Python 3.7.
    pub fn has_assign_line_skew(&self) -> bool {
        self.python_version < PythonVersion::new(3, 7)
    }
}

impl Default for CallGraphConfig {
    fn default() -> Self {
        CallGraphConfig {
            module_id: default_module_id(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Load configuration from a file if it exists, otherwise use defaults.
    pub fn load_or_default(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Config::default())
        }
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }
}

// ============================================================================
// PythonVersion
// ============================================================================

/// A `major.minor` Python version.
///
/// Serialized as a `"3.6"` style string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PythonVersion {
    pub major: u8,
    pub minor: u8,
}

impl PythonVersion {
    pub fn new(major: u8, minor: u8) -> Self {
        PythonVersion { major, minor }
    }
}

impl fmt::Display for PythonVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for PythonVersion {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidPythonVersion {
            value: s.to_string(),
        };
        let (major, minor) = s.trim().split_once('.').ok_or_else(invalid)?;
        Ok(PythonVersion::new(
            major.parse().map_err(|_| invalid())?,
            minor.parse().map_err(|_| invalid())?,
        ))
    }
}

impl Serialize for PythonVersion {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PythonVersion {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Tests
// ============================================================================
