//! Catalogue configuration loaded from TOML.

use std::path::{Path, PathBuf};

use pktcat_primitives::VersionTag;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable naming a TOML file for the process-wide catalogue.
pub const CONFIG_ENV: &str = "PKTCAT_CONFIG";

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error reading a configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// Error parsing TOML syntax or an unexpected field.
	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
	/// Release the current packet ids are taken from.
	pub protocol_version: VersionTag,
	/// Whether the peer speaks the pre-modern wire format. Controls whether
	/// [`Catalog::values`](crate::Catalog::values) includes legacy directories.
	pub legacy_wire_format: bool,
	/// Prefix of provisional names given to dynamically registered packet types.
	pub dynamic_name_prefix: String,
	pub confined_thread: ConfinedThreadConfig,
}

impl Default for CatalogConfig {
	fn default() -> Self {
		Self {
			protocol_version: VersionTag::VILLAGE_UPDATE,
			legacy_wire_format: false,
			dynamic_name_prefix: "Dynamic-".to_owned(),
			confined_thread: ConfinedThreadConfig::default(),
		}
	}
}

/// Settings for the thread all catalogue mutation is confined to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfinedThreadConfig {
	/// When disabled, registrations run inline on the calling thread.
	pub enabled: bool,
	pub name: String,
}

impl Default for ConfinedThreadConfig {
	fn default() -> Self {
		Self {
			enabled: true,
			name: "pktcat-registrar".to_owned(),
		}
	}
}

impl CatalogConfig {
	/// Parse a TOML string. Missing fields take their defaults.
	pub fn parse(input: &str) -> Result<Self> {
		Ok(toml::from_str(input)?)
	}

	/// Load configuration from a file.
	pub fn load(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
			path: path.to_path_buf(),
			error: e,
		})?;
		Self::parse(&content)
	}

	/// Loads the file named by [`CONFIG_ENV`], or the defaults when it is unset.
	pub fn from_env() -> Result<Self> {
		match std::env::var_os(CONFIG_ENV) {
			Some(path) => Self::load(path),
			None => Ok(Self::default()),
		}
	}
}

#[cfg(test)]
mod tests {
	use std::io::Write;

	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn empty_document_yields_defaults() {
		assert_eq!(CatalogConfig::parse("").unwrap(), CatalogConfig::default());
	}

	#[test]
	fn parses_every_field() {
		let config = CatalogConfig::parse(
			r#"
protocol_version = "1.12.2"
legacy_wire_format = true
dynamic_name_prefix = "Unknown-"

[confined_thread]
enabled = false
name = "net-main"
"#,
		)
		.unwrap();

		assert_eq!(config.protocol_version, VersionTag::new(1, 12, 2));
		assert!(config.legacy_wire_format);
		assert_eq!(config.dynamic_name_prefix, "Unknown-");
		assert_eq!(
			config.confined_thread,
			ConfinedThreadConfig {
				enabled: false,
				name: "net-main".to_owned(),
			}
		);
	}

	#[test]
	fn round_trips_through_toml() {
		let config = CatalogConfig {
			legacy_wire_format: true,
			confined_thread: ConfinedThreadConfig {
				name: "writer".to_owned(),
				..Default::default()
			},
			..Default::default()
		};
		let text = toml::to_string(&config).unwrap();
		assert_eq!(CatalogConfig::parse(&text).unwrap(), config);
	}

	#[test]
	fn rejects_unknown_fields_and_bad_versions() {
		assert!(matches!(CatalogConfig::parse("threads = 4"), Err(ConfigError::Toml(_))));
		assert!(matches!(
			CatalogConfig::parse("protocol_version = \"one.two\""),
			Err(ConfigError::Toml(_))
		));
	}

	#[test]
	fn load_reads_files_and_reports_missing_ones() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "legacy_wire_format = true").unwrap();
		let config = CatalogConfig::load(file.path()).unwrap();
		assert!(config.legacy_wire_format);

		let missing = file.path().with_extension("missing");
		match CatalogConfig::load(&missing) {
			Err(ConfigError::Io { path, .. }) => assert_eq!(path, missing),
			other => panic!("expected Io error, got {other:?}"),
		}
	}
}
