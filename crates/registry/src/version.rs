use pktcat_primitives::VersionTag;

use crate::config::CatalogConfig;

/// Reports which protocol release the peer speaks.
pub trait VersionResolver: Send + Sync {
	fn active_version(&self) -> VersionTag;

	/// Returns true when the peer uses the pre-modern wire format.
	fn uses_legacy_wire_format(&self) -> bool;
}

/// Resolver with a fixed answer, usually taken from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticVersionResolver {
	version: VersionTag,
	legacy_wire_format: bool,
}

impl StaticVersionResolver {
	pub const fn new(version: VersionTag, legacy_wire_format: bool) -> Self {
		Self {
			version,
			legacy_wire_format,
		}
	}

	pub fn from_config(config: &CatalogConfig) -> Self {
		Self::new(config.protocol_version, config.legacy_wire_format)
	}
}

impl Default for StaticVersionResolver {
	fn default() -> Self {
		Self::new(VersionTag::VILLAGE_UPDATE, false)
	}
}

impl VersionResolver for StaticVersionResolver {
	fn active_version(&self) -> VersionTag {
		self.version
	}

	fn uses_legacy_wire_format(&self) -> bool {
		self.legacy_wire_format
	}
}
