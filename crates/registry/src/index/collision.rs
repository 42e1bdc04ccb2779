//! Name collision diagnostics.

use std::fmt;
use std::sync::Arc;

use crate::directory::DirectoryKey;
use crate::identity::PacketIdentity;

/// Which kind of name lost a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
	/// Directory-assigned symbolic name.
	Symbolic,
	/// Canonical or backward-compatible alias.
	Alias,
	/// Directory alias record for a renamed packet.
	AliasRecord,
}

impl fmt::Display for KeyKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Symbolic => write!(f, "symbolic"),
			Self::Alias => write!(f, "alias"),
			Self::AliasRecord => write!(f, "alias_record"),
		}
	}
}

/// A name that two identities of the same directory both claimed.
///
/// The existing binding is always kept; the incoming identity stays reachable through
/// its other keys.
#[derive(Debug, Clone)]
pub struct Collision {
	pub directory: DirectoryKey,
	pub key: Arc<str>,
	pub kind: KeyKind,
	pub existing: Arc<PacketIdentity>,
	pub incoming: Arc<PacketIdentity>,
}

impl fmt::Display for Collision {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{} {} {:?}: kept {}, dropped {}",
			self.directory,
			self.kind,
			self.key,
			self.existing.symbolic_name(),
			self.incoming.symbolic_name()
		)
	}
}
