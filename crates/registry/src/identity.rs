//! Packet type identities.
//!
//! # Role
//!
//! A [`PacketDecl`] describes a packet type as declared: coordinates, ids and names. A
//! [`PhaseDirectory`](crate::PhaseDirectory) consumes the declaration together with a
//! [`Binding`] to produce the immutable [`PacketIdentity`] shared by every lookup table.
//!
//! # Invariants
//!
//! - Identity equality, hashing and ordering consider only [`PacketKey`].
//! - The binding is attached exactly once; `bind` consumes the declaration.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use pktcat_primitives::{Direction, ProtocolPhase, UNKNOWN_ID, VersionTag, format_packet_name};

use crate::binder::ClassBinder;
use crate::directory::DirectoryKey;

/// Logical coordinates of a packet type under the active protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PacketKey {
	pub phase: ProtocolPhase,
	pub direction: Direction,
	pub current_id: i32,
}

impl PacketKey {
	pub const fn new(phase: ProtocolPhase, direction: Direction, current_id: i32) -> Self {
		Self {
			phase,
			direction,
			current_id,
		}
	}

	pub const fn directory(&self) -> DirectoryKey {
		DirectoryKey::new(self.phase, self.direction)
	}

	/// Returns true if the current id is known.
	pub const fn has_current_id(&self) -> bool {
		self.current_id != UNKNOWN_ID
	}
}

impl fmt::Display for PacketKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}/{}#{}", self.phase, self.direction, self.current_id)
	}
}

/// A packet type as declared, before a directory has bound it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketDecl {
	key: PacketKey,
	legacy_id: i32,
	version: VersionTag,
	aliases: Vec<Arc<str>>,
	dynamic: bool,
}

impl PacketDecl {
	/// Declares a packet type named `name`, formatted into canonical form.
	///
	/// Both ids start out unknown and the defining version is the release the
	/// built-in tables describe.
	pub fn new(phase: ProtocolPhase, direction: Direction, name: &str) -> Self {
		Self {
			key: PacketKey::new(phase, direction, UNKNOWN_ID),
			legacy_id: UNKNOWN_ID,
			version: VersionTag::VILLAGE_UPDATE,
			aliases: vec![Arc::from(format_packet_name(phase, direction, name))],
			dynamic: false,
		}
	}

	/// Declares a packet type that only exists in the pre-modern wire format.
	pub fn legacy(direction: Direction, legacy_id: i32, name: &str) -> Self {
		Self::new(ProtocolPhase::Legacy, direction, name)
			.legacy_id(legacy_id)
			.version(VersionTag::WORLD_UPDATE)
	}

	pub fn current_id(mut self, id: i32) -> Self {
		self.key.current_id = id;
		self
	}

	pub fn legacy_id(mut self, id: i32) -> Self {
		self.legacy_id = id;
		self
	}

	pub fn version(mut self, version: VersionTag) -> Self {
		self.version = version;
		self
	}

	/// Adds a further lookup name. Duplicates of existing aliases are ignored.
	pub fn alias(mut self, name: &str) -> Self {
		let formatted = format_packet_name(self.key.phase, self.key.direction, name);
		if !self.aliases.iter().any(|a| **a == *formatted) {
			self.aliases.push(Arc::from(formatted));
		}
		self
	}

	/// Marks the declaration as discovered at runtime.
	pub fn dynamic(mut self) -> Self {
		self.dynamic = true;
		self
	}

	pub fn key(&self) -> PacketKey {
		self.key
	}

	pub fn directory(&self) -> DirectoryKey {
		self.key.directory()
	}

	pub fn declared_legacy_id(&self) -> i32 {
		self.legacy_id
	}

	pub fn canonical_name(&self) -> &str {
		&self.aliases[0]
	}

	pub fn aliases(&self) -> &[Arc<str>] {
		&self.aliases
	}

	pub fn is_dynamic(&self) -> bool {
		self.dynamic
	}

	/// Merges the declaration with its directory binding.
	pub(crate) fn bind(self, binding: Binding) -> PacketIdentity {
		PacketIdentity {
			key: self.key,
			legacy_id: self.legacy_id,
			version: self.version,
			aliases: self.aliases.into_boxed_slice(),
			symbolic_name: binding.name,
			deprecated: binding.deprecated,
			forced_async: binding.forced_async,
			dynamic: self.dynamic,
		}
	}
}

/// Directory-assigned attributes of an identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
	pub name: Arc<str>,
	pub deprecated: bool,
	pub forced_async: bool,
}

impl Binding {
	pub fn new(name: impl Into<Arc<str>>) -> Self {
		Self {
			name: name.into(),
			deprecated: false,
			forced_async: false,
		}
	}

	pub fn deprecated(mut self) -> Self {
		self.deprecated = true;
		self
	}

	pub fn forced_async(mut self) -> Self {
		self.forced_async = true;
		self
	}
}

/// Immutable identity of one packet type.
#[derive(Debug, Clone)]
pub struct PacketIdentity {
	key: PacketKey,
	legacy_id: i32,
	version: VersionTag,
	aliases: Box<[Arc<str>]>,
	symbolic_name: Arc<str>,
	deprecated: bool,
	forced_async: bool,
	dynamic: bool,
}

impl PacketIdentity {
	pub fn key(&self) -> PacketKey {
		self.key
	}

	pub fn phase(&self) -> ProtocolPhase {
		self.key.phase
	}

	pub fn direction(&self) -> Direction {
		self.key.direction
	}

	pub fn directory(&self) -> DirectoryKey {
		self.key.directory()
	}

	/// Id under the active protocol version, or [`UNKNOWN_ID`].
	pub fn current_id(&self) -> i32 {
		self.key.current_id
	}

	/// Id under the pre-modern wire format, or [`UNKNOWN_ID`].
	pub fn legacy_id(&self) -> i32 {
		self.legacy_id
	}

	/// Release the current id is valid for.
	pub fn defining_version(&self) -> VersionTag {
		self.version
	}

	/// Canonical name first, then backward-compatible names.
	pub fn aliases(&self) -> &[Arc<str>] {
		&self.aliases
	}

	pub fn canonical_name(&self) -> &str {
		&self.aliases[0]
	}

	pub fn has_alias(&self, name: &str) -> bool {
		self.aliases.iter().any(|alias| &**alias == name)
	}

	pub fn symbolic_name(&self) -> &str {
		&self.symbolic_name
	}

	pub fn is_deprecated(&self) -> bool {
		self.deprecated
	}

	/// Listeners for this packet type must run off the confined thread.
	pub fn is_forced_async(&self) -> bool {
		self.forced_async
	}

	pub fn is_dynamic(&self) -> bool {
		self.dynamic
	}

	pub fn is_server(&self) -> bool {
		self.key.direction.is_server()
	}

	pub fn is_client(&self) -> bool {
		self.key.direction.is_client()
	}

	/// Renders `NAME[class=Simple, id=N]` when `binder` knows the wire class, falling
	/// back to the unregistered [`Display`](fmt::Display) form otherwise.
	pub fn describe(&self, binder: &dyn ClassBinder) -> String {
		match binder.class_of(self) {
			Some(class) => format!(
				"{}[class={}, id={}]",
				self.symbolic_name,
				class.simple_name(),
				self.key.current_id
			),
			None => self.to_string(),
		}
	}
}

impl PartialEq for PacketIdentity {
	fn eq(&self, other: &Self) -> bool {
		self.key == other.key
	}
}

impl Eq for PacketIdentity {}

impl Hash for PacketIdentity {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.key.hash(state);
	}
}

impl PartialOrd for PacketIdentity {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for PacketIdentity {
	fn cmp(&self, other: &Self) -> Ordering {
		self.key.cmp(&other.key)
	}
}

impl fmt::Display for PacketIdentity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{}[{}, {}, {}, classNames: [",
			self.symbolic_name, self.key.phase, self.key.direction, self.key.current_id
		)?;
		for (i, alias) in self.aliases.iter().enumerate() {
			if i > 0 {
				f.write_str(", ")?;
			}
			f.write_str(alias)?;
		}
		f.write_str("] (unregistered)]")
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashSet;

	use pretty_assertions::assert_eq;
	use proptest::prelude::*;

	use super::*;

	fn identity(phase: ProtocolPhase, direction: Direction, id: i32, name: &str) -> PacketIdentity {
		PacketDecl::new(phase, direction, name).current_id(id).bind(Binding::new(name))
	}

	fn phase_strategy() -> impl Strategy<Value = ProtocolPhase> {
		prop::sample::select(ProtocolPhase::ALL.to_vec())
	}

	fn direction_strategy() -> impl Strategy<Value = Direction> {
		prop::sample::select(Direction::ALL.to_vec())
	}

	#[test]
	fn declaration_formats_names_and_defaults_ids() {
		let decl = PacketDecl::new(ProtocolPhase::Status, Direction::ServerToClient, "ServerInfo").alias("serverInfo");
		assert_eq!(decl.canonical_name(), "PacketStatusOutServerInfo");
		assert_eq!(decl.aliases().len(), 1, "formatted duplicate is ignored");
		assert_eq!(decl.key().current_id, UNKNOWN_ID);
		assert_eq!(decl.declared_legacy_id(), UNKNOWN_ID);
	}

	#[test]
	fn legacy_declaration_targets_the_legacy_phase() {
		let id = PacketDecl::legacy(Direction::ServerToClient, 21, "PickupSpawn").bind(Binding::new("PICKUP_SPAWN"));
		assert_eq!(id.phase(), ProtocolPhase::Legacy);
		assert_eq!(id.current_id(), UNKNOWN_ID);
		assert_eq!(id.legacy_id(), 21);
		assert_eq!(id.defining_version(), VersionTag::WORLD_UPDATE);
		assert_eq!(id.canonical_name(), "PacketLegacyOutPickupSpawn");
	}

	#[test]
	fn binding_attributes_are_carried_over() {
		let id = PacketDecl::new(ProtocolPhase::Status, Direction::ServerToClient, "ServerInfo")
			.current_id(0)
			.bind(Binding::new("SERVER_INFO").forced_async());
		assert_eq!(id.symbolic_name(), "SERVER_INFO");
		assert!(id.is_forced_async());
		assert!(!id.is_deprecated());
		assert!(!id.is_dynamic());
	}

	#[test]
	fn display_uses_the_unregistered_form() {
		let id = identity(ProtocolPhase::Play, Direction::ClientToServer, 3, "Chat");
		assert_eq!(
			id.to_string(),
			"Chat[PLAY, CLIENT_TO_SERVER, 3, classNames: [PacketPlayInChat] (unregistered)]"
		);
	}

	#[test]
	fn equality_ignores_names_and_legacy_ids() {
		let a = identity(ProtocolPhase::Play, Direction::ServerToClient, 0x0E, "Chat");
		let b = PacketDecl::new(ProtocolPhase::Play, Direction::ServerToClient, "SomethingElse")
			.current_id(0x0E)
			.legacy_id(0x02)
			.dynamic()
			.bind(Binding::new("Dynamic-x"));
		assert_eq!(a, b);
		let set: HashSet<_> = [a, b].into_iter().collect();
		assert_eq!(set.len(), 1);
	}

	proptest! {
		#[test]
		fn equality_matches_key_equality(
			pa in phase_strategy(), da in direction_strategy(), ia in -1..8i32,
			pb in phase_strategy(), db in direction_strategy(), ib in -1..8i32,
		) {
			let a = identity(pa, da, ia, "A");
			let b = identity(pb, db, ib, "B");
			prop_assert_eq!(a == b, (pa, da, ia) == (pb, db, ib));
			prop_assert_eq!(a.cmp(&b), (pa, da, ia).cmp(&(pb, db, ib)));
		}
	}
}
