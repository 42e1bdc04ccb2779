//! Per-(phase, direction) packet directories.
//!
//! # Role
//!
//! A [`PhaseDirectory`] owns every identity of one phase/direction pair in declaration
//! order, and the symbolic names bound to them. The [`DirectorySet`] holds all ten
//! directories in the fixed enumeration order.
//!
//! # Invariants
//!
//! - Every entry carries the directory's phase and direction.
//! - No two entries share a known current id.
//! - A symbolic name is bound to at most one identity.
//!
//! Directories are not internally synchronized; the registrar serializes mutation.

use std::fmt;
use std::sync::Arc;

use pktcat_primitives::{Direction, ProtocolPhase, UNKNOWN_ID};
use rustc_hash::FxHashMap;

use crate::error::{CatalogError, LookupKey};
use crate::identity::{Binding, PacketDecl, PacketIdentity};

/// A (phase, direction) pair naming one directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DirectoryKey {
	pub phase: ProtocolPhase,
	pub direction: Direction,
}

impl DirectoryKey {
	/// Number of directories.
	pub const COUNT: usize = ProtocolPhase::ALL.len() * Direction::ALL.len();

	/// All directories in enumeration order.
	pub const ALL: [Self; Self::COUNT] = {
		let mut out = [Self::new(ProtocolPhase::Handshaking, Direction::ClientToServer); Self::COUNT];
		let mut i = 0;
		while i < Self::COUNT {
			out[i] = Self::new(ProtocolPhase::ALL[i / 2], Direction::ALL[i % 2]);
			i += 1;
		}
		out
	};

	pub const fn new(phase: ProtocolPhase, direction: Direction) -> Self {
		Self { phase, direction }
	}

	/// Position of this directory in [`DirectoryKey::ALL`].
	pub const fn slot(self) -> usize {
		self.phase as usize * 2 + self.direction as usize
	}
}

impl fmt::Display for DirectoryKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}/{}", self.phase, self.direction)
	}
}

/// A retired name kept resolvable by pointing it at a live identity.
#[derive(Debug, Clone)]
pub struct AliasRecord {
	pub name: Arc<str>,
	pub target: Arc<PacketIdentity>,
}

/// Result of [`PhaseDirectory::adopt`].
#[derive(Debug, Clone)]
pub enum AdoptOutcome {
	/// The identity was bound and appended.
	Adopted(Arc<PacketIdentity>),
	/// An equivalent identity already exists; nothing changed.
	AlreadyPresent(Arc<PacketIdentity>),
	/// The proposed name belongs to a different identity; nothing changed.
	Conflict {
		name: Arc<str>,
		existing: Arc<PacketIdentity>,
	},
}

#[derive(Debug, Clone, Copy)]
enum NameSlot {
	Entry(usize),
	Alias(usize),
}

#[derive(Debug, Clone)]
pub struct PhaseDirectory {
	key: DirectoryKey,
	entries: Vec<Arc<PacketIdentity>>,
	aliases: Vec<AliasRecord>,
	names: FxHashMap<Arc<str>, NameSlot>,
}

impl PhaseDirectory {
	pub fn new(key: DirectoryKey) -> Self {
		Self {
			key,
			entries: Vec::new(),
			aliases: Vec::new(),
			names: FxHashMap::default(),
		}
	}

	pub fn key(&self) -> DirectoryKey {
		self.key
	}

	/// Entries in declaration order, followed by dynamic entries in registration order.
	pub fn enumerate(&self) -> &[Arc<PacketIdentity>] {
		&self.entries
	}

	pub fn alias_records(&self) -> &[AliasRecord] {
		&self.aliases
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Binds `decl` under `binding.name` and appends the resulting identity.
	///
	/// # Panics
	///
	/// Panics if the declaration belongs to another directory.
	pub fn adopt(&mut self, decl: PacketDecl, binding: Binding) -> AdoptOutcome {
		assert_eq!(
			decl.directory(),
			self.key,
			"{} declared into the {} directory",
			decl.canonical_name(),
			self.key
		);

		if let Some(existing) = self.find_equivalent(&decl) {
			return AdoptOutcome::AlreadyPresent(Arc::clone(existing));
		}
		if let Some(existing) = self.resolve_by_name(&binding.name) {
			return AdoptOutcome::Conflict {
				name: binding.name,
				existing: Arc::clone(existing),
			};
		}

		let name = Arc::clone(&binding.name);
		let identity = Arc::new(decl.bind(binding));
		self.names.insert(name, NameSlot::Entry(self.entries.len()));
		self.entries.push(Arc::clone(&identity));
		AdoptOutcome::Adopted(identity)
	}

	/// Keeps `old_name` resolvable as a deprecated name for the entry bound to
	/// `target_name`.
	pub fn alias(&mut self, old_name: &str, target_name: &str) -> Result<Arc<PacketIdentity>, CatalogError> {
		let Some(target) = self.resolve_by_name(target_name).cloned() else {
			return Err(CatalogError::NotFound(LookupKey::Name {
				phase: self.key.phase,
				direction: self.key.direction,
				name: Arc::from(target_name),
			}));
		};
		if let Some(existing) = self.resolve_by_name(old_name) {
			return Err(CatalogError::NameConflict {
				directory: self.key,
				name: Arc::from(old_name),
				existing: Arc::from(existing.symbolic_name()),
			});
		}

		let name: Arc<str> = Arc::from(old_name);
		self.names.insert(Arc::clone(&name), NameSlot::Alias(self.aliases.len()));
		self.aliases.push(AliasRecord {
			name,
			target: Arc::clone(&target),
		});
		Ok(target)
	}

	/// Resolves a symbolic name or alias record.
	pub fn resolve_by_name(&self, name: &str) -> Option<&Arc<PacketIdentity>> {
		match *self.names.get(name)? {
			NameSlot::Entry(i) => self.entries.get(i),
			NameSlot::Alias(i) => self.aliases.get(i).map(|record| &record.target),
		}
	}

	pub fn resolve_by_id(&self, current_id: i32) -> Option<&Arc<PacketIdentity>> {
		if current_id == UNKNOWN_ID {
			return None;
		}
		self.entries.iter().find(|e| e.current_id() == current_id)
	}

	/// Returns true if `name` is an alias record or the name of a deprecated entry.
	pub fn is_deprecated_name(&self, name: &str) -> bool {
		match self.names.get(name) {
			Some(NameSlot::Alias(_)) => true,
			Some(NameSlot::Entry(i)) => self.entries[*i].is_deprecated(),
			None => false,
		}
	}

	fn find_equivalent(&self, decl: &PacketDecl) -> Option<&Arc<PacketIdentity>> {
		let key = decl.key();
		if key.has_current_id() {
			return self.resolve_by_id(key.current_id);
		}
		let legacy_id = decl.declared_legacy_id();
		if legacy_id != UNKNOWN_ID {
			return self
				.entries
				.iter()
				.find(|e| !e.key().has_current_id() && e.legacy_id() == legacy_id);
		}
		self.entries
			.iter()
			.find(|e| !e.key().has_current_id() && e.legacy_id() == UNKNOWN_ID && e.has_alias(decl.canonical_name()))
	}
}

/// All ten directories, shared copy-on-write between snapshots.
#[derive(Debug, Clone)]
pub struct DirectorySet {
	directories: [Arc<PhaseDirectory>; DirectoryKey::COUNT],
}

impl Default for DirectorySet {
	fn default() -> Self {
		Self::new()
	}
}

impl DirectorySet {
	pub fn new() -> Self {
		Self {
			directories: std::array::from_fn(|slot| Arc::new(PhaseDirectory::new(DirectoryKey::ALL[slot]))),
		}
	}

	pub fn get(&self, key: DirectoryKey) -> &PhaseDirectory {
		&self.directories[key.slot()]
	}

	/// Mutable access; clones the directory first if a published snapshot shares it.
	pub fn get_mut(&mut self, key: DirectoryKey) -> &mut PhaseDirectory {
		Arc::make_mut(&mut self.directories[key.slot()])
	}

	/// Directories in enumeration order.
	pub fn iter(&self) -> impl Iterator<Item = &PhaseDirectory> {
		self.directories.iter().map(|d| &**d)
	}

	/// Directories in enumeration order, skipping the legacy phase unless asked for.
	pub fn iter_included(&self, include_legacy: bool) -> impl Iterator<Item = &PhaseDirectory> {
		self.iter().filter(move |d| include_legacy || !d.key().phase.is_legacy())
	}

	/// Total number of identities across all directories.
	pub fn len(&self) -> usize {
		self.directories.iter().map(|d| d.len()).sum()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}
