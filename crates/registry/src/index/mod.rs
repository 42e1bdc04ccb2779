//! Multi-key lookup tables derived from the directories.
//!
//! # Role
//!
//! [`RegistryIndex`] answers the three lookup coordinate systems: current id, name and
//! legacy id. It is derived data and can always be rebuilt from a
//! [`DirectorySet`](crate::DirectorySet).
//!
//! # Invariants
//!
//! - At most one identity per `(phase, direction, current_id)`; a second claimant is
//!   a fatal [`IndexError`], never an overwrite.
//! - Name bindings are first-wins; losers are recorded as [`Collision`]s.
//! - Legacy buckets keep insertion order, which is the enumeration order of a build.
//! - Building from the same directories twice yields identical tables.

mod collision;

use std::collections::hash_map::Entry;
use std::sync::Arc;

use pktcat_primitives::{Direction, ProtocolPhase, UNKNOWN_ID, format_packet_name};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

pub use self::collision::{Collision, KeyKind};
use crate::directory::{DirectoryKey, DirectorySet};
use crate::error::IndexError;
use crate::identity::{PacketIdentity, PacketKey};

type LegacyBucket = SmallVec<[Arc<PacketIdentity>; 2]>;

#[derive(Debug, Clone, Default)]
pub struct RegistryIndex {
	by_current: FxHashMap<PacketKey, Arc<PacketIdentity>>,
	by_name: [FxHashMap<Arc<str>, Arc<PacketIdentity>>; DirectoryKey::COUNT],
	by_legacy: FxHashMap<i32, LegacyBucket>,
	collisions: Vec<Collision>,
}

impl RegistryIndex {
	/// Builds all tables from scratch.
	///
	/// Directories are visited in enumeration order; within a directory, entries come
	/// before alias records.
	pub fn build(directories: &DirectorySet) -> Result<Self, IndexError> {
		let mut index = Self::default();
		for directory in directories.iter() {
			for identity in directory.enumerate() {
				index.add(identity)?;
			}
			for record in directory.alias_records() {
				index.bind_name(directory.key(), &record.name, &record.target, KeyKind::AliasRecord);
			}
		}
		tracing::debug!(
			identities = index.by_current.len(),
			legacy_ids = index.by_legacy.len(),
			collisions = index.collisions.len(),
			"catalog.index.build"
		);
		Ok(index)
	}

	/// Inserts one adopted identity into every table.
	///
	/// Re-adding the same identity is a no-op.
	pub fn add(&mut self, identity: &Arc<PacketIdentity>) -> Result<(), IndexError> {
		let key = identity.key();
		if key.has_current_id() {
			match self.by_current.entry(key) {
				Entry::Occupied(slot) if Arc::ptr_eq(slot.get(), identity) => {}
				Entry::Occupied(slot) => {
					return Err(IndexError::DuplicateCurrentId {
						key,
						existing: Arc::from(slot.get().symbolic_name()),
						incoming: Arc::from(identity.symbolic_name()),
					});
				}
				Entry::Vacant(slot) => {
					slot.insert(Arc::clone(identity));
				}
			}
		}

		let directory = identity.directory();
		let symbolic: Arc<str> = Arc::from(identity.symbolic_name());
		self.bind_name(directory, &symbolic, identity, KeyKind::Symbolic);
		for alias in identity.aliases() {
			self.bind_name(directory, alias, identity, KeyKind::Alias);
		}

		if identity.legacy_id() != UNKNOWN_ID {
			let bucket = self.by_legacy.entry(identity.legacy_id()).or_default();
			if !bucket.iter().any(|e| Arc::ptr_eq(e, identity)) {
				bucket.push(Arc::clone(identity));
			}
		}
		Ok(())
	}

	fn bind_name(&mut self, directory: DirectoryKey, name: &Arc<str>, identity: &Arc<PacketIdentity>, kind: KeyKind) {
		match self.by_name[directory.slot()].entry(Arc::clone(name)) {
			Entry::Vacant(slot) => {
				slot.insert(Arc::clone(identity));
			}
			Entry::Occupied(slot) if Arc::ptr_eq(slot.get(), identity) => {}
			Entry::Occupied(slot) => {
				tracing::warn!(
					directory = %directory,
					key = %name,
					kind = %kind,
					existing = slot.get().symbolic_name(),
					incoming = identity.symbolic_name(),
					"catalog.index.collision"
				);
				self.collisions.push(Collision {
					directory,
					key: Arc::clone(name),
					kind,
					existing: Arc::clone(slot.get()),
					incoming: Arc::clone(identity),
				});
			}
		}
	}

	pub fn resolve_current(&self, phase: ProtocolPhase, direction: Direction, current_id: i32) -> Option<&Arc<PacketIdentity>> {
		self.by_current.get(&PacketKey::new(phase, direction, current_id))
	}

	/// Resolves a bare, canonical or symbolic name.
	///
	/// Bare names are formatted into canonical form first; the raw name is tried
	/// second so that symbolic names resolve too.
	pub fn resolve_name(&self, phase: ProtocolPhase, direction: Direction, name: &str) -> Option<&Arc<PacketIdentity>> {
		let table = &self.by_name[DirectoryKey::new(phase, direction).slot()];
		let normalized = format_packet_name(phase, direction, name);
		table.get(&*normalized).or_else(|| table.get(name))
	}

	/// Resolves a legacy id.
	///
	/// An identity in `preferred` direction wins when one exists; otherwise the first
	/// identity inserted under the id.
	pub fn resolve_legacy(&self, legacy_id: i32, preferred: Option<Direction>) -> Option<&Arc<PacketIdentity>> {
		let bucket = self.by_legacy.get(&legacy_id)?;
		preferred
			.and_then(|direction| bucket.iter().find(|e| e.direction() == direction))
			.or_else(|| bucket.first())
	}

	/// Every identity, in any directory, whose alias set contains `name`.
	///
	/// Bare names are formatted per directory before matching.
	pub fn resolve_by_alias(&self, name: &str) -> Vec<Arc<PacketIdentity>> {
		let mut found: Vec<Arc<PacketIdentity>> = Vec::new();
		let mut push = |identity: &Arc<PacketIdentity>| {
			if !found.iter().any(|e| Arc::ptr_eq(e, identity)) {
				found.push(Arc::clone(identity));
			}
		};
		for key in DirectoryKey::ALL {
			let normalized = format_packet_name(key.phase, key.direction, name);
			if let Some(hit) = self.by_name[key.slot()].get(&*normalized)
				&& hit.has_alias(&normalized)
			{
				push(hit);
			}
			for collision in &self.collisions {
				if collision.directory == key && *collision.key == *normalized && collision.incoming.has_alias(&normalized) {
					push(&collision.incoming);
				}
			}
		}
		found
	}

	pub fn collisions(&self) -> &[Collision] {
		&self.collisions
	}

	/// Number of identities reachable by current id.
	pub fn current_len(&self) -> usize {
		self.by_current.len()
	}

	/// Number of bound names across all directories.
	pub fn name_len(&self) -> usize {
		self.by_name.iter().map(|t| t.len()).sum()
	}

	/// Number of distinct legacy ids.
	pub fn legacy_len(&self) -> usize {
		self.by_legacy.len()
	}

	/// Identities sharing `legacy_id`, in insertion order.
	pub fn legacy_bucket(&self, legacy_id: i32) -> &[Arc<PacketIdentity>] {
		self.by_legacy.get(&legacy_id).map(|bucket| bucket.as_slice()).unwrap_or_default()
	}
}
