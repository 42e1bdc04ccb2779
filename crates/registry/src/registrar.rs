//! Single-writer publication of newly discovered packet types.
//!
//! # Role
//!
//! The registrar adopts a synthesized declaration into its directory, extends the index
//! and publishes both as one new [`CatalogSnapshot`].
//!
//! # Invariants
//!
//! - Publication is serialized by the writer lock; readers never take it.
//! - A snapshot is only stored once both the directory and the index accepted the
//!   identity. Any failure leaves the published snapshot untouched.
//! - Concurrent discoveries of the same packet converge on the first published
//!   identity; later attempts report [`RegistrationOutcome::AlreadyPresent`].

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use pktcat_worker::Ticket;
use uuid::Uuid;

use crate::directory::AdoptOutcome;
use crate::error::CatalogError;
use crate::identity::{Binding, PacketDecl, PacketIdentity, PacketKey};
use crate::index::RegistryIndex;
use crate::snapshot::CatalogSnapshot;

/// Produces provisional names for dynamic packet types.
pub type NameSource = Arc<dyn Fn() -> Arc<str> + Send + Sync>;

/// Completion handle for a scheduled registration.
pub type RegistrationTicket = Ticket<Result<RegistrationOutcome, CatalogError>>;

/// Attempts made to find an unused provisional name.
const NAME_ATTEMPTS: usize = 2;

/// `<prefix><uuid-v4>` names.
pub fn provisional_names(prefix: impl Into<Arc<str>>) -> NameSource {
	let prefix: Arc<str> = prefix.into();
	Arc::new(move || Arc::from(format!("{prefix}{}", Uuid::new_v4())))
}

/// Progress of a dynamic registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationStage {
	/// A lookup found nothing.
	Miss,
	/// A dynamic declaration was built for the missing packet.
	Synthesized,
	/// Waiting for the directory to adopt it.
	AdoptPending,
	Published,
	Rejected,
}

impl RegistrationStage {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Miss => "miss",
			Self::Synthesized => "synthesized",
			Self::AdoptPending => "adopt_pending",
			Self::Published => "published",
			Self::Rejected => "rejected",
		}
	}

	pub(crate) fn trace(self, key: PacketKey) {
		tracing::trace!(
			stage = self.as_str(),
			phase = %key.phase,
			direction = %key.direction,
			current_id = key.current_id,
			"catalog.register"
		);
	}
}

impl fmt::Display for RegistrationStage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Successful end state of a registration.
#[derive(Debug, Clone)]
pub enum RegistrationOutcome {
	/// This registration published a new identity.
	Published(Arc<PacketIdentity>),
	/// An equivalent identity was already published, possibly by a concurrent caller.
	AlreadyPresent(Arc<PacketIdentity>),
}

impl RegistrationOutcome {
	pub fn identity(&self) -> &Arc<PacketIdentity> {
		match self {
			Self::Published(identity) | Self::AlreadyPresent(identity) => identity,
		}
	}

	pub fn into_identity(self) -> Arc<PacketIdentity> {
		match self {
			Self::Published(identity) | Self::AlreadyPresent(identity) => identity,
		}
	}

	pub fn is_published(&self) -> bool {
		matches!(self, Self::Published(_))
	}
}

pub(crate) struct Registrar {
	published: ArcSwap<CatalogSnapshot>,
	writer: Mutex<()>,
	names: NameSource,
}

impl Registrar {
	pub(crate) fn new(snapshot: CatalogSnapshot, names: NameSource) -> Self {
		Self {
			published: ArcSwap::from_pointee(snapshot),
			writer: Mutex::new(()),
			names,
		}
	}

	/// The current snapshot. Never blocks.
	pub(crate) fn load(&self) -> Arc<CatalogSnapshot> {
		self.published.load_full()
	}

	pub(crate) fn provisional_name(&self) -> Arc<str> {
		(self.names)()
	}

	/// Adopts `decl` under a provisional name and publishes the result.
	///
	/// A taken name is retried once with a fresh one before failing with
	/// [`CatalogError::NameConflict`].
	pub(crate) fn publish(&self, decl: PacketDecl) -> Result<RegistrationOutcome, CatalogError> {
		let _writer = self.writer.lock();
		let current = self.published.load_full();
		let key = decl.key();
		let directory = decl.directory();
		RegistrationStage::AdoptPending.trace(key);

		let mut directories = current.directories().clone();
		let mut attempt = 1;
		loop {
			let name = self.provisional_name();
			match directories.get_mut(directory).adopt(decl.clone(), Binding::new(name)) {
				AdoptOutcome::Adopted(identity) => {
					if let Some((alias, owner)) = claimed_alias(current.index(), &identity) {
						tracing::warn!(
							%alias,
							owner = owner.symbolic_name(),
							%directory,
							"catalog.register.alias_taken"
						);
						RegistrationStage::Rejected.trace(key);
						return Err(CatalogError::NameConflict {
							directory,
							name: alias,
							existing: Arc::from(owner.symbolic_name()),
						});
					}
					let mut index = current.index().clone();
					if let Err(error) = index.add(&identity) {
						tracing::error!(%error, name = identity.symbolic_name(), "catalog.register.index_failed");
						RegistrationStage::Rejected.trace(key);
						return Err(error.into());
					}
					self.published.store(Arc::new(CatalogSnapshot::new(directories, index)));
					RegistrationStage::Published.trace(key);
					tracing::debug!(
						name = identity.symbolic_name(),
						class = identity.canonical_name(),
						%directory,
						current_id = key.current_id,
						"catalog.register.published"
					);
					return Ok(RegistrationOutcome::Published(identity));
				}
				AdoptOutcome::AlreadyPresent(existing) => {
					tracing::trace!(name = existing.symbolic_name(), "catalog.register.already_present");
					return Ok(RegistrationOutcome::AlreadyPresent(existing));
				}
				AdoptOutcome::Conflict { name, existing } => {
					tracing::warn!(%name, attempt, %directory, "catalog.register.name_conflict");
					if attempt == NAME_ATTEMPTS {
						RegistrationStage::Rejected.trace(key);
						return Err(CatalogError::NameConflict {
							directory,
							name,
							existing: Arc::from(existing.symbolic_name()),
						});
					}
					attempt += 1;
				}
			}
		}
	}

	/// Replaces the index with a full rebuild from the published directories.
	pub(crate) fn rebuild(&self) -> Result<(), CatalogError> {
		let _writer = self.writer.lock();
		let current = self.published.load_full();
		let index = RegistryIndex::build(current.directories())?;
		self.published
			.store(Arc::new(CatalogSnapshot::new(current.directories().clone(), index)));
		Ok(())
	}
}

/// The first alias of `identity` already bound to a different identity.
fn claimed_alias(index: &RegistryIndex, identity: &Arc<PacketIdentity>) -> Option<(Arc<str>, Arc<PacketIdentity>)> {
	identity.aliases().iter().find_map(|alias| {
		index
			.resolve_name(identity.phase(), identity.direction(), alias)
			.filter(|owner| !Arc::ptr_eq(owner, identity))
			.map(|owner| (Arc::clone(alias), Arc::clone(owner)))
	})
}
