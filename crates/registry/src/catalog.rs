//! The catalogue facade.
//!
//! # Role
//!
//! [`Catalog`] ties the published snapshot, the registrar, the class binder and the
//! version resolver together and exposes every lookup and registration operation.
//!
//! # Invariants
//!
//! - Lookups load one snapshot and never block on writers.
//! - Registrations run on the confined executor when one is installed, inline
//!   otherwise.
//! - The process-wide catalogue returned by [`global`] is built once and never torn down.

use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use pktcat_primitives::{Direction, ProtocolPhase, UNKNOWN_ID};
use pktcat_worker::{ConfinedExecutor, ConfinedThread, run_confined};

use crate::binder::{ClassBinder, StaticClassBinder, WireClass};
use crate::builtins::register_builtins;
use crate::config::CatalogConfig;
use crate::directory::DirectorySet;
use crate::error::{CatalogError, LookupKey};
use crate::identity::{Binding, PacketDecl, PacketIdentity, PacketKey};
use crate::index::RegistryIndex;
use crate::registrar::{NameSource, Registrar, RegistrationOutcome, RegistrationStage, RegistrationTicket, provisional_names};
use crate::snapshot::CatalogSnapshot;
use crate::version::{StaticVersionResolver, VersionResolver};

static GLOBAL: OnceLock<Catalog> = OnceLock::new();

/// The process-wide catalogue.
///
/// Configuration is read from the file named by [`CONFIG_ENV`](crate::config::CONFIG_ENV)
/// on first use. Failures are logged and the catalogue falls back to whatever could be
/// built; this accessor never fails.
pub fn global() -> &'static Catalog {
	GLOBAL.get_or_init(|| {
		let config = CatalogConfig::from_env().unwrap_or_else(|error| {
			tracing::error!(%error, "catalog.config.load_failed");
			CatalogConfig::default()
		});
		Catalog::builder(config).build_lenient()
	})
}

enum ExecutorChoice {
	FromConfig,
	Inline,
	Provided(Arc<dyn ConfinedExecutor>),
}

/// Assembles a [`Catalog`] from configuration and optional collaborators.
pub struct CatalogBuilder {
	config: CatalogConfig,
	binder: Option<Arc<dyn ClassBinder>>,
	versions: Option<Arc<dyn VersionResolver>>,
	executor: ExecutorChoice,
	names: Option<NameSource>,
}

impl CatalogBuilder {
	fn new(config: CatalogConfig) -> Self {
		Self {
			config,
			binder: None,
			versions: None,
			executor: ExecutorChoice::FromConfig,
			names: None,
		}
	}

	/// Defaults to an empty [`StaticClassBinder`].
	pub fn binder(mut self, binder: Arc<dyn ClassBinder>) -> Self {
		self.binder = Some(binder);
		self
	}

	/// Defaults to a [`StaticVersionResolver`] built from the configuration.
	pub fn version_resolver(mut self, versions: Arc<dyn VersionResolver>) -> Self {
		self.versions = Some(versions);
		self
	}

	/// Confines registrations to `executor` instead of a thread spawned from the
	/// configuration.
	pub fn executor(mut self, executor: Arc<dyn ConfinedExecutor>) -> Self {
		self.executor = ExecutorChoice::Provided(executor);
		self
	}

	/// Runs registrations inline on the calling thread.
	pub fn without_confinement(mut self) -> Self {
		self.executor = ExecutorChoice::Inline;
		self
	}

	/// Replaces the provisional name generator.
	pub fn name_source(mut self, names: NameSource) -> Self {
		self.names = Some(names);
		self
	}

	/// Registers the built-in tables, builds the index and starts the confined thread.
	pub fn build(self) -> Result<Catalog, CatalogError> {
		let versions = self.resolver();
		let mut directories = DirectorySet::new();
		register_builtins(&mut directories, versions.active_version())?;
		let index = RegistryIndex::build(&directories)?;
		let executor = match self.executor {
			ExecutorChoice::FromConfig => spawn_configured(&self.config)?,
			ExecutorChoice::Inline => None,
			ExecutorChoice::Provided(ref executor) => Some(Arc::clone(executor)),
		};
		Ok(self.finish(versions, CatalogSnapshot::new(directories, index), executor))
	}

	/// Like [`build`](Self::build), but logs failures and carries on with a partial
	/// catalogue: whatever built-ins were adopted, and inline registration if the
	/// confined thread cannot be started.
	pub fn build_lenient(self) -> Catalog {
		let versions = self.resolver();
		let mut directories = DirectorySet::new();
		if let Err(error) = register_builtins(&mut directories, versions.active_version()) {
			tracing::error!(%error, "catalog.builtins.failed");
		}
		let index = RegistryIndex::build(&directories).unwrap_or_else(|error| {
			tracing::error!(%error, "catalog.index.build_failed");
			RegistryIndex::default()
		});
		let executor = match self.executor {
			ExecutorChoice::FromConfig => spawn_configured(&self.config).unwrap_or_else(|error| {
				tracing::error!(%error, "catalog.executor.spawn_failed");
				None
			}),
			ExecutorChoice::Inline => None,
			ExecutorChoice::Provided(ref executor) => Some(Arc::clone(executor)),
		};
		self.finish(versions, CatalogSnapshot::new(directories, index), executor)
	}

	fn resolver(&self) -> Arc<dyn VersionResolver> {
		self.versions
			.clone()
			.unwrap_or_else(|| Arc::new(StaticVersionResolver::from_config(&self.config)))
	}

	fn finish(
		self,
		versions: Arc<dyn VersionResolver>,
		snapshot: CatalogSnapshot,
		executor: Option<Arc<dyn ConfinedExecutor>>,
	) -> Catalog {
		let names = self
			.names
			.unwrap_or_else(|| provisional_names(self.config.dynamic_name_prefix.as_str()));
		tracing::debug!(
			packets = snapshot.directories().len(),
			version = %versions.active_version(),
			confined = executor.is_some(),
			"catalog.built"
		);
		Catalog {
			registrar: Arc::new(Registrar::new(snapshot, names)),
			binder: self.binder.unwrap_or_else(|| Arc::new(StaticClassBinder::new())),
			versions,
			executor,
			config: self.config,
		}
	}
}

fn spawn_configured(config: &CatalogConfig) -> Result<Option<Arc<dyn ConfinedExecutor>>, CatalogError> {
	if !config.confined_thread.enabled {
		return Ok(None);
	}
	let thread = ConfinedThread::spawn(config.confined_thread.name.as_str())
		.map_err(|e| CatalogError::ExecutorSpawn(e.to_string()))?;
	Ok(Some(Arc::new(thread)))
}

/// Packet type catalogue.
///
/// Cheap to share behind an `Arc`; every method takes `&self`.
pub struct Catalog {
	registrar: Arc<Registrar>,
	binder: Arc<dyn ClassBinder>,
	versions: Arc<dyn VersionResolver>,
	executor: Option<Arc<dyn ConfinedExecutor>>,
	config: CatalogConfig,
}

impl Catalog {
	/// Builds a catalogue from `config` with default collaborators.
	pub fn new(config: CatalogConfig) -> Result<Self, CatalogError> {
		Self::builder(config).build()
	}

	pub fn builder(config: CatalogConfig) -> CatalogBuilder {
		CatalogBuilder::new(config)
	}

	pub fn config(&self) -> &CatalogConfig {
		&self.config
	}

	pub fn binder(&self) -> &Arc<dyn ClassBinder> {
		&self.binder
	}

	/// The currently published snapshot.
	pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
		self.registrar.load()
	}

	pub fn resolve_current(&self, phase: ProtocolPhase, direction: Direction, current_id: i32) -> Option<Arc<PacketIdentity>> {
		self.snapshot().index().resolve_current(phase, direction, current_id).cloned()
	}

	/// Resolves a bare name, canonical name or symbolic name within one directory.
	pub fn resolve_name(&self, phase: ProtocolPhase, direction: Direction, name: &str) -> Option<Arc<PacketIdentity>> {
		self.snapshot().index().resolve_name(phase, direction, name).cloned()
	}

	/// Resolves a legacy id, preferring `preferred` when both directions use it.
	pub fn resolve_legacy(&self, legacy_id: i32, preferred: Option<Direction>) -> Option<Arc<PacketIdentity>> {
		self.snapshot().index().resolve_legacy(legacy_id, preferred).cloned()
	}

	pub fn find_current(&self, phase: ProtocolPhase, direction: Direction, current_id: i32) -> Result<Arc<PacketIdentity>, CatalogError> {
		self.resolve_current(phase, direction, current_id)
			.ok_or(CatalogError::NotFound(LookupKey::Current(PacketKey::new(phase, direction, current_id))))
	}

	pub fn find_name(&self, phase: ProtocolPhase, direction: Direction, name: &str) -> Result<Arc<PacketIdentity>, CatalogError> {
		self.resolve_name(phase, direction, name).ok_or_else(|| {
			CatalogError::NotFound(LookupKey::Name {
				phase,
				direction,
				name: Arc::from(name),
			})
		})
	}

	pub fn find_legacy(&self, legacy_id: i32, preferred: Option<Direction>) -> Result<Arc<PacketIdentity>, CatalogError> {
		self.resolve_legacy(legacy_id, preferred)
			.ok_or(CatalogError::NotFound(LookupKey::Legacy { legacy_id, preferred }))
	}

	/// [`find_name`](Self::find_name) with the phase and direction given in text,
	/// e.g. `("STATUS", "SERVER", "ServerInfo")`.
	pub fn find_named(&self, phase: &str, direction: &str, name: &str) -> Result<Arc<PacketIdentity>, CatalogError> {
		let phase = ProtocolPhase::from_str(phase)?;
		let direction = Direction::from_str(direction)?;
		self.find_name(phase, direction, name)
	}

	pub fn has_current(&self, phase: ProtocolPhase, direction: Direction, current_id: i32) -> bool {
		self.resolve_current(phase, direction, current_id).is_some()
	}

	pub fn has_legacy(&self, legacy_id: i32) -> bool {
		!self.snapshot().index().legacy_bucket(legacy_id).is_empty()
	}

	pub fn has_class(&self, class: &WireClass) -> bool {
		self.binder.identity_of(class).is_some()
	}

	/// The identity a wire class is bound to.
	pub fn from_class(&self, class: &WireClass) -> Result<Arc<PacketIdentity>, CatalogError> {
		self.binder
			.identity_of(class)
			.ok_or_else(|| CatalogError::NotAPacketClass(Arc::from(class.name())))
	}

	/// Resolves `current_id`, registering a dynamic packet type on a miss.
	///
	/// A class whose name already belongs to a packet type in the directory resolves to
	/// that packet type instead of registering a second one under the same name.
	///
	/// Never fails. Concurrent callers for the same packet all receive the one
	/// published identity. When publication itself fails the error is logged and an
	/// unpublished identity is returned; the class stays unbound.
	///
	/// Blocks on the registration ticket. Safe on tokio worker threads, see
	/// [`Ticket::wait`](pktcat_worker::Ticket::wait).
	pub fn from_id_dynamic(&self, phase: ProtocolPhase, direction: Direction, current_id: i32, class: &WireClass) -> Arc<PacketIdentity> {
		if let Some(identity) = self.resolve_current(phase, direction, current_id) {
			return identity;
		}
		let key = PacketKey::new(phase, direction, current_id);
		RegistrationStage::Miss.trace(key);

		if let Some(identity) = self.resolve_name(phase, direction, class.simple_name()) {
			tracing::debug!(
				%key,
				class = class.name(),
				existing = identity.symbolic_name(),
				"catalog.register.resolved_by_class"
			);
			self.binder.remember(class, &identity);
			return identity;
		}

		let decl = PacketDecl::new(phase, direction, class.simple_name())
			.current_id(current_id)
			.version(self.versions.active_version())
			.dynamic();
		match self.register_blocking(decl.clone()) {
			Ok(identity) => {
				self.binder.remember(class, &identity);
				identity
			}
			Err(error) => self.detached(decl, &error),
		}
	}

	/// Resolves a wire class to its identity.
	///
	/// Tries the binder, then the class' simple name within the directory, then falls
	/// back to [`from_id_dynamic`](Self::from_id_dynamic).
	pub fn from_class_dynamic(&self, phase: ProtocolPhase, direction: Direction, current_id: i32, class: &WireClass) -> Arc<PacketIdentity> {
		if let Some(identity) = self.binder.identity_of(class) {
			return identity;
		}
		if let Some(identity) = self.resolve_name(phase, direction, class.simple_name()) {
			self.binder.remember(class, &identity);
			return identity;
		}
		self.from_id_dynamic(phase, direction, current_id, class)
	}

	/// Resolves a legacy id, registering a dynamic legacy packet type on a miss.
	///
	/// Same failure behaviour as [`from_id_dynamic`](Self::from_id_dynamic).
	pub fn from_legacy_dynamic(&self, legacy_id: i32, direction: Direction) -> Arc<PacketIdentity> {
		if let Some(identity) = self.resolve_legacy(legacy_id, Some(direction)) {
			return identity;
		}
		RegistrationStage::Miss.trace(PacketKey::new(ProtocolPhase::Legacy, direction, UNKNOWN_ID));

		let decl = PacketDecl::legacy(direction, legacy_id, &format!("Unknown{legacy_id}")).dynamic();
		self.register_blocking(decl.clone())
			.unwrap_or_else(|error| self.detached(decl, &error))
	}

	/// Every identity, in any directory, with `name` among its aliases.
	pub fn from_name(&self, name: &str) -> Vec<Arc<PacketIdentity>> {
		self.snapshot().index().resolve_by_alias(name)
	}

	/// Queues `decl` for publication on the confined thread.
	///
	/// The registration runs inline, and the ticket is already complete, when no
	/// confined thread is installed or the caller is the confined thread.
	pub fn schedule_register(&self, decl: PacketDecl) -> Result<RegistrationTicket, CatalogError> {
		let registrar = Arc::clone(&self.registrar);
		Ok(run_confined(self.executor.as_deref(), move || registrar.publish(decl))?)
	}

	/// Publishes `decl` and waits for the outcome.
	///
	/// Publishes inline when the confined thread has already shut down.
	fn register_blocking(&self, decl: PacketDecl) -> Result<Arc<PacketIdentity>, CatalogError> {
		let key = decl.key();
		RegistrationStage::Synthesized.trace(key);

		let outcome = match self.await_registration(decl.clone()) {
			Err(CatalogError::ExecutorClosed) => {
				tracing::warn!(%key, "catalog.register.executor_closed");
				self.registrar.publish(decl)
			}
			other => other,
		};
		outcome.map(RegistrationOutcome::into_identity)
	}

	/// An identity for `decl` that no lookup will ever return.
	fn detached(&self, decl: PacketDecl, error: &CatalogError) -> Arc<PacketIdentity> {
		let key = decl.key();
		tracing::error!(%error, %key, "catalog.register.failed");
		Arc::new(decl.bind(Binding::new(self.registrar.provisional_name())))
	}

	fn await_registration(&self, decl: PacketDecl) -> Result<RegistrationOutcome, CatalogError> {
		self.schedule_register(decl)?.wait()?
	}

	/// Every identity in directory order, optionally including the legacy phase.
	pub fn enumerate_all(&self, include_legacy: bool) -> Vec<Arc<PacketIdentity>> {
		self.snapshot()
			.directories()
			.iter_included(include_legacy)
			.flat_map(|d| d.enumerate().iter().cloned())
			.collect()
	}

	/// Every identity valid for the active wire format.
	pub fn values(&self) -> Vec<Arc<PacketIdentity>> {
		self.enumerate_all(self.versions.uses_legacy_wire_format())
	}

	/// Returns true if the binder knows a wire class for `identity`.
	pub fn is_supported(&self, identity: &PacketIdentity) -> bool {
		self.binder.class_of(identity).is_some()
	}

	pub fn describe(&self, identity: &PacketIdentity) -> String {
		identity.describe(self.binder.as_ref())
	}

	/// Rebuilds the index from the published directories.
	pub fn rebuild_index(&self) -> Result<(), CatalogError> {
		let registrar = Arc::clone(&self.registrar);
		run_confined(self.executor.as_deref(), move || registrar.rebuild())?.wait()?
	}
}

impl std::fmt::Debug for Catalog {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Catalog")
			.field("packets", &self.snapshot().directories().len())
			.field("version", &self.versions.active_version())
			.field("confined", &self.executor.is_some())
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	use pktcat_primitives::VersionTag;
	use pretty_assertions::assert_eq;

	use super::*;

	fn inline() -> Catalog {
		Catalog::builder(CatalogConfig::default()).without_confinement().build().unwrap()
	}

	#[test]
	fn lookups_by_id_name_and_legacy_id_agree() {
		let catalog = inline();
		let by_id = catalog.find_current(ProtocolPhase::Status, Direction::ServerToClient, 0).unwrap();
		let by_name = catalog.find_name(ProtocolPhase::Status, Direction::ServerToClient, "ServerInfo").unwrap();
		let by_text = catalog.find_named("STATUS", "SERVER", "SERVER_INFO").unwrap();
		assert!(Arc::ptr_eq(&by_id, &by_name));
		assert!(Arc::ptr_eq(&by_id, &by_text));
		assert!(catalog.has_legacy(255));
		assert!(!catalog.has_current(ProtocolPhase::Handshaking, Direction::ServerToClient, 0));
	}

	#[test]
	fn find_reports_the_missing_key() {
		let catalog = inline();
		assert_eq!(
			catalog.find_current(ProtocolPhase::Login, Direction::ServerToClient, 0x7F).unwrap_err(),
			CatalogError::NotFound(LookupKey::Current(PacketKey::new(ProtocolPhase::Login, Direction::ServerToClient, 0x7F)))
		);
		assert!(matches!(catalog.find_legacy(4000, None), Err(CatalogError::NotFound(LookupKey::Legacy { .. }))));
		assert!(matches!(
			catalog.find_named("HANDSHAKE_OR_SO", "SERVER", "x"),
			Err(CatalogError::UnrecognizedPhaseOrDirection(_))
		));
	}

	#[test]
	fn from_class_requires_a_binding() {
		let catalog = inline();
		let class = WireClass::new("net.example.PacketPlayOutChat");
		assert_eq!(catalog.from_class(&class).unwrap_err(), CatalogError::NotAPacketClass(Arc::from(class.name())));

		let chat = catalog.from_class_dynamic(ProtocolPhase::Play, Direction::ServerToClient, 0x0E, &class);
		assert_eq!(chat.symbolic_name(), "CHAT");
		assert!(catalog.has_class(&class));
		assert!(catalog.is_supported(&chat));
		assert_eq!(catalog.describe(&chat), "CHAT[class=PacketPlayOutChat, id=14]");
	}

	#[test]
	fn dynamic_registration_publishes_once() {
		let catalog = inline();
		let class = WireClass::new("net.example.Mystery");
		let first = catalog.from_id_dynamic(ProtocolPhase::Play, Direction::ServerToClient, 0x70, &class);
		let second = catalog.from_id_dynamic(ProtocolPhase::Play, Direction::ServerToClient, 0x70, &class);

		assert!(Arc::ptr_eq(&first, &second));
		assert!(first.is_dynamic());
		assert!(first.symbolic_name().starts_with("Dynamic-"));
		assert_eq!(first.canonical_name(), "PacketPlayOutMystery");
		assert!(Arc::ptr_eq(&catalog.from_class(&class).unwrap(), &first));
		assert!(catalog.enumerate_all(false).iter().any(|e| Arc::ptr_eq(e, &first)));
	}

	#[test]
	fn legacy_misses_synthesize_legacy_identities() {
		let catalog = inline();
		let unknown = catalog.from_legacy_dynamic(177, Direction::ClientToServer);
		assert_eq!(unknown.phase(), ProtocolPhase::Legacy);
		assert_eq!(unknown.legacy_id(), 177);
		assert_eq!(unknown.canonical_name(), "PacketLegacyInUnknown177");
		assert!(Arc::ptr_eq(&catalog.from_legacy_dynamic(177, Direction::ClientToServer), &unknown));
	}

	#[test]
	fn scheduled_registration_on_a_confined_thread() {
		let catalog = Catalog::new(CatalogConfig::default()).unwrap();
		let decl = PacketDecl::new(ProtocolPhase::Login, Direction::ServerToClient, "Cookie")
			.current_id(0x05)
			.dynamic();
		let outcome = catalog.schedule_register(decl).unwrap().wait().unwrap().unwrap();
		assert!(outcome.is_published());
		assert!(catalog.has_current(ProtocolPhase::Login, Direction::ServerToClient, 0x05));
	}

	#[test]
	fn values_follow_the_wire_format() {
		let modern = inline();
		let legacy = Catalog::builder(CatalogConfig::default())
			.without_confinement()
			.version_resolver(Arc::new(StaticVersionResolver::new(VersionTag::VILLAGE_UPDATE, true)))
			.build()
			.unwrap();

		assert!(modern.values().iter().all(|e| !e.phase().is_legacy()));
		assert_eq!(legacy.values().len(), modern.values().len() + 9);
		assert_eq!(legacy.values().len(), legacy.enumerate_all(true).len());
	}

	#[test]
	fn rebuild_keeps_every_lookup() {
		let catalog = inline();
		let before = catalog.find_name(ProtocolPhase::Play, Direction::ClientToServer, "CHAT").unwrap();
		catalog.rebuild_index().unwrap();
		let after = catalog.find_name(ProtocolPhase::Play, Direction::ClientToServer, "CHAT").unwrap();
		assert!(Arc::ptr_eq(&before, &after));
	}
}
