//! Packet type catalogue.
//!
//! Every packet type a connection may carry is described by one immutable
//! [`PacketIdentity`], stored in the [`PhaseDirectory`] for its phase and direction and
//! reachable through a [`RegistryIndex`] by current id, by name, or by legacy id.
//! Packet types not present in the built-in tables are registered at runtime and
//! published atomically; see [`Catalog::from_id_dynamic`].
//!
//! # Modules
//!
//! - [`identity`] - declarations, bindings and the resulting identities
//! - [`directory`] - per phase/direction ordered directories
//! - [`index`] - multi-key lookup tables and collision diagnostics
//! - [`registrar`] - single-writer publication of dynamic packet types
//! - [`builtins`] - the built-in declaration tables
//! - [`catalog`] - the public facade and the process-wide instance

pub mod binder;
pub mod builtins;
pub mod catalog;
pub mod config;
pub mod directory;
pub mod error;
pub mod identity;
pub mod index;
pub mod registrar;
mod snapshot;
pub mod version;

pub use binder::{ClassBinder, StaticClassBinder, UnboundClasses, WireClass};
pub use builtins::register_builtins;
pub use catalog::{Catalog, CatalogBuilder, global};
pub use config::{CatalogConfig, ConfigError, ConfinedThreadConfig};
pub use directory::{AdoptOutcome, AliasRecord, DirectoryKey, DirectorySet, PhaseDirectory};
pub use error::{CatalogError, IndexError, LookupKey};
pub use identity::{Binding, PacketDecl, PacketIdentity, PacketKey};
pub use index::{Collision, KeyKind, RegistryIndex};
pub use pktcat_primitives::{Direction, ProtocolPhase, UNKNOWN_ID, VersionTag};
pub use registrar::{NameSource, RegistrationOutcome, RegistrationStage, RegistrationTicket, provisional_names};
pub use snapshot::CatalogSnapshot;
pub use version::{StaticVersionResolver, VersionResolver};
