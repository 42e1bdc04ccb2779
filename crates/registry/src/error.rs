use std::fmt;
use std::sync::Arc;

use pktcat_primitives::{Direction, ParseError, ProtocolPhase};

use crate::directory::DirectoryKey;
use crate::identity::PacketKey;

/// Coordinate used for a failed `find_*` lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupKey {
	Current(PacketKey),
	Name {
		phase: ProtocolPhase,
		direction: Direction,
		name: Arc<str>,
	},
	Legacy {
		legacy_id: i32,
		preferred: Option<Direction>,
	},
}

impl fmt::Display for LookupKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Current(key) => write!(f, "{key}"),
			Self::Name { phase, direction, name } => write!(f, "{phase}/{direction} name {name:?}"),
			Self::Legacy {
				legacy_id,
				preferred: Some(direction),
			} => write!(f, "legacy id {legacy_id} (preferring {direction})"),
			Self::Legacy { legacy_id, preferred: None } => write!(f, "legacy id {legacy_id}"),
		}
	}
}

/// Fatal index insertion errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexError {
	/// Two distinct identities claim the same `(phase, direction, current_id)`.
	#[error("duplicate current id: key={key} existing={existing} incoming={incoming}")]
	DuplicateCurrentId {
		key: PacketKey,
		existing: Arc<str>,
		incoming: Arc<str>,
	},
}

/// Errors surfaced by catalogue operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
	#[error("no packet type for {0}")]
	NotFound(LookupKey),

	#[error(transparent)]
	UnrecognizedPhaseOrDirection(#[from] ParseError),

	/// The name is already bound to a different identity in the directory.
	#[error("name {name:?} already bound in {directory} to {existing}")]
	NameConflict {
		directory: DirectoryKey,
		name: Arc<str>,
		existing: Arc<str>,
	},

	#[error("{0} is not bound to a packet type")]
	NotAPacketClass(Arc<str>),

	#[error("index insertion failed: {0}")]
	Index(#[from] IndexError),

	#[error("confined executor closed before the registration ran")]
	ExecutorClosed,

	#[error("failed to start the confined registrar thread: {0}")]
	ExecutorSpawn(String),
}

impl From<pktcat_worker::SubmitError> for CatalogError {
	fn from(_: pktcat_worker::SubmitError) -> Self {
		Self::ExecutorClosed
	}
}

impl From<pktcat_worker::TicketError> for CatalogError {
	fn from(_: pktcat_worker::TicketError) -> Self {
		Self::ExecutorClosed
	}
}
