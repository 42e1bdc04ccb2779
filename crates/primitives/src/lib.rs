//! Core vocabulary for the packet catalogue: connection phases, packet directions,
//! protocol version tags, and the canonical packet name format.

/// Parse errors for the textual forms of the primitives.
pub mod error;
/// Canonical `Packet<Phase><Dir><Name>` formatting.
pub mod naming;
/// Connection phases and packet directions.
pub mod protocol;
/// Protocol version tags.
pub mod version;

pub use error::ParseError;
pub use naming::{PACKET_NAME_MARKER, capitalize, format_packet_name, is_qualified};
pub use protocol::{Direction, ProtocolPhase};
pub use version::VersionTag;

/// Sentinel for a packet id that does not exist in the relevant wire format.
pub const UNKNOWN_ID: i32 = -1;
