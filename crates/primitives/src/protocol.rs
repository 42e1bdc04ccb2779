use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ParseError;

/// Stage of the connection lifecycle during which a set of packet types is valid.
///
/// Variant order is the total order used when comparing packet identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProtocolPhase {
	/// Initial protocol negotiation.
	Handshaking,
	/// In-game traffic.
	Play,
	/// Server list query.
	Status,
	/// Authentication and compression setup.
	Login,
	/// Packets that only existed in the pre-modern wire format.
	Legacy,
}

impl ProtocolPhase {
	/// Every phase, in comparison order.
	pub const ALL: [Self; 5] = [Self::Handshaking, Self::Play, Self::Status, Self::Login, Self::Legacy];

	/// Upper-case identifier, as used in configuration and diagnostics.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Handshaking => "HANDSHAKING",
			Self::Play => "PLAY",
			Self::Status => "STATUS",
			Self::Login => "LOGIN",
			Self::Legacy => "LEGACY",
		}
	}

	/// Capitalized phase name used inside canonical packet names.
	pub const fn packet_name(self) -> &'static str {
		match self {
			Self::Handshaking => "Handshaking",
			Self::Play => "Play",
			Self::Status => "Status",
			Self::Login => "Login",
			Self::Legacy => "Legacy",
		}
	}

	/// Returns true for the synthetic pre-modern phase.
	pub const fn is_legacy(self) -> bool {
		matches!(self, Self::Legacy)
	}
}

impl fmt::Display for ProtocolPhase {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for ProtocolPhase {
	type Err = ParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|phase| phase.as_str().eq_ignore_ascii_case(s) || (s.eq_ignore_ascii_case("HANDSHAKE") && *phase == Self::Handshaking))
			.ok_or_else(|| ParseError::UnknownPhase(s.to_owned()))
	}
}

/// Which endpoint originates a packet type.
///
/// Ranked `ClientToServer < ServerToClient` for comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
	/// Sent by connected clients ("incoming" from the server's point of view).
	ClientToServer,
	/// Sent by the server ("outgoing").
	ServerToClient,
}

impl Direction {
	/// Both directions, in comparison order.
	pub const ALL: [Self; 2] = [Self::ClientToServer, Self::ServerToClient];

	pub const fn as_str(self) -> &'static str {
		match self {
			Self::ClientToServer => "CLIENT_TO_SERVER",
			Self::ServerToClient => "SERVER_TO_CLIENT",
		}
	}

	/// Direction tag used inside canonical packet names.
	pub const fn packet_name(self) -> &'static str {
		match self {
			Self::ClientToServer => "In",
			Self::ServerToClient => "Out",
		}
	}

	pub const fn is_client(self) -> bool {
		matches!(self, Self::ClientToServer)
	}

	pub const fn is_server(self) -> bool {
		matches!(self, Self::ServerToClient)
	}

	/// The other endpoint.
	pub const fn opposite(self) -> Self {
		match self {
			Self::ClientToServer => Self::ServerToClient,
			Self::ServerToClient => Self::ClientToServer,
		}
	}
}

impl fmt::Display for Direction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Direction {
	type Err = ParseError;

	/// Accepts the full identifier as well as the short `CLIENT`/`SERVER` and
	/// `IN`/`OUT` spellings.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let upper = s.to_ascii_uppercase();
		match upper.as_str() {
			"CLIENT_TO_SERVER" | "CLIENT" | "IN" => Ok(Self::ClientToServer),
			"SERVER_TO_CLIENT" | "SERVER" | "OUT" => Ok(Self::ServerToClient),
			_ => Err(ParseError::UnknownDirection(s.to_owned())),
		}
	}
}

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use super::*;

	#[test]
	fn phases_are_totally_ordered_in_declaration_order() {
		let mut shuffled = vec![
			ProtocolPhase::Legacy,
			ProtocolPhase::Status,
			ProtocolPhase::Handshaking,
			ProtocolPhase::Login,
			ProtocolPhase::Play,
		];
		shuffled.sort();
		assert_eq!(shuffled, ProtocolPhase::ALL.to_vec());
	}

	#[test]
	fn client_ranks_before_server() {
		assert!(Direction::ClientToServer < Direction::ServerToClient);
		assert_eq!(Direction::ClientToServer.opposite(), Direction::ServerToClient);
	}

	#[rstest]
	#[case("PLAY", ProtocolPhase::Play)]
	#[case("status", ProtocolPhase::Status)]
	#[case("Handshake", ProtocolPhase::Handshaking)]
	#[case("HANDSHAKING", ProtocolPhase::Handshaking)]
	#[case("legacy", ProtocolPhase::Legacy)]
	fn parses_phase_names(#[case] input: &str, #[case] expected: ProtocolPhase) {
		assert_eq!(input.parse::<ProtocolPhase>(), Ok(expected));
	}

	#[rstest]
	#[case("client", Direction::ClientToServer)]
	#[case("OUT", Direction::ServerToClient)]
	#[case("server_to_client", Direction::ServerToClient)]
	fn parses_direction_names(#[case] input: &str, #[case] expected: Direction) {
		assert_eq!(input.parse::<Direction>(), Ok(expected));
	}

	#[test]
	fn rejects_phases_outside_the_closed_set() {
		assert_eq!(
			"CONFIGURATION".parse::<ProtocolPhase>(),
			Err(ParseError::UnknownPhase("CONFIGURATION".into()))
		);
		assert!("sideways".parse::<Direction>().is_err());
	}
}
