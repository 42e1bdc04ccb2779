use thiserror::Error;

/// Errors produced when parsing primitives from external text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
	/// The string does not name one of the closed set of phases.
	#[error("unrecognized protocol phase: {0:?}")]
	UnknownPhase(String),
	/// The string does not name one of the two directions.
	#[error("unrecognized packet direction: {0:?}")]
	UnknownDirection(String),
	/// The string is not a `major.minor[.patch]` version.
	#[error("invalid version tag: {0:?} (expected major.minor[.patch])")]
	InvalidVersion(String),
}
