use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ParseError;

/// Protocol release that a set of current packet ids is valid for.
///
/// Ids are not portable across releases; the catalogue models exactly one snapshot
/// version at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionTag {
	pub major: u32,
	pub minor: u32,
	pub patch: u32,
}

impl VersionTag {
	/// 1.7.2, the first release on the modern wire format.
	pub const WORLD_UPDATE: Self = Self::new(1, 7, 2);
	/// 1.14, the release the built-in current ids describe.
	pub const VILLAGE_UPDATE: Self = Self::new(1, 14, 0);

	pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
		Self { major, minor, patch }
	}

	/// Returns true if `self` is the same release as `other` or newer.
	pub fn at_least(self, other: Self) -> bool {
		self >= other
	}
}

impl Default for VersionTag {
	fn default() -> Self {
		Self::VILLAGE_UPDATE
	}
}

impl fmt::Display for VersionTag {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.patch == 0 {
			write!(f, "{}.{}", self.major, self.minor)
		} else {
			write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
		}
	}
}

impl FromStr for VersionTag {
	type Err = ParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let invalid = || ParseError::InvalidVersion(s.to_owned());
		let mut parts = s.trim().split('.');
		let mut next = |required: bool| -> Result<u32, ParseError> {
			match parts.next() {
				Some(part) => part.parse().map_err(|_| invalid()),
				None if required => Err(invalid()),
				None => Ok(0),
			}
		};
		let major = next(true)?;
		let minor = next(true)?;
		let patch = next(false)?;
		if parts.next().is_some() {
			return Err(invalid());
		}
		Ok(Self::new(major, minor, patch))
	}
}

impl TryFrom<String> for VersionTag {
	type Error = ParseError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		value.parse()
	}
}

impl From<VersionTag> for String {
	fn from(value: VersionTag) -> Self {
		value.to_string()
	}
}
