use std::borrow::Cow;

use crate::{Direction, ProtocolPhase};

/// Substring marking a name that is already in canonical form.
pub const PACKET_NAME_MARKER: &str = "Packet";

/// Returns true if `name` is already qualified and must be used verbatim.
#[inline]
pub fn is_qualified(name: &str) -> bool {
	name.contains(PACKET_NAME_MARKER)
}

/// Formats a bare packet name into its canonical `Packet<Phase><In|Out><Name>` form.
///
/// Qualified names (see [`is_qualified`]) are returned unchanged, so the function is
/// idempotent.
pub fn format_packet_name(phase: ProtocolPhase, direction: Direction, name: &str) -> Cow<'_, str> {
	if is_qualified(name) {
		return Cow::Borrowed(name);
	}
	Cow::Owned(format!(
		"{PACKET_NAME_MARKER}{}{}{}",
		phase.packet_name(),
		direction.packet_name(),
		capitalize(name)
	))
}

/// Upper-cases the first character of every whitespace-delimited word.
pub fn capitalize(input: &str) -> String {
	let mut out = String::with_capacity(input.len());
	let mut at_word_start = true;
	for ch in input.chars() {
		if ch.is_whitespace() {
			at_word_start = true;
			out.push(ch);
		} else if at_word_start {
			at_word_start = false;
			out.extend(ch.to_uppercase());
		} else {
			out.push(ch);
		}
	}
	out
}
