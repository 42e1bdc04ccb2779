use std::io::Write;
use std::sync::{Arc, Once};

use pktcat_registry::config::CONFIG_ENV;
use pktcat_registry::{Catalog, Direction, ProtocolPhase, WireClass, global};
use pretty_assertions::assert_eq;
use serial_test::serial;

static CONFIGURE: Once = Once::new();

/// Points the process-wide catalogue at a config file before its first use.
fn configured() -> &'static Catalog {
	CONFIGURE.call_once(|| {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "legacy_wire_format = true").unwrap();
		writeln!(file, "dynamic_name_prefix = \"Global-\"").unwrap();
		writeln!(file, "[confined_thread]").unwrap();
		writeln!(file, "name = \"pktcat-global\"").unwrap();
		let path = file.into_temp_path().keep().unwrap();
		// SAFETY: runs once, before any test in this binary reads the environment.
		unsafe { std::env::set_var(CONFIG_ENV, path) };
	});
	global()
}

#[test]
#[serial]
fn global_reads_the_configured_file() {
	let catalog = configured();
	assert!(catalog.config().legacy_wire_format);
	assert_eq!(catalog.config().confined_thread.name, "pktcat-global");
	assert_eq!(catalog.values().len(), catalog.enumerate_all(true).len());
}

#[test]
#[serial]
fn global_is_built_once() {
	assert!(std::ptr::eq(configured(), global()));
}

#[test]
#[serial]
fn global_registrations_are_visible_to_later_callers() {
	let class = WireClass::new("net.example.PacketPlayInTelemetry");
	let identity = configured().from_id_dynamic(ProtocolPhase::Play, Direction::ClientToServer, 0x60, &class);
	assert!(identity.symbolic_name().starts_with("Global-"));

	let again = global().find_current(ProtocolPhase::Play, Direction::ClientToServer, 0x60).unwrap();
	assert!(Arc::ptr_eq(&identity, &again));
}
