use std::sync::{Arc, Barrier};
use std::thread;

use pktcat_registry::{Catalog, CatalogConfig, Direction, DirectoryKey, PacketDecl, ProtocolPhase, WireClass};
use pretty_assertions::assert_eq;
use tracing_subscriber::EnvFilter;

const RACERS: usize = 16;

fn init_tracing() {
	let _ = tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::from_default_env())
		.with_test_writer()
		.try_init();
}

fn race(catalog: Arc<Catalog>, current_id: i32) {
	let barrier = Arc::new(Barrier::new(RACERS));
	let handles: Vec<_> = (0..RACERS)
		.map(|_| {
			let catalog = Arc::clone(&catalog);
			let barrier = Arc::clone(&barrier);
			thread::spawn(move || {
				barrier.wait();
				catalog.from_id_dynamic(
					ProtocolPhase::Play,
					Direction::ServerToClient,
					current_id,
					&WireClass::new("net.example.PacketPlayOutMystery"),
				)
			})
		})
		.collect();
	let identities: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

	let winner = &identities[0];
	assert!(identities.iter().all(|i| Arc::ptr_eq(i, winner)));
	assert!(winner.is_dynamic());
	assert_eq!(winner.current_id(), current_id);

	let snapshot = catalog.snapshot();
	let dynamic: Vec<_> = snapshot
		.directories()
		.get(DirectoryKey::new(ProtocolPhase::Play, Direction::ServerToClient))
		.enumerate()
		.iter()
		.filter(|e| e.is_dynamic())
		.collect();
	assert_eq!(dynamic.len(), 1);
	assert!(Arc::ptr_eq(dynamic[0], winner));

	let hit = catalog.resolve_current(ProtocolPhase::Play, Direction::ServerToClient, current_id).unwrap();
	assert!(Arc::ptr_eq(&hit, winner));
}

#[test]
fn concurrent_misses_on_the_confined_thread_publish_once() {
	init_tracing();
	let catalog = Arc::new(Catalog::new(CatalogConfig::default()).unwrap());
	race(catalog, 0x7E);
}

#[test]
fn concurrent_misses_without_confinement_publish_once() {
	init_tracing();
	let catalog = Arc::new(
		Catalog::builder(CatalogConfig::default())
			.without_confinement()
			.build()
			.unwrap(),
	);
	race(catalog, 0x7F);
}

#[test]
fn published_identities_are_found_by_every_key() {
	let catalog = Catalog::new(CatalogConfig::default()).unwrap();
	let class = WireClass::new("net.example.PacketLoginInCookieResponse");
	let identity = catalog.from_id_dynamic(ProtocolPhase::Login, Direction::ClientToServer, 0x04, &class);

	assert!(identity.symbolic_name().starts_with("Dynamic-"));
	let by_name = catalog
		.resolve_name(ProtocolPhase::Login, Direction::ClientToServer, identity.symbolic_name())
		.unwrap();
	assert!(Arc::ptr_eq(&by_name, &identity));
	let by_alias = catalog.from_name("PacketLoginInCookieResponse");
	assert_eq!(by_alias.len(), 1);
	assert!(Arc::ptr_eq(&by_alias[0], &identity));
	assert!(Arc::ptr_eq(&catalog.from_class(&class).unwrap(), &identity));
}

#[test]
fn custom_prefixes_name_dynamic_entries() {
	let config = CatalogConfig {
		dynamic_name_prefix: "Observed-".to_owned(),
		..Default::default()
	};
	let catalog = Catalog::builder(config).without_confinement().build().unwrap();
	let identity = catalog.from_legacy_dynamic(200, Direction::ServerToClient);
	assert!(identity.symbolic_name().starts_with("Observed-"));
	assert!(catalog.has_legacy(200));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn tickets_can_be_awaited() {
	let catalog = Catalog::new(CatalogConfig::default()).unwrap();
	let decl = PacketDecl::new(ProtocolPhase::Status, Direction::ServerToClient, "Ack")
		.current_id(0x02)
		.dynamic();
	let ticket = catalog.schedule_register(decl.clone()).unwrap();
	let first = ticket.await.unwrap().unwrap();
	assert!(first.is_published());

	let again = catalog.schedule_register(decl).unwrap().await.unwrap().unwrap();
	assert!(!again.is_published());
	assert!(Arc::ptr_eq(first.identity(), again.identity()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn dynamic_lookup_from_a_runtime_worker() {
	let catalog = Arc::new(Catalog::new(CatalogConfig::default()).unwrap());
	let worker = Arc::clone(&catalog);
	let identity = tokio::spawn(async move {
		worker.from_id_dynamic(
			ProtocolPhase::Play,
			Direction::ServerToClient,
			0x71,
			&WireClass::new("x.Mystery"),
		)
	})
	.await
	.unwrap();

	assert!(identity.is_dynamic());
	let hit = catalog.resolve_current(ProtocolPhase::Play, Direction::ServerToClient, 0x71).unwrap();
	assert!(Arc::ptr_eq(&hit, &identity));
}

#[tokio::test]
async fn dynamic_lookup_from_a_current_thread_runtime() {
	let catalog = Catalog::new(CatalogConfig::default()).unwrap();
	let identity = catalog.from_legacy_dynamic(190, Direction::ClientToServer);
	assert!(identity.is_dynamic());
	assert!(catalog.has_legacy(190));
}

#[test]
fn failed_registration_leaves_the_class_unbound() {
	let catalog = Catalog::builder(CatalogConfig::default())
		.without_confinement()
		.name_source(Arc::new(|| Arc::from("CHAT")))
		.build()
		.unwrap();
	let class = WireClass::new("net.example.Mystery");
	let identity = catalog.from_id_dynamic(ProtocolPhase::Play, Direction::ServerToClient, 0x72, &class);

	assert!(identity.is_dynamic());
	assert!(!catalog.has_current(ProtocolPhase::Play, Direction::ServerToClient, 0x72));
	assert!(!catalog.has_class(&class));
	assert!(catalog.from_class(&class).is_err());
}
