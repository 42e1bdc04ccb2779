//! Mapping between packet identities and the wire classes that carry them.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::identity::{PacketIdentity, PacketKey};

/// Fully qualified name of a wire-format packet class.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WireClass(Arc<str>);

impl WireClass {
	pub fn new(name: impl Into<Arc<str>>) -> Self {
		Self(name.into())
	}

	pub fn name(&self) -> &str {
		&self.0
	}

	/// Name without its package or module path.
	pub fn simple_name(&self) -> &str {
		let name = &*self.0;
		let start = name.rfind(['.', ':', '$']).map_or(0, |i| i + 1);
		&name[start..]
	}
}

impl fmt::Display for WireClass {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for WireClass {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}

/// Resolves wire classes for packet identities and back.
pub trait ClassBinder: Send + Sync {
	fn class_of(&self, identity: &PacketIdentity) -> Option<WireClass>;

	fn identity_of(&self, class: &WireClass) -> Option<Arc<PacketIdentity>>;

	/// Records a pairing learned at runtime. The default ignores it.
	fn remember(&self, _class: &WireClass, _identity: &Arc<PacketIdentity>) {}
}

/// Binder that knows no classes at all.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnboundClasses;

impl ClassBinder for UnboundClasses {
	fn class_of(&self, _identity: &PacketIdentity) -> Option<WireClass> {
		None
	}

	fn identity_of(&self, _class: &WireClass) -> Option<Arc<PacketIdentity>> {
		None
	}
}

/// In-memory binder populated explicitly or from runtime observations.
///
/// Identities are matched by key and canonical name, so a binding survives index
/// rebuilds and identities sharing a canonical name keep separate bindings.
#[derive(Debug, Default)]
pub struct StaticClassBinder {
	inner: RwLock<BinderMaps>,
}

#[derive(Debug, Default)]
struct BinderMaps {
	by_class: FxHashMap<WireClass, Arc<PacketIdentity>>,
	by_identity: FxHashMap<(PacketKey, Arc<str>), WireClass>,
}

impl StaticClassBinder {
	pub fn new() -> Self {
		Self::default()
	}

	/// Binds `class` to `identity`, replacing any earlier binding of either side.
	pub fn bind(&self, class: WireClass, identity: Arc<PacketIdentity>) {
		let mut maps = self.inner.write();
		let key = identity_key(&identity);
		if let Some(previous) = maps.by_identity.insert(key.clone(), class.clone())
			&& previous != class
		{
			maps.by_class.remove(&previous);
		}
		if let Some(displaced) = maps.by_class.insert(class, identity) {
			let displaced_key = identity_key(&displaced);
			if displaced_key != key {
				maps.by_identity.remove(&displaced_key);
			}
		}
	}

	pub fn len(&self) -> usize {
		self.inner.read().by_class.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

fn identity_key(identity: &PacketIdentity) -> (PacketKey, Arc<str>) {
	(identity.key(), Arc::clone(&identity.aliases()[0]))
}

impl ClassBinder for StaticClassBinder {
	fn class_of(&self, identity: &PacketIdentity) -> Option<WireClass> {
		self.inner.read().by_identity.get(&identity_key(identity)).cloned()
	}

	fn identity_of(&self, class: &WireClass) -> Option<Arc<PacketIdentity>> {
		self.inner.read().by_class.get(class).cloned()
	}

	fn remember(&self, class: &WireClass, identity: &Arc<PacketIdentity>) {
		self.bind(class.clone(), Arc::clone(identity));
	}
}
