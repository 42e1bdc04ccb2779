use crate::directory::DirectorySet;
use crate::index::RegistryIndex;

/// One published state of the catalogue.
///
/// Readers load the current snapshot and see either the state before a registration
/// or the state after it, never a partial update.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
	directories: DirectorySet,
	index: RegistryIndex,
}

impl CatalogSnapshot {
	pub fn new(directories: DirectorySet, index: RegistryIndex) -> Self {
		Self { directories, index }
	}

	pub fn directories(&self) -> &DirectorySet {
		&self.directories
	}

	pub fn index(&self) -> &RegistryIndex {
		&self.index
	}
}
