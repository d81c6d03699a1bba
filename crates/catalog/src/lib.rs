pub mod loader;

pub use loader::{CatalogError, FileCatalog};
