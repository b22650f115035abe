//! Xenotech Data -- research data-file loading.
//!
//! Reads topic definitions and the item/species name directory from RON,
//! JSON, or TOML files, and resolves them into a built
//! [`xenotech_core::catalog::Catalog`]. Symbolic references that cannot be
//! resolved fail the load with an error naming the offending topic.
//!
//! ```rust,ignore
//! let (catalog, names) = xenotech_data::load_research_dir(path)?;
//! let mut world = CampaignWorld::new();
//! names.apply_to(&mut world);
//! let engine = ResearchEngine::new(catalog, EngineConfig::default());
//! ```

pub mod loader;
pub mod schema;

pub use loader::{
    find_data_file, load_research_dir, DataLoadError, Format, LoadError, NameDirectory,
};
