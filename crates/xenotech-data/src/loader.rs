//! Loading pipeline: research data files in, built catalog out.
//!
//! A research directory holds `topics.{ron,json,toml}` (required) and
//! `directory.{ron,json,toml}` (optional; the item/species names that
//! requirement references resolve against). Exactly one format per base
//! name. [`load_research_dir`] reads both, converts the schema structs into
//! core definitions, and hands them to `Catalog::build` — so every
//! symbolic-reference failure surfaces as a [`LoadError`] before the engine
//! ever runs.

use crate::schema::{DirectoryData, TomlTopics, TopicData};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use xenotech_core::catalog::{Catalog, CatalogError, NameResolver, TopicDef};
use xenotech_core::id::{ItemId, SpeciesId};
use xenotech_core::world::CampaignWorld;

// ===========================================================================
// Errors
// ===========================================================================

/// Errors reading and parsing research data files.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// The required topics file was not found in the directory.
    #[error("required file '{base}.(ron|json|toml)' not found in {dir}")]
    MissingRequired { base: &'static str, dir: PathBuf },

    /// The file has an extension we do not support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// The same base name exists in two formats.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Everything that can go wrong between a data directory and a usable
/// catalog.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Data(#[from] DataLoadError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

// ===========================================================================
// Format detection and file discovery
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Json,
    Toml,
}

/// Detect the format of a file from its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("json") => Ok(Format::Json),
        Some("toml") => Ok(Format::Toml),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

/// Find `{base}.ron`, `{base}.json`, or `{base}.toml` in `dir`. Returns
/// `Ok(None)` when absent and an error when more than one format exists.
pub fn find_data_file(dir: &Path, base: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;
    for ext in ["ron", "json", "toml"] {
        let candidate = dir.join(format!("{base}.{ext}"));
        if candidate.exists() {
            if let Some(existing) = found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing,
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }
    Ok(found)
}

// ===========================================================================
// Readers
// ===========================================================================

fn parse_error(file: &Path, detail: impl ToString) -> DataLoadError {
    DataLoadError::Parse {
        file: file.to_path_buf(),
        detail: detail.to_string(),
    }
}

/// Read a topics file. TOML uses the `[[topics]]` wrapper table; RON and
/// JSON are top-level lists.
pub fn read_topics(path: &Path) -> Result<Vec<TopicData>, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Toml => {
            let wrapper: TomlTopics =
                toml::from_str(&content).map_err(|e| parse_error(path, e))?;
            Ok(wrapper.topics)
        }
    }
}

/// Read a directory (item/species names) file.
pub fn read_directory(path: &Path) -> Result<DirectoryData, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Toml => toml::from_str(&content).map_err(|e| parse_error(path, e)),
    }
}

// ===========================================================================
// Name directory
// ===========================================================================

/// The loaded item/species name tables. Ids are assigned by position in
/// the directory file, so any world populated through
/// [`NameDirectory::apply_to`] agrees with the catalog on every id.
#[derive(Debug, Clone, Default)]
pub struct NameDirectory {
    items: HashMap<String, ItemId>,
    species: HashMap<String, SpeciesId>,
    item_order: Vec<String>,
    species_order: Vec<String>,
}

impl NameDirectory {
    pub fn from_data(data: DirectoryData) -> Self {
        let mut dir = Self::default();
        for (i, name) in data.items.into_iter().enumerate() {
            dir.items.insert(name.clone(), ItemId(i as u32));
            dir.item_order.push(name);
        }
        for (i, name) in data.species.into_iter().enumerate() {
            dir.species.insert(name.clone(), SpeciesId(i as u32));
            dir.species_order.push(name);
        }
        dir
    }

    /// Register every known name into a campaign world, in id order.
    pub fn apply_to(&self, world: &mut CampaignWorld) {
        for name in &self.item_order {
            world.register_item(name);
        }
        for name in &self.species_order {
            world.register_species(name);
        }
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn species_count(&self) -> usize {
        self.species.len()
    }
}

impl NameResolver for NameDirectory {
    fn item(&self, name: &str) -> Option<ItemId> {
        self.items.get(name).copied()
    }

    fn species(&self, name: &str) -> Option<SpeciesId> {
        self.species.get(name).copied()
    }
}

// ===========================================================================
// Pipeline
// ===========================================================================

/// Load a research directory into a built catalog plus the name directory
/// its references were resolved against.
pub fn load_research_dir(dir: &Path) -> Result<(Catalog, NameDirectory), LoadError> {
    let topics_path =
        find_data_file(dir, "topics")?.ok_or_else(|| DataLoadError::MissingRequired {
            base: "topics",
            dir: dir.to_path_buf(),
        })?;
    let topics = read_topics(&topics_path)?;

    let directory = match find_data_file(dir, "directory")? {
        Some(path) => NameDirectory::from_data(read_directory(&path)?),
        None => NameDirectory::default(),
    };

    let defs: Vec<TopicDef> = topics.into_iter().map(Into::into).collect();
    let catalog = Catalog::build(defs, &directory)?;
    Ok((catalog, directory))
}

// ===========================================================================
// Tests
// ===========================================================================
