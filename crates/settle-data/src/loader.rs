//! Resolution pipeline: reads data files, resolves building names, builds the catalog.
//!
//! Provides format detection (RON/JSON/TOML), file discovery, and deserialization
//! helpers, plus [`load_game_data`] which ties them together for a content
//! directory.

use serde::de::DeserializeOwned;
use settle_core::catalog::{BuildingKind, Catalog, CatalogBuilder, CatalogError, RecipeEntry};
use settle_core::config::{ConfigError, EngineConfig};
use settle_core::engine::{Engine, InitError};
use settle_core::fixed::Fixed64;
use settle_core::map::{MapConfig, MapConfigError};
use settle_core::resource::ResourceType;
use std::path::{Path, PathBuf};

use crate::schema::{BuildingData, BuildingKindData, RecipeData};

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A required data file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A recipe names a building that no building entry defines.
    #[error("unresolved building '{name}' in {file}")]
    UnresolvedBuilding { file: PathBuf, name: String },

    /// A non-logistics building has no capacity.
    #[error("building '{name}' in {file} needs a capacity")]
    MissingCapacity { file: PathBuf, name: String },

    /// A quantity, capacity, or duration does not fit the fixed-point range.
    #[error("{field} of '{name}' in {file} is out of range: {value}")]
    OutOfRange {
        file: PathBuf,
        name: String,
        field: &'static str,
        value: f64,
    },

    /// The resolved definitions failed catalog validation.
    #[error("invalid catalog: {0}")]
    Catalog(#[from] CatalogError),

    /// The map layout failed validation.
    #[error("invalid map: {0}")]
    Map(#[from] MapConfigError),

    /// The engine tuning failed validation.
    #[error("invalid engine config: {0}")]
    Config(#[from] ConfigError),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Scan a directory for a data file with the given base name (without extension).
///
/// Looks for `{base_name}.ron`, `{base_name}.toml`, and `{base_name}.json`.
/// Returns `Ok(None)` if no file is found, or `Err(ConflictingFormats)` if
/// multiple formats exist for the same base name.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;

    for ext in ["ron", "toml", "json"] {
        let candidate = dir.join(format!("{base_name}.{ext}"));
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

/// Like [`find_data_file`], but returns an error if no file is found.
pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_string(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

/// Parse `content` in the given format. `file` is only used for error messages.
pub fn deserialize_str<T: DeserializeOwned>(
    content: &str,
    format: Format,
    file: &Path,
) -> Result<T, DataLoadError> {
    let parse_err = |detail: String| DataLoadError::Parse {
        file: file.to_path_buf(),
        detail,
    };
    match format {
        Format::Ron => ron::from_str(content).map_err(|e| parse_err(e.to_string())),
        Format::Json => serde_json::from_str(content).map_err(|e| parse_err(e.to_string())),
        Format::Toml => toml::from_str(content).map_err(|e| parse_err(e.to_string())),
    }
}

/// Read a file and deserialize it according to its format (detected from extension).
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    deserialize_str(&content, format, path)
}

/// Deserialize a list from a file. For TOML files, extracts the array at the
/// given `toml_key` from a top-level table. For RON and JSON, deserializes
/// directly as `Vec<T>`.
pub fn deserialize_list<T: DeserializeOwned>(
    path: &Path,
    toml_key: &str,
) -> Result<Vec<T>, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    if format != Format::Toml {
        return deserialize_str(&content, format, path);
    }

    let parse_err = |detail: String| DataLoadError::Parse {
        file: path.to_path_buf(),
        detail,
    };
    let mut table: toml::Table = toml::from_str(&content).map_err(|e| parse_err(e.to_string()))?;
    let array = table
        .remove(toml_key)
        .ok_or_else(|| parse_err(format!("missing key '{toml_key}' in TOML file")))?;
    array
        .try_into()
        .map_err(|e: toml::de::Error| parse_err(e.to_string()))
}

// ===========================================================================
// Catalog resolution
// ===========================================================================

fn to_fixed(
    value: f64,
    field: &'static str,
    name: &str,
    file: &Path,
) -> Result<Fixed64, DataLoadError> {
    value
        .is_finite()
        .then(|| Fixed64::checked_from_num(value))
        .flatten()
        .ok_or_else(|| DataLoadError::OutOfRange {
            file: file.to_path_buf(),
            name: name.to_string(),
            field,
            value,
        })
}

fn entries(
    list: &[(ResourceType, f64)],
    field: &'static str,
    name: &str,
    file: &Path,
) -> Result<Vec<RecipeEntry>, DataLoadError> {
    list.iter()
        .map(|&(resource, quantity)| {
            Ok(RecipeEntry::new(resource, to_fixed(quantity, field, name, file)?))
        })
        .collect()
}

fn building_kind(data: &BuildingData, file: &Path) -> Result<BuildingKind, DataLoadError> {
    if data.kind == BuildingKindData::Logistics {
        return Ok(BuildingKind::Logistics);
    }
    let capacity = data.capacity.ok_or_else(|| DataLoadError::MissingCapacity {
        file: file.to_path_buf(),
        name: data.name.clone(),
    })?;
    let capacity = to_fixed(capacity, "capacity", &data.name, file)?;
    Ok(match data.kind {
        BuildingKindData::Extractor => BuildingKind::Extractor {
            capacity,
            targets: data.targets.clone(),
        },
        BuildingKindData::Processing => BuildingKind::Processing { capacity },
        BuildingKindData::Storage => BuildingKind::Storage { capacity },
        BuildingKindData::Logistics => BuildingKind::Logistics,
    })
}

/// Resolve name-based building and recipe entries into a validated catalog.
///
/// `buildings_file` and `recipes_file` only label errors.
pub fn resolve_catalog(
    buildings: &[BuildingData],
    buildings_file: &Path,
    recipes: &[RecipeData],
    recipes_file: &Path,
) -> Result<Catalog, DataLoadError> {
    let mut builder = CatalogBuilder::new();
    for data in buildings {
        let kind = building_kind(data, buildings_file)?;
        builder.register_building(&data.name, kind);
    }
    for data in recipes {
        let building =
            builder
                .building_id(&data.building)
                .ok_or_else(|| DataLoadError::UnresolvedBuilding {
                    file: recipes_file.to_path_buf(),
                    name: data.building.clone(),
                })?;
        builder.register_recipe(
            &data.name,
            building,
            entries(&data.inputs, "input", &data.name, recipes_file)?,
            entries(&data.outputs, "output", &data.name, recipes_file)?,
            to_fixed(data.time, "time", &data.name, recipes_file)?,
        );
    }
    Ok(builder.build()?)
}

// ===========================================================================
// Game data
// ===========================================================================

/// Everything needed to start an engine.
#[derive(Debug, Clone)]
pub struct GameData {
    pub map: MapConfig,
    pub catalog: Catalog,
    pub config: EngineConfig,
}

impl GameData {
    /// Start a fresh engine from this content.
    pub fn engine(&self) -> Result<Engine, InitError> {
        Engine::initialize(&self.map, self.catalog.clone(), self.config.clone())
    }
}

/// Load a content directory.
///
/// Required files: `map`, `buildings`, `recipes`. Optional: `engine`
/// (defaults to [`EngineConfig::default`]). Each may be `.ron`, `.json` or
/// `.toml`; TOML lists live under a `buildings` or `recipes` key.
pub fn load_game_data(dir: &Path) -> Result<GameData, DataLoadError> {
    let map_path = require_data_file(dir, "map")?;
    let map: MapConfig = deserialize_file(&map_path)?;
    map.validate()?;
    tracing::debug!(file = %map_path.display(), nodes = map.nodes.len(), "loaded map");

    let buildings_path = require_data_file(dir, "buildings")?;
    let buildings: Vec<BuildingData> = deserialize_list(&buildings_path, "buildings")?;
    let recipes_path = require_data_file(dir, "recipes")?;
    let recipes: Vec<RecipeData> = deserialize_list(&recipes_path, "recipes")?;
    let catalog = resolve_catalog(&buildings, &buildings_path, &recipes, &recipes_path)?;

    let config = match find_data_file(dir, "engine")? {
        Some(path) => {
            tracing::debug!(file = %path.display(), "loaded engine config");
            deserialize_file(&path)?
        }
        None => EngineConfig::default(),
    };
    config.validate()?;

    tracing::info!(
        dir = %dir.display(),
        buildings = catalog.building_count(),
        recipes = catalog.recipe_count(),
        "game data loaded"
    );
    Ok(GameData {
        map,
        catalog,
        config,
    })
}

// ===========================================================================
// Tests
// ===========================================================================
