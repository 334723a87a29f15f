//! Resolution pipeline: reads data files, resolves cross-references, builds
//! the registry and loot tables.
//!
//! Provides format detection (RON/JSON/TOML), file discovery, and
//! deserialization helpers, plus [`load_device_data`] which runs the whole
//! pipeline over one directory.

use devicecraft_core::augment::{AugmentCategory, AugmentData, AugmentFeatures};
use devicecraft_core::config::DeviceConfig;
use devicecraft_core::engine::Engine;
use devicecraft_core::grid_world::GridWorld;
use devicecraft_core::id::{DeviceTypeId, ItemTypeId, LootTableId};
use devicecraft_core::loot::{LootEntry, LootTable, LootTables};
use devicecraft_core::registry::{
    DeviceType, InventoryLayout, Registry, RegistryBuilder, RegistryError, TimingMode,
};
use devicecraft_core::routine::ActionRoutine;
use devicecraft_core::validity::ValidityRule;
use devicecraft_core::world::Fluid;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::schema::*;

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A required data file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A name reference could not be resolved.
    #[error("unresolved {expected_kind} reference '{name}' in {file}")]
    UnresolvedRef {
        file: PathBuf,
        name: String,
        expected_kind: &'static str,
    },

    #[error("duplicate name '{name}' in {file}")]
    DuplicateName { file: PathBuf, name: String },

    /// The file parsed but a value is out of range.
    #[error("invalid definition in {file}: {detail}")]
    Invalid { file: PathBuf, detail: String },

    /// The resolved definitions were rejected when freezing the registry.
    #[error(transparent)]
    Registry(#[from] RegistryError),

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

const EXTENSIONS: [(&str, Format); 3] = [
    ("ron", Format::Ron),
    ("toml", Format::Toml),
    ("json", Format::Json),
];

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    let ext = path.extension().and_then(|e| e.to_str());
    EXTENSIONS
        .iter()
        .find(|(candidate, _)| Some(*candidate) == ext)
        .map(|(_, format)| *format)
        .ok_or_else(|| DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        })
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Scan `dir` for `{base_name}.ron`, `.toml` or `.json`.
///
/// Returns `Ok(None)` if no file is found, or `Err(ConflictingFormats)` if
/// more than one format exists for the same base name.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;

    for (ext, _) in &EXTENSIONS {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if !candidate.exists() {
            continue;
        }
        if let Some(existing) = found {
            return Err(DataLoadError::ConflictingFormats {
                a: existing,
                b: candidate,
            });
        }
        found = Some(candidate);
    }

    Ok(found)
}

/// Like [`find_data_file`], but a missing file is an error.
pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_string(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

fn parse_error(path: &Path, e: impl std::fmt::Display) -> DataLoadError {
    DataLoadError::Parse {
        file: path.to_path_buf(),
        detail: e.to_string(),
    }
}

/// Read a file and deserialize it according to its format.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Toml => toml::from_str(&content).map_err(|e| parse_error(path, e)),
    }
}

/// Deserialize a list from a file. TOML has no top-level arrays, so for TOML
/// the list is read from the array of tables under `toml_key`.
pub fn deserialize_list<T: DeserializeOwned>(
    path: &Path,
    toml_key: &str,
) -> Result<Vec<T>, DataLoadError> {
    if detect_format(path)? != Format::Toml {
        return deserialize_file(path);
    }

    let content = std::fs::read_to_string(path)?;
    let mut table: toml::Table = toml::from_str(&content).map_err(|e| parse_error(path, e))?;
    let array = table
        .remove(toml_key)
        .ok_or_else(|| parse_error(path, format!("missing key '{toml_key}' in TOML file")))?;
    array
        .try_into()
        .map_err(|e: toml::de::Error| parse_error(path, e))
}

// ===========================================================================
// Name resolution helpers
// ===========================================================================

/// Look up a name in a map, returning an `UnresolvedRef` error if not found.
pub fn resolve_name<'a, V>(
    map: &'a HashMap<String, V>,
    name: &str,
    file: &Path,
    expected_kind: &'static str,
) -> Result<&'a V, DataLoadError> {
    map.get(name).ok_or_else(|| DataLoadError::UnresolvedRef {
        file: file.to_path_buf(),
        name: name.to_string(),
        expected_kind,
    })
}

/// Fail with `DuplicateName` if `name` is already taken.
pub fn check_duplicate<V>(
    map: &HashMap<String, V>,
    name: &str,
    file: &Path,
) -> Result<(), DataLoadError> {
    if map.contains_key(name) {
        return Err(DataLoadError::DuplicateName {
            file: file.to_path_buf(),
            name: name.to_string(),
        });
    }
    Ok(())
}

// ===========================================================================
// Resolution
// ===========================================================================

fn resolve_category(data: CategoryData) -> AugmentCategory {
    match data {
        CategoryData::AreaEffect => AugmentCategory::AreaEffect,
        CategoryData::Filter => AugmentCategory::Filter,
        CategoryData::Upgrade => AugmentCategory::Upgrade,
        CategoryData::Fluid => AugmentCategory::Fluid,
    }
}

fn resolve_fluid(data: FluidData) -> Fluid {
    match data {
        FluidData::Water => Fluid::Water,
        FluidData::Lava => Fluid::Lava,
    }
}

fn resolve_augment(data: &AugmentItemData) -> AugmentData {
    AugmentData {
        category: resolve_category(data.category),
        radius: data.radius,
        base_mod: data.base_mod,
        xp_storage: data.xp_storage,
        features: AugmentFeatures {
            xp_storage: data.features.xp_storage,
            filter: data.features.filter,
        },
    }
}

fn resolve_loot_table(
    data: LootTableData,
    item_names: &HashMap<String, ItemTypeId>,
    path: &Path,
) -> Result<LootTable, DataLoadError> {
    let entries = data
        .entries
        .iter()
        .map(|e| {
            let item_type = *resolve_name(item_names, &e.item, path, "item")?;
            if e.min > e.max {
                return Err(DataLoadError::Invalid {
                    file: path.to_path_buf(),
                    detail: format!(
                        "loot table '{}': entry '{}' has min {} above max {}",
                        data.name, e.item, e.min, e.max
                    ),
                });
            }
            Ok(LootEntry {
                item_type,
                weight: e.weight,
                min_count: e.min,
                max_count: e.max,
            })
        })
        .collect::<Result<Vec<_>, DataLoadError>>()?;

    Ok(LootTable {
        name: data.name,
        picks: data.picks,
        entries,
    })
}

fn resolve_device_type(
    data: DeviceTypeData,
    loot_names: &HashMap<String, LootTableId>,
    config: &DeviceConfig,
    path: &Path,
) -> Result<DeviceType, DataLoadError> {
    let routine = match (data.routine, &data.loot_table) {
        (RoutineData::Produce, Some(name)) => ActionRoutine::Produce {
            loot: *resolve_name(loot_names, name, path, "loot table")?,
        },
        (RoutineData::Produce, None) => {
            return Err(DataLoadError::Invalid {
                file: path.to_path_buf(),
                detail: format!("device type '{}': produce routine needs a loot_table", data.name),
            });
        }
        (RoutineData::Collect, loot) => {
            if loot.is_some() {
                tracing::warn!(device_type = %data.name, "loot_table ignored for collect routine");
            }
            ActionRoutine::Collect
        }
    };

    let timing = match data.timing {
        TimingData::Fixed => TimingMode::Fixed,
        TimingData::Environmental {
            fluid,
            floor_divisor,
        } => TimingMode::Environmental {
            fluid: resolve_fluid(fluid),
            floor_divisor,
        },
    };

    Ok(DeviceType {
        name: data.name,
        routine,
        time_constant: data.time_constant,
        timing,
        base_radius: data.base_radius,
        initial_countdown: data.initial_countdown,
        reset_on_activate: data.reset_on_activate,
        validity: data.validity.map(|v| ValidityRule {
            fluid: resolve_fluid(v.fluid),
            min_adjacent: v.min_adjacent,
        }),
        augment_categories: data
            .augment_categories
            .into_iter()
            .map(resolve_category)
            .collect(),
        augment_slots: data.augment_slots,
        inventory: InventoryLayout {
            accessible: data.slots.accessible,
            input: data.slots.input,
            output: data.slots.output,
            stack_limit: data.slots.stack_limit.unwrap_or(config.stack_limit),
        },
        base_xp_storage: data.base_xp_storage,
    })
}

// ===========================================================================
// Pipeline
// ===========================================================================

/// Everything a host needs to start an engine.
#[derive(Debug, Clone)]
pub struct DeviceData {
    pub config: DeviceConfig,
    pub registry: Registry,
    pub loot: LootTables,
}

impl DeviceData {
    /// A server engine over an empty grid world seeded from the config, with
    /// the loot tables installed.
    pub fn into_engine(self) -> Engine {
        let mut world = GridWorld::new(self.config.seed);
        *world.loot_tables_mut() = self.loot;
        Engine::new(self.registry, world, self.config)
    }
}

/// Load every data file in `dir`.
///
/// `items` and `device_types` are required; `config`, `augments` and
/// `loot_tables` are optional. Items and augments share one namespace.
pub fn load_device_data(dir: &Path) -> Result<DeviceData, DataLoadError> {
    let config: DeviceConfig = match find_data_file(dir, "config")? {
        Some(path) => deserialize_file(&path)?,
        None => DeviceConfig::default(),
    };

    let mut builder = RegistryBuilder::new();
    let mut item_names: HashMap<String, ItemTypeId> = HashMap::new();

    let items_path = require_data_file(dir, "items")?;
    for item in deserialize_list::<ItemData>(&items_path, "items")? {
        check_duplicate(&item_names, &item.name, &items_path)?;
        let id = builder.register_item(&item.name)?;
        item_names.insert(item.name, id);
    }

    if let Some(path) = find_data_file(dir, "augments")? {
        for aug in deserialize_list::<AugmentItemData>(&path, "augments")? {
            check_duplicate(&item_names, &aug.name, &path)?;
            let id = builder.register_augment(&aug.name, resolve_augment(&aug))?;
            item_names.insert(aug.name, id);
        }
    }

    let mut loot = LootTables::new();
    let mut loot_names: HashMap<String, LootTableId> = HashMap::new();
    if let Some(path) = find_data_file(dir, "loot_tables")? {
        for data in deserialize_list::<LootTableData>(&path, "loot_tables")? {
            check_duplicate(&loot_names, &data.name, &path)?;
            let table = resolve_loot_table(data, &item_names, &path)?;
            let name = table.name.clone();
            loot_names.insert(name, loot.register(table));
        }
    }

    let types_path = require_data_file(dir, "device_types")?;
    let mut type_names: HashMap<String, DeviceTypeId> = HashMap::new();
    for data in deserialize_list::<DeviceTypeData>(&types_path, "device_types")? {
        check_duplicate(&type_names, &data.name, &types_path)?;
        let ty = resolve_device_type(data, &loot_names, &config, &types_path)?;
        let name = ty.name.clone();
        type_names.insert(name, builder.register_device_type(ty)?);
    }

    let registry = builder.build()?;
    tracing::info!(
        dir = %dir.display(),
        items = registry.item_count(),
        loot_tables = loot.len(),
        device_types = type_names.len(),
        "device data loaded"
    );

    Ok(DeviceData {
        config,
        registry,
        loot,
    })
}

// ===========================================================================
// Tests
// ===========================================================================
