//! Resolution pipeline: reads data files, resolves names, builds the catalog,
//! tier policy, and scheduler config.
//!
//! Provides format detection (RON/JSON/TOML), file discovery, and
//! deserialization helpers used by [`load_production_data`].

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::TimeDelta;
use serde::de::DeserializeOwned;
use tiercraft_core::catalog::{CatalogError, Ingredient, RecipeCatalog, RecipeCatalogBuilder};
use tiercraft_core::config::{ConfigError, SchedulerConfig};
use tiercraft_core::fixed::Quantity;
use tiercraft_core::id::{ItemKind, RecipeId};
use tiercraft_core::tier::{PolicyError, TierPolicy, TierSpec};

use crate::schema::{RecipeData, ScheduleData};

// ===========================================================================
// Errors
// ===========================================================================

/// Why a data directory could not be turned into [`ProductionData`].
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// `recipes.*` or `schedule.*` is absent.
    #[error("no {file}.ron, {file}.toml or {file}.json in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    #[error("{file}: extension is not ron, toml or json")]
    UnsupportedFormat { file: PathBuf },

    /// Both `recipes.ron` and `recipes.json` (say) are present.
    #[error("{a} and {b} describe the same data")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    #[error("{file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A tier names a recipe the recipe file doesn't define.
    #[error("{file}: unknown {expected_kind} '{name}'")]
    UnresolvedRef {
        file: PathBuf,
        name: String,
        expected_kind: &'static str,
    },

    #[error("{file}: recipe '{name}' defined twice")]
    DuplicateName { file: PathBuf, name: String },

    /// An item kind that isn't `category:subtype`.
    #[error("invalid item kind '{name}' in {file}")]
    InvalidItem { file: PathBuf, name: String },

    /// A number that can't be represented as a quantity.
    #[error("invalid {field} value {value} in {file}")]
    InvalidNumber {
        file: PathBuf,
        field: &'static str,
        value: f64,
    },

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Data file encodings, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

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

/// Scan a directory for a data file with the given base name.
///
/// Looks for `{base_name}.ron`, `.toml`, and `.json`. Returns `Ok(None)` if
/// none exists and `Err(ConflictingFormats)` if more than one does.
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

fn parse_error(path: &Path, detail: impl ToString) -> DataLoadError {
    DataLoadError::Parse {
        file: path.to_path_buf(),
        detail: detail.to_string(),
    }
}

/// Read a file and deserialize it according to its extension.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Toml => toml::from_str(&content).map_err(|e| parse_error(path, e)),
    }
}

/// Deserialize a list from a file. TOML files keep the array under
/// `toml_key` in a top-level table; RON and JSON hold the list directly.
pub fn deserialize_list<T: DeserializeOwned>(
    path: &Path,
    toml_key: &str,
) -> Result<Vec<T>, DataLoadError> {
    match detect_format(path)? {
        Format::Ron | Format::Json => deserialize_file(path),
        Format::Toml => {
            let content = std::fs::read_to_string(path)?;
            let mut table: toml::Table =
                toml::from_str(&content).map_err(|e| parse_error(path, e))?;
            let array = table
                .remove(toml_key)
                .ok_or_else(|| parse_error(path, format!("missing key '{toml_key}' in TOML file")))?;
            array
                .try_into()
                .map_err(|e: toml::de::Error| parse_error(path, e))
        }
    }
}

// ===========================================================================
// Name resolution helpers
// ===========================================================================

/// Check that `catalog` defines `name`, or fail with
/// [`DataLoadError::UnresolvedRef`].
pub fn resolve_recipe(
    catalog: &RecipeCatalog,
    name: &str,
    file: &Path,
) -> Result<RecipeId, DataLoadError> {
    let id = RecipeId::new(name);
    if catalog.contains(&id) {
        Ok(id)
    } else {
        Err(DataLoadError::UnresolvedRef {
            file: file.to_path_buf(),
            name: name.to_string(),
            expected_kind: "recipe",
        })
    }
}

/// Record `name` in `seen`, failing with `DuplicateName` if it was there.
pub fn check_duplicate(
    seen: &mut HashSet<String>,
    name: &str,
    file: &Path,
) -> Result<(), DataLoadError> {
    if seen.insert(name.to_string()) {
        Ok(())
    } else {
        Err(DataLoadError::DuplicateName {
            file: file.to_path_buf(),
            name: name.to_string(),
        })
    }
}

fn parse_item(name: &str, file: &Path) -> Result<ItemKind, DataLoadError> {
    name.parse().map_err(|_| DataLoadError::InvalidItem {
        file: file.to_path_buf(),
        name: name.to_string(),
    })
}

fn quantity(value: f64, field: &'static str, file: &Path) -> Result<Quantity, DataLoadError> {
    Quantity::checked_from_num(value).ok_or_else(|| DataLoadError::InvalidNumber {
        file: file.to_path_buf(),
        field,
        value,
    })
}

// ===========================================================================
// Resolution
// ===========================================================================

/// Everything the scheduler needs from a data directory.
#[derive(Debug, Clone)]
pub struct ProductionData {
    pub catalog: RecipeCatalog,
    pub policy: TierPolicy,
    pub config: SchedulerConfig,
}

/// Load `recipes.*` and `schedule.*` from `dir` and resolve them.
pub fn load_production_data(dir: &Path) -> Result<ProductionData, DataLoadError> {
    let recipes_path = require_data_file(dir, "recipes")?;
    let schedule_path = require_data_file(dir, "schedule")?;

    let recipes: Vec<RecipeData> = deserialize_list(&recipes_path, "recipes")?;
    let schedule: ScheduleData = deserialize_file(&schedule_path)?;

    let catalog = resolve_recipes(&recipes, &recipes_path)?;
    let policy = resolve_tiers(&schedule, &catalog, &schedule_path)?;
    let config = resolve_config(&schedule, &schedule_path)?;

    tracing::info!(
        dir = %dir.display(),
        recipes = catalog.len(),
        tiers = policy.tiers().len(),
        "loaded production data"
    );
    Ok(ProductionData {
        catalog,
        policy,
        config,
    })
}

fn resolve_recipes(recipes: &[RecipeData], file: &Path) -> Result<RecipeCatalog, DataLoadError> {
    let mut seen = HashSet::new();
    let mut builder = RecipeCatalogBuilder::new();

    for data in recipes {
        check_duplicate(&mut seen, &data.name, file)?;

        let product = parse_item(&data.product, file)?;
        let ingredients = data
            .ingredients
            .iter()
            .map(|(item, per_unit)| {
                Ok(Ingredient::new(
                    parse_item(item, file)?,
                    quantity(*per_unit, "per_unit", file)?,
                ))
            })
            .collect::<Result<Vec<_>, DataLoadError>>()?;
        builder.register(data.name.as_str(), product, ingredients);
    }

    Ok(builder.build()?)
}

fn resolve_tiers(
    schedule: &ScheduleData,
    catalog: &RecipeCatalog,
    file: &Path,
) -> Result<TierPolicy, DataLoadError> {
    let default_minimum = quantity(schedule.default_minimum, "default_minimum", file)?;
    let last = schedule.tiers.len().saturating_sub(1);

    let mut specs = Vec::with_capacity(schedule.tiers.len());
    for (index, tier) in schedule.tiers.iter().enumerate() {
        let recipe = resolve_recipe(catalog, &tier.recipe, file)?;
        let spec = if index == last {
            TierSpec::top(recipe)
        } else {
            let minimum = match tier.minimum {
                Some(value) => quantity(value, "minimum", file)?,
                None => default_minimum,
            };
            TierSpec::new(recipe, minimum)
        };
        specs.push(spec);
    }

    Ok(TierPolicy::new(specs, catalog)?)
}

fn resolve_config(schedule: &ScheduleData, file: &Path) -> Result<SchedulerConfig, DataLoadError> {
    let config = SchedulerConfig {
        batch_size: quantity(schedule.batch_size, "batch_size", file)?,
        retry_limit: schedule.retry_limit,
        recount_interval: TimeDelta::seconds(i64::from(schedule.recount_interval_secs)),
        dispatch_history: schedule.dispatch_history,
    };
    config.validate()?;
    Ok(config)
}

// ===========================================================================
// Tests
// ===========================================================================
