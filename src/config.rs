//! Puzzle configuration: catalog definition, targets, presentation text.
//!
//! Structure:
//! - Pure functions: defaults, validation, catalog construction
//! - Effect functions: config file I/O, image directory discovery

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::error::ConfigError;
use crate::types::Catalog;

/// Config filename within the config directory.
const CONFIG_FILENAME: &str = "config.json";

/// Extensions accepted by [`discover_images`], compared case-insensitively.
pub const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "webp", "bmp"];

const DEFAULT_ITEM_COUNT: usize = 9;
const DEFAULT_TARGETS: [usize; 4] = [0, 1, 2, 3];

// ============================================================================
// TYPES
// ============================================================================

/// Static description of a puzzle.
///
/// `images[i]` is catalog item `i`; `target_indices` are catalog indices,
/// never slot indices. Every field has a default so partial files load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PuzzleConfig {
    /// N.
    pub item_count: usize,
    /// K.
    pub target_count: usize,
    pub target_indices: Vec<usize>,
    /// Image sources. Empty means `images/image1.jpg` .. `images/imageN.jpg`.
    pub images: Vec<String>,
    pub title: String,
    pub prompt: String,
    pub success_message: String,
    pub info_message: String,
    pub audio_message: String,
}

impl Default for PuzzleConfig {
    fn default() -> Self {
        Self {
            item_count: DEFAULT_ITEM_COUNT,
            target_count: DEFAULT_TARGETS.len(),
            target_indices: DEFAULT_TARGETS.to_vec(),
            images: Vec::new(),
            title: "Valentine CAPTCHA".to_string(),
            prompt: "Select all images of your valentine".to_string(),
            success_message: "Verified! You really know your valentine.".to_string(),
            info_message: "Select every image of your valentine, then verify.\n\
                           The images are shuffled every round."
                .to_string(),
            audio_message: "Audio challenge unavailable... \
                            but imagine a lovely love song."
                .to_string(),
        }
    }
}

// ============================================================================
// PURE FUNCTIONS
// ============================================================================

/// Default image sources for `count` items.
pub fn default_images(count: usize) -> Vec<String> {
    (1..=count).map(|n| format!("images/image{}.jpg", n)).collect()
}

impl PuzzleConfig {
    /// Fail fast on any inconsistency between counts, indices and images.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.item_count == 0 {
            return Err(ConfigError::EmptyCatalog);
        }

        if self.target_count > self.item_count {
            return Err(ConfigError::MismatchedTargetCount {
                target_count: self.target_count,
                reason: format!("only {} items", self.item_count),
            });
        }

        if self.target_indices.len() != self.target_count {
            return Err(ConfigError::MismatchedTargetCount {
                target_count: self.target_count,
                reason: format!("{} target indices listed", self.target_indices.len()),
            });
        }

        let mut seen = BTreeSet::new();
        for &index in &self.target_indices {
            if index >= self.item_count {
                return Err(ConfigError::TargetOutOfRange {
                    index,
                    item_count: self.item_count,
                });
            }
            if !seen.insert(index) {
                return Err(ConfigError::DuplicateTarget { index });
            }
        }

        if !self.images.is_empty() && self.images.len() != self.item_count {
            return Err(ConfigError::ImageCountMismatch {
                images: self.images.len(),
                item_count: self.item_count,
            });
        }

        Ok(())
    }

    /// Image sources in catalog order, filling in defaults when none are set.
    pub fn image_sources(&self) -> Vec<String> {
        if self.images.is_empty() {
            default_images(self.item_count)
        } else {
            self.images.clone()
        }
    }

    /// Validate, then build the catalog with the configured targets marked.
    pub fn catalog(&self) -> Result<Catalog, ConfigError> {
        self.validate()?;

        let targets: BTreeSet<usize> = self.target_indices.iter().copied().collect();
        Catalog::with_targets(self.image_sources(), |index, _| targets.contains(&index))
            .ok_or(ConfigError::EmptyCatalog)
    }

    /// Replace the image list (and N) with `images`, keeping the targets.
    pub fn with_image_list(self, images: Vec<String>) -> Self {
        PuzzleConfig {
            item_count: images.len(),
            images,
            ..self
        }
    }
}

// ============================================================================
// EFFECT FUNCTIONS
// ============================================================================

/// Returns the default config file location.
///
/// On Linux: ~/.config/pick-captcha/config.json
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pick-captcha")
        .join(CONFIG_FILENAME)
}

/// Read and validate a config file.
pub fn load_config(path: &Path) -> Result<PuzzleConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let config: PuzzleConfig =
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    config.validate()?;
    Ok(config)
}

/// Write a config file as pretty JSON, creating parent directories.
pub fn save_config(config: &PuzzleConfig, path: &Path) -> Result<(), ConfigError> {
    let io_err = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let json = serde_json::to_string_pretty(config).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(io_err)
}

/// Resolve the configuration to use.
///
/// An explicit path must load. Without one, the default location is used
/// if present, otherwise built-in defaults.
pub fn resolve_config(explicit: Option<&Path>) -> Result<PuzzleConfig, ConfigError> {
    if let Some(path) = explicit {
        return load_config(path);
    }

    let default_path = default_config_path();
    if default_path.is_file() {
        tracing::info!(path = %default_path.display(), "loading config");
        load_config(&default_path)
    } else {
        tracing::debug!(path = %default_path.display(), "no config file, using defaults");
        Ok(PuzzleConfig::default())
    }
}

/// List image files directly inside `dir`, sorted by file name.
pub fn discover_images(dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let mut images = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| ConfigError::Io {
            path: dir.to_path_buf(),
            source: e.into(),
        })?;

        if entry.file_type().is_file() && is_image(entry.path()) {
            images.push(entry.into_path());
        }
    }

    if images.is_empty() {
        return Err(ConfigError::NoImages(dir.to_path_buf()));
    }

    tracing::debug!(dir = %dir.display(), count = images.len(), "discovered images");
    Ok(images)
}

/// Replace the configured images with the images found in `dir`.
///
/// Target indices now refer to positions in the sorted directory listing;
/// the result is validated again.
pub fn with_images_from(config: PuzzleConfig, dir: &Path) -> Result<PuzzleConfig, ConfigError> {
    let images = discover_images(dir)?
        .into_iter()
        .map(|p| p.display().to_string())
        .collect();

    let config = config.with_image_list(images);
    config.validate()?;
    Ok(config)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

// ============================================================================
// TESTS
// ============================================================================
