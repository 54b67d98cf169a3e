//! Shared labeler configuration.
//!
//! Both labeling tools consume the same configuration value object (class
//! list, keypoint slot names, and the image extension allow-list) instead of
//! hardcoding per-tool constants. The config can be exported and imported as
//! JSON so a team shares one class list.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::model::KEYPOINT_COUNT;

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// A labeled class with its overlay color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassConfig {
    pub name: String,
    /// Overlay color as RGB.
    #[serde(default = "default_class_color")]
    pub color: [u8; 3],
}

impl ClassConfig {
    pub fn new(name: impl Into<String>, color: [u8; 3]) -> Self {
        Self {
            name: name.into(),
            color,
        }
    }

    /// Class with a hue-stepped color derived from its index.
    pub fn with_generated_color(index: usize, name: impl Into<String>) -> Self {
        let hue = (index as f32 * 60.0) % 360.0;
        Self {
            name: name.into(),
            color: hsv_to_rgb(hue, 1.0, 1.0),
        }
    }
}

fn default_class_color() -> [u8; 3] {
    [0, 255, 0]
}

/// Convert HSV to RGB bytes (h in degrees, s and v in 0-1).
fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [u8; 3] {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    [
        ((r + m) * 255.0) as u8,
        ((g + m) * 255.0) as u8,
        ((b + m) * 255.0) as u8,
    ]
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

fn default_extensions() -> Vec<String> {
    ["png", "jpg", "jpeg", "bmp", "gif"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Configuration shared by both labeling tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelerConfig {
    /// Version of the configuration file format.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Ordered class list; annotation `class_id`s index into it.
    #[serde(default)]
    pub classes: Vec<ClassConfig>,

    /// Display names for the keypoint slots (empty for the contour tool).
    #[serde(default)]
    pub keypoint_names: Vec<String>,

    /// Lowercase image extensions accepted when scanning a folder.
    #[serde(default = "default_extensions")]
    pub image_extensions: Vec<String>,
}

impl LabelerConfig {
    /// Defaults for the keypoint labeler.
    pub fn keypoint_defaults() -> Self {
        Self {
            version: CONFIG_VERSION,
            classes: ["standing", "sidelying", "prone"]
                .iter()
                .enumerate()
                .map(|(i, name)| ClassConfig::with_generated_color(i, *name))
                .collect(),
            keypoint_names: (1..=KEYPOINT_COUNT).map(|i| format!("kp{}", i)).collect(),
            image_extensions: default_extensions(),
        }
    }

    /// Defaults for the contour labeler.
    pub fn contour_defaults() -> Self {
        let classes = [
            ("face", [128, 0, 0]),
            ("nose", [255, 0, 0]),
            ("eye_bag", [0, 255, 0]),
            ("mole", [0, 0, 255]),
            ("spot", [255, 255, 0]),
            ("acne_light", [0, 255, 255]),
            ("acne_red", [255, 0, 255]),
            ("allergy", [128, 128, 0]),
            ("rough", [128, 0, 128]),
            ("oily", [0, 128, 128]),
        ];
        Self {
            version: CONFIG_VERSION,
            classes: classes
                .iter()
                .map(|(name, color)| ClassConfig::new(*name, *color))
                .collect(),
            keypoint_names: Vec::new(),
            image_extensions: ["png", "jpg", "bmp"].iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn class_name(&self, class_id: usize) -> Option<&str> {
        self.classes.get(class_id).map(|c| c.name.as_str())
    }

    pub fn class_color(&self, class_id: usize) -> [u8; 3] {
        self.classes
            .get(class_id)
            .map(|c| c.color)
            .unwrap_or_else(default_class_color)
    }

    /// True when the path's extension matches the allow-list
    /// (case-insensitive).
    pub fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let lower = ext.to_lowercase();
                self.image_extensions.iter().any(|e| *e == lower)
            })
            .unwrap_or(false)
    }

    /// Load a configuration file.
    pub fn load_from_path(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config {:?}: {}", path, e))?;
        serde_json::from_str(&content).map_err(|e| format!("Failed to parse config: {}", e))
    }

    /// Write the configuration as pretty-printed JSON, creating parent
    /// directories as needed.
    pub fn save_to_path(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;
        std::fs::write(path, json).map_err(|e| format!("Failed to write config: {}", e))
    }

    /// Default config file location under the user config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("kvat").join("config.json"))
    }

    /// Load from the default location, falling back to the given defaults
    /// when the file is missing or unreadable.
    pub fn load_or(fallback: LabelerConfig) -> LabelerConfig {
        let Some(path) = Self::default_path() else {
            return fallback;
        };
        if !path.exists() {
            return fallback;
        }
        match Self::load_from_path(&path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("{}; using defaults", e);
                fallback
            }
        }
    }
}
