use crate::error::ConfigError;
use crate::settings::{FieldSettings, ReflectionPolicy};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A named preset containing field settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub description: String,
    pub settings: FieldSettings,
}

impl Preset {
    pub fn new(name: impl Into<String>, description: impl Into<String>, settings: FieldSettings) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            settings,
        }
    }
}

/// Manager for loading and saving presets
pub struct PresetManager {
    /// Built-in presets that ship with the app
    pub builtin: Vec<Preset>,
    /// User-created presets loaded from disk
    pub user: Vec<Preset>,
    dir: Option<PathBuf>,
}

impl Default for PresetManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PresetManager {
    /// Built-ins plus user presets from the platform config directory
    pub fn new() -> Self {
        Self::with_dir(Self::default_dir())
    }

    /// Built-ins plus user presets from `dir` (none when `dir` is None)
    pub fn with_dir(dir: Option<PathBuf>) -> Self {
        let mut manager = Self {
            builtin: builtin_presets(),
            user: Vec::new(),
            dir,
        };
        manager.load_user_presets();
        manager
    }

    /// Get the presets directory path
    fn default_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("thought-field").join("presets"))
    }

    /// Load user presets from disk
    fn load_user_presets(&mut self) {
        let Some(dir) = &self.dir else {
            return;
        };
        let Ok(entries) = fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.extension().is_some_and(|e| e == "json") {
                continue;
            }
            match read_preset(&path) {
                Ok(preset) => self.user.push(preset),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable preset"),
            }
        }
        self.user.sort_by(|a, b| a.name.cmp(&b.name));
        debug!(count = self.user.len(), "user presets loaded");
    }

    /// Save a preset to disk
    pub fn save_preset(&mut self, preset: Preset) -> Result<(), ConfigError> {
        let dir = self.dir.as_ref().ok_or(ConfigError::NoConfigDir)?;

        // Create directory if it doesn't exist
        fs::create_dir_all(dir)?;

        let path = dir.join(format!("{}.json", sanitize(&preset.name)));
        let json = serde_json::to_string_pretty(&preset)?;
        fs::write(&path, json)?;

        // Replace any user preset with the same name
        self.user.retain(|p| p.name != preset.name);
        self.user.push(preset);

        Ok(())
    }

    /// Delete a user preset
    pub fn delete_preset(&mut self, name: &str) -> Result<(), ConfigError> {
        let dir = self.dir.as_ref().ok_or(ConfigError::NoConfigDir)?;

        // Find and remove from user list
        self.user.retain(|p| p.name != name);

        let path = dir.join(format!("{}.json", sanitize(name)));
        if path.exists() {
            fs::remove_file(&path)?;
        }

        Ok(())
    }

    /// Get all presets (builtin + user)
    pub fn all_presets(&self) -> impl Iterator<Item = &Preset> {
        self.builtin.iter().chain(self.user.iter())
    }

    pub fn len(&self) -> usize {
        self.builtin.len() + self.user.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<&Preset> {
        self.all_presets().nth(index)
    }

    /// Find a preset by name
    pub fn find(&self, name: &str) -> Option<&Preset> {
        self.all_presets().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Get preset names for display
    pub fn preset_names(&self) -> Vec<&str> {
        self.all_presets().map(|p| p.name.as_str()).collect()
    }
}

fn read_preset(path: &Path) -> Result<Preset, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

fn builtin_presets() -> Vec<Preset> {
    let mut dense = FieldSettings::default();
    dense.graph.connect_distance = 18.0;
    dense.graph.max_edges = 600;
    dense.cluster.spread = 10.0;

    let mut storm = FieldSettings::default();
    storm.ripple.initial_strength = 4.0;
    storm.ripple.capacity = 16;
    storm.space.damping = 0.995;
    storm.space.initial_speed = 0.05;
    storm.interaction.attractor_radius = 25.0;
    storm.interaction.attractor_strength = 0.02;

    let mut still = FieldSettings::default();
    still.space.damping = 0.9;
    still.space.spin = [0.0, 0.0];
    still.space.breath_amplitude = 0.0;
    still.graph.connect_distance = 10.0;
    still.interaction.related_prob = 0.0;

    let mut legacy = FieldSettings::default();
    legacy.space.reflection = ReflectionPolicy::FirstAxis;

    vec![
        Preset::new("Drift", "Default field: gentle drift, three clusters", FieldSettings::default()),
        Preset::new("Dense", "Tighter clusters with a denser web of links", dense),
        Preset::new("Storm", "Strong ripples and a wide restless attractor", storm),
        Preset::new("Still", "Heavy damping, no rotation, sparse links", still),
        Preset::new("Lite", "Reduced particle count for slow terminals", FieldSettings::lite()),
        Preset::new("Legacy Bounce", "Boundary hits always flip the X velocity", legacy),
    ]
}
