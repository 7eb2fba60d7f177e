//! Simulation settings
//!
//! Pool capacities, playfield size and run tunables. Persisted as JSON; any
//! field missing from the file takes its default.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{SCREEN_HEIGHT, SCREEN_WIDTH};

/// Settings load/save failure
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed settings JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Particle pool capacity for this preset
    pub fn max_particles(&self) -> usize {
        match self {
            QualityPreset::Low => 100,
            QualityPreset::Medium => 500,
            QualityPreset::High => 2000,
        }
    }

    /// Star pool capacity for this preset
    pub fn star_count(&self) -> usize {
        match self {
            QualityPreset::Low => 40,
            QualityPreset::Medium => 120,
            QualityPreset::High => 250,
        }
    }
}

/// Simulation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Quality preset (drives particle and star capacity)
    pub quality: QualityPreset,
    /// Particle effects (explosions, exhaust)
    pub particles: bool,
    /// Parallax starfield
    pub starfield: bool,

    // === Playfield ===
    pub screen_width: f32,
    pub screen_height: f32,

    // === Run ===
    /// RNG seed for the run
    pub seed: u64,
    pub starting_lives: u8,
    /// Large asteroids on wave 1 (one more each wave)
    pub initial_asteroids: u32,
    pub enemies_per_wave: u32,

    // === Pool capacities ===
    pub max_bullets: usize,
    pub max_asteroids: usize,
    pub max_enemies: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            particles: true,
            starfield: true,

            screen_width: SCREEN_WIDTH,
            screen_height: SCREEN_HEIGHT,

            seed: 0x5EED,
            starting_lives: 3,
            initial_asteroids: 4,
            enemies_per_wave: 3,

            max_bullets: 32,
            max_asteroids: 64,
            max_enemies: 16,
        }
    }
}

impl Settings {
    /// Create settings from a quality preset
    pub fn from_preset(preset: QualityPreset) -> Self {
        let mut settings = Self::default();
        settings.apply_preset(preset);
        settings
    }

    /// Apply a quality preset (updates quality-dependent settings)
    pub fn apply_preset(&mut self, preset: QualityPreset) {
        self.quality = preset;

        // Low preset drops the background for performance
        if preset == QualityPreset::Low {
            self.starfield = false;
        }
    }

    /// Effective particle pool capacity
    pub fn max_particles(&self) -> usize {
        if !self.particles {
            0
        } else {
            self.quality.max_particles()
        }
    }

    /// Effective star pool capacity
    pub fn max_stars(&self) -> usize {
        if !self.starfield {
            0
        } else {
            self.quality.star_count()
        }
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(self.screen_width > 0.0 && self.screen_width.is_finite()) {
            return Err(SettingsError::Invalid {
                field: "screen_width",
                reason: format!("must be positive, got {}", self.screen_width),
            });
        }
        if !(self.screen_height > 0.0 && self.screen_height.is_finite()) {
            return Err(SettingsError::Invalid {
                field: "screen_height",
                reason: format!("must be positive, got {}", self.screen_height),
            });
        }
        if self.starting_lives == 0 {
            return Err(SettingsError::Invalid {
                field: "starting_lives",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.initial_asteroids as usize > self.max_asteroids {
            return Err(SettingsError::Invalid {
                field: "initial_asteroids",
                reason: format!(
                    "{} does not fit in max_asteroids {}",
                    self.initial_asteroids, self.max_asteroids
                ),
            });
        }
        Ok(())
    }

    /// Parse and validate settings from JSON text
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load settings, falling back to defaults on any failure
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("{e}; using default settings");
                Self::default()
            }
        }
    }

    /// Save settings as pretty JSON
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}
