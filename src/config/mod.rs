// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Configuration module

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::detection::SimulationConfig;
use crate::report::ReportConfig;
use crate::rules::RuleConfig;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Application name
    pub app_name: String,

    /// Application version
    pub version: String,

    /// Log level
    pub log_level: String,

    /// Candidate name, may be changed any time before export
    pub candidate_name: String,

    /// Sampler configuration
    pub sampler: SamplerConfig,

    /// Camera configuration
    pub camera: CameraConfig,

    /// Rule thresholds and cooldowns
    pub rules: RuleConfig,

    /// Scoring and export
    pub report: ReportConfig,

    /// Simulated detection model
    pub simulation: SimulationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "Proctorwatch".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            log_level: "info".to_string(),
            candidate_name: String::new(),
            sampler: SamplerConfig::default(),
            camera: CameraConfig::default(),
            rules: RuleConfig::default(),
            report: ReportConfig::default(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {:?}", path))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {:?}", path))?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Load or create default configuration
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            let config = Self::default();

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            config.save(path)?;
            Ok(config)
        }
    }

    /// Get configuration directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("proctorwatch"))
            .unwrap_or_else(|| PathBuf::from("./config"))
    }

    /// Get default configuration path
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }
}

/// Sampler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Time between sampling ticks
    pub interval_ms: u64,

    /// Abandon a detection call after this long. Unset means wait forever.
    pub detect_timeout_ms: Option<u64>,

    /// Ignore detections scored below this
    pub min_confidence: f32,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            detect_timeout_ms: None,
            min_confidence: 0.0,
        }
    }
}

/// Camera configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Device identifier
    pub device: String,

    /// Frame width
    pub width: u32,

    /// Frame height
    pub height: u32,

    /// Time before the stream yields decodable frames
    pub warmup_ms: u64,

    /// Simulate a declined permission prompt
    pub deny_access: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: "camera-0".to_string(),
            width: 640,
            height: 480,
            warmup_ms: 500,
            deny_access: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_rule_constants() {
        let config = Config::default();
        assert_eq!(config.sampler.interval_ms, 1000);
        assert_eq!(config.rules.absence_threshold_ms, 5000);
        assert_eq!(config.rules.prohibited_cooldown_ms, 2000);
        assert_eq!(config.rules.prohibited_labels.len(), 5);
        assert_eq!(config.report.file_name, "proctoring_report.csv");
    }

    #[test]
    fn test_load_or_create_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let created = Config::load_or_create(&path).unwrap();
        assert!(path.exists());

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.app_name, created.app_name);
        assert_eq!(loaded.rules.gaze_min_x, 0.35);
        assert_eq!(loaded.sampler.detect_timeout_ms, None);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "candidate_name = \"Ada\"\n[sampler]\ninterval_ms = 250\ndetect_timeout_ms = 3000\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.candidate_name, "Ada");
        assert_eq!(config.sampler.interval_ms, 250);
        assert_eq!(config.sampler.detect_timeout_ms, Some(3000));
        assert_eq!(config.rules.multiple_faces_cooldown_ms, 5000);
    }
}
