use crate::types::{collections, Difficulty};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Emulator endpoint variable; setting it selects the emulator store backend.
pub const EMULATOR_HOST_ENV: &str = "FIRESTORE_EMULATOR_HOST";
/// Project id used when talking to the emulator.
pub const PROJECT_ENV: &str = "GOOGLE_CLOUD_PROJECT";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Root directory for every generated file
    pub output_dir: PathBuf,
    pub store: StoreConfig,
    pub seed: SeedConfig,
    pub validation: ValidationConfig,
    pub analytics: AnalyticsConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("outputs"),
            store: StoreConfig::default(),
            seed: SeedConfig::default(),
            validation: ValidationConfig::default(),
            analytics: AnalyticsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// JSON files on disk, one directory per collection
    Local,
    /// Firestore emulator over its REST API
    Emulator,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Root of the local store
    pub local_dir: PathBuf,
    /// host:port of the Firestore emulator
    pub emulator_host: String,
    pub project_id: String,
    /// Collections exported and counted, in order
    pub collections: Vec<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Local,
            local_dir: PathBuf::from("store"),
            emulator_host: "127.0.0.1:8080".to_string(),
            project_id: "demo-firestore".to_string(),
            collections: collections::ALL.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// Inclusive range of generated interactions per recipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRange {
    pub min: u32,
    pub max: u32,
}

impl CountRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    /// Hand-written recipe seeded ahead of the synthetic ones
    pub candidate_recipe: PathBuf,
    pub synthetic_recipes: u32,
    pub users: u32,
    /// Fixed RNG seed for reproducible datasets (random when absent)
    pub rng_seed: Option<u64>,
    pub views_per_recipe: CountRange,
    pub likes_per_recipe: CountRange,
    pub attempts_per_recipe: CountRange,
    /// Interactions are timestamped within this many days before now
    pub history_days: u32,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            candidate_recipe: PathBuf::from("seed_data/candidate_recipe.json"),
            synthetic_recipes: 16,
            users: 10,
            rng_seed: None,
            views_per_recipe: CountRange::new(10, 200),
            likes_per_recipe: CountRange::new(0, 40),
            attempts_per_recipe: CountRange::new(0, 20),
            history_days: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Accepted difficulty values, compared case-insensitively
    pub allowed_difficulties: Vec<String>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            allowed_difficulties: Difficulty::ALL.iter().map(|d| d.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Length of every ranking in the insights summary
    pub top_n: usize,
    /// Render SVG charts next to the summary
    pub charts: bool,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            top_n: 10,
            charts: true,
        }
    }
}

impl PipelineConfig {
    /// Load config from a YAML file
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {path}"))?;
        let config: PipelineConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {path}"))?;
        Ok(config)
    }

    /// Load config with fallback to default
    pub fn load_with_fallback(path: Option<&str>) -> Self {
        match path {
            Some(p) => Self::load_from_file(p).unwrap_or_else(|e| {
                eprintln!("⚠️  Failed to load config from {}, using defaults", p);
                tracing::warn!(error = %e, "config load failed");
                Self::default()
            }),
            None => Self::default(),
        }
    }

    /// Apply the emulator environment variables on top of the loaded config.
    pub fn with_env_overrides(mut self) -> Self {
        self.apply_store_overrides(
            std::env::var(EMULATOR_HOST_ENV).ok(),
            std::env::var(PROJECT_ENV).ok(),
        );
        self
    }

    fn apply_store_overrides(&mut self, emulator_host: Option<String>, project: Option<String>) {
        if let Some(host) = emulator_host.filter(|h| !h.trim().is_empty()) {
            self.store.backend = StoreBackend::Emulator;
            self.store.emulator_host = host.trim().to_string();
        }
        if let Some(project) = project.filter(|p| !p.trim().is_empty()) {
            self.store.project_id = project.trim().to_string();
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    // Output layout

    pub fn raw_json_dir(&self) -> PathBuf {
        self.output_dir.join("raw_json")
    }

    pub fn raw_json_path(&self, collection: &str) -> PathBuf {
        self.raw_json_dir().join(format!("{collection}.json"))
    }

    pub fn csv_dir(&self) -> PathBuf {
        self.output_dir.join("csv")
    }

    pub fn validation_report_path(&self) -> PathBuf {
        self.output_dir.join("validation_report.json")
    }

    pub fn analytics_dir(&self) -> PathBuf {
        self.output_dir.join("analytics")
    }

    pub fn insights_path(&self) -> PathBuf {
        self.analytics_dir().join("insights.md")
    }

    pub fn charts_dir(&self) -> PathBuf {
        self.analytics_dir().join("charts")
    }

    /// Local store root; relative paths live under the output directory.
    pub fn local_store_dir(&self) -> PathBuf {
        resolve_under(&self.output_dir, &self.store.local_dir)
    }
}

fn resolve_under(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "output_dir: /tmp/run\nanalytics:\n  top_n: 3\n";
        let config: PipelineConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("/tmp/run"));
        assert_eq!(config.analytics.top_n, 3);
        assert!(config.analytics.charts);
        assert_eq!(config.seed.synthetic_recipes, 16);
        assert_eq!(config.store.backend, StoreBackend::Local);
        assert_eq!(config.validation.allowed_difficulties, vec!["easy", "medium", "hard"]);
    }

    #[test]
    fn test_emulator_host_selects_emulator_backend() {
        let mut config = PipelineConfig::default();
        config.apply_store_overrides(Some("localhost:9090".to_string()), Some("proj".to_string()));
        assert_eq!(config.store.backend, StoreBackend::Emulator);
        assert_eq!(config.store.emulator_host, "localhost:9090");
        assert_eq!(config.store.project_id, "proj");
    }

    #[test]
    fn test_blank_env_values_are_ignored() {
        let mut config = PipelineConfig::default();
        config.apply_store_overrides(Some("  ".to_string()), None);
        assert_eq!(config.store.backend, StoreBackend::Local);
        assert_eq!(config.store.project_id, "demo-firestore");
    }

    #[test]
    fn test_output_layout() {
        let config = PipelineConfig {
            output_dir: PathBuf::from("out"),
            ..Default::default()
        };
        assert_eq!(config.raw_json_path("recipes"), PathBuf::from("out/raw_json/recipes.json"));
        assert_eq!(config.csv_dir(), PathBuf::from("out/csv"));
        assert_eq!(config.validation_report_path(), PathBuf::from("out/validation_report.json"));
        assert_eq!(config.charts_dir(), PathBuf::from("out/analytics/charts"));
        assert_eq!(config.local_store_dir(), PathBuf::from("out/store"));
    }

    #[test]
    fn test_example_config_file_loads() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../configs/pipeline.yaml");
        let config = PipelineConfig::load_from_file(path).unwrap();
        assert_eq!(config.seed.rng_seed, Some(42));
        assert_eq!(config.seed.likes_per_recipe, CountRange::new(0, 40));
        assert_eq!(config.store.collections, vec!["recipes", "users", "interactions"]);
    }

    #[test]
    fn test_bad_config_file_falls_back_to_defaults() {
        let config = PipelineConfig::load_with_fallback(Some("/nonexistent/pipeline.yaml"));
        assert_eq!(config.output_dir, PathBuf::from("outputs"));
    }

    #[test]
    fn test_yaml_roundtrip_of_defaults() {
        let yaml = PipelineConfig::default().to_yaml().unwrap();
        let parsed: PipelineConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.seed.views_per_recipe, CountRange::new(10, 200));
        assert_eq!(parsed.store.collections.len(), 3);
    }
}
