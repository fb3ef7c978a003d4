use std::path::Path;

use anyhow::{Context, Result};
use cfknn_core::evaluation::EvaluationOptions;
use cfknn_core::io::RatingsReaderConfig;
use cfknn_core::ModelConfig;
use clap::ArgMatches;
use serde::{Deserialize, Serialize};

use crate::util::{apply_model_overrides, validate_tsv_or_csv_file};

/// Parameters for an evaluation run. Every field is optional in the JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluateConfig {
    pub ratings: String,
    pub reader: RatingsReaderConfig,
    pub model: ModelConfig,
    pub evaluation: EvaluationOptions,
    pub output_file: Option<String>,
}

impl Default for EvaluateConfig {
    fn default() -> Self {
        Self {
            ratings: String::new(),
            reader: RatingsReaderConfig::default(),
            model: ModelConfig::default(),
            evaluation: EvaluationOptions::default(),
            output_file: None,
        }
    }
}

/// Load an evaluation configuration from a JSON file.
pub fn load_evaluate_config<P: AsRef<Path>>(path: P) -> Result<EvaluateConfig> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config: {}", path.as_ref().display()))?;
    let config: EvaluateConfig = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.as_ref().display()))?;
    Ok(config)
}

impl EvaluateConfig {
    /// Load `config_path` and apply the command line overrides.
    pub fn from_arguments(config_path: &Path, matches: &ArgMatches) -> Result<Self> {
        let mut config = load_evaluate_config(config_path)?;

        if let Some(ratings) = matches.get_one::<String>("ratings") {
            config.ratings = ratings.clone();
        }
        validate_tsv_or_csv_file(&config.ratings)?;

        config.model = apply_model_overrides(config.model, matches)?;

        if let Some(top_k) = matches.get_one::<usize>("top_k") {
            config.evaluation.top_k = *top_k;
        }
        if let Some(seed) = matches.get_one::<u64>("seed") {
            config.evaluation.seed = *seed;
        }
        if matches.get_flag("no_hit_rate") {
            config.evaluation.skip_hit_rate = true;
        }
        if let Some(output_file) = matches.get_one::<String>("output_file") {
            config.output_file = Some(output_file.clone());
        }

        Ok(config)
    }
}
