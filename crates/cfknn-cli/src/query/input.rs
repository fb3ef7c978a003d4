use anyhow::Result;
use cfknn_core::ModelConfig;
use clap::ArgMatches;

use crate::util::{apply_model_overrides, validate_tsv_or_csv_file};

/// Arguments shared by `recommend` and `predict`.
#[derive(Debug, Clone)]
pub struct QueryConfig {
    pub ratings: String,
    pub model: ModelConfig,
    pub user: u32,
}

impl QueryConfig {
    pub fn from_arguments(matches: &ArgMatches) -> Result<Self> {
        let ratings = matches
            .get_one::<String>("ratings")
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("A ratings file is required"))?;
        validate_tsv_or_csv_file(&ratings)?;

        let user = *matches
            .get_one::<u32>("user")
            .ok_or_else(|| anyhow::anyhow!("--user is required"))?;

        Ok(Self {
            ratings,
            model: apply_model_overrides(ModelConfig::default(), matches)?,
            user,
        })
    }
}
