use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Result;
use cfknn_core::{ModelConfig, Role, SimilarityKind};
use clap::ArgMatches;

pub fn validate_tsv_or_csv_file(path: &str) -> Result<()> {
    let pb = PathBuf::from(path);

    let ext = pb.extension().and_then(|s| s.to_str()).map(|s| s.to_lowercase());
    match ext.as_deref() {
        Some("tsv") | Some("csv") => {}
        _ => anyhow::bail!("File must have a .tsv or .csv extension: {}", path),
    }

    if !pb.exists() {
        anyhow::bail!("File does not exist: {}", path);
    }

    Ok(())
}

/// Apply the `-k`, `--role` and `--similarity` overrides to `config`.
///
/// Every subcommand that calls this must define all three arguments.
pub fn apply_model_overrides(mut config: ModelConfig, matches: &ArgMatches) -> Result<ModelConfig> {
    if let Some(k) = matches.get_one::<usize>("k") {
        config.k = *k;
    }
    if let Some(role) = matches.get_one::<String>("role") {
        config.role = Role::from_str(role)?;
    }
    if let Some(similarity) = matches.get_one::<String>("similarity") {
        config.similarity = SimilarityKind::from_str(similarity)?;
    }
    config.validate()?;
    Ok(config)
}
