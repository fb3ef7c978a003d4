//! Delimited rating file reader.
//!
//! Reads `(user, item, rating)` rows from CSV or TSV into a validated
//! [`RatingSet`]. Cells that are not numbers, negative ids and non-finite
//! ratings are reported as `MalformedInput` with the zero-based record index.
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use csv::StringRecord;
use serde::{Deserialize, Serialize};

use crate::error::CfError;
use crate::ratings::RatingSet;

/// Configuration for reading rating files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingsReaderConfig {
    /// Header of the user id column.
    pub user_column: String,
    /// Header of the item id column.
    pub item_column: String,
    /// Header of the rating value column.
    pub rating_column: String,
    /// Field delimiter. When `None` it is `\t` for `.tsv` files and `,`
    /// otherwise.
    pub delimiter: Option<u8>,
    /// Without headers the first three columns are user, item, rating.
    pub has_headers: bool,
}

impl Default for RatingsReaderConfig {
    fn default() -> Self {
        Self {
            user_column: "user_id".to_string(),
            item_column: "item_id".to_string(),
            rating_column: "rating".to_string(),
            delimiter: None,
            has_headers: true,
        }
    }
}

/// Read a rating file with the default column names.
pub fn read_ratings<P: AsRef<Path>>(path: P) -> Result<RatingSet> {
    read_ratings_with_config(path, &RatingsReaderConfig::default())
}

/// Read a rating file using a custom configuration.
pub fn read_ratings_with_config<P: AsRef<Path>>(
    path: P,
    config: &RatingsReaderConfig,
) -> Result<RatingSet> {
    let path = path.as_ref();
    let delimiter = config.delimiter.unwrap_or_else(|| {
        let is_tsv = path.extension().map(|e| e == "tsv").unwrap_or(false);
        if is_tsv {
            b'\t'
        } else {
            b','
        }
    });

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(config.has_headers)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open ratings file: {}", path.display()))?;

    let columns = if config.has_headers {
        let headers = reader
            .headers()
            .context("Failed to read ratings header row")?
            .clone();
        [
            find_column(&headers, &config.user_column)?,
            find_column(&headers, &config.item_column)?,
            find_column(&headers, &config.rating_column)?,
        ]
    } else {
        [0, 1, 2]
    };

    let mut triples = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record
            .with_context(|| format!("Failed to read record {} of {}", index, path.display()))?;
        let user = parse_field::<i64>(&record, columns[0], index, "user")?;
        let item = parse_field::<i64>(&record, columns[1], index, "item")?;
        let rating = parse_field::<f64>(&record, columns[2], index, "rating")?;
        triples.push((user, item, rating));
    }

    let ratings = RatingSet::from_raw(&triples)
        .with_context(|| format!("Invalid ratings in {}", path.display()))?;
    log::info!(
        "Loaded {} ratings ({} users, {} items) from {}",
        ratings.len(),
        ratings.subject_count(),
        ratings.target_count(),
        path.display()
    );
    Ok(ratings)
}

fn find_column(headers: &StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(name))
        .ok_or_else(|| anyhow!("Column '{}' not found in header: {:?}", name, headers))
}

fn parse_field<T: std::str::FromStr>(
    record: &StringRecord,
    column: usize,
    index: usize,
    field: &str,
) -> Result<T> {
    let raw = record.get(column).ok_or_else(|| CfError::MalformedInput {
        index,
        reason: format!("missing {} column", field),
    })?;
    raw.parse::<T>().map_err(|_| {
        CfError::MalformedInput {
            index,
            reason: format!("{} value '{}' is not a number", field, raw),
        }
        .into()
    })
}
