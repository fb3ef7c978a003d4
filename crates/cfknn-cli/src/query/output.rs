use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

/// Write `user_id,item_id,score` rows, best first.
pub fn write_recommendations<W: Write>(
    writer: W,
    delimiter: u8,
    user: u32,
    recommendations: &[(u32, f64)],
) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);

    writer.write_record(["user_id", "item_id", "score"])?;
    for (item, score) in recommendations {
        writer.write_record(&[user.to_string(), item.to_string(), format!("{:.6}", score)])?;
    }

    writer.flush()?;
    Ok(())
}

/// Write recommendations to a CSV or TSV file based on the file extension.
pub fn write_recommendations_to_path<P: AsRef<Path>>(
    path: P,
    user: u32,
    recommendations: &[(u32, f64)],
) -> Result<()> {
    let path = path.as_ref();
    let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("csv");
    let delimiter = match extension {
        "tsv" => b'\t',
        _ => b',',
    };

    let file = File::create(path)
        .with_context(|| format!("Failed to create output file: {:?}", path))?;
    write_recommendations(BufWriter::new(file), delimiter, user, recommendations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_header_and_rows() {
        let mut buf = Vec::new();
        write_recommendations(&mut buf, b',', 7, &[(3, 4.5), (1, 2.25)]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "user_id,item_id,score\n7,3,4.500000\n7,1,2.250000\n"
        );
    }
}
