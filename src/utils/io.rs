use csv::ReaderBuilder;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read};
use std::path::Path;

use crate::error::{ForestError, Result};
use crate::utils::structures::SampleStore;

/// Reads a delimited file of numeric columns into a `SampleStore`.
///
/// Rows with missing, non-numeric or non-finite cells are rejected with
/// `InvalidInput`; `row` counts data rows from 0, excluding the header.
pub fn read_csv(path: impl AsRef<Path>, delimiter: u8, header: bool) -> Result<SampleStore> {
    let reader = BufReader::new(File::open(path)?);
    parse_csv(reader, delimiter, header)
}

pub fn parse_csv<R: Read>(reader: R, delimiter: u8, header: bool) -> Result<SampleStore> {
    let mut reader = ReaderBuilder::new()
        .has_headers(header)
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut data = Vec::new();
    let mut n_features = None;

    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let expected = *n_features.get_or_insert(record.len());
        if record.len() != expected {
            return Err(ForestError::InvalidInput {
                row,
                column: record.len().min(expected),
                reason: format!("expected {} values, got {}", expected, record.len()),
            });
        }
        for (column, field) in record.iter().enumerate() {
            let value = field.parse::<f64>().map_err(|_| ForestError::InvalidInput {
                row,
                column,
                reason: format!("not a number: {:?}", field),
            })?;
            if !value.is_finite() {
                return Err(ForestError::InvalidInput {
                    row,
                    column,
                    reason: format!("non-finite value {}", value),
                });
            }
            data.push(value);
        }
    }
    SampleStore::from_flat(data, n_features.unwrap_or(0))
}

/// Writes a store as CSV with `feature_<i>` headers.
pub fn write_csv(path: impl AsRef<Path>, store: &SampleStore) -> Result<()> {
    create_parent(path.as_ref())?;
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record((0..store.n_features()).map(|i| format!("feature_{}", i + 1)))?;
    for row in store.rows() {
        writer.write_record(row.iter().map(|v| v.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes `index,score` rows in input order.
pub fn write_scores(path: impl AsRef<Path>, scores: &[(usize, f64)]) -> Result<()> {
    create_parent(path.as_ref())?;
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["index", "score"])?;
    for (index, score) in scores {
        writer.write_record([index.to_string(), format!("{:.6}", score)])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_bin<T>(path: impl AsRef<Path>, data: &T) -> Result<()>
where
    T: serde::Serialize,
{
    create_parent(path.as_ref())?;
    let mut f = BufWriter::new(File::create(path)?);
    rmp_serde::encode::write(&mut f, data)?;
    Ok(())
}

pub fn read_bin<T>(path: impl AsRef<Path>) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let mut f = BufReader::new(File::open(path)?);
    Ok(rmp_serde::from_read(&mut f)?)
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_header() {
        let input = "Feature_1,Feature_2\n1.5,2\n-3,4e1\n";
        let store = parse_csv(input.as_bytes(), b',', true).unwrap();
        assert_eq!(store.n_rows(), 2);
        assert_eq!(store.n_features(), 2);
        assert_eq!(store.row(1), &[-3.0, 40.0]);
    }

    #[test]
    fn test_parse_rejects_text() {
        let input = "1.0,2.0\n3.0,abc\n";
        let err = parse_csv(input.as_bytes(), b',', false).unwrap_err();
        assert!(matches!(
            err,
            ForestError::InvalidInput {
                row: 1,
                column: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_rejects_missing_cell() {
        let input = "1.0,2.0\n3.0\n";
        let err = parse_csv(input.as_bytes(), b',', false).unwrap_err();
        assert!(matches!(err, ForestError::InvalidInput { row: 1, .. }));
    }

    #[test]
    fn test_parse_rejects_nan() {
        let input = "x\n1.0\nNaN\n";
        assert!(parse_csv(input.as_bytes(), b',', true).is_err());
    }

    #[test]
    fn test_parse_tab_delimited() {
        let input = "1\t2\t3\n";
        let store = parse_csv(input.as_bytes(), b'\t', false).unwrap();
        assert_eq!(store.n_features(), 3);
    }
}
