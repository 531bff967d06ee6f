//! Data loading utilities for the Ronda CLI.

use anyhow::{Context, Result};
use polars::prelude::*;
use ronda_traits::{FactorSignal, PriceTable, signal_from_column};
use std::path::Path;

/// A loaded CSV file with its price table.
pub(crate) struct Dataset {
    pub(crate) frame: DataFrame,
    pub(crate) prices: PriceTable,
}

impl Dataset {
    /// Read `path` and build the price table from it.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let frame = read_csv(path)?;
        let prices = PriceTable::try_from(&frame)
            .with_context(|| format!("failed to read prices from {}", path.display()))?;
        Ok(Self { frame, prices })
    }

    /// Factor column `name` indexed like the price table.
    pub(crate) fn signal(&self, name: &str) -> Result<FactorSignal> {
        Ok(signal_from_column(&self.frame, name)?)
    }
}

/// Read a CSV file with a header row.
pub(crate) fn read_csv(path: &Path) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
        .with_context(|| format!("failed to read {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_dataset() {
        let file = write_csv(
            "Date,Close,momentum\n2024-01-03,101.0,0.2\n2024-01-02,100.0,0.1\n2024-01-04,102.0,\n",
        );
        let dataset = Dataset::load(file.path()).unwrap();

        assert_eq!(dataset.prices.len(), 3);
        assert_eq!(dataset.prices.close().values(), &[100.0, 101.0, 102.0]);

        let signal = dataset.signal("momentum").unwrap();
        assert_eq!(signal.values()[0], 0.1);
        assert!(signal.values()[2].is_nan());
        assert!(dataset.signal("missing").is_err());
    }

    #[test]
    fn test_missing_close_column() {
        let file = write_csv("date,open\n2024-01-02,1.0\n");
        let err = Dataset::load(file.path()).err().unwrap();
        assert!(format!("{err:#}").contains("close"));
    }

    #[test]
    fn test_missing_file() {
        assert!(read_csv(Path::new("/nonexistent/prices.csv")).is_err());
    }
}
