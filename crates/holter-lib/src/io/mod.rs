//! Record sources. A Holter record file is adapted into a lazy, single-pass
//! stream of [`Wave`] values; the decoding strategy is picked once, from the
//! file extension, at open time.

pub mod csv;

use std::fs::File;
use std::path::Path;

use crate::error::HolterError;
use crate::wave::Wave;

use self::csv::{CsvWaveReader, TagPolicy};

/// Supported record container formats. Adding a format means adding a
/// variant and its strategy, not branching on string suffixes downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Result<Self, HolterError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        if extension.eq_ignore_ascii_case("csv") {
            Ok(SourceFormat::Csv)
        } else {
            Err(HolterError::UnsupportedFormat {
                extension: extension.to_string(),
            })
        }
    }
}

#[derive(Debug)]
enum Strategy {
    Csv(CsvWaveReader<File>),
}

/// Reader over one Holter record file.
///
/// Forward-only and single-pass: iteration ends when the source is
/// exhausted, and the underlying file handle is released when the reader is
/// dropped, on every exit path.
#[derive(Debug)]
pub struct RecordReader {
    strategy: Strategy,
}

impl RecordReader {
    pub fn open(path: &Path) -> Result<Self, HolterError> {
        Self::open_with_policy(path, TagPolicy::default())
    }

    pub fn open_with_policy(path: &Path, policy: TagPolicy) -> Result<Self, HolterError> {
        let strategy = match SourceFormat::from_path(path)? {
            SourceFormat::Csv => {
                let file = File::open(path)?;
                Strategy::Csv(CsvWaveReader::with_policy(file, policy)?)
            }
        };
        Ok(Self { strategy })
    }
}

impl Iterator for RecordReader {
    type Item = Result<Wave, HolterError>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.strategy {
            Strategy::Csv(reader) => reader.next(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn workspace_root() -> PathBuf {
        let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        manifest_dir
            .parent()
            .and_then(|p| p.parent())
            .expect("workspace root")
            .to_path_buf()
    }

    #[test]
    fn format_is_picked_from_extension() {
        assert_eq!(
            SourceFormat::from_path(Path::new("record.csv")).unwrap(),
            SourceFormat::Csv
        );
        assert_eq!(
            SourceFormat::from_path(Path::new("record.CSV")).unwrap(),
            SourceFormat::Csv
        );
        assert!(matches!(
            SourceFormat::from_path(Path::new("record.xml")),
            Err(HolterError::UnsupportedFormat { extension }) if extension == "xml"
        ));
        assert!(matches!(
            SourceFormat::from_path(Path::new("record")),
            Err(HolterError::UnsupportedFormat { extension }) if extension.is_empty()
        ));
    }

    #[test]
    fn reads_the_sample_record() {
        let path = workspace_root().join("test_data/sample_record.csv");
        let waves: Result<Vec<_>, _> = RecordReader::open(&path).expect("open record").collect();
        assert_eq!(waves.expect("parse record").len(), 26);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = RecordReader::open(Path::new("no_such_record.csv")).unwrap_err();
        assert!(matches!(err, HolterError::Io(_)));
    }
}
