// Curated cohort CSV reader

use std::io::ErrorKind;
use std::path::Path;

use tracing::info;

use super::models::RawCohort;
use crate::error::Result;

/// One data line of the CSV, parsed or not
#[derive(Debug, Clone)]
pub struct CohortLine {
    /// 1-based line number in the file; the header is line 1
    pub line: u64,
    /// The parsed row, or why the line could not be read
    pub record: std::result::Result<RawCohort, String>,
}

/// Read every data line of the cohorts CSV
///
/// Returns `Ok(None)` when the file does not exist. A line that cannot be
/// parsed is returned with its error so the normalizer can skip it by line
/// number; only an unreadable file or header fails the call.
pub async fn read_cohorts(path: &Path) -> Result<Option<Vec<CohortLine>>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    info!(path = %path.display(), bytes = bytes.len(), "Reading cohorts CSV");

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(bytes.as_slice());
    let headers = reader.headers()?.clone();

    let mut lines = Vec::new();
    for result in reader.records() {
        let line = match result {
            Ok(record) => CohortLine {
                line: record.position().map(|p| p.line()).unwrap_or_default(),
                record: record
                    .deserialize::<RawCohort>(Some(&headers))
                    .map_err(|e| e.to_string()),
            },
            Err(e) => CohortLine {
                line: e.position().map(|p| p.line()).unwrap_or_default(),
                record: Err(e.to_string()),
            },
        };
        lines.push(line);
    }

    Ok(Some(lines))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_cohorts(&dir.path().join("absent.csv")).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_lines_are_numbered_from_header() {
        let file = csv_file(
            "cohort_name,source_citation,n_participants\n\
             A,Smith 2020,10\n\
             B,Jones 2021,20\n",
        );

        let lines = read_cohorts(file.path()).await.unwrap().unwrap();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].line, 2);
        assert_eq!(lines[1].line, 3);
        let first = lines[0].record.as_ref().unwrap();
        assert_eq!(first.source_citation.as_deref(), Some("Smith 2020"));
        assert_eq!(first.modality, None);
    }

    #[tokio::test]
    async fn test_quoted_commas_and_short_rows() {
        let file = csv_file(
            "cohort_name,source_citation,notes\n\
             \"Arm A, high dose\",\"Doe, J. 2019\"\n",
        );

        let lines = read_cohorts(file.path()).await.unwrap().unwrap();
        let row = lines[0].record.as_ref().unwrap();
        assert_eq!(row.cohort_name.as_deref(), Some("Arm A, high dose"));
        assert_eq!(row.source_citation.as_deref(), Some("Doe, J. 2019"));
        assert_eq!(row.notes, None);
    }
}
