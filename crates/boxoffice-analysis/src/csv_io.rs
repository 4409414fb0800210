//! Loading and persisting tables as delimited text
//!
//! The raw export is semicolon-separated and starts with a banner line that is
//! not part of the header. Processed tables are written comma-separated with a
//! header row and no index column.
//!
//! Column types are inferred over every row, so a rating column holding both
//! `14` and `Livre` reads as text no matter where `Livre` first appears. Empty
//! cells are null.

use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use polars::{io::mmap::MmapBytesReader, prelude::*};
use serde::{Deserialize, Serialize};

/// Field separator and banner handling for an input file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvFormat {
    /// Field separator (ASCII)
    pub delimiter: char,
    /// Rows to skip before the header row
    pub skip_lines: usize,
}

impl Default for CsvFormat {
    fn default() -> Self {
        Self {
            delimiter: ';',
            skip_lines: 1,
        }
    }
}

impl CsvFormat {
    /// Format of the processed table: comma-separated, header on the first line
    #[must_use]
    pub fn processed() -> Self {
        Self {
            delimiter: ',',
            skip_lines: 0,
        }
    }

    fn separator(&self) -> Result<u8, ReadError> {
        u8::try_from(self.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or(ReadError::InvalidDelimiter {
                delimiter: self.delimiter,
            })
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ReadError {
    #[display("failed to open {}", path.display())]
    Open { path: PathBuf, source: io::Error },
    #[display("delimiter '{delimiter}' is not a single ASCII character")]
    InvalidDelimiter { delimiter: char },
    #[display("malformed CSV input")]
    Csv { source: PolarsError },
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum WriteError {
    #[display("failed to create {}", path.display())]
    Create { path: PathBuf, source: io::Error },
    #[display("failed to write CSV output")]
    Csv { source: PolarsError },
    #[display("failed to flush CSV output")]
    Flush { source: io::Error },
    #[display("failed to move {} into place", path.display())]
    Rename { path: PathBuf, source: io::Error },
}

/// Reads a table from a file
pub fn read_table_file<P>(path: P, format: &CsvFormat) -> Result<DataFrame, ReadError>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| ReadError::Open {
        path: path.to_owned(),
        source,
    })?;
    read_table(file, format)
}

/// Reads a table from any seekable byte source
///
/// # Example
///
/// ```
/// use std::io::Cursor;
///
/// use boxoffice_analysis::{csv_io::{CsvFormat, read_table}, frame};
///
/// let input = "Exported 2024-01-01\nSala;Valor\nA;10\nB;\n";
/// let table = read_table(Cursor::new(input), &CsvFormat::default())?;
/// assert_eq!(frame::column_names(&table), ["Sala", "Valor"]);
/// assert_eq!(frame::numbers(&table, "Valor")?, vec![Some(10.0), None]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn read_table<R>(reader: R, format: &CsvFormat) -> Result<DataFrame, ReadError>
where
    R: MmapBytesReader,
{
    let parse_options = CsvParseOptions::default().with_separator(format.separator()?);
    CsvReadOptions::default()
        .with_has_header(true)
        .with_skip_rows(format.skip_lines)
        .with_infer_schema_length(None)
        .with_parse_options(parse_options)
        .into_reader_with_file_handle(reader)
        .finish()
        .map_err(|source| ReadError::Csv { source })
}

/// Writes a table as comma-separated text with a header row
pub fn write_table<W>(table: &DataFrame, writer: W) -> Result<(), WriteError>
where
    W: Write,
{
    let mut table = table.clone();
    CsvWriter::new(writer)
        .include_header(true)
        .with_separator(b',')
        .finish(&mut table)
        .map_err(|source| WriteError::Csv { source })
}

/// Persists a table to `path` without ever exposing a partial file
///
/// The table is written to a hidden sibling file first and renamed over the
/// destination once fully flushed. The temporary file is removed on failure.
pub fn persist_table<P>(table: &DataFrame, path: P) -> Result<(), WriteError>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let tmp_path = temporary_sibling(path);
    let result = write_to_temporary(table, path, &tmp_path).and_then(|()| {
        fs::rename(&tmp_path, path).map_err(|source| WriteError::Rename {
            path: path.to_owned(),
            source,
        })
    });
    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

fn write_to_temporary(table: &DataFrame, path: &Path, tmp_path: &Path) -> Result<(), WriteError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| WriteError::Create {
            path: parent.to_owned(),
            source,
        })?;
    }
    let file = File::create(tmp_path).map_err(|source| WriteError::Create {
        path: tmp_path.to_owned(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    write_table(table, &mut writer)?;
    writer
        .flush()
        .map_err(|source| WriteError::Flush { source })?;
    Ok(())
}

fn temporary_sibling(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map_or_else(|| "table".into(), |n| n.to_string_lossy().into_owned());
    path.with_file_name(format!(".{file_name}.tmp"))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use polars::df;

    use super::*;
    use crate::frame::{self, FrameError};

    fn read(input: &str, format: &CsvFormat) -> DataFrame {
        read_table(Cursor::new(input.to_owned()), format).unwrap()
    }

    #[test]
    fn test_banner_is_skipped() {
        let input = "Relatorio de bilheteria\nEspaço;Valor do Ingresso\nSala 1;10.5\nSala 2;\n";
        let table = read(input, &CsvFormat::default());
        assert_eq!(
            frame::column_names(&table),
            ["Espaço", "Valor do Ingresso"]
        );
        assert_eq!(
            frame::numbers(&table, "Valor do Ingresso").unwrap(),
            vec![Some(10.5), None]
        );
    }

    #[test]
    fn test_trailing_delimiter_adds_empty_column() {
        let input = "banner\na;b;\n1;2;\n3;4;\n";
        let table = read(input, &CsvFormat::default());
        assert_eq!(table.width(), 3);
        let last = table.get_columns().last().unwrap();
        assert!(frame::is_all_null(last));
    }

    #[test]
    fn test_types_are_inferred_over_all_rows() {
        let mut input = String::from("banner\nrating;sold\n");
        for i in 0..200 {
            input.push_str(&format!("{};{i}\n", 10 + i % 3));
        }
        input.push_str("Livre;7\n");
        let table = read(&input, &CsvFormat::default());
        assert!(matches!(
            frame::numbers(&table, "rating"),
            Err(FrameError::NotNumeric { .. })
        ));
        assert_eq!(frame::numbers(&table, "sold").unwrap().len(), 201);
    }

    #[test]
    fn test_invalid_delimiter() {
        let format = CsvFormat {
            delimiter: '→',
            skip_lines: 0,
        };
        let err = read_table(Cursor::new("a→b\n"), &format).unwrap_err();
        assert!(matches!(err, ReadError::InvalidDelimiter { delimiter: '→' }));
    }

    #[test]
    fn test_written_table_reads_back() {
        let table = df!(
            "hora" => [Some(20.0), None],
            "valor" => [Some(12.5), Some(0.0)]
        )
        .unwrap();
        let mut out = Vec::new();
        write_table(&table, &mut out).unwrap();
        let text = String::from_utf8(out.clone()).unwrap();
        assert!(text.starts_with("hora,valor\n"));

        let read = read_table(Cursor::new(out), &CsvFormat::processed()).unwrap();
        assert_eq!(frame::numbers(&read, "hora").unwrap(), vec![Some(20.0), None]);
        assert_eq!(
            frame::numbers(&read, "valor").unwrap(),
            vec![Some(12.5), Some(0.0)]
        );
    }

    #[test]
    fn test_persist_leaves_no_temporary_file() {
        let dir = std::env::temp_dir().join(format!("boxoffice-csv-{}", std::process::id()));
        let path = dir.join("nested/processed.csv");
        let table = df!("x" => [1.0, 2.0]).unwrap();
        persist_table(&table, &path).unwrap();
        assert!(path.exists());
        assert!(!temporary_sibling(&path).exists());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
