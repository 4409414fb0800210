use std::{
    fs::{self, File},
    io::{self, BufReader, BufWriter, Write},
    path::Path,
};

use anyhow::Context;

/// Opens `path` for writing, creating its parent directories; stdout when `None`
pub fn create_output(path: Option<&Path>) -> anyhow::Result<Box<dyn Write>> {
    let Some(path) = path else {
        return Ok(Box::new(io::stdout().lock()));
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    Ok(Box::new(BufWriter::new(file)))
}

pub fn save_json<T>(value: &T, path: &Path) -> anyhow::Result<()>
where
    T: serde::Serialize,
{
    let mut output = create_output(Some(path))?;
    serde_json::to_writer_pretty(&mut output, value)
        .with_context(|| format!("Failed to write JSON to {}", path.display()))?;
    writeln!(output)
        .and_then(|()| output.flush())
        .with_context(|| format!("Failed to write JSON to {}", path.display()))
}

/// Writes a single-column CSV: the header record, then one record per value
pub fn write_csv_column<W, I>(output: W, header: &str, values: I) -> anyhow::Result<()>
where
    W: Write,
    I: IntoIterator<Item = String>,
{
    let mut writer = csv::Writer::from_writer(output);
    writer
        .write_record([header])
        .context("Failed to write CSV header")?;
    for value in values {
        writer
            .write_record([value])
            .context("Failed to write CSV record")?;
    }
    writer.flush().context("Failed to flush CSV output")
}

pub fn read_json_file<T, P>(file_kind: &str, path: P) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open {file_kind} file: {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse {file_kind} JSON file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_column_quotes_special_values() {
        let mut out = Vec::new();
        let values = ["12.5".to_owned(), "a,b".to_owned(), "3".to_owned()];
        write_csv_column(&mut out, "predicted_quantidade", values).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "predicted_quantidade\n12.5\n\"a,b\"\n3\n"
        );
    }

    #[test]
    fn test_json_round_trip_through_file() {
        let dir = std::env::temp_dir().join(format!("boxoffice-util-{}", std::process::id()));
        let path = dir.join("nested/vocabulary.json");
        save_json(&vec!["Sala 1", "Sala 2"], &path).unwrap();
        let read: Vec<String> = read_json_file("vocabulary", &path).unwrap();
        assert_eq!(read, ["Sala 1", "Sala 2"]);
        fs::remove_dir_all(&dir).unwrap();
    }
}
