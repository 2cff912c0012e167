//! Source records and the CSV reader that yields them

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::SourceError;

/// One source row: field name → cell value, in header order.
///
/// Serializes as a JSON object with keys in column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    /// Build from name/value pairs. A repeated name keeps the last value.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut record = Self::default();
        for (k, v) in pairs {
            record.insert(k.into(), v.into());
        }
        record
    }

    fn insert(&mut self, name: String, value: String) {
        match self.fields.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Read all rows of a CSV file with a header row.
///
/// Short rows omit their missing trailing fields; cells beyond the header
/// are dropped. A missing file is reported as [`SourceError::NotFound`].
pub fn load_records(path: &Path) -> Result<Vec<Record>, SourceError> {
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => SourceError::NotFound(path.to_path_buf()),
        _ => SourceError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    })?;
    read_records(file).map_err(|source| SourceError::Csv {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse CSV rows from any reader (header row first).
pub fn read_records<R: Read>(reader: R) -> Result<Vec<Record>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);
    let headers = reader.headers()?.clone();

    let mut records = Vec::new();
    for (line, row) in reader.records().enumerate() {
        let row = row?;
        if row.len() > headers.len() {
            log::debug!(
                "row {}: {} extra cells ignored",
                line + 1,
                row.len() - headers.len()
            );
        }
        records.push(Record::from_pairs(headers.iter().zip(row.iter())));
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_rows_in_order() {
        let csv = "mobile,email,name\n555-0100,a@x.io,Ann\n555-0101,b@x.io,Bob\n";
        let records = read_records(csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("name"), Some("Ann"));
        assert_eq!(records[1].get("mobile"), Some("555-0101"));
    }

    #[test]
    fn serializes_in_column_order() {
        let record = Record::from_pairs([("z", "1"), ("a", "2")]);
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"z":"1","a":"2"}"#);
    }

    #[test]
    fn duplicate_name_keeps_last() {
        let record = Record::from_pairs([("id", "1"), ("id", "2")]);
        assert_eq!(record.len(), 1);
        assert_eq!(record.get("id"), Some("2"));
    }

    #[test]
    fn ragged_rows() {
        let csv = "a,b,c\n1,2\n1,2,3,4\n";
        let records = read_records(csv.as_bytes()).unwrap();
        assert_eq!(records[0].len(), 2);
        assert_eq!(records[0].get("c"), None);
        assert_eq!(records[1].len(), 3);
        assert_eq!(records[1].get("c"), Some("3"));
    }

    #[test]
    fn quoted_cells() {
        let csv = "name,note\n\"Doe, Jane\",\"said \"\"hi\"\"\"\n";
        let records = read_records(csv.as_bytes()).unwrap();
        assert_eq!(records[0].get("name"), Some("Doe, Jane"));
        assert_eq!(records[0].get("note"), Some("said \"hi\""));
    }

    #[test]
    fn header_only_yields_nothing() {
        assert!(read_records("a,b\n".as_bytes()).unwrap().is_empty());
        assert!(read_records("".as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_records(&dir.path().join("absent.csv")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "id,amount").unwrap();
        writeln!(file, "t1,10.50").unwrap();
        let records = load_records(file.path()).unwrap();
        assert_eq!(records, vec![Record::from_pairs([("id", "t1"), ("amount", "10.50")])]);
    }

    #[test]
    fn invalid_utf8_is_csv_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"a,b\n\xff\xfe,1\n").unwrap();
        let err = load_records(file.path()).unwrap_err();
        assert!(matches!(err, SourceError::Csv { .. }));
    }
}
