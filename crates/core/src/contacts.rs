//! Contact files: CSV with a fixed `group,phone` header.
//!
//! Writing goes through the `csv` crate, so group names containing commas or
//! quotes are quoted rather than corrupting the row. Reading is lenient: blank
//! lines and the header are skipped, extra columns ignored, and any row
//! missing a group or phone is dropped without comment.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::model::ContactRecord;

pub const HEADER: [&str; 2] = ["group", "phone"];

#[derive(Debug, thiserror::Error)]
pub enum ContactFileError {
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),
    #[error("CSV flush error: {0}")]
    Flush(#[source] std::io::Error),
}

/// Write records with header. The header is written even with zero rows.
pub fn write_contacts<W: Write>(writer: W, records: &[ContactRecord]) -> Result<(), ContactFileError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    // serialize() emits the header from the first row; an empty file still needs one
    if records.is_empty() {
        csv_writer.write_record(HEADER)?;
    }

    for record in records {
        csv_writer.serialize(record)?;
    }

    csv_writer.flush().map_err(ContactFileError::Flush)
}

pub fn write_contacts_file(path: &Path, records: &[ContactRecord]) -> Result<(), ContactFileError> {
    let file = std::fs::File::create(path).map_err(|source| ContactFileError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    write_contacts(std::io::BufWriter::new(file), records)
}

/// Parse contact file content. Never fails; unusable rows are dropped.
///
/// Each line is parsed on its own, so an unbalanced quote costs only the
/// line it appears on.
pub fn parse_contacts(data: &str) -> Vec<ContactRecord> {
    data.lines()
        .filter(|line| !line.trim().is_empty())
        .skip(1) // header
        .filter_map(parse_line)
        .collect()
}

fn parse_line(line: &str) -> Option<ContactRecord> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(line.as_bytes());

    let record = reader.records().next()?.ok()?;
    let group = record.get(0).filter(|g| !g.is_empty())?;
    let phone = record.get(1).filter(|p| !p.is_empty())?;
    Some(ContactRecord::new(group, phone))
}

/// Read a contact file. A missing file is `Ok(None)`; the caller decides
/// whether that matters.
pub fn read_contacts_file(path: &Path) -> Result<Option<Vec<ContactRecord>>, ContactFileError> {
    match std::fs::read_to_string(path) {
        Ok(data) => Ok(Some(parse_contacts(&data))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(ContactFileError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn written(records: &[ContactRecord]) -> String {
        let mut buf = Vec::new();
        write_contacts(&mut buf, records).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn empty_file_has_header() {
        assert_eq!(written(&[]), "group,phone\n");
    }

    #[test]
    fn writes_header_and_rows() {
        let out = written(&[
            ContactRecord::new("Choir", "255712345678"),
            ContactRecord::new("Choir", "255798765432"),
        ]);
        assert_eq!(out, "group,phone\nChoir,255712345678\nChoir,255798765432\n");
    }

    #[test]
    fn group_with_comma_is_quoted_and_reads_back() {
        let records = vec![ContactRecord::new("Youth, Dar es Salaam", "255712345678")];
        let out = written(&records);
        assert_eq!(out, "group,phone\n\"Youth, Dar es Salaam\",255712345678\n");
        assert_eq!(parse_contacts(&out), records);
    }

    #[test]
    fn parse_skips_blank_lines_and_header() {
        let data = "\ngroup,phone\n\nG1,111\n   \nG1,222\n";
        assert_eq!(
            parse_contacts(data),
            vec![ContactRecord::new("G1", "111"), ContactRecord::new("G1", "222")]
        );
    }

    #[test]
    fn parse_drops_malformed_rows() {
        let data = "group,phone\nG1\n,222\nG2,\nG3,333,extra\n";
        assert_eq!(parse_contacts(data), vec![ContactRecord::new("G3", "333")]);
    }

    #[test]
    fn unbalanced_quote_only_loses_its_own_line() {
        let data = "group,phone\nChoir,2557000001\n\"Broken,2557000002\nChoir,2557000003\nChoir,2557000004\nYouth,2557000005\n";
        assert_eq!(
            parse_contacts(data),
            vec![
                ContactRecord::new("Choir", "2557000001"),
                ContactRecord::new("Choir", "2557000003"),
                ContactRecord::new("Choir", "2557000004"),
                ContactRecord::new("Youth", "2557000005"),
            ]
        );
    }

    #[test]
    fn parse_trims_fields() {
        let data = "group,phone\r\n G1 , 111 \r\n";
        assert_eq!(parse_contacts(data), vec![ContactRecord::new("G1", "111")]);
    }

    #[test]
    fn parse_header_only() {
        assert!(parse_contacts("group,phone\n").is_empty());
        assert!(parse_contacts("").is_empty());
    }

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.csv");
        assert!(read_contacts_file(&missing).unwrap().is_none());
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contacts.csv");
        let records = vec![
            ContactRecord::new("A", "2557000001"),
            ContactRecord::new("B \"quoted\"", "2557000002"),
        ];
        write_contacts_file(&path, &records).unwrap();
        assert_eq!(read_contacts_file(&path).unwrap().unwrap(), records);
    }
}
