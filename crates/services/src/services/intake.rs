use std::collections::HashSet;

use thiserror::Error;

/// Header names accepted for the phone column, matched case-insensitively as
/// substrings in either direction.
const PHONE_HEADERS: &[&str] = &["phone", "mobile", "number", "contact", "cell", "telephone"];
const NAME_HEADERS: &[&str] = &["name", "customer", "client", "person", "full_name", "firstname"];

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),
    #[error("No usable phone column among headers: {0}")]
    NoUsableColumn(String),
    #[error("Could not read file: {0}")]
    ReadFailed(#[from] csv::Error),
    #[error("No valid contacts after validation")]
    EmptyAfterValidation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub phone: String,
    pub name: Option<String>,
}

fn header_matches(header: &str, candidate: &str) -> bool {
    let header = header.trim().to_lowercase();
    if header.is_empty() {
        return false;
    }
    header.contains(candidate) || candidate.contains(header.as_str())
}

fn find_column(headers: &[String], candidates: &[&str]) -> Option<usize> {
    headers.iter().position(|header| {
        candidates
            .iter()
            .any(|candidate| header_matches(header, candidate))
    })
}

/// Parses an uploaded contact sheet into a deduplicated contact list.
///
/// Only `.csv` files are accepted. Rows with a blank phone cell are dropped,
/// then duplicates by phone collapse to the first occurrence with order
/// preserved.
pub fn parse_sheet(filename: &str, bytes: &[u8]) -> Result<Vec<Contact>, IntakeError> {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    if extension != "csv" {
        return Err(IntakeError::UnsupportedFileType(extension));
    }

    let mut reader = csv::Reader::from_reader(bytes);
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let phone_col = find_column(&headers, PHONE_HEADERS)
        .ok_or_else(|| IntakeError::NoUsableColumn(headers.join(", ")))?;
    let name_col = find_column(&headers, NAME_HEADERS);

    let mut seen = HashSet::new();
    let mut contacts = Vec::new();
    for row in reader.records() {
        let row = row?;
        let phone = row.get(phone_col).unwrap_or_default().trim().to_string();
        if phone.is_empty() {
            continue;
        }
        if !seen.insert(phone.clone()) {
            continue;
        }
        let name = name_col
            .and_then(|col| row.get(col))
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);
        contacts.push(Contact { phone, name });
    }

    if contacts.is_empty() {
        return Err(IntakeError::EmptyAfterValidation);
    }
    Ok(contacts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_phone_and_name_columns_case_insensitively() {
        let csv = "Customer Name,Mobile No\nAna,5550001\nBob,5550002\n";
        let contacts = parse_sheet("leads.csv", csv.as_bytes()).unwrap();
        assert_eq!(contacts.len(), 2);
        assert_eq!(contacts[0].phone, "5550001");
        assert_eq!(contacts[0].name.as_deref(), Some("Ana"));
    }

    #[test]
    fn dedup_keeps_first_occurrence_in_order() {
        let csv = "phone,name\n111,First\n222,Second\n111,Again\n333,Third\n";
        let contacts = parse_sheet("leads.csv", csv.as_bytes()).unwrap();
        let phones: Vec<&str> = contacts.iter().map(|c| c.phone.as_str()).collect();
        assert_eq!(phones, vec!["111", "222", "333"]);
        assert_eq!(contacts[0].name.as_deref(), Some("First"));
    }

    #[test]
    fn blank_phones_are_dropped_before_dedup() {
        let csv = "phone,name\n  ,Ghost\n111,Ana\n";
        let contacts = parse_sheet("leads.csv", csv.as_bytes()).unwrap();
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].phone, "111");
    }

    #[test]
    fn rejects_non_csv_extensions() {
        let err = parse_sheet("leads.xlsx", b"whatever").unwrap_err();
        assert!(matches!(err, IntakeError::UnsupportedFileType(ext) if ext == "xlsx"));
        let err = parse_sheet("noextension", b"whatever").unwrap_err();
        assert!(matches!(err, IntakeError::UnsupportedFileType(_)));
    }

    #[test]
    fn missing_phone_column_lists_headers() {
        let csv = "email,address\na@b.c,Street 1\n";
        let err = parse_sheet("leads.csv", csv.as_bytes()).unwrap_err();
        match err {
            IntakeError::NoUsableColumn(headers) => {
                assert!(headers.contains("email"));
                assert!(headers.contains("address"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn all_blank_rows_report_empty() {
        let csv = "phone,name\n,\n ,\n";
        let err = parse_sheet("leads.csv", csv.as_bytes()).unwrap_err();
        assert!(matches!(err, IntakeError::EmptyAfterValidation));
    }
}
