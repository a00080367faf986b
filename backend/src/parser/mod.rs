//! Raw extract reader with encoding and delimiter auto-detection.
//!
//! Converts CSV rows into JSON objects keyed by header. Empty cells become
//! `null`, which is how the transform stage recognises missing values. No
//! Steam-specific logic here; typed coercion lives in [`crate::models`].

use serde_json::{Map, Value};
use std::io::Read;
use std::path::Path;

use crate::error::{CsvError, CsvResult};

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Parsed records as JSON objects
    pub records: Vec<Value>,
    /// Detected or used encoding
    pub encoding: String,
    /// Detected or used delimiter
    pub delimiter: char,
    /// Column headers
    pub headers: Vec<String>,
}

/// Detect the encoding of raw bytes.
///
/// Valid UTF-8 short-circuits; everything else goes through chardet.
pub fn detect_encoding(bytes: &[u8]) -> String {
    if std::str::from_utf8(bytes).is_ok() {
        return "utf-8".to_string();
    }

    let charset = chardet::detect(bytes).0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding
pub fn decode_content(bytes: &[u8], encoding: &str) -> CsvResult<String> {
    let decoded = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => String::from_utf8(bytes.to_vec())
            .map_err(|e| CsvError::EncodingError(e.to_string()))?,
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        other => match encoding_rs::Encoding::for_label(other.as_bytes()) {
            Some(enc) => enc.decode(bytes).0.into_owned(),
            // Unknown label: lossy UTF-8
            None => String::from_utf8_lossy(bytes).into_owned(),
        },
    };

    Ok(decoded.trim_start_matches('\u{feff}').to_string())
}

/// Detect the delimiter by counting occurrences in the header line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse CSV from a reader into JSON objects.
///
/// Quoted cells may contain the delimiter and embedded line breaks, which the
/// genre, language and tag columns routinely do.
pub fn parse_csv<R: Read>(reader: R, delimiter: char) -> CsvResult<(Vec<String>, Vec<Value>)> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()
        .map_err(|e| CsvError::ParseError {
            line: 1,
            message: e.to_string(),
        })?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.is_empty() || headers.iter().all(String::is_empty) {
        return Err(CsvError::NoHeaders);
    }

    let mut rows = Vec::new();

    for (row_idx, result) in csv_reader.records().enumerate() {
        let record = result.map_err(|e| CsvError::ParseError {
            line: e.position().map(|p| p.line() as usize).unwrap_or(row_idx + 2),
            message: e.to_string(),
        })?;

        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        let mut obj = Map::new();
        for (i, header) in headers.iter().enumerate() {
            let value = match record.get(i) {
                Some(raw) if !raw.is_empty() => Value::String(raw.to_string()),
                _ => Value::Null,
            };
            obj.insert(header.clone(), value);
        }

        rows.push(Value::Object(obj));
    }

    Ok((headers, rows))
}

/// Parse CSV file with auto-detection of encoding and delimiter.
///
/// # Example
/// ```ignore
/// let result = parse_csv_file_auto("datasets/raw/steam_app_data.csv")?;
/// println!("Encoding: {}, Delimiter: '{}'", result.encoding, result.delimiter);
/// println!("Records: {}", result.records.len());
/// ```
pub fn parse_csv_file_auto<P: AsRef<Path>>(path: P) -> CsvResult<ParseResult> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes_auto(&bytes)
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> CsvResult<ParseResult> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = detect_delimiter(&content);

    parse_string_with_metadata(&content, delimiter, encoding)
}

/// Parse CSV string with explicit delimiter and return metadata.
pub fn parse_string_with_metadata(
    content: &str,
    delimiter: char,
    encoding: String,
) -> CsvResult<ParseResult> {
    if content.trim().is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let (headers, records) = parse_csv(content.as_bytes(), delimiter)?;

    Ok(ParseResult {
        records,
        encoding,
        delimiter,
        headers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_csv() {
        let csv = "appid,name\n10,Counter-Strike\n20,Team Fortress Classic";
        let (headers, rows) = parse_csv(csv.as_bytes(), ',').unwrap();

        assert_eq!(headers, vec!["appid", "name"]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["appid"], "10");
        assert_eq!(rows[1]["name"], "Team Fortress Classic");
    }

    #[test]
    fn test_quoted_values_keep_commas() {
        let csv = "appid,genre,tags\n10,\"Action, Indie\",\"{'Action': 5, 'FPS': 2}\"";
        let (_, rows) = parse_csv(csv.as_bytes(), ',').unwrap();

        assert_eq!(rows[0]["genre"], "Action, Indie");
        assert_eq!(rows[0]["tags"], "{'Action': 5, 'FPS': 2}");
    }

    #[test]
    fn test_quoted_multiline_cell() {
        let csv = "appid,languages\n10,\"English\r\nInterface, French\"\n";
        let (_, rows) = parse_csv(csv.as_bytes(), ',').unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["languages"], "English\r\nInterface, French");
    }

    #[test]
    fn test_empty_cells_are_null() {
        let csv = "a,b,c\n1,,3";
        let (_, rows) = parse_csv(csv.as_bytes(), ',').unwrap();

        assert_eq!(rows[0]["a"], "1");
        assert!(rows[0]["b"].is_null());
        assert_eq!(rows[0]["c"], "3");
    }

    #[test]
    fn test_short_rows_pad_with_null() {
        let csv = "a,b,c\n1,2";
        let (_, rows) = parse_csv(csv.as_bytes(), ',').unwrap();

        assert!(rows[0]["c"].is_null());
    }

    #[test]
    fn test_empty_csv_error() {
        let result = parse_string_with_metadata("", ',', "utf-8".into());
        assert!(matches!(result, Err(CsvError::EmptyFile)));
    }

    #[test]
    fn test_detect_delimiter_comma() {
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
    }

    #[test]
    fn test_detect_delimiter_semicolon() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
    }

    #[test]
    fn test_detect_delimiter_tab() {
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
    }

    #[test]
    fn test_auto_parse() {
        let csv = "appid,name\n10,Counter-Strike\n";
        let result = parse_bytes_auto(csv.as_bytes()).unwrap();

        assert_eq!(result.encoding, "utf-8");
        assert_eq!(result.delimiter, ',');
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.headers, vec!["appid", "name"]);
    }

    #[test]
    fn test_bom_is_stripped() {
        let bytes = "\u{feff}appid,name\n10,X\n".as_bytes();
        let result = parse_bytes_auto(bytes).unwrap();

        assert_eq!(result.headers[0], "appid");
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1").unwrap();
        assert_eq!(decoded, "Société");
    }

    #[test]
    fn test_parse_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.csv");
        std::fs::write(&path, "appid,name\n1,A\n2,B\n").unwrap();

        let result = parse_csv_file_auto(&path).unwrap();
        assert_eq!(result.records.len(), 2);
    }
}
