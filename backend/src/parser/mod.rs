//! Upload decoding: data-URL payloads and raw bytes into a tabular dataset.
//!
//! No register-specific logic here. The [`Dataset`] keeps every cell as
//! text, with columns exactly as they appear in the header row.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{Map, Value};
use std::path::Path;

use crate::error::{DecodeError, DecodeResult};

/// Delimited text decoded into rows of cells.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    /// Column headers, in file order
    pub headers: Vec<String>,
    /// Data rows, each exactly `headers.len()` cells wide
    pub rows: Vec<Vec<String>>,
    /// Detected text encoding
    pub encoding: String,
    /// Detected delimiter
    pub delimiter: char,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column in the header row.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell at `row` in column `name`, if both exist.
    pub fn cell(&self, row: usize, name: &str) -> Option<&str> {
        let col = self.column_index(name)?;
        self.rows.get(row)?.get(col).map(String::as_str)
    }

    /// Rows as JSON objects keyed by header, in column order.
    pub fn to_records(&self) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| {
                let obj: Map<String, Value> = self
                    .headers
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned().map(Value::String))
                    .collect();
                Value::Object(obj)
            })
            .collect()
    }
}

/// Split a `data:<mime>;base64,<body>` payload and decode its body.
///
/// The declared mime type is not checked; the body is sniffed like any upload.
pub fn split_payload(payload: &str) -> DecodeResult<Vec<u8>> {
    let (header, body) = payload
        .split_once(',')
        .ok_or(DecodeError::MalformedPayload)?;

    let is_base64_data_url = header
        .trim()
        .strip_prefix("data:")
        .map_or(false, |rest| rest.ends_with(";base64"));
    if !is_base64_data_url {
        return Err(DecodeError::UnsupportedHeader(header.to_string()));
    }

    let body: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    Ok(STANDARD.decode(body)?)
}

/// Decode a data-URL upload payload into a dataset.
pub fn decode_payload(payload: &str) -> DecodeResult<Dataset> {
    let bytes = split_payload(payload)?;
    parse_bytes(&bytes)
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let charset = chardet::detect(bytes).0;

    match charset.to_lowercase().as_str() {
        "" | "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes to a string, trying strict UTF-8 before the detected encoding.
///
/// Unknown labels, and bytes chardet mislabels as UTF-8, fall back to
/// Windows-1252.
pub fn decode_content(bytes: &[u8], encoding: &str) -> DecodeResult<String> {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return Ok(text.to_string());
    }

    let codec = match encoding {
        // WHATWG maps the Latin-1 labels onto Windows-1252
        "iso-8859-1" | "windows-1252" | "utf-8" => encoding_rs::WINDOWS_1252,
        other => encoding_rs::Encoding::for_label(other.as_bytes())
            .unwrap_or(encoding_rs::WINDOWS_1252),
    };

    let (text, _, had_errors) = codec.decode(bytes);
    if had_errors {
        return Err(DecodeError::Encoding(format!(
            "body is not valid {}",
            codec.name()
        )));
    }
    Ok(text.into_owned())
}

/// Detect the delimiter by counting occurrences in the first line
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

/// Parse raw upload bytes with auto-detection of encoding and delimiter.
///
/// Valid UTF-8 is taken as-is without running the detector.
pub fn parse_bytes(bytes: &[u8]) -> DecodeResult<Dataset> {
    let (content, encoding) = match std::str::from_utf8(bytes) {
        Ok(text) => (text.to_string(), "utf-8".to_string()),
        Err(_) => {
            let encoding = match detect_encoding(bytes).as_str() {
                // Not valid UTF-8 whatever the detector says
                "utf-8" => "windows-1252".to_string(),
                other => other.to_string(),
            };
            (decode_content(bytes, &encoding)?, encoding)
        }
    };
    let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
    let delimiter = detect_delimiter(content);

    parse_str(content, delimiter, encoding)
}

/// Parse delimited text with an explicit delimiter.
pub fn parse_str(content: &str, delimiter: char, encoding: String) -> DecodeResult<Dataset> {
    if content.trim().is_empty() {
        return Err(DecodeError::EmptyFile);
    }

    let delimiter_byte = u8::try_from(delimiter).map_err(|_| DecodeError::Parse {
        line: 1,
        message: format!("unsupported delimiter '{}'", delimiter),
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(delimiter_byte)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.iter().all(String::is_empty) {
        return Err(DecodeError::NoHeaders);
    }

    let width = headers.len();
    let mut rows = Vec::new();

    for result in reader.records() {
        let record = result.map_err(csv_error)?;

        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let mut row: Vec<String> = record.iter().take(width).map(str::to_string).collect();
        row.resize(width, String::new());
        rows.push(row);
    }

    Ok(Dataset {
        headers,
        rows,
        encoding,
        delimiter,
    })
}

/// Parse a CSV file from disk with auto-detection.
pub fn parse_csv_file<P: AsRef<Path>>(path: P) -> DecodeResult<Dataset> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes(&bytes)
}

fn csv_error(e: csv::Error) -> DecodeError {
    let line = e.position().map(|p| p.line() as usize).unwrap_or(0);
    DecodeError::Parse {
        line,
        message: e.to_string(),
    }
}
