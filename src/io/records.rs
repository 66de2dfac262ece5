//! Line-level parsing shared by the `.m` and `.t` readers, plus the error
//! type of the `io` module.

use crate::core::surface_mesh::MeshConstructionError;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while reading or writing mesh files.
#[derive(Debug, Error)]
pub enum MeshIoError {
    /// The underlying reader or writer failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// A record is malformed.
    #[error("Line {line}: {message}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// What went wrong.
        message: String,
    },
    /// The path does not end in an extension this reader understands.
    #[error("Unsupported mesh file '{path}' (expected a .{expected} file)")]
    UnsupportedExtension {
        /// The offending path.
        path: String,
        /// The extension the caller asked for.
        expected: &'static str,
    },
    /// The records describe an invalid mesh.
    #[error("Invalid mesh: {0}")]
    Construction(#[from] MeshConstructionError),
}

/// One non-blank, non-comment line of a mesh file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Record<'a> {
    pub line: usize,
    pub keyword: &'a str,
    pub fields: Vec<&'a str>,
    /// Text between the first `{` and the last `}`, if any.
    pub payload: Option<&'a str>,
}

impl Record<'_> {
    /// Parses field `index` as `T`.
    pub fn field<T: FromStr>(&self, index: usize, what: &str) -> Result<T, MeshIoError> {
        let text = self.fields.get(index).ok_or_else(|| MeshIoError::Parse {
            line: self.line,
            message: format!("{} record is missing its {what}", self.keyword),
        })?;
        text.parse().map_err(|_| MeshIoError::Parse {
            line: self.line,
            message: format!("invalid {what} '{text}'"),
        })
    }

    /// Parses every field from `start` on as `T`.
    pub fn fields_from<T: FromStr>(&self, start: usize, what: &str) -> Result<Vec<T>, MeshIoError> {
        (start..self.fields.len())
            .map(|i| self.field(i, what))
            .collect()
    }

    /// The payload as an owned string (empty when absent).
    pub fn payload_string(&self) -> String {
        self.payload.unwrap_or_default().to_string()
    }
}

/// Splits a line into a [`Record`]. Blank lines and `#` comments yield
/// `None`.
pub(crate) fn parse_record(line: &str, number: usize) -> Result<Option<Record<'_>>, MeshIoError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    let (head, payload) = match trimmed.find('{') {
        Some(open) => {
            let close = trimmed.rfind('}').filter(|&c| c > open).ok_or_else(|| {
                MeshIoError::Parse {
                    line: number,
                    message: "unterminated attribute payload".to_string(),
                }
            })?;
            (&trimmed[..open], Some(&trimmed[open + 1..close]))
        }
        None => (trimmed, None),
    };
    let mut tokens = head.split_whitespace();
    let Some(keyword) = tokens.next() else {
        return Ok(None);
    };
    Ok(Some(Record {
        line: number,
        keyword,
        fields: tokens.collect(),
        payload,
    }))
}

/// Formats ` {payload}`, or nothing for an empty payload.
pub(crate) fn payload_suffix(payload: &str) -> String {
    if payload.is_empty() {
        String::new()
    } else {
        format!(" {{{payload}}}")
    }
}

/// Fails unless `path` ends in `.expected`.
pub(crate) fn check_extension(path: &Path, expected: &'static str) -> Result<(), MeshIoError> {
    if path.extension().and_then(|e| e.to_str()) == Some(expected) {
        Ok(())
    } else {
        Err(MeshIoError::UnsupportedExtension {
            path: path.display().to_string(),
            expected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_split_fields_and_payload() {
        let record = parse_record("  Vertex 3 0 1.5 -2 {uv=(0 1) normal=(0 0 1)}", 7)
            .unwrap()
            .unwrap();
        assert_eq!(record.line, 7);
        assert_eq!(record.keyword, "Vertex");
        assert_eq!(record.fields, ["3", "0", "1.5", "-2"]);
        assert_eq!(record.payload, Some("uv=(0 1) normal=(0 0 1)"));
        assert_eq!(record.field::<usize>(0, "id").unwrap(), 3);
        assert_eq!(record.fields_from::<f64>(1, "coordinate").unwrap(), [0.0, 1.5, -2.0]);
    }

    #[test]
    fn blank_and_comment_lines_are_skipped() {
        assert!(parse_record("", 1).unwrap().is_none());
        assert!(parse_record("   # Vertex 1 0 0 0", 1).unwrap().is_none());
    }

    #[test]
    fn malformed_records_report_their_line() {
        assert!(matches!(
            parse_record("Vertex 1 0 0 0 {open", 4),
            Err(MeshIoError::Parse { line: 4, .. })
        ));
        let record = parse_record("Face x 1 2 3", 9).unwrap().unwrap();
        assert!(matches!(
            record.field::<usize>(0, "id"),
            Err(MeshIoError::Parse { line: 9, .. })
        ));
        assert!(matches!(
            record.field::<usize>(10, "id"),
            Err(MeshIoError::Parse { line: 9, .. })
        ));
    }

    #[test]
    fn extensions_are_checked() {
        assert!(check_extension(Path::new("bunny.m"), "m").is_ok());
        assert!(matches!(
            check_extension(Path::new("bunny.obj"), "m"),
            Err(MeshIoError::UnsupportedExtension { expected: "m", .. })
        ));
        assert_eq!(payload_suffix(""), "");
        assert_eq!(payload_suffix("sharp"), " {sharp}");
    }
}
