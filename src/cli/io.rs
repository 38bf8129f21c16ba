//! JSON I/O handling for CLI
//!
//! - Input: at most one JSON value via stdin, on a single line
//! - Output: one JSON object via stdout
//! - UTF-8 only
//!
//! A body that cannot be read or decoded is a request failure (400), so it is
//! reported through the error envelope like any other.

use std::io::{self, BufRead, Write};

use serde_json::{json, Value};

use super::errors::CliResult;
use crate::apps::{AppError, AppResult, ErrorEnvelope};
use crate::schema::SchemaError;

/// Read a JSON body if one was given; empty input yields `None`
pub fn read_optional_request() -> AppResult<Option<Value>> {
    read_request_from(&mut io::stdin().lock())
}

fn read_request_from<R: BufRead>(reader: &mut R) -> AppResult<Option<Value>> {
    let mut line = String::new();
    reader.read_line(&mut line).map_err(|e| unreadable(e.to_string()))?;

    if line.trim().is_empty() {
        return Ok(None);
    }

    serde_json::from_str(&line)
        .map(Some)
        .map_err(|e| unreadable(e.to_string()))
}

/// Read a JSON body that must be present
pub(crate) fn read_required_from<R: BufRead>(reader: &mut R) -> AppResult<Value> {
    read_request_from(reader)?.ok_or_else(|| unreadable("empty input"))
}

fn unreadable(reason: impl Into<String>) -> AppError {
    AppError::Validation(SchemaError::unreadable_item(reason))
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    write_to(&mut io::stdout(), &success_body(data))
}

/// Write an error response to stdout
pub fn write_error(envelope: &ErrorEnvelope) -> CliResult<()> {
    write_to(&mut io::stdout(), &error_body(envelope))
}

fn success_body(data: Value) -> Value {
    json!({
        "status": "ok",
        "data": data
    })
}

fn error_body(envelope: &ErrorEnvelope) -> Value {
    json!({
        "status": "error",
        "code": envelope.status,
        "message": envelope.message
    })
}

fn write_to<W: Write>(writer: &mut W, response: &Value) -> CliResult<()> {
    serde_json::to_writer(&mut *writer, response)?;
    writeln!(writer)?;
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_single_line() {
        let mut input = Cursor::new(b"{\"value\": 5}\n{\"ignored\": true}\n".to_vec());
        assert_eq!(read_request_from(&mut input).unwrap(), Some(json!({"value": 5})));
    }

    #[test]
    fn test_empty_input_is_none() {
        let mut input = Cursor::new(b"  \n".to_vec());
        assert_eq!(read_request_from(&mut input).unwrap(), None);
    }

    #[test]
    fn test_malformed_input_is_validation_error() {
        let mut input = Cursor::new(b"{oops\n".to_vec());
        let err = read_request_from(&mut input).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(err.status_code(), 400);
        assert!(err.to_string().contains("failed to read data"));
    }

    #[test]
    fn test_required_body_rejects_empty_input() {
        let err = read_required_from(&mut Cursor::new(b"\n".to_vec())).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_response_shapes() {
        let mut out = Vec::new();
        write_to(&mut out, &success_body(json!(["a"]))).unwrap();
        let parsed: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed, json!({"status": "ok", "data": ["a"]}));

        let envelope = ErrorEnvelope {
            status: 404,
            message: "Not found: model 'x' is not declared".into(),
        };
        let mut out = Vec::new();
        write_to(&mut out, &error_body(&envelope)).unwrap();
        let parsed: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed["status"], "error");
        assert_eq!(parsed["code"], 404);
        assert!(out.ends_with(b"\n"));
    }
}
