//! Parser for call-edge log lines.
//!
//! Line format (five fields separated by single spaces):
//!
//! ```text
//! 2013-10-23T10:12:35.271Z 2013-10-23T10:12:35.471Z eckakaau service6 null->bm6il56t
//! <start>                  <end>                    <trace> <service> <caller>-><callee>
//! ```

use super::schema::Edge;
use crate::utils::config::{CALL_SEPARATOR, FIELD_COUNT};
use crate::utils::error::ParseError;

/// Parse one raw line into an edge
///
/// **Public** - main entry point for parsing
///
/// Only the shape of the line is checked. Timestamps are reformatted but
/// never validated as dates, so a malformed date with the right shape
/// passes through.
///
/// # Errors
/// * `ParseError::FieldCount` - not exactly five fields
/// * `ParseError::EmptyField` - a field between two spaces is empty
/// * `ParseError::MissingArrow` - last field has no `->`
/// * `ParseError::InvalidCallPair` - last field is not two non-empty spans
pub fn parse_line(line: &str) -> Result<Edge, ParseError> {
    let fields: Vec<&str> = line.split(' ').collect();
    if fields.len() != FIELD_COUNT {
        return Err(ParseError::FieldCount {
            line: line.to_string(),
            expected: FIELD_COUNT,
            found: fields.len(),
        });
    }

    if let Some(index) = fields.iter().position(|field| field.is_empty()) {
        return Err(ParseError::EmptyField {
            line: line.to_string(),
            index,
        });
    }

    let call = fields[4];
    if !call.contains(CALL_SEPARATOR) {
        return Err(ParseError::MissingArrow {
            line: line.to_string(),
        });
    }

    let (caller, callee) = split_call(call).ok_or_else(|| ParseError::InvalidCallPair {
        line: line.to_string(),
    })?;

    Ok(Edge {
        start: format_timestamp(fields[0]),
        end: format_timestamp(fields[1]),
        trace_id: fields[2].to_string(),
        service: fields[3].to_string(),
        caller: caller.to_string(),
        callee: callee.to_string(),
    })
}

/// Split `caller->callee` into exactly two non-empty halves
///
/// **Private** - internal helper for parse_line
fn split_call(call: &str) -> Option<(&str, &str)> {
    let mut parts = call.split(CALL_SEPARATOR);
    let caller = parts.next()?;
    let callee = parts.next()?;

    if parts.next().is_some() || caller.is_empty() || callee.is_empty() {
        return None;
    }

    Some((caller, callee))
}

/// Drop the trailing zone marker and turn the first `T` into a space
///
/// **Public** - exposed for tests and tooling
///
/// `2013-10-23T10:12:35.271Z` becomes `2013-10-23 10:12:35.271`.
pub fn format_timestamp(raw: &str) -> String {
    let mut chars = raw.chars();
    chars.next_back();
    chars.as_str().replacen('T', " ", 1)
}
