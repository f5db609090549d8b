//! Chronological insertion into an operation log
//!
//! Copies a log while inserting one new operation line before the first
//! operation that does not happen earlier, so hand-edited logs stay sorted.
//! Comment and blank lines pass through untouched; the timestamp of every
//! operation line is rewritten in its canonical form.

use crate::io::log_format::{parse_log_line, parse_timestamp, tokenize_line};
use crate::types::SettlementError;
use std::io::{BufRead, Write};

/// Split an operation line into opcode, timestamp field and the raw rest
///
/// The rest keeps its leading separator and original quoting.
fn split_head(text: &str) -> Option<(&str, &str, &str)> {
    let (opcode, rest) = text.trim_start().split_once(char::is_whitespace)?;
    let rest = rest.trim_start();
    let (ts_field, tail) = match rest.find(char::is_whitespace) {
        Some(index) => rest.split_at(index),
        None => (rest, ""),
    };

    (!ts_field.is_empty()).then_some((opcode, ts_field, tail))
}

/// Copy `input` to `output`, inserting `new_line` in timestamp order
///
/// The new line goes right before the first operation whose timestamp is
/// greater than or equal to its own, or at the end of the log.
///
/// # Arguments
///
/// * `input` - The existing log
/// * `new_line` - The operation to insert; must be a valid operation line
/// * `output` - Writer receiving the new log
///
/// # Errors
///
/// Returns an error if `new_line` is not a valid operation, if an operation
/// line of the log has no readable timestamp, or on I/O failure.
pub fn insert_operation<R: BufRead>(
    input: R,
    new_line: &str,
    output: &mut dyn Write,
) -> Result<(), SettlementError> {
    let inserted_ts = match parse_log_line(new_line, 0) {
        Some(record) => record?.timestamp,
        None => {
            return Err(SettlementError::ParseError {
                line: None,
                message: "nothing to insert".to_string(),
            })
        }
    };

    let mut pending = true;

    for (index, text) in input.lines().enumerate() {
        let text = text?;
        let line = index as u64 + 1;

        if tokenize_line(&text).map_err(|e| e.at_line(line))?.is_none() {
            writeln!(output, "{}", text)?;
            continue;
        }

        let (opcode, ts_field, tail) = split_head(&text).ok_or_else(|| {
            SettlementError::ParseError {
                line: None,
                message: "operation without timestamp".to_string(),
            }
            .at_line(line)
        })?;
        let ts = parse_timestamp(ts_field).map_err(|e| e.at_line(line))?;

        if pending && ts >= inserted_ts {
            tracing::debug!(line, "inserting operation");
            writeln!(output, "{}", new_line)?;
            pending = false;
        }

        writeln!(output, "{} {}{}", opcode, ts, tail)?;
    }

    if pending {
        tracing::debug!("appending operation at the end of the log");
        writeln!(output, "{}", new_line)?;
    }

    output.flush()?;
    Ok(())
}
