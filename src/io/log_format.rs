//! Operation log format handling
//!
//! This module centralizes all log format concerns, providing:
//! - The tokenizer configuration shared by the sync and async readers
//! - Conversion from tokenized lines to `OperationRecord`s
//! - Amount and timestamp parsing
//! - Ledger and presence report serialization
//!
//! # Log Format
//!
//! One operation per line: `<OPCODE> <timestamp> <args...>`, fields separated
//! by one or more spaces. Fields may be double-quoted to embed spaces. Lines
//! starting with `#` and blank lines are ignored.
//!
//! ```text
//! # flat 3B
//! START 2024-01-01 alice
//! START 2024-01-01 "mary ann"
//! PAUSE 2024-01-10T18:30:00 alice
//! TRANSFER 2024-01-12 alice "mary ann" 10.50
//! PAY 2024-02-01 alice 300.00 2024-01-01 2024-01-31
//! BUY 2024-02-03 alice 12.40 cleaning supplies
//! ```
//!
//! All functions are pure (no file I/O) for easy testing.

use crate::types::{Cents, Debt, OpCode, OperationRecord, PresenceEntry, SettlementError, Timestamp};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::io::Write;
use std::str::FromStr;

/// Field separator of the operation log
pub const FIELD_DELIMITER: u8 = b' ';

/// Lines starting with this byte are comments
pub const COMMENT_MARKER: u8 = b'#';

/// Reader configuration for the operation log
///
/// Space delimited, no header row, variable field count, `#` comments.
pub fn log_reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder
        .delimiter(FIELD_DELIMITER)
        .has_headers(false)
        .flexible(true)
        .comment(Some(COMMENT_MARKER));
    builder
}

/// Non-empty fields of a tokenized line
///
/// Consecutive delimiters produce empty fields, which are dropped. Returns
/// `None` when nothing is left or the line is an indented comment.
pub fn significant_fields<'a, I>(fields: I) -> Option<Vec<&'a str>>
where
    I: IntoIterator<Item = &'a str>,
{
    let fields: Vec<&str> = fields.into_iter().filter(|field| !field.is_empty()).collect();

    match fields.first() {
        None => None,
        Some(first) if first.starts_with(COMMENT_MARKER as char) => None,
        Some(_) => Some(fields),
    }
}

/// Tokenize a single log line
///
/// # Returns
///
/// * `Ok(Some(fields))` - For an operation line
/// * `Ok(None)` - For a blank or comment line
/// * `Err(SettlementError)` - If the line cannot be tokenized
pub fn tokenize_line(line: &str) -> Result<Option<Vec<String>>, SettlementError> {
    let line = line.trim_end_matches('\r');
    let mut reader = log_reader_builder().from_reader(line.as_bytes());
    let mut record = csv::StringRecord::new();

    if !reader.read_record(&mut record).map_err(tokenizer_error)? {
        return Ok(None);
    }

    Ok(significant_fields(record.iter())
        .map(|fields| fields.into_iter().map(str::to_string).collect()))
}

/// Map a tokenizer failure to a parse error
///
/// The tokenizer only ever sees one line, so its own position is dropped;
/// callers tag the error with the physical log line.
fn tokenizer_error(error: csv::Error) -> SettlementError {
    SettlementError::ParseError {
        line: None,
        message: error.to_string(),
    }
}

/// Tokenize and convert one physical line of the log
///
/// # Returns
///
/// * `None` - For a blank or comment line
/// * `Some(result)` - The converted operation, or the error tagged with `line`
pub fn parse_log_line(text: &str, line: u64) -> Option<Result<OperationRecord, SettlementError>> {
    match tokenize_line(text) {
        Ok(None) => None,
        Ok(Some(fields)) => {
            let fields: Vec<&str> = fields.iter().map(String::as_str).collect();
            Some(convert_log_record(&fields, line))
        }
        Err(e) => Some(Err(e.at_line(line))),
    }
}

/// Convert the fields of one log line to an OperationRecord
///
/// This function:
/// - Matches the opcode case-insensitively
/// - Parses the timestamp of the operation
/// - Checks the argument count of the operation
/// - Parses amounts to cents and window bounds to timestamps
///
/// # Arguments
///
/// * `fields` - Non-empty fields of the line, opcode first
/// * `line` - 1-based line number, carried by the record
///
/// # Returns
///
/// * `Ok(OperationRecord)` - Successfully converted record
/// * `Err(SettlementError)` - Malformed line, tagged with `line`
pub fn convert_log_record(fields: &[&str], line: u64) -> Result<OperationRecord, SettlementError> {
    convert_fields(fields, line).map_err(|error| error.at_line(line))
}

fn convert_fields(fields: &[&str], line: u64) -> Result<OperationRecord, SettlementError> {
    let (opcode, rest) = fields.split_first().ok_or_else(|| SettlementError::ParseError {
        line: None,
        message: "empty operation".to_string(),
    })?;

    let mnemonic = opcode.to_ascii_uppercase();
    if !matches!(
        mnemonic.as_str(),
        "START" | "STOP" | "PAUSE" | "RESUME" | "TRANSFER" | "PAY" | "BUY"
    ) {
        return Err(SettlementError::invalid_opcode(opcode));
    }

    let (ts_field, args) = rest.split_first().ok_or_else(|| SettlementError::ParseError {
        line: None,
        message: format!("{} is missing its timestamp", mnemonic),
    })?;
    let timestamp = parse_timestamp(ts_field)?;

    let op = match mnemonic.as_str() {
        "START" => {
            let [name] = exact_args(&mnemonic, args)?;
            OpCode::Start {
                name: name.to_string(),
            }
        }
        "STOP" => {
            let [name] = exact_args(&mnemonic, args)?;
            OpCode::Stop {
                name: name.to_string(),
            }
        }
        "PAUSE" => {
            let [who] = exact_args(&mnemonic, args)?;
            OpCode::Pause {
                who: who.to_string(),
            }
        }
        "RESUME" => {
            let [who] = exact_args(&mnemonic, args)?;
            OpCode::Resume {
                who: who.to_string(),
            }
        }
        "TRANSFER" => {
            let [from, to, amount] = exact_args(&mnemonic, args)?;
            OpCode::Transfer {
                from: from.to_string(),
                to: to.to_string(),
                amount: parse_amount(amount)?,
            }
        }
        "PAY" => {
            let [payer, amount, window_start, window_end] = exact_args(&mnemonic, args)?;
            OpCode::Pay {
                payer: payer.to_string(),
                amount: parse_amount(amount)?,
                window_start: parse_timestamp(window_start)?,
                window_end: parse_timestamp(window_end)?,
            }
        }
        _ => {
            let (buyer, amount, description) = match args {
                [buyer, amount, description @ ..] => (buyer, amount, description),
                _ => return Err(SettlementError::wrong_arity(&mnemonic, "at least 2", args.len())),
            };
            OpCode::Buy {
                buyer: buyer.to_string(),
                amount: parse_amount(amount)?,
                description: (!description.is_empty()).then(|| description.join(" ")),
            }
        }
    };

    Ok(OperationRecord::new(line, timestamp, op))
}

fn exact_args<'a, const N: usize>(
    mnemonic: &str,
    args: &[&'a str],
) -> Result<[&'a str; N], SettlementError> {
    <[&'a str; N]>::try_from(args)
        .map_err(|_| SettlementError::wrong_arity(mnemonic, &N.to_string(), args.len()))
}

/// Parse a decimal amount to integer cents
///
/// The value is multiplied by 100 and rounded half away from zero.
///
/// # Examples
///
/// ```
/// use rust_settlement_engine::io::log_format::parse_amount;
///
/// assert_eq!(parse_amount("10.50").unwrap(), 1050);
/// assert_eq!(parse_amount("0.005").unwrap(), 1);
/// ```
pub fn parse_amount(field: &str) -> Result<Cents, SettlementError> {
    Decimal::from_str(field.trim())
        .ok()
        .and_then(|value| value.checked_mul(Decimal::ONE_HUNDRED))
        .map(|cents| cents.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|cents| cents.to_i64())
        .ok_or_else(|| SettlementError::invalid_amount(field))
}

/// Parse a log timestamp
///
/// Accepts unix seconds, `YYYY-MM-DD` or `YYYY-MM-DDTHH:MM:SS`, read as UTC.
pub fn parse_timestamp(field: &str) -> Result<Timestamp, SettlementError> {
    Timestamp::parse(field).ok_or_else(|| SettlementError::invalid_timestamp(field))
}

/// Cents as a two-decimal amount
pub fn cents_to_decimal(cents: Cents) -> Decimal {
    Decimal::new(cents, 2)
}

/// Row of the CSV ledger report
#[derive(Debug, Serialize)]
struct LedgerRow<'a> {
    debtor: &'a str,
    creditor: &'a str,
    amount: String,
}

/// Write debts as text lines
///
/// One line `<debtor> owes <creditor> <amount>€` per debt, in the given order.
///
/// # Arguments
///
/// * `debts` - Debts to write, already in canonical edge order
/// * `output` - Writer receiving the report
pub fn write_ledger_text(debts: &[Debt], output: &mut dyn Write) -> Result<(), SettlementError> {
    for debt in debts {
        writeln!(
            output,
            "{} owes {} {:.2}€",
            debt.debtor,
            debt.creditor,
            cents_to_decimal(debt.amount)
        )?;
    }

    output.flush()?;
    Ok(())
}

/// Write debts as CSV with columns: debtor, creditor, amount
///
/// The header is written even when there are no debts.
pub fn write_ledger_csv(debts: &[Debt], output: &mut dyn Write) -> Result<(), SettlementError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(output);

    writer.write_record(["debtor", "creditor", "amount"])?;

    for debt in debts {
        writer.serialize(LedgerRow {
            debtor: &debt.debtor,
            creditor: &debt.creditor,
            amount: format!("{:.2}", cents_to_decimal(debt.amount)),
        })?;
    }

    writer.flush()?;
    Ok(())
}

/// Write the presence report: `P <name>` or `A <name>` per entry
pub fn write_presence(entries: &[PresenceEntry], output: &mut dyn Write) -> Result<(), SettlementError> {
    for entry in entries {
        writeln!(output, "{} {}", entry.status, entry.name)?;
    }

    output.flush()?;
    Ok(())
}
