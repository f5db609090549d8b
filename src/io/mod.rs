//! I/O module
//!
//! Handles operation log parsing and report output.
//!
//! # Components
//!
//! - `log_format` - Log format handling (tokenizing, record conversion, report serialization)
//! - `sync_reader` - Synchronous log reader with iterator interface
//! - `async_reader` - Asynchronous log reader with batch reading interface
//! - `insert` - Chronological insertion of a new operation into a log

pub mod async_reader;
pub mod insert;
pub mod log_format;
pub mod sync_reader;

pub use async_reader::AsyncReader;
pub use insert::insert_operation;
pub use log_format::{
    convert_log_record, parse_log_line, write_ledger_csv, write_ledger_text, write_presence,
};
pub use sync_reader::SyncReader;
