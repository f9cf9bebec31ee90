//! Flat-file input and output
//!
//! - [`seed`] - seed channel-list reader
//! - [`output`] - staged result file and result log

pub mod output;
pub mod seed;

pub use output::{format_log_line, promote, OutputPaths, ResultLog, ResultWriter};
pub use seed::{parse_seed, read_seed};
