//! Core types for the network log analyzer
//! this crate holds the log preprocessing shared by the web UI and the CLI.
pub mod excerpt;

pub use excerpt::{
    excerpt_from_bytes, extract_excerpt, is_relevant_line, DecodeError, LogExcerpt,
    EXCERPT_CHAR_BUDGET,
};
