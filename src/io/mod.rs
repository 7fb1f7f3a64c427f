//! I/O operations for urlcat.
//!
//! This module handles loading rendered artifacts from disk and writing the
//! merged document back out.

pub mod reader;
pub mod writer;

pub use reader::{LoadedPdf, PdfReader};
pub use writer::{PdfWriter, WriteOptions, WriteStatistics};
