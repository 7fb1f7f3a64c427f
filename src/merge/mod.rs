//! PDF merging operations.
//!
//! Concatenates the pages of several PDF documents, in order, into one
//! output document.
//!
//! # Examples
//!
//! ```no_run
//! use urlcat::merge::Merger;
//! use std::path::{Path, PathBuf};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let inputs = vec![PathBuf::from("a.pdf"), PathBuf::from("b.pdf")];
//! let stats = Merger::new().merge(&inputs, Path::new("merged.pdf")).await?;
//! println!("Merged {} pages", stats.total_pages);
//! # Ok(())
//! # }
//! ```

pub mod merger;

pub use merger::{MergeStatistics, Merger, concatenate};
