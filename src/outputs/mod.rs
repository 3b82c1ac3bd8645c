//! Report persistence.
//!
//! # Submodules
//!
//! - [`json`]: every canonical record of the run as one pretty-printed array
//! - [`markdown`]: a human-readable report grouped by target
//!
//! # Output Structure
//!
//! ```text
//! json_output_dir/
//! └── competitor-articles-2025-05-06.json
//!
//! markdown_output_dir/
//! └── competitor-report-2025-05-06.md
//! ```
//!
//! Both files are overwritten when the tracker runs more than once a day.

pub mod json;
pub mod markdown;
