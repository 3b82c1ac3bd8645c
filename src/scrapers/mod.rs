//! Extraction of article records from fetched documents.
//!
//! | Module | Input | Output |
//! |--------|-------|--------|
//! | [`feed`] | RSS 2.0 / RSS 1.0 / Atom bytes | up to 10 raw records |
//! | [`page`] | HTML page | up to 10 raw records from the container or link tier |
//! | [`fields`] | one container element | title, link, date, description |
//! | [`cascade`] | | ordered selector tables shared by the above |
//!
//! Nothing here performs I/O or returns a hard error for missing data; the
//! orchestrator decides what a failure means for the target.

pub mod cascade;
pub mod feed;
pub mod fields;
pub mod page;
