//! Public-view field extraction.
//!
//! Given a page, locate its natural key and bounded public region, then pull
//! the title, summary, optional warning, and the signal/action item lists
//! into a [`PublicRecord`](tfasync_shared::PublicRecord).

mod cleanup;
mod extractor;

pub use cleanup::clean_text;
pub use extractor::{Extraction, OmitReason, extract, extract_document};
