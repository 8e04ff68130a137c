//! Structural landmark detection for presentation documents.
//!
//! Documents carry no schema, so every extraction and insertion point is
//! found by literal landmarks. Scanning happens in two phases:
//! [`LandmarkIndex::build`] records every landmark occurrence once, then
//! [`Document`] answers ordered anchor queries against that index.
//!
//! A missing landmark is a [`NotFound`] value, never a panic or an I/O-style
//! error: callers treat it as "skip this document".

mod anchor;
mod cells;
mod index;

pub use anchor::{Anchor, NotFound, Span, Wrapper};
pub use cells::{TechniqueCell, technique_cells};
pub use index::{Document, LandmarkIndex};
