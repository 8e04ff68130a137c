//! Document injectors.
//!
//! Every injector is a check-then-apply transition: if its marker is already
//! in the document it does nothing, otherwise it plans all of its edits
//! against located anchors and applies them together. A missing anchor
//! leaves the document untouched.

pub mod chrome;
mod injector;
pub mod refresh;
mod render;
pub mod stages;
pub mod texts;

pub use chrome::chrome_injectors;
pub use injector::{InjectOutcome, Injector, SkipReason, Splice, inject};
pub use refresh::refresh_disclaimers;
pub use render::escape_html;
pub use stages::{DocumentStage, Stage, StageContext, injector_for};
