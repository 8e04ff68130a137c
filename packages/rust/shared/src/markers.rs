//! Literal marker contract shared with the site renderer.
//!
//! These strings are matched byte-for-byte against presentation documents;
//! changing one breaks re-run detection on already-processed pages.

/// Label preceding a page's natural key.
pub const NATURAL_KEY_LABEL: &str = r#"<span class="h5 card-title">ID:&nbsp;</span>"#;

/// Opening tag of the public-facing region.
pub const VIEW_PUBLIC_START: &str = r#"<div class="view-public">"#;

/// Prefix of the technical wrapper's opening tag (ends the public region).
pub const VIEW_TECHNICAL_START: &str = r#"<div class="view-technical""#;

/// Closing tag of the technical wrapper, written by the dual-view stage.
pub const VIEW_TECHNICAL_END: &str = "</div><!-- end view-technical -->";

/// Opening tag of the public disclaimer (ends the extractable region early).
pub const PUBLIC_DISCLAIMER_START: &str = r#"<div class="public-disclaimer">"#;

/// Opening tag of the technical disclaimer.
pub const TECHNICAL_DISCLAIMER_START: &str = r#"<div class="technical-disclaimer">"#;

/// Opening tag of the matrix disclaimer.
pub const MATRIX_DISCLAIMER_START: &str = r#"<div class="matrix-disclaimer view-public">"#;

// ---------------------------------------------------------------------------
// Stage markers
// ---------------------------------------------------------------------------

pub const DUAL_VIEW_MARKER: &str = "view-toggle-container";
pub const DISCLAIMERS_MARKER: &str = "public-disclaimer";
pub const MATRIX_DISCLAIMER_MARKER: &str = "matrix-disclaimer";
/// Class carried by every generated relation table.
pub const TABLES_MARKER: &str = "relation-table";

/// Pages tabled before the dedicated marker existed carry a bordered table
/// and a mitigation id, with the placeholder gone.
pub const LEGACY_TABLE_CLASS: &str = "table-bordered";
pub const LEGACY_MITIGATION_PREFIX: &str = "TFA-M-";

// ---------------------------------------------------------------------------
// Chrome markers
// ---------------------------------------------------------------------------

pub const QUICK_EXIT_MARKER: &str = "quick-exit-bar";
pub const SAFETY_BANNER_MARKER: &str = "browser-safety-banner";
pub const FOOTER_LEGAL_MARKER: &str = "footer-legal-row";
pub const SAFETY_SCRIPT_MARKER: &str = "safety-banner.js";
pub const VIEW_TOGGLE_SCRIPT_MARKER: &str = "view-toggle.js";

// ---------------------------------------------------------------------------
// Extracted-field selectors
// ---------------------------------------------------------------------------

pub const TITLE_SELECTOR: &str = "h1";
pub const SUMMARY_SELECTOR: &str = "p.public-summary";
pub const WARNING_SELECTOR: &str = "div.safety-warning";
pub const SIGNAL_ITEM_SELECTOR: &str = "ul.notice-list > li";
pub const ACTION_ITEM_SELECTOR: &str = "ul.action-list > li";
pub const LEAD_IN_SELECTOR: &str = "strong";
pub const PARAGRAPH_SELECTOR: &str = "p";
pub const SAFETY_NOTE_CLASS: &str = "safety-note";
