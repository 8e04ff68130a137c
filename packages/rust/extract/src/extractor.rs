//! The extractor: natural key, bounded region, fields.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tfasync_anchors::{Anchor, Document, Wrapper};
use tfasync_shared::markers;
use tfasync_shared::{NaturalKey, PublicRecord, SafetyAction, Signal};

use crate::cleanup::clean_text;

/// Why a keyed page yielded no record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OmitReason {
    /// No public region, or no boundary closing it.
    RegionNotFound,
    /// The region exists but has no non-empty title.
    MissingTitle,
}

impl std::fmt::Display for OmitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RegionNotFound => f.write_str("public region not found"),
            Self::MissingTitle => f.write_str("public title missing"),
        }
    }
}

/// Result of extracting one page.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Record { key: NaturalKey, record: PublicRecord },
    Omitted { key: NaturalKey, reason: OmitReason },
    /// No natural key: excluded from all counts.
    Unkeyed,
}

impl Extraction {
    pub fn key(&self) -> Option<&NaturalKey> {
        match self {
            Self::Record { key, .. } | Self::Omitted { key, .. } => Some(key),
            Self::Unkeyed => None,
        }
    }
}

struct Selectors {
    title: Selector,
    summary: Selector,
    warning: Selector,
    signal_items: Selector,
    action_items: Selector,
    lead_in: Selector,
    paragraph: Selector,
}

static SELECTORS: LazyLock<Selectors> = LazyLock::new(|| {
    let sel = |s: &str| Selector::parse(s).expect("valid selector");
    Selectors {
        title: sel(markers::TITLE_SELECTOR),
        summary: sel(markers::SUMMARY_SELECTOR),
        warning: sel(markers::WARNING_SELECTOR),
        signal_items: sel(markers::SIGNAL_ITEM_SELECTOR),
        action_items: sel(markers::ACTION_ITEM_SELECTOR),
        lead_in: sel(markers::LEAD_IN_SELECTOR),
        paragraph: sel(markers::PARAGRAPH_SELECTOR),
    }
});

/// Extract a page's public record from its raw text.
pub fn extract(text: &str) -> Extraction {
    extract_document(&Document::new(text))
}

/// Extract from an already-indexed document.
pub fn extract_document(doc: &Document<'_>) -> Extraction {
    let Some(key) = doc.natural_key() else {
        return Extraction::Unkeyed;
    };
    let key = NaturalKey::new(key);

    let region = match doc.region(
        Anchor::WrapperStart(Wrapper::ViewPublic),
        &[
            Anchor::DisclaimerStart,
            Anchor::WrapperStart(Wrapper::ViewTechnical),
        ],
    ) {
        Ok(span) => doc.slice(span),
        Err(miss) => {
            tracing::debug!(%key, %miss, "no public region");
            return Extraction::Omitted {
                key,
                reason: OmitReason::RegionNotFound,
            };
        }
    };

    let record = parse_region(region);
    if record.title.is_empty() {
        return Extraction::Omitted {
            key,
            reason: OmitReason::MissingTitle,
        };
    }

    tracing::debug!(
        %key,
        signals = record.signals.len(),
        actions = record.actions.len(),
        warning = record.safety_warning.is_some(),
        "extracted public record"
    );
    Extraction::Record { key, record }
}

fn parse_region(region: &str) -> PublicRecord {
    let fragment = Html::parse_fragment(region);
    let root = fragment.root_element();
    let s = &*SELECTORS;

    let first_text = |selector: &Selector| {
        root.select(selector)
            .next()
            .map(|el| element_text(&el))
            .unwrap_or_default()
    };

    let warning = first_text(&s.warning);

    PublicRecord {
        title: first_text(&s.title),
        summary: first_text(&s.summary),
        safety_warning: (!warning.is_empty()).then_some(warning),
        signals: root
            .select(&s.signal_items)
            .filter_map(|li| parse_item(&li))
            .map(|item| Signal {
                title: item.title,
                explanation: item.explanation,
            })
            .collect(),
        actions: root
            .select(&s.action_items)
            .filter_map(|li| parse_item(&li))
            .map(|item| SafetyAction {
                title: item.title,
                explanation: item.explanation,
                safety_note: item.safety_note,
            })
            .collect(),
    }
}

struct Item {
    title: String,
    explanation: String,
    safety_note: Option<String>,
}

/// A list item: bold lead-in, body paragraphs, optional safety note.
///
/// The lead-in may be missing. Without body paragraphs the item's remaining
/// text becomes the explanation. Items with no text at all yield `None`.
fn parse_item(li: &ElementRef<'_>) -> Option<Item> {
    let s = &*SELECTORS;
    let title = li
        .select(&s.lead_in)
        .next()
        .map(|el| element_text(&el))
        .unwrap_or_default();

    let mut paragraphs = Vec::new();
    let mut safety_note = None;
    for p in li.select(&s.paragraph) {
        let text = element_text(&p);
        if text.is_empty() {
            continue;
        }
        if p.value().classes().any(|c| c == markers::SAFETY_NOTE_CLASS) {
            safety_note = Some(text);
        } else {
            paragraphs.push(text);
        }
    }

    let mut explanation = paragraphs.join(" ");
    if explanation.is_empty() && safety_note.is_none() {
        let full = element_text(li);
        explanation = full.strip_prefix(title.as_str()).unwrap_or(&full).trim().to_string();
    }

    if title.is_empty() && explanation.is_empty() && safety_note.is_none() {
        tracing::debug!("dropping empty list item");
        return None;
    }
    if title.is_empty() {
        tracing::debug!(%explanation, "list item has no lead-in");
    }
    Some(Item {
        title,
        explanation,
        safety_note,
    })
}

fn element_text(el: &ElementRef<'_>) -> String {
    clean_text(&el.text().collect::<String>())
}
