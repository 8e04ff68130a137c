//! Dual-view stage: view toggle, public view, technical wrapper.

use tfasync_anchors::{Anchor, Document, technique_cells};
use tfasync_shared::{NaturalKey, PageKind, markers};
use tfasync_store::PublicView;
use tracing::debug;

use super::{StageContext, page_key};
use crate::injector::{Injector, SkipReason, Splice};
use crate::render::{escape_html, tactic_public_view, technique_public_view};
use crate::texts::{VIEW_TECHNICAL_CLOSE, VIEW_TECHNICAL_OPEN, VIEW_TOGGLE, VIEW_TOGGLE_SCRIPT};

pub struct DualView<'a> {
    kind: PageKind,
    fallback_key: Option<&'a str>,
    ctx: StageContext<'a>,
}

impl<'a> DualView<'a> {
    pub fn new(kind: PageKind, fallback_key: Option<&'a str>, ctx: StageContext<'a>) -> Self {
        Self {
            kind,
            fallback_key,
            ctx,
        }
    }

    fn view(&self, doc: &Document<'_>) -> Result<&'a PublicView, SkipReason> {
        let views = match self.kind {
            PageKind::Tactic => self.ctx.tactics,
            _ => self.ctx.techniques,
        };
        let key = page_key(doc, self.fallback_key)
            .ok_or(SkipReason::MissingAnchor(Anchor::NaturalKeyLabel.into()))?;
        views
            .get(&NaturalKey::from(key))
            .ok_or_else(|| SkipReason::NoData(key.to_string()))
    }

    /// Toggle right after the breadcrumb line.
    fn toggle(doc: &Document<'_>) -> Result<(usize, Splice), SkipReason> {
        let crumb = doc.locate(Anchor::BreadcrumbEnd)?;
        Ok((crumb.end, Splice::insert(crumb.end, format!("    {VIEW_TOGGLE}\n"))))
    }

    fn plan_technique(&self, doc: &Document<'_>) -> Result<Vec<Splice>, SkipReason> {
        let view = self.view(doc)?;
        let (after_crumb, toggle) = Self::toggle(doc)?;
        let container = doc.locate_after(Anchor::ContentContainer, after_crumb)?;
        let h1 = doc.locate_after(Anchor::Heading(1), container.end)?;
        let content_from = doc
            .locate_after(Anchor::Heading(2), h1.end)
            .map(|h2| h2.start)
            .unwrap_or(doc.len());
        let content_end = doc.locate_after(Anchor::BlockEnd, content_from)?;

        Ok(vec![
            toggle,
            Splice::insert(
                h1.start,
                format!("{}\n{VIEW_TECHNICAL_OPEN}", technique_public_view(view)),
            ),
            Splice::insert(content_end.start, VIEW_TECHNICAL_CLOSE),
        ])
    }

    fn plan_tactic(&self, doc: &Document<'_>) -> Result<Vec<Splice>, SkipReason> {
        let view = self.view(doc)?;
        let (after_crumb, toggle) = Self::toggle(doc)?;
        let h1 = doc.locate_after(Anchor::Heading(1), after_crumb)?;
        let content_end = doc
            .locate_after(Anchor::Table, h1.end)
            .or_else(|_| doc.locate_after(Anchor::BlockEnd, h1.end))?;

        Ok(vec![
            toggle,
            Splice::insert(
                h1.start,
                format!("{}\n{VIEW_TECHNICAL_OPEN}", tactic_public_view(view)),
            ),
            Splice::insert(content_end.start, VIEW_TECHNICAL_CLOSE),
        ])
    }

    /// Toggle, plus public titles written into every technique cell that has one.
    fn plan_matrix(&self, doc: &Document<'_>) -> Result<Vec<Splice>, SkipReason> {
        let (_, toggle) = Self::toggle(doc)?;
        let mut splices = vec![toggle];

        for cell in technique_cells(doc.text()) {
            let Some(view) = self.ctx.techniques.get(&NaturalKey::from(cell.key.as_str())) else {
                continue;
            };
            if view.record.title.is_empty() {
                continue;
            }
            let public_title = escape_html(&view.record.title);
            let open_tag = cell.open_tag.replacen(
                "class=\"technique-cell",
                &format!(
                    "data-public-title=\"{public_title}\" data-tech-title=\"{}\" class=\"technique-cell",
                    escape_html(&view.name)
                ),
                1,
            );
            splices.push(Splice::replace(
                cell.span,
                format!(
                    "{open_tag}\n    <a href=\"{}\"{}>{public_title}</a>",
                    cell.href, cell.link_attrs
                ),
            ));
        }
        debug!(cells = splices.len() - 1, "matrix cells retitled");
        Ok(splices)
    }
}

impl Injector for DualView<'_> {
    fn name(&self) -> &'static str {
        "dual-view"
    }

    fn marker(&self) -> &'static str {
        markers::DUAL_VIEW_MARKER
    }

    fn plan(&self, doc: &Document<'_>) -> Result<Vec<Splice>, SkipReason> {
        let mut splices = match self.kind {
            PageKind::Technique => self.plan_technique(doc)?,
            PageKind::Tactic => self.plan_tactic(doc)?,
            PageKind::Matrix => self.plan_matrix(doc)?,
        };
        // The script tag is optional: pages without `</body>` still get the views.
        if !doc.contains(markers::VIEW_TOGGLE_SCRIPT_MARKER) {
            if let Ok(body_end) = doc.locate(Anchor::BodyEnd) {
                splices.push(Splice::insert(body_end.start, VIEW_TOGGLE_SCRIPT));
            }
        }
        Ok(splices)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use tfasync_shared::{PublicRecord, Signal};
    use tfasync_store::RelationalData;

    use super::*;
    use crate::injector::{InjectOutcome, inject};

    const TECHNIQUE: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/../../../fixtures/html/technique.html"));
    const TACTIC: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/../../../fixtures/html/tactic.html"));
    const MATRIX: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/../../../fixtures/html/matrix.html"));

    fn view(title: &str) -> PublicView {
        PublicView {
            name: "Account Compromise".into(),
            record: PublicRecord {
                title: title.into(),
                summary: "Someone gets into your accounts.".into(),
                safety_warning: None,
                signals: vec![Signal {
                    title: "Unexpected logins".into(),
                    explanation: "Alerts about new devices.".into(),
                }],
                actions: vec![],
            },
        }
    }

    fn views(pairs: &[(&str, PublicView)]) -> BTreeMap<NaturalKey, PublicView> {
        pairs
            .iter()
            .map(|(k, v)| (NaturalKey::from(*k), v.clone()))
            .collect()
    }

    fn apply(kind: PageKind, text: &str, techniques: &BTreeMap<NaturalKey, PublicView>) -> InjectOutcome {
        let tactics = views(&[("TFA-TA-0001", view("Getting In"))]);
        let relational = RelationalData::default();
        let ctx = StageContext {
            techniques,
            tactics: &tactics,
            relational: &relational,
        };
        inject(text, &DualView::new(kind, None, ctx))
    }

    #[test]
    fn technique_page_gets_both_views() {
        let techniques = views(&[("TFA-T-1001", view("Someone Is In Your Accounts"))]);
        let InjectOutcome::Applied(out) = apply(PageKind::Technique, TECHNIQUE, &techniques) else {
            panic!("expected dual view to apply");
        };
        let toggle = out.find(markers::DUAL_VIEW_MARKER).unwrap();
        let public = out.find(markers::VIEW_PUBLIC_START).unwrap();
        let technical = out.find(markers::VIEW_TECHNICAL_START).unwrap();
        let mitigations = out.find("id =\"mitigations\"").unwrap();
        let end = out.find(markers::VIEW_TECHNICAL_END).unwrap();
        assert!(toggle < public && public < technical && technical < mitigations && mitigations < end);
        assert!(out.contains("<h1>Someone Is In Your Accounts</h1>"));
        assert_eq!(out.matches("view-toggle.js").count(), 1);
        assert_eq!(apply(PageKind::Technique, &out, &techniques), InjectOutcome::AlreadyApplied);
    }

    #[test]
    fn technique_without_store_data_is_skipped() {
        let out = apply(PageKind::Technique, TECHNIQUE, &BTreeMap::new());
        assert_eq!(out, InjectOutcome::Skipped(SkipReason::NoData("TFA-T-1001".into())));
    }

    #[test]
    fn tactic_wrapper_stops_at_table() {
        let InjectOutcome::Applied(out) = apply(PageKind::Tactic, TACTIC, &BTreeMap::new()) else {
            panic!("expected dual view to apply");
        };
        let end = out.find(markers::VIEW_TECHNICAL_END).unwrap();
        let table = out.find("<table").unwrap();
        assert!(end < table);
        assert!(out.contains("<h1>Getting In</h1>"));
    }

    #[test]
    fn matrix_cells_get_public_titles() {
        let techniques = views(&[
            ("TFA-T-1001", view("Someone Is In Your Accounts")),
            ("TFA-T-1002", view("")),
        ]);
        let InjectOutcome::Applied(out) = apply(PageKind::Matrix, MATRIX, &techniques) else {
            panic!("expected dual view to apply");
        };
        assert!(out.contains(
            "data-public-title=\"Someone Is In Your Accounts\" data-tech-title=\"Account Compromise\" class=\"technique-cell"
        ));
        assert_eq!(out.matches("data-public-title").count(), 1);
    }

    #[test]
    fn legacy_layout_is_left_alone() {
        let techniques = views(&[("TFA-T-1001", view("x"))]);
        let legacy = "<html><body><span class=\"h5 card-title\">ID:&nbsp;</span>TFA-T-1001</body></html>";
        assert!(matches!(
            apply(PageKind::Technique, legacy, &techniques),
            InjectOutcome::Skipped(SkipReason::MissingAnchor(_))
        ));
    }
}
