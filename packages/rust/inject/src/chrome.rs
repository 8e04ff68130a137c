//! Site chrome injectors, applied to every page independently of the stages.

use tfasync_anchors::{Anchor, Document};
use tfasync_shared::markers;

use crate::injector::{Injector, SkipReason, Splice};
use crate::texts::{FOOTER_LEGAL_ROW, QUICK_EXIT_BAR, SAFETY_BANNER, SAFETY_BANNER_SCRIPT};

/// Mobile quick-exit bar, inside the header after the nav.
pub struct QuickExitBar;

impl Injector for QuickExitBar {
    fn name(&self) -> &'static str {
        "quick-exit-bar"
    }

    fn marker(&self) -> &'static str {
        markers::QUICK_EXIT_MARKER
    }

    fn plan(&self, doc: &Document<'_>) -> Result<Vec<Splice>, SkipReason> {
        let nav = doc.locate(Anchor::NavEnd)?;
        Ok(vec![Splice::insert(nav.end, QUICK_EXIT_BAR)])
    }
}

/// Browser-history safety banner at the top of the body.
pub struct SafetyBanner;

impl Injector for SafetyBanner {
    fn name(&self) -> &'static str {
        "safety-banner"
    }

    fn marker(&self) -> &'static str {
        markers::SAFETY_BANNER_MARKER
    }

    fn plan(&self, doc: &Document<'_>) -> Result<Vec<Splice>, SkipReason> {
        let body = doc.locate(Anchor::BodyStart)?;
        Ok(vec![Splice::insert(body.end, format!("\n{SAFETY_BANNER}"))])
    }
}

/// Legal links row after the footer's Contact group.
pub struct FooterLegalRow;

impl Injector for FooterLegalRow {
    fn name(&self) -> &'static str {
        "footer-legal-row"
    }

    fn marker(&self) -> &'static str {
        markers::FOOTER_LEGAL_MARKER
    }

    fn plan(&self, doc: &Document<'_>) -> Result<Vec<Splice>, SkipReason> {
        let group = doc.locate(Anchor::FooterGroupEnd)?;
        Ok(vec![Splice::insert(group.end, format!("\n{FOOTER_LEGAL_ROW}"))])
    }
}

/// Script that drives the safety banner.
pub struct SafetyScript;

impl Injector for SafetyScript {
    fn name(&self) -> &'static str {
        "safety-script"
    }

    fn marker(&self) -> &'static str {
        markers::SAFETY_SCRIPT_MARKER
    }

    fn plan(&self, doc: &Document<'_>) -> Result<Vec<Splice>, SkipReason> {
        let body_end = doc.locate(Anchor::BodyEnd)?;
        Ok(vec![Splice::insert(body_end.start, SAFETY_BANNER_SCRIPT)])
    }
}

/// All chrome injectors, in application order.
pub fn chrome_injectors() -> Vec<Box<dyn Injector>> {
    vec![
        Box::new(QuickExitBar),
        Box::new(SafetyBanner),
        Box::new(FooterLegalRow),
        Box::new(SafetyScript),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::injector::{InjectOutcome, inject};

    const PAGE: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/../../../fixtures/html/technique.html"));

    fn apply_all(text: &str) -> (String, usize) {
        let mut text = text.to_string();
        let mut applied = 0;
        for injector in chrome_injectors() {
            if let InjectOutcome::Applied(out) = inject(&text, injector.as_ref()) {
                text = out;
                applied += 1;
            }
        }
        (text, applied)
    }

    #[test]
    fn every_chrome_block_lands_once() {
        let (out, applied) = apply_all(PAGE);
        assert_eq!(applied, 4);
        for marker in [
            markers::QUICK_EXIT_MARKER,
            markers::SAFETY_BANNER_MARKER,
            markers::FOOTER_LEGAL_MARKER,
            markers::SAFETY_SCRIPT_MARKER,
        ] {
            assert_eq!(out.matches(marker).count(), 1, "{marker}");
        }
        let nav = out.find("</nav>").unwrap();
        let bar = out.find("quick-exit-bar").unwrap();
        let header = out.find("</header>").unwrap();
        assert!(nav < bar && bar < header);

        let (again, applied) = apply_all(&out);
        assert_eq!(applied, 0);
        assert_eq!(again, out);
    }

    #[test]
    fn page_without_footer_still_gets_the_rest() {
        let (out, applied) = apply_all("<body>\n<p>x</p>\n</body>");
        assert_eq!(applied, 2);
        assert!(out.starts_with("<body>\n\n    <div class=\"safety-banner\""));
        assert!(!out.contains(markers::FOOTER_LEGAL_MARKER));
    }
}
