//! Literal HTML blocks written into pages.
//!
//! Each block contains the marker its injector checks for, so a page that
//! carries the block is never injected twice.

pub const PUBLIC_DISCLAIMER: &str = r#"<div class="public-disclaimer">
                                        <p><strong>Important:</strong> This resource provides general information, not personal advice. Every situation is different. The actions suggested here may not be safe in your specific circumstances — particularly if the person causing harm could notice changes to your devices or accounts. <strong>Always consider your physical safety first.</strong></p>
                                        <p>If you need personalised support, contact <a href="tel:1800737732">1800RESPECT (1800 737 732)</a> or your local specialist domestic violence service. If you are in immediate danger, call <a href="tel:000">000</a>.</p>
                                        <p>This framework is under active development. <a href="/about/limitations/">View full limitations &amp; methodology</a>.</p>
                                    </div>"#;

pub const TECHNICAL_DISCLAIMER: &str = r#"<div class="technical-disclaimer">
                                <p>The TFA Matrix is a research framework under active development. Technique classifications, detection methods, and mitigations reflect current understanding and are subject to revision. This framework does not constitute forensic methodology, legal evidence standards, or clinical diagnostic criteria. Practitioners should apply professional judgement appropriate to their discipline and jurisdiction.</p>
                                <p><a href="/about/limitations/">Full limitations, methodology &amp; responsible use statement</a>.</p>
                            </div>"#;

pub const MATRIX_DISCLAIMER: &str = r#"<div class="matrix-disclaimer view-public">
                            <p>This matrix shows known patterns of technology-facilitated abuse. It is not a complete list — new techniques emerge as technology changes. Click any technique for guidance on what to notice and what you can do.</p>
                            <p>Need support? <a href="tel:1800737732">1800RESPECT (1800 737 732)</a> | Emergency: <a href="tel:000">000</a> | <a href="/about/limitations/">Limitations &amp; methodology</a></p>
                        </div>"#;

pub const VIEW_TOGGLE: &str = r#"<div class="view-toggle-container" role="group" aria-label="Content view selection">
                        <button class="view-toggle-btn" data-view="technical" aria-pressed="false">Technical View</button>
                        <button class="view-toggle-btn active" data-view="public" aria-pressed="true">Public View</button>
                    </div>"#;

pub const HELPLINE_BANNER: &str = r#"<div class="helpline-banner">
                                        <strong>Need support?</strong>
                                        <a href="tel:1800737732">1800RESPECT (1800 737 732)</a> |
                                        Emergency: <a href="tel:000">000</a>
                                    </div>"#;

/// Opening of the technical wrapper, indented to sit under the public view.
pub const VIEW_TECHNICAL_OPEN: &str =
    "                            <div class=\"view-technical\" style=\"display: none;\">\n                            ";

pub const VIEW_TECHNICAL_CLOSE: &str = "\n                            </div><!-- end view-technical -->";

pub const VIEW_TOGGLE_SCRIPT: &str = "    <script src=\"/theme/scripts/view-toggle.js\"></script>\n";

pub const QUICK_EXIT_BAR: &str = r#"                <!-- Mobile Quick Exit Bar - visible on mobile only -->
                <div class="quick-exit-bar">
                    <a href="https://doodles.google" id="quick-exit-mobile" title="Press Escape to quickly leave this site">⚡ Quick Exit</a>
                </div>
"#;

pub const SAFETY_BANNER: &str = r#"    <div class="safety-banner" id="browser-safety-banner">
        <div class="safety-banner-content">
            <strong>Is someone checking your browsing?</strong>
            This website will appear in your browser history. If you're concerned someone may be monitoring your internet use, consider using a trusted friend's device, a library computer, or your browser's private/incognito mode. You can press <strong>Quick Exit</strong> or hit <strong>Escape</strong> at any time to leave this site quickly.
            <a href="/about/online-safety/">Learn more about staying safe online</a>
        </div>
        <button class="safety-banner-close" id="close-safety-banner" aria-label="Dismiss safety notice">&times;</button>
    </div>

"#;

pub const FOOTER_LEGAL_ROW: &str = r#"                            <div class="row row-footer footer-legal-row">
                                <div class="px-3 col-footer">
                                    <a href="/about/online-safety/" class="footer-link">Your Safety Online</a>
                                </div>
                                <div class="px-3 col-footer">
                                    <a href="/about/privacy/" class="footer-link">Privacy</a>
                                </div>
                                <div class="px-3 col-footer">
                                    <a href="/about/terms/" class="footer-link">Terms</a>
                                </div>
                                <div class="px-3 col-footer">
                                    <a href="/about/licensing/" class="footer-link">Licensing</a>
                                </div>
                            </div>
"#;

pub const SAFETY_BANNER_SCRIPT: &str = "    <script src=\"/theme/scripts/safety-banner.js\"></script>\n";

#[cfg(test)]
mod tests {
    use super::*;
    use tfasync_shared::markers;

    #[test]
    fn blocks_carry_their_markers() {
        assert!(VIEW_TOGGLE.contains(markers::DUAL_VIEW_MARKER));
        assert!(PUBLIC_DISCLAIMER.starts_with(markers::PUBLIC_DISCLAIMER_START));
        assert!(TECHNICAL_DISCLAIMER.starts_with(markers::TECHNICAL_DISCLAIMER_START));
        assert!(MATRIX_DISCLAIMER.starts_with(markers::MATRIX_DISCLAIMER_START));
        assert!(VIEW_TECHNICAL_OPEN.contains(markers::VIEW_TECHNICAL_START));
        assert!(VIEW_TECHNICAL_CLOSE.contains(markers::VIEW_TECHNICAL_END));
        assert!(QUICK_EXIT_BAR.contains(markers::QUICK_EXIT_MARKER));
        assert!(SAFETY_BANNER.contains(markers::SAFETY_BANNER_MARKER));
        assert!(FOOTER_LEGAL_ROW.contains(markers::FOOTER_LEGAL_MARKER));
        assert!(SAFETY_BANNER_SCRIPT.contains(markers::SAFETY_SCRIPT_MARKER));
        assert!(VIEW_TOGGLE_SCRIPT.contains(markers::VIEW_TOGGLE_SCRIPT_MARKER));
    }

    #[test]
    fn disclaimers_hold_no_nested_div() {
        // Refresh matches each block up to its first closing tag.
        for block in [PUBLIC_DISCLAIMER, TECHNICAL_DISCLAIMER, MATRIX_DISCLAIMER] {
            assert_eq!(block.matches("</div>").count(), 1);
        }
    }
}
