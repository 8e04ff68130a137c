//! HTML rendering for public views and relational tables.

use tfasync_shared::{PublicRecord, SafetyAction, Signal};
use tfasync_store::{CatalogueEntry, PublicView};

use crate::texts::HELPLINE_BANNER;

/// Escape `&`, `<`, `>` and `"`.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn safety_warning(warning: Option<&str>) -> String {
    match warning.filter(|w| !w.is_empty()) {
        Some(text) => format!(
            "<div class=\"safety-warning\">\n                                        <span class=\"safety-warning-icon\">&#9888;</span>\n                                        {}\n                                    </div>",
            escape_html(text)
        ),
        None => String::new(),
    }
}

fn notices(signals: &[Signal]) -> String {
    if signals.is_empty() {
        return String::new();
    }
    let items: Vec<String> = signals
        .iter()
        .map(|s| {
            format!(
                "                                        <li>\n                                            <strong>{}</strong>\n                                            <p>{}</p>\n                                        </li>",
                escape_html(&s.title),
                escape_html(&s.explanation)
            )
        })
        .collect();
    format!(
        "<h2>What You Might Notice</h2>\n                                    <ul class=\"notice-list\">\n{}\n                                    </ul>",
        items.join("\n")
    )
}

fn actions(actions: &[SafetyAction]) -> String {
    if actions.is_empty() {
        return String::new();
    }
    let items: Vec<String> = actions
        .iter()
        .map(|a| {
            let note = a
                .safety_note
                .as_deref()
                .filter(|n| !n.is_empty())
                .map(|n| {
                    format!(
                        "\n                                            <p class=\"safety-note\">{}</p>",
                        escape_html(n)
                    )
                })
                .unwrap_or_default();
            format!(
                "                                        <li>\n                                            <strong>{}</strong>\n                                            <p>{}</p>{note}\n                                        </li>",
                escape_html(&a.title),
                escape_html(&a.explanation)
            )
        })
        .collect();
    format!(
        "<h2>What You Can Do</h2>\n                                    <ul class=\"action-list\">\n{}\n                                    </ul>",
        items.join("\n")
    )
}

/// Full public view of a technique page.
pub(crate) fn technique_public_view(view: &PublicView) -> String {
    let record: &PublicRecord = &view.record;
    format!(
        "<div class=\"view-public\">
                                    {HELPLINE_BANNER}
                                    {}
                                    <h1>{}</h1>
                                    <p class=\"public-summary\">{}</p>
                                    {}
                                    {}
                                </div>",
        safety_warning(record.safety_warning.as_deref()),
        escape_html(view.display_title()),
        escape_html(&record.summary),
        notices(&record.signals),
        actions(&record.actions),
    )
}

/// Tactic pages carry title, summary and warning only.
pub(crate) fn tactic_public_view(view: &PublicView) -> String {
    let record = &view.record;
    format!(
        "<div class=\"view-public\">
                                    {HELPLINE_BANNER}
                                    {}
                                    <h1>{}</h1>
                                    <p class=\"public-summary\">{}</p>
                                </div>",
        safety_warning(record.safety_warning.as_deref()),
        escape_html(view.display_title()),
        escape_html(&record.summary),
    )
}

fn catalogue_table(id_header: &str, name_header: &str, rows: &[CatalogueEntry], empty: &str) -> String {
    let mut html = format!(
        "<table class=\"table table-bordered relation-table\">\n<thead>\n<tr>\n<th style=\"width: 120px;\">{id_header}</th>\n<th>{name_header}</th>\n</tr>\n</thead>\n<tbody>\n"
    );
    if rows.is_empty() {
        html.push_str(&format!("<tr>\n<td colspan=\"2\">{empty}</td>\n</tr>\n"));
    }
    for entry in rows {
        html.push_str(&format!(
            "<tr>\n<td><strong>{}</strong></td>\n<td><strong>{}</strong><br>{}</td>\n</tr>\n",
            escape_html(&entry.id),
            escape_html(&entry.name),
            escape_html(&entry.description)
        ));
    }
    html.push_str("</tbody>\n</table>");
    html
}

/// Mitigations table, followed by the detection section when there are any.
///
/// An empty mitigation list still renders a table so the page is marked.
pub(crate) fn relation_tables(mitigations: &[CatalogueEntry], detections: &[CatalogueEntry]) -> String {
    let mut html = catalogue_table(
        "ID",
        "Mitigation",
        mitigations,
        "No mitigations documented for this technique.",
    );
    if !detections.is_empty() {
        html.push_str("\n<h2 class=\"pt-3\" id=\"detections\">Detection Indicators</h2>\n");
        html.push_str(&catalogue_table("ID", "Detection Indicator", detections, ""));
    }
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> PublicView {
        PublicView {
            name: "Technical <Name>".into(),
            record: PublicRecord {
                title: String::new(),
                summary: "Someone reads \"your\" messages".into(),
                safety_warning: Some("Changing settings may alert them".into()),
                signals: vec![],
                actions: vec![SafetyAction {
                    title: "Review devices".into(),
                    explanation: "Check the list.".into(),
                    safety_note: Some("Only if safe.".into()),
                }],
            },
        }
    }

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(escape_html(r#"a & <b> "c""#), "a &amp; &lt;b&gt; &quot;c&quot;");
    }

    #[test]
    fn technique_view_falls_back_to_name_and_skips_empty_lists() {
        let html = technique_public_view(&view());
        assert!(html.contains("<h1>Technical &lt;Name&gt;</h1>"));
        assert!(html.contains("&quot;your&quot;"));
        assert!(html.contains("class=\"safety-warning\""));
        assert!(!html.contains("notice-list"));
        assert!(html.contains("<p class=\"safety-note\">Only if safe.</p>"));
    }

    #[test]
    fn tactic_view_has_no_lists() {
        let html = tactic_public_view(&view());
        assert!(!html.contains("action-list"));
        assert!(html.contains("helpline-banner"));
    }

    #[test]
    fn tables_render_rows_and_empty_state() {
        let m = CatalogueEntry {
            id: "TFA-M-001".into(),
            name: "Lock".into(),
            description: "Use a PIN".into(),
        };
        let html = relation_tables(std::slice::from_ref(&m), &[]);
        assert!(html.contains("<td><strong>TFA-M-001</strong></td>"));
        assert!(html.contains(tfasync_shared::markers::TABLES_MARKER));
        assert!(!html.contains("Detection Indicators"));

        let empty = relation_tables(&[], std::slice::from_ref(&m));
        assert!(empty.contains("No mitigations documented"));
        assert!(empty.contains("<th>Detection Indicator</th>"));
    }
}
