/// Server-side rendering of the browser page.
///
/// Every interactive element is a plain link to the state that results from the
/// corresponding transition, so the page works without scripts.
use protocol_common::catalogue::Catalogue;
use protocol_common::model::{Cancer, ProtocolRecord};
use protocol_common::sections::{self, Badge, DetailSection};
use protocol_common::view::{BrowserState, Overlay};
use tracing::debug;

const STYLE: &str = r#"
body { margin: 0; font-family: system-ui, sans-serif; background: #f9fafb; color: #111827; }
main { padding: 2rem; }
h1 { font-size: 1.9rem; margin: 0; }
.subtitle { color: #374151; margin: .5rem 0 2.5rem; }
.tabs { display: flex; gap: .75rem; margin-bottom: 1.5rem; }
.tab { padding: .5rem 1rem; border-radius: .75rem; background: #fff; box-shadow: 0 1px 3px #0002; color: inherit; text-decoration: none; }
.tab.active { background: #000; color: #fff; }
.timeline { position: relative; display: flex; justify-content: space-between; margin-bottom: 2.5rem; }
.timeline::before { content: ""; position: absolute; top: .75rem; left: 0; right: 0; height: 4px; background: #d1d5db; }
.stage { position: relative; display: flex; flex-direction: column; align-items: center; font-size: .75rem; color: inherit; text-decoration: none; }
.dot { width: 1.5rem; height: 1.5rem; border-radius: 50%; border: 4px solid #9ca3af; background: #fff; box-sizing: border-box; margin-bottom: .5rem; }
.stage.active .dot { background: #000; border-color: #000; }
.cards { display: grid; grid-template-columns: repeat(auto-fill, minmax(22rem, 1fr)); gap: 1.5rem; }
.card { position: relative; overflow: hidden; display: block; background: #fff; border: 1px solid #e5e7eb; border-radius: 1rem; padding: 1.5rem; color: inherit; text-decoration: none; box-shadow: 0 2px 6px #0001; }
.card-head { display: flex; justify-content: space-between; margin-bottom: .5rem; font-size: 1.1rem; font-weight: 600; }
.card-design { font-size: .9rem; color: #1f2937; margin-bottom: .5rem; }
.badges { display: flex; flex-wrap: wrap; gap: .5rem; }
.badge { font-size: .75rem; padding: .25rem .5rem; border-radius: .25rem; background: #f3f4f6; }
.badge.randomized { background: #fee2e2; color: #b91c1c; }
.badge.phase { background: #dbeafe; color: #1e40af; }
.badge.blinding { background: #f3e8ff; color: #6b21a8; }
.badge.endpoint { background: #d1fae5; color: #065f46; }
.watermark { position: absolute; inset: 0; display: flex; align-items: center; justify-content: center; pointer-events: none; font-size: 3rem; font-weight: 900; color: #d1d5dbb3; transform: rotate(-20deg); }
.empty { color: #6b7280; }
.overlay { position: fixed; inset: 0; display: flex; align-items: center; justify-content: center; padding: 1.5rem; }
.backdrop { position: absolute; inset: 0; background: #00000080; }
.modal { position: relative; background: #fff; border-radius: 1rem; width: 100%; max-width: 48rem; padding: 1.5rem; box-shadow: 0 10px 30px #0004; }
.modal .close { position: absolute; right: 1rem; top: .75rem; color: inherit; text-decoration: none; }
.modal-body { max-height: 75vh; overflow-y: auto; padding-right: .5rem; }
.modal-body section { margin-bottom: 1.5rem; }
.panel { background: #f3f4f6; border-radius: .75rem; padding: 1rem; }
.schema img { width: 100%; height: auto; border: 1px solid #e5e7eb; border-radius: .75rem; cursor: zoom-in; }
.pdf { display: inline-block; padding: .5rem .75rem; border-radius: .5rem; background: #000; color: #fff; text-decoration: none; }
footer { padding: 1rem 2rem; font-size: .75rem; color: #6b7280; }
"#;

pub fn page(catalogue: &Catalogue, state: &BrowserState) -> String {
    let mut html = String::with_capacity(16 * 1024);
    html.push_str("<!DOCTYPE html>\n<html lang=\"fr\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str("<title>Protocoles de recherche en urologie</title>\n");
    html.push_str(&format!("<style>{STYLE}</style>\n</head>\n<body>\n<main>\n"));
    html.push_str("<h1>Protocoles de recherche en urologie</h1>\n");
    html.push_str(
        "<p class=\"subtitle\">Outil interne de visualisation des études cliniques</p>\n",
    );

    render_tabs(&mut html, catalogue, state);
    render_timeline(&mut html, catalogue, state);
    render_cards(&mut html, catalogue, state);

    match state.overlay(catalogue) {
        Overlay::Closed => {}
        Overlay::Detail(record) => render_detail(&mut html, catalogue, state, record),
        Overlay::Zoom { record, image } => {
            render_detail(&mut html, catalogue, state, record);
            render_zoom(&mut html, state, record, image);
        }
    }

    html.push_str(&format!(
        "</main>\n<footer>Catalogue {}</footer>\n</body>\n</html>\n",
        escape(catalogue.revision())
    ));
    html
}

/// Link target for a state.
pub fn href(state: &BrowserState) -> String {
    match serde_urlencoded::to_string(state) {
        Ok(query) => format!("/?{query}"),
        Err(e) => {
            debug!(error = %e, "cannot encode state link, linking to initial page");
            "/".to_string()
        }
    }
}

fn render_tabs(html: &mut String, catalogue: &Catalogue, state: &BrowserState) {
    html.push_str("<nav class=\"tabs\">\n");
    for cancer in Cancer::ALL {
        let mut next = state.clone();
        next.select_category(catalogue.stages(), cancer);
        let class = if cancer == state.cancer { "tab active" } else { "tab" };
        html.push_str(&format!(
            "<a class=\"{class}\" href=\"{}\">{}</a>\n",
            escape(&href(&next)),
            escape(cancer.label())
        ));
    }
    html.push_str("</nav>\n");
}

fn render_timeline(html: &mut String, catalogue: &Catalogue, state: &BrowserState) {
    html.push_str("<nav class=\"timeline\">\n");
    for stage in catalogue.stages().stages(state.cancer) {
        let mut next = state.clone();
        next.select_stage(stage.as_str());
        let class = if *stage == state.stage { "stage active" } else { "stage" };
        html.push_str(&format!(
            "<a class=\"{class}\" href=\"{}\"><span class=\"dot\"></span>{}</a>\n",
            escape(&href(&next)),
            escape(stage)
        ));
    }
    html.push_str("</nav>\n");
}

fn render_cards(html: &mut String, catalogue: &Catalogue, state: &BrowserState) {
    let visible = state.visible(catalogue);
    html.push_str("<div class=\"cards\">\n");
    if visible.is_empty() {
        html.push_str("<p class=\"empty\">Aucun protocole pour ce stade.</p>\n");
    }
    for record in visible {
        let mut next = state.clone();
        next.open_detail(record);
        html.push_str(&format!(
            "<a class=\"card\" href=\"{}\" data-protocol=\"{}\">\n",
            escape(&href(&next)),
            escape(&record.id)
        ));
        if let Some(text) = sections::watermark(record) {
            html.push_str(&format!("<div class=\"watermark\">{text}</div>\n"));
        }

        let badges = sections::card_badges(record);
        html.push_str(&format!(
            "<div class=\"card-head\"><span>{}</span>",
            escape(&record.title)
        ));
        if badges.contains(&Badge::Randomized) {
            html.push_str(&badge_html(&Badge::Randomized));
        }
        html.push_str("</div>\n");
        html.push_str(&format!(
            "<div class=\"card-design\">{}</div>\n",
            escape(&record.design_short)
        ));

        let tags: Vec<String> = badges
            .iter()
            .filter(|b| **b != Badge::Randomized)
            .map(badge_html)
            .collect();
        if !tags.is_empty() {
            html.push_str(&format!("<div class=\"badges\">{}</div>\n", tags.concat()));
        }
        html.push_str("</a>\n");
    }
    html.push_str("</div>\n");
}

fn badge_html(badge: &Badge<'_>) -> String {
    let class = match badge {
        Badge::Randomized => "badge randomized",
        Badge::Phase(_) => "badge phase",
        Badge::Blinding(_) => "badge blinding",
        Badge::PrimaryEndpoint => "badge endpoint",
        Badge::Highlight(_) => "badge",
    };
    format!("<span class=\"{class}\">{}</span>", escape(badge.text()))
}

fn render_detail(
    html: &mut String,
    catalogue: &Catalogue,
    state: &BrowserState,
    record: &ProtocolRecord,
) {
    let mut closed = state.clone();
    closed.close_detail();
    open_modal(html, "detail", &href(&closed));
    html.push_str(&format!("<h2>{}</h2>\n", escape(&record.title)));

    for section in sections::detail_sections(record) {
        html.push_str("<section>\n");
        match section {
            DetailSection::Schemas(images) => {
                for image in images {
                    let mut zoomed = state.clone();
                    if zoomed.open_zoom(catalogue, image).is_ok() {
                        html.push_str(&format!(
                            "<a class=\"schema\" href=\"{}\" title=\"Cliquer pour agrandir\"><img src=\"{}\" alt=\"Schéma {}\"></a>\n",
                            escape(&href(&zoomed)),
                            escape(image),
                            escape(&record.title)
                        ));
                    }
                }
            }
            DetailSection::ProtocolDocument(doc) => {
                html.push_str(&format!(
                    "<div class=\"panel\"><b>{}</b><p><a class=\"pdf\" href=\"{}\" target=\"_blank\" rel=\"noreferrer\">Ouvrir le PDF</a></p><small>(S’ouvre dans un nouvel onglet)</small></div>\n",
                    section.heading(),
                    escape(doc)
                ));
            }
            DetailSection::Contact { name, phone } => {
                html.push_str(&format!(
                    "<div class=\"panel\"><b>{}</b><div>{}</div><div>{}</div></div>\n",
                    section.heading(),
                    escape(name),
                    escape(phone)
                ));
            }
            DetailSection::Design(text) | DetailSection::Population(text) => {
                html.push_str(&format!(
                    "<b>{}</b>\n<p>{}</p>\n",
                    section.heading(),
                    escape(text)
                ));
            }
            DetailSection::PrimaryEndpoints(items)
            | DetailSection::SecondaryEndpoints(items)
            | DetailSection::Inclusion(items)
            | DetailSection::Exclusion(items) => {
                html.push_str(&format!("<b>{}</b>\n<ul>\n", section.heading()));
                for item in items {
                    html.push_str(&format!("<li>{}</li>\n", escape(item)));
                }
                html.push_str("</ul>\n");
            }
        }
        html.push_str("</section>\n");
    }
    close_modal(html);
}

fn render_zoom(html: &mut String, state: &BrowserState, record: &ProtocolRecord, image: &str) {
    let mut back = state.clone();
    back.close_zoom();
    open_modal(html, "zoom", &href(&back));
    html.push_str(&format!(
        "<img src=\"{}\" alt=\"Schéma {} (zoom)\" style=\"width:100%;height:auto\">\n",
        escape(image),
        escape(&record.title)
    ));
    close_modal(html);
}

fn open_modal(html: &mut String, kind: &str, dismiss: &str) {
    let dismiss = escape(dismiss);
    html.push_str(&format!(
        "<div class=\"overlay\" id=\"{kind}\">\n<a class=\"backdrop\" href=\"{dismiss}\" aria-label=\"Fermer\"></a>\n<div class=\"modal\">\n<a class=\"close\" href=\"{dismiss}\" aria-label=\"Fermer\">✕</a>\n<div class=\"modal-body\">\n"
    ));
}

fn close_modal(html: &mut String) {
    html.push_str("</div>\n</div>\n</div>\n");
}

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
