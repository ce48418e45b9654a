//! Report document rendering
//!
//! Turns the ordered section records into a styled document. The renderer
//! trait is the collaborator boundary; the shipped implementation converts
//! section Markdown (tables enabled) to HTML and fills a fixed template. A
//! PDF engine slots in behind the same trait.

use crate::models::{AssessmentMarker, StoredSection};
use chrono::Utc;
use pulldown_cmark::{html, Options, Parser};

/// One section handed to the renderer, in document order.
#[derive(Debug, Clone)]
pub struct RenderSection {
    pub id: String,
    pub title: String,
    pub content: String,
}

impl From<&StoredSection> for RenderSection {
    fn from(section: &StoredSection) -> Self {
        Self {
            id: format!("section_{}", section.position),
            title: section.title.clone(),
            content: section.content.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub file_extension: &'static str,
}

/// Document rendering collaborator.
pub trait DocumentRenderer: Send + Sync {
    fn render(
        &self,
        title: &str,
        prepared_for: &str,
        sections: &[RenderSection],
    ) -> crate::Result<RenderedDocument>;
}

/// Convert section Markdown to HTML with the tables extension.
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);

    let parser = Parser::new_ext(markdown, options);
    let mut out = String::with_capacity(markdown.len() * 2);
    html::push_html(&mut out, parser);
    out
}

/// Wrap each recognized assessment marker in a status-classed span so the
/// stylesheet can color it. Unrecognized symbols pass through untouched.
pub fn tag_assessment_markers(html: &str) -> String {
    let mut tagged = html.to_string();
    for marker in AssessmentMarker::all() {
        tagged = tagged.replace(
            marker.emoji(),
            &format!(
                r#"<span class="{}">{}</span>"#,
                marker.css_class(),
                marker.emoji()
            ),
        );
    }
    tagged
}

const DOCUMENT_STYLES: &str = "\
body { font-family: Georgia, serif; margin: 2.5rem 3rem; color: #1c2430; }
header { border-bottom: 2px solid #1c2430; margin-bottom: 2rem; padding-bottom: 1rem; }
header .meta { color: #5a6572; font-size: 0.9rem; }
section { margin-bottom: 2.5rem; page-break-inside: avoid; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid #c8cdd4; padding: 0.4rem 0.6rem; text-align: left; }
.assessment-strong { color: #1a7f37; }
.assessment-moderate { color: #9a6700; }
.assessment-weak { color: #cf222e; }
";

/// Renders the report as a styled, self-contained HTML document.
pub struct HtmlRenderer;

impl DocumentRenderer for HtmlRenderer {
    fn render(
        &self,
        title: &str,
        prepared_for: &str,
        sections: &[RenderSection],
    ) -> crate::Result<RenderedDocument> {
        let date = Utc::now().format("%b %d, %Y");

        let mut body = String::new();
        for section in sections {
            let content_html = tag_assessment_markers(&markdown_to_html(&section.content));
            body.push_str(&format!(
                "<section id=\"{}\">\n<h2>{}</h2>\n{}\n</section>\n",
                section.id, section.title, content_html
            ));
        }

        let document = format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n\
             <style>\n{styles}</style>\n</head>\n<body>\n<header>\n<h1>{title}</h1>\n\
             <p class=\"meta\">Prepared for {prepared_for} \u{2022} {date}</p>\n</header>\n\
             {body}</body>\n</html>\n",
            title = title,
            styles = DOCUMENT_STYLES,
            prepared_for = prepared_for,
            date = date,
            body = body,
        );

        Ok(RenderedDocument {
            bytes: document.into_bytes(),
            content_type: "text/html; charset=utf-8",
            file_extension: "html",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_tables_render() {
        let html = markdown_to_html(
            "| Factor | Assessment |\n| ----- | ----- |\n| Traction | Strong |\n",
        );
        assert!(html.contains("<table>"));
        assert!(html.contains("<td>Strong</td>"));
    }

    #[test]
    fn test_assessment_markers_are_tagged() {
        let html = tag_assessment_markers("<td>\u{1F7E2} Strong</td><td>\u{1F7E1} Moderate</td>");
        assert!(html.contains(r#"<span class="assessment-strong">"#));
        assert!(html.contains(r#"<span class="assessment-moderate">"#));
    }

    #[test]
    fn test_html_renderer_document_shape() {
        let sections = vec![
            RenderSection {
                id: "section_1".to_string(),
                title: "Section 1: Executive Summary & Investment Rationale".to_string(),
                content: "### Overview\n\nStrong traction \u{1F7E2}".to_string(),
            },
            RenderSection {
                id: "section_2".to_string(),
                title: "Section 2: Market Opportunity & Competitive Landscape".to_string(),
                content: "Market prose.".to_string(),
            },
        ];

        let rendered = HtmlRenderer
            .render("Acme Investment Report", "Acme", &sections)
            .unwrap();
        let document = String::from_utf8(rendered.bytes).unwrap();

        assert!(document.contains("<h1>Acme Investment Report</h1>"));
        assert!(document.contains("id=\"section_1\""));
        assert!(document.contains("Section 2: Market Opportunity"));
        assert!(document.contains("assessment-strong"));
        assert_eq!(rendered.file_extension, "html");
    }
}
