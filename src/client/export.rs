//! Export actions over a generated roadmap. All of them work on the text as
//! received; nothing is parsed beyond markdown rendering for print.

use crate::models::Goal;
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub file_name: String,
    pub content: String,
}

/// `<goal>-roadmap.md` with the roadmap text verbatim.
pub fn markdown_file(goal: Goal, roadmap: &str) -> ExportFile {
    ExportFile {
        file_name: format!("{}-roadmap.md", goal.label().to_lowercase()),
        content: roadmap.to_string(),
    }
}

pub fn clipboard_text(roadmap: &str) -> String {
    roadmap.to_string()
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_text(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Destinations allowed into `href`/`src`: http(s), mailto and relative paths.
fn is_safe_url(dest: &str) -> bool {
    let compact: String = dest
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_control())
        .collect();
    let scheme_end = compact.find(|c| matches!(c, ':' | '/' | '?' | '#'));

    match scheme_end {
        Some(i) if compact[i..].starts_with(':') => {
            let scheme = compact[..i].to_ascii_lowercase();
            matches!(scheme.as_str(), "http" | "https" | "mailto")
        }
        _ => true,
    }
}

/// Markdown to HTML; every link opens in a new tab.
///
/// Raw HTML in the source is escaped and shown as text. Links and images with
/// any other scheme keep their text but lose the element.
pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut dropped: Vec<bool> = Vec::new();
    let events = Parser::new_ext(markdown, options).filter_map(|event| match event {
        Event::Html(raw) => Some(Event::Text(raw)),
        Event::Start(Tag::Link(_, dest, title)) => {
            let unsafe_dest = !is_safe_url(&dest);
            dropped.push(unsafe_dest);
            if unsafe_dest {
                return None;
            }
            let title = if title.is_empty() {
                String::new()
            } else {
                format!(" title=\"{}\"", escape_attr(&title))
            };
            Some(Event::Html(CowStr::from(format!(
                "<a href=\"{}\"{} target=\"_blank\" rel=\"noopener noreferrer\">",
                escape_attr(&dest),
                title
            ))))
        }
        Event::End(Tag::Link(..)) => match dropped.pop() {
            Some(true) => None,
            _ => Some(Event::Html(CowStr::Borrowed("</a>"))),
        },
        Event::Start(Tag::Image(kind, dest, title)) => {
            let unsafe_dest = !is_safe_url(&dest);
            dropped.push(unsafe_dest);
            (!unsafe_dest).then(|| Event::Start(Tag::Image(kind, dest, title)))
        }
        Event::End(Tag::Image(kind, dest, title)) => match dropped.pop() {
            Some(true) => None,
            _ => Some(Event::End(Tag::Image(kind, dest, title))),
        },
        other => Some(other),
    });

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, events);
    out
}

/// Standalone printable document.
pub fn print_html(goal: Goal, roadmap: &str) -> String {
    let goal = escape_text(goal.label());
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{goal} Roadmap</title>
<style>
body {{ font-family: Arial, sans-serif; line-height: 1.6; max-width: 800px; margin: 0 auto; padding: 20px; }}
h1 {{ color: #4338ca; }}
a {{ color: #4f46e5; }}
table {{ border-collapse: collapse; width: 100%; }}
th, td {{ border: 1px solid #ddd; padding: 8px; text-align: left; }}
</style>
</head>
<body>
<h1>Your Personalized {goal} Roadmap</h1>
{body}</body>
</html>
"#,
        body = render_markdown(roadmap)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_file_name_and_content() {
        let file = markdown_file(Goal::Jee, "# Plan\n- Day 1");
        assert_eq!(file.file_name, "jee-roadmap.md");
        assert_eq!(file.content, "# Plan\n- Day 1");
    }

    #[test]
    fn test_links_open_in_new_tab() {
        let html = render_markdown("See [NCERT](https://ncert.nic.in \"Books\").");
        assert!(html.contains(
            r#"<a href="https://ncert.nic.in" title="Books" target="_blank" rel="noopener noreferrer">NCERT</a>"#
        ));
    }

    #[test]
    fn test_print_document_wraps_rendered_roadmap() {
        let doc = print_html(Goal::Upsc, "# Plan\n\n| Day | Topic |\n|---|---|\n| 1 | Polity |");
        assert!(doc.contains("<title>UPSC Roadmap</title>"));
        assert!(doc.contains("<h1>Your Personalized UPSC Roadmap</h1>"));
        assert!(doc.contains("<h1>Plan</h1>"));
        assert!(doc.contains("<td>Polity</td>"));
    }

    #[test]
    fn test_model_html_and_script_links_are_neutralised() {
        let doc = print_html(
            Goal::Jee,
            "<script>alert(1)</script>\n\nSee [x](javascript:alert(2)) and \
             [y](JaVaScRiPt:alert(3)) then ![img](javascript:alert(4)) <b onclick=\"go()\">b</b>",
        );

        assert!(!doc.contains("<script"));
        assert!(!doc.to_ascii_lowercase().contains("javascript:"));
        assert!(!doc.contains("<b onclick"));
        assert!(doc.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(doc.contains("See x and y"));
    }

    #[test]
    fn test_safe_destinations_keep_their_links() {
        let html = render_markdown("[a](mailto:help@prepwise.in) [b](/syllabus#physics) [c](http://x.in)");
        assert!(html.contains(r#"<a href="mailto:help@prepwise.in""#));
        assert!(html.contains(r#"<a href="/syllabus#physics""#));
        assert!(html.contains(r#"<a href="http://x.in""#));
        assert!(!is_safe_url("data:text/html,hi"));
        assert!(!is_safe_url(" java\tscript:alert(1)"));
    }

    #[test]
    fn test_clipboard_is_verbatim() {
        assert_eq!(clipboard_text("  raw *text*\n"), "  raw *text*\n");
    }
}
