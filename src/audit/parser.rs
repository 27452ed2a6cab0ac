//! HTML signal extraction
//!
//! This module reduces one HTML page to the handful of signals the scoring
//! rubric looks at:
//! - Title, meta description, headings and canonical link
//! - JSON-LD types and Open Graph tags
//! - Viewport, language, image alt coverage and word count
//! - Internal and external links

use crate::url::same_site;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Interrogative words that mark a heading as a question
const QUESTION_WORDS: &[&str] = &[
    "how", "what", "why", "when", "where", "who", "which", "can", "does", "is", "should",
];

/// Signals extracted from one HTML page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageSignals {
    /// URL the page was served from (after redirects)
    pub url: String,
    pub https: bool,
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub h1_count: usize,
    /// Number of `<h2>` and `<h3>` headings
    pub subheading_count: usize,
    /// Headings phrased as a question
    pub question_headings: usize,
    pub canonical: Option<String>,
    /// `@type` values found in JSON-LD blocks, deduplicated and sorted
    pub json_ld_types: Vec<String>,
    /// `og:` properties present with a non-empty content
    pub open_graph: Vec<String>,
    pub has_viewport: bool,
    pub lang: Option<String>,
    pub images: usize,
    pub images_with_alt: usize,
    pub word_count: usize,
    /// Number of `<ul>`/`<ol>` lists with at least one item
    pub lists: usize,
    /// Same-site links, absolute and without fragment
    pub internal_links: Vec<String>,
    /// Links pointing to other sites
    pub external_links: Vec<String>,
}

impl PageSignals {
    pub fn has_json_ld_type(&self, names: &[&str]) -> bool {
        self.json_ld_types.iter().any(|t| names.contains(&t.as_str()))
    }

    pub fn has_open_graph(&self, property: &str) -> bool {
        self.open_graph.iter().any(|p| p == property)
    }
}

/// Parses an HTML document into [`PageSignals`]
///
/// # Example
///
/// ```
/// use rivalscope::audit::parse_page;
/// use url::Url;
///
/// let html = r#"<html lang="en"><head><title>Pricing</title></head>
///     <body><h1>Plans</h1><a href="/faq">FAQ</a></body></html>"#;
/// let base = Url::parse("https://example.com/pricing").unwrap();
/// let page = parse_page(html, &base);
/// assert_eq!(page.title.as_deref(), Some("Pricing"));
/// assert_eq!(page.internal_links, vec!["https://example.com/faq".to_string()]);
/// ```
pub fn parse_page(html: &str, base_url: &Url) -> PageSignals {
    let document = Html::parse_document(html);

    let headings = select_all(&document, "h1, h2, h3, h4");
    let question_headings = headings
        .iter()
        .filter(|h| is_question(&element_text(h)))
        .count();

    let (images, images_with_alt) = image_alt_coverage(&document);
    let (internal_links, external_links) = extract_links(&document, base_url);

    PageSignals {
        url: base_url.to_string(),
        https: base_url.scheme() == "https",
        title: select_all(&document, "title")
            .first()
            .map(element_text)
            .filter(|s| !s.is_empty()),
        meta_description: meta_content(&document, "meta[name='description']"),
        h1_count: select_all(&document, "h1").len(),
        subheading_count: select_all(&document, "h2, h3").len(),
        question_headings,
        canonical: select_all(&document, "link[rel='canonical'][href]")
            .first()
            .and_then(|e| e.value().attr("href"))
            .and_then(|href| base_url.join(href.trim()).ok())
            .map(|u| u.to_string()),
        json_ld_types: extract_json_ld_types(&document),
        open_graph: extract_open_graph(&document),
        has_viewport: !select_all(&document, "meta[name='viewport']").is_empty(),
        lang: select_all(&document, "html[lang]")
            .first()
            .and_then(|e| e.value().attr("lang"))
            .map(|l| l.trim().to_lowercase())
            .filter(|l| !l.is_empty()),
        images,
        images_with_alt,
        word_count: count_words(&document),
        lists: select_all(&document, "ul, ol")
            .iter()
            .filter(|list| list.children().filter_map(ElementRef::wrap).any(|c| c.value().name() == "li"))
            .count(),
        internal_links,
        external_links,
    }
}

fn select_all<'a>(document: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => document.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn meta_content(document: &Html, css: &str) -> Option<String> {
    select_all(document, css)
        .first()
        .and_then(|e| e.value().attr("content"))
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}

fn is_question(text: &str) -> bool {
    let text = text.trim();
    if text.ends_with('?') {
        return true;
    }
    let first = text
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_lowercase();
    QUESTION_WORDS.contains(&first.as_str())
}

fn image_alt_coverage(document: &Html) -> (usize, usize) {
    let images = select_all(document, "img");
    let with_alt = images
        .iter()
        .filter(|img| {
            img.value()
                .attr("alt")
                .map_or(false, |alt| !alt.trim().is_empty())
        })
        .count();
    (images.len(), with_alt)
}

/// Counts words of visible body text, skipping script and style contents
fn count_words(document: &Html) -> usize {
    let Some(body) = select_all(document, "body").into_iter().next() else {
        return 0;
    };

    body.descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let hidden = node
                .parent()
                .and_then(|parent| parent.value().as_element().map(|e| e.name()))
                .map_or(false, |name| matches!(name, "script" | "style" | "noscript" | "template"));
            if hidden {
                None
            } else {
                Some(text.split_whitespace().count())
            }
        })
        .sum()
}

fn extract_json_ld_types(document: &Html) -> Vec<String> {
    let mut types = Vec::new();
    for script in select_all(document, "script[type='application/ld+json']") {
        let raw: String = script.text().collect();
        // Malformed blocks are ignored; search engines do the same
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(&raw) {
            collect_types(&value, &mut types);
        }
    }
    types.sort();
    types.dedup();
    types
}

fn collect_types(value: &serde_json::Value, types: &mut Vec<String>) {
    match value {
        serde_json::Value::Array(items) => {
            for item in items {
                collect_types(item, types);
            }
        }
        serde_json::Value::Object(map) => {
            match map.get("@type") {
                Some(serde_json::Value::String(name)) => types.push(name.clone()),
                Some(serde_json::Value::Array(names)) => {
                    types.extend(names.iter().filter_map(|n| n.as_str().map(String::from)));
                }
                _ => {}
            }
            if let Some(graph) = map.get("@graph") {
                collect_types(graph, types);
            }
            if let Some(entities) = map.get("mainEntity") {
                collect_types(entities, types);
            }
        }
        _ => {}
    }
}

fn extract_open_graph(document: &Html) -> Vec<String> {
    let mut properties: Vec<String> = select_all(document, "meta[property]")
        .iter()
        .filter(|meta| {
            meta.value()
                .attr("content")
                .map_or(false, |c| !c.trim().is_empty())
        })
        .filter_map(|meta| meta.value().attr("property"))
        .map(|p| p.trim().to_lowercase())
        .filter(|p| p.starts_with("og:"))
        .collect();
    properties.sort();
    properties.dedup();
    properties
}

/// Splits `<a href>` targets into same-site and external links
///
/// Skips `javascript:`, `mailto:`, `tel:` and `data:` targets, fragment-only
/// anchors and download links. Both lists are deduplicated in document order.
fn extract_links(document: &Html, base_url: &Url) -> (Vec<String>, Vec<String>) {
    let mut internal: Vec<String> = Vec::new();
    let mut external: Vec<String> = Vec::new();

    for anchor in select_all(document, "a[href]") {
        if anchor.value().attr("download").is_some() {
            continue;
        }
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Some(link) = resolve_link(href, base_url) else {
            continue;
        };

        let target = if same_site(base_url, &link) {
            &mut internal
        } else {
            &mut external
        };
        let link = link.to_string();
        if !target.contains(&link) {
            target.push(link);
        }
    }

    (internal, external)
}

fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let lower = href.to_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    let mut url = base_url.join(href).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r##"<!DOCTYPE html>
<html lang="en-US">
<head>
  <title> Acme Widgets </title>
  <meta name="description" content="Widgets for every workshop.">
  <meta name="viewport" content="width=device-width">
  <meta property="og:title" content="Acme">
  <meta property="og:image" content="">
  <link rel="canonical" href="/widgets">
  <script type="application/ld+json">
    {"@context": "https://schema.org", "@graph": [{"@type": "Organization"}, {"@type": "FAQPage"}]}
  </script>
  <script type="application/ld+json">not json</script>
</head>
<body>
  <h1>Widgets</h1>
  <h2>How do widgets work?</h2>
  <h3>Pricing</h3>
  <p>Our widgets are sturdy and cheap.</p>
  <script>var hidden = "not counted words here";</script>
  <ul><li>One</li></ul>
  <ol></ol>
  <img src="a.png" alt="A widget">
  <img src="b.png" alt=" ">
  <a href="/about#team">About</a>
  <a href="https://www.example.com/about">About again</a>
  <a href="https://other.org/">Other</a>
  <a href="mailto:hi@example.com">Mail</a>
  <a href="#top">Top</a>
  <a href="/file.zip" download>File</a>
</body>
</html>"##;

    fn parsed() -> PageSignals {
        let base = Url::parse("https://example.com/widgets").unwrap();
        parse_page(PAGE, &base)
    }

    #[test]
    fn test_head_signals() {
        let page = parsed();
        assert!(page.https);
        assert_eq!(page.title.as_deref(), Some("Acme Widgets"));
        assert_eq!(
            page.meta_description.as_deref(),
            Some("Widgets for every workshop.")
        );
        assert!(page.has_viewport);
        assert_eq!(page.lang.as_deref(), Some("en-us"));
        assert_eq!(page.canonical.as_deref(), Some("https://example.com/widgets"));
    }

    #[test]
    fn test_structured_data_signals() {
        let page = parsed();
        assert_eq!(page.json_ld_types, vec!["FAQPage", "Organization"]);
        assert!(page.has_json_ld_type(&["FAQPage"]));
        // og:image has empty content
        assert_eq!(page.open_graph, vec!["og:title"]);
        assert!(page.has_open_graph("og:title"));
    }

    #[test]
    fn test_body_signals() {
        let page = parsed();
        assert_eq!(page.h1_count, 1);
        assert_eq!(page.subheading_count, 2);
        assert_eq!(page.question_headings, 1);
        assert_eq!(page.lists, 1);
        assert_eq!(page.images, 2);
        assert_eq!(page.images_with_alt, 1);
        assert!(page.word_count >= 10);
        assert!(page.word_count < 30);
    }

    #[test]
    fn test_links_split_and_deduplicated() {
        let page = parsed();
        assert_eq!(
            page.internal_links,
            vec![
                "https://example.com/about".to_string(),
                "https://www.example.com/about".to_string(),
            ]
        );
        assert_eq!(page.external_links, vec!["https://other.org/".to_string()]);
    }

    #[test]
    fn test_empty_document() {
        let base = Url::parse("http://example.com/").unwrap();
        let page = parse_page("", &base);
        assert!(!page.https);
        assert_eq!(page.title, None);
        assert_eq!(page.word_count, 0);
        assert!(page.internal_links.is_empty());
    }

    #[test]
    fn test_is_question() {
        assert!(is_question("Pricing?"));
        assert!(is_question("What is AEO"));
        assert!(!is_question("Pricing"));
        assert!(!is_question(""));
    }
}
