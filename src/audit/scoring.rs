//! Signal rubric: per-page signals to six dimension scores
//!
//! | Dimension | Max | Looks at |
//! |-----------|-----|----------|
//! | seo | 25 | title, meta description, single H1, canonical, lang |
//! | aeo | 20 | question headings, FAQ/HowTo/QA schema, lists, subheadings |
//! | structured-data | 15 | JSON-LD presence and variety, Open Graph tags |
//! | content | 15 | word count, image alt coverage, subheadings |
//! | technical | 15 | HTTPS, viewport, healthy responses, robots.txt |
//! | link-profile | 10 | internal links per page, outbound references |
//!
//! Page-level points are averaged over every crawled page with half-up
//! rounding, so the same crawl always yields the same scores.

use crate::audit::parser::PageSignals;
use crate::model::{AuditIssue, Dimension, DimensionScore};
use std::collections::BTreeMap;

const SEO_MAX: u32 = 25;
const AEO_MAX: u32 = 20;
const STRUCTURED_DATA_MAX: u32 = 15;
const CONTENT_MAX: u32 = 15;
const TECHNICAL_MAX: u32 = 15;
const LINK_PROFILE_MAX: u32 = 10;

const ANSWER_SCHEMA_TYPES: &[&str] = &["FAQPage", "QAPage", "HowTo", "Question"];

/// Everything the rubric needs to know about one crawled site
#[derive(Debug, Clone, Default)]
pub struct SiteCrawl {
    pub pages: Vec<PageSignals>,
    /// Same-site URLs that were attempted but did not yield an HTML page
    pub failed_fetches: u32,
    pub robots_found: bool,
}

/// Scores a crawled site
///
/// Returns the six dimension scores and the issues worth reporting. A crawl
/// without pages scores zero everywhere.
pub fn score_site(crawl: &SiteCrawl) -> (BTreeMap<Dimension, DimensionScore>, Vec<AuditIssue>) {
    let pages = &crawl.pages;

    let mut dimensions = BTreeMap::new();
    dimensions.insert(
        Dimension::Seo,
        DimensionScore::new(average(pages, seo_points), SEO_MAX),
    );
    dimensions.insert(
        Dimension::Aeo,
        DimensionScore::new(average(pages, aeo_points), AEO_MAX),
    );
    dimensions.insert(
        Dimension::StructuredData,
        DimensionScore::new(average(pages, structured_data_points), STRUCTURED_DATA_MAX),
    );
    dimensions.insert(
        Dimension::Content,
        DimensionScore::new(average(pages, content_points), CONTENT_MAX),
    );
    dimensions.insert(
        Dimension::Technical,
        DimensionScore::new(technical_points(crawl), TECHNICAL_MAX),
    );
    dimensions.insert(
        Dimension::LinkProfile,
        DimensionScore::new(average(pages, link_points), LINK_PROFILE_MAX),
    );

    (dimensions, collect_issues(crawl))
}

fn average(pages: &[PageSignals], points: fn(&PageSignals) -> u32) -> u32 {
    if pages.is_empty() {
        return 0;
    }
    let n = pages.len() as u32;
    let sum: u32 = pages.iter().map(points).sum();
    (sum + n / 2) / n
}

fn ratio_points(part: usize, whole: usize, max: u32) -> u32 {
    if whole == 0 {
        return 0;
    }
    let (part, whole) = (part as u32, whole as u32);
    (part * max + whole / 2) / whole
}

fn seo_points(page: &PageSignals) -> u32 {
    let mut points = 0;
    if let Some(title) = &page.title {
        points += 5;
        if (10..=70).contains(&title.chars().count()) {
            points += 3;
        }
    }
    if let Some(description) = &page.meta_description {
        points += 4;
        if (50..=160).contains(&description.chars().count()) {
            points += 3;
        }
    }
    if page.h1_count == 1 {
        points += 5;
    }
    if page.canonical.is_some() {
        points += 3;
    }
    if page.lang.is_some() {
        points += 2;
    }
    points
}

fn aeo_points(page: &PageSignals) -> u32 {
    let mut points = match page.question_headings {
        0 => 0,
        1 | 2 => 6,
        _ => 8,
    };
    if page.has_json_ld_type(ANSWER_SCHEMA_TYPES) {
        points += 6;
    }
    if page.lists > 0 {
        points += 3;
    }
    if page.subheading_count >= 2 {
        points += 3;
    }
    points
}

fn structured_data_points(page: &PageSignals) -> u32 {
    let mut points = 0;
    if !page.json_ld_types.is_empty() {
        points += 7;
        if page.json_ld_types.len() >= 2 {
            points += 3;
        }
    }
    if page.has_open_graph("og:title") {
        points += 2;
    }
    if page.has_open_graph("og:description") {
        points += 1;
    }
    if page.has_open_graph("og:image") {
        points += 2;
    }
    points
}

fn content_points(page: &PageSignals) -> u32 {
    let words = match page.word_count {
        0..=99 => 0,
        100..=299 => 3,
        300..=799 => 6,
        _ => 9,
    };
    // A page without images loses nothing on alt text
    let alt = if page.images == 0 {
        3
    } else {
        ratio_points(page.images_with_alt, page.images, 3)
    };
    let structure = if page.subheading_count >= 3 { 3 } else { 0 };
    words + alt + structure
}

fn link_points(page: &PageSignals) -> u32 {
    let internal = match page.internal_links.len() {
        0 => 0,
        1..=4 => 2,
        _ => 5,
    };
    let external = match page.external_links.len() {
        0 => 0,
        1 | 2 => 3,
        _ => 5,
    };
    internal + external
}

fn technical_points(crawl: &SiteCrawl) -> u32 {
    let Some(start) = crawl.pages.first() else {
        return 0;
    };

    let mut points = 0;
    if start.https {
        points += 5;
    }
    let with_viewport = crawl.pages.iter().filter(|p| p.has_viewport).count();
    points += ratio_points(with_viewport, crawl.pages.len(), 4);
    let attempted = crawl.pages.len() + crawl.failed_fetches as usize;
    points += ratio_points(crawl.pages.len(), attempted, 3);
    if crawl.robots_found {
        points += 3;
    }
    points
}

fn collect_issues(crawl: &SiteCrawl) -> Vec<AuditIssue> {
    let pages = &crawl.pages;
    let total = pages.len();
    let mut issues = Vec::new();

    let mut check = |code: &str, dimension: Dimension, what: &str, missing: usize| {
        if missing > 0 {
            issues.push(AuditIssue {
                code: code.to_string(),
                message: format!("{} of {} pages {}", missing, total, what),
                dimension: Some(dimension),
            });
        }
    };

    check(
        "missing-title",
        Dimension::Seo,
        "have no <title>",
        pages.iter().filter(|p| p.title.is_none()).count(),
    );
    check(
        "missing-meta-description",
        Dimension::Seo,
        "have no meta description",
        pages.iter().filter(|p| p.meta_description.is_none()).count(),
    );
    check(
        "h1-count",
        Dimension::Seo,
        "do not have exactly one <h1>",
        pages.iter().filter(|p| p.h1_count != 1).count(),
    );
    check(
        "no-question-headings",
        Dimension::Aeo,
        "have no question-style headings",
        pages.iter().filter(|p| p.question_headings == 0).count(),
    );
    check(
        "missing-json-ld",
        Dimension::StructuredData,
        "have no JSON-LD markup",
        pages.iter().filter(|p| p.json_ld_types.is_empty()).count(),
    );
    check(
        "thin-content",
        Dimension::Content,
        "have fewer than 300 words",
        pages.iter().filter(|p| p.word_count < 300).count(),
    );
    check(
        "missing-viewport",
        Dimension::Technical,
        "have no viewport meta tag",
        pages.iter().filter(|p| !p.has_viewport).count(),
    );

    if crawl.failed_fetches > 0 {
        issues.push(AuditIssue {
            code: "failed-fetches".to_string(),
            message: format!("{} linked pages could not be fetched", crawl.failed_fetches),
            dimension: Some(Dimension::Technical),
        });
    }
    if !crawl.robots_found {
        issues.push(AuditIssue {
            code: "missing-robots-txt".to_string(),
            message: "robots.txt was not found".to_string(),
            dimension: Some(Dimension::Technical),
        });
    }

    issues
}
