//! On-page SEO heuristics
//!
//! Five independent checks over a fetched page: title length, meta
//! description length, H1 count, image alt coverage and HTTPS usage.
//! Every check always populates; none can abort the others.

use reqwest::Client;
use scraper::{Html, Selector};
use serde::Serialize;

use crate::fetch::{self, FetchError};
use crate::url_utils::ensure_scheme;

/// Recommended maximum title length in characters.
pub const TITLE_MAX_LEN: usize = 60;
/// Recommended maximum meta-description length in characters.
pub const META_DESCRIPTION_MAX_LEN: usize = 160;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

/// Outcome of a single heuristic.
#[derive(Debug, Clone, Serialize)]
pub struct Check<T> {
    pub value: T,
    pub status: CheckStatus,
    pub message: String,
}

/// Full report for one page check.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoReport {
    pub url: String,
    pub title: Check<String>,
    pub meta_description: Check<String>,
    pub headings: Check<usize>,
    pub images: Check<String>,
    pub ssl: Check<bool>,
}

/// Fetch a page and run all five checks against it.
pub async fn analyze_page(client: &Client, url: &str) -> Result<SeoReport, FetchError> {
    let formatted = ensure_scheme(url);
    let html = fetch::fetch_text(client, &formatted).await?;
    let document = Html::parse_document(&html);

    Ok(SeoReport {
        title: check_title(&document),
        meta_description: check_meta_description(&document),
        headings: check_headings(&document),
        images: check_images(&document),
        ssl: check_ssl(&formatted),
        url: formatted,
    })
}

pub fn check_title(document: &Html) -> Check<String> {
    let selector = Selector::parse("title").expect("invalid title selector");
    let title: String = document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>())
        .unwrap_or_default();
    let len = title.chars().count();

    let (status, message) = if len == 0 {
        (CheckStatus::Warning, "Missing title tag")
    } else if len > TITLE_MAX_LEN {
        (
            CheckStatus::Warning,
            "Title tag is too long (over 60 characters)",
        )
    } else {
        (
            CheckStatus::Ok,
            "Title tag is present and within recommended length",
        )
    };

    Check {
        value: title,
        status,
        message: message.to_string(),
    }
}

pub fn check_meta_description(document: &Html) -> Check<String> {
    let selector =
        Selector::parse("meta[name='description']").expect("invalid meta selector");
    let description: String = document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .unwrap_or_default()
        .to_string();
    let len = description.chars().count();

    let (status, message) = if len == 0 {
        (CheckStatus::Warning, "Missing meta description")
    } else if len > META_DESCRIPTION_MAX_LEN {
        (
            CheckStatus::Warning,
            "Meta description is too long (over 160 characters)",
        )
    } else {
        (
            CheckStatus::Ok,
            "Meta description is present and within recommended length",
        )
    };

    Check {
        value: description,
        status,
        message: message.to_string(),
    }
}

pub fn check_headings(document: &Html) -> Check<usize> {
    let selector = Selector::parse("h1").expect("invalid h1 selector");
    let h1_count = document.select(&selector).count();

    let (status, message) = match h1_count {
        0 => (CheckStatus::Warning, "No H1 tag found".to_string()),
        1 => (CheckStatus::Ok, "Single H1 tag found".to_string()),
        _ => (CheckStatus::Warning, "Multiple H1 tags found".to_string()),
    };

    Check {
        value: h1_count,
        status,
        message,
    }
}

pub fn check_images(document: &Html) -> Check<String> {
    let selector = Selector::parse("img").expect("invalid img selector");
    let mut total = 0usize;
    let mut with_alt = 0usize;
    for img in document.select(&selector) {
        total += 1;
        if img.value().attr("alt").is_some_and(|alt| !alt.is_empty()) {
            with_alt += 1;
        }
    }
    let missing = total - with_alt;

    let (status, message) = if missing == 0 {
        (CheckStatus::Ok, "All images have alt text".to_string())
    } else {
        (
            CheckStatus::Warning,
            format!("{missing} image(s) missing alt text"),
        )
    };

    Check {
        value: format!("{with_alt}/{total}"),
        status,
        message,
    }
}

pub fn check_ssl(url: &str) -> Check<bool> {
    let is_https = url.starts_with("https");
    let (status, message) = if is_https {
        (CheckStatus::Ok, "HTTPS is enabled")
    } else {
        (CheckStatus::Warning, "Site is not using HTTPS")
    };

    Check {
        value: is_https,
        status,
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_with_title(title: &str) -> Html {
        Html::parse_document(&format!("<html><head><title>{title}</title></head></html>"))
    }

    #[test]
    fn title_boundaries_are_inclusive() {
        let empty = Html::parse_document("<html><head></head></html>");
        assert_eq!(check_title(&empty).status, CheckStatus::Warning);
        assert_eq!(check_title(&empty).message, "Missing title tag");

        let one = page_with_title(&"a".repeat(1));
        assert_eq!(check_title(&one).status, CheckStatus::Ok);

        let sixty = page_with_title(&"a".repeat(60));
        assert_eq!(check_title(&sixty).status, CheckStatus::Ok);

        let sixty_one = page_with_title(&"a".repeat(61));
        let check = check_title(&sixty_one);
        assert_eq!(check.status, CheckStatus::Warning);
        assert!(check.message.contains("too long"));
    }

    #[test]
    fn meta_description_boundaries() {
        let missing = Html::parse_document("<html><head></head></html>");
        assert_eq!(check_meta_description(&missing).status, CheckStatus::Warning);

        let ok = Html::parse_document(&format!(
            "<html><head><meta name=\"description\" content=\"{}\"></head></html>",
            "d".repeat(160)
        ));
        assert_eq!(check_meta_description(&ok).status, CheckStatus::Ok);

        let long = Html::parse_document(&format!(
            "<html><head><meta name=\"description\" content=\"{}\"></head></html>",
            "d".repeat(161)
        ));
        assert_eq!(check_meta_description(&long).status, CheckStatus::Warning);
    }

    #[test]
    fn heading_counts() {
        let none = Html::parse_document("<html><body><h2>x</h2></body></html>");
        assert_eq!(check_headings(&none).status, CheckStatus::Warning);
        assert_eq!(check_headings(&none).value, 0);

        let single = Html::parse_document("<html><body><h1>x</h1></body></html>");
        assert_eq!(check_headings(&single).status, CheckStatus::Ok);

        let multiple = Html::parse_document("<html><body><h1>a</h1><h1>b</h1></body></html>");
        let check = check_headings(&multiple);
        assert_eq!(check.status, CheckStatus::Warning);
        assert_eq!(check.message, "Multiple H1 tags found");
    }

    #[test]
    fn images_report_alt_coverage() {
        let html = Html::parse_document(
            "<html><body>\
             <img src=\"a.png\" alt=\"a\">\
             <img src=\"b.png\" alt=\"b\">\
             <img src=\"c.png\">\
             </body></html>",
        );
        let check = check_images(&html);
        assert_eq!(check.value, "2/3");
        assert_eq!(check.status, CheckStatus::Warning);
        assert_eq!(check.message, "1 image(s) missing alt text");
    }

    #[test]
    fn empty_alt_counts_as_missing() {
        let html = Html::parse_document("<html><body><img src=\"a.png\" alt=\"\"></body></html>");
        assert_eq!(check_images(&html).value, "0/1");
    }

    #[test]
    fn no_images_is_ok() {
        let html = Html::parse_document("<html><body></body></html>");
        let check = check_images(&html);
        assert_eq!(check.value, "0/0");
        assert_eq!(check.status, CheckStatus::Ok);
    }

    #[test]
    fn ssl_follows_scheme() {
        assert_eq!(check_ssl("https://example.com").status, CheckStatus::Ok);
        assert_eq!(check_ssl("http://example.com").status, CheckStatus::Warning);
    }
}
