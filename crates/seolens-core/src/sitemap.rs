//! Sitemap discovery: robots.txt directives, well-known fallbacks and
//! bounded expansion of sitemap-index documents.

use std::future::Future;

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use tracing::{debug, warn};

use crate::fetch::{self, FetchError};
use crate::robots;

/// Hard cap on the number of discovered sitemap URLs. Guards against
/// index cycles and adversarially large site structures; enforced at
/// every insertion and before every fetch.
pub const MAX_SITEMAPS: usize = 100;

/// Well-known sitemap locations probed when robots.txt yields nothing.
const COMMON_SITEMAP_PATHS: &[&str] = &["/sitemap.xml", "/sitemap_index.xml", "/sitemap-index.xml"];

static SITEMAP_ENTRY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<sitemap>.*?<loc>(.*?)</loc>.*?</sitemap>").expect("invalid sitemap regex")
});

/// Ordered set of sitemap URLs, deduplicated by exact string equality
/// and bounded to a maximum cardinality.
#[derive(Debug)]
pub struct SitemapSet {
    urls: Vec<String>,
    cap: usize,
}

impl SitemapSet {
    pub fn new(cap: usize) -> Self {
        Self {
            urls: Vec::new(),
            cap,
        }
    }

    /// Insert a URL, preserving discovery order. Returns false if the
    /// URL is already present or the set has reached its cap.
    pub fn insert(&mut self, url: &str) -> bool {
        if self.is_full() || self.urls.iter().any(|u| u == url) {
            return false;
        }
        self.urls.push(url.to_string());
        true
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.iter().any(|u| u == url)
    }

    pub fn is_full(&self) -> bool {
        self.urls.len() >= self.cap
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn into_urls(self) -> Vec<String> {
        self.urls
    }
}

impl Default for SitemapSet {
    fn default() -> Self {
        Self::new(MAX_SITEMAPS)
    }
}

/// Coarse classification of a fetched sitemap document.
#[derive(Debug, Clone, PartialEq)]
pub enum SitemapDocument {
    /// A sitemap index; carries the child sitemap locations in
    /// document order.
    Index(Vec<String>),
    /// A regular url-set sitemap.
    UrlSet,
    /// Neither marker present; not a sitemap.
    Unknown,
}

/// Classify raw sitemap XML and extract child locations from indexes.
pub fn classify_sitemap(content: &str) -> SitemapDocument {
    if content.contains("<sitemapindex") {
        let children = SITEMAP_ENTRY
            .captures_iter(content)
            .filter_map(|cap| cap.get(1))
            .map(|m| decode_xml_entities(m.as_str().trim()))
            .filter(|loc| !loc.is_empty())
            .collect();
        SitemapDocument::Index(children)
    } else if content.contains("<urlset") {
        SitemapDocument::UrlSet
    } else {
        SitemapDocument::Unknown
    }
}

/// Expand one candidate sitemap URL into `set`.
///
/// Index children are recorded at the moment the walk reaches them and
/// each child's subtree is expanded before its next sibling, so
/// grandchildren land between siblings in the output. Url-set documents
/// record their own URL as a leaf; the seed itself is only recorded
/// when it turns out to be a url-set. A fetch or parse failure of any
/// single candidate is logged and skipped without aborting its
/// siblings. Once `set` is full nothing further is recorded or fetched.
pub async fn expand_sitemap<F, Fut>(seed: &str, fetch: &F, set: &mut SitemapSet)
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<String, FetchError>>,
{
    if set.is_full() {
        return;
    }

    let children = match fetch_and_classify(seed, fetch).await {
        Some(SitemapDocument::Index(children)) => children,
        Some(SitemapDocument::UrlSet) => {
            set.insert(seed);
            return;
        }
        _ => return,
    };

    // Depth-first over discovered children; pushed reversed so pops
    // follow document order.
    let mut pending: Vec<String> = children.into_iter().rev().collect();

    while let Some(url) = pending.pop() {
        if set.is_full() {
            return;
        }
        if set.contains(&url) {
            continue;
        }
        set.insert(&url);
        // The entry that fills the set is recorded but not expanded.
        if set.is_full() {
            return;
        }

        match fetch_and_classify(&url, fetch).await {
            Some(SitemapDocument::Index(children)) => {
                for child in children.into_iter().rev() {
                    pending.push(child);
                }
            }
            // A url-set child was already recorded at discovery.
            Some(SitemapDocument::UrlSet) | Some(SitemapDocument::Unknown) | None => {}
        }
    }
}

async fn fetch_and_classify<F, Fut>(url: &str, fetch: &F) -> Option<SitemapDocument>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<String, FetchError>>,
{
    match fetch(url.to_string()).await {
        Ok(content) => {
            let document = classify_sitemap(&content);
            if document == SitemapDocument::Unknown {
                debug!("{url} is not a sitemap document");
            }
            Some(document)
        }
        Err(e) => {
            warn!("skipping sitemap {url}: {e}");
            None
        }
    }
}

/// Locate the sitemaps of a domain.
///
/// robots.txt `Sitemap:` directives are expanded first, in order of
/// appearance; if none yield anything the well-known locations are
/// probed, stopping at the first that produces a result.
pub async fn discover_sitemaps(client: &Client, domain: &str) -> Vec<String> {
    let mut set = SitemapSet::default();
    let fetch = |url: String| async move { fetch::fetch_text(client, &url).await };

    match robots::fetch_robots_txt(client, domain).await {
        Ok(content) => {
            for directive in robots::extract_sitemap_directives(&content) {
                expand_sitemap(&directive, &fetch, &mut set).await;
                if set.is_full() {
                    break;
                }
            }
        }
        Err(e) => warn!("robots.txt not available for {domain}: {e}"),
    }

    if set.is_empty() {
        debug!("no sitemaps via robots.txt for {domain}, probing well-known paths");
        for path in COMMON_SITEMAP_PATHS {
            let candidate = format!("https://{domain}{path}");
            expand_sitemap(&candidate, &fetch, &mut set).await;
            if !set.is_empty() {
                break;
            }
        }
    }

    debug!("discovered {} sitemaps for {domain}", set.len());
    set.into_urls()
}

fn decode_xml_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn urlset() -> String {
        r#"<?xml version="1.0"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://example.com/page</loc></url>
</urlset>"#
            .to_string()
    }

    fn index_of(children: &[&str]) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0"?>
<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#,
        );
        for child in children {
            xml.push_str(&format!("<sitemap><loc>{child}</loc></sitemap>"));
        }
        xml.push_str("</sitemapindex>");
        xml
    }

    fn map_fetcher(
        docs: HashMap<String, String>,
    ) -> impl Fn(String) -> std::pin::Pin<Box<dyn Future<Output = Result<String, FetchError>>>>
    {
        move |url: String| {
            let result = docs
                .get(&url)
                .cloned()
                .ok_or_else(|| FetchError::Status(404));
            Box::pin(async move { result })
        }
    }

    #[test]
    fn classifies_index_and_urlset() {
        let index = index_of(&["https://example.com/a.xml", "https://example.com/b.xml"]);
        assert_eq!(
            classify_sitemap(&index),
            SitemapDocument::Index(vec![
                "https://example.com/a.xml".to_string(),
                "https://example.com/b.xml".to_string(),
            ])
        );
        assert_eq!(classify_sitemap(&urlset()), SitemapDocument::UrlSet);
        assert_eq!(classify_sitemap("<html></html>"), SitemapDocument::Unknown);
    }

    #[test]
    fn decodes_entities_in_locations() {
        let index = index_of(&["https://example.com/a.xml?x=1&amp;y=2"]);
        assert_eq!(
            classify_sitemap(&index),
            SitemapDocument::Index(vec!["https://example.com/a.xml?x=1&y=2".to_string()])
        );
    }

    #[test]
    fn set_deduplicates_and_preserves_order() {
        let mut set = SitemapSet::new(10);
        assert!(set.insert("https://example.com/a.xml"));
        assert!(set.insert("https://example.com/b.xml"));
        assert!(!set.insert("https://example.com/a.xml"));
        assert_eq!(
            set.into_urls(),
            vec!["https://example.com/a.xml", "https://example.com/b.xml"]
        );
    }

    #[test]
    fn set_refuses_inserts_beyond_cap() {
        let mut set = SitemapSet::new(2);
        assert!(set.insert("a"));
        assert!(set.insert("b"));
        assert!(set.is_full());
        assert!(!set.insert("c"));
        assert_eq!(set.len(), 2);
    }

    #[tokio::test]
    async fn plain_sitemap_records_its_own_url() {
        let mut docs = HashMap::new();
        docs.insert("https://example.com/sitemap.xml".to_string(), urlset());
        let fetch = map_fetcher(docs);

        let mut set = SitemapSet::default();
        expand_sitemap("https://example.com/sitemap.xml", &fetch, &mut set).await;
        assert_eq!(set.into_urls(), vec!["https://example.com/sitemap.xml"]);
    }

    #[tokio::test]
    async fn index_children_are_recorded_in_document_order() {
        let mut docs = HashMap::new();
        docs.insert(
            "https://example.com/index.xml".to_string(),
            index_of(&[
                "https://example.com/a.xml",
                "https://example.com/b.xml",
                "https://example.com/c.xml",
            ]),
        );
        docs.insert("https://example.com/a.xml".to_string(), urlset());
        docs.insert("https://example.com/b.xml".to_string(), urlset());
        docs.insert("https://example.com/c.xml".to_string(), urlset());
        let fetch = map_fetcher(docs);

        let mut set = SitemapSet::default();
        expand_sitemap("https://example.com/index.xml", &fetch, &mut set).await;
        assert_eq!(
            set.into_urls(),
            vec![
                "https://example.com/a.xml",
                "https://example.com/b.xml",
                "https://example.com/c.xml",
            ]
        );
    }

    #[tokio::test]
    async fn url_listed_directly_and_via_index_appears_once() {
        let mut docs = HashMap::new();
        docs.insert(
            "https://example.com/index.xml".to_string(),
            index_of(&["https://example.com/a.xml"]),
        );
        docs.insert("https://example.com/a.xml".to_string(), urlset());
        let fetch = map_fetcher(docs);

        let mut set = SitemapSet::default();
        expand_sitemap("https://example.com/a.xml", &fetch, &mut set).await;
        expand_sitemap("https://example.com/index.xml", &fetch, &mut set).await;
        assert_eq!(set.into_urls(), vec!["https://example.com/a.xml"]);
    }

    #[tokio::test]
    async fn nested_index_interleaves_grandchildren_between_siblings() {
        let mut docs = HashMap::new();
        docs.insert(
            "https://example.com/index.xml".to_string(),
            index_of(&[
                "https://example.com/nested.xml",
                "https://example.com/last.xml",
            ]),
        );
        docs.insert(
            "https://example.com/nested.xml".to_string(),
            index_of(&["https://example.com/deep.xml"]),
        );
        docs.insert("https://example.com/deep.xml".to_string(), urlset());
        docs.insert("https://example.com/last.xml".to_string(), urlset());
        let fetch = map_fetcher(docs);

        let mut set = SitemapSet::default();
        expand_sitemap("https://example.com/index.xml", &fetch, &mut set).await;
        // A nested index is walked to completion before its next
        // sibling is recorded.
        assert_eq!(
            set.into_urls(),
            vec![
                "https://example.com/nested.xml",
                "https://example.com/deep.xml",
                "https://example.com/last.xml",
            ]
        );
    }

    #[tokio::test]
    async fn cyclic_index_terminates_at_cap() {
        // Two indexes that point at each other plus a fan-out large
        // enough to exceed the cap.
        let mut children_a: Vec<String> = (0..80)
            .map(|i| format!("https://example.com/a{i}.xml"))
            .collect();
        children_a.push("https://example.com/index-b.xml".to_string());
        let mut children_b: Vec<String> = (0..80)
            .map(|i| format!("https://example.com/b{i}.xml"))
            .collect();
        children_b.push("https://example.com/index-a.xml".to_string());

        let mut docs = HashMap::new();
        docs.insert(
            "https://example.com/index-a.xml".to_string(),
            index_of(&children_a.iter().map(String::as_str).collect::<Vec<_>>()),
        );
        docs.insert(
            "https://example.com/index-b.xml".to_string(),
            index_of(&children_b.iter().map(String::as_str).collect::<Vec<_>>()),
        );
        for child in children_a.iter().chain(children_b.iter()) {
            docs.entry(child.clone()).or_insert_with(urlset);
        }
        let fetch = map_fetcher(docs);

        let mut set = SitemapSet::default();
        expand_sitemap("https://example.com/index-a.xml", &fetch, &mut set).await;
        assert_eq!(set.len(), MAX_SITEMAPS);
    }

    #[tokio::test]
    async fn unreachable_child_does_not_abort_siblings() {
        let mut docs = HashMap::new();
        docs.insert(
            "https://example.com/index.xml".to_string(),
            index_of(&["https://example.com/missing.xml", "https://example.com/a.xml"]),
        );
        docs.insert("https://example.com/a.xml".to_string(), urlset());
        let fetch = map_fetcher(docs);

        let mut set = SitemapSet::default();
        expand_sitemap("https://example.com/index.xml", &fetch, &mut set).await;
        // The broken child is still recorded; it just contributes
        // nothing further.
        assert_eq!(
            set.into_urls(),
            vec![
                "https://example.com/missing.xml",
                "https://example.com/a.xml",
            ]
        );
    }
}
