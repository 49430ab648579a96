//! JSON-LD extraction and validation
//!
//! Input is either raw JSON-LD or HTML carrying
//! `<script type="application/ld+json">` blocks. Each block is parsed,
//! its `http://schema.org` context rewritten to https, and then run
//! through JSON-LD expansion; a block is valid iff expansion produces
//! at least one object. Compacting the expansion against an empty
//! context is a round trip, so the normalized item handed back to
//! callers is the rewritten source document.

use anyhow::{Context, Result, anyhow, bail};
use iref::IriBuf;
use json_ld::syntax::{Parse, Value};
use json_ld::{JsonLdProcessor, RemoteDocument, ReqwestLoader};
use scraper::{Html, Selector};
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::warn;

pub const NO_JSON_LD_MESSAGE: &str = "No valid JSON-LD found in the input. \
     Make sure the input contains properly formatted JSON-LD scripts.";
pub const FAILED_VALIDATION_MESSAGE: &str =
    "JSON-LD found but failed validation. Please check the format.";

/// Result of validating one input text.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOutcome {
    pub is_valid: bool,
    pub data: Vec<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationOutcome {
    fn no_json_ld() -> Self {
        Self {
            is_valid: false,
            data: Vec::new(),
            error: Some(NO_JSON_LD_MESSAGE.to_string()),
        }
    }

    fn failed_validation() -> Self {
        Self {
            is_valid: false,
            data: Vec::new(),
            error: Some(FAILED_VALIDATION_MESSAGE.to_string()),
        }
    }

    fn valid(data: Vec<JsonValue>) -> Self {
        Self {
            is_valid: true,
            data,
            error: None,
        }
    }
}

/// Collect candidate JSON-LD blocks from raw input.
///
/// Input whose trimmed text starts with `{` or `[` is treated as one
/// JSON-LD document as-is. Anything else is scanned for
/// `<script type="application/ld+json">` blocks; blocks that are not
/// parseable JSON are logged and dropped here, matching the tolerant
/// extraction behavior, while a malformed direct-JSON input is kept so
/// it can fail validation rather than count as "not found".
pub fn collect_json_ld_blocks(input: &str) -> Vec<String> {
    let trimmed = input.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return vec![trimmed.to_string()];
    }
    extract_script_blocks(input)
}

/// Extract every JSON-LD script block from HTML, discarding blocks
/// whose content is not parseable JSON.
pub fn extract_script_blocks(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("script").expect("invalid script selector");

    document
        .select(&selector)
        .filter_map(|element| {
            let script_type = element
                .value()
                .attr("type")
                .map(|t| t.trim().to_ascii_lowercase())
                .unwrap_or_default();

            // contains() also matches "application/ld+json; charset=utf-8"
            if !script_type.contains("ld+json") {
                return None;
            }

            let text = element.text().collect::<String>().trim().to_string();
            if text.is_empty() {
                return None;
            }

            match serde_json::from_str::<JsonValue>(&text) {
                Ok(_) => Some(text),
                Err(e) => {
                    warn!("dropping unparseable JSON-LD block: {e}");
                    None
                }
            }
        })
        .collect()
}

/// Parse a raw block and rewrite a plain-string `http://schema.org`
/// context to `https://schema.org`.
pub fn parse_and_rewrite(raw: &str) -> Result<JsonValue> {
    let mut value: JsonValue =
        serde_json::from_str(raw).context("failed to parse JSON-LD block")?;
    rewrite_schema_org_context(&mut value);
    Ok(value)
}

fn rewrite_schema_org_context(value: &mut JsonValue) {
    if let Some(ctx) = value.get_mut("@context") {
        if ctx.as_str() == Some("http://schema.org") {
            *ctx = JsonValue::String("https://schema.org".to_string());
        }
    }
}

/// Validate raw input (HTML or bare JSON-LD) and return the normalized
/// items that survive expansion.
pub async fn validate_structured_data(input: &str) -> ValidationOutcome {
    let blocks = collect_json_ld_blocks(input);
    if blocks.is_empty() {
        return ValidationOutcome::no_json_ld();
    }

    let mut loader = ReqwestLoader::default();
    let mut validated = Vec::new();
    for block in &blocks {
        match validate_block(block, &mut loader).await {
            Ok(item) => validated.push(item),
            Err(e) => warn!("JSON-LD block failed validation: {e}"),
        }
    }

    if validated.is_empty() {
        ValidationOutcome::failed_validation()
    } else {
        ValidationOutcome::valid(validated)
    }
}

async fn validate_block(raw: &str, loader: &mut ReqwestLoader) -> Result<JsonValue> {
    let rewritten = parse_and_rewrite(raw)?;
    let serialized = serde_json::to_string(&rewritten)?;

    let (value, _) = Value::parse_str(&serialized)
        .map_err(|err| anyhow!("failed to parse JSON-LD block: {err}"))?;

    let remote = RemoteDocument::new(
        None::<IriBuf>,
        Some("application/ld+json".parse().expect("static mime type")),
        value,
    );

    // The expansion future is not Send (rustc cannot prove it across
    // the loader borrow); callers on multi-threaded executors must
    // drive it from a single thread.
    let expanded = Box::pin(remote.expand(loader))
        .await
        .map_err(|err| anyhow!("JSON-LD expansion failed: {err}"))?;

    if expanded.iter().next().is_none() {
        bail!("JSON-LD expansion produced no objects");
    }

    Ok(rewritten)
}
