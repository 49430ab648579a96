//! Best-effort parser for AI optimization output
//!
//! The gateway prompts ask the model for a loose
//! `Suggestion #k / Explanation: / Priority: / Justification:` layout
//! with an optional `Additional Considerations:` trailer. The input is
//! free-form prose, so every field degrades to an empty string (or the
//! Low priority) when its marker is missing; parsing never fails.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

const TRAILER_MARKER: &str = "Additional Considerations:";
const SUGGESTION_MARKER: &str = "Suggestion #";

static CODE_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").expect("invalid code block regex")
});
static PRIORITY_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Priority:\s*(High|Medium|Low)").expect("invalid priority regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    fn from_token(token: &str) -> Self {
        match token.to_ascii_lowercase().as_str() {
            "high" => Priority::High,
            "medium" => Priority::Medium,
            _ => Priority::Low,
        }
    }
}

/// One parsed suggestion card.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationSuggestion {
    pub number: u32,
    pub json_ld: String,
    pub explanation: String,
    pub priority: Priority,
    pub justification: String,
}

/// Parsed optimization output: ordered suggestions plus the optional
/// trailer text.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedOptimization {
    pub suggestions: Vec<OptimizationSuggestion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_considerations: Option<String>,
}

/// Split free-form optimization prose into structured suggestions.
pub fn parse_optimization_text(text: &str) -> ParsedOptimization {
    let (body, trailer) = match text.split_once(TRAILER_MARKER) {
        Some((body, trailer)) => {
            let trailer = trailer.trim();
            (
                body,
                (!trailer.is_empty()).then(|| trailer.to_string()),
            )
        }
        None => (text, None),
    };

    let suggestions = body
        .split(SUGGESTION_MARKER)
        .skip(1)
        .enumerate()
        .map(|(index, chunk)| parse_suggestion(index as u32 + 1, chunk))
        .collect();

    ParsedOptimization {
        suggestions,
        additional_considerations: trailer,
    }
}

fn parse_suggestion(fallback_number: u32, chunk: &str) -> OptimizationSuggestion {
    let number = leading_number(chunk).unwrap_or(fallback_number);

    let json_ld = CODE_BLOCK
        .captures(chunk)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();

    let explanation = section_between(chunk, "Explanation:", &["Priority:", "Justification:"]);

    let priority = PRIORITY_TOKEN
        .captures(chunk)
        .and_then(|cap| cap.get(1))
        .map(|m| Priority::from_token(m.as_str()))
        .unwrap_or(Priority::Low);

    let justification = section_between(chunk, "Justification:", &[]);

    OptimizationSuggestion {
        number,
        json_ld,
        explanation,
        priority,
        justification,
    }
}

fn leading_number(chunk: &str) -> Option<u32> {
    let digits: String = chunk.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

/// Text after `start` up to the earliest of `end_markers`, or the end
/// of the chunk. Missing start marker yields an empty string.
fn section_between(chunk: &str, start: &str, end_markers: &[&str]) -> String {
    let Some(pos) = chunk.find(start) else {
        return String::new();
    };
    let rest = &chunk[pos + start.len()..];

    let end = end_markers
        .iter()
        .filter_map(|marker| rest.find(marker))
        .min()
        .unwrap_or(rest.len());

    rest[..end].trim().to_string()
}
