//! Fixed prompt templates for the AI gateway.

use serde_json::Value as JsonValue;

/// Output contract shared by the optimization and suggestion prompts;
/// it is what `optimize::parse_optimization_text` expects back.
const SUGGESTION_FORMAT: &str = r#"Format your answer as a numbered list of suggestions. Each suggestion must follow this exact layout:

Suggestion #<number>:
```json
<the improved or added JSON-LD snippet>
```
Explanation: <what the change does>
Priority: <High, Medium or Low>
Justification: <why the change matters for SEO>

After the last suggestion you may add closing remarks under a final "Additional Considerations:" heading."#;

pub const URL_ANALYST_SYSTEM: &str = "You are a URL analyzer. Analyze the given URL and \
     provide detailed information about its content, purpose, and potential risks or benefits.";

pub fn url_analysis_user(url: &str) -> String {
    format!("Analyze this URL: {url}")
}

pub const SEO_AUDITOR_SYSTEM: &str = "You are an experienced SEO consultant. Audit the given \
     URL and report on its likely search performance: page topic, title and metadata quality, \
     content structure, and the most impactful improvements.";

pub fn seo_audit_user(url: &str) -> String {
    format!("Perform an SEO audit of this URL: {url}")
}

pub const STRUCTURED_DATA_ANALYST_SYSTEM: &str = "You are an expert in structured data and \
     SEO. Analyze the given structured data and provide insights.";

pub fn structured_data_analysis_user(data: &JsonValue) -> String {
    format!("Analyze this structured data and provide insights: {data}")
}

pub const STRUCTURED_DATA_OPTIMIZER_SYSTEM: &str = "You are an expert in structured data and \
     SEO. Optimize the given structured data for better SEO performance.";

pub fn structured_data_optimization_user(data: &JsonValue) -> String {
    format!(
        "Optimize this structured data for better SEO: {data}\n\n{SUGGESTION_FORMAT}"
    )
}

pub const STRUCTURED_DATA_SUGGESTER_SYSTEM: &str = "You are an expert in structured data and \
     SEO. Given the content of a web page, suggest JSON-LD structured data (schema.org \
     vocabulary) that the page should carry.";

pub fn structured_data_suggestion_user(content: &str) -> String {
    format!(
        "Suggest structured data for a page with this content:\n\n{content}\n\n{SUGGESTION_FORMAT}"
    )
}
