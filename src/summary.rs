//! Prompt construction for the summarize endpoint.
//!
//! Both functions here are pure; nothing touches the network.

const SHORT: &str = "2-3 sentences (≈60–90 words)";
const MEDIUM: &str = "4-6 sentences (≈120–180 words)";
const LONG: &str = "8-12 sentences or concise bullets (≈250–350 words)";

/// Target size category for a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryLength {
    Short,
    Medium,
    Long,
}

impl SummaryLength {
    /// Resolve the caller's length hint. Case-insensitive; anything that
    /// isn't a known keyword (including `None` and `""`) is `Medium`.
    pub fn from_hint(hint: Option<&str>) -> Self {
        match hint.map(str::to_lowercase).as_deref() {
            Some("short") => Self::Short,
            Some("long") => Self::Long,
            _ => Self::Medium,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::Medium => "medium",
            Self::Long => "long",
        }
    }

    /// Human-readable target embedded in the prompt.
    pub fn target(self) -> &'static str {
        match self {
            Self::Short => SHORT,
            Self::Medium => MEDIUM,
            Self::Long => LONG,
        }
    }
}

/// Build the instruction prompt. `text` is embedded verbatim inside a
/// fenced block; no escaping is applied.
pub fn build_prompt(text: &str, target: &str) -> String {
    format!(
        r#"
You are an expert writing assistant. Summarize the user's text.

Constraints:
- Length: {target}
- Preserve key facts, numbers, names, and causal links.
- Prefer clear, neutral tone.
- Output MUST be valid Markdown. Use short paragraphs and bullet lists when helpful.
- Do not include extraneous lead-in like "Here is the summary"; return only the summary.

Text to summarize:
```
{text}
```
"#
    )
}
