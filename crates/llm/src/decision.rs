//! Structured accept/reject decisions returned by the answer checker.

use kbhub_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Instructions appended to checking prompts so the reply parses as a decision.
pub const DECISION_FORMAT_INSTRUCTIONS: &str = "Respond with a single JSON object and nothing else, \
in the form {\"decision\": \"Y\" or \"N\", \"reasoning\": \"<one or two sentences>\"}. \
Use \"Y\" if the answer is valid and \"N\" if it is not.";

/// Binary validity judgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// The answer is supported by the context
    #[serde(rename = "Y")]
    Accept,
    /// The answer is wrong, irrelevant, or unsupported
    #[serde(rename = "N")]
    Reject,
}

impl Verdict {
    /// Parse a decision symbol. Accepts `Y`/`N` and a few spelled-out forms.
    pub fn parse(symbol: &str) -> Option<Self> {
        match symbol.trim().trim_matches(|c| c == '"' || c == '.').to_lowercase().as_str() {
            "y" | "yes" | "accept" | "valid" => Some(Self::Accept),
            "n" | "no" | "reject" | "invalid" => Some(Self::Reject),
            _ => None,
        }
    }

    /// The canonical one-character symbol.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Accept => "Y",
            Self::Reject => "N",
        }
    }
}

/// A parsed checker decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckDecision {
    /// Accept or reject
    pub decision: Verdict,

    /// Free-text rationale
    pub reasoning: String,
}

impl CheckDecision {
    pub fn accept(reasoning: impl Into<String>) -> Self {
        Self {
            decision: Verdict::Accept,
            reasoning: reasoning.into(),
        }
    }

    pub fn reject(reasoning: impl Into<String>) -> Self {
        Self {
            decision: Verdict::Reject,
            reasoning: reasoning.into(),
        }
    }
}

/// Parse a model reply into a decision.
///
/// The reply may be bare JSON, JSON inside code fences, JSON embedded in
/// prose, or a lone decision symbol. Anything else is
/// `AppError::ModelMalformedOutput`; there is no default verdict.
pub fn parse_decision(raw: &str) -> AppResult<CheckDecision> {
    let cleaned = strip_code_fences(raw);

    if let Some(verdict) = Verdict::parse(&cleaned) {
        return Ok(CheckDecision {
            decision: verdict,
            reasoning: String::new(),
        });
    }

    let value = serde_json::from_str::<Value>(&cleaned)
        .ok()
        .or_else(|| extract_json_from_text(&cleaned))
        .ok_or_else(|| {
            AppError::ModelMalformedOutput(format!(
                "expected a JSON decision object, got: {}",
                preview(raw)
            ))
        })?;

    let symbol = value
        .get("decision")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            AppError::ModelMalformedOutput(format!(
                "decision field missing or not a string: {}",
                preview(raw)
            ))
        })?;

    let decision = Verdict::parse(symbol).ok_or_else(|| {
        AppError::ModelMalformedOutput(format!("unknown decision symbol '{}'", symbol))
    })?;

    let reasoning = value
        .get("reasoning")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Ok(CheckDecision {
        decision,
        reasoning,
    })
}

fn strip_code_fences(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    let mut lines: Vec<&str> = trimmed.lines().collect();
    if lines.first().is_some_and(|l| l.trim_start().starts_with("```")) {
        lines.remove(0);
    }
    if lines.last().is_some_and(|l| l.trim_start().starts_with("```")) {
        lines.pop();
    }
    lines.join("\n").trim().to_string()
}

fn extract_json_from_text(raw: &str) -> Option<Value> {
    for (idx, ch) in raw.char_indices() {
        if ch != '{' {
            continue;
        }
        let mut deserializer = serde_json::Deserializer::from_str(&raw[idx..]);
        if let Ok(value) = Value::deserialize(&mut deserializer) {
            if value.is_object() {
                return Some(value);
            }
        }
    }
    None
}

fn preview(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.char_indices().nth(120) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
