//! Deterministic in-process LLM used for tests and offline runs.
//!
//! Replies and decisions are scripted lists that cycle once exhausted.
//! Decisions are stored as raw model text and go through the same parser as
//! live providers, so malformed output can be scripted too.

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use crate::decision::{parse_decision, CheckDecision};
use kbhub_core::{AppError, AppResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

const DEFAULT_REPLY: &str = "Fake response";
const DEFAULT_DECISION: &str = r#"{"decision": "N", "reasoning": "Fake checking response"}"#;

/// Which trait operation a recorded call went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StubCallKind {
    Complete,
    Decide,
}

/// A request the stub received.
#[derive(Debug, Clone)]
pub struct StubCall {
    pub kind: StubCallKind,
    pub request: LlmRequest,
}

/// Scripted LLM client.
#[derive(Debug)]
pub struct StubClient {
    replies: Vec<String>,
    decisions: Vec<String>,
    fail_after: Option<usize>,
    reply_cursor: AtomicUsize,
    decision_cursor: AtomicUsize,
    calls: Mutex<Vec<StubCall>>,
}

impl Default for StubClient {
    fn default() -> Self {
        Self::new()
    }
}

impl StubClient {
    /// Stub answering "Fake response" and always rejecting.
    pub fn new() -> Self {
        Self {
            replies: vec![DEFAULT_REPLY.to_string()],
            decisions: vec![DEFAULT_DECISION.to_string()],
            fail_after: None,
            reply_cursor: AtomicUsize::new(0),
            decision_cursor: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Replace the completion script.
    pub fn with_replies<I, S>(mut self, replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.replies = replies.into_iter().map(Into::into).collect();
        if self.replies.is_empty() {
            self.replies.push(DEFAULT_REPLY.to_string());
        }
        self
    }

    /// Replace the decision script with parsed decisions.
    pub fn with_decisions<I>(self, decisions: I) -> Self
    where
        I: IntoIterator<Item = CheckDecision>,
    {
        let raw: Vec<String> = decisions
            .into_iter()
            .map(|d| serde_json::to_string(&d).unwrap_or_else(|_| DEFAULT_DECISION.to_string()))
            .collect();
        self.with_raw_decisions(raw)
    }

    /// Replace the decision script with raw model text.
    pub fn with_raw_decisions<I, S>(mut self, decisions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.decisions = decisions.into_iter().map(Into::into).collect();
        if self.decisions.is_empty() {
            self.decisions.push(DEFAULT_DECISION.to_string());
        }
        self
    }

    /// Accept every answer.
    pub fn always_accept(self) -> Self {
        self.with_decisions([CheckDecision::accept("Supported by the context")])
    }

    /// Reject every answer.
    pub fn always_reject(self) -> Self {
        self.with_decisions([CheckDecision::reject("Not supported by the context")])
    }

    /// Let the first `calls` requests succeed, then fail with `ModelUnavailable`.
    pub fn fail_after(mut self, calls: usize) -> Self {
        self.fail_after = Some(calls);
        self
    }

    /// Fail every request with `ModelUnavailable`.
    pub fn unavailable() -> Self {
        Self::new().fail_after(0)
    }

    /// Every request received so far, in order.
    pub fn calls(&self) -> Vec<StubCall> {
        self.lock_calls().clone()
    }

    /// Number of requests received through `kind`.
    pub fn call_count(&self, kind: StubCallKind) -> usize {
        self.lock_calls().iter().filter(|c| c.kind == kind).count()
    }

    fn lock_calls(&self) -> MutexGuard<'_, Vec<StubCall>> {
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, kind: StubCallKind, request: &LlmRequest) -> AppResult<()> {
        let mut calls = self.lock_calls();
        let seen = calls.len();
        calls.push(StubCall {
            kind,
            request: request.clone(),
        });

        match self.fail_after {
            Some(limit) if seen >= limit => Err(AppError::ModelUnavailable(format!(
                "stub configured to fail after {} calls",
                limit
            ))),
            _ => Ok(()),
        }
    }

    fn next(script: &[String], cursor: &AtomicUsize) -> String {
        let idx = cursor.fetch_add(1, Ordering::SeqCst);
        script[idx % script.len()].clone()
    }
}

#[async_trait::async_trait]
impl LlmClient for StubClient {
    fn provider_name(&self) -> &str {
        "stub"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.record(StubCallKind::Complete, request)?;
        let content = Self::next(&self.replies, &self.reply_cursor);

        Ok(LlmResponse {
            content,
            model: request.model.clone(),
            usage: LlmUsage::default(),
            done: true,
        })
    }

    async fn decide(&self, request: &LlmRequest) -> AppResult<CheckDecision> {
        self.record(StubCallKind::Decide, request)?;
        let raw = Self::next(&self.decisions, &self.decision_cursor);
        parse_decision(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::Verdict;

    fn request() -> LlmRequest {
        LlmRequest::new("question", "stub-model")
    }

    #[tokio::test]
    async fn test_default_script() {
        let stub = StubClient::new();
        let response = stub.complete(&request()).await.unwrap();
        assert_eq!(response.content, "Fake response");
        assert_eq!(response.model, "stub-model");

        let decision = stub.decide(&request()).await.unwrap();
        assert_eq!(decision.decision, Verdict::Reject);
        assert_eq!(decision.reasoning, "Fake checking response");
    }

    #[tokio::test]
    async fn test_replies_cycle() {
        let stub = StubClient::new().with_replies(["first", "second"]);
        assert_eq!(stub.complete(&request()).await.unwrap().content, "first");
        assert_eq!(stub.complete(&request()).await.unwrap().content, "second");
        assert_eq!(stub.complete(&request()).await.unwrap().content, "first");
    }

    #[tokio::test]
    async fn test_decision_script() {
        let stub = StubClient::new().with_decisions([
            CheckDecision::reject("wrong"),
            CheckDecision::accept("right"),
        ]);
        assert_eq!(stub.decide(&request()).await.unwrap().decision, Verdict::Reject);
        assert_eq!(stub.decide(&request()).await.unwrap().decision, Verdict::Accept);
    }

    #[tokio::test]
    async fn test_raw_decision_malformed() {
        let stub = StubClient::new().with_raw_decisions(["perhaps"]);
        let err = stub.decide(&request()).await.unwrap_err();
        assert!(matches!(err, AppError::ModelMalformedOutput(_)));
    }

    #[tokio::test]
    async fn test_fail_after() {
        let stub = StubClient::new().fail_after(1);
        assert!(stub.complete(&request()).await.is_ok());
        let err = stub.complete(&request()).await.unwrap_err();
        assert!(matches!(err, AppError::ModelUnavailable(_)));
        assert_eq!(stub.call_count(StubCallKind::Complete), 2);
    }

    #[tokio::test]
    async fn test_records_calls() {
        let stub = StubClient::new().always_accept();
        stub.complete(&request()).await.unwrap();
        stub.decide(&request()).await.unwrap();

        let calls = stub.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].kind, StubCallKind::Complete);
        assert_eq!(calls[1].kind, StubCallKind::Decide);
        assert_eq!(calls[1].request.prompt, "question");
    }
}
