//! Lifecycle events forwarded to ambient observers
//!
//! The run manager emits one [`RunEvent`] per start, end or error of a call
//! in the tree. This module only defines the payload; how runs are numbered
//! and nested is the run manager's business.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::ops::Add;
use uuid::Uuid;

/// The kind of call a run represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunType {
    /// Model invocation
    Llm,
    /// Chained sub-call
    Chain,
    /// Tool invocation
    Tool,
    /// Retrieval call
    Retriever,
}

/// Lifecycle phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Start,
    End,
    Error,
}

/// Token counts reported by a model call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

impl TokenUsage {
    /// Create usage from prompt and completion counts
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
        }
    }

    /// Prompt plus completion tokens
    pub fn total_tokens(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }
}

impl Add for TokenUsage {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            prompt_tokens: self.prompt_tokens + other.prompt_tokens,
            completion_tokens: self.completion_tokens + other.completion_tokens,
        }
    }
}

/// A single lifecycle event of a run in the call tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunEvent {
    /// Run identifier
    pub run_id: Uuid,

    /// Parent run, if this run is nested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_run_id: Option<Uuid>,

    /// Human-readable run name (model, chain or tool name)
    pub name: String,

    /// Kind of call
    pub run_type: RunType,

    /// Lifecycle phase
    pub phase: RunPhase,

    /// Token usage, for model end events
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,

    /// Pre-computed cost in currency units, if the caller knows it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,

    /// Inputs, outputs or error details
    #[serde(default)]
    pub payload: Value,

    /// When the event was produced
    pub timestamp: DateTime<Utc>,
}

impl RunEvent {
    /// Create an event with a fresh run id
    pub fn new(name: impl Into<String>, run_type: RunType, phase: RunPhase) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            parent_run_id: None,
            name: name.into(),
            run_type,
            phase,
            usage: None,
            cost: None,
            payload: Value::Null,
            timestamp: Utc::now(),
        }
    }

    /// Start event for a run
    pub fn start(name: impl Into<String>, run_type: RunType) -> Self {
        Self::new(name, run_type, RunPhase::Start)
    }

    /// End event for a run
    pub fn end(name: impl Into<String>, run_type: RunType) -> Self {
        Self::new(name, run_type, RunPhase::End)
    }

    /// Error event for a run, with the message stored in the payload
    pub fn error(name: impl Into<String>, run_type: RunType, error: impl Into<String>) -> Self {
        Self::new(name, run_type, RunPhase::Error)
            .with_payload(serde_json::json!({ "error": error.into() }))
    }

    /// Completed model call with its token usage
    pub fn llm_end(model: impl Into<String>, usage: TokenUsage) -> Self {
        Self::end(model, RunType::Llm).with_usage(usage)
    }

    /// Use an existing run id
    pub fn with_run_id(mut self, run_id: Uuid) -> Self {
        self.run_id = run_id;
        self
    }

    /// Set the parent run
    pub fn with_parent(mut self, parent_run_id: Uuid) -> Self {
        self.parent_run_id = Some(parent_run_id);
        self
    }

    /// Attach token usage
    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Attach a pre-computed cost
    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = Some(cost);
        self
    }

    /// Attach a payload
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    /// Whether this event closes a run
    pub fn is_terminal(&self) -> bool {
        matches!(self.phase, RunPhase::End | RunPhase::Error)
    }
}
