//! Token and cost accumulator
//!
//! A [`UsageTracker`] is shared by every call in the tree that looks it up,
//! so all counters sit behind one mutex and are updated together.

use crate::event::{RunEvent, RunPhase, RunType, TokenUsage};
use crate::kind::CallbackHandler;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Prompt and completion price per 1K tokens, in USD
///
/// Unknown models have no price and contribute tokens but no cost.
pub fn model_cost_per_1k(model: &str) -> Option<(f64, f64)> {
    let prices = match model {
        "gpt-4" | "gpt-4-0613" => (0.03, 0.06),
        "gpt-4-32k" | "gpt-4-32k-0613" => (0.06, 0.12),
        "gpt-4-turbo" => (0.01, 0.03),
        "gpt-4o" => (0.005, 0.015),
        "gpt-4o-mini" => (0.00015, 0.0006),
        "gpt-3.5-turbo" | "gpt-3.5-turbo-0613" => (0.0015, 0.002),
        "gpt-3.5-turbo-16k" | "gpt-3.5-turbo-16k-0613" => (0.003, 0.004),
        _ => return None,
    };
    Some(prices)
}

fn estimate_cost(model: &str, usage: &TokenUsage) -> f64 {
    match model_cost_per_1k(model) {
        Some((prompt_price, completion_price)) => {
            (usage.prompt_tokens as f64 / 1000.0) * prompt_price
                + (usage.completion_tokens as f64 / 1000.0) * completion_price
        }
        None => 0.0,
    }
}

/// Snapshot of accumulated usage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageTotals {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    pub successful_requests: u64,
    pub total_cost: f64,
}

/// Accumulates token counts and cost for a call tree
#[derive(Debug, Default)]
pub struct UsageTracker {
    totals: Mutex<UsageTotals>,
}

impl UsageTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a cost that was computed elsewhere
    pub fn record_cost(&self, cost: f64) {
        self.totals.lock().total_cost += cost;
    }

    /// Add one completed model call, pricing it from the model table
    pub fn record_usage(&self, model: &str, usage: TokenUsage) {
        let cost = estimate_cost(model, &usage);
        self.record(usage, cost);
    }

    fn record(&self, usage: TokenUsage, cost: f64) {
        let mut totals = self.totals.lock();
        totals.prompt_tokens += usage.prompt_tokens;
        totals.completion_tokens += usage.completion_tokens;
        totals.total_tokens += usage.total_tokens();
        totals.successful_requests += 1;
        totals.total_cost += cost;
    }

    /// Snapshot of everything recorded so far
    pub fn totals(&self) -> UsageTotals {
        self.totals.lock().clone()
    }

    pub fn total_cost(&self) -> f64 {
        self.totals.lock().total_cost
    }

    pub fn total_tokens(&self) -> u64 {
        self.totals.lock().total_tokens
    }

    pub fn successful_requests(&self) -> u64 {
        self.totals.lock().successful_requests
    }

    /// Human-readable report
    pub fn summary(&self) -> String {
        let totals = self.totals();
        format!(
            "Tokens Used: {}\n\
             \tPrompt Tokens: {}\n\
             \tCompletion Tokens: {}\n\
             Successful Requests: {}\n\
             Total Cost (USD): ${:.4}",
            totals.total_tokens,
            totals.prompt_tokens,
            totals.completion_tokens,
            totals.successful_requests,
            totals.total_cost
        )
    }
}

impl CallbackHandler for UsageTracker {
    fn on_event(&self, event: &RunEvent) {
        if event.run_type != RunType::Llm || event.phase != RunPhase::End {
            return;
        }

        match (event.usage, event.cost) {
            (Some(usage), Some(cost)) => self.record(usage, cost),
            (Some(usage), None) => self.record_usage(&event.name, usage),
            (None, Some(cost)) => self.record_cost(cost),
            (None, None) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_record_cost() {
        let tracker = UsageTracker::new();
        tracker.record_cost(1.0);
        tracker.record_cost(2.5);
        assert!(approx_eq(tracker.total_cost(), 3.5));
        assert_eq!(tracker.total_tokens(), 0);
    }

    #[test]
    fn test_record_usage_prices_known_model() {
        let tracker = UsageTracker::new();
        tracker.record_usage("gpt-4", TokenUsage::new(1000, 500));

        let totals = tracker.totals();
        assert_eq!(totals.prompt_tokens, 1000);
        assert_eq!(totals.completion_tokens, 500);
        assert_eq!(totals.total_tokens, 1500);
        assert_eq!(totals.successful_requests, 1);
        // 0.03 + 0.5 * 0.06
        assert!(approx_eq(totals.total_cost, 0.06));
    }

    #[test]
    fn test_unknown_model_has_no_cost() {
        let tracker = UsageTracker::new();
        tracker.record_usage("local-llama", TokenUsage::new(100, 100));
        assert_eq!(tracker.total_tokens(), 200);
        assert!(approx_eq(tracker.total_cost(), 0.0));
        assert!(model_cost_per_1k("local-llama").is_none());
    }

    #[test]
    fn test_on_event_only_counts_llm_end() {
        let tracker = UsageTracker::new();

        tracker.on_event(&RunEvent::start("gpt-4", RunType::Llm));
        tracker.on_event(&RunEvent::end("chain", RunType::Chain).with_cost(9.0));
        tracker.on_event(&RunEvent::llm_end("gpt-3.5-turbo", TokenUsage::new(10, 10)).with_cost(0.25));
        tracker.on_event(&RunEvent::end("gpt-4", RunType::Llm).with_cost(0.75));

        assert_eq!(tracker.successful_requests(), 1);
        assert_eq!(tracker.total_tokens(), 20);
        assert!(approx_eq(tracker.total_cost(), 1.0));
    }

    #[test]
    fn test_concurrent_updates() {
        let tracker = Arc::new(UsageTracker::new());

        let threads: Vec<_> = (0..8)
            .map(|_| {
                let tracker = Arc::clone(&tracker);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        tracker.record_usage("unpriced", TokenUsage::new(1, 1));
                    }
                })
            })
            .collect();

        for handle in threads {
            handle.join().unwrap();
        }

        assert_eq!(tracker.successful_requests(), 8000);
        assert_eq!(tracker.total_tokens(), 16000);
    }

    #[test]
    fn test_summary() {
        let tracker = UsageTracker::new();
        tracker.record_usage("gpt-4", TokenUsage::new(1000, 500));

        let summary = tracker.summary();
        assert!(summary.contains("Tokens Used: 1500"));
        assert!(summary.contains("Prompt Tokens: 1000"));
        assert!(summary.contains("Successful Requests: 1"));
        assert!(summary.contains("Total Cost (USD): $0.0600"));
    }
}
