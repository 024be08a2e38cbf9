//! The shared policy engine.

use parking_lot::Mutex;

use crate::command::{interpret, Response};
use crate::request_log::RequestLog;
use crate::rule::Rule;
use crate::store::RuleStore;

/// State guarded by the engine's lock.
#[derive(Debug, Default)]
struct PolicyState {
    rules: RuleStore,
    requests: RequestLog,
}

/// PolicyEngine owns the rule store and request log behind one mutex.
///
/// Each command holds the lock from logging through formatting the
/// response, so commands from concurrent connections take effect in a
/// strict order. Listing and checking take the same exclusive lock as
/// mutation.
///
/// Build one engine at startup and share it as `Arc<PolicyEngine>`.
///
/// # Examples
/// ```
/// use fwpolicy::PolicyEngine;
///
/// let engine = PolicyEngine::new();
/// assert_eq!(engine.dispatch("A 10.0.0.1-10.0.0.5 80-90"), "Rule added");
/// assert_eq!(engine.dispatch("C 10.0.0.3 85"), "Connection accepted");
/// ```
#[derive(Debug, Default)]
pub struct PolicyEngine {
    state: Mutex<PolicyState>,
}

impl PolicyEngine {
    /// Create an engine with no rules and an empty request log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Execute one command line and return the wire response text.
    pub fn dispatch(&self, line: &str) -> String {
        self.execute(line).to_string()
    }

    /// Execute one command line and return the structured response.
    pub fn execute(&self, line: &str) -> Response {
        let mut state = self.state.lock();
        let PolicyState { rules, requests } = &mut *state;
        interpret(line, rules, requests)
    }

    /// Copy of all rules in insertion order.
    pub fn snapshot_rules(&self) -> Vec<Rule> {
        self.state.lock().rules.iter().cloned().collect()
    }

    /// Number of stored rules.
    pub fn rule_count(&self) -> usize {
        self.state.lock().rules.len()
    }

    /// Number of commands received so far.
    pub fn request_count(&self) -> usize {
        self.state.lock().requests.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_new_engine() {
        let engine = PolicyEngine::new();
        assert_eq!(engine.rule_count(), 0);
        assert_eq!(engine.request_count(), 0);
        assert_eq!(engine.dispatch("L"), "No rules");
        assert_eq!(engine.request_count(), 1);
    }

    #[test]
    fn test_execute_returns_structured_response() {
        let engine = PolicyEngine::new();
        assert_eq!(engine.execute("A 1.1.1.1 80"), Response::RuleAdded);
        assert_eq!(engine.execute("Z"), Response::IllegalRequest);
    }

    #[test]
    fn test_concurrent_dispatch() {
        let engine = Arc::new(PolicyEngine::new());
        let threads = 8;
        let per_thread = 50;

        let handles: Vec<_> = (0..threads)
            .map(|t| {
                let engine = Arc::clone(&engine);
                thread::spawn(move || {
                    for i in 0..per_thread {
                        let line = format!("A 10.{}.0.{} {}", t, i, 1000 + i);
                        assert_eq!(engine.dispatch(&line), "Rule added");
                        engine.dispatch("C 10.0.0.0 1000");
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(engine.rule_count(), threads * per_thread);
        assert_eq!(engine.request_count(), threads * per_thread * 2);

        // Every check that matched was credited to one rule only, and the
        // identical check text was recorded at most once.
        let credited: usize = engine
            .snapshot_rules()
            .iter()
            .map(|rule| rule.queries().len())
            .sum();
        assert_eq!(credited, 1);
    }
}
