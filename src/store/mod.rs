//! Ordered rule storage with first-match-wins checking.

use std::net::Ipv4Addr;

use crate::error::RuleError;
use crate::rule::{AcceptedQuery, AddressRange, MatchOutcome, PortRange, Rule, RuleId};

/// RuleStore keeps rules in insertion order.
///
/// Rules are matched in the order they were added; the first rule covering
/// an (IP, port) pair wins and later overlapping rules are never consulted.
/// Identical add commands create separate entries. Uniqueness only matters
/// at delete time, where the first rule with the exact raw text is removed.
///
/// The store does no locking of its own. [`crate::PolicyEngine`] serializes
/// every access behind a single mutex.
#[derive(Debug, Default)]
pub struct RuleStore {
    rules: Vec<Rule>,
    next_id: u64,
}

impl RuleStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of stored rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if the store has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterate over rules in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// Look up a rule by id.
    pub fn get(&self, id: RuleId) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.id() == id)
    }

    /// Append a rule built from an already validated add command.
    pub fn add(
        &mut self,
        raw_text: impl Into<String>,
        addresses: AddressRange,
        ports: PortRange,
    ) -> RuleId {
        self.next_id += 1;
        let id = RuleId(self.next_id);
        self.rules.push(Rule::new(id, raw_text, addresses, ports));
        id
    }

    /// Remove the first rule whose raw text equals `raw_text`.
    ///
    /// The relative order of the remaining rules is unchanged.
    pub fn delete(&mut self, raw_text: &str) -> Result<RuleId, RuleError> {
        let pos = self
            .rules
            .iter()
            .position(|rule| rule.raw_text() == raw_text)
            .ok_or(RuleError::NotFound)?;
        Ok(self.rules.remove(pos).id())
    }

    /// Check an (IP, port) pair and credit the first matching rule.
    ///
    /// The query is recorded under that rule unless an identical check text
    /// is already there; either way the scan stops at the first match.
    pub fn check(&mut self, ip: Ipv4Addr, port: u16, raw_text: &str) -> MatchOutcome {
        match self.rules.iter_mut().find(|rule| rule.matches(ip, port)) {
            Some(rule) => {
                if !rule.record_query(AcceptedQuery::new(raw_text, ip, port)) {
                    log::debug!(
                        "Query {:?} already recorded under rule {}",
                        raw_text,
                        rule.id()
                    );
                }
                MatchOutcome::Accepted(rule.id())
            }
            None => MatchOutcome::Rejected,
        }
    }
}
