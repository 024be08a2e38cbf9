//! Rule and accepted-query types.

mod range;

pub use range::{AddressRange, PortRange};

use std::fmt;
use std::net::Ipv4Addr;

/// Identifier assigned to a rule when it is stored.
///
/// Ids increase monotonically and are never reused, so two rules created
/// from identical add commands still have distinct ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(pub u64);

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A check that matched a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedQuery {
    raw_text: String,
    ip: Ipv4Addr,
    port: u16,
}

impl AcceptedQuery {
    /// Create a new AcceptedQuery.
    pub fn new(raw_text: impl Into<String>, ip: Ipv4Addr, port: u16) -> Self {
        Self {
            raw_text: raw_text.into(),
            ip,
            port,
        }
    }

    /// The exact check command that was accepted.
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn ip(&self) -> Ipv4Addr {
        self.ip
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

/// A stored address-range x port-range policy entry.
///
/// The rule owns the list of queries it accepted; deleting the rule
/// discards them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    id: RuleId,
    /// Canonical add command, used as the identity key for deletes
    raw_text: String,
    addresses: AddressRange,
    ports: PortRange,
    queries: Vec<AcceptedQuery>,
}

impl Rule {
    /// Create a new Rule with no accepted queries.
    pub fn new(
        id: RuleId,
        raw_text: impl Into<String>,
        addresses: AddressRange,
        ports: PortRange,
    ) -> Self {
        Self {
            id,
            raw_text: raw_text.into(),
            addresses,
            ports,
            queries: Vec::new(),
        }
    }

    pub fn id(&self) -> RuleId {
        self.id
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    /// Accepted queries in the order they were first recorded.
    pub fn queries(&self) -> &[AcceptedQuery] {
        &self.queries
    }

    /// Check whether `ip` and `port` both fall within this rule.
    pub fn matches(&self, ip: Ipv4Addr, port: u16) -> bool {
        self.ports.contains(port) && self.addresses.contains(ip)
    }

    /// Record an accepted query unless one with the same raw text exists.
    ///
    /// Returns `true` if the query was added.
    pub fn record_query(&mut self, query: AcceptedQuery) -> bool {
        if self.queries.iter().any(|q| q.raw_text == query.raw_text) {
            return false;
        }
        self.queries.push(query);
        true
    }
}

/// Result of checking an (IP, port) pair against the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// The first matching rule, in insertion order
    Accepted(RuleId),
    /// No rule covers the pair
    Rejected,
}

impl MatchOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, MatchOutcome::Accepted(_))
    }
}
