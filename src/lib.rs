//! fwpolicy - an in-memory firewall policy service.
//!
//! Clients submit short text commands, one per TCP connection, to add,
//! delete and list access rules (IPv4 range x port range) and to check
//! whether an (IP, port) pair would be allowed. Accepted checks are recorded
//! under the rule that allowed them.
//!
//! # Quick Start
//!
//! ```
//! use fwpolicy::PolicyEngine;
//!
//! let engine = PolicyEngine::new();
//! assert_eq!(engine.dispatch("L"), "No rules");
//! assert_eq!(engine.dispatch("A 10.0.0.1-10.0.0.5 80-90"), "Rule added");
//! assert_eq!(engine.dispatch("C 10.0.0.3 85"), "Connection accepted");
//! assert_eq!(
//!     engine.dispatch("L"),
//!     "Rule: A 10.0.0.1-10.0.0.5 80-90\nQuery: 10.0.0.3 85\n"
//! );
//! ```
//!
//! # Command Grammar
//!
//! | Command | Meaning | Responses |
//! |---------|---------|-----------|
//! | `A <ip>[-<ip>] <port>[-<port>]` | add rule | `Rule added`, `Invalid rule` |
//! | `D <ip>[-<ip>] <port>[-<port>]` | delete rule | `Rule deleted`, `Rule not found`, `Rule invalid` |
//! | `L` | list rules | `Rule: ...` / `Query: ...` lines, `No rules` |
//! | `R` | list requests | one line per request, `No requests` |
//! | `C <ip> <port>` | check connection | `Connection accepted`, `Connection rejected`, `Illegal IP address or port specified` |
//! | anything else | | `Illegal request` |
//!
//! # Matching
//!
//! Rules are checked in insertion order and the first rule covering both
//! the address and the port wins. A delete must repeat the add operand
//! byte for byte.

mod engine;
mod error;

pub mod client;
pub mod command;
pub mod config;
pub mod interactive;
pub mod parser;
pub mod request_log;
pub mod rule;
pub mod server;
pub mod store;

// Re-export core types
pub use error::{Error, Result, RuleError};
pub use rule::{AcceptedQuery, AddressRange, MatchOutcome, PortRange, Rule, RuleId};

pub use command::{Command, Response};
pub use config::ServerConfig;
pub use engine::PolicyEngine;
pub use request_log::{Request, RequestLog};
pub use server::PolicyServer;
pub use store::RuleStore;
