//! Command interpretation.
//!
//! One line of text goes in, one [`Response`] comes out. The interpreter is
//! stateless across lines; all state lives in the [`RuleStore`] and
//! [`RequestLog`] it is handed.

use std::fmt::{self, Write as _};

use crate::error::RuleError;
use crate::parser::{parse_check_operand, parse_rule_operand, split_command, strip_separator};
use crate::request_log::RequestLog;
use crate::rule::MatchOutcome;
use crate::store::RuleStore;

/// A parsed command.
///
/// `Add`, `Delete` and `Check` borrow everything after the opcode
/// byte-for-byte, separator included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    /// `A <ip>[-<ip>] <port>[-<port>]`
    Add(&'a str),
    /// `D <ip>[-<ip>] <port>[-<port>]`
    Delete(&'a str),
    /// `L`
    ListRules,
    /// `R`
    ListRequests,
    /// `C <ip> <port>`
    Check(&'a str),
}

impl<'a> Command<'a> {
    /// Parse a command by its opcode. Operands are validated on execution.
    pub fn parse(line: &'a str) -> Result<Self, RuleError> {
        match split_command(line) {
            (Some('A'), rest) => Ok(Command::Add(rest)),
            (Some('D'), rest) => Ok(Command::Delete(rest)),
            (Some('L'), _) => Ok(Command::ListRules),
            (Some('R'), _) => Ok(Command::ListRequests),
            (Some('C'), rest) => Ok(Command::Check(rest)),
            _ => Err(RuleError::IllegalOpcode),
        }
    }
}

/// Rule identity key: the add command as received, minus leading
/// whitespace.
pub fn rule_key(rest: &str) -> String {
    format!("A{}", rest)
}

/// Query identity key: the check command as received, minus leading
/// whitespace.
pub fn query_key(rest: &str) -> String {
    format!("C{}", rest)
}

/// Strip line terminators and NUL padding a client may have sent.
pub fn normalize_line(raw: &str) -> &str {
    raw.trim_end_matches(['\r', '\n', '\0'])
}

/// Response to one command. `Display` yields the wire text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    RuleAdded,
    InvalidRule,
    RuleDeleted,
    RuleNotFound,
    RuleInvalid,
    /// Formatted rule listing, one `Rule:` line per rule followed by its
    /// `Query:` lines
    Rules(String),
    NoRules,
    /// Formatted request history, one line per request
    Requests(String),
    NoRequests,
    ConnectionAccepted,
    ConnectionRejected,
    IllegalQuery,
    IllegalRequest,
}

impl Response {
    pub fn as_str(&self) -> &str {
        match self {
            Response::RuleAdded => "Rule added",
            Response::InvalidRule => "Invalid rule",
            Response::RuleDeleted => "Rule deleted",
            Response::RuleNotFound => "Rule not found",
            Response::RuleInvalid => "Rule invalid",
            Response::Rules(listing) | Response::Requests(listing) => listing.as_str(),
            Response::NoRules => "No rules",
            Response::NoRequests => "No requests",
            Response::ConnectionAccepted => "Connection accepted",
            Response::ConnectionRejected => "Connection rejected",
            Response::IllegalQuery => "Illegal IP address or port specified",
            Response::IllegalRequest => "Illegal request",
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log a line and execute it against the store.
///
/// Every line is appended to the request log before it is interpreted,
/// including empty and unrecognized ones.
pub fn interpret(line: &str, rules: &mut RuleStore, requests: &mut RequestLog) -> Response {
    let line = normalize_line(line);
    requests.append(line);

    let command = match Command::parse(line) {
        Ok(command) => command,
        Err(e) => {
            log::debug!("Rejected {:?}: {}", line, e);
            return Response::IllegalRequest;
        }
    };

    match command {
        Command::Add(rest) => add(rest, rules),
        Command::Delete(rest) => delete(rest, rules),
        Command::ListRules => list_rules(rules),
        Command::ListRequests => list_requests(requests),
        Command::Check(rest) => check(rest, rules),
    }
}

fn add(rest: &str, rules: &mut RuleStore) -> Response {
    match strip_separator(rest).and_then(parse_rule_operand) {
        Ok((addresses, ports)) => {
            let id = rules.add(rule_key(rest), addresses, ports);
            log::debug!("Added rule {}: {} {}", id, addresses, ports);
            Response::RuleAdded
        }
        Err(e) => {
            log::debug!("Invalid rule {:?}: {}", rest, e);
            Response::InvalidRule
        }
    }
}

fn delete(rest: &str, rules: &mut RuleStore) -> Response {
    if let Err(e) = strip_separator(rest).and_then(parse_rule_operand) {
        log::debug!("Invalid delete {:?}: {}", rest, e);
        return Response::RuleInvalid;
    }
    match rules.delete(&rule_key(rest)) {
        Ok(id) => {
            log::debug!("Deleted rule {}", id);
            Response::RuleDeleted
        }
        Err(_) => Response::RuleNotFound,
    }
}

fn check(rest: &str, rules: &mut RuleStore) -> Response {
    let (ip, port) = match strip_separator(rest).and_then(parse_check_operand) {
        Ok(query) => query,
        Err(e) => {
            log::debug!("Illegal query {:?}: {}", rest, e);
            return Response::IllegalQuery;
        }
    };
    match rules.check(ip, port, &query_key(rest)) {
        MatchOutcome::Accepted(id) => {
            log::debug!("Accepted {}:{} by rule {}", ip, port, id);
            Response::ConnectionAccepted
        }
        MatchOutcome::Rejected => Response::ConnectionRejected,
    }
}

fn list_rules(rules: &RuleStore) -> Response {
    if rules.is_empty() {
        return Response::NoRules;
    }
    let mut listing = String::new();
    for rule in rules.iter() {
        // Writing to a String cannot fail.
        let _ = writeln!(listing, "Rule: {}", rule.raw_text());
        for query in rule.queries() {
            let _ = writeln!(listing, "Query: {} {}", query.ip(), query.port());
        }
    }
    Response::Rules(listing)
}

fn list_requests(requests: &RequestLog) -> Response {
    if requests.is_empty() {
        return Response::NoRequests;
    }
    let mut listing = String::new();
    for request in requests.iter() {
        let _ = writeln!(listing, "{}", request.raw_text());
    }
    Response::Requests(listing)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        rules: RuleStore,
        requests: RequestLog,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                rules: RuleStore::new(),
                requests: RequestLog::new(),
            }
        }

        fn run(&mut self, line: &str) -> String {
            interpret(line, &mut self.rules, &mut self.requests).to_string()
        }
    }

    #[test]
    fn test_command_parse() {
        assert_eq!(Command::parse("A 1.1.1.1 80"), Ok(Command::Add(" 1.1.1.1 80")));
        assert_eq!(Command::parse("D 1.1.1.1 80"), Ok(Command::Delete(" 1.1.1.1 80")));
        assert_eq!(Command::parse("L"), Ok(Command::ListRules));
        assert_eq!(Command::parse("R"), Ok(Command::ListRequests));
        assert_eq!(Command::parse(" C 1.1.1.1 80"), Ok(Command::Check(" 1.1.1.1 80")));
        assert_eq!(Command::parse("X"), Err(RuleError::IllegalOpcode));
        assert_eq!(Command::parse("a 1.1.1.1 80"), Err(RuleError::IllegalOpcode));
        assert_eq!(Command::parse(""), Err(RuleError::IllegalOpcode));
    }

    #[test]
    fn test_empty_state() {
        let mut fx = Fixture::new();
        assert_eq!(fx.run("L"), "No rules");

        assert_eq!(list_requests(&RequestLog::new()), Response::NoRequests);

        let mut fx = Fixture::new();
        // The R command logs itself before listing.
        assert_eq!(fx.run("R"), "R\n");
    }

    #[test]
    fn test_add_and_list() {
        let mut fx = Fixture::new();
        assert_eq!(fx.run("A 10.0.0.1-10.0.0.5 80-90"), "Rule added");
        assert_eq!(fx.run("L"), "Rule: A 10.0.0.1-10.0.0.5 80-90\n");
    }

    #[test]
    fn test_invalid_add_leaves_store_unchanged() {
        let mut fx = Fixture::new();
        fx.run("A 1.1.1.1 80");
        let before = fx.run("L");

        for line in [
            "A 10.0.0.5-10.0.0.1 80",
            "A 10.0.0.1 90-80",
            "A 256.0.0.1 80",
            "A 10.0.0.1 65536",
            "A 10.0.0.1",
            "A",
        ] {
            assert_eq!(fx.run(line), "Invalid rule", "line {:?}", line);
        }
        assert_eq!(fx.run("L"), before);
    }

    #[test]
    fn test_delete_responses() {
        let mut fx = Fixture::new();
        fx.run("A 10.0.0.1-10.0.0.5 80-90");

        assert_eq!(fx.run("D 10.0.0.5-10.0.0.1 80-90"), "Rule invalid");
        assert_eq!(fx.run("D garbage"), "Rule invalid");
        assert_eq!(fx.run("D 10.0.0.1-10.0.0.5  80-90"), "Rule not found");
        assert_eq!(fx.run("D 10.0.0.1-10.0.0.5 80-90"), "Rule deleted");
        assert_eq!(fx.run("D 10.0.0.1-10.0.0.5 80-90"), "Rule not found");
        assert_eq!(fx.run("L"), "No rules");
    }

    #[test]
    fn test_check_responses() {
        let mut fx = Fixture::new();
        fx.run("A 10.0.0.1-10.0.0.5 80-90");

        assert_eq!(fx.run("C 10.0.0.3 85"), "Connection accepted");
        assert_eq!(fx.run("C 192.168.1.1 22"), "Connection rejected");
        assert_eq!(fx.run("C 10.0.0.3"), "Illegal IP address or port specified");
        assert_eq!(fx.run("C 10.0.0.3 70000"), "Illegal IP address or port specified");
        assert_eq!(fx.run("C 10.0.0.3-10.0.0.4 85"), "Illegal IP address or port specified");

        assert_eq!(
            fx.run("L"),
            "Rule: A 10.0.0.1-10.0.0.5 80-90\nQuery: 10.0.0.3 85\n"
        );
    }

    #[test]
    fn test_illegal_requests_are_logged() {
        let mut fx = Fixture::new();
        assert_eq!(fx.run("X 1 2"), "Illegal request");
        assert_eq!(fx.run(""), "Illegal request");
        assert_eq!(fx.run("A 1.1.1.1 80\n"), "Rule added");
        assert_eq!(fx.run("R"), "X 1 2\n\nA 1.1.1.1 80\nR\n");
    }

    #[test]
    fn test_normalize_line() {
        assert_eq!(normalize_line("L\r\n"), "L");
        assert_eq!(normalize_line("L\0\0"), "L");
        assert_eq!(normalize_line("A 1.1.1.1 80"), "A 1.1.1.1 80");
    }

    #[test]
    fn test_keys() {
        assert_eq!(rule_key(" 1.1.1.1 80"), "A 1.1.1.1 80");
        assert_eq!(rule_key("\t1.1.1.1 80"), "A\t1.1.1.1 80");
        assert_eq!(query_key(" 1.1.1.1 80"), "C 1.1.1.1 80");
    }

    #[test]
    fn test_missing_separator_is_rejected() {
        let mut fx = Fixture::new();
        assert_eq!(fx.run("A10.0.0.1 80"), "Invalid rule");
        assert_eq!(fx.run("A 10.0.0.1 80"), "Rule added");
        assert_eq!(fx.run("D10.0.0.1 80"), "Rule invalid");
        assert_eq!(fx.run("C10.0.0.1 80"), "Illegal IP address or port specified");
        assert_eq!(fx.run("L"), "Rule: A 10.0.0.1 80\n");
    }
}
