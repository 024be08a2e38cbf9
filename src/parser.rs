//! Command line splitting and operand parsing.
//!
//! Operands look like `<ip>[-<ip>] <port>[-<port>]` for rules and
//! `<ip> <port>` for checks. Malformed tokens yield
//! [`RuleError::InvalidFormat`]; well-formed numbers outside their bounds and
//! reversed ranges yield [`RuleError::InvalidRange`].

use once_cell::sync::Lazy;
use regex::Regex;
use std::net::Ipv4Addr;

use crate::error::RuleError;
use crate::rule::{AddressRange, PortRange};

/// Four dot-separated decimal components. Bounds are checked after matching
/// so that `300.1.1.1` is reported as out of range rather than malformed.
static ADDRESS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]+)\.([0-9]+)\.([0-9]+)\.([0-9]+)$")
        .expect("ADDRESS_PATTERN: hardcoded regex is invalid")
});

const MAX_OCTET: u32 = u8::MAX as u32;
const MAX_PORT: u32 = u16::MAX as u32;

/// Split a command line into its opcode and the text that follows it.
///
/// The opcode is the first non-whitespace character. The remainder is
/// returned byte-for-byte, separator included; see [`strip_separator`].
///
/// # Examples
/// ```
/// use fwpolicy::parser::split_command;
///
/// assert_eq!(split_command("A 10.0.0.1 80"), (Some('A'), " 10.0.0.1 80"));
/// assert_eq!(split_command("  L"), (Some('L'), ""));
/// assert_eq!(split_command(""), (None, ""));
/// ```
pub fn split_command(line: &str) -> (Option<char>, &str) {
    let line = line.trim_start();
    let mut chars = line.chars();
    match chars.next() {
        Some(opcode) => (Some(opcode), chars.as_str()),
        None => (None, ""),
    }
}

/// Drop the single whitespace separator between an opcode and its operand.
///
/// An operand glued to its opcode is a format error.
pub fn strip_separator(rest: &str) -> Result<&str, RuleError> {
    match rest.chars().next() {
        Some(sep) if sep.is_whitespace() => Ok(&rest[sep.len_utf8()..]),
        _ => Err(RuleError::InvalidFormat(
            "missing separator after opcode".to_string(),
        )),
    }
}

/// Parse a rule operand: an address token and a port token, each either a
/// single value or a `low-high` range.
pub fn parse_rule_operand(operand: &str) -> Result<(AddressRange, PortRange), RuleError> {
    let (address_token, port_token) = two_tokens(operand)?;

    let addresses = match address_token.split_once('-') {
        Some((low, high)) => AddressRange::new(parse_address(low)?, parse_address(high)?)?,
        None => AddressRange::single(parse_address(address_token)?),
    };

    let ports = match port_token.split_once('-') {
        Some((low, high)) => PortRange::new(parse_port(low)?, parse_port(high)?)?,
        None => PortRange::single(parse_port(port_token)?),
    };

    Ok((addresses, ports))
}

/// Parse a check operand: a single address and a single port.
pub fn parse_check_operand(operand: &str) -> Result<(Ipv4Addr, u16), RuleError> {
    let (address_token, port_token) = two_tokens(operand)?;
    let ip = Ipv4Addr::from(parse_address(address_token)?);
    let port = parse_port(port_token)?;
    Ok((ip, port))
}

/// Parse a dotted-quad address into its octets.
pub fn parse_address(token: &str) -> Result<[u8; 4], RuleError> {
    let captures = ADDRESS_PATTERN
        .captures(token)
        .ok_or_else(|| RuleError::InvalidFormat(format!("invalid address: {:?}", token)))?;

    let mut octets = [0u8; 4];
    for (i, octet) in octets.iter_mut().enumerate() {
        let digits = captures.get(i + 1).map_or("", |m| m.as_str());
        *octet = parse_bounded(digits, MAX_OCTET, "octet")? as u8;
    }
    Ok(octets)
}

/// Parse a decimal port number.
pub fn parse_port(token: &str) -> Result<u16, RuleError> {
    Ok(parse_bounded(token, MAX_PORT, "port")? as u16)
}

fn two_tokens(operand: &str) -> Result<(&str, &str), RuleError> {
    let mut tokens = operand.split_whitespace();
    let address = tokens
        .next()
        .ok_or_else(|| RuleError::InvalidFormat("missing address".to_string()))?;
    let port = tokens
        .next()
        .ok_or_else(|| RuleError::InvalidFormat("missing port".to_string()))?;
    if let Some(extra) = tokens.next() {
        return Err(RuleError::InvalidFormat(format!(
            "unexpected token: {:?}",
            extra
        )));
    }
    Ok((address, port))
}

fn parse_bounded(token: &str, max: u32, what: &str) -> Result<u32, RuleError> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RuleError::InvalidFormat(format!(
            "invalid {}: {:?}",
            what, token
        )));
    }
    // All digits, so parsing can only fail on overflow.
    match token.parse::<u32>() {
        Ok(value) if value <= max => Ok(value),
        _ => Err(RuleError::InvalidRange(format!(
            "{} {} exceeds {}",
            what, token, max
        ))),
    }
}
