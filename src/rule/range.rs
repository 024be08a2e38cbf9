//! Validated address and port ranges.

use std::fmt;
use std::net::Ipv4Addr;

use crate::error::RuleError;

/// A closed IPv4 address interval `low..=high`.
///
/// Validity is a lexicographic comparison of the octets: the first octet
/// that differs must be smaller in `low`. Equal bounds describe a single
/// host. Containment, on the other hand, is checked octet by octet, so
/// `10.0.0.5-10.0.1.1` does not contain `10.0.0.7`.
///
/// # Examples
/// ```
/// use fwpolicy::rule::AddressRange;
/// use std::net::Ipv4Addr;
///
/// let range = AddressRange::new([10, 0, 0, 1], [10, 0, 0, 5]).unwrap();
/// assert!(range.contains(Ipv4Addr::new(10, 0, 0, 3)));
/// assert!(AddressRange::new([10, 0, 0, 5], [10, 0, 0, 1]).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AddressRange {
    low: [u8; 4],
    high: [u8; 4],
}

impl AddressRange {
    /// Create a range, rejecting `low > high`.
    pub fn new(low: [u8; 4], high: [u8; 4]) -> Result<Self, RuleError> {
        // Arrays order lexicographically.
        if low > high {
            return Err(RuleError::InvalidRange(format!(
                "address {} is after {}",
                Ipv4Addr::from(low),
                Ipv4Addr::from(high)
            )));
        }
        Ok(Self { low, high })
    }

    /// Create a degenerate range covering one address.
    pub fn single(addr: [u8; 4]) -> Self {
        Self {
            low: addr,
            high: addr,
        }
    }

    /// Lower bound.
    pub fn low(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.low)
    }

    /// Upper bound.
    pub fn high(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.high)
    }

    /// Check whether every octet of `ip` lies within the matching octet bounds.
    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        ip.octets()
            .iter()
            .zip(self.low.iter().zip(self.high.iter()))
            .all(|(octet, (low, high))| low <= octet && octet <= high)
    }
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.low == self.high {
            write!(f, "{}", self.low())
        } else {
            write!(f, "{}-{}", self.low(), self.high())
        }
    }
}

/// A closed port interval `low..=high`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortRange {
    low: u16,
    high: u16,
}

impl PortRange {
    /// Create a range, rejecting `low > high`.
    pub fn new(low: u16, high: u16) -> Result<Self, RuleError> {
        if low > high {
            return Err(RuleError::InvalidRange(format!(
                "port {} is after {}",
                low, high
            )));
        }
        Ok(Self { low, high })
    }

    /// Create a degenerate range covering one port.
    pub fn single(port: u16) -> Self {
        Self {
            low: port,
            high: port,
        }
    }

    /// Lower bound.
    pub fn low(&self) -> u16 {
        self.low
    }

    /// Upper bound.
    pub fn high(&self) -> u16 {
        self.high
    }

    pub fn contains(&self, port: u16) -> bool {
        self.low <= port && port <= self.high
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.low == self.high {
            write!(f, "{}", self.low)
        } else {
            write!(f, "{}-{}", self.low, self.high)
        }
    }
}
