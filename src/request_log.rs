//! Append-only history of received commands.

/// One received command, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    raw_text: String,
}

impl Request {
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
        }
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    /// First character of the command, or `None` for an empty line.
    pub fn opcode(&self) -> Option<char> {
        self.raw_text.chars().next()
    }
}

/// RequestLog records every command in arrival order, valid or not.
///
/// Entries are never removed for the lifetime of the process.
#[derive(Debug, Default)]
pub struct RequestLog {
    entries: Vec<Request>,
}

impl RequestLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, raw_text: impl Into<String>) {
        self.entries.push(Request::new(raw_text));
    }

    /// Iterate oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Request> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
