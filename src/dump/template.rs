// Message template
// Author: kelexine (https://github.com/kelexine)

use std::fmt;

pub const DEFAULT_TEMPLATE: &str = "HTTP dump:\n%s\n\n%s\n";

const SLOT: &str = "%s";

/// Two-slot message format. The first `%s` receives the request dump, the
/// second the response dump or error text. Slots beyond the second are kept
/// literally; missing slots simply drop the corresponding half.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template(String);

impl Default for Template {
    fn default() -> Self {
        Self(DEFAULT_TEMPLATE.to_string())
    }
}

impl Template {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn render(&self, request: &str, response: &str) -> String {
        let mut out = String::with_capacity(self.0.len() + request.len() + response.len());
        let mut parts = self.0.splitn(3, SLOT);

        if let Some(head) = parts.next() {
            out.push_str(head);
        }
        if let Some(middle) = parts.next() {
            out.push_str(request);
            out.push_str(middle);
        }
        if let Some(tail) = parts.next() {
            out.push_str(response);
            out.push_str(tail);
        }
        out
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Template {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Template {
    fn from(s: String) -> Self {
        Self(s)
    }
}
