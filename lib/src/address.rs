//! Address parsing and formatting.
//!
//! Mail libraries accept addresses in several shapes: a plain string that may
//! hold one or more RFC 5322 style addresses, a structured `{name, address}`
//! object, or a list mixing both. Everything is parsed into a flat list of
//! [`Address`] values first; formatting only ever sees that canonical form.
use std::fmt;
use std::mem;

use serde::Deserialize;

use crate::mailjet::types::Recipient;

/// A single parsed mailbox. `email` is never empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Address {
    pub email: String,
    pub name: Option<String>,
}

impl Address {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Renders `"Name" <email>` when a name is present, bare `email` otherwise.
impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.name {
            Some(ref name) => {
                let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
                write!(f, "\"{}\" <{}>", escaped, self.email)
            }
            None => f.write_str(&self.email),
        }
    }
}

/// Address input as handed over by the caller.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AddressInput {
    /// One or more comma separated addresses
    Text(String),
    /// Already split into name and address
    Mailbox {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        address: Option<String>,
    },
    List(Vec<AddressInput>),
}

impl AddressInput {
    /// Flatten this input into parsed addresses, keeping the input order.
    /// Entries without an email are dropped.
    pub fn parse(&self) -> Vec<Address> {
        match *self {
            AddressInput::Text(ref text) => parse_addresses(text),
            AddressInput::Mailbox {
                ref name,
                ref address,
            } => {
                let email = address.as_deref().map(str::trim).unwrap_or("");
                if email.is_empty() {
                    return Vec::new();
                }

                vec![Address {
                    email: email.to_string(),
                    name: name
                        .as_deref()
                        .map(str::trim)
                        .filter(|n| !n.is_empty())
                        .map(String::from),
                }]
            }
            AddressInput::List(ref inputs) => inputs.iter().flat_map(|i| i.parse()).collect(),
        }
    }
}

impl From<&str> for AddressInput {
    fn from(s: &str) -> Self {
        AddressInput::Text(s.to_string())
    }
}

impl From<String> for AddressInput {
    fn from(s: String) -> Self {
        AddressInput::Text(s)
    }
}

impl From<Address> for AddressInput {
    fn from(addr: Address) -> Self {
        AddressInput::Mailbox {
            name: addr.name,
            address: Some(addr.email),
        }
    }
}

impl<T: Into<AddressInput>> From<Vec<T>> for AddressInput {
    fn from(inputs: Vec<T>) -> Self {
        AddressInput::List(inputs.into_iter().map(Into::into).collect())
    }
}

/// Parse a free-form address string into a list of addresses.
///
/// Commas inside quoted names, angle brackets and comments do not split
/// addresses. Group syntax (`Team: a@x.org, b@x.org;`) yields its members.
/// Tokens without an email are skipped.
pub fn parse_addresses(input: &str) -> Vec<Address> {
    split_tokens(input)
        .iter()
        .filter_map(|token| {
            let parsed = parse_token(token);
            if parsed.is_none() {
                log::debug!("Skipping unparseable address token: {:?}", token);
            }
            parsed
        })
        .collect()
}

/// Split on top-level `,` and `;`. A top-level `:` ends a group name,
/// which is thrown away.
fn split_tokens(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();

    let mut quoted = false;
    let mut escaped = false;
    let mut bracketed = false;
    let mut comment_depth = 0usize;

    for c in input.chars() {
        if escaped {
            current.push(c);
            escaped = false;
            continue;
        }

        let top_level = !quoted && !bracketed && comment_depth == 0;

        match c {
            '\\' if quoted || comment_depth > 0 => {
                current.push(c);
                escaped = true;
            }
            '"' if comment_depth == 0 && !bracketed => {
                quoted = !quoted;
                current.push(c);
            }
            '(' if !quoted && !bracketed => {
                comment_depth += 1;
                current.push(c);
            }
            ')' if comment_depth > 0 => {
                comment_depth -= 1;
                current.push(c);
            }
            '<' if !quoted && comment_depth == 0 => {
                bracketed = true;
                current.push(c);
            }
            '>' if bracketed => {
                bracketed = false;
                current.push(c);
            }
            ':' if top_level => current.clear(),
            ',' | ';' if top_level => tokens.push(mem::take(&mut current)),
            _ => current.push(c),
        }
    }

    tokens.push(current);
    tokens.retain(|t| !t.trim().is_empty());

    tokens
}

enum TokenState {
    Text,
    Quoted,
    Bracketed,
    Comment(usize),
}

fn parse_token(token: &str) -> Option<Address> {
    let mut state = TokenState::Text;
    let mut escaped = false;

    let mut quoted_name = String::new();
    let mut has_quoted_name = false;
    let mut bracketed = String::new();
    let mut bracketed_email = None;
    let mut text = String::new();

    for c in token.chars() {
        match state {
            TokenState::Text => match c {
                '"' => {
                    has_quoted_name = true;
                    state = TokenState::Quoted;
                }
                '<' => state = TokenState::Bracketed,
                '(' => state = TokenState::Comment(1),
                _ => text.push(c),
            },
            TokenState::Quoted => {
                if escaped {
                    quoted_name.push(c);
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == '"' {
                    // Separate the quoted part from any text that follows
                    text.push(' ');
                    state = TokenState::Text;
                } else {
                    quoted_name.push(c);
                }
            }
            TokenState::Bracketed => {
                if c == '>' {
                    bracketed_email = Some(mem::take(&mut bracketed));
                    text.push(' ');
                    state = TokenState::Text;
                } else {
                    bracketed.push(c);
                }
            }
            TokenState::Comment(depth) => {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == '(' {
                    state = TokenState::Comment(depth + 1);
                } else if c == ')' {
                    state = if depth == 1 {
                        TokenState::Text
                    } else {
                        TokenState::Comment(depth - 1)
                    };
                }
            }
        }
    }

    // Unterminated `<...`
    if let TokenState::Bracketed = state {
        bracketed_email = Some(bracketed);
    }

    let mut words: Vec<&str> = text.split_whitespace().collect();

    let email = match bracketed_email.as_deref().map(str::trim) {
        Some(email) if !email.is_empty() => email.to_string(),
        _ => {
            let pos = words.iter().position(|w| w.contains('@'))?;
            words.remove(pos).to_string()
        }
    };

    let name = if has_quoted_name && !quoted_name.trim().is_empty() {
        Some(quoted_name.trim().to_string())
    } else if !words.is_empty() {
        Some(words.join(" "))
    } else {
        None
    };

    Some(Address { email, name })
}

/// Single mode: only the first address survives, as a structured recipient.
pub fn format_single(addrs: &[Address]) -> Option<Recipient> {
    addrs.first().map(Recipient::from)
}

/// Bulk mode: every address rendered and joined with `,`.
/// `None` when nothing is left to render.
pub fn format_bulk(addrs: &[Address]) -> Option<String> {
    let rendered: Vec<String> = addrs
        .iter()
        .filter(|a| !a.email.is_empty())
        .map(|a| a.to_string())
        .collect();

    if rendered.is_empty() {
        None
    } else {
        Some(rendered.join(","))
    }
}
