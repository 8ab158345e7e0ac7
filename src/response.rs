//! The response matcher contract.
//!
//! A [`Request`][crate::Request] can carry a list of response matchers. When
//! the transport layer reads data back from a target, it asks the request to
//! [`match_response`][crate::Request::match_response], which tries each
//! matcher in attachment order and returns the first successful parse.

use crate::{Error, Result};
use std::collections::BTreeMap;

/// A parser for one kind of response.
///
/// Implementations must reject data that does not follow their grammar by
/// returning an [`Error::rejected`] error. Any other error is treated as fatal
/// and stops the matching.
///
/// # Example
///
/// ```
/// use protomut::{Error, ParsedResponse, Response, Result};
///
/// struct Status;
///
/// impl Response for Status {
///     fn name(&self) -> &str {
///         "status"
///     }
///
///     fn parse(&self, data: &[u8]) -> Result<ParsedResponse> {
///         match data.get(..3) {
///             Some(code) if code.iter().all(u8::is_ascii_digit) => {
///                 Ok(ParsedResponse::new(self.name()).variable("code", code))
///             }
///             _ => Err(Error::rejected("not a status line")),
///         }
///     }
/// }
///
/// let parsed = Status.parse(b"200 OK").unwrap();
/// assert_eq!(parsed.get("code"), Some(&b"200"[..]));
/// assert!(Status.parse(b"hello").unwrap_err().is_rejected());
/// ```
pub trait Response: Send + Sync {
    /// A name identifying this kind of response.
    fn name(&self) -> &str;

    /// Parse `data`, or reject it with [`Error::rejected`].
    fn parse(&self, data: &[u8]) -> Result<ParsedResponse>;
}

/// The result of a successful response parse: the matcher's name plus the
/// variables it extracted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedResponse {
    name: String,
    variables: BTreeMap<String, Vec<u8>>,
}

impl ParsedResponse {
    /// Create a parse result for the matcher named `name`, with no variables.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variables: BTreeMap::new(),
        }
    }

    /// Add a variable, builder style.
    pub fn variable(mut self, name: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    /// The name of the matcher that produced this result.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The value of the variable `name`, if it was extracted.
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.variables.get(name).map(Vec::as_slice)
    }

    /// All extracted variables.
    pub fn variables(&self) -> &BTreeMap<String, Vec<u8>> {
        &self.variables
    }
}

/// A matcher for responses that start with a fixed prefix.
///
/// The data following the prefix is extracted as the `body` variable.
///
/// # Example
///
/// ```
/// use protomut::response::{Prefix, Response};
///
/// let ok = Prefix::new("ok", "+OK");
/// let parsed = ok.parse(b"+OK ready").unwrap();
/// assert_eq!(parsed.get("body"), Some(&b" ready"[..]));
/// assert!(ok.parse(b"-ERR").unwrap_err().is_rejected());
/// ```
#[derive(Clone, Debug)]
pub struct Prefix {
    name: String,
    prefix: Vec<u8>,
}

impl Prefix {
    /// Create a matcher named `name` accepting data that starts with `prefix`.
    pub fn new(name: impl Into<String>, prefix: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            prefix: prefix.into(),
        }
    }
}

impl Response for Prefix {
    fn name(&self) -> &str {
        &self.name
    }

    fn parse(&self, data: &[u8]) -> Result<ParsedResponse> {
        match data.strip_prefix(&self.prefix[..]) {
            Some(body) => Ok(ParsedResponse::new(self.name.clone()).variable("body", body)),
            None => Err(Error::rejected(format!(
                "data does not start with the {:?} prefix",
                self.name
            ))),
        }
    }
}
