//! The process-wide registry of requests, and path lookups through it.
//!
//! Every [`Request`] registers itself here under its name when it is created.
//! Elements of any registered request can then be found by a path of the form
//! `request_name` or `request_name.element_name`.
//!
//! The registry is never pruned by this crate. Callers that tear requests
//! down can [`remove`] them explicitly.
//!
//! # Example
//!
//! ```
//! # fn foo() -> protomut::Result<()> {
//! use protomut::{primitives, registry, Request};
//!
//! let login = Request::new("registry_login")?;
//! login.push(primitives::group("guest", ["admin"]).named("user")?)?;
//!
//! let user = registry::resolve_path("registry_login.user")?;
//! assert_eq!(user, login.lookup("user")?);
//! assert_eq!(user.render(), b"guest");
//!
//! assert!(registry::resolve_path("no_such_request.user")
//!     .unwrap_err()
//!     .is_unknown_request());
//! # Ok(())
//! # }
//! # foo().unwrap();
//! ```

use crate::log;
use crate::mutant::NAME_PATTERN;
use crate::{Error, Fuzz, Node, RenderOptions, Request, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

static REQUESTS: Lazy<Mutex<HashMap<String, Request>>> = Lazy::new(Default::default);

static PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^(?P<request>{NAME_PATTERN})(?:\.(?P<element>{NAME_PATTERN}))?$"
    ))
    .expect("valid path pattern")
});

fn requests() -> MutexGuard<'static, HashMap<String, Request>> {
    REQUESTS.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn register(request: &Request, name: &str) {
    if requests()
        .insert(name.to_string(), request.clone())
        .is_some()
    {
        log::warn!("request {name:?} replaced an earlier request with the same name");
    } else {
        log::debug!("registered request {name:?}");
    }
}

/// Get the request registered as `name`.
pub fn get(name: &str) -> Option<Request> {
    requests().get(name).cloned()
}

/// Remove the request registered as `name`, returning it.
///
/// The request itself stays usable; it is only no longer reachable by path.
pub fn remove(name: &str) -> Option<Request> {
    let removed = requests().remove(name);
    if removed.is_some() {
        log::debug!("removed request {name:?}");
    }
    removed
}

/// Resolve a `request_name` or `request_name.element_name` path.
///
/// Returns the request itself when the path has no element segment.
///
/// Fails with:
///
/// * [`InvalidPath`][crate::ErrorKind::InvalidPath] if `path` does not follow
///   the grammar, where each segment matches `[A-Za-z0-9_]+`,
/// * [`UnknownRequest`][crate::ErrorKind::UnknownRequest] if no request is
///   registered under the first segment,
/// * [`UnknownElement`][crate::ErrorKind::UnknownElement] if that request has
///   no element named by the second segment.
pub fn resolve_path(path: &str) -> Result<Element> {
    let caps = PATH
        .captures(path)
        .ok_or_else(|| Error::invalid_path(path))?;

    let request_name = &caps["request"];
    let request = get(request_name).ok_or_else(|| Error::unknown_request(request_name))?;

    match caps.name("element") {
        None => Ok(Element::new(request, Vec::new())),
        Some(element) => request
            .local(element.as_str())
            .ok_or_else(|| Error::unknown_element(element.as_str())),
    }
}

/// A handle to one element of a request's tree, or to the request itself.
///
/// Two handles are equal when they point at the same position of the same
/// request instance.
#[derive(Clone)]
pub struct Element {
    request: Request,
    path: Vec<usize>,
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.request.same_as(&other.request) && self.path == other.path
    }
}

impl Eq for Element {}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("request", &self.request.name())
            .field("path", &self.path)
            .field("name", &self.name())
            .finish()
    }
}

impl Element {
    pub(crate) fn new(request: Request, path: Vec<usize>) -> Self {
        Self { request, path }
    }

    /// The request this element belongs to.
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// The child indices leading from the request's root to this element.
    pub fn path(&self) -> &[usize] {
        &self.path
    }

    /// Whether this handle points at the request itself.
    pub fn is_request(&self) -> bool {
        self.path.is_empty()
    }

    /// Run `f` on a snapshot of this element's node.
    ///
    /// The request is not locked while `f` runs, so `f` may use the request
    /// and its elements. Changes made meanwhile do not show in the snapshot.
    pub fn with_node<R>(&self, f: impl FnOnce(&Node) -> R) -> Option<R> {
        let node = self.request.lock().root.get(&self.path).cloned()?;
        Some(f(&node))
    }

    /// The element's name, if it has one.
    pub fn name(&self) -> Option<String> {
        self.with_node(|node| node.name().map(str::to_string))
            .flatten()
    }

    /// The element's current value: a field's value, or a block's render.
    pub fn value(&self) -> Vec<u8> {
        match self.with_node(|node| node.as_mutant().map(|m| m.value().to_vec())) {
            Some(Some(value)) => value,
            _ => self.render(),
        }
    }

    /// Render this element within its request.
    pub fn render(&self) -> Vec<u8> {
        self.render_with(&RenderOptions::new())
    }

    /// Render this element within its request, with the given options.
    pub fn render_with(&self, options: &RenderOptions<'_>) -> Vec<u8> {
        let state = self.request.lock();
        match state.root.get(&self.path) {
            Some(node) => node.render_in(&state.scope(), options),
            None => Vec::new(),
        }
    }

    /// The number of mutations of this element.
    pub fn num_mutations(&self) -> usize {
        self.with_node(Fuzz::num_mutations).unwrap_or(0)
    }

    /// The index of this element's current mutation.
    pub fn mutant_index(&self) -> usize {
        self.with_node(Fuzz::mutant_index).unwrap_or(0)
    }

    /// Whether this element differs from its original value: for a field, its
    /// cursor is past `0`.
    pub fn is_mutated(&self) -> bool {
        self.mutant_index() > 0
    }
}
