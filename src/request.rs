//! The root of a message tree.

use crate::block::Scope;
use crate::log;
use crate::mutant::validate_name;
use crate::registry::{self, Element};
use crate::{Block, Error, Fuzz, Node, ParsedResponse, RenderOptions, Response, Result};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub(crate) struct State {
    pub(crate) root: Node,
    names: HashMap<String, Vec<usize>>,
    // Paths of the blocks still open for insertion, innermost last.
    open: Vec<Vec<usize>>,
    responses: Vec<Arc<dyn Response>>,
    // Path of the only leaf that currently differs from its original value.
    active: Option<Vec<usize>>,
}

impl State {
    pub(crate) fn scope(&self) -> Scope<'_> {
        Scope::registered(&self.root, &self.names)
    }

    fn render(&self, options: &RenderOptions<'_>) -> Vec<u8> {
        self.root.render_in(&self.scope(), options)
    }

    fn name(&self) -> &str {
        self.root.name().unwrap_or_default()
    }

    /// Check that the tree is fully assembled before it is driven.
    fn ensure_assembled(&self) -> Result<()> {
        if !self.open.is_empty() {
            return Err(Error::unclosed_blocks(self.open.len()));
        }

        let mut problem = None;
        self.root.walk(&mut Vec::new(), &mut |path, node| {
            let field = node
                .as_block()
                .and_then(Block::dependency)
                .map(|dep| dep.field());
            let Some(field) = field else { return };
            if problem.is_some() {
                return;
            }
            problem = match self.names.get(field) {
                None => Some(Error::unknown_element(field)),
                // A block cannot be gated on its own render.
                Some(target) if path.starts_with(target) => {
                    Some(Error::cyclic_dependency(field))
                }
                Some(_) => None,
            };
        });
        match problem {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// The root of a message tree: a block with a name registry, a construction
/// stack of open blocks, and a list of response matchers.
///
/// A `Request` is a cheap handle; clones refer to the same tree. Creating a
/// request registers it in the process-wide [`registry`] under its name.
///
/// # Assembly
///
/// Fields and blocks are [`push`][Request::push]ed into the innermost open
/// block, or into the request itself when no block is open. Pushing a block
/// opens it; [`close_block`][Request::close_block] closes the innermost one.
///
/// # Driving
///
/// Once every block is closed, [`mutations`][Request::mutations] enumerates
/// every single-field mutation of the whole tree, in pre-order over the
/// fuzzable fields, yielding the render of the whole request at each step.
/// Only one enumeration should be in flight per request at a time.
///
/// # Example
///
/// ```
/// # fn foo() -> protomut::Result<()> {
/// use protomut::{primitives as p, Block, Request};
///
/// let request = Request::new("request_example")?;
/// request.push(p::group("USER", ["user", "USERX"]).named("verb")?)?;
/// request.push(p::fixed(" "))?;
/// request.open_block(Block::new().named("args")?)?;
/// request.push(p::group("anonymous", ["%s%s%s"]))?;
/// request.close_block()?;
///
/// assert_eq!(request.num_mutations(), 3);
/// assert_eq!(request.render(), b"USER anonymous");
///
/// let cases: Vec<Vec<u8>> = request.mutations(0)?.map(|m| m.buffer).collect();
/// assert_eq!(cases, [&b"user anonymous"[..], b"USERX anonymous", b"USER %s%s%s"]);
/// # Ok(())
/// # }
/// # foo().unwrap();
/// ```
#[derive(Clone)]
pub struct Request {
    inner: Arc<Mutex<State>>,
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("Request")
            .field("name", &state.name())
            .field("root", &state.root)
            .field("open", &state.open.len())
            .field("responses", &state.responses.len())
            .finish()
    }
}

impl Request {
    /// Create a new, empty request named `name` and register it in the
    /// process-wide [`registry`], replacing any request already registered
    /// under that name.
    pub fn new(name: &str) -> Result<Request> {
        validate_name(name)?;
        let request = Request {
            inner: Arc::new(Mutex::new(State {
                root: Node::Composite(Block::new().named(name)?),
                names: HashMap::new(),
                open: Vec::new(),
                responses: Vec::new(),
                active: None,
            })),
        };
        registry::register(&request, name);
        Ok(request)
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, State> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn same_as(&self, other: &Request) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn local(&self, name: &str) -> Option<Element> {
        let path = self.lock().names.get(name)?.clone();
        Some(Element::new(self.clone(), path))
    }

    /// This request's name.
    pub fn name(&self) -> String {
        self.lock().name().to_string()
    }

    /// Attach a field or block to the innermost open block, or to the request
    /// itself when no block is open.
    ///
    /// Every named node in `item`'s subtree is registered. Fails with
    /// [`DuplicateName`][crate::ErrorKind::DuplicateName], leaving the request
    /// untouched, if any of those names is already registered.
    ///
    /// A pushed block becomes the innermost open block until it is closed with
    /// [`close_block`][Request::close_block].
    pub fn push(&self, item: impl Into<Node>) -> Result<()> {
        let item = item.into();
        let mut guard = self.lock();
        let state = &mut *guard;

        let mut found: Vec<(String, Vec<usize>)> = Vec::new();
        item.walk(&mut Vec::new(), &mut |path, node| {
            if let Some(name) = node.name() {
                found.push((name.to_string(), path.to_vec()));
            }
        });
        for (i, (name, _)) in found.iter().enumerate() {
            if state.names.contains_key(name) || found[..i].iter().any(|(seen, _)| seen == name) {
                return Err(Error::duplicate_name(name.clone()));
            }
        }

        let mut path = state.open.last().cloned().unwrap_or_default();
        let Some(Node::Composite(parent)) = state.root.get_mut(&path) else {
            return Err(Error::other("an open block no longer exists"));
        };
        path.push(parent.children().len());
        let opens = matches!(item, Node::Composite(_));
        parent.push(item);

        for (name, relative) in found {
            let mut full = path.clone();
            full.extend(relative);
            log::debug!("registered {name:?} at {full:?} in request {:?}", state.name());
            state.names.insert(name, full);
        }
        if opens {
            state.open.push(path);
        }
        Ok(())
    }

    /// Push `block` and open it, so that subsequent pushes go inside it.
    pub fn open_block(&self, block: Block) -> Result<()> {
        self.push(block)
    }

    /// Close the innermost open block.
    ///
    /// Fails with [`StackUnderflow`][crate::ErrorKind::StackUnderflow] if no
    /// block is open.
    pub fn close_block(&self) -> Result<()> {
        self.lock()
            .open
            .pop()
            .map(drop)
            .ok_or_else(Error::stack_underflow)
    }

    /// Whether every opened block was closed.
    pub fn is_assembled(&self) -> bool {
        self.lock().open.is_empty()
    }

    /// Find an element by name in this request, or else by path through the
    /// process-wide [`registry`].
    pub fn lookup(&self, name: &str) -> Result<Element> {
        match self.local(name) {
            Some(element) => Ok(element),
            None => registry::resolve_path(name),
        }
    }

    /// Resolve a `request_name[.element_name]` path. See
    /// [`registry::resolve_path`].
    pub fn resolve_path(path: &str) -> Result<Element> {
        registry::resolve_path(path)
    }

    /// The number of mutations of the whole tree: the sum over its fuzzable
    /// fields.
    pub fn num_mutations(&self) -> usize {
        self.lock().root.num_mutations()
    }

    /// The index of the current mutation; `0` is the original state.
    pub fn mutant_index(&self) -> usize {
        self.lock().root.mutant_index()
    }

    /// Render the whole tree in its current state.
    pub fn render(&self) -> Vec<u8> {
        self.render_with(&RenderOptions::new())
    }

    /// Render the whole tree with the given options.
    pub fn render_with(&self, options: &RenderOptions<'_>) -> Vec<u8> {
        self.lock().render(options)
    }

    /// Render the whole tree with every field at its original value.
    pub fn render_original(&self) -> Vec<u8> {
        self.render_with(&RenderOptions::new().original(true))
    }

    /// Move the whole tree to mutation `index`.
    ///
    /// Fails with [`OutOfRange`][crate::ErrorKind::OutOfRange] if `index` is
    /// greater than [`num_mutations`][Request::num_mutations], and with
    /// [`UnclosedBlocks`][crate::ErrorKind::UnclosedBlocks] if the request is
    /// not fully assembled. A dependency on a missing field fails with
    /// [`UnknownElement`][crate::ErrorKind::UnknownElement], and a block that
    /// depends on itself or an enclosing block fails with
    /// [`CyclicDependency`][crate::ErrorKind::CyclicDependency].
    pub fn goto(&self, index: usize) -> Result<()> {
        let mut guard = self.lock();
        let state = &mut *guard;
        state.ensure_assembled()?;
        state.active = state.root.goto_tracked(index)?;
        log::debug!("request {:?} went to mutation {index}", state.name());
        Ok(())
    }

    /// Return every field to its original value.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.root.reset();
        state.active = None;
    }

    /// The field that currently differs from its original value, if any.
    pub fn active_mutant(&self) -> Option<Element> {
        let path = self.lock().active.clone()?;
        Some(Element::new(self.clone(), path))
    }

    /// Every fuzzable field of the tree, in enumeration order.
    pub fn fuzzable_mutants(&self) -> Vec<Element> {
        let state = self.lock();
        let mut paths = Vec::new();
        state.root.walk(&mut Vec::new(), &mut |path, node| {
            if node.as_mutant().is_some_and(|m| m.is_fuzzable()) {
                paths.push(path.to_vec());
            }
        });
        drop(state);
        paths
            .into_iter()
            .map(|path| Element::new(self.clone(), path))
            .collect()
    }

    /// Reset, seek to mutation `start`, and return the lazy sequence of the
    /// following mutations.
    ///
    /// The first step yielded is mutation `start + 1`. Fails like
    /// [`goto`][Request::goto].
    pub fn mutations(&self, start: usize) -> Result<Mutations> {
        {
            let mut guard = self.lock();
            let state = &mut *guard;
            state.ensure_assembled()?;
            state.root.reset();
            state.active = state.root.goto_tracked(start)?;
        }
        log::debug!("enumerating request {:?} from mutation {start}", self.name());
        Ok(Mutations {
            request: self.clone(),
            done: false,
        })
    }

    /// Attach a response matcher.
    ///
    /// Attaching the same matcher instance again is a no-op.
    pub fn add_response(&self, response: Arc<dyn Response>) {
        let mut state = self.lock();
        let ptr = Arc::as_ptr(&response) as *const ();
        if state
            .responses
            .iter()
            .all(|r| Arc::as_ptr(r) as *const () != ptr)
        {
            state.responses.push(response);
        }
    }

    /// Parse `data` with the first attached matcher that accepts it, trying
    /// them in attachment order.
    ///
    /// Fails with
    /// [`NoMatchingResponse`][crate::ErrorKind::NoMatchingResponse] if every
    /// matcher rejects the data. Errors other than rejections are returned
    /// as-is.
    pub fn match_response(&self, data: &[u8]) -> Result<ParsedResponse> {
        let responses = self.lock().responses.clone();
        for response in responses {
            match response.parse(data) {
                Ok(parsed) => return Ok(parsed),
                Err(e) if e.is_rejected() => {
                    log::trace!("response {:?} rejected the data: {e}", response.name());
                }
                Err(e) => return Err(e),
            }
        }
        Err(Error::no_matching_response())
    }
}

/// One step of a request's enumeration.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct Mutation {
    /// The request's mutation index after this step, from `1` to
    /// `num_mutations`.
    pub index: usize,

    /// The field that differs from its original value in this step.
    pub element: Element,

    /// The render of the whole request.
    pub buffer: Vec<u8>,
}

/// The lazy sequence of a request's mutations.
///
/// See [`Request::mutations`]. Once it has returned `None` the request is
/// back in its original state and the sequence stays finished.
#[derive(Debug)]
pub struct Mutations {
    request: Request,
    done: bool,
}

impl Mutations {
    /// The request being enumerated.
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Render the request's current state without advancing.
    pub fn peek(&self) -> Vec<u8> {
        self.request.render()
    }

    /// Return the request to its original state and restart the sequence from
    /// the first mutation.
    pub fn reset(&mut self) {
        self.request.reset();
        self.done = false;
    }
}

impl Iterator for Mutations {
    type Item = Mutation;

    fn next(&mut self) -> Option<Mutation> {
        if self.done {
            return None;
        }

        let mut guard = self.request.lock();
        let state = &mut *guard;
        match state.root.advance_tracked() {
            Some(path) => {
                state.active = Some(path.clone());
                let buffer = state.render(&RenderOptions::new());
                let index = state.root.mutant_index();
                log::trace!("mutation {index} of {:?} at {path:?}", state.name());
                drop(guard);
                Some(Mutation {
                    index,
                    element: Element::new(self.request.clone(), path),
                    buffer,
                })
            }
            None => {
                state.active = None;
                self.done = true;
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            return (0, Some(0));
        }
        let state = self.request.lock();
        let left = state
            .root
            .num_mutations()
            .saturating_sub(state.root.mutant_index());
        (left, Some(left))
    }
}
