//! Composite nodes: blocks of fields, the closed [`Node`] enum, dependency
//! descriptors, and the encoder contract.

use crate::log;
use crate::mutant::validate_name;
use crate::{Error, Fuzz, Mutant, RenderOptions, Result};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// A pure transform applied to a block's concatenated child render.
///
/// Any `Fn(Vec<u8>) -> Vec<u8>` closure is an encoder.
///
/// # Example
///
/// ```
/// use protomut::{primitives, Block, Fuzz};
///
/// let block = Block::new()
///     .child(primitives::fixed("abc"))
///     .encoder(|payload: Vec<u8>| payload.to_ascii_uppercase());
///
/// assert_eq!(block.render(), b"ABC");
/// ```
pub trait Encode: Send + Sync {
    /// Transform the rendered `payload`.
    fn encode(&self, payload: Vec<u8>) -> Vec<u8>;
}

impl<F> Encode for F
where
    F: Fn(Vec<u8>) -> Vec<u8> + Send + Sync,
{
    fn encode(&self, payload: Vec<u8>) -> Vec<u8> {
        self(payload)
    }
}

/// How a [`Dependency`] compares its target values against the referenced
/// field's current value.
///
/// Ordered comparisons read `value <op> field`: a `Gt` dependency on the value
/// `5` is met while the field is below `5`. They are lexicographic over the
/// rendered bytes, which is numeric order for fixed-width big-endian integers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Compare {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `<`
    Lt,
    /// `<=`
    Le,
}

impl Compare {
    fn holds(self, lhs: &[u8], rhs: &[u8]) -> bool {
        match self {
            Compare::Eq => lhs == rhs,
            Compare::Ne => lhs != rhs,
            Compare::Gt => lhs > rhs,
            Compare::Ge => lhs >= rhs,
            Compare::Lt => lhs < rhs,
            Compare::Le => lhs <= rhs,
        }
    }
}

impl FromStr for Compare {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "==" => Ok(Compare::Eq),
            "!=" => Ok(Compare::Ne),
            ">" => Ok(Compare::Gt),
            ">=" => Ok(Compare::Ge),
            "<" => Ok(Compare::Lt),
            "<=" => Ok(Compare::Le),
            _ => Err(Error::other(format!("unknown comparator {s:?}"))),
        }
    }
}

/// A condition gating whether a block renders its content or nothing, based on
/// the current value of another named field in the same request.
///
/// # Example
///
/// ```
/// use protomut::{primitives, Block, Compare, Dependency, Fuzz};
///
/// # fn foo() -> protomut::Result<()> {
/// let mut message = Block::new()
///     .child(primitives::group(b"\x01", [b"\x02"]).named("version")?)
///     .child(
///         Block::new()
///             .depends_on(Dependency::new("version", Compare::Eq, b"\x02"))
///             .child(primitives::fixed("v2-only")),
///     );
///
/// assert_eq!(message.render(), b"\x01");
/// message.advance();
/// assert_eq!(message.render(), b"\x02v2-only");
/// # Ok(())
/// # }
/// # foo().unwrap();
/// ```
#[derive(Clone, Debug)]
pub struct Dependency {
    field: String,
    compare: Compare,
    values: Vec<Vec<u8>>,
}

impl Dependency {
    /// Depend on `field` comparing to a single `value`.
    pub fn new(field: impl Into<String>, compare: Compare, value: impl Into<Vec<u8>>) -> Self {
        Self {
            field: field.into(),
            compare,
            values: vec![value.into()],
        }
    }

    /// Depend on `field` comparing to a set of `values`.
    ///
    /// With `==` the field must equal one of the values, with `!=` it must
    /// equal none of them, and an ordered comparison must hold for at least
    /// one of them.
    pub fn any_of<V>(
        field: impl Into<String>,
        compare: Compare,
        values: impl IntoIterator<Item = V>,
    ) -> Self
    where
        V: Into<Vec<u8>>,
    {
        Self {
            field: field.into(),
            compare,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// The name of the referenced field.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// The comparator.
    pub fn compare(&self) -> Compare {
        self.compare
    }

    /// The target values.
    pub fn values(&self) -> &[Vec<u8>] {
        &self.values
    }

    /// Whether the dependency is met when the referenced field's current value
    /// is `current`.
    pub fn is_met(&self, current: &[u8]) -> bool {
        let mut values = self.values.iter();
        match self.compare {
            Compare::Eq => values.any(|v| v[..] == *current),
            Compare::Ne => !values.any(|v| v[..] == *current),
            ordered => values.any(|v| ordered.holds(v, current)),
        }
    }
}

/// Where dependency fields are resolved during a render.
enum Lookup<'a> {
    /// Inside a request: through its flat name registry.
    Registered {
        root: &'a Node,
        names: &'a HashMap<String, Vec<usize>>,
    },
    /// A bare block: by searching its own subtree.
    Detached(&'a Block),
}

enum Target<'a> {
    Node(&'a Node),
    Block(&'a Block),
}

pub(crate) struct Scope<'a> {
    lookup: Lookup<'a>,
    // Dependency fields whose value is being rendered, outermost first.
    resolving: RefCell<Vec<String>>,
}

impl<'a> Scope<'a> {
    pub(crate) fn registered(root: &'a Node, names: &'a HashMap<String, Vec<usize>>) -> Self {
        Self {
            lookup: Lookup::Registered { root, names },
            resolving: RefCell::default(),
        }
    }

    pub(crate) fn detached(block: &'a Block) -> Self {
        Self {
            lookup: Lookup::Detached(block),
            resolving: RefCell::default(),
        }
    }

    /// The current value of `field`, or `None` if it is not registered or its
    /// value depends on itself.
    fn current_value(&self, field: &str) -> Option<Vec<u8>> {
        if self.resolving.borrow().iter().any(|f| f == field) {
            log::warn!("dependency field {field:?} depends on its own value");
            return None;
        }

        let target = match &self.lookup {
            Lookup::Registered { root, names } => Target::Node(root.get(names.get(field)?)?),
            Lookup::Detached(block) if block.name() == Some(field) => Target::Block(block),
            Lookup::Detached(block) => Target::Node(block.find(field)?),
        };

        self.resolving.borrow_mut().push(field.to_string());
        let value = match target {
            Target::Node(node) => node.current_value(self),
            Target::Block(block) => block.render_in(self, &RenderOptions::new()),
        };
        self.resolving.borrow_mut().pop();
        Some(value)
    }
}

/// A node of a message tree: either an atomic field or a block of nodes.
#[derive(Clone, Debug)]
pub enum Node {
    /// An atomic fuzzable field.
    Leaf(Mutant),
    /// A block of child nodes.
    Composite(Block),
}

impl From<Mutant> for Node {
    fn from(mutant: Mutant) -> Self {
        Node::Leaf(mutant)
    }
}

impl From<Block> for Node {
    fn from(block: Block) -> Self {
        Node::Composite(block)
    }
}

impl Node {
    /// This node's name, if it has one.
    pub fn name(&self) -> Option<&str> {
        match self {
            Node::Leaf(m) => m.name(),
            Node::Composite(b) => b.name(),
        }
    }

    /// Whether this node takes part in the enumeration. Blocks always do.
    pub fn is_fuzzable(&self) -> bool {
        match self {
            Node::Leaf(m) => m.is_fuzzable(),
            Node::Composite(_) => true,
        }
    }

    /// The leaf, if this node is one.
    pub fn as_mutant(&self) -> Option<&Mutant> {
        match self {
            Node::Leaf(m) => Some(m),
            Node::Composite(_) => None,
        }
    }

    /// The block, if this node is one.
    pub fn as_block(&self) -> Option<&Block> {
        match self {
            Node::Leaf(_) => None,
            Node::Composite(b) => Some(b),
        }
    }

    /// The descendant at `path`, a sequence of child indices. The empty path
    /// is this node.
    pub fn get(&self, path: &[usize]) -> Option<&Node> {
        match path.split_first() {
            None => Some(self),
            Some((&i, rest)) => self.as_block()?.children.get(i)?.get(rest),
        }
    }

    pub(crate) fn get_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        match path.split_first() {
            None => Some(self),
            Some((&i, rest)) => match self {
                Node::Composite(b) => b.children.get_mut(i)?.get_mut(rest),
                Node::Leaf(_) => None,
            },
        }
    }

    /// Find the first node named `name` in this subtree, in pre-order.
    pub fn find(&self, name: &str) -> Option<&Node> {
        if self.name() == Some(name) {
            return Some(self);
        }
        self.as_block()?.find(name)
    }

    /// Visit every node of this subtree in pre-order, with its path relative to
    /// this node.
    pub(crate) fn walk<'a>(&'a self, path: &mut Vec<usize>, f: &mut impl FnMut(&[usize], &'a Node)) {
        f(path, self);
        if let Node::Composite(b) = self {
            for (i, child) in b.children.iter().enumerate() {
                path.push(i);
                child.walk(path, f);
                path.pop();
            }
        }
    }

    fn current_value(&self, scope: &Scope<'_>) -> Vec<u8> {
        match self {
            Node::Leaf(m) => m.value().to_vec(),
            Node::Composite(b) => b.render_in(scope, &RenderOptions::new()),
        }
    }

    pub(crate) fn render_in(&self, scope: &Scope<'_>, options: &RenderOptions<'_>) -> Vec<u8> {
        match self {
            Node::Leaf(m) => m.render_with(options),
            Node::Composite(b) => b.render_in(scope, options),
        }
    }

    /// Advance, returning the path of the leaf that now differs from its
    /// original value.
    pub(crate) fn advance_tracked(&mut self) -> Option<Vec<usize>> {
        match self {
            Node::Leaf(m) => m.advance().then(Vec::new),
            Node::Composite(b) => b.advance_tracked(),
        }
    }

    pub(crate) fn goto_tracked(&mut self, index: usize) -> Result<Option<Vec<usize>>> {
        match self {
            Node::Leaf(m) => {
                m.goto(index)?;
                Ok((index > 0).then(Vec::new))
            }
            Node::Composite(b) => b.goto_tracked(index),
        }
    }
}

impl Fuzz for Node {
    fn num_mutations(&self) -> usize {
        match self {
            Node::Leaf(m) => m.num_mutations(),
            Node::Composite(b) => b.num_mutations(),
        }
    }

    fn mutant_index(&self) -> usize {
        match self {
            Node::Leaf(m) => m.mutant_index(),
            Node::Composite(b) => b.mutant_index(),
        }
    }

    fn advance(&mut self) -> bool {
        self.advance_tracked().is_some()
    }

    fn goto(&mut self, index: usize) -> Result<()> {
        self.goto_tracked(index).map(drop)
    }

    fn reset(&mut self) {
        match self {
            Node::Leaf(m) => m.reset(),
            Node::Composite(b) => b.reset(),
        }
    }

    fn render_with(&self, options: &RenderOptions<'_>) -> Vec<u8> {
        match self {
            Node::Leaf(m) => m.render_with(options),
            Node::Composite(b) => b.render_with(options),
        }
    }
}

/// A composite node: an ordered sequence of child nodes that enumerates the
/// mutations of its children one field at a time.
///
/// The composed enumeration walks the children left to right. It delegates to
/// the first fuzzable child with mutations left until that child is
/// exhausted, then moves on to the next one, so at every step exactly one leaf
/// of the whole subtree differs from its original value. After the last child
/// is exhausted the block resets itself to its original state.
///
/// Blocks are usually assembled through a [`Request`][crate::Request], which
/// also gives dependencies a name registry to resolve against. A bare block
/// resolves dependency fields by searching its own subtree.
///
/// # Example
///
/// ```
/// use protomut::{primitives, Block, Fuzz};
///
/// # fn foo() -> protomut::Result<()> {
/// let mut block = Block::new()
///     .named("greeting")?
///     .child(primitives::group("hello", ["HELLO", "h3ll0"]))
///     .child(primitives::fixed(" "))
///     .child(primitives::group("world", ["WORLD"]));
///
/// assert_eq!(block.num_mutations(), 3);
///
/// let cases: Vec<Vec<u8>> = block.mutations(0)?.collect();
/// assert_eq!(
///     cases,
///     [&b"HELLO world"[..], b"h3ll0 world", b"hello WORLD"],
/// );
///
/// // Back to the original after the enumeration.
/// assert_eq!(block.render(), b"hello world");
/// # Ok(())
/// # }
/// # foo().unwrap();
/// ```
#[derive(Clone, Default)]
pub struct Block {
    name: Option<String>,
    children: Vec<Node>,
    encoder: Option<Arc<dyn Encode>>,
    dependency: Option<Dependency>,
    // Index of the child currently being enumerated.
    cursor: usize,
    mutant_index: usize,
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("name", &self.name)
            .field("children", &self.children)
            .field("encoder", &self.encoder.as_ref().map(|_| "<encoder>"))
            .field("dependency", &self.dependency)
            .field("mutant_index", &self.mutant_index)
            .finish()
    }
}

impl Block {
    /// Create a new, empty, unnamed block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Give this block a name, making it addressable within its request.
    pub fn named(mut self, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        self.name = Some(name);
        Ok(self)
    }

    /// Attach an encoder applied to the concatenated child render.
    pub fn encoder(mut self, encoder: impl Encode + 'static) -> Self {
        self.encoder = Some(Arc::new(encoder));
        self
    }

    /// Only render this block's content while `dependency` is met.
    pub fn depends_on(mut self, dependency: Dependency) -> Self {
        self.dependency = Some(dependency);
        self
    }

    /// Append a child, builder style.
    pub fn child(mut self, item: impl Into<Node>) -> Self {
        self.push(item);
        self
    }

    /// Append a child.
    ///
    /// Names are not checked here; a request checks them when the block is
    /// pushed into it.
    pub fn push(&mut self, item: impl Into<Node>) {
        self.children.push(item.into());
    }

    /// This block's name, if it has one.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The child nodes, in order.
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// The dependency gating this block, if any.
    pub fn dependency(&self) -> Option<&Dependency> {
        self.dependency.as_ref()
    }

    /// Find the first descendant named `name`, in pre-order.
    pub fn find(&self, name: &str) -> Option<&Node> {
        self.children.iter().find_map(|c| c.find(name))
    }

    /// Every fuzzable leaf of this block, in enumeration order.
    pub fn fuzzable_mutants(&self) -> Vec<&Mutant> {
        let mut leaves = Vec::new();
        for child in &self.children {
            child.walk(&mut Vec::new(), &mut |_, node| {
                if let Node::Leaf(m) = node {
                    if m.is_fuzzable() {
                        leaves.push(m);
                    }
                }
            });
        }
        leaves
    }

    /// The length of the current render.
    pub fn len(&self) -> usize {
        self.render().len()
    }

    /// Whether the current render is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn render_in(&self, scope: &Scope<'_>, options: &RenderOptions<'_>) -> Vec<u8> {
        if let Some(value) = options.replacement_for(self.name()) {
            return value.to_vec();
        }

        if let Some(dep) = &self.dependency {
            match scope.current_value(dep.field()) {
                Some(current) if dep.is_met(&current) => {}
                Some(_) => return Vec::new(),
                None => {
                    log::warn!(
                        "dependency field {:?} of block {:?} cannot be resolved",
                        dep.field(),
                        self.name
                    );
                    return Vec::new();
                }
            }
        }

        let mut rendered = Vec::new();
        for child in &self.children {
            rendered.extend(child.render_in(scope, options));
        }

        match &self.encoder {
            Some(encoder) => encoder.encode(rendered),
            None => rendered,
        }
    }

    pub(crate) fn advance_tracked(&mut self) -> Option<Vec<usize>> {
        while let Some(child) = self.children.get_mut(self.cursor) {
            if child.is_fuzzable() && child.num_mutations() > 0 {
                if let Some(mut path) = child.advance_tracked() {
                    path.insert(0, self.cursor);
                    self.mutant_index += 1;
                    return Some(path);
                }
            }
            self.cursor += 1;
        }

        log::trace!("block {:?} exhausted after {} mutations", self.name, self.mutant_index);
        self.reset();
        None
    }

    /// Position at mutation `index` by jumping to the child that owns it and
    /// only seeking within that child. Same state as replaying `index` steps.
    pub(crate) fn goto_tracked(&mut self, index: usize) -> Result<Option<Vec<usize>>> {
        let num_mutations = self.num_mutations();
        if index > num_mutations {
            return Err(Error::out_of_range(index, num_mutations));
        }

        self.reset();
        if index == 0 {
            return Ok(None);
        }

        let mut remaining = index;
        for (i, child) in self.children.iter_mut().enumerate() {
            if !child.is_fuzzable() {
                continue;
            }
            let n = child.num_mutations();
            if remaining > n {
                remaining -= n;
                continue;
            }

            let path = child.goto_tracked(remaining)?;
            self.cursor = i;
            self.mutant_index = index;
            return Ok(path.map(|mut path| {
                path.insert(0, i);
                path
            }));
        }

        // `index <= num_mutations` guarantees some child owns it.
        unreachable!("mutation {index} not owned by any child")
    }
}

impl Fuzz for Block {
    fn num_mutations(&self) -> usize {
        self.children
            .iter()
            .filter(|c| c.is_fuzzable())
            .map(Fuzz::num_mutations)
            .sum()
    }

    fn mutant_index(&self) -> usize {
        self.mutant_index
    }

    fn advance(&mut self) -> bool {
        self.advance_tracked().is_some()
    }

    fn goto(&mut self, index: usize) -> Result<()> {
        self.goto_tracked(index).map(drop)
    }

    fn reset(&mut self) {
        self.cursor = 0;
        self.mutant_index = 0;
        for child in &mut self.children {
            child.reset();
        }
    }

    fn render_with(&self, options: &RenderOptions<'_>) -> Vec<u8> {
        self.render_in(&Scope::detached(self), options)
    }
}
