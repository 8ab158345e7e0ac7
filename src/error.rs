//! Error and result types for the `protomut` crate.

use std::borrow::Cow;
use std::fmt;

/// A result that is either `Ok(T)` or `Err(protomut::Error)`.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// An error that can occur when assembling or driving a request.
///
/// This type is a thin wrapper around [`ErrorKind`], which contains the
/// specific kind of error that occurred.
///
/// # Examples
///
/// ```
/// use protomut::{Error, ErrorKind};
///
/// let error = Error::stack_underflow();
///
/// if error.is_stack_underflow() {
///     println!("closed one block too many");
/// }
///
/// match error.kind() {
///     ErrorKind::DuplicateName(name) => println!("{name} is taken"),
///     ErrorKind::StackUnderflow => println!("still closed one too many"),
///
///     // The `ErrorKind` type is not exhaustive, so we always need a catch-all arm.
///     unknown => println!("unknown! {unknown:?}"),
/// }
/// ```
pub struct Error {
    // Boxed to keep `Result<T>` small on the hot enumeration path.
    kind: Box<ErrorKind>,
}

impl From<ErrorKind> for Error {
    #[inline]
    fn from(kind: ErrorKind) -> Self {
        Self {
            kind: Box::new(kind),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            ErrorKind::InvalidName(name) => write!(
                f,
                "invalid name {name:?}: names must match [A-Za-z0-9_]+"
            ),
            ErrorKind::DuplicateName(name) => {
                write!(f, "the name {name:?} already exists in this request")
            }
            ErrorKind::StackUnderflow => {
                write!(f, "close_block called without an open block")
            }
            ErrorKind::UnclosedBlocks(n) => {
                write!(f, "the request still has {n} open block(s)")
            }
            ErrorKind::OutOfRange {
                index,
                num_mutations,
            } => write!(
                f,
                "tried to go to mutation {index} > num_mutations ({num_mutations})"
            ),
            ErrorKind::InvalidRange => {
                write!(f, "random data was given an invalid length range or step")
            }
            ErrorKind::InvalidPath(path) => write!(f, "invalid path {path:?}"),
            ErrorKind::UnknownRequest(name) => write!(f, "request {name:?} not found"),
            ErrorKind::UnknownElement(name) => write!(f, "element {name:?} not found"),
            ErrorKind::CyclicDependency(name) => write!(
                f,
                "a block depends on {name:?}, which is itself or encloses it"
            ),
            ErrorKind::NoMatchingResponse => {
                write!(f, "no response matcher accepted the data")
            }
            ErrorKind::Rejected(msg) => write!(f, "response rejected: {msg}"),
            ErrorKind::Other(msg) => write!(f, "an unknown error occurred: {msg}"),
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Returns a new error indicating that `name` is not a valid element name.
    #[must_use]
    pub fn invalid_name(name: impl Into<String>) -> Self {
        ErrorKind::InvalidName(name.into()).into()
    }

    /// Returns a new error indicating that `name` is already registered.
    #[must_use]
    pub fn duplicate_name(name: impl Into<String>) -> Self {
        ErrorKind::DuplicateName(name.into()).into()
    }

    /// Returns a new error indicating that there was no open block to close.
    #[must_use]
    pub fn stack_underflow() -> Self {
        ErrorKind::StackUnderflow.into()
    }

    /// Returns a new error indicating that `n` blocks were never closed.
    #[must_use]
    pub fn unclosed_blocks(n: usize) -> Self {
        ErrorKind::UnclosedBlocks(n).into()
    }

    /// Returns a new error indicating that `index` is past the last mutation.
    #[must_use]
    pub fn out_of_range(index: usize, num_mutations: usize) -> Self {
        ErrorKind::OutOfRange {
            index,
            num_mutations,
        }
        .into()
    }

    /// Returns a new error indicating that a length range or step is invalid.
    #[must_use]
    pub fn invalid_range() -> Self {
        ErrorKind::InvalidRange.into()
    }

    /// Returns a new error indicating that `path` does not follow the
    /// `request[.element]` grammar.
    #[must_use]
    pub fn invalid_path(path: impl Into<String>) -> Self {
        ErrorKind::InvalidPath(path.into()).into()
    }

    /// Returns a new error indicating that no request is registered as `name`.
    #[must_use]
    pub fn unknown_request(name: impl Into<String>) -> Self {
        ErrorKind::UnknownRequest(name.into()).into()
    }

    /// Returns a new error indicating that no element is registered as `name`.
    #[must_use]
    pub fn unknown_element(name: impl Into<String>) -> Self {
        ErrorKind::UnknownElement(name.into()).into()
    }

    /// Returns a new error indicating that a block depends on the field
    /// `name`, which is the block itself or one of its ancestors.
    #[must_use]
    pub fn cyclic_dependency(name: impl Into<String>) -> Self {
        ErrorKind::CyclicDependency(name.into()).into()
    }

    /// Returns a new error indicating that every response matcher rejected the
    /// data.
    #[must_use]
    pub fn no_matching_response() -> Self {
        ErrorKind::NoMatchingResponse.into()
    }

    /// Returns a new error that a response matcher uses to reject data that
    /// does not follow its grammar.
    ///
    /// Rejections are recoverable: [`Request::match_response`] moves on to the
    /// next matcher.
    ///
    /// [`Request::match_response`]: crate::Request::match_response
    #[must_use]
    pub fn rejected(msg: impl Into<ErrorMessage>) -> Self {
        ErrorKind::Rejected(msg.into()).into()
    }

    /// Returns a new error with the given message.
    #[must_use]
    pub fn other(msg: impl Into<ErrorMessage>) -> Self {
        ErrorKind::Other(msg.into()).into()
    }

    /// Returns the kind of this error.
    #[must_use]
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Returns `true` if the error's kind is
    /// [`InvalidName`][ErrorKind::InvalidName].
    #[must_use]
    pub fn is_invalid_name(&self) -> bool {
        matches!(self.kind(), ErrorKind::InvalidName(_))
    }

    /// Returns `true` if the error's kind is
    /// [`DuplicateName`][ErrorKind::DuplicateName].
    #[must_use]
    pub fn is_duplicate_name(&self) -> bool {
        matches!(self.kind(), ErrorKind::DuplicateName(_))
    }

    /// Returns `true` if the error's kind is
    /// [`StackUnderflow`][ErrorKind::StackUnderflow].
    #[must_use]
    pub fn is_stack_underflow(&self) -> bool {
        matches!(self.kind(), ErrorKind::StackUnderflow)
    }

    /// Returns `true` if the error's kind is
    /// [`UnclosedBlocks`][ErrorKind::UnclosedBlocks].
    #[must_use]
    pub fn is_unclosed_blocks(&self) -> bool {
        matches!(self.kind(), ErrorKind::UnclosedBlocks(_))
    }

    /// Returns `true` if the error's kind is
    /// [`OutOfRange`][ErrorKind::OutOfRange].
    #[must_use]
    pub fn is_out_of_range(&self) -> bool {
        matches!(self.kind(), ErrorKind::OutOfRange { .. })
    }

    /// Returns `true` if the error's kind is
    /// [`InvalidRange`][ErrorKind::InvalidRange].
    #[must_use]
    pub fn is_invalid_range(&self) -> bool {
        matches!(self.kind(), ErrorKind::InvalidRange)
    }

    /// Returns `true` if the error's kind is
    /// [`InvalidPath`][ErrorKind::InvalidPath].
    #[must_use]
    pub fn is_invalid_path(&self) -> bool {
        matches!(self.kind(), ErrorKind::InvalidPath(_))
    }

    /// Returns `true` if the error's kind is
    /// [`UnknownRequest`][ErrorKind::UnknownRequest].
    #[must_use]
    pub fn is_unknown_request(&self) -> bool {
        matches!(self.kind(), ErrorKind::UnknownRequest(_))
    }

    /// Returns `true` if the error's kind is
    /// [`UnknownElement`][ErrorKind::UnknownElement].
    #[must_use]
    pub fn is_unknown_element(&self) -> bool {
        matches!(self.kind(), ErrorKind::UnknownElement(_))
    }

    /// Returns `true` if the error's kind is
    /// [`CyclicDependency`][ErrorKind::CyclicDependency].
    #[must_use]
    pub fn is_cyclic_dependency(&self) -> bool {
        matches!(self.kind(), ErrorKind::CyclicDependency(_))
    }

    /// Returns `true` if the error's kind is
    /// [`NoMatchingResponse`][ErrorKind::NoMatchingResponse].
    #[must_use]
    pub fn is_no_matching_response(&self) -> bool {
        matches!(self.kind(), ErrorKind::NoMatchingResponse)
    }

    /// Returns `true` if the error's kind is
    /// [`Rejected`][ErrorKind::Rejected].
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        matches!(self.kind(), ErrorKind::Rejected(_))
    }

    /// Returns `true` if the error's kind is
    /// [`Other`][ErrorKind::Other].
    #[must_use]
    pub fn is_other(&self) -> bool {
        matches!(self.kind(), ErrorKind::Other(_))
    }
}

/// The kind of an error that can occur when using the `protomut` crate.
///
/// This enum is not exhaustive, and new variants may be added in the future.
/// When matching on this enum, a catch-all arm should be used to handle any
/// new variants that are added.
#[non_exhaustive]
#[derive(Debug)]
pub enum ErrorKind {
    /// A name does not match `[A-Za-z0-9_]+`.
    InvalidName(String),

    /// A name collides with an element already registered in the request.
    DuplicateName(String),

    /// `close_block` was called with no open block.
    StackUnderflow,

    /// The request was driven while this many blocks were still open.
    UnclosedBlocks(usize),

    /// A `goto` past the last mutation.
    OutOfRange {
        /// The requested mutation index.
        index: usize,
        /// The number of mutations available.
        num_mutations: usize,
    },

    /// A random data primitive was given `min_length > max_length` or a zero
    /// step.
    InvalidRange,

    /// A path does not follow the `request[.element]` grammar.
    InvalidPath(String),

    /// The path names a request that is not registered.
    UnknownRequest(String),

    /// The path or dependency names an element that is not registered.
    UnknownElement(String),

    /// A block depends on itself or on a block enclosing it.
    CyclicDependency(String),

    /// Every response matcher rejected the data.
    NoMatchingResponse,

    /// A response matcher did not recognize the data.
    Rejected(ErrorMessage),

    /// Some other error occurred.
    Other(ErrorMessage),
}

impl From<Error> for ErrorKind {
    #[inline]
    fn from(err: Error) -> Self {
        *err.kind
    }
}

/// A message that can be attached to an error.
///
/// This is a thin wrapper around a borrowed or owned string.
///
/// # Examples
///
/// ```
/// use protomut::error::ErrorMessage;
///
/// let msg = ErrorMessage::new("unexpected banner");
/// assert_eq!(msg.as_str(), "unexpected banner");
/// ```
#[derive(Debug, Clone)]
pub struct ErrorMessage {
    inner: Cow<'static, str>,
}

impl ErrorMessage {
    /// Returns a new error message with the given string.
    #[must_use]
    pub fn new(msg: impl Into<ErrorMessage>) -> Self {
        msg.into()
    }

    /// Returns the message as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.inner
    }
}

impl fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&'static str> for ErrorMessage {
    #[inline]
    fn from(s: &'static str) -> Self {
        Self {
            inner: Cow::Borrowed(s),
        }
    }
}

impl From<Cow<'static, str>> for ErrorMessage {
    #[inline]
    fn from(s: Cow<'static, str>) -> Self {
        Self { inner: s }
    }
}

impl From<String> for ErrorMessage {
    #[inline]
    fn from(s: String) -> Self {
        Self {
            inner: Cow::Owned(s),
        }
    }
}
