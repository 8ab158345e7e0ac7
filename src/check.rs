//! A small harness for checking properties of a request's test cases.
//!
//! The primary entry point for this module is the [`Check`] type.
//!
//! A check drives a [`Request`]'s enumeration and, for every [`Mutation`],
//! verifies that exactly one field of the request differs from its original
//! value before handing the mutation to a caller-supplied property. It is
//! designed for smoke tests inside `#[test]` functions: a quick way to assert
//! that a message model, or a target-side parser run in-process, behaves on
//! every test case the model can produce.
//!
//! # Example
//!
//! ```
//! # fn foo() -> protomut::Result<()> {
//! use protomut::{check::Check, primitives as p, Request};
//!
//! let request = Request::new("check_module_example")?;
//! request.push(p::group("GET", ["PUT", "DELETE"]).named("verb")?)?;
//! request.push(p::fixed(" /index.html\r\n"))?;
//!
//! let result = Check::new().run(&request, |mutation| {
//!     if mutation.buffer.ends_with(b"\r\n") {
//!         Ok(())
//!     } else {
//!         Err("request line lost its terminator")
//!     }
//! });
//! assert!(result.is_ok());
//! # Ok(())
//! # }
//! # foo().unwrap();
//! ```

use crate::log;
use crate::{Error, Mutation, Request};
use std::panic;

/// The result of running a check.
///
/// If every checked mutation passes, this is `Ok(())`.
///
/// If a mutation fails, this is `Err(CheckError::Failed(_))` with the failing
/// test case and an error message.
///
/// If the enumeration itself cannot be driven, for example because the request
/// still has open blocks, this is `Err(CheckError::Error(_))`.
pub type CheckResult = std::result::Result<(), CheckError>;

/// An error when running a `Check`.
#[derive(Debug)]
pub enum CheckError {
    /// The check failed.
    ///
    /// Either the property does not hold for the given test case, or the test
    /// case mutated more or fewer than one field.
    Failed(CheckFailure),

    /// An error occurred while running the check.
    Error(Error),
}

impl From<Error> for CheckError {
    fn from(v: Error) -> Self {
        Self::Error(v)
    }
}

impl From<CheckFailure> for CheckError {
    fn from(v: CheckFailure) -> Self {
        Self::Failed(v)
    }
}

impl CheckError {
    /// Unwrap the underlying `CheckError::Failed(_)` payload, panicking if this
    /// is not a `CheckError::Failed`.
    #[track_caller]
    pub fn unwrap_failed(self) -> CheckFailure {
        match self {
            CheckError::Failed(f) => f,
            _ => panic!("CheckError::unwrap_failed called on non-failed CheckError"),
        }
    }

    /// Unwrap the underlying `CheckError::Error(_)` payload, panicking if this
    /// is not a `CheckError::Error(_)`.
    #[track_caller]
    pub fn unwrap_error(self) -> Error {
        match self {
            CheckError::Error(e) => e,
            _ => panic!("CheckError::unwrap_error called on non-error CheckError"),
        }
    }
}

/// The first test case a check failed on.
///
/// # Example
///
/// ```
/// # fn foo() -> protomut::Result<()> {
/// use protomut::{check::Check, primitives as p, Request};
///
/// let request = Request::new("check_failure_example")?;
/// request.push(p::group("a", ["b", "c", "d"]))?;
///
/// let failure = Check::new()
///     .run(&request, |mutation| {
///         if mutation.buffer != b"c" {
///             Ok(())
///         } else {
///             Err("found c!")
///         }
///     })
///     .unwrap_err()
///     .unwrap_failed();
///
/// assert_eq!(failure.index, 2);
/// assert_eq!(failure.buffer, b"c");
/// assert_eq!(failure.message, "found c!");
/// # Ok(())
/// # }
/// # foo().unwrap();
/// ```
#[derive(Debug)]
#[non_exhaustive]
pub struct CheckFailure {
    /// The request's mutation index at the failing step.
    pub index: usize,

    /// The rendered test case that triggered the failure.
    pub buffer: Vec<u8>,

    /// The failure message.
    pub message: String,
}

/// A configured check over a request's enumeration.
///
/// By default a check starts from the original state and runs through every
/// mutation. Use [`start`][Check::start] and [`limit`][Check::limit] to check
/// a window of the enumeration instead, for example to resume a long run.
#[derive(Debug)]
pub struct Check {
    start: usize,
    limit: Option<usize>,
}

impl Default for Check {
    fn default() -> Check {
        Check::new()
    }
}

impl Check {
    /// Create a new `Check`.
    pub fn new() -> Check {
        Check {
            start: 0,
            limit: None,
        }
    }

    /// Configure the mutation index to start from. The first checked mutation
    /// is `start + 1`.
    pub fn start(&mut self, start: usize) -> &mut Check {
        self.start = start;
        self
    }

    /// Configure the maximum number of mutations to check.
    pub fn limit(&mut self, limit: usize) -> &mut Check {
        self.limit = Some(limit);
        self
    }

    /// Run this configured `Check` on `request`, checking that the given
    /// `property` returns `Ok(_)` for every mutation.
    ///
    /// The request is back in its original state when the check returns,
    /// whatever its outcome.
    pub fn run<S>(
        &self,
        request: &Request,
        mut property: impl FnMut(&Mutation) -> std::result::Result<(), S>,
    ) -> CheckResult
    where
        S: ToString,
    {
        let result = self.run_inner(request, &mut property);
        request.reset();
        result
    }

    fn run_inner<S>(
        &self,
        request: &Request,
        property: &mut impl FnMut(&Mutation) -> std::result::Result<(), S>,
    ) -> CheckResult
    where
        S: ToString,
    {
        let fields = request.fuzzable_mutants();
        let mutations = request.mutations(self.start)?;
        let mut checked = 0;

        for mutation in mutations.take(self.limit.unwrap_or(usize::MAX)) {
            let mutated = fields.iter().filter(|f| f.is_mutated()).count();
            if mutated != 1 || !mutation.element.is_mutated() {
                return fail(
                    mutation,
                    format!("expected exactly one mutated field, found {mutated}"),
                );
            }

            match panic::catch_unwind(panic::AssertUnwindSafe(|| property(&mutation))) {
                Ok(Ok(())) => {}
                Ok(Err(message)) => return fail(mutation, message.to_string()),
                Err(_) => return fail(mutation, "<panicked>".into()),
            }
            checked += 1;
        }

        log::debug!(
            "checked {checked} mutations of request {:?}",
            request.name()
        );
        Ok(())
    }
}

fn fail(mutation: Mutation, message: String) -> CheckResult {
    log::warn!(
        "mutation {} failed on test case {:?}: {message}",
        mutation.index,
        mutation.buffer
    );
    Err(CheckFailure {
        index: mutation.index,
        buffer: mutation.buffer,
        message,
    }
    .into())
}
