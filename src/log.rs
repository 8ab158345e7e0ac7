//! Logging facade: forwards to the `log` crate when the `log` feature is on,
//! and compiles every call away otherwise.

#![allow(unused_macros, unused_imports)]

#[cfg(feature = "log")]
pub(crate) use ::log::{debug, trace, warn};

#[cfg(not(feature = "log"))]
macro_rules! trace {
    ($($tt:tt)*) => {};
}
#[cfg(not(feature = "log"))]
pub(crate) use trace;

#[cfg(not(feature = "log"))]
macro_rules! debug {
    ($($tt:tt)*) => {};
}
#[cfg(not(feature = "log"))]
pub(crate) use debug;

// `warn` is also the name of a builtin attribute, so the no-op macro gets a
// different name and is re-exported under `warn`.
#[cfg(not(feature = "log"))]
macro_rules! warn_noop {
    ($($tt:tt)*) => {};
}
#[cfg(not(feature = "log"))]
pub(crate) use warn_noop as warn;
