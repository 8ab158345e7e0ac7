//! Ready-made protocol building blocks.
//!
//! A lego is a [`Block`][crate::Block] preconfigured with an
//! [`Encode`][crate::Encode] implementation that gives its children's render
//! a protocol-specific shape.

pub mod xdr;
