// XXX: Keep this documented MSRV in sync with the `rust-version` in
// `Cargo.toml`.

/*!

# Minimum Supported Rust Version

`protomut` currently requires Rust **1.80.0** or newer.

Patch releases never raise the MSRV. Minor releases may, when a newer language
or standard library feature is worth it.

 */
