/*!

# Cargo Features

**Note: none of this crate's features are enabled by default.**

* **`log`**: Enable logging with [the `log` crate](https://docs.rs/log). Request
  assembly and registry changes log at `debug`, every enumeration step logs at
  `trace`, and replaced registry entries and unresolvable dependency fields log
  at `warn`.

* **`check`**: Enable the `protomut::check` module for smoke-testing every test
  case a request can produce from inside `#[test]` functions. Implies `log`.

 */
