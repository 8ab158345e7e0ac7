/*!

Tutorials, overviews, and etc... for the `protomut` crate.

All the documentation that isn't API reference.

# Table of Contents

* [Modeling Messages][modeling_messages]
* [Driving an Enumeration][driving_enumeration]
* [Cargo Features][cargo_features]
* [Minimum Supported Rust Version][msrv]

 */

pub mod cargo_features;
pub mod driving_enumeration;
pub mod modeling_messages;
pub mod msrv;
