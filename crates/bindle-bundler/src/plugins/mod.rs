//! Engine plugins owned by this crate.
//!
//! This layer only orders and conditionally includes plugins; it never
//! inspects their internals. User-declared plugins arrive as data
//! ([`bindle_config::PluginSpec`]) and are instantiated by name in
//! `options::build_request`.

pub mod dts;
pub mod node_protocol;

pub use dts::{DtsPlugin, DtsPluginOptions};
pub use node_protocol::{NodeProtocolPlugin, UNPREFIXED_BUILTINS};
