//! `node:` protocol rewriting.
//!
//! The `node:` prefix exists for every builtin, but only the older builtins
//! are also importable without it. Stripping therefore only applies to
//! specifiers whose bare name is itself a builtin; `node:`-only modules such
//! as `node:test` keep their prefix.

use std::borrow::Cow;

use rolldown_common::ResolvedExternal;
use rolldown_plugin::{
    HookResolveIdArgs, HookResolveIdOutput, HookResolveIdReturn, HookUsage, Plugin, PluginContext,
};

use bindle_config::NodeProtocol;

/// Builtin modules that exist both with and without the `node:` prefix.
/// Modules introduced as `node:`-only (`node:test`, `node:sea`,
/// `node:sqlite`) are intentionally absent.
pub const UNPREFIXED_BUILTINS: &[&str] = &[
    "assert",
    "assert/strict",
    "async_hooks",
    "buffer",
    "child_process",
    "cluster",
    "console",
    "constants",
    "crypto",
    "dgram",
    "diagnostics_channel",
    "dns",
    "dns/promises",
    "domain",
    "events",
    "fs",
    "fs/promises",
    "http",
    "http2",
    "https",
    "inspector",
    "inspector/promises",
    "module",
    "net",
    "os",
    "path",
    "path/posix",
    "path/win32",
    "perf_hooks",
    "process",
    "punycode",
    "querystring",
    "readline",
    "readline/promises",
    "repl",
    "stream",
    "stream/consumers",
    "stream/promises",
    "stream/web",
    "string_decoder",
    "timers",
    "timers/promises",
    "tls",
    "trace_events",
    "tty",
    "url",
    "util",
    "util/types",
    "v8",
    "vm",
    "wasi",
    "worker_threads",
    "zlib",
];

fn is_unprefixed_builtin(name: &str) -> bool {
    UNPREFIXED_BUILTINS.binary_search(&name).is_ok()
}

/// Rewrite `node:` specifiers according to the resolved policy. Rewritten
/// ids are marked external with no side effects.
#[derive(Debug)]
pub struct NodeProtocolPlugin {
    mode: NodeProtocol,
}

impl NodeProtocolPlugin {
    pub fn new(mode: NodeProtocol) -> Self {
        Self { mode }
    }

    /// The rewritten specifier, if this plugin claims it.
    pub fn rewrite(&self, specifier: &str) -> Option<String> {
        match self.mode {
            NodeProtocol::Off => None,
            NodeProtocol::Strip => {
                let bare = specifier.strip_prefix("node:")?;
                // a node:-only builtin has no unprefixed equivalent; keep it
                is_unprefixed_builtin(bare).then(|| bare.to_string())
            }
            NodeProtocol::Add => {
                is_unprefixed_builtin(specifier).then(|| format!("node:{specifier}"))
            }
        }
    }
}

impl Plugin for NodeProtocolPlugin {
    fn name(&self) -> Cow<'static, str> {
        match self.mode {
            NodeProtocol::Strip => "bindle:node-protocol:strip".into(),
            _ => "bindle:node-protocol:add".into(),
        }
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::ResolveId
    }

    fn resolve_id(
        &self,
        _ctx: &PluginContext,
        args: &HookResolveIdArgs,
    ) -> impl std::future::Future<Output = HookResolveIdReturn> + Send {
        let rewritten = self.rewrite(args.specifier);
        async move {
            Ok(rewritten.map(|id| HookResolveIdOutput {
                id: id.into(),
                external: Some(ResolvedExternal::Bool(true)),
                ..Default::default()
            }))
        }
    }
}
