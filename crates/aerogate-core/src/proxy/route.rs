//! Mode router: a pure function from (mode flags, inbound path) to the
//! provider pipeline and endpoint that serve it.
//!
//! Holds no state. Provider-pinned path families (`/zen/v1/...`,
//! `/antigravity/v1/...`) bypass mode selection; everything else follows
//! the process-wide mode flags carried in the gateway context.

/// Which provider serves mode-dependent paths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModeFlags {
    /// Proxy to OpenCode Zen instead of Antigravity.
    pub zen_mode: bool,
    /// Proxy to Antigravity (also the default with no flag set).
    pub antigravity_mode: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Antigravity,
    Zen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    ChatCompletions,
    Messages,
    Models,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteTarget {
    pub provider: Provider,
    pub endpoint: Endpoint,
}

/// Resolve an inbound path. `None` means the path is outside the gateway's
/// surface (a plain 404, not an error).
pub fn resolve(flags: &ModeFlags, path: &str) -> Option<RouteTarget> {
    if let Some(rest) = path.strip_prefix("/zen/v1") {
        return endpoint_of(rest)
            .map(|endpoint| RouteTarget { provider: Provider::Zen, endpoint });
    }
    if let Some(rest) = path.strip_prefix("/antigravity/v1") {
        return endpoint_of(rest)
            .map(|endpoint| RouteTarget { provider: Provider::Antigravity, endpoint });
    }

    let rest = path.strip_prefix("/v1").unwrap_or(path);
    let endpoint = endpoint_of(rest)?;
    let provider = if flags.zen_mode { Provider::Zen } else { Provider::Antigravity };
    Some(RouteTarget { provider, endpoint })
}

fn endpoint_of(rest: &str) -> Option<Endpoint> {
    let rest = if rest.len() > 1 { rest.trim_end_matches('/') } else { rest };
    match rest {
        "/chat/completions" => Some(Endpoint::ChatCompletions),
        "/messages" => Some(Endpoint::Messages),
        "/models" => Some(Endpoint::Models),
        _ => None,
    }
}
