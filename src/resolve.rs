//! Expansion of symbolic load-path tokens into concrete candidate paths.
//!
//! The dynamic linker searches `@rpath` candidates in `LC_RPATH` order and
//! stops at the first one that exists, so every function here preserves
//! input order.

use serde::{Deserialize, Serialize};

/// Literal load-path tokens recognized by the resolver.
///
/// `@executable_path` and `@loader_path` both expand to the main
/// executable's directory. That is exact for load commands of the main
/// executable and an approximation for commands inherited from dependent
/// libraries, whose loader directory differs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SymbolicTokens {
    pub rpath: String,
    pub executable_path: String,
    pub loader_path: String,
}

impl Default for SymbolicTokens {
    fn default() -> Self {
        Self {
            rpath: "@rpath".to_string(),
            executable_path: "@executable_path".to_string(),
            loader_path: "@loader_path".to_string(),
        }
    }
}

impl SymbolicTokens {
    /// True if `name` starts with the `@rpath` token.
    pub fn is_rpath_relative(&self, name: &str) -> bool {
        name.starts_with(&self.rpath)
    }

    /// Replace a leading `@executable_path` or `@loader_path` with `dir`.
    fn expand_executable_relative(&self, name: &str, dir: &str) -> Option<String> {
        substitute_prefix(name, &self.executable_path, dir)
            .or_else(|| substitute_prefix(name, &self.loader_path, dir))
    }
}

fn substitute_prefix(name: &str, token: &str, replacement: &str) -> Option<String> {
    let rest = name.strip_prefix(token)?;
    Some(format!("{replacement}{rest}"))
}

/// Resolve executable-relative tokens in raw `LC_RPATH` entries.
///
/// Entries without a leading token pass through untouched; order is kept.
pub fn expand_search_paths(
    raw_rpaths: &[String],
    executable_dir: &str,
    tokens: &SymbolicTokens,
) -> Vec<String> {
    raw_rpaths
        .iter()
        .map(|rpath| {
            tokens
                .expand_executable_relative(rpath, executable_dir)
                .unwrap_or_else(|| rpath.clone())
        })
        .collect()
}

/// Concrete paths the linker would try for a token-relative load name.
///
/// `@rpath` names yield one candidate per resolved search path, in search
/// order. `@executable_path` names yield exactly one. Absolute paths and
/// unknown tokens yield nothing and are left to the caller.
pub fn candidate_paths(
    load_name: &str,
    executable_dir: &str,
    resolved_rpaths: &[String],
    tokens: &SymbolicTokens,
) -> Vec<String> {
    if tokens.is_rpath_relative(load_name) {
        return resolved_rpaths
            .iter()
            .filter_map(|rpath| substitute_prefix(load_name, &tokens.rpath, rpath))
            .collect();
    }
    let expanded = substitute_prefix(load_name, &tokens.executable_path, executable_dir);
    expanded.into_iter().collect()
}

/// Resolve a non-`@rpath` load name to the single path it binds to.
pub fn resolve_proxy_path(
    load_name: &str,
    executable_dir: &str,
    tokens: &SymbolicTokens,
) -> String {
    tokens
        .expand_executable_relative(load_name, executable_dir)
        .unwrap_or_else(|| load_name.to_string())
}
