//! Build identification logged at startup.
use std::env;

/// `commit=<GIT_COMMIT>, branch=<GIT_BRANCH>` from the process environment.
pub fn version_info() -> String {
    format_version(env::var("GIT_COMMIT").ok(), env::var("GIT_BRANCH").ok())
}

/// Formats commit and branch, `unknown` for missing or blank values.
pub fn format_version(commit: Option<String>, branch: Option<String>) -> String {
    let or_unknown = |value: Option<String>| {
        value
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "unknown".to_string())
    };
    format!("commit={}, branch={}", or_unknown(commit), or_unknown(branch))
}
