use std::env;

/// Environment names for the remote endpoint URL, newest prefix first.
/// Older aliases are accepted for deployments configured before the rename.
const URL_VARS: [&str; 3] = [
    "BUSINESS_OS_SUPABASE_URL",
    "NEXT_PUBLIC_SUPABASE_URL",
    "SUPABASE_URL",
];

const KEY_VARS: [&str; 3] = [
    "BUSINESS_OS_SUPABASE_ANON_KEY",
    "NEXT_PUBLIC_SUPABASE_ANON_KEY",
    "SUPABASE_ANON_KEY",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    pub url: String,
    pub anon_key: String,
}

impl RemoteConfig {
    /// Resolve the remote backend configuration from the process environment.
    ///
    /// Re-read on every call rather than cached, so toggling configuration at
    /// runtime takes effect immediately. Returns `None` unless both the
    /// endpoint URL and the access key resolve to non-empty values.
    pub fn from_env() -> Option<Self> {
        let url = first_non_empty(&URL_VARS)?;
        let anon_key = first_non_empty(&KEY_VARS)?;
        Some(Self { url, anon_key })
    }
}

/// The fallback-detection predicate: remote persistence is usable only when
/// both endpoint URL and access credential are present.
pub fn is_remote_configured() -> bool {
    RemoteConfig::from_env().is_some()
}

fn first_non_empty(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| env::var(name).ok())
        .find(|value| !value.trim().is_empty())
}
