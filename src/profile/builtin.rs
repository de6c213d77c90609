//! Built-in profile definitions embedded in the binary
//!
//! The operator selects one of these by name (`--profile daily`) instead of
//! pointing at a YAML file.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Built-in profile YAML definitions
pub static BUILTIN_PROFILES: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| {
        let mut m = HashMap::new();

        // Transactions
        m.insert("daily", include_str!("../../profiles/daily.yaml"));
        m.insert("backfill", include_str!("../../profiles/backfill.yaml"));
        m.insert("history", include_str!("../../profiles/backfill.yaml"));

        // Reference data
        m.insert("master", include_str!("../../profiles/master.yaml"));

        m
    });

/// Get a built-in profile by name
pub fn get_builtin(name: &str) -> Option<&'static str> {
    BUILTIN_PROFILES.get(name).copied()
}

/// Check if a name is a built-in profile
pub fn is_builtin(name: &str) -> bool {
    BUILTIN_PROFILES.contains_key(name)
}

/// List built-in profile names (primary names only, no aliases)
pub fn list_builtin() -> Vec<&'static str> {
    vec!["daily", "master", "backfill"]
}
