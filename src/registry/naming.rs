//! Route naming convention.

use std::collections::BTreeMap;

/// Default route for a unit: underscores become path separators.
pub fn derive_route(identifier: &str) -> String {
    format!("/{}", identifier.replace('_', "/"))
}

/// Units whose route keeps its underscore.
pub fn builtin_overrides() -> BTreeMap<String, String> {
    [
        ("daily_signin", "/daily_signin"),
        ("fm_trash", "/fm_trash"),
        ("personal_fm", "/personal_fm"),
    ]
    .into_iter()
    .map(|(unit, route)| (unit.to_string(), route.to_string()))
    .collect()
}

/// Find the override for a unit, keyed by its identifier or its file name.
pub(crate) fn find_override<'a>(
    overrides: &'a BTreeMap<String, String>,
    identifier: &str,
) -> Option<&'a String> {
    overrides
        .get(identifier)
        .or_else(|| overrides.get(&format!("{identifier}.rs")))
}
