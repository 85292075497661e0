//! Override-wins merging of param collections.
//!
//! Params are matched by [`Param::key`]. The merged collection comes back in
//! key order, not in either caller's order.

use std::collections::BTreeMap;

use crate::ast::Param;

/// Merge `defaults` with `overrides`. On a key collision the override is
/// kept and the default dropped.
///
/// Each input should hold a key at most once. Duplicates inside `overrides`
/// resolve to the last one, inside `defaults` to the first one; do not rely
/// on either.
pub fn combine_params(defaults: &[Param], overrides: &[Param]) -> Vec<Param> {
    let mut merged: BTreeMap<String, Param> = BTreeMap::new();
    for p in overrides {
        merged.insert(p.key(), p.clone());
    }
    for p in defaults {
        merged.entry(p.key()).or_insert_with(|| p.clone());
    }
    tracing::debug!(
        defaults = defaults.len(),
        overrides = overrides.len(),
        merged = merged.len(),
        "combined params"
    );
    merged.into_values().collect()
}

/// Merge three layers. `mandatory` wins over `overrides`, which wins over
/// `defaults`. Used for single-record calls where the primary-key filter
/// must not be overridden.
pub fn combine_with_mandatory(
    defaults: &[Param],
    overrides: &[Param],
    mandatory: &[Param],
) -> Vec<Param> {
    combine_params(&combine_params(defaults, overrides), mandatory)
}
