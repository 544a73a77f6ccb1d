//! Entity matching between SOURCE and TARGET record lists.
//!
//! Matching is computed per category and is index-based: a match is a
//! `Vec<Option<usize>>` parallel to the source slice, holding the claimed
//! target index. A target index, once claimed, is removed from the eligible
//! pool, so no target record participates in more than one match.
//!
//! The fuzzy strategy is deliberately greedy and order-dependent: source
//! records are visited in enumeration order and the first acceptable
//! unclaimed target wins, with no backtracking. False negatives are accepted
//! in exchange for predictable cost; a weighted bipartite assignment could
//! replace it behind the same signature if stronger guarantees are needed.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::hash::Hash;

use crate::models::EntityRecord;
use crate::normalize::normalize_name;

/// Exact-key matching: builds a key map over the target list (first
/// occurrence wins) and pairs each source record with the target sharing its
/// key. Each target index is claimed at most once.
pub fn match_exact_by<K, F>(
    source: &[EntityRecord],
    target: &[EntityRecord],
    key_fn: F,
) -> Vec<Option<usize>>
where
    K: Eq + Hash,
    F: Fn(&EntityRecord) -> K,
{
    let mut target_keys: HashMap<K, usize> = HashMap::with_capacity(target.len());
    for (i, record) in target.iter().enumerate() {
        target_keys.entry(key_fn(record)).or_insert(i);
    }

    let mut claimed = vec![false; target.len()];
    source
        .iter()
        .map(|record| match target_keys.get(&key_fn(record)) {
            Some(&i) if !claimed[i] => {
                claimed[i] = true;
                Some(i)
            }
            _ => None,
        })
        .collect()
}

/// Greedy fuzzy matching: for each source record, in order, scan the target
/// list for the first unclaimed record that belongs to the same group
/// (usually the same table) and whose name is equivalent under the supplied
/// predicate.
pub fn match_fuzzy<G, E>(
    source: &[EntityRecord],
    target: &[EntityRecord],
    same_group: G,
    equivalent: E,
) -> Vec<Option<usize>>
where
    G: Fn(&EntityRecord, &EntityRecord) -> bool,
    E: Fn(&EntityRecord, &EntityRecord) -> bool,
{
    let mut claimed = vec![false; target.len()];
    source
        .iter()
        .map(|src| {
            let found = target.iter().enumerate().find(|(i, tgt)| {
                !claimed[*i] && same_group(src, tgt) && equivalent(src, tgt)
            });
            match found {
                Some((i, _)) => {
                    claimed[i] = true;
                    Some(i)
                }
                None => None,
            }
        })
        .collect()
}

/// Hand-maintained SOURCE name -> acceptable TARGET names mapping.
///
/// Consulted before name matching for procedures and event triggers, where
/// PostgreSQL's 63-character identifier limit forces renames during
/// migration. Injected from configuration so the matcher stays testable
/// with synthetic maps.
#[derive(Debug, Clone, Default)]
pub struct RenameMap {
    entries: BTreeMap<String, Vec<String>>,
}

impl RenameMap {
    /// Builds a rename map from configured entries.
    pub fn new(entries: BTreeMap<String, Vec<String>>) -> Self {
        Self { entries }
    }

    /// Acceptable target names for a source name, if mapped.
    pub fn targets_for(&self, source_name: &str) -> Option<&[String]> {
        self.entries.get(source_name).map(Vec::as_slice)
    }

    /// Whether a target name appears in any mapped value list (normalized
    /// comparison). Used to suppress mapped targets from the extras list.
    pub fn is_mapped_target(&self, target_name: &str) -> bool {
        let needle = normalize_name(target_name);
        self.entries
            .values()
            .flatten()
            .any(|mapped| normalize_name(mapped) == needle)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
