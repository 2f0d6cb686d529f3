//! Query executor
//!
//! Runs a query against the record store and index manager:
//!
//! 1. Ask the index manager for candidates per condition.
//! 2. Intersect index-satisfied candidate sets smallest-first, or fall back
//!    to a full key scan when no condition was index-satisfied.
//! 3. Post-filter the remaining conditions against fetched records.
//! 4. Stable-sort per the order spec, ties broken by primary-key byte order.
//! 5. Truncate to the limit.
//!
//! The candidate key set is snapshotted up front, so an in-flight concurrent
//! commit cannot change results mid-query.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::error::Result;
use crate::index::{parse_decimal, IndexManager};
use crate::store::RecordStore;

use super::results::ResultSet;
use super::{Direction, Query};

/// Execute a query, producing its result set
pub(crate) fn execute<'a>(
    store: &'a RecordStore,
    indexes: &IndexManager,
    query: &Query,
) -> Result<ResultSet<'a>> {
    // Step 1: index candidates per condition.
    let mut index_sets: Vec<Vec<Vec<u8>>> = Vec::new();
    let mut residual = Vec::new();

    for condition in query.conditions() {
        match indexes.candidates(condition) {
            Some(set) => index_sets.push(set),
            None => residual.push(condition),
        }
    }

    // Step 2: working set — intersection of index hits, else full scan.
    let mut keys: Vec<Vec<u8>> = if index_sets.is_empty() {
        store.keys(None, None)
    } else {
        index_sets.sort_by_key(|set| set.len());
        let mut sets = index_sets.into_iter();
        let mut working: BTreeSet<Vec<u8>> = sets.next().unwrap_or_default().into_iter().collect();
        for set in sets {
            let other: BTreeSet<Vec<u8>> = set.into_iter().collect();
            working.retain(|pk| other.contains(pk));
        }
        working.into_iter().collect()
    };

    // Step 3: post-filter conditions no index satisfied.
    if !residual.is_empty() {
        let mut kept = Vec::with_capacity(keys.len());
        for pk in keys {
            // A key can vanish between candidate capture and this fetch;
            // a missing record simply fails the filter.
            let record = match store.get(&pk) {
                Some(record) => record,
                None => continue,
            };
            let hit = residual.iter().all(|condition| {
                let value = if condition.column().is_empty() {
                    Some(pk.as_slice())
                } else {
                    record.get(condition.column())
                };
                condition.matches(value)
            });
            if hit {
                kept.push(pk);
            }
        }
        keys = kept;
    }

    // Step 4: order spec; ties always break by primary-key byte order.
    if let Some((column, direction)) = query.order() {
        let mut decorated: Vec<(Option<Vec<u8>>, Vec<u8>)> = keys
            .into_iter()
            .map(|pk| {
                let value = if column.is_empty() {
                    Some(pk.clone())
                } else {
                    store
                        .get(&pk)
                        .and_then(|record| record.get(column).map(|v| v.to_vec()))
                };
                (value, pk)
            })
            .collect();

        decorated.sort_by(|(a_value, a_pk), (b_value, b_pk)| {
            compare_values(a_value.as_deref(), b_value.as_deref(), direction)
                .then_with(|| a_pk.cmp(b_pk))
        });

        keys = decorated.into_iter().map(|(_, pk)| pk).collect();
    }

    // Step 5: limit.
    if let Some(limit) = query.limit_count() {
        keys.truncate(limit);
    }

    // Step 6: lazy result set over the final key sequence.
    Ok(ResultSet::new(
        keys,
        store,
        query.is_keys_only(),
        query.is_include_pk(),
    ))
}

/// Compare two sort-column values under a direction
///
/// A missing value sorts smallest in every direction; numeric directions
/// treat an unparsable value the same as a missing one.
fn compare_values(a: Option<&[u8]>, b: Option<&[u8]>, direction: Direction) -> Ordering {
    let ordering = match direction {
        Direction::LexicalAsc | Direction::LexicalDesc => a.cmp(&b),
        Direction::NumericAsc | Direction::NumericDesc => {
            let a = a.and_then(parse_decimal);
            let b = b.and_then(parse_decimal);
            match (a, b) {
                (Some(a), Some(b)) => a.total_cmp(&b),
                (Some(_), None) => Ordering::Greater,
                (None, Some(_)) => Ordering::Less,
                (None, None) => Ordering::Equal,
            }
        }
    };

    match direction {
        Direction::LexicalAsc | Direction::NumericAsc => ordering,
        Direction::LexicalDesc | Direction::NumericDesc => ordering.reverse(),
    }
}
