//! Helpers for dashboards that combine several upstream sub-queries.
//!
//! A failed sub-query degrades to an empty value instead of failing the whole
//! aggregate. Merged output is always re-sorted, so completion order is irrelevant.

use std::cmp::Ordering;

use tracing::warn;

use crate::gateway::error::ClassifiedError;

/// Unwraps a sub-query result, logging and substituting `T::default()` on failure.
pub fn degrade<T: Default>(label: &str, result: Result<T, ClassifiedError>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!(
                sub_query = label,
                kind = %e.kind(),
                "sub-query failed, continuing with empty result: {}",
                e.message()
            );
            T::default()
        }
    }
}

/// Degrades each failed sub-query. When every sub-query failed there is nothing
/// to show, so the first error is returned instead.
pub fn settle<T: Default>(
    results: Vec<(&str, Result<T, ClassifiedError>)>,
) -> Result<Vec<T>, ClassifiedError> {
    if let Some(first_error) = first_error_if_all_failed(&results) {
        return Err(first_error);
    }
    Ok(results
        .into_iter()
        .map(|(label, result)| degrade(label, result))
        .collect())
}

fn first_error_if_all_failed<T>(
    results: &[(&str, Result<T, ClassifiedError>)],
) -> Option<ClassifiedError> {
    if results.is_empty() || results.iter().any(|(_, r)| r.is_ok()) {
        return None;
    }
    results.iter().find_map(|(_, r)| r.as_ref().err().cloned())
}

/// Flattens `batches`, sorts with `compare` and keeps at most `max` items.
pub fn merge_sorted<T, F>(batches: Vec<Vec<T>>, mut compare: F, max: usize) -> Vec<T>
where
    F: FnMut(&T, &T) -> Ordering,
{
    let mut merged: Vec<T> = batches.into_iter().flatten().collect();
    merged.sort_by(|a, b| compare(a, b));
    merged.truncate(max);
    merged
}
