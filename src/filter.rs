//! Verdict selection

use crate::types::{SelectionCriteria, VerdictRecord};

/// Whether `record` satisfies `criteria`
///
/// Both the document type and the importance value must be present and equal;
/// a missing field never matches.
pub fn matches(record: &VerdictRecord, criteria: &SelectionCriteria) -> bool {
    let type_matches = record
        .document_type
        .as_deref()
        .is_some_and(|t| t == criteria.document_type);
    let importance_matches = record
        .importance
        .as_ref()
        .is_some_and(|i| *i == criteria.importance);
    type_matches && importance_matches
}

/// Select the records matching `criteria`, keeping the API's order
///
/// The position of a record in the returned list determines its file name, so
/// the relative order of matches is never changed.
pub fn filter_verdicts(records: &[VerdictRecord], criteria: &SelectionCriteria) -> Vec<VerdictRecord> {
    records
        .iter()
        .filter(|record| matches(record, criteria))
        .cloned()
        .collect()
}
