use std::collections::HashSet;

use crate::EnrichedRecord;

#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
	/// Deduplicated store contents, newest publication first.
	pub records: Vec<EnrichedRecord>,
	pub existing_count: usize,
	pub new_count: usize,
}
impl MergeOutcome {
	pub fn total(&self) -> usize {
		self.records.len()
	}
}

/// Folds `new` into `existing`, keeping one record per URL.
///
/// Both inputs are concatenated (existing first), stably sorted by publication time descending,
/// and the first occurrence of each URL is kept. The most recently published copy of a
/// duplicated URL wins; on equal timestamps the earlier-inserted copy wins.
pub fn merge_records(existing: Vec<EnrichedRecord>, new: Vec<EnrichedRecord>) -> MergeOutcome {
	let existing_count = existing.len();
	let new_count = new.len();
	let mut combined = existing;

	combined.extend(new);
	combined.sort_by(|a, b| b.published_at.cmp(&a.published_at));

	let mut seen = HashSet::with_capacity(combined.len());

	combined.retain(|record| seen.insert(record.url.clone()));

	MergeOutcome { records: combined, existing_count, new_count }
}
