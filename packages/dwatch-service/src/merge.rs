use dwatch_domain::{EnrichedRecord, MergeOutcome, merge_records};

use crate::{Error, RecordStore, Result};

/// Merges `new` into the persisted store and replaces it atomically.
///
/// An unreadable store is treated as empty with a warning. A failed write is an error: the merged
/// set was not persisted.
pub async fn merge_into_store(
	store: &dyn RecordStore,
	new: Vec<EnrichedRecord>,
) -> Result<MergeOutcome> {
	let existing = match store.load().await {
		Ok(existing) => existing,
		Err(err) => {
			tracing::warn!(error = %err, "Existing store is unreadable. Treating it as empty.");

			Vec::new()
		},
	};
	let outcome = merge_records(existing, new);

	store
		.replace(&outcome.records)
		.await
		.map_err(|err| Error::Storage { message: format!("Failed to persist merged store: {err}") })?;

	tracing::info!(
		existing = outcome.existing_count,
		new = outcome.new_count,
		total = outcome.total(),
		"Merged records into the store."
	);

	Ok(outcome)
}
