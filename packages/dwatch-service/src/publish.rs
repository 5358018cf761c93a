use dwatch_domain::{EnrichedRecord, IndexDocument, index_document};

use crate::SearchIndex;

// Rejections past this many are counted but not logged one by one.
const LOGGED_FAILURES: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
	pub indexed: usize,
	pub failed: usize,
}

/// Upserts `records` keyed by URL. Never fails: rejected documents and transport errors are
/// counted in [`PublishReport::failed`].
pub async fn publish(index: &dyn SearchIndex, records: &[EnrichedRecord]) -> PublishReport {
	if records.is_empty() {
		return PublishReport::default();
	}

	let docs: Vec<IndexDocument> = records.iter().map(index_document).collect();

	match index.bulk_upsert(&docs).await {
		Ok(report) => {
			for (id, reason) in report.failures.iter().take(LOGGED_FAILURES) {
				tracing::warn!(id = %id, reason = %reason, "Index rejected document.");
			}
			if report.failed > 0 {
				tracing::warn!(failed = report.failed, "Bulk upsert partially failed.");
			}

			PublishReport { indexed: report.written, failed: report.failed }
		},
		Err(err) => {
			tracing::error!(error = %err, documents = docs.len(), "Bulk upsert failed.");

			PublishReport { indexed: 0, failed: docs.len() }
		},
	}
}
