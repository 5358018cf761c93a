//! One ingestion pass: fetch, filter, and enrich per category, then merge and publish once.

use std::{collections::HashSet, time::Duration};

use serde::Serialize;

use dwatch_config::Config;
use dwatch_domain::{DisasterType, EnrichedRecord, RawItem};

use crate::{Capabilities, EnrichSettings, Enricher, Error, Result, merge, publish};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
	/// Categories for which at least one source answered.
	pub categories_fetched: usize,
	pub fetched: usize,
	/// Items dropped at FILTER: already seen, repeated within the page, or without a URL.
	pub skipped_seen: usize,
	pub enriched: usize,
	pub existing_count: usize,
	pub new_count: usize,
	pub total_after_merge: usize,
	pub indexed: usize,
	pub index_failures: usize,
}

pub struct Pipeline {
	categories: Vec<DisasterType>,
	page_size: u32,
	category_pause: Duration,
	caps: Capabilities,
	enricher: Enricher,
}
impl Pipeline {
	pub fn new(cfg: &Config, caps: Capabilities) -> Result<Self> {
		let categories = cfg
			.pipeline
			.categories
			.iter()
			.map(|raw| {
				raw.parse::<DisasterType>()
					.map_err(|err| Error::Config { message: err.to_string() })
			})
			.collect::<Result<Vec<_>>>()?;
		let enricher = Enricher::new(EnrichSettings::from_config(&cfg.enrichment), &caps)?;

		Ok(Self {
			categories,
			page_size: cfg.pipeline.page_size,
			category_pause: Duration::from_millis(cfg.pipeline.category_pause_ms),
			caps,
			enricher,
		})
	}

	pub fn with_parts(
		categories: Vec<DisasterType>,
		page_size: u32,
		category_pause: Duration,
		caps: Capabilities,
		enricher: Enricher,
	) -> Self {
		Self { categories, page_size, category_pause, caps, enricher }
	}

	pub fn enricher(&self) -> &Enricher {
		&self.enricher
	}

	/// Runs to completion. Only a failed store write is returned as an error; every other
	/// degradation is logged and reflected in the report.
	pub async fn run(&self) -> Result<RunReport> {
		let mut report = RunReport::default();
		let mut seen = self.load_seen().await;
		let mut new_records: Vec<EnrichedRecord> = Vec::new();

		for (idx, category) in self.categories.iter().copied().enumerate() {
			if idx > 0 && !self.category_pause.is_zero() {
				tokio::time::sleep(self.category_pause).await;
			}

			let Some(items) = self.fetch(category).await else {
				continue;
			};

			report.categories_fetched += 1;
			report.fetched += items.len();

			let fresh = filter_unseen(items, &seen);

			report.skipped_seen += fresh.skipped;

			if fresh.items.is_empty() {
				tracing::info!(category = %category, "No new items.");

				continue;
			}

			let records = self.enricher.enrich_batch(&fresh.items).await;

			seen.extend(records.iter().map(|record| record.url.clone()));

			tracing::info!(category = %category, enriched = records.len(), "Enriched category.");

			report.enriched += records.len();
			new_records.extend(records);
		}

		if new_records.is_empty() {
			tracing::info!("No new records found. Skipping merge and publish.");

			return Ok(report);
		}

		let outcome = merge::merge_into_store(self.caps.store.as_ref(), new_records.clone()).await?;

		report.existing_count = outcome.existing_count;
		report.new_count = outcome.new_count;
		report.total_after_merge = outcome.total();

		let published = publish::publish(self.caps.index.as_ref(), &new_records).await;

		report.indexed = published.indexed;
		report.index_failures = published.failed;

		Ok(report)
	}

	async fn load_seen(&self) -> HashSet<String> {
		match self.caps.store.seen_urls().await {
			Ok(seen) => {
				tracing::info!(existing = seen.len(), "Loaded seen URLs.");

				seen
			},
			Err(err) => {
				tracing::warn!(
					error = %err,
					"Existing store is unreadable. Starting with no seen URLs."
				);

				HashSet::new()
			},
		}
	}

	/// Items from every source, in source order. `None` when every source failed.
	async fn fetch(&self, category: DisasterType) -> Option<Vec<RawItem>> {
		let mut items = Vec::new();
		let mut answered = false;

		for source in &self.caps.sources {
			match source.fetch(category, self.page_size).await {
				Ok(batch) => {
					tracing::info!(
						category = %category,
						source = source.name(),
						count = batch.len(),
						"Fetched raw items."
					);

					answered = true;
					items.extend(batch);
				},
				Err(err) => {
					tracing::warn!(
						category = %category,
						source = source.name(),
						error = %err,
						"Source unavailable. Skipping it for this category."
					);
				},
			}
		}

		answered.then_some(items)
	}
}

struct Filtered {
	items: Vec<RawItem>,
	skipped: usize,
}

/// Keeps items whose URL is new to both the store and this page. Kept items carry the trimmed
/// URL, which is the key stored, indexed, and added to the seen set.
fn filter_unseen(items: Vec<RawItem>, seen: &HashSet<String>) -> Filtered {
	let total = items.len();
	let mut page_urls = HashSet::new();
	let items: Vec<RawItem> = items
		.into_iter()
		.filter_map(|mut item| {
			let url = item.url.as_deref().map(str::trim).filter(|url| !url.is_empty())?;
			let url = url.to_string();

			if seen.contains(&url) || !page_urls.insert(url.clone()) {
				return None;
			}

			item.url = Some(url);

			Some(item)
		})
		.collect();

	Filtered { skipped: total - items.len(), items }
}
