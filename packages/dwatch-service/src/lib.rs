//! Capability seams and the ingestion pipeline built on them.
//!
//! Every external collaborator is a trait object in [`Capabilities`]. Production wiring lives in
//! [`adapters`]; tests substitute in-process fakes.

pub mod adapters;
pub mod enrich;
pub mod merge;
pub mod pipeline;
pub mod publish;

mod error;

pub use enrich::{EnrichSettings, Enricher};
pub use error::{Error, Result};
pub use pipeline::{Pipeline, RunReport};
pub use publish::PublishReport;

use std::{collections::HashSet, future::Future, pin::Pin, sync::Arc};

use dwatch_domain::{
	DisasterType, EnrichedRecord, Entity, GeoPoint, IndexDocument, RawItem, Sentiment,
};
use dwatch_storage::elastic::BulkReport;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait FeedSource
where
	Self: Send + Sync,
{
	fn name(&self) -> &str;

	fn fetch<'a>(
		&'a self,
		category: DisasterType,
		page_size: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<RawItem>>>;
}

pub trait TextClassifier
where
	Self: Send + Sync,
{
	/// One ranked `(label, confidence)` list per text, in input order.
	fn classify<'a>(
		&'a self,
		texts: &'a [String],
		labels: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<(String, f32)>>>>;
}

pub trait EntityRecognizer
where
	Self: Send + Sync,
{
	fn entities<'a>(&'a self, text: &'a str) -> BoxFuture<'a, color_eyre::Result<Vec<Entity>>>;
}

pub trait Geocoder
where
	Self: Send + Sync,
{
	fn lookup<'a>(
		&'a self,
		place: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Option<GeoPoint>>>;
}

pub trait SentimentScorer
where
	Self: Send + Sync,
{
	fn score<'a>(&'a self, text: &'a str) -> BoxFuture<'a, color_eyre::Result<Sentiment>>;
}

pub trait RecordStore
where
	Self: Send + Sync,
{
	fn load(&self) -> BoxFuture<'_, color_eyre::Result<Vec<EnrichedRecord>>>;

	/// Replaces the whole collection; readers never observe a partial write.
	fn replace<'a>(
		&'a self,
		records: &'a [EnrichedRecord],
	) -> BoxFuture<'a, color_eyre::Result<()>>;

	fn seen_urls(&self) -> BoxFuture<'_, color_eyre::Result<HashSet<String>>> {
		Box::pin(async move {
			Ok(self.load().await?.into_iter().map(|record| record.url).collect())
		})
	}
}

pub trait SearchIndex
where
	Self: Send + Sync,
{
	fn bulk_upsert<'a>(
		&'a self,
		docs: &'a [IndexDocument],
	) -> BoxFuture<'a, color_eyre::Result<BulkReport>>;
}

#[derive(Clone)]
pub struct Capabilities {
	pub sources: Vec<Arc<dyn FeedSource>>,
	pub classifier: Arc<dyn TextClassifier>,
	pub recognizer: Arc<dyn EntityRecognizer>,
	pub geocoder: Arc<dyn Geocoder>,
	pub sentiment: Arc<dyn SentimentScorer>,
	pub store: Arc<dyn RecordStore>,
	pub index: Arc<dyn SearchIndex>,
}
