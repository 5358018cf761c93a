//! Production implementations of the capability traits.

use std::{collections::HashSet, sync::Arc};

use dwatch_config::Config;
use dwatch_domain::{
	DisasterType, EnrichedRecord, Entity, GeoPoint, IndexDocument, RawItem, Sentiment,
};
use dwatch_providers::{
	classifier::ClassifierClient, geocoder::GeocoderClient, news_api::NewsApiClient,
	ner::NerClient, reddit::RedditClient, sentiment::SentimentClient,
};
use dwatch_storage::{
	db::Db,
	elastic::{BulkReport, ElasticIndex},
	records::PgStore,
	snapshot::SnapshotStore,
};

use crate::{
	BoxFuture, Capabilities, EntityRecognizer, Error, FeedSource, Geocoder, RecordStore, Result,
	SearchIndex, SentimentScorer, TextClassifier,
};

impl Capabilities {
	/// Builds every HTTP client, opens the configured store, and makes sure the index exists.
	pub async fn connect(cfg: &Config) -> Result<Self> {
		let mut sources: Vec<Arc<dyn FeedSource>> = Vec::new();

		if let Some(news) = cfg.sources.news_api.as_ref()
			&& news.enabled
		{
			sources.push(Arc::new(NewsApiClient::new(news.clone())?));
		}
		if let Some(reddit) = cfg.sources.reddit.as_ref()
			&& reddit.enabled
		{
			sources.push(Arc::new(RedditClient::new(reddit.clone())?));
		}
		if sources.is_empty() {
			return Err(Error::Config { message: "No feed source is enabled.".to_string() });
		}

		let store = connect_store(&cfg.storage).await?;
		let index = ElasticIndex::new(&cfg.index)?;

		index.ensure_index().await?;

		Ok(Self {
			sources,
			classifier: Arc::new(ClassifierClient::new(cfg.providers.classifier.clone())?),
			recognizer: Arc::new(NerClient::new(cfg.providers.ner.clone())?),
			geocoder: Arc::new(GeocoderClient::new(cfg.providers.geocoder.clone())?),
			sentiment: Arc::new(SentimentClient::new(cfg.providers.sentiment.clone())?),
			store,
			index: Arc::new(index),
		})
	}
}

async fn connect_store(cfg: &dwatch_config::Storage) -> Result<Arc<dyn RecordStore>> {
	match cfg.backend.as_str() {
		"postgres" => {
			let pg = cfg.postgres.as_ref().ok_or_else(|| Error::Config {
				message: "storage.postgres is required for the postgres backend.".to_string(),
			})?;
			let db = Db::connect(pg).await?;

			db.ensure_schema().await?;

			Ok(Arc::new(PgStore::new(db)))
		},
		"snapshot" => {
			let snapshot = cfg.snapshot.as_ref().ok_or_else(|| Error::Config {
				message: "storage.snapshot is required for the snapshot backend.".to_string(),
			})?;

			Ok(Arc::new(SnapshotStore::new(snapshot)))
		},
		other => Err(Error::Config { message: format!("Unsupported storage backend {other:?}.") }),
	}
}

impl FeedSource for NewsApiClient {
	fn name(&self) -> &str {
		"newsapi"
	}

	fn fetch<'a>(
		&'a self,
		category: DisasterType,
		page_size: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<RawItem>>> {
		Box::pin(async move { Ok(self.search(category.as_str(), page_size).await?) })
	}
}

impl FeedSource for RedditClient {
	fn name(&self) -> &str {
		"reddit"
	}

	fn fetch<'a>(
		&'a self,
		category: DisasterType,
		page_size: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<RawItem>>> {
		Box::pin(async move { Ok(self.search(category.as_str(), page_size).await?) })
	}
}

impl TextClassifier for ClassifierClient {
	fn classify<'a>(
		&'a self,
		texts: &'a [String],
		labels: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<(String, f32)>>>> {
		Box::pin(async move { Ok(ClassifierClient::classify(self, texts, labels).await?) })
	}
}

impl EntityRecognizer for NerClient {
	fn entities<'a>(&'a self, text: &'a str) -> BoxFuture<'a, color_eyre::Result<Vec<Entity>>> {
		Box::pin(async move { Ok(self.recognize(text).await?) })
	}
}

impl Geocoder for GeocoderClient {
	fn lookup<'a>(
		&'a self,
		place: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Option<GeoPoint>>> {
		Box::pin(async move { Ok(GeocoderClient::lookup(self, place).await?) })
	}
}

impl SentimentScorer for SentimentClient {
	fn score<'a>(&'a self, text: &'a str) -> BoxFuture<'a, color_eyre::Result<Sentiment>> {
		Box::pin(async move { Ok(SentimentClient::score(self, text).await?) })
	}
}

impl RecordStore for PgStore {
	fn load(&self) -> BoxFuture<'_, color_eyre::Result<Vec<EnrichedRecord>>> {
		Box::pin(async move { Ok(PgStore::load(self).await?) })
	}

	fn replace<'a>(
		&'a self,
		records: &'a [EnrichedRecord],
	) -> BoxFuture<'a, color_eyre::Result<()>> {
		Box::pin(async move { Ok(PgStore::replace(self, records).await?) })
	}

	fn seen_urls(&self) -> BoxFuture<'_, color_eyre::Result<HashSet<String>>> {
		Box::pin(async move { Ok(self.load_urls().await?) })
	}
}

impl RecordStore for SnapshotStore {
	fn load(&self) -> BoxFuture<'_, color_eyre::Result<Vec<EnrichedRecord>>> {
		Box::pin(async move { Ok(SnapshotStore::load(self).await?) })
	}

	fn replace<'a>(
		&'a self,
		records: &'a [EnrichedRecord],
	) -> BoxFuture<'a, color_eyre::Result<()>> {
		Box::pin(async move { Ok(SnapshotStore::replace(self, records).await?) })
	}
}

impl SearchIndex for ElasticIndex {
	fn bulk_upsert<'a>(
		&'a self,
		docs: &'a [IndexDocument],
	) -> BoxFuture<'a, color_eyre::Result<BulkReport>> {
		Box::pin(async move { Ok(ElasticIndex::bulk_upsert(self, docs).await?) })
	}
}
