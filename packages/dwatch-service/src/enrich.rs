use std::{sync::Arc, time::Duration};

use dwatch_domain::{
	DisasterType, EnrichedRecord, GeoPoint, RawItem, SelectionPolicy, Severity, SynonymMatcher,
	category, location, severity,
};

use crate::{
	Capabilities, EntityRecognizer, Error, Geocoder, Result, SentimentScorer, TextClassifier,
};

#[derive(Debug, Clone)]
pub struct EnrichSettings {
	pub policy: SelectionPolicy,
	pub batch_size: usize,
	pub default_location: String,
	pub default_geo: GeoPoint,
	pub geocode_attempts: u32,
	pub geocode_backoff: Duration,
}
impl EnrichSettings {
	pub fn from_config(cfg: &dwatch_config::Enrichment) -> Self {
		Self {
			policy: SelectionPolicy::new(cfg.primary_threshold, cfg.secondary_threshold),
			batch_size: cfg.batch_size.max(1) as usize,
			default_location: cfg.default_location.clone(),
			default_geo: GeoPoint::new(cfg.default_geo.lat, cfg.default_geo.lon),
			geocode_attempts: cfg.geocode_attempts.max(1),
			geocode_backoff: Duration::from_millis(cfg.geocode_backoff_ms),
		}
	}
}

/// Turns raw items into enriched records. Every capability failure degrades to a default.
pub struct Enricher {
	settings: EnrichSettings,
	matcher: SynonymMatcher,
	labels: Vec<String>,
	classifier: Arc<dyn TextClassifier>,
	recognizer: Arc<dyn EntityRecognizer>,
	geocoder: Arc<dyn Geocoder>,
	sentiment: Arc<dyn SentimentScorer>,
}
impl Enricher {
	pub fn new(settings: EnrichSettings, caps: &Capabilities) -> Result<Self> {
		let matcher = SynonymMatcher::builtin()
			.map_err(|err| Error::Config { message: format!("Invalid synonym table: {err}") })?;
		let labels =
			DisasterType::CANONICAL.iter().map(|category| category.as_str().to_string()).collect();

		Ok(Self {
			settings,
			matcher,
			labels,
			classifier: caps.classifier.clone(),
			recognizer: caps.recognizer.clone(),
			geocoder: caps.geocoder.clone(),
			sentiment: caps.sentiment.clone(),
		})
	}

	pub async fn enrich(&self, item: &RawItem) -> EnrichedRecord {
		let text = item.combined_text();
		let categories = self.resolve_categories(std::slice::from_ref(&text)).await;
		let categories = categories.into_iter().next().unwrap_or_else(category::unknown_only);

		self.finish(item, &text, categories).await
	}

	/// Enriches `items` in order. Classifier calls for the whole slice are batched.
	pub async fn enrich_batch(&self, items: &[RawItem]) -> Vec<EnrichedRecord> {
		let texts: Vec<String> = items.iter().map(RawItem::combined_text).collect();
		let categories = self.resolve_categories(&texts).await;
		let mut records = Vec::with_capacity(items.len());

		for ((item, text), categories) in items.iter().zip(&texts).zip(categories) {
			records.push(self.finish(item, text, categories).await);
		}

		records
	}

	/// Synonyms first, classifier for the rest, synonyms once more for anything still unresolved.
	/// The result has one non-empty entry per text.
	pub async fn resolve_categories(&self, texts: &[String]) -> Vec<Vec<DisasterType>> {
		let mut resolved: Vec<Vec<DisasterType>> =
			texts.iter().map(|text| self.matcher.resolve(text)).collect();
		let deferred: Vec<usize> = resolved
			.iter()
			.enumerate()
			.filter(|(_, found)| found.is_empty())
			.map(|(idx, _)| idx)
			.collect();

		for chunk in deferred.chunks(self.settings.batch_size.max(1)) {
			let batch: Vec<String> = chunk.iter().map(|idx| texts[*idx].clone()).collect();
			let selections = self.classify_batch(&batch).await;

			for (idx, selection) in chunk.iter().zip(selections) {
				resolved[*idx] = selection;
			}
		}

		for (text, categories) in texts.iter().zip(resolved.iter_mut()) {
			if category::is_unresolved(categories) {
				let retry = self.matcher.resolve(text);

				*categories = if retry.is_empty() { category::unknown_only() } else { retry };
			}
		}

		resolved
	}

	pub async fn extract_location(&self, title: &str, description: &str) -> String {
		let Some(query) = location::location_query(title, description) else {
			return self.settings.default_location.clone();
		};

		match self.recognizer.entities(&query).await {
			Ok(entities) => location::first_place(&entities)
				.unwrap_or_else(|| self.settings.default_location.clone()),
			Err(err) => {
				tracing::warn!(error = %err, "Entity recognition failed. Using default location.");

				self.settings.default_location.clone()
			},
		}
	}

	/// Total: an empty place or exhausted retries yield the default coordinate.
	pub async fn geocode(&self, place: &str) -> GeoPoint {
		let place = place.trim();

		if place.is_empty() {
			return self.settings.default_geo;
		}

		let attempts = self.settings.geocode_attempts;

		for attempt in 1..=attempts {
			match self.geocoder.lookup(place).await {
				Ok(Some(point)) if point.is_valid() => return point,
				Ok(_) => {
					tracing::debug!(place, attempt, "Geocoder returned no usable match.");
				},
				Err(err) => {
					tracing::warn!(place, attempt, error = %err, "Geocoder lookup failed.");
				},
			}

			if attempt < attempts && !self.settings.geocode_backoff.is_zero() {
				tokio::time::sleep(self.settings.geocode_backoff).await;
			}
		}

		tracing::warn!(place, attempts, "Geocoding exhausted retries. Using default coordinate.");

		self.settings.default_geo
	}

	pub async fn score_severity(&self, text: &str) -> Severity {
		let text = text.trim();

		if text.is_empty() {
			return Severity::Low;
		}

		match self.sentiment.score(severity::sentiment_input(text)).await {
			Ok(sentiment) => Severity::from_sentiment(&sentiment),
			Err(err) => {
				tracing::warn!(error = %err, "Sentiment scoring failed. Using low severity.");

				Severity::Low
			},
		}
	}

	async fn classify_batch(&self, batch: &[String]) -> Vec<Vec<DisasterType>> {
		match self.classifier.classify(batch, &self.labels).await {
			Ok(ranked) if ranked.len() == batch.len() =>
				ranked.iter().map(|ranked| self.settings.policy.select(ranked)).collect(),
			Ok(ranked) => {
				tracing::warn!(
					expected = batch.len(),
					actual = ranked.len(),
					"Classifier result count mismatch. Marking batch unknown."
				);

				vec![category::unknown_only(); batch.len()]
			},
			Err(err) => {
				tracing::warn!(
					error = %err,
					batch = batch.len(),
					"Classification failed. Marking batch unknown."
				);

				vec![category::unknown_only(); batch.len()]
			},
		}
	}

	async fn finish(
		&self,
		item: &RawItem,
		text: &str,
		disaster_types: Vec<DisasterType>,
	) -> EnrichedRecord {
		let location = self.extract_location(&item.title, &item.description).await;
		let severity = self.score_severity(text).await;
		let geo = self.geocode(&location).await;

		EnrichedRecord {
			title: item.title.clone(),
			description: item.description.clone(),
			body: item.body.clone(),
			url: item.url.clone().unwrap_or_default(),
			source: item.source.clone(),
			published_at: item.published_at,
			disaster_types,
			location,
			geo,
			severity,
		}
	}
}
