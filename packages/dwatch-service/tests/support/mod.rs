#![allow(dead_code)]

use std::{
	collections::{HashMap, HashSet},
	sync::{
		Arc, Mutex,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};

use color_eyre::eyre;
use serde_json::Value;
use time::OffsetDateTime;

use dwatch_domain::{
	DisasterType, EnrichedRecord, Entity, GeoPoint, IndexDocument, Polarity, RawItem,
	SelectionPolicy, Sentiment,
};
use dwatch_service::{
	BoxFuture, Capabilities, EnrichSettings, Enricher, EntityRecognizer, FeedSource, Geocoder,
	RecordStore, SearchIndex, SentimentScorer, TextClassifier,
};
use dwatch_storage::elastic::BulkReport;

pub const DEFAULT_LOCATION: &str = "India";
pub const DEFAULT_GEO: GeoPoint = GeoPoint { lat: 20.5937, lon: 78.9629 };

pub fn raw(title: &str, url: &str, published_at: OffsetDateTime) -> RawItem {
	RawItem {
		title: title.to_string(),
		description: String::new(),
		body: String::new(),
		url: Some(url.to_string()),
		source: "wire".to_string(),
		published_at,
	}
}

pub fn settings() -> EnrichSettings {
	EnrichSettings {
		policy: SelectionPolicy::default(),
		batch_size: 16,
		default_location: DEFAULT_LOCATION.to_string(),
		default_geo: DEFAULT_GEO,
		geocode_attempts: 3,
		geocode_backoff: Duration::ZERO,
	}
}

/// Returns the same ranked list for every text and records each batch size.
pub struct SpyClassifier {
	pub ranked: Vec<(String, f32)>,
	pub batches: Mutex<Vec<usize>>,
}
impl SpyClassifier {
	pub fn new(ranked: &[(&str, f32)]) -> Self {
		Self {
			ranked: ranked.iter().map(|(label, score)| (label.to_string(), *score)).collect(),
			batches: Mutex::new(Vec::new()),
		}
	}

	pub fn calls(&self) -> usize {
		self.batches.lock().unwrap_or_else(|err| err.into_inner()).len()
	}
}
impl TextClassifier for SpyClassifier {
	fn classify<'a>(
		&'a self,
		texts: &'a [String],
		_labels: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<(String, f32)>>>> {
		self.batches.lock().unwrap_or_else(|err| err.into_inner()).push(texts.len());

		let ranked: Vec<Vec<(String, f32)>> = texts.iter().map(|_| self.ranked.clone()).collect();

		Box::pin(async move { Ok(ranked) })
	}
}

/// Ranks `flood` first for texts mentioning "river", `drought` otherwise.
pub struct KeywordClassifier;
impl TextClassifier for KeywordClassifier {
	fn classify<'a>(
		&'a self,
		texts: &'a [String],
		_labels: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<(String, f32)>>>> {
		let ranked: Vec<Vec<(String, f32)>> = texts
			.iter()
			.map(|text| {
				if text.contains("river") {
					vec![("flood".to_string(), 0.8), ("drought".to_string(), 0.05)]
				} else {
					vec![("drought".to_string(), 0.6), ("flood".to_string(), 0.2)]
				}
			})
			.collect();

		Box::pin(async move { Ok(ranked) })
	}
}

pub struct FailingClassifier;
impl TextClassifier for FailingClassifier {
	fn classify<'a>(
		&'a self,
		_texts: &'a [String],
		_labels: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<(String, f32)>>>> {
		Box::pin(async move { Err(eyre::eyre!("model is loading")) })
	}
}

pub struct StubRecognizer {
	pub entities: Vec<Entity>,
	pub calls: AtomicUsize,
}
impl StubRecognizer {
	pub fn new(entities: Vec<Entity>) -> Self {
		Self { entities, calls: AtomicUsize::new(0) }
	}
}
impl EntityRecognizer for StubRecognizer {
	fn entities<'a>(&'a self, _text: &'a str) -> BoxFuture<'a, color_eyre::Result<Vec<Entity>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let entities = self.entities.clone();

		Box::pin(async move { Ok(entities) })
	}
}

pub struct FailingRecognizer;
impl EntityRecognizer for FailingRecognizer {
	fn entities<'a>(&'a self, _text: &'a str) -> BoxFuture<'a, color_eyre::Result<Vec<Entity>>> {
		Box::pin(async move { Err(eyre::eyre!("ner timed out")) })
	}
}

/// Fails `failures` times, then answers with `point` (or no match when `None`).
pub struct FlakyGeocoder {
	pub failures: usize,
	pub point: Option<GeoPoint>,
	pub calls: AtomicUsize,
}
impl FlakyGeocoder {
	pub fn new(failures: usize, point: Option<GeoPoint>) -> Self {
		Self { failures, point, calls: AtomicUsize::new(0) }
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}
impl Geocoder for FlakyGeocoder {
	fn lookup<'a>(
		&'a self,
		_place: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Option<GeoPoint>>> {
		let call = self.calls.fetch_add(1, Ordering::SeqCst);
		let result =
			if call < self.failures { Err(eyre::eyre!("geocoder 503")) } else { Ok(self.point) };

		Box::pin(async move { result })
	}
}

pub struct StubSentiment {
	pub sentiment: Option<Sentiment>,
	pub inputs: Mutex<Vec<String>>,
}
impl StubSentiment {
	pub fn new(polarity: Polarity, confidence: f32) -> Self {
		Self { sentiment: Some(Sentiment { polarity, confidence }), inputs: Mutex::new(Vec::new()) }
	}

	pub fn failing() -> Self {
		Self { sentiment: None, inputs: Mutex::new(Vec::new()) }
	}

	pub fn inputs(&self) -> Vec<String> {
		self.inputs.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}
}
impl SentimentScorer for StubSentiment {
	fn score<'a>(&'a self, text: &'a str) -> BoxFuture<'a, color_eyre::Result<Sentiment>> {
		self.inputs.lock().unwrap_or_else(|err| err.into_inner()).push(text.to_string());

		let result = self.sentiment.ok_or_else(|| eyre::eyre!("sentiment unavailable"));

		Box::pin(async move { result })
	}
}

/// Serves items keyed by category; categories in `failing` error out.
pub struct StubSource {
	pub name: String,
	pub items: HashMap<DisasterType, Vec<RawItem>>,
	pub failing: HashSet<DisasterType>,
	pub calls: Mutex<Vec<DisasterType>>,
}
impl StubSource {
	pub fn new(name: &str) -> Self {
		Self {
			name: name.to_string(),
			items: HashMap::new(),
			failing: HashSet::new(),
			calls: Mutex::new(Vec::new()),
		}
	}

	pub fn with_items(mut self, category: DisasterType, items: Vec<RawItem>) -> Self {
		self.items.insert(category, items);

		self
	}

	pub fn failing_on(mut self, category: DisasterType) -> Self {
		self.failing.insert(category);

		self
	}
}
impl FeedSource for StubSource {
	fn name(&self) -> &str {
		&self.name
	}

	fn fetch<'a>(
		&'a self,
		category: DisasterType,
		page_size: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<RawItem>>> {
		self.calls.lock().unwrap_or_else(|err| err.into_inner()).push(category);

		let result: color_eyre::Result<Vec<RawItem>> = if self.failing.contains(&category) {
			Err(eyre::eyre!("HTTP 429 for {category}"))
		} else {
			Ok(self
				.items
				.get(&category)
				.map(|items| items.iter().take(page_size as usize).cloned().collect())
				.unwrap_or_default())
		};

		Box::pin(async move { result })
	}
}

#[derive(Default)]
pub struct MemoryStore {
	pub records: Mutex<Vec<EnrichedRecord>>,
	pub corrupt: bool,
	pub replaces: AtomicUsize,
}
impl MemoryStore {
	pub fn with_records(records: Vec<EnrichedRecord>) -> Self {
		Self { records: Mutex::new(records), ..Default::default() }
	}

	pub fn corrupt() -> Self {
		Self { corrupt: true, ..Default::default() }
	}

	pub fn snapshot(&self) -> Vec<EnrichedRecord> {
		self.records.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}

	pub fn replaces(&self) -> usize {
		self.replaces.load(Ordering::SeqCst)
	}
}
impl RecordStore for MemoryStore {
	fn load(&self) -> BoxFuture<'_, color_eyre::Result<Vec<EnrichedRecord>>> {
		let result = if self.corrupt {
			Err(eyre::eyre!("unexpected end of file"))
		} else {
			Ok(self.snapshot())
		};

		Box::pin(async move { result })
	}

	fn replace<'a>(
		&'a self,
		records: &'a [EnrichedRecord],
	) -> BoxFuture<'a, color_eyre::Result<()>> {
		self.replaces.fetch_add(1, Ordering::SeqCst);

		*self.records.lock().unwrap_or_else(|err| err.into_inner()) = records.to_vec();

		Box::pin(async move { Ok(()) })
	}
}

/// Upserts by id into a map; ids listed in `reject` are refused.
#[derive(Default)]
pub struct MemoryIndex {
	pub docs: Mutex<HashMap<String, serde_json::Map<String, Value>>>,
	pub reject: HashSet<String>,
	pub requests: AtomicUsize,
}
impl MemoryIndex {
	pub fn rejecting(ids: &[&str]) -> Self {
		Self { reject: ids.iter().map(|id| id.to_string()).collect(), ..Default::default() }
	}

	pub fn len(&self) -> usize {
		self.docs.lock().unwrap_or_else(|err| err.into_inner()).len()
	}

	pub fn get(&self, id: &str) -> Option<serde_json::Map<String, Value>> {
		self.docs.lock().unwrap_or_else(|err| err.into_inner()).get(id).cloned()
	}
}
impl SearchIndex for MemoryIndex {
	fn bulk_upsert<'a>(
		&'a self,
		docs: &'a [IndexDocument],
	) -> BoxFuture<'a, color_eyre::Result<BulkReport>> {
		self.requests.fetch_add(1, Ordering::SeqCst);

		let mut report = BulkReport::default();
		let mut stored = self.docs.lock().unwrap_or_else(|err| err.into_inner());

		for doc in docs {
			if self.reject.contains(&doc.id) {
				report.failed += 1;
				report.failures.push((doc.id.clone(), "mapper_parsing_exception".to_string()));
			} else {
				stored.insert(doc.id.clone(), doc.source.clone());

				report.written += 1;
			}
		}

		drop(stored);

		Box::pin(async move { Ok(report) })
	}
}

pub struct FailingIndex;
impl SearchIndex for FailingIndex {
	fn bulk_upsert<'a>(
		&'a self,
		_docs: &'a [IndexDocument],
	) -> BoxFuture<'a, color_eyre::Result<BulkReport>> {
		Box::pin(async move { Err(eyre::eyre!("connection refused")) })
	}
}

pub struct Harness {
	pub classifier: Arc<dyn TextClassifier>,
	pub recognizer: Arc<dyn EntityRecognizer>,
	pub geocoder: Arc<dyn Geocoder>,
	pub sentiment: Arc<dyn SentimentScorer>,
	pub store: Arc<MemoryStore>,
	pub index: Arc<MemoryIndex>,
	pub sources: Vec<Arc<dyn FeedSource>>,
}
impl Default for Harness {
	fn default() -> Self {
		Self {
			classifier: Arc::new(SpyClassifier::new(&[("flood", 0.4), ("cyclone", 0.3)])),
			recognizer: Arc::new(StubRecognizer::new(vec![Entity::new("Kerala", "LOC")])),
			geocoder: Arc::new(FlakyGeocoder::new(0, Some(GeoPoint::new(10.8505, 76.2711)))),
			sentiment: Arc::new(StubSentiment::new(Polarity::Negative, 0.9)),
			store: Arc::new(MemoryStore::default()),
			index: Arc::new(MemoryIndex::default()),
			sources: Vec::new(),
		}
	}
}
impl Harness {
	pub fn capabilities(&self) -> Capabilities {
		Capabilities {
			sources: self.sources.clone(),
			classifier: self.classifier.clone(),
			recognizer: self.recognizer.clone(),
			geocoder: self.geocoder.clone(),
			sentiment: self.sentiment.clone(),
			store: self.store.clone(),
			index: self.index.clone(),
		}
	}

	pub fn enricher(&self, settings: EnrichSettings) -> Enricher {
		Enricher::new(settings, &self.capabilities()).expect("Failed to build enricher.")
	}
}
