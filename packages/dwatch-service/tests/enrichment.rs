mod support;

use std::{sync::Arc, time::Duration};

use time::macros::datetime;
use tokio::time::Instant;

use dwatch_domain::{DisasterType, Entity, GeoPoint, Polarity, Severity};
use dwatch_service::EnrichSettings;

use support::{
	DEFAULT_GEO, DEFAULT_LOCATION, FailingClassifier, FailingRecognizer, FlakyGeocoder, Harness,
	KeywordClassifier, SpyClassifier, StubRecognizer, StubSentiment, raw, settings,
};

#[tokio::test]
async fn synonym_match_skips_the_classifier() {
	let classifier = Arc::new(SpyClassifier::new(&[("flood", 0.9)]));
	let harness = Harness { classifier: classifier.clone(), ..Default::default() };
	let enricher = harness.enricher(settings());
	let record = enricher
		.enrich(&raw("7.2 magnitude earthquake hits region", "u1", datetime!(2025-01-01 0:00 UTC)))
		.await;

	assert_eq!(record.disaster_types, vec![DisasterType::Earthquake]);
	assert_eq!(record.url, "u1");
	assert_eq!(classifier.calls(), 0);
}

#[tokio::test]
async fn ambiguous_text_uses_the_threshold_cascade() {
	let classifier =
		Arc::new(SpyClassifier::new(&[("flood", 0.4), ("cyclone", 0.3), ("wildfire", 0.1)]));
	let harness = Harness { classifier: classifier.clone(), ..Default::default() };
	let record = harness
		.enricher(settings())
		.enrich(&raw(
			"Residents evacuated as officials assess damage",
			"u-b",
			datetime!(2025-01-01 0:00 UTC),
		))
		.await;

	assert_eq!(record.disaster_types, vec![DisasterType::Flood, DisasterType::Cyclone]);
	assert_eq!(classifier.calls(), 1);
}

#[tokio::test]
async fn low_confidence_everywhere_is_unknown() {
	let classifier = Arc::new(SpyClassifier::new(&[("flood", 0.12), ("drought", 0.05)]));
	let harness = Harness { classifier, ..Default::default() };
	let record = harness
		.enricher(settings())
		.enrich(&raw(
			"Residents evacuated as officials assess damage",
			"u-c",
			datetime!(2025-01-01 0:00 UTC),
		))
		.await;

	assert_eq!(record.disaster_types, vec![DisasterType::Unknown]);
}

#[tokio::test]
async fn classifier_failure_degrades_to_unknown() {
	let harness = Harness { classifier: Arc::new(FailingClassifier), ..Default::default() };
	let items = vec![
		raw("Relief camps opened for displaced families", "a", datetime!(2025-01-01 0:00 UTC)),
		raw("Massive quake felt across the valley", "b", datetime!(2025-01-01 0:00 UTC)),
	];
	let records = harness.enricher(settings()).enrich_batch(&items).await;

	assert_eq!(records[0].disaster_types, vec![DisasterType::Unknown]);
	assert_eq!(records[1].disaster_types, vec![DisasterType::Earthquake]);
	assert!(records.iter().all(|record| !record.disaster_types.is_empty()));
}

#[tokio::test]
async fn batching_does_not_change_per_item_results() {
	let items: Vec<_> = (0..20)
		.map(|idx| {
			let title = if idx % 3 == 0 {
				format!("Villagers watch the river rise {idx}")
			} else {
				format!("Farmers report poor harvest {idx}")
			};

			raw(&title, &format!("https://example.org/{idx}"), datetime!(2025-01-01 0:00 UTC))
		})
		.collect();
	let harness = Harness { classifier: Arc::new(KeywordClassifier), ..Default::default() };
	let mut small = settings();

	small.batch_size = 3;

	let batched = harness.enricher(small).enrich_batch(&items).await;
	let whole = harness.enricher(settings()).enrich_batch(&items).await;
	let one_by_one: Vec<_> = {
		let enricher = harness.enricher(settings());
		let mut records = Vec::new();

		for item in &items {
			records.push(enricher.enrich(item).await);
		}

		records
	};

	assert_eq!(batched, whole);
	assert_eq!(whole, one_by_one);
	assert_eq!(whole[0].disaster_types, vec![DisasterType::Flood]);
	assert_eq!(whole[1].disaster_types, vec![DisasterType::Drought, DisasterType::Flood]);
}

#[tokio::test]
async fn classifier_calls_follow_batch_size() {
	let classifier = Arc::new(SpyClassifier::new(&[("flood", 0.5)]));
	let harness = Harness { classifier: classifier.clone(), ..Default::default() };
	let items: Vec<_> = (0..20)
		.map(|idx| {
			raw(
				"Residents evacuated as officials assess damage",
				&format!("u{idx}"),
				datetime!(2025-01-01 0:00 UTC),
			)
		})
		.collect();

	harness.enricher(settings()).enrich_batch(&items).await;

	assert_eq!(*classifier.batches.lock().expect("poisoned"), vec![16, 4]);
}

#[tokio::test]
async fn zero_batch_size_sends_one_item_per_call() {
	let classifier = Arc::new(SpyClassifier::new(&[("flood", 0.5)]));
	let harness = Harness { classifier: classifier.clone(), ..Default::default() };
	let items: Vec<_> = (0..3)
		.map(|idx| {
			raw(
				"Residents evacuated as officials assess damage",
				&format!("u{idx}"),
				datetime!(2025-01-01 0:00 UTC),
			)
		})
		.collect();
	let enricher = harness.enricher(EnrichSettings { batch_size: 0, ..settings() });
	let records = enricher.enrich_batch(&items).await;

	assert_eq!(records.len(), 3);
	assert_eq!(*classifier.batches.lock().expect("poisoned"), vec![1, 1, 1]);
}

#[tokio::test]
async fn location_is_the_first_place_entity() {
	let recognizer = Arc::new(StubRecognizer::new(vec![
		Entity::new("NDRF", "ORG"),
		Entity::new("Wayanad", "LOC"),
		Entity::new("Kerala", "GPE"),
	]));
	let harness = Harness { recognizer, ..Default::default() };

	assert_eq!(
		harness.enricher(settings()).extract_location("Landslide in Wayanad", "").await,
		"Wayanad"
	);
}

#[tokio::test]
async fn location_defaults_without_text_entities_or_recognizer() {
	let recognizer = Arc::new(StubRecognizer::new(vec![Entity::new("IMD", "ORG")]));
	let harness = Harness { recognizer: recognizer.clone(), ..Default::default() };
	let enricher = harness.enricher(settings());

	assert_eq!(enricher.extract_location("", "  ").await, DEFAULT_LOCATION);
	assert_eq!(recognizer.calls.load(std::sync::atomic::Ordering::SeqCst), 0);
	assert_eq!(enricher.extract_location("IMD issues alert", "").await, DEFAULT_LOCATION);

	let failing = Harness { recognizer: Arc::new(FailingRecognizer), ..Default::default() };

	assert_eq!(
		failing.enricher(settings()).extract_location("Floods in Assam", "").await,
		DEFAULT_LOCATION
	);
}

#[tokio::test]
async fn geocoder_retries_until_success() {
	let point = GeoPoint::new(26.2006, 92.9376);
	let geocoder = Arc::new(FlakyGeocoder::new(2, Some(point)));
	let harness = Harness { geocoder: geocoder.clone(), ..Default::default() };

	assert_eq!(harness.enricher(settings()).geocode("Assam").await, point);
	assert_eq!(geocoder.calls(), 3);
}

#[tokio::test]
async fn geocoder_is_total() {
	let unreachable = Arc::new(FlakyGeocoder::new(usize::MAX, None));
	let harness = Harness { geocoder: unreachable.clone(), ..Default::default() };
	let enricher = harness.enricher(settings());

	assert_eq!(enricher.geocode("").await, DEFAULT_GEO);
	assert_eq!(unreachable.calls(), 0);
	assert_eq!(enricher.geocode("Atlantis").await, DEFAULT_GEO);
	assert_eq!(unreachable.calls(), 3);

	let no_match = Arc::new(FlakyGeocoder::new(0, None));
	let harness = Harness { geocoder: no_match.clone(), ..Default::default() };

	assert_eq!(harness.enricher(settings()).geocode("Nowhere").await, DEFAULT_GEO);
	assert_eq!(no_match.calls(), 3);
}

fn assert_elapsed(start: Instant, expected: Duration) {
	let elapsed = start.elapsed();

	assert!(
		elapsed >= expected && elapsed < expected + Duration::from_millis(10),
		"elapsed {elapsed:?}, expected {expected:?}"
	);
}

#[tokio::test(start_paused = true)]
async fn geocoder_backs_off_between_attempts_only() {
	let backoff = Duration::from_secs(1);
	let point = GeoPoint::new(26.2006, 92.9376);
	let with_backoff = || EnrichSettings { geocode_backoff: backoff, ..settings() };

	let unreachable = Harness {
		geocoder: Arc::new(FlakyGeocoder::new(usize::MAX, None)),
		..Default::default()
	};
	let start = Instant::now();

	assert_eq!(unreachable.enricher(with_backoff()).geocode("Atlantis").await, DEFAULT_GEO);
	assert_elapsed(start, backoff * 2);

	let second_try = Harness {
		geocoder: Arc::new(FlakyGeocoder::new(1, Some(point))),
		..Default::default()
	};
	let start = Instant::now();

	assert_eq!(second_try.enricher(with_backoff()).geocode("Assam").await, point);
	assert_elapsed(start, backoff);

	let first_try = Harness {
		geocoder: Arc::new(FlakyGeocoder::new(0, Some(point))),
		..Default::default()
	};
	let start = Instant::now();

	assert_eq!(first_try.enricher(with_backoff()).geocode("Assam").await, point);
	assert_elapsed(start, Duration::ZERO);

	let start = Instant::now();

	assert_eq!(first_try.enricher(with_backoff()).geocode("  ").await, DEFAULT_GEO);
	assert_elapsed(start, Duration::ZERO);
}

#[tokio::test]
async fn severity_buckets_and_defaults() {
	let cases = [
		(Polarity::Negative, 0.95, Severity::High),
		(Polarity::Negative, 0.6, Severity::Medium),
		(Polarity::Positive, 0.99, Severity::Low),
	];

	for (polarity, confidence, expected) in cases {
		let harness = Harness {
			sentiment: Arc::new(StubSentiment::new(polarity, confidence)),
			..Default::default()
		};

		assert_eq!(harness.enricher(settings()).score_severity("Homes destroyed").await, expected);
	}

	let sentiment = Arc::new(StubSentiment::new(Polarity::Negative, 0.95));
	let harness = Harness { sentiment: sentiment.clone(), ..Default::default() };
	let enricher = harness.enricher(settings());

	assert_eq!(enricher.score_severity("   ").await, Severity::Low);
	assert!(sentiment.inputs().is_empty());

	enricher.score_severity(&"a".repeat(2_000)).await;

	assert_eq!(sentiment.inputs()[0].len(), 512);

	let failing = Harness { sentiment: Arc::new(StubSentiment::failing()), ..Default::default() };

	assert_eq!(failing.enricher(settings()).score_severity("Homes destroyed").await, Severity::Low);
}

#[tokio::test]
async fn enriched_record_carries_every_field() {
	let harness = Harness::default();
	let mut item = raw("Cyclone nears the coast", "https://e/1", datetime!(2025-05-20 6:30 UTC));

	item.description = "Kerala braces for landfall".to_string();
	item.body = "Fishermen told to return.".to_string();

	let record = harness.enricher(settings()).enrich(&item).await;

	assert_eq!(record.title, item.title);
	assert_eq!(record.body, item.body);
	assert_eq!(record.published_at, item.published_at);
	assert_eq!(record.disaster_types, vec![DisasterType::Cyclone]);
	assert_eq!(record.location, "Kerala");
	assert_eq!(record.geo, GeoPoint::new(10.8505, 76.2711));
	assert_eq!(record.severity, Severity::High);
}
