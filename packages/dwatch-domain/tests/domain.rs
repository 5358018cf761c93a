use time::macros::datetime;

use dwatch_domain::{
	DisasterType, EnrichedRecord, GeoPoint, SelectionPolicy, Severity, SynonymMatcher,
	merge_records,
};

fn matcher() -> SynonymMatcher {
	SynonymMatcher::builtin().expect("Failed to compile builtin synonyms.")
}

#[test]
fn every_builtin_synonym_resolves_to_its_category() {
	let matcher = matcher();

	for (phrase, category) in dwatch_domain::synonyms::BUILTIN_SYNONYMS {
		let text = format!("Officials report {phrase} near the district");
		let found = matcher.resolve(&text);

		assert!(found.contains(category), "{phrase:?} resolved to {found:?}");
	}
}

#[test]
fn every_canonical_name_resolves_to_itself() {
	let matcher = matcher();

	for category in DisasterType::CANONICAL {
		let text = format!("A {} was reported overnight", category.as_str().to_uppercase());

		assert_eq!(matcher.resolve(&text), vec![category]);
	}
}

#[test]
fn ambiguous_text_needs_the_classifier() {
	assert!(matcher().resolve("Residents evacuated as officials assess damage").is_empty());
}

#[test]
fn ranked_classifier_output_selects_flood_and_cyclone() {
	let ranked = vec![
		("flood".to_string(), 0.4),
		("cyclone".to_string(), 0.3),
		("wildfire".to_string(), 0.1),
	];

	assert_eq!(
		SelectionPolicy::default().select(&ranked),
		vec![DisasterType::Flood, DisasterType::Cyclone]
	);
}

#[test]
fn low_confidence_classifier_output_is_unknown() {
	let ranked = vec![("flood".to_string(), 0.12), ("drought".to_string(), 0.05)];

	assert_eq!(SelectionPolicy::default().select(&ranked), vec![DisasterType::Unknown]);
}

#[test]
fn shared_url_keeps_the_later_report() {
	let base = EnrichedRecord {
		title: "Flood waters rise".to_string(),
		description: String::new(),
		body: String::new(),
		url: "u2".to_string(),
		source: "wire".to_string(),
		published_at: datetime!(2025-07-01 10:00 UTC),
		disaster_types: vec![DisasterType::Flood],
		location: "Bihar".to_string(),
		geo: GeoPoint::new(25.1, 85.3),
		severity: Severity::Medium,
	};
	let later = EnrichedRecord {
		title: "Flood waters recede".to_string(),
		published_at: datetime!(2025-07-03 10:00 UTC),
		severity: Severity::Low,
		..base.clone()
	};
	let outcome = merge_records(Vec::new(), vec![base, later.clone()]);
	let survivors: Vec<&EnrichedRecord> =
		outcome.records.iter().filter(|record| record.url == "u2").collect();

	assert_eq!(survivors, vec![&later]);
}
