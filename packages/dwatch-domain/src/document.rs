//! Flat search-index representation of an [`EnrichedRecord`].
//!
//! Field names follow the index mapping consumed by dashboards (`content`, `publishedAt`,
//! `disaster_type`), not the Rust field names.

use serde_json::{Map, Number, Value};

use crate::{EnrichedRecord, time_serde};

#[derive(Debug, Clone, PartialEq)]
pub struct IndexDocument {
	/// Document id; the record URL.
	pub id: String,
	pub source: Map<String, Value>,
}

pub fn index_document(record: &EnrichedRecord) -> IndexDocument {
	let mut source = Map::new();

	source.insert("title".to_string(), Value::String(record.title.clone()));
	source.insert("description".to_string(), Value::String(record.description.clone()));
	source.insert("content".to_string(), Value::String(record.body.clone()));
	source.insert("url".to_string(), Value::String(record.url.clone()));
	source.insert("source".to_string(), Value::String(record.source.clone()));
	source.insert(
		"publishedAt".to_string(),
		time_serde::format_rfc3339(record.published_at).map(Value::String).unwrap_or(Value::Null),
	);
	source.insert(
		"disaster_type".to_string(),
		Value::Array(
			record
				.disaster_types
				.iter()
				.map(|category| Value::String(category.as_str().to_string()))
				.collect(),
		),
	);
	source.insert("location".to_string(), Value::String(record.location.clone()));
	source.insert("severity".to_string(), Value::String(record.severity.as_str().to_string()));

	let mut geo = Map::new();

	geo.insert("lat".to_string(), number_or_null(record.geo.lat));
	geo.insert("lon".to_string(), number_or_null(record.geo.lon));
	source.insert("geo".to_string(), Value::Object(geo));

	IndexDocument { id: record.url.clone(), source }
}

fn number_or_null(value: f64) -> Value {
	Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
}
