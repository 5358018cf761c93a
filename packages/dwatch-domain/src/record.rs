use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{DisasterType, Severity};

/// One unprocessed report as delivered by a feed source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawItem {
	pub title: String,
	pub description: String,
	pub body: String,
	/// Canonical link of the report; the deduplication key when present.
	pub url: Option<String>,
	pub source: String,
	#[serde(with = "crate::time_serde")]
	pub published_at: OffsetDateTime,
}
impl RawItem {
	/// Title, description and body joined with single spaces, trimmed.
	pub fn combined_text(&self) -> String {
		combine(&self.title, &self.description, &self.body)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
	pub lat: f64,
	pub lon: f64,
}
impl GeoPoint {
	pub fn new(lat: f64, lon: f64) -> Self {
		Self { lat, lon }
	}

	pub fn is_valid(&self) -> bool {
		self.lat.is_finite()
			&& self.lon.is_finite()
			&& (-90.0..=90.0).contains(&self.lat)
			&& (-180.0..=180.0).contains(&self.lon)
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
	pub title: String,
	pub description: String,
	pub body: String,
	pub url: String,
	pub source: String,
	#[serde(with = "crate::time_serde")]
	pub published_at: OffsetDateTime,
	/// One or two categories; `[Unknown]` when nothing resolved. Never empty.
	pub disaster_types: Vec<DisasterType>,
	pub location: String,
	pub geo: GeoPoint,
	pub severity: Severity,
}
impl EnrichedRecord {
	pub fn combined_text(&self) -> String {
		combine(&self.title, &self.description, &self.body)
	}
}

fn combine(title: &str, description: &str, body: &str) -> String {
	[title, description, body].join(" ").trim().to_string()
}
