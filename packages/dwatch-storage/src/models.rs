use time::OffsetDateTime;
use uuid::Uuid;

use dwatch_domain::{DisasterType, EnrichedRecord, GeoPoint, Severity};

use crate::{Error, Result};

#[derive(Debug, sqlx::FromRow)]
pub struct DisasterRecordRow {
	pub record_id: Uuid,
	pub position: i32,
	pub url: String,
	pub title: String,
	pub description: String,
	pub body: String,
	pub source: String,
	pub published_at: OffsetDateTime,
	pub disaster_types: Vec<String>,
	pub location: String,
	pub lat: f64,
	pub lon: f64,
	pub severity: String,
}
impl DisasterRecordRow {
	pub fn from_record(position: i32, record: &EnrichedRecord) -> Self {
		Self {
			record_id: record_id(&record.url),
			position,
			url: record.url.clone(),
			title: record.title.clone(),
			description: record.description.clone(),
			body: record.body.clone(),
			source: record.source.clone(),
			published_at: record.published_at,
			disaster_types: record
				.disaster_types
				.iter()
				.map(|category| category.as_str().to_string())
				.collect(),
			location: record.location.clone(),
			lat: record.geo.lat,
			lon: record.geo.lon,
			severity: record.severity.as_str().to_string(),
		}
	}

	pub fn into_record(self) -> Result<EnrichedRecord> {
		let disaster_types = self
			.disaster_types
			.iter()
			.map(|raw| raw.parse::<DisasterType>())
			.collect::<Result<Vec<_>, _>>()
			.map_err(|err| Error::Corrupt(format!("Record {}: {err}", self.url)))?;

		if disaster_types.is_empty() {
			return Err(Error::Corrupt(format!("Record {} has no disaster types.", self.url)));
		}

		let severity = self
			.severity
			.parse::<Severity>()
			.map_err(|err| Error::Corrupt(format!("Record {}: {err}", self.url)))?;

		Ok(EnrichedRecord {
			title: self.title,
			description: self.description,
			body: self.body,
			url: self.url,
			source: self.source,
			published_at: self.published_at,
			disaster_types,
			location: self.location,
			geo: GeoPoint::new(self.lat, self.lon),
			severity,
		})
	}
}

/// Stable row id derived from the record URL.
pub fn record_id(url: &str) -> Uuid {
	Uuid::new_v5(&Uuid::NAMESPACE_URL, url.as_bytes())
}

#[cfg(test)]
mod tests {
	use time::macros::datetime;

	use super::*;

	fn record() -> EnrichedRecord {
		EnrichedRecord {
			title: "Landslide blocks highway".to_string(),
			description: String::new(),
			body: String::new(),
			url: "https://example.org/slide".to_string(),
			source: "wire".to_string(),
			published_at: datetime!(2025-07-10 04:00 UTC),
			disaster_types: vec![DisasterType::Landslide, DisasterType::Flood],
			location: "Uttarakhand".to_string(),
			geo: GeoPoint::new(30.0668, 79.0193),
			severity: Severity::Medium,
		}
	}

	#[test]
	fn row_conversion_preserves_record() {
		let row = DisasterRecordRow::from_record(3, &record());

		assert_eq!(row.disaster_types, vec!["landslide", "flood"]);
		assert_eq!(row.record_id, record_id("https://example.org/slide"));
		assert_eq!(row.into_record().expect("conversion failed"), record());
	}

	#[test]
	fn rejects_unknown_labels() {
		let mut row = DisasterRecordRow::from_record(0, &record());

		row.disaster_types = vec!["meteor".to_string()];

		assert!(matches!(row.into_record(), Err(Error::Corrupt(_))));
	}
}
