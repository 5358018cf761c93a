use reqwest::{Client, header::USER_AGENT};
use serde_json::Value;

use dwatch_domain::GeoPoint;

use crate::{Error, Result};

/// Nominatim-style forward geocoding. One request per call; retries belong to the caller.
pub struct GeocoderClient {
	cfg: dwatch_config::GeocoderConfig,
	client: Client,
}
impl GeocoderClient {
	pub fn new(cfg: dwatch_config::GeocoderConfig) -> Result<Self> {
		let client = crate::http_client(cfg.timeout_ms)?;

		Ok(Self { cfg, client })
	}

	/// `Ok(None)` when the service knows no match for `place`.
	pub async fn lookup(&self, place: &str) -> Result<Option<GeoPoint>> {
		let url = format!("{}{}", self.cfg.api_base, self.cfg.path);
		let res = self
			.client
			.get(url)
			.header(USER_AGENT, &self.cfg.user_agent)
			.query(&[("q", place), ("format", "json"), ("limit", "1")])
			.send()
			.await?;
		let json: Value = res.error_for_status()?.json().await?;

		parse_first_hit(&json)
	}
}

fn parse_first_hit(json: &Value) -> Result<Option<GeoPoint>> {
	let hits = json.as_array().ok_or_else(|| Error::InvalidResponse {
		message: "Geocoder response must be an array.".to_string(),
	})?;
	let Some(first) = hits.first() else {
		return Ok(None);
	};
	let lat = coordinate(first, "lat")?;
	let lon = coordinate(first, "lon")?;
	let point = GeoPoint::new(lat, lon);

	if !point.is_valid() {
		return Err(Error::InvalidResponse {
			message: format!("Geocoder returned out-of-range coordinates ({lat}, {lon})."),
		});
	}

	Ok(Some(point))
}

// Nominatim encodes coordinates as strings.
fn coordinate(hit: &Value, key: &str) -> Result<f64> {
	let parsed = match hit.get(key) {
		Some(Value::String(raw)) => raw.trim().parse::<f64>().ok(),
		Some(Value::Number(number)) => number.as_f64(),
		_ => None,
	};

	parsed.ok_or_else(|| Error::InvalidResponse {
		message: format!("Geocoder hit has no usable {key}."),
	})
}
