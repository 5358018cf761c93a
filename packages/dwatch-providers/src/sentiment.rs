use reqwest::Client;
use serde_json::Value;

use dwatch_domain::{Polarity, Sentiment};

use crate::{Error, Result};

/// Binary sentiment classification.
pub struct SentimentClient {
	cfg: dwatch_config::ProviderConfig,
	client: Client,
}
impl SentimentClient {
	pub fn new(cfg: dwatch_config::ProviderConfig) -> Result<Self> {
		let client = crate::http_client(cfg.timeout_ms)?;

		Ok(Self { cfg, client })
	}

	pub async fn score(&self, text: &str) -> Result<Sentiment> {
		let url = format!("{}{}", self.cfg.api_base, self.cfg.path);
		let res = self
			.client
			.post(url)
			.headers(crate::auth_headers(&self.cfg.api_key, &self.cfg.default_headers)?)
			.json(&serde_json::json!({ "inputs": text }))
			.send()
			.await?;
		let json: Value = res.error_for_status()?.json().await?;

		parse_sentiment(json)
	}
}

/// Accepts `[{label, score}]`, `[[{label, score}, ...]]`, or a bare object; the best label wins.
fn parse_sentiment(json: Value) -> Result<Sentiment> {
	let candidates: Vec<&Value> = match &json {
		Value::Array(outer) => match outer.first() {
			Some(Value::Array(inner)) => inner.iter().collect(),
			_ => outer.iter().collect(),
		},
		object @ Value::Object(_) => vec![object],
		_ => Vec::new(),
	};
	let mut best: Option<(&str, f64)> = None;

	for candidate in candidates {
		let (Some(label), Some(score)) = (
			candidate.get("label").and_then(Value::as_str),
			candidate.get("score").and_then(Value::as_f64),
		) else {
			continue;
		};

		if best.map(|(_, top)| score > top).unwrap_or(true) {
			best = Some((label, score));
		}
	}

	let Some((label, score)) = best else {
		return Err(Error::InvalidResponse {
			message: "Sentiment response has no scored label.".to_string(),
		});
	};
	let polarity = if is_negative_label(label) { Polarity::Negative } else { Polarity::Positive };

	Ok(Sentiment { polarity, confidence: score as f32 })
}

fn is_negative_label(label: &str) -> bool {
	label.eq_ignore_ascii_case("negative") || label.eq_ignore_ascii_case("label_0")
}
