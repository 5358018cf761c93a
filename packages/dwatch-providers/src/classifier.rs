use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result};

/// Zero-shot, multi-label text classification over a fixed label set.
pub struct ClassifierClient {
	cfg: dwatch_config::ProviderConfig,
	client: Client,
}
impl ClassifierClient {
	pub fn new(cfg: dwatch_config::ProviderConfig) -> Result<Self> {
		let client = crate::http_client(cfg.timeout_ms)?;

		Ok(Self { cfg, client })
	}

	/// Returns one ranked `(label, confidence)` list per input text, highest confidence first.
	pub async fn classify(
		&self,
		texts: &[String],
		labels: &[String],
	) -> Result<Vec<Vec<(String, f32)>>> {
		if texts.is_empty() {
			return Ok(Vec::new());
		}

		let url = format!("{}{}", self.cfg.api_base, self.cfg.path);
		let body = serde_json::json!({
			"inputs": texts,
			"parameters": {
				"candidate_labels": labels,
				"multi_label": true,
			},
		});
		let res = self
			.client
			.post(url)
			.headers(crate::auth_headers(&self.cfg.api_key, &self.cfg.default_headers)?)
			.json(&body)
			.send()
			.await?;
		let json: Value = res.error_for_status()?.json().await?;

		parse_classification(json, texts.len())
	}
}

fn parse_classification(json: Value, expected: usize) -> Result<Vec<Vec<(String, f32)>>> {
	let outputs = match json {
		Value::Array(items) => items,
		object @ Value::Object(_) => vec![object],
		_ =>
			return Err(Error::InvalidResponse {
				message: "Classifier response must be an object or an array.".to_string(),
			}),
	};

	if outputs.len() != expected {
		return Err(Error::InvalidResponse {
			message: format!(
				"Classifier returned {} results for {expected} inputs.",
				outputs.len()
			),
		});
	}

	outputs.iter().map(parse_ranked).collect()
}

fn parse_ranked(output: &Value) -> Result<Vec<(String, f32)>> {
	let labels = output.get("labels").and_then(Value::as_array).ok_or_else(|| {
		Error::InvalidResponse { message: "Classifier result is missing labels.".to_string() }
	})?;
	let scores = output.get("scores").and_then(Value::as_array).ok_or_else(|| {
		Error::InvalidResponse { message: "Classifier result is missing scores.".to_string() }
	})?;

	if labels.len() != scores.len() {
		return Err(Error::InvalidResponse {
			message: "Classifier labels and scores differ in length.".to_string(),
		});
	}

	let mut ranked = Vec::with_capacity(labels.len());

	for (label, score) in labels.iter().zip(scores) {
		let label = label.as_str().ok_or_else(|| Error::InvalidResponse {
			message: "Classifier label must be a string.".to_string(),
		})?;
		let score = score.as_f64().ok_or_else(|| Error::InvalidResponse {
			message: "Classifier score must be numeric.".to_string(),
		})?;

		ranked.push((label.to_string(), score as f32));
	}

	ranked.sort_by(|(_, a), (_, b)| b.total_cmp(a));

	Ok(ranked)
}
