use reqwest::Client;
use serde_json::Value;

use dwatch_domain::Entity;

use crate::{Error, Result};

/// Token classification with grouped entities.
pub struct NerClient {
	cfg: dwatch_config::ProviderConfig,
	client: Client,
}
impl NerClient {
	pub fn new(cfg: dwatch_config::ProviderConfig) -> Result<Self> {
		let client = crate::http_client(cfg.timeout_ms)?;

		Ok(Self { cfg, client })
	}

	/// Entities in the order the model emits them.
	pub async fn recognize(&self, text: &str) -> Result<Vec<Entity>> {
		let url = format!("{}{}", self.cfg.api_base, self.cfg.path);
		let body = serde_json::json!({
			"inputs": text,
			"parameters": { "aggregation_strategy": "simple" },
		});
		let res = self
			.client
			.post(url)
			.headers(crate::auth_headers(&self.cfg.api_key, &self.cfg.default_headers)?)
			.json(&body)
			.send()
			.await?;
		let json: Value = res.error_for_status()?.json().await?;

		parse_entities(json)
	}
}

fn parse_entities(json: Value) -> Result<Vec<Entity>> {
	let items = json.as_array().ok_or_else(|| Error::InvalidResponse {
		message: "Entity response must be an array.".to_string(),
	})?;
	let mut entities = Vec::with_capacity(items.len());

	for item in items {
		let entity_type = item
			.get("entity_group")
			.or_else(|| item.get("entity"))
			.and_then(Value::as_str)
			.unwrap_or_default();
		let text = crate::str_field(item, "word");

		if entity_type.is_empty() || text.trim().is_empty() {
			continue;
		}

		entities.push(Entity::new(text.trim(), entity_type));
	}

	Ok(entities)
}
