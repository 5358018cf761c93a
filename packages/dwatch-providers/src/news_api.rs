use reqwest::{Client, header::USER_AGENT};
use serde_json::Value;
use time::{
	OffsetDateTime, PrimitiveDateTime, format_description::well_known::Rfc3339,
	macros::format_description,
};

use dwatch_domain::RawItem;

use crate::{Error, Result};

/// Article search against a NewsAPI-compatible endpoint.
pub struct NewsApiClient {
	cfg: dwatch_config::NewsApiSource,
	client: Client,
}
impl NewsApiClient {
	pub fn new(cfg: dwatch_config::NewsApiSource) -> Result<Self> {
		let client = crate::http_client(cfg.timeout_ms)?;

		Ok(Self { cfg, client })
	}

	/// Query string for one category: `"<category> AND <region>"`, or the bare category.
	pub fn query_for(&self, category: &str) -> String {
		let region = self.cfg.region.trim();

		if region.is_empty() { category.to_string() } else { format!("{category} AND {region}") }
	}

	pub async fn search(&self, category: &str, page_size: u32) -> Result<Vec<RawItem>> {
		let url = format!("{}/v2/everything", self.cfg.api_base);
		let query = self.query_for(category);
		let page_size = page_size.to_string();
		let res = self
			.client
			.get(url)
			.header(USER_AGENT, concat!("dwatch/", env!("CARGO_PKG_VERSION")))
			.query(&[
				("q", query.as_str()),
				("language", self.cfg.language.as_str()),
				("pageSize", page_size.as_str()),
				("sortBy", "publishedAt"),
				("apiKey", self.cfg.api_key.as_str()),
			])
			.send()
			.await?;
		let json: Value = res.error_for_status()?.json().await?;

		parse_articles(&json, OffsetDateTime::now_utc())
	}
}

/// `fetched_at` stands in for articles whose timestamp is missing or unreadable.
fn parse_articles(json: &Value, fetched_at: OffsetDateTime) -> Result<Vec<RawItem>> {
	if json.get("status").and_then(Value::as_str) == Some("error") {
		let message = json.get("message").and_then(Value::as_str).unwrap_or("unknown error");

		return Err(Error::InvalidResponse { message: format!("News API error: {message}") });
	}

	let articles = json.get("articles").and_then(Value::as_array).ok_or_else(|| {
		Error::InvalidResponse { message: "News API response has no articles.".to_string() }
	})?;

	Ok(articles.iter().map(|article| to_raw_item(article, fetched_at)).collect())
}

fn to_raw_item(article: &Value, fetched_at: OffsetDateTime) -> RawItem {
	let url = crate::str_field(article, "url");
	let source = article
		.get("source")
		.and_then(|source| source.get("name"))
		.and_then(Value::as_str)
		.unwrap_or_default()
		.to_string();
	let published_at = article
		.get("publishedAt")
		.and_then(Value::as_str)
		.and_then(parse_published_at)
		.unwrap_or(fetched_at);

	RawItem {
		title: crate::str_field(article, "title"),
		description: crate::str_field(article, "description"),
		body: crate::str_field(article, "content"),
		url: (!url.trim().is_empty()).then(|| url.trim().to_string()),
		source,
		published_at,
	}
}

fn parse_published_at(raw: &str) -> Option<OffsetDateTime> {
	let zulu = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z");

	PrimitiveDateTime::parse(raw, zulu)
		.map(PrimitiveDateTime::assume_utc)
		.or_else(|_| OffsetDateTime::parse(raw, &Rfc3339))
		.ok()
}
