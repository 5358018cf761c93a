//! Elasticsearch bulk writer for enriched records.

use std::{future::Future, time::Duration};

use reqwest::{
	Client, StatusCode,
	header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue},
};
use serde_json::{Value, json};

use dwatch_domain::IndexDocument;

use crate::{Error, Result};

const BULK_CHUNK: usize = 500;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkReport {
	pub written: usize,
	pub failed: usize,
	/// `(document id, reason)` for each rejected item.
	pub failures: Vec<(String, String)>,
}
impl BulkReport {
	fn absorb(&mut self, other: BulkReport) {
		self.written += other.written;
		self.failed += other.failed;
		self.failures.extend(other.failures);
	}
}

pub struct ElasticIndex {
	url: String,
	name: String,
	client: Client,
}
impl ElasticIndex {
	pub fn new(cfg: &dwatch_config::Index) -> Result<Self> {
		let mut headers = HeaderMap::new();

		for (key, value) in &cfg.default_headers {
			let Some(raw) = value.as_str() else {
				return Err(Error::InvalidArgument(format!(
					"Index header {key} must be a string."
				)));
			};

			headers.insert(HeaderName::from_bytes(key.as_bytes())?, HeaderValue::from_str(raw)?);
		}

		let client = Client::builder()
			.timeout(Duration::from_millis(cfg.timeout_ms))
			.default_headers(headers)
			.build()?;

		Ok(Self { url: cfg.url.clone(), name: cfg.name.clone(), client })
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Creates the index with its field mapping when it does not exist yet.
	pub async fn ensure_index(&self) -> Result<()> {
		let index_url = format!("{}/{}", self.url, self.name);
		let res = self.client.head(&index_url).send().await?;

		if res.status().is_success() {
			return Ok(());
		}
		if res.status() != StatusCode::NOT_FOUND {
			return Err(Error::Index(format!(
				"Unexpected status {} while checking index {}.",
				res.status(),
				self.name
			)));
		}

		let res = self.client.put(&index_url).json(&index_mapping()).send().await?;

		// Another writer may have created it between the check and the create.
		if res.status() == StatusCode::BAD_REQUEST {
			let body: Value = res.json().await?;

			if error_type(&body) == Some("resource_already_exists_exception") {
				return Ok(());
			}

			return Err(Error::Index(format!("Index creation rejected: {body}")));
		}

		res.error_for_status()?;

		tracing::info!(index = %self.name, "Created search index.");

		Ok(())
	}

	/// Upserts every document keyed by its id. Item-level rejections are counted, not raised, and
	/// a chunk whose request fails counts all of its documents as failed before moving on.
	pub async fn bulk_upsert(&self, docs: &[IndexDocument]) -> Result<BulkReport> {
		Ok(upsert_chunks(docs, BULK_CHUNK, |chunk| self.send_chunk(chunk)).await)
	}

	async fn send_chunk(&self, chunk: &[IndexDocument]) -> Result<BulkReport> {
		let body = bulk_body(&self.name, chunk)?;
		let res = self
			.client
			.post(format!("{}/_bulk", self.url))
			.header(CONTENT_TYPE, "application/x-ndjson")
			.body(body)
			.send()
			.await?;
		let json: Value = res.error_for_status()?.json().await?;

		parse_bulk_response(&json, chunk.len())
	}

	pub async fn delete_index(&self) -> Result<()> {
		let res = self.client.delete(format!("{}/{}", self.url, self.name)).send().await?;

		if res.status() == StatusCode::NOT_FOUND {
			return Ok(());
		}

		res.error_for_status()?;

		Ok(())
	}

	pub async fn count(&self) -> Result<u64> {
		let base = format!("{}/{}", self.url, self.name);

		self.client.post(format!("{base}/_refresh")).send().await?.error_for_status()?;

		let json: Value =
			self.client.get(format!("{base}/_count")).send().await?.error_for_status()?.json().await?;

		json.get("count")
			.and_then(Value::as_u64)
			.ok_or_else(|| Error::Index("Count response has no count.".to_string()))
	}
}

pub fn index_mapping() -> Value {
	json!({
		"mappings": {
			"properties": {
				"title": { "type": "text" },
				"description": { "type": "text" },
				"content": { "type": "text" },
				"url": { "type": "keyword" },
				"source": { "type": "keyword" },
				"publishedAt": { "type": "date" },
				"disaster_type": { "type": "keyword" },
				"location": { "type": "keyword" },
				"severity": { "type": "keyword" },
				"geo": { "type": "geo_point" }
			}
		}
	})
}

fn bulk_body(index: &str, docs: &[IndexDocument]) -> Result<String> {
	let mut body = String::new();

	for doc in docs {
		let action = json!({ "index": { "_index": index, "_id": doc.id } });
		let source = serde_json::to_string(&doc.source)
			.map_err(|err| Error::InvalidArgument(format!("Unserializable document: {err}")))?;

		body.push_str(&action.to_string());
		body.push('\n');
		body.push_str(&source);
		body.push('\n');
	}

	Ok(body)
}

async fn upsert_chunks<'a, F, Fut>(
	docs: &'a [IndexDocument],
	chunk_size: usize,
	mut send: F,
) -> BulkReport
where
	F: FnMut(&'a [IndexDocument]) -> Fut,
	Fut: Future<Output = Result<BulkReport>>,
{
	let mut report = BulkReport::default();

	for (idx, chunk) in docs.chunks(chunk_size.max(1)).enumerate() {
		match send(chunk).await {
			Ok(outcome) => report.absorb(outcome),
			Err(err) => {
				let reason = err.to_string();

				tracing::warn!(
					chunk = idx,
					documents = chunk.len(),
					error = %reason,
					"Bulk chunk failed. Counting its documents as failed."
				);

				report.failed += chunk.len();
				report.failures.extend(chunk.iter().map(|doc| (doc.id.clone(), reason.clone())));
			},
		}
	}

	report
}

fn parse_bulk_response(json: &Value, expected: usize) -> Result<BulkReport> {
	let items = json
		.get("items")
		.and_then(Value::as_array)
		.ok_or_else(|| Error::Index("Bulk response has no items.".to_string()))?;

	if items.len() != expected {
		return Err(Error::Index(format!(
			"Bulk response has {} items for {expected} documents.",
			items.len()
		)));
	}

	let mut report = BulkReport::default();

	for item in items {
		let result = item.get("index").or_else(|| item.get("create")).unwrap_or(item);
		let status = result.get("status").and_then(Value::as_u64).unwrap_or(0);
		let error = result.get("error");

		if error.is_none() && (200..300).contains(&status) {
			report.written += 1;

			continue;
		}

		let id = result.get("_id").and_then(Value::as_str).unwrap_or_default().to_string();
		let reason = error
			.and_then(|error| error.get("reason").and_then(Value::as_str))
			.map(str::to_string)
			.unwrap_or_else(|| format!("status {status}"));

		report.failed += 1;
		report.failures.push((id, reason));
	}

	Ok(report)
}

fn error_type(body: &Value) -> Option<&str> {
	body.get("error").and_then(|error| error.get("type")).and_then(Value::as_str)
}
