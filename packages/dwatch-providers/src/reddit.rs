use reqwest::{Client, header::USER_AGENT};
use serde_json::Value;
use time::OffsetDateTime;
use tokio::sync::Mutex;

use dwatch_domain::RawItem;

use crate::{Error, Result};

/// Self-text longer than this is cut when used as the description.
const DESCRIPTION_MAX_CHARS: usize = 200;
const PERMALINK_BASE: &str = "https://www.reddit.com";

/// Subreddit search using an application-only OAuth token.
pub struct RedditClient {
	cfg: dwatch_config::RedditSource,
	client: Client,
	token: Mutex<Option<String>>,
}
impl RedditClient {
	pub fn new(cfg: dwatch_config::RedditSource) -> Result<Self> {
		let client = crate::http_client(cfg.timeout_ms)?;

		Ok(Self { cfg, client, token: Mutex::new(None) })
	}

	pub async fn search(&self, category: &str, limit: u32) -> Result<Vec<RawItem>> {
		let token = self.access_token().await?;
		let url = format!("{}/r/{}/search", self.cfg.api_base, self.cfg.subreddit);
		let limit = limit.to_string();
		let res = self
			.client
			.get(url)
			.bearer_auth(token)
			.header(USER_AGENT, &self.cfg.user_agent)
			.query(&[
				("q", category),
				("sort", "new"),
				("restrict_sr", "1"),
				("limit", limit.as_str()),
			])
			.send()
			.await?;

		if res.status() == reqwest::StatusCode::UNAUTHORIZED {
			*self.token.lock().await = None;
		}

		let json: Value = res.error_for_status()?.json().await?;

		parse_listing(&json)
	}

	async fn access_token(&self) -> Result<String> {
		let mut cached = self.token.lock().await;

		if let Some(token) = cached.as_ref() {
			return Ok(token.clone());
		}

		let res = self
			.client
			.post(&self.cfg.auth_url)
			.basic_auth(&self.cfg.client_id, Some(&self.cfg.client_secret))
			.header(USER_AGENT, &self.cfg.user_agent)
			.form(&[("grant_type", "client_credentials")])
			.send()
			.await?;
		let json: Value = res.error_for_status()?.json().await?;
		let token = json
			.get("access_token")
			.and_then(Value::as_str)
			.filter(|token| !token.is_empty())
			.ok_or_else(|| Error::InvalidResponse {
				message: "Reddit token response has no access_token.".to_string(),
			})?
			.to_string();

		*cached = Some(token.clone());

		Ok(token)
	}
}

fn parse_listing(json: &Value) -> Result<Vec<RawItem>> {
	let children = json
		.get("data")
		.and_then(|data| data.get("children"))
		.and_then(Value::as_array)
		.ok_or_else(|| Error::InvalidResponse {
			message: "Reddit listing has no children.".to_string(),
		})?;

	Ok(children.iter().filter_map(|child| child.get("data")).map(to_raw_item).collect())
}

fn to_raw_item(post: &Value) -> RawItem {
	let selftext = crate::str_field(post, "selftext");
	let description = selftext.chars().take(DESCRIPTION_MAX_CHARS).collect();
	let url = crate::str_field(post, "url");
	let permalink = crate::str_field(post, "permalink");
	let url = if !url.trim().is_empty() {
		Some(url.trim().to_string())
	} else if !permalink.trim().is_empty() {
		Some(format!("{PERMALINK_BASE}{}", permalink.trim()))
	} else {
		None
	};
	let published_at = post
		.get("created_utc")
		.and_then(Value::as_f64)
		.and_then(|secs| OffsetDateTime::from_unix_timestamp(secs as i64).ok())
		.unwrap_or_else(OffsetDateTime::now_utc);

	RawItem {
		title: crate::str_field(post, "title"),
		description,
		body: selftext,
		url,
		source: format!("r/{}", crate::str_field(post, "subreddit")),
		published_at,
	}
}
