use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	#[serde(default)]
	pub pipeline: Pipeline,
	#[serde(default)]
	pub enrichment: Enrichment,
	pub sources: Sources,
	pub providers: Providers,
	pub storage: Storage,
	pub index: Index,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Pipeline {
	/// Fetch order. Each entry must be a canonical category name.
	pub categories: Vec<String>,
	/// Items requested per category from each feed source.
	pub page_size: u32,
	/// Pause between categories, shared by all sources.
	pub category_pause_ms: u64,
}
impl Default for Pipeline {
	fn default() -> Self {
		Self {
			categories: [
				"earthquake",
				"flood",
				"cyclone",
				"wildfire",
				"landslide",
				"volcano",
				"drought",
				"tsunami",
			]
			.into_iter()
			.map(str::to_string)
			.collect(),
			page_size: 100,
			category_pause_ms: 1_000,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Enrichment {
	pub primary_threshold: f32,
	pub secondary_threshold: f32,
	/// Classifier inputs per request. Never changes per-item results.
	pub batch_size: u32,
	pub default_location: String,
	pub default_geo: Coordinate,
	pub geocode_attempts: u32,
	pub geocode_backoff_ms: u64,
}
impl Default for Enrichment {
	fn default() -> Self {
		Self {
			primary_threshold: 0.25,
			secondary_threshold: 0.15,
			batch_size: 16,
			default_location: "India".to_string(),
			default_geo: Coordinate { lat: 20.5937, lon: 78.9629 },
			geocode_attempts: 3,
			geocode_backoff_ms: 1_000,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Coordinate {
	pub lat: f64,
	pub lon: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Sources {
	pub news_api: Option<NewsApiSource>,
	pub reddit: Option<RedditSource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewsApiSource {
	#[serde(default = "default_true")]
	pub enabled: bool,
	#[serde(default = "default_news_api_base")]
	pub api_base: String,
	pub api_key: String,
	/// Appended to every query as `<category> AND <region>`. Empty disables scoping.
	#[serde(default)]
	pub region: String,
	#[serde(default = "default_language")]
	pub language: String,
	#[serde(default = "default_fetch_timeout_ms")]
	pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedditSource {
	#[serde(default = "default_true")]
	pub enabled: bool,
	#[serde(default = "default_reddit_auth_url")]
	pub auth_url: String,
	#[serde(default = "default_reddit_api_base")]
	pub api_base: String,
	pub client_id: String,
	pub client_secret: String,
	pub subreddit: String,
	pub user_agent: String,
	#[serde(default = "default_fetch_timeout_ms")]
	pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Providers {
	pub classifier: ProviderConfig,
	pub ner: ProviderConfig,
	pub sentiment: ProviderConfig,
	pub geocoder: GeocoderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
	pub api_base: String,
	pub api_key: String,
	/// Appended to `api_base`; usually names the hosted model.
	pub path: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeocoderConfig {
	pub api_base: String,
	#[serde(default = "default_geocoder_path")]
	pub path: String,
	/// Nominatim rejects requests without an identifying agent.
	pub user_agent: String,
	pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	/// One of `postgres` or `snapshot`.
	pub backend: String,
	pub postgres: Option<Postgres>,
	pub snapshot: Option<Snapshot>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Snapshot {
	pub path: std::path::PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Index {
	pub url: String,
	pub name: String,
	#[serde(default = "default_index_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

fn default_true() -> bool {
	true
}

fn default_news_api_base() -> String {
	"https://newsapi.org".to_string()
}

fn default_language() -> String {
	"en".to_string()
}

fn default_fetch_timeout_ms() -> u64 {
	30_000
}

fn default_reddit_auth_url() -> String {
	"https://www.reddit.com/api/v1/access_token".to_string()
}

fn default_reddit_api_base() -> String {
	"https://oauth.reddit.com".to_string()
}

fn default_geocoder_path() -> String {
	"/search".to_string()
}

fn default_index_timeout_ms() -> u64 {
	120_000
}
