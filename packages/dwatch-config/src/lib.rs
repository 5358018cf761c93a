mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, Coordinate, Enrichment, GeocoderConfig, Index, NewsApiSource, Pipeline, Postgres,
	ProviderConfig, Providers, RedditSource, Service, Snapshot, Sources, Storage,
};

use std::{collections::HashSet, env, fs, path::Path, str::FromStr};

const CATEGORY_NAMES: [&str; 8] =
	["earthquake", "flood", "cyclone", "wildfire", "landslide", "volcano", "drought", "tsunami"];

/// Reads, parses, applies `DWATCH_*` environment overrides from the process environment, and
/// validates.
pub fn load(path: &Path) -> Result<Config> {
	load_with_env(path, |key| env::var(key).ok())
}

pub fn load_with_env<F>(path: &Path, lookup: F) -> Result<Config>
where
	F: Fn(&str) -> Option<String>,
{
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;
	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	apply_env(&mut cfg, lookup)?;
	normalize(&mut cfg);
	validate(&cfg)?;

	Ok(cfg)
}

/// Overlays recognized environment variables onto `cfg`. Unset and blank variables are skipped.
pub fn apply_env<F>(cfg: &mut Config, lookup: F) -> Result<()>
where
	F: Fn(&str) -> Option<String>,
{
	let get = |key: &str| {
		lookup(key).map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
	};

	if let Some(value) = get("DWATCH_CLASSIFY_THRESHOLD") {
		cfg.enrichment.primary_threshold = parse_env("DWATCH_CLASSIFY_THRESHOLD", value)?;
	}
	if let Some(value) = get("DWATCH_SECONDARY_THRESHOLD") {
		cfg.enrichment.secondary_threshold = parse_env("DWATCH_SECONDARY_THRESHOLD", value)?;
	}
	if let Some(value) = get("DWATCH_BATCH_SIZE") {
		cfg.enrichment.batch_size = parse_env("DWATCH_BATCH_SIZE", value)?;
	}
	if let Some(value) = get("DWATCH_PER_CATEGORY_FETCH") {
		cfg.pipeline.page_size = parse_env("DWATCH_PER_CATEGORY_FETCH", value)?;
	}
	if let Some(value) = get("DWATCH_CATEGORY_PAUSE_MS") {
		cfg.pipeline.category_pause_ms = parse_env("DWATCH_CATEGORY_PAUSE_MS", value)?;
	}
	if let Some(value) = get("DWATCH_DEFAULT_LOCATION") {
		cfg.enrichment.default_location = value;
	}
	if let Some(value) = get("DWATCH_DEFAULT_LAT") {
		cfg.enrichment.default_geo.lat = parse_env("DWATCH_DEFAULT_LAT", value)?;
	}
	if let Some(value) = get("DWATCH_DEFAULT_LON") {
		cfg.enrichment.default_geo.lon = parse_env("DWATCH_DEFAULT_LON", value)?;
	}
	if let Some(dsn) = get("DWATCH_PG_DSN") {
		match cfg.storage.postgres.as_mut() {
			Some(postgres) => postgres.dsn = dsn,
			None => cfg.storage.postgres = Some(Postgres { dsn, pool_max_conns: 4 }),
		}
	}
	if let Some(path) = get("DWATCH_SNAPSHOT_PATH") {
		cfg.storage.snapshot = Some(Snapshot { path: path.into() });
	}
	if let Some(value) = get("DWATCH_ES_URL") {
		cfg.index.url = value;
	}
	if let Some(value) = get("DWATCH_ES_INDEX") {
		cfg.index.name = value;
	}
	if let Some(value) = get("DWATCH_NEWS_API_KEY")
		&& let Some(news_api) = cfg.sources.news_api.as_mut()
	{
		news_api.api_key = value;
	}
	if let Some(reddit) = cfg.sources.reddit.as_mut() {
		if let Some(value) = get("DWATCH_REDDIT_CLIENT_ID") {
			reddit.client_id = value;
		}
		if let Some(value) = get("DWATCH_REDDIT_CLIENT_SECRET") {
			reddit.client_secret = value;
		}
	}

	Ok(())
}

pub fn validate(cfg: &Config) -> Result<()> {
	let enrichment = &cfg.enrichment;

	for (label, value) in [
		("enrichment.primary_threshold", enrichment.primary_threshold),
		("enrichment.secondary_threshold", enrichment.secondary_threshold),
	] {
		if !value.is_finite() {
			return Err(Error::Validation { message: format!("{label} must be a finite number.") });
		}
		if !(0.0..=1.0).contains(&value) {
			return Err(Error::Validation {
				message: format!("{label} must be in the range 0.0-1.0."),
			});
		}
	}

	if enrichment.secondary_threshold > enrichment.primary_threshold {
		return Err(Error::Validation {
			message: "enrichment.secondary_threshold must not exceed enrichment.primary_threshold."
				.to_string(),
		});
	}
	if enrichment.batch_size == 0 {
		return Err(Error::Validation {
			message: "enrichment.batch_size must be greater than zero.".to_string(),
		});
	}
	if enrichment.geocode_attempts == 0 {
		return Err(Error::Validation {
			message: "enrichment.geocode_attempts must be greater than zero.".to_string(),
		});
	}
	if enrichment.default_location.trim().is_empty() {
		return Err(Error::Validation {
			message: "enrichment.default_location must be non-empty.".to_string(),
		});
	}

	let geo = enrichment.default_geo;

	if !(geo.lat.is_finite() && (-90.0..=90.0).contains(&geo.lat)) {
		return Err(Error::Validation {
			message: "enrichment.default_geo.lat must be in the range -90-90.".to_string(),
		});
	}
	if !(geo.lon.is_finite() && (-180.0..=180.0).contains(&geo.lon)) {
		return Err(Error::Validation {
			message: "enrichment.default_geo.lon must be in the range -180-180.".to_string(),
		});
	}

	validate_pipeline(&cfg.pipeline)?;
	validate_sources(&cfg.sources)?;

	for (label, provider) in [
		("classifier", &cfg.providers.classifier),
		("ner", &cfg.providers.ner),
		("sentiment", &cfg.providers.sentiment),
	] {
		if provider.api_base.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_base must be non-empty."),
			});
		}
		if provider.api_key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}

	if cfg.providers.geocoder.api_base.trim().is_empty() {
		return Err(Error::Validation {
			message: "Provider geocoder api_base must be non-empty.".to_string(),
		});
	}
	if cfg.providers.geocoder.user_agent.trim().is_empty() {
		return Err(Error::Validation {
			message: "providers.geocoder.user_agent must be non-empty.".to_string(),
		});
	}

	validate_storage(&cfg.storage)?;

	if cfg.index.url.trim().is_empty() {
		return Err(Error::Validation { message: "index.url must be non-empty.".to_string() });
	}
	if cfg.index.name.trim().is_empty() {
		return Err(Error::Validation { message: "index.name must be non-empty.".to_string() });
	}

	Ok(())
}

fn validate_pipeline(pipeline: &Pipeline) -> Result<()> {
	if pipeline.page_size == 0 {
		return Err(Error::Validation {
			message: "pipeline.page_size must be greater than zero.".to_string(),
		});
	}
	if pipeline.categories.is_empty() {
		return Err(Error::Validation {
			message: "pipeline.categories must be non-empty.".to_string(),
		});
	}

	let mut seen = HashSet::new();

	for category in &pipeline.categories {
		if category.eq_ignore_ascii_case("unknown") {
			return Err(Error::Validation {
				message: "pipeline.categories must not include unknown.".to_string(),
			});
		}
		if !CATEGORY_NAMES.iter().any(|name| name.eq_ignore_ascii_case(category)) {
			return Err(Error::Validation {
				message: format!("pipeline.categories has unrecognized category {category:?}."),
			});
		}
		if !seen.insert(category.to_ascii_lowercase()) {
			return Err(Error::Validation {
				message: format!("pipeline.categories lists {category:?} more than once."),
			});
		}
	}

	Ok(())
}

fn validate_sources(sources: &Sources) -> Result<()> {
	let mut enabled = 0;

	if let Some(news_api) = sources.news_api.as_ref().filter(|source| source.enabled) {
		if news_api.api_key.trim().is_empty() {
			return Err(Error::Validation {
				message: "sources.news_api.api_key must be non-empty.".to_string(),
			});
		}

		enabled += 1;
	}
	if let Some(reddit) = sources.reddit.as_ref().filter(|source| source.enabled) {
		for (label, value) in [
			("sources.reddit.client_id", &reddit.client_id),
			("sources.reddit.client_secret", &reddit.client_secret),
			("sources.reddit.subreddit", &reddit.subreddit),
			("sources.reddit.user_agent", &reddit.user_agent),
		] {
			if value.trim().is_empty() {
				return Err(Error::Validation { message: format!("{label} must be non-empty.") });
			}
		}

		enabled += 1;
	}

	if enabled == 0 {
		return Err(Error::Validation {
			message: "At least one feed source must be enabled.".to_string(),
		});
	}

	Ok(())
}

fn validate_storage(storage: &Storage) -> Result<()> {
	match storage.backend.as_str() {
		"postgres" => {
			let Some(postgres) = storage.postgres.as_ref() else {
				return Err(Error::Validation {
					message: "storage.postgres is required when storage.backend is postgres."
						.to_string(),
				});
			};

			if postgres.dsn.trim().is_empty() {
				return Err(Error::Validation {
					message: "storage.postgres.dsn must be non-empty.".to_string(),
				});
			}
			if postgres.pool_max_conns == 0 {
				return Err(Error::Validation {
					message: "storage.postgres.pool_max_conns must be greater than zero."
						.to_string(),
				});
			}
		},
		"snapshot" => {
			let Some(snapshot) = storage.snapshot.as_ref() else {
				return Err(Error::Validation {
					message: "storage.snapshot is required when storage.backend is snapshot."
						.to_string(),
				});
			};

			if snapshot.path.as_os_str().is_empty() {
				return Err(Error::Validation {
					message: "storage.snapshot.path must be non-empty.".to_string(),
				});
			}
		},
		_ =>
			return Err(Error::Validation {
				message: "storage.backend must be one of postgres or snapshot.".to_string(),
			}),
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.storage.backend = cfg.storage.backend.trim().to_ascii_lowercase();

	for category in &mut cfg.pipeline.categories {
		*category = category.trim().to_ascii_lowercase();
	}

	cfg.index.url = cfg.index.url.trim_end_matches('/').to_string();

	if let Some(news_api) = cfg.sources.news_api.as_mut() {
		news_api.api_base = news_api.api_base.trim_end_matches('/').to_string();
	}
	if let Some(reddit) = cfg.sources.reddit.as_mut() {
		reddit.api_base = reddit.api_base.trim_end_matches('/').to_string();
	}

	for provider in
		[&mut cfg.providers.classifier, &mut cfg.providers.ner, &mut cfg.providers.sentiment]
	{
		provider.api_base = provider.api_base.trim_end_matches('/').to_string();
	}

	cfg.providers.geocoder.api_base =
		cfg.providers.geocoder.api_base.trim_end_matches('/').to_string();
}

fn parse_env<T>(key: &'static str, value: String) -> Result<T>
where
	T: FromStr,
{
	value.parse().map_err(|_| Error::InvalidEnv { key, value })
}
