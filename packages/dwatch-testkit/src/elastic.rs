use std::{thread, time::Duration};

use reqwest::{Client, StatusCode};
use tokio::runtime::Builder;
use uuid::Uuid;

use crate::{Error, Result};

const DELETE_TIMEOUT: Duration = Duration::from_secs(10);

/// A uniquely named Elasticsearch index. The index itself is created lazily by the code under
/// test; deleting it is idempotent, so a missing index counts as cleaned.
pub struct TestIndex {
	url: String,
	name: String,
	deleted: bool,
}
impl TestIndex {
	pub fn new(es_url: &str) -> Self {
		// Index names must be lowercase.
		let name = format!("dwatch_test_{}", Uuid::new_v4().simple());

		Self { url: es_url.trim_end_matches('/').to_string(), name, deleted: false }
	}

	pub fn url(&self) -> &str {
		&self.url
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn config(&self) -> dwatch_config::Index {
		dwatch_config::Index {
			url: self.url.clone(),
			name: self.name.clone(),
			timeout_ms: 30_000,
			default_headers: Default::default(),
		}
	}

	pub async fn cleanup(mut self) -> Result<()> {
		delete_index(&self.url, &self.name).await?;

		self.deleted = true;

		Ok(())
	}
}
impl Drop for TestIndex {
	fn drop(&mut self) {
		if self.deleted {
			return;
		}

		let url = self.url.clone();
		let name = self.name.clone();
		// The test runtime may be shutting down, so the delete gets its own.
		let outcome = thread::spawn(move || {
			Builder::new_current_thread()
				.enable_all()
				.build()
				.map_err(Error::from)
				.and_then(|runtime| runtime.block_on(delete_index(&url, &name)))
		})
		.join();

		match outcome {
			Ok(Ok(())) => {},
			Ok(Err(err)) => eprintln!("Test index {} was not deleted: {err}.", self.name),
			Err(_) => eprintln!("Test index {} cleanup thread panicked.", self.name),
		}
	}
}

async fn delete_index(url: &str, name: &str) -> Result<()> {
	let client = Client::builder().timeout(DELETE_TIMEOUT).build()?;
	let res = client.delete(format!("{url}/{name}")).send().await?;

	match res.status() {
		status if status.is_success() || status == StatusCode::NOT_FOUND => Ok(()),
		status => Err(Error::Message(format!("Delete of test index {name} returned {status}."))),
	}
}
