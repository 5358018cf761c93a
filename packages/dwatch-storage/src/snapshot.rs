//! File-backed record store: one JSON object per line, replaced atomically.

use std::{
	collections::HashSet,
	io::{ErrorKind, Write},
	path::{Path, PathBuf},
};

use tempfile::Builder;
use tokio::{fs, task};

use dwatch_domain::EnrichedRecord;

use crate::{Error, Result};

pub struct SnapshotStore {
	path: PathBuf,
}
impl SnapshotStore {
	pub fn new(cfg: &dwatch_config::Snapshot) -> Self {
		Self { path: cfg.path.clone() }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// A missing file is an empty store; an unreadable line is [`Error::Corrupt`].
	pub async fn load(&self) -> Result<Vec<EnrichedRecord>> {
		let raw = match fs::read_to_string(&self.path).await {
			Ok(raw) => raw,
			Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
			Err(err) => return Err(err.into()),
		};

		parse_lines(&raw)
	}

	pub async fn load_urls(&self) -> Result<HashSet<String>> {
		Ok(self.load().await?.into_iter().map(|record| record.url).collect())
	}

	/// Writes a uniquely named sibling temp file, syncs it, then renames it over the snapshot.
	/// Concurrent writers never share a temp file; the last rename wins.
	pub async fn replace(&self, records: &[EnrichedRecord]) -> Result<()> {
		let dir = match self.path.parent() {
			Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
			_ => PathBuf::from("."),
		};

		fs::create_dir_all(&dir).await?;

		let mut body = String::new();

		for record in records {
			let line = serde_json::to_string(record)
				.map_err(|err| Error::InvalidArgument(format!("Unserializable record: {err}")))?;

			body.push_str(&line);
			body.push('\n');
		}

		let path = self.path.clone();

		task::spawn_blocking(move || write_atomically(&dir, &path, body.as_bytes()))
			.await
			.map_err(|err| Error::Io(std::io::Error::other(err)))??;

		tracing::debug!(
			path = %self.path.display(),
			records = records.len(),
			"Replaced record snapshot."
		);

		Ok(())
	}
}

fn write_atomically(dir: &Path, path: &Path, body: &[u8]) -> Result<()> {
	let prefix = path
		.file_name()
		.map(|name| format!(".{}.", name.to_string_lossy()))
		.unwrap_or_else(|| ".store.".to_string());
	let mut tmp = Builder::new().prefix(&prefix).suffix(".tmp").tempfile_in(dir)?;

	tmp.write_all(body)?;
	tmp.as_file().sync_all()?;
	tmp.persist(path).map_err(|err| err.error)?;

	Ok(())
}

fn parse_lines(raw: &str) -> Result<Vec<EnrichedRecord>> {
	let mut records = Vec::new();

	for (idx, line) in raw.lines().enumerate() {
		if line.trim().is_empty() {
			continue;
		}

		let record: EnrichedRecord = serde_json::from_str(line)
			.map_err(|err| Error::Corrupt(format!("Snapshot line {}: {err}", idx + 1)))?;

		if record.disaster_types.is_empty() {
			return Err(Error::Corrupt(format!("Snapshot line {} has no disaster types.", idx + 1)));
		}

		records.push(record);
	}

	Ok(records)
}
