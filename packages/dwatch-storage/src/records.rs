use std::collections::HashSet;

use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};

use dwatch_domain::EnrichedRecord;

use crate::{
	Result,
	db::{Db, STORE_LOCK_ID},
	models::DisasterRecordRow,
};

// Keeps each insert well under the bind parameter limit.
const INSERT_CHUNK: usize = 500;

/// Postgres-backed record store.
pub struct PgStore {
	pub db: Db,
}
impl PgStore {
	pub fn new(db: Db) -> Self {
		Self { db }
	}

	pub async fn load(&self) -> Result<Vec<EnrichedRecord>> {
		load_records(&self.db.pool).await
	}

	pub async fn load_urls(&self) -> Result<HashSet<String>> {
		load_urls(&self.db.pool).await
	}

	pub async fn replace(&self, records: &[EnrichedRecord]) -> Result<()> {
		replace_records(&self.db.pool, records).await
	}
}

pub async fn load_records<'e, E>(executor: E) -> Result<Vec<EnrichedRecord>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, DisasterRecordRow>(
		"\
SELECT
\trecord_id,
\tposition,
\turl,
\ttitle,
\tdescription,
\tbody,
\tsource,
\tpublished_at,
\tdisaster_types,
\tlocation,
\tlat,
\tlon,
\tseverity
FROM disaster_records
ORDER BY position ASC",
	)
	.fetch_all(executor)
	.await?;

	rows.into_iter().map(DisasterRecordRow::into_record).collect()
}

pub async fn load_urls<'e, E>(executor: E) -> Result<HashSet<String>>
where
	E: PgExecutor<'e>,
{
	let urls: Vec<String> =
		sqlx::query_scalar("SELECT url FROM disaster_records").fetch_all(executor).await?;

	Ok(urls.into_iter().collect())
}

/// Replaces the whole collection in one transaction; readers see either the old or the new set.
pub async fn replace_records(pool: &PgPool, records: &[EnrichedRecord]) -> Result<()> {
	let rows: Vec<DisasterRecordRow> = records
		.iter()
		.enumerate()
		.map(|(position, record)| DisasterRecordRow::from_record(position as i32, record))
		.collect();
	let mut tx = pool.begin().await?;

	sqlx::query("SELECT pg_advisory_xact_lock($1)").bind(STORE_LOCK_ID).execute(&mut *tx).await?;
	sqlx::query("DELETE FROM disaster_records").execute(&mut *tx).await?;

	for chunk in rows.chunks(INSERT_CHUNK) {
		let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
			"\
INSERT INTO disaster_records (
\trecord_id,
\tposition,
\turl,
\ttitle,
\tdescription,
\tbody,
\tsource,
\tpublished_at,
\tdisaster_types,
\tlocation,
\tlat,
\tlon,
\tseverity
) ",
		);

		qb.push_values(chunk, |mut b, row| {
			b.push_bind(row.record_id)
				.push_bind(row.position)
				.push_bind(row.url.as_str())
				.push_bind(row.title.as_str())
				.push_bind(row.description.as_str())
				.push_bind(row.body.as_str())
				.push_bind(row.source.as_str())
				.push_bind(row.published_at)
				.push_bind(&row.disaster_types)
				.push_bind(row.location.as_str())
				.push_bind(row.lat)
				.push_bind(row.lon)
				.push_bind(row.severity.as_str());
		});
		qb.build().execute(&mut *tx).await?;
	}

	tx.commit().await?;

	tracing::debug!(records = rows.len(), "Replaced stored disaster records.");

	Ok(())
}
