use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{Result, schema};

/// Serializes schema bootstrap and store replacement across concurrent runs.
pub(crate) const STORE_LOCK_ID: i64 = 4_310_227;

pub struct Db {
	pub pool: PgPool,
}
impl Db {
	pub async fn connect(cfg: &dwatch_config::Postgres) -> Result<Self> {
		let pool =
			PgPoolOptions::new().max_connections(cfg.pool_max_conns).connect(&cfg.dsn).await?;

		Ok(Self { pool })
	}

	pub async fn ensure_schema(&self) -> Result<()> {
		let sql = schema::render_schema();
		// Advisory locks are per connection; the transaction pins the lock to one of them.
		let mut tx = self.pool.begin().await?;

		sqlx::query("SELECT pg_advisory_xact_lock($1)").bind(STORE_LOCK_ID).execute(&mut *tx).await?;

		for statement in sql.split(';') {
			let trimmed = statement.trim();

			if trimmed.is_empty() {
				continue;
			}

			sqlx::query(trimmed).execute(&mut *tx).await?;
		}

		tx.commit().await?;

		Ok(())
	}
}
