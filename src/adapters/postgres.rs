use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, QueryBuilder, Row};
use tracing::{debug, info, instrument};

use crate::domain::{Account, Position};
use crate::error::{Result, SyncError};
use crate::sync::{AccountCatalog, PositionStore};

/// Rows per INSERT statement; 11 binds each keeps well under the
/// 65535 parameter limit.
const UPSERT_CHUNK: usize = 1000;

/// PostgreSQL storage adapter
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        info!("Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Run migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations completed");
        Ok(())
    }
}

#[async_trait]
impl AccountCatalog for PostgresStore {
    async fn fetch_accounts(&self) -> Result<Vec<Account>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, name, mt5_login, mt5_password, mt5_server
            FROM accounts
            WHERE mt5_login IS NOT NULL
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        // A column of an unexpected type fails the catalog read, not the process
        let accounts = rows
            .iter()
            .map(|r| -> Result<Account> {
                Ok(Account {
                    id: r.try_get("id")?,
                    user_id: r.try_get("user_id")?,
                    name: r.try_get("name")?,
                    terminal_login: r.try_get("mt5_login")?,
                    terminal_secret: r.try_get("mt5_password")?,
                    server: r.try_get("mt5_server")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!("Fetched {} accounts from catalog", accounts.len());
        Ok(accounts)
    }
}

#[async_trait]
impl PositionStore for PostgresStore {
    #[instrument(skip_all, fields(count = positions.len()))]
    async fn upsert_positions(&self, positions: &[Position]) -> Result<usize> {
        if positions.is_empty() {
            return Ok(0);
        }

        let rows = positions
            .iter()
            .map(|p| {
                i64::try_from(p.external_position_id)
                    .map(|id| (p, id))
                    .map_err(|_| {
                        SyncError::Validation(format!(
                            "position id {} does not fit a BIGINT",
                            p.external_position_id
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        // All chunks commit together or not at all
        let mut tx = self.pool.begin().await?;

        for chunk in rows.chunks(UPSERT_CHUNK) {
            let mut query: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO trades (account_id, mt5_position_id, user_id, symbol, direction, \
                 entry_price, exit_price, size, pnl, status, created_at) ",
            );
            query.push_values(chunk, |mut row, (position, position_id)| {
                row.push_bind(position.account_id)
                    .push_bind(*position_id)
                    .push_bind(position.user_id)
                    .push_bind(&position.symbol)
                    .push_bind(position.direction.as_str())
                    .push_bind(position.entry_price)
                    .push_bind(position.exit_price())
                    .push_bind(position.size)
                    .push_bind(position.net_pnl())
                    .push_bind(position.status().as_str())
                    .push_bind(position.opened_at);
            });
            query.push(
                " ON CONFLICT (account_id, mt5_position_id) DO UPDATE SET \
                 user_id = EXCLUDED.user_id, \
                 symbol = EXCLUDED.symbol, \
                 direction = EXCLUDED.direction, \
                 entry_price = EXCLUDED.entry_price, \
                 exit_price = EXCLUDED.exit_price, \
                 size = EXCLUDED.size, \
                 pnl = EXCLUDED.pnl, \
                 status = EXCLUDED.status, \
                 created_at = EXCLUDED.created_at",
            );

            query.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;
        debug!("Upserted {} positions", positions.len());
        Ok(positions.len())
    }
}
