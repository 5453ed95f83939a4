//! PostgreSQL-backed `RecordStore` adapter using Diesel ORM.
//!
//! Every append is its own transaction, so the log is durable per entry and
//! `flush` has nothing to do. The `(context, transport, order_code)` index
//! keeps the duplicate probe cheap on a growing log.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::warn;

use crate::domain::ports::{RecordStore, RecordStoreError};
use crate::domain::record::{RecordEntry, RecordQuery};
use crate::domain::scan::{ScanCode, ScreenContext};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{NewRecordRow, RecordRow};
use super::pool::DbPool;
use super::schema::records;

/// PostgreSQL record log.
#[derive(Clone)]
pub struct PgRecordStore {
    pool: DbPool,
}

impl PgRecordStore {
    /// Create a new store over the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn conn(
        &self,
    ) -> Result<
        diesel_async::pooled_connection::bb8::PooledConnection<
            '_,
            diesel_async::AsyncPgConnection,
        >,
        RecordStoreError,
    > {
        self.pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, RecordStoreError::connection))
    }
}

fn map_query_error(error: diesel::result::Error) -> RecordStoreError {
    map_diesel_error(error, RecordStoreError::query, RecordStoreError::connection)
}

/// Convert a database row to a log entry; `None` when the stored context tag
/// is outside the closed set.
fn row_to_entry(row: RecordRow) -> Option<RecordEntry> {
    let Ok(context) = row.context.parse::<ScreenContext>() else {
        warn!(context = row.context, "unrecognised context tag; row skipped");
        return None;
    };
    let optional = |value: String| if value.is_empty() { None } else { Some(value) };
    Some(RecordEntry {
        recorded_at: row.recorded_at,
        operator: row.operator,
        context,
        transport: ScanCode::sanitize(&row.transport),
        order: ScanCode::sanitize(&row.order_code),
        divergent: row.divergent,
        authorized_by: optional(row.authorized_by),
        reason: optional(row.reason),
    })
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn exists(
        &self,
        context: ScreenContext,
        transport: &ScanCode,
        order: &ScanCode,
    ) -> Result<bool, RecordStoreError> {
        let mut conn = self.conn().await?;
        diesel::select(diesel::dsl::exists(
            records::table.filter(
                records::context
                    .eq(context.as_str())
                    .and(records::transport.eq(transport.as_ref()))
                    .and(records::order_code.eq(order.as_ref())),
            ),
        ))
        .get_result(&mut conn)
        .await
        .map_err(map_query_error)
    }

    async fn append(&self, entry: &RecordEntry) -> Result<(), RecordStoreError> {
        let mut conn = self.conn().await?;
        let row = NewRecordRow {
            recorded_at: entry.recorded_at,
            operator: &entry.operator,
            context: entry.context.as_str(),
            transport: entry.transport.as_ref(),
            order_code: entry.order.as_ref(),
            divergent: entry.divergent,
            authorized_by: entry.authorized_by.as_deref().unwrap_or(""),
            reason: entry.reason.as_deref().unwrap_or(""),
        };
        diesel::insert_into(records::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map_err(map_query_error)?;
        Ok(())
    }

    async fn query(&self, query: &RecordQuery) -> Result<Vec<RecordEntry>, RecordStoreError> {
        let mut conn = self.conn().await?;
        let mut statement = records::table.select(RecordRow::as_select()).into_boxed();
        statement = statement
            .filter(records::recorded_at.ge(query.starts_at()))
            .filter(records::recorded_at.lt(query.ends_before()));
        if let Some(context) = query.context {
            statement = statement.filter(records::context.eq(context.as_str()));
        }
        if query.divergent_only {
            statement = statement.filter(records::divergent.eq(true));
        }
        let rows: Vec<RecordRow> = statement
            .order(records::recorded_at.asc())
            .load(&mut conn)
            .await
            .map_err(map_query_error)?;
        Ok(rows.into_iter().filter_map(row_to_entry).collect())
    }

    async fn flush(&self) -> Result<(), RecordStoreError> {
        // Durable per statement; nothing buffered.
        Ok(())
    }
}
