//! Repository implementations cho SQLite
//!
//! Các hàm đọc nhận bất kỳ `Executor` nào (pool hoặc transaction).
//! Các hàm ghi nhận `&mut SqliteConnection` và chỉ được gọi bên trong một
//! atomic unit. Mọi guarded update trả về số rows affected; 0 nghĩa là
//! guard predicate không thỏa.

use crate::error::PersistenceResult;
use crate::sqlite::schema::*;
use crate::DatabaseOptions;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{Sqlite, SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Executor, SqlitePool};
use stakeledger_core::UserId;
use std::str::FromStr;
use std::time::Duration;

const ACCOUNT_COLUMNS: &str = "user_id, balance, staked_amount, stake_start_date, \
     stake_duration_days, stake_end_date, created_at, updated_at";

const TRANSACTION_COLUMNS: &str = "id, user_id, tx_type, amount, points_converted, \
     counterparty_user_id, description, created_at";

/// Giá trị hiện tại lớn nhất để cộng thêm `delta` mà không vượt i64.
///
/// SQLite không báo lỗi khi phép cộng INTEGER tràn mà âm thầm chuyển sang
/// REAL, nên mọi phép cộng dồn đều phải guard bằng giới hạn này.
fn max_before_add(delta: i64) -> i64 {
    i64::MAX.saturating_sub(delta)
}

// ============================================================================
// Points Repository
// ============================================================================

/// Repository cho bảng `users` (points của user-profile collaborator)
pub struct PointsRepo;

impl PointsRepo {
    /// Lấy points của user, None nếu user chưa tồn tại
    pub async fn get_points<'e, E>(executor: E, user_id: UserId) -> PersistenceResult<Option<i64>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let points = sqlx::query_scalar::<_, i64>("SELECT points FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(executor)
            .await?;
        Ok(points)
    }

    /// Cộng points cho user (tạo user nếu chưa có), trả về points mới.
    ///
    /// None nếu points mới sẽ vượt i64; khi đó row giữ nguyên.
    pub async fn grant<'e, E>(
        executor: E,
        user_id: UserId,
        points: i64,
        now: DateTime<Utc>,
    ) -> PersistenceResult<Option<i64>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let balance = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO users (id, points, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                points = points + excluded.points,
                updated_at = excluded.updated_at
            WHERE points <= ?
            RETURNING points
            "#,
        )
        .bind(user_id)
        .bind(points)
        .bind(now)
        .bind(now)
        .bind(max_before_add(points))
        .fetch_optional(executor)
        .await?;
        Ok(balance)
    }

    /// Trừ points, guarded bởi `points >= ?`
    pub async fn deduct_if_sufficient(
        conn: &mut SqliteConnection,
        user_id: UserId,
        points: i64,
        now: DateTime<Utc>,
    ) -> PersistenceResult<u64> {
        let result = sqlx::query(
            "UPDATE users SET points = points - ?, updated_at = ? WHERE id = ? AND points >= ?",
        )
        .bind(points)
        .bind(now)
        .bind(user_id)
        .bind(points)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Đếm users
    pub async fn count<'e, E>(executor: E) -> PersistenceResult<i64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(executor)
            .await?;
        Ok(count)
    }
}

// ============================================================================
// Account Repository
// ============================================================================

/// Repository cho bảng `token_accounts`
pub struct AccountRepo;

impl AccountRepo {
    /// Lấy account theo user ID
    pub async fn get<'e, E>(executor: E, user_id: UserId) -> PersistenceResult<Option<TokenAccountRow>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!("SELECT {} FROM token_accounts WHERE user_id = ?", ACCOUNT_COLUMNS);
        let row = sqlx::query_as::<_, TokenAccountRow>(&sql)
            .bind(user_id)
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    /// Cộng balance, tạo account nếu chưa có.
    ///
    /// Trả về 0 nếu balance mới sẽ vượt i64.
    pub async fn credit_or_create(
        conn: &mut SqliteConnection,
        user_id: UserId,
        units: i64,
        now: DateTime<Utc>,
    ) -> PersistenceResult<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO token_accounts (user_id, balance, staked_amount, created_at, updated_at)
            VALUES (?, ?, 0, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                balance = balance + excluded.balance,
                updated_at = excluded.updated_at
            WHERE balance <= ?
            "#,
        )
        .bind(user_id)
        .bind(units)
        .bind(now)
        .bind(now)
        .bind(max_before_add(units))
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Trừ balance, guarded bởi `balance >= ?`
    pub async fn debit_if_sufficient(
        conn: &mut SqliteConnection,
        user_id: UserId,
        units: i64,
        now: DateTime<Utc>,
    ) -> PersistenceResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE token_accounts
            SET balance = balance - ?, updated_at = ?
            WHERE user_id = ? AND balance >= ?
            "#,
        )
        .bind(units)
        .bind(now)
        .bind(user_id)
        .bind(units)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Chuyển `units` từ balance vào stake.
    ///
    /// Guard gộp cả hai điều kiện "chưa stake" và "đủ balance" trong cùng
    /// một statement.
    pub async fn begin_stake(
        conn: &mut SqliteConnection,
        user_id: UserId,
        units: i64,
        duration_days: u32,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> PersistenceResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE token_accounts
            SET balance = balance - ?,
                staked_amount = ?,
                stake_start_date = ?,
                stake_duration_days = ?,
                stake_end_date = ?,
                updated_at = ?
            WHERE user_id = ? AND staked_amount = 0 AND balance >= ?
            "#,
        )
        .bind(units)
        .bind(units)
        .bind(start)
        .bind(i64::from(duration_days))
        .bind(end)
        .bind(start)
        .bind(user_id)
        .bind(units)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Lấy write lock trên row của account (per-account pessimistic lock).
    ///
    /// Trả về 0 nếu account chưa tồn tại.
    pub async fn lock_for_update(
        conn: &mut SqliteConnection,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> PersistenceResult<u64> {
        let result = sqlx::query("UPDATE token_accounts SET updated_at = ? WHERE user_id = ?")
            .bind(now)
            .bind(user_id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected())
    }

    /// Giải phóng stake: cộng `payout_units` vào balance và reset các trường stake.
    ///
    /// Guarded bởi `staked_amount = staked_units` đã đọc trước đó và bởi
    /// giới hạn i64 của balance sau khi cộng.
    pub async fn release_stake(
        conn: &mut SqliteConnection,
        user_id: UserId,
        staked_units: i64,
        payout_units: i64,
        now: DateTime<Utc>,
    ) -> PersistenceResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE token_accounts
            SET balance = balance + ?,
                staked_amount = 0,
                stake_start_date = NULL,
                stake_duration_days = NULL,
                stake_end_date = NULL,
                updated_at = ?
            WHERE user_id = ? AND staked_amount = ? AND balance <= ?
            "#,
        )
        .bind(payout_units)
        .bind(now)
        .bind(user_id)
        .bind(staked_units)
        .bind(max_before_add(payout_units))
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Đếm accounts đã materialize
    pub async fn count<'e, E>(executor: E) -> PersistenceResult<i64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM token_accounts")
            .fetch_one(executor)
            .await?;
        Ok(count)
    }
}

// ============================================================================
// Transaction Repository
// ============================================================================

/// Repository cho bảng `token_transactions` (append-only)
pub struct TransactionRepo;

impl TransactionRepo {
    /// Thêm transaction mới, trả về id được cấp
    pub async fn insert(conn: &mut SqliteConnection, tx: &NewTransaction) -> PersistenceResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO token_transactions
                (user_id, tx_type, amount, points_converted, counterparty_user_id, description, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(tx.user_id)
        .bind(tx.tx_type.as_str())
        .bind(tx.amount_units)
        .bind(tx.points_converted)
        .bind(tx.counterparty_user_id)
        .bind(&tx.description)
        .bind(tx.created_at)
        .execute(conn)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Lấy transaction theo ID
    pub async fn get_by_id<'e, E>(executor: E, id: i64) -> PersistenceResult<Option<TransactionRow>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!("SELECT {} FROM token_transactions WHERE id = ?", TRANSACTION_COLUMNS);
        let row = sqlx::query_as::<_, TransactionRow>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    /// Lấy transactions của user, mới nhất trước
    pub async fn list_by_user<'e, E>(
        executor: E,
        user_id: UserId,
        limit: u32,
        offset: u32,
    ) -> PersistenceResult<Vec<TransactionRow>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!(
            "SELECT {} FROM token_transactions WHERE user_id = ? \
             ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
            TRANSACTION_COLUMNS
        );
        let rows = sqlx::query_as::<_, TransactionRow>(&sql)
            .bind(user_id)
            .bind(i64::from(limit))
            .bind(i64::from(offset))
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    /// Đếm transactions của user
    pub async fn count_by_user<'e, E>(executor: E, user_id: UserId) -> PersistenceResult<i64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM token_transactions WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_one(executor)
        .await?;
        Ok(count)
    }

    /// Đếm tất cả transactions
    pub async fn count<'e, E>(executor: E) -> PersistenceResult<i64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM token_transactions")
            .fetch_one(executor)
            .await?;
        Ok(count)
    }
}

// ============================================================================
// Database initialization
// ============================================================================

/// Khởi tạo connection pool từ options
pub async fn create_pool(options: &DatabaseOptions) -> PersistenceResult<SqlitePool> {
    let connect = SqliteConnectOptions::from_str(&options.url())?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_millis(options.busy_timeout_ms));

    let pool = SqlitePoolOptions::new()
        .max_connections(options.max_connections.max(1))
        .connect_with(connect)
        .await?;
    Ok(pool)
}

/// Pool cho in-memory database (một connection duy nhất, không bao giờ đóng)
pub async fn create_memory_pool() -> PersistenceResult<SqlitePool> {
    let connect = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(connect)
        .await?;
    Ok(pool)
}

/// Tạo schema (idempotent)
pub async fn init_schema(pool: &SqlitePool) -> PersistenceResult<()> {
    for statement in SCHEMA {
        sqlx::query(*statement).execute(pool).await?;
    }
    tracing::debug!(statements = SCHEMA.len(), "Schema initialized");
    Ok(())
}
