use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{Money, OrderId, OrderToken, ProductId, Status, UserId};
use domain::{
    NewOrder, NewPaymentRecord, Order, OrderLine, OrderStatus, PaymentRecord, PaymentResolution,
    PaymentStatus, PersistedState,
};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{
    Result, StoreError,
    store::{OrderStore, PaymentLedger},
};

/// PostgreSQL-backed order store and payment ledger.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn load_lines(&self, order_id: OrderId) -> Result<Vec<OrderLine>> {
        let rows = sqlx::query(
            r#"
            SELECT product_id, quantity, unit_price
            FROM order_lines
            WHERE order_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(order_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let quantity: i32 = row.try_get("quantity")?;
                let quantity = u32::try_from(quantity).map_err(|_| {
                    StoreError::Corrupted(format!("negative quantity on order {order_id}"))
                })?;
                Ok(OrderLine::new(
                    ProductId::new(row.try_get("product_id")?),
                    quantity,
                    Money::new(row.try_get("unit_price")?),
                ))
            })
            .collect()
    }

    fn row_to_record(row: PgRow) -> Result<PaymentRecord> {
        let status: String = row.try_get("status")?;
        Ok(PaymentRecord {
            id: row.try_get("id")?,
            order_id: OrderId::new(row.try_get("order_id")?),
            transaction_id: row.try_get("transaction_id")?,
            amount: Money::new(row.try_get("amount")?),
            status: parse_payment_status(&status)?,
            message: row.try_get("message")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

fn parse_wire(raw: &str) -> Result<Status> {
    raw.parse::<Status>()
        .map_err(|e| StoreError::Corrupted(e.to_string()))
}

fn parse_order_status(raw: &str) -> Result<OrderStatus> {
    OrderStatus::from_wire(parse_wire(raw)?)
        .ok_or_else(|| StoreError::Corrupted(format!("not an order status: {raw}")))
}

fn parse_payment_status(raw: &str) -> Result<PaymentStatus> {
    PaymentStatus::from_wire(parse_wire(raw)?)
        .ok_or_else(|| StoreError::Corrupted(format!("not a payment status: {raw}")))
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn insert(&self, draft: NewOrder) -> Result<Order> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO orders (user_id, total, status, inventory_debited, version, created_at, updated_at)
            VALUES ($1, $2, $3, FALSE, 1, $4, $4)
            RETURNING id
            "#,
        )
        .bind(draft.user_id().as_i64())
        .bind(draft.total().minor_units())
        .bind(OrderStatus::Created.as_str())
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        for (position, line) in draft.lines().iter().enumerate() {
            let quantity = i32::try_from(line.quantity).map_err(|_| {
                StoreError::Corrupted(format!("quantity {} out of range", line.quantity))
            })?;

            sqlx::query(
                r#"
                INSERT INTO order_lines (order_id, position, product_id, quantity, unit_price)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(id)
            .bind(position as i32)
            .bind(line.product_id.as_i64())
            .bind(quantity)
            .bind(line.unit_price.minor_units())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::debug!(order_id = id, "order inserted");

        // Postgres keeps microseconds; reload so timestamps match what a later get() returns.
        self.get(OrderId::new(id))
            .await?
            .ok_or(StoreError::OrderNotFound(OrderId::new(id)))
    }

    async fn get(&self, order_id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(
            r#"
            SELECT user_id, token, total, status, inventory_debited, version, created_at, updated_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(order_id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let lines = self.load_lines(order_id).await?;
        let draft = NewOrder::new(UserId::new(row.try_get("user_id")?), lines)
            .map_err(|e| StoreError::Corrupted(format!("order {order_id}: {e}")))?;

        let stored_total = Money::new(row.try_get("total")?);
        if stored_total != draft.total() {
            return Err(StoreError::Corrupted(format!(
                "order {order_id}: stored total {stored_total} does not match lines ({})",
                draft.total()
            )));
        }

        let token = row
            .try_get::<Option<String>, _>("token")?
            .map(|raw| OrderToken::parse(&raw))
            .transpose()
            .map_err(|e| StoreError::Corrupted(e.to_string()))?;
        let status: String = row.try_get("status")?;

        let state = PersistedState {
            token,
            status: parse_order_status(&status)?,
            inventory_debited: row.try_get("inventory_debited")?,
            version: row.try_get("version")?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
            updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
        };

        Ok(Some(Order::rehydrate(order_id, draft, state)))
    }

    async fn save(&self, order: &Order) -> Result<Order> {
        let updated: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE orders
            SET token = $1, status = $2, inventory_debited = $3, updated_at = $4, version = version + 1
            WHERE id = $5 AND version = $6
            RETURNING version
            "#,
        )
        .bind(order.token().map(|t| t.as_str()))
        .bind(order.status().as_str())
        .bind(order.inventory_debited())
        .bind(order.updated_at())
        .bind(order.id().as_i64())
        .bind(order.version())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(version) = updated {
            let mut saved = order.clone();
            saved.set_version(version);
            return Ok(saved);
        }

        let actual: Option<i64> = sqlx::query_scalar("SELECT version FROM orders WHERE id = $1")
            .bind(order.id().as_i64())
            .fetch_optional(&self.pool)
            .await?;

        match actual {
            Some(actual) => Err(StoreError::ConcurrencyConflict {
                order_id: order.id(),
                expected: order.version(),
                actual,
            }),
            None => Err(StoreError::OrderNotFound(order.id())),
        }
    }
}

#[async_trait]
impl PaymentLedger for PostgresStore {
    async fn append(&self, record: NewPaymentRecord) -> Result<PaymentRecord> {
        let row = sqlx::query(
            r#"
            INSERT INTO payment_records (order_id, transaction_id, amount, status, message, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING id, order_id, transaction_id, amount, status, message, created_at, updated_at
            "#,
        )
        .bind(record.order_id.as_i64())
        .bind(&record.transaction_id)
        .bind(record.amount.minor_units())
        .bind(record.status.as_str())
        .bind(&record.message)
        .bind(record.created_at)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_record(row)
    }

    async fn latest_for_order(&self, order_id: OrderId) -> Result<Option<PaymentRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, order_id, transaction_id, amount, status, message, created_at, updated_at
            FROM payment_records
            WHERE order_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(order_id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_record).transpose()
    }

    async fn resolve(
        &self,
        record_id: i64,
        resolution: &PaymentResolution,
    ) -> Result<PaymentRecord> {
        let row = sqlx::query(
            r#"
            UPDATE payment_records
            SET status = $1, message = $2, updated_at = $3
            WHERE id = $4
            RETURNING id, order_id, transaction_id, amount, status, message, created_at, updated_at
            "#,
        )
        .bind(resolution.status.as_str())
        .bind(&resolution.message)
        .bind(resolution.updated_at)
        .bind(record_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_record)
            .transpose()?
            .ok_or(StoreError::PaymentRecordNotFound(record_id))
    }

    async fn history(&self, order_id: OrderId) -> Result<Vec<PaymentRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, order_id, transaction_id, amount, status, message, created_at, updated_at
            FROM payment_records
            WHERE order_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(order_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_record).collect()
    }
}
