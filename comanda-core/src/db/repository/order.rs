//! Order Repository
//!
//! Transactional persistence of the full order graph. `save` uses a
//! replace-all strategy for dishes and items: per-order row counts are
//! small, so rewriting the children beats diffing and keeps every save
//! idempotent.

use super::{RepoError, RepoResult, sequence_state};
use crate::orders::number;
use crate::utils::time;
use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::order::{Dish, DishStatus, Order, OrderStatus, Product};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

// ========== Row types ==========

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: String,
    created_at: String,
    closed_at: String,
    service_date: Option<String>,
    status: String,
    to_go: bool,
    sent_status: bool,
    name: Option<String>,
    table_name: Option<String>,
    additional_notes: Option<String>,
    include_additional_notes_in_ticket: bool,
    amount_paid: f64,
}

#[derive(sqlx::FromRow)]
struct DishRow {
    id: String,
    display_name: Option<String>,
    status: String,
    sent_count: i32,
    to_go: bool,
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    name: String,
    display_name: Option<String>,
    price: f64,
    quantity: i32,
    notes: Option<String>,
    is_custom: bool,
}

// ========== Save ==========

/// Persist the full order graph in one transaction.
///
/// `closed_at` is first-close-wins: an existing non-empty value is
/// preserved verbatim (reopening does not clear it), and only an order
/// closing for the first time is stamped with the current time. The
/// historical-maximum identifier is raised in the same transaction. On
/// any failure the whole save rolls back and the stored graph is
/// unchanged.
///
/// The resolved `closed_at` is written back onto the aggregate so the
/// in-memory order matches what a reload would produce.
pub async fn save(pool: &SqlitePool, order: &mut Order) -> RepoResult<()> {
    let mut tx = pool.begin().await?;

    let existing: Option<(String,)> = sqlx::query_as("SELECT closed_at FROM orders WHERE id = ?")
        .bind(&order.id)
        .fetch_optional(&mut *tx)
        .await?;
    let existing_closed_at = existing.map(|(value,)| value).unwrap_or_default();

    let closed_at_value = if !existing_closed_at.is_empty() {
        existing_closed_at
    } else if order.status == OrderStatus::Closed {
        Utc::now().to_rfc3339()
    } else {
        String::new()
    };

    sqlx::query(
        "INSERT INTO orders (
            id, created_at, closed_at, service_date, status, to_go, sent_status,
            name, table_name, additional_notes, include_additional_notes_in_ticket,
            amount_paid, total_amount
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            created_at = excluded.created_at,
            closed_at = excluded.closed_at,
            service_date = excluded.service_date,
            status = excluded.status,
            to_go = excluded.to_go,
            sent_status = excluded.sent_status,
            name = excluded.name,
            table_name = excluded.table_name,
            additional_notes = excluded.additional_notes,
            include_additional_notes_in_ticket = excluded.include_additional_notes_in_ticket,
            amount_paid = excluded.amount_paid,
            total_amount = excluded.total_amount",
    )
    .bind(&order.id)
    .bind(order.created_at.to_rfc3339())
    .bind(&closed_at_value)
    .bind(order.service_date.to_string())
    .bind(order.status.as_str())
    .bind(order.to_go)
    .bind(order.sent_status)
    .bind(&order.name)
    .bind(&order.table)
    .bind(&order.additional_notes)
    .bind(order.include_additional_notes_in_ticket)
    .bind(order.amount_paid)
    .bind(order.total_amount)
    .execute(&mut *tx)
    .await?;

    // Replace-all: children are rewritten from the in-memory aggregate
    sqlx::query(
        "DELETE FROM order_items
         WHERE dish_id IN (SELECT id FROM order_dishes WHERE order_id = ?)",
    )
    .bind(&order.id)
    .execute(&mut *tx)
    .await?;
    sqlx::query("DELETE FROM order_dishes WHERE order_id = ?")
        .bind(&order.id)
        .execute(&mut *tx)
        .await?;

    for dish in &order.dishes {
        sqlx::query(
            "INSERT INTO order_dishes (id, order_id, display_name, status, sent_count, to_go, total_amount)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&dish.id)
        .bind(&order.id)
        .bind(&dish.display_name)
        .bind(dish.status.as_str())
        .bind(dish.sent_count)
        .bind(dish.to_go)
        .bind(dish.total_amount)
        .execute(&mut *tx)
        .await?;

        for product in &dish.products {
            sqlx::query(
                "INSERT INTO order_items (dish_id, name, display_name, price, quantity, notes, is_custom)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&dish.id)
            .bind(&product.name)
            .bind(&product.display_name)
            .bind(product.price)
            .bind(product.quantity)
            .bind(&product.notes)
            .bind(product.is_custom)
            .execute(&mut *tx)
            .await?;
        }
    }

    sequence_state::record_issued(&mut tx, &order.id).await?;

    tx.commit().await?;

    order.closed_at = parse_timestamp(&closed_at_value);
    Ok(())
}

// ========== Load ==========

/// Hydrate a single order graph; `RepoError::NotFound` for unknown ids
pub async fn load_order(pool: &SqlitePool, order_id: &str) -> RepoResult<Order> {
    let row: Option<OrderRow> = sqlx::query_as(
        "SELECT id, created_at, closed_at, service_date, status, to_go, sent_status,
                name, table_name, additional_notes, include_additional_notes_in_ticket,
                amount_paid
         FROM orders WHERE id = ?",
    )
    .bind(order_id)
    .fetch_optional(pool)
    .await?;
    let row = row.ok_or_else(|| RepoError::NotFound(format!("Order {order_id} not found")))?;

    let mut order = hydrate_order(row);

    let dish_rows: Vec<DishRow> = sqlx::query_as(
        "SELECT id, display_name, status, sent_count, to_go
         FROM order_dishes WHERE order_id = ? ORDER BY rowid",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;

    for dish_row in dish_rows {
        let item_rows: Vec<ItemRow> = sqlx::query_as(
            "SELECT name, display_name, price, quantity, notes, is_custom
             FROM order_items WHERE dish_id = ? ORDER BY id",
        )
        .bind(&dish_row.id)
        .fetch_all(pool)
        .await?;

        order.dishes.push(hydrate_dish(dish_row, item_rows));
    }

    // Stored totals are advisory; the aggregate recomputes from rows
    order.recompute_total();
    order.ensure_active_dish();
    Ok(order)
}

/// Every order whose status is not `Closed`, fully hydrated, creation
/// time ascending
pub async fn load_open_orders(pool: &SqlitePool) -> RepoResult<Vec<Order>> {
    let ids: Vec<(String,)> =
        sqlx::query_as("SELECT id FROM orders WHERE status != ? ORDER BY created_at ASC")
            .bind(OrderStatus::Closed.as_str())
            .fetch_all(pool)
            .await?;

    let mut orders = Vec::with_capacity(ids.len());
    for (id,) in ids {
        orders.push(load_order(pool, &id).await?);
    }
    Ok(orders)
}

fn hydrate_order(row: OrderRow) -> Order {
    let mut order = Order::new(row.id);
    order.created_at = parse_timestamp(&row.created_at).unwrap_or_else(Utc::now);
    order.closed_at = parse_timestamp(&row.closed_at);
    order.service_date = row
        .service_date
        .as_deref()
        .and_then(time::parse_date)
        .unwrap_or_else(|| order.created_at.date_naive());
    order.status = OrderStatus::parse(&row.status);
    order.to_go = row.to_go;
    order.sent_status = row.sent_status;
    order.name = row.name.unwrap_or_default();
    order.table = row.table_name.unwrap_or_default();
    order.additional_notes = row.additional_notes.unwrap_or_default();
    order.include_additional_notes_in_ticket = row.include_additional_notes_in_ticket;
    order.amount_paid = row.amount_paid;
    order
}

fn hydrate_dish(row: DishRow, item_rows: Vec<ItemRow>) -> Dish {
    let mut dish = Dish::new(row.id);
    dish.display_name = row.display_name.unwrap_or_default();
    dish.status = DishStatus::parse(&row.status);
    dish.sent_count = row.sent_count;
    dish.to_go = row.to_go;

    for item in item_rows {
        let display_name = item.display_name.unwrap_or_else(|| item.name.clone());
        dish.products.push(Product {
            name: item.name,
            display_name,
            price: item.price,
            quantity: item.quantity.max(1),
            notes: item.notes.unwrap_or_default(),
            notes_shortcuts: Vec::new(),
            is_custom: item.is_custom,
        });
    }

    dish.recompute_total();
    dish
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if raw.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

// ========== Delete ==========

/// Delete the order (dishes and items cascade). The historical maximum
/// is still raised with the deleted id so the number is never reissued.
pub async fn delete(pool: &SqlitePool, order_id: &str) -> RepoResult<bool> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query("DELETE FROM orders WHERE id = ?")
        .bind(order_id)
        .execute(&mut *tx)
        .await?;
    sequence_state::record_issued(&mut tx, order_id).await?;
    tx.commit().await?;
    Ok(result.rows_affected() > 0)
}

/// Bulk delete for the admin grid; each id raises the historical
/// maximum like `delete` does
pub async fn delete_many(pool: &SqlitePool, order_ids: &[String]) -> RepoResult<u64> {
    if order_ids.is_empty() {
        return Ok(0);
    }
    let mut tx = pool.begin().await?;
    let mut deleted = 0;
    for order_id in order_ids {
        let result = sqlx::query("DELETE FROM orders WHERE id = ?")
            .bind(order_id)
            .execute(&mut *tx)
            .await?;
        deleted += result.rows_affected();
        sequence_state::record_issued(&mut tx, order_id).await?;
    }
    tx.commit().await?;
    Ok(deleted)
}

// ========== Identifier history ==========

/// Highest identifier ever issued: the durable maximum when present,
/// cross-checked against live rows (they can be ahead if the state row
/// predates them), else a live-row scan. Used once at startup to seed
/// the number generator.
pub async fn latest_issued_id(pool: &SqlitePool) -> RepoResult<Option<String>> {
    let live_max = greatest_live_id(pool).await?;
    match sequence_state::get(pool).await? {
        Some(historical) => {
            if let Some(live) = live_max
                && number::compare_order_ids(&live, &historical).is_ge()
            {
                Ok(Some(live))
            } else {
                Ok(Some(historical))
            }
        }
        None => Ok(live_max),
    }
}

/// Well-formed ids sort lexicographically, so the first match in the
/// descending scan is the maximum. LIMIT bounds the scan on stores with
/// many malformed legacy ids.
async fn greatest_live_id(pool: &SqlitePool) -> RepoResult<Option<String>> {
    let rows: Vec<(String,)> = sqlx::query_as("SELECT id FROM orders ORDER BY id DESC LIMIT 200")
        .fetch_all(pool)
        .await?;
    Ok(rows
        .into_iter()
        .map(|(id,)| id)
        .find(|id| number::parse_order_id(id).is_some()))
}

// ========== Search (admin grid) ==========

/// Flat row for the admin/reporting grid
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderSummary {
    pub id: String,
    pub created_at: String,
    pub closed_at: String,
    pub service_date: Option<String>,
    pub name: Option<String>,
    pub table_name: Option<String>,
    pub status: String,
    pub to_go: bool,
    pub amount_paid: f64,
    pub total_amount: f64,
}

/// Comparison operator for the numeric search filters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NumericOp {
    #[default]
    Eq,
    Gt,
    Lt,
}

impl NumericOp {
    fn as_sql(&self) -> &'static str {
        match self {
            NumericOp::Eq => "=",
            NumericOp::Gt => ">",
            NumericOp::Lt => "<",
        }
    }
}

/// Search filters for the grid: text fields match with `LIKE '%…%'`,
/// numeric fields with their operator. Empty fields are skipped and all
/// present filters combine with AND.
#[derive(Debug, Clone, Default)]
pub struct OrderSearchFilter {
    pub id: Option<String>,
    pub name: Option<String>,
    pub table_name: Option<String>,
    pub status: Option<String>,
    pub service_date: Option<String>,
    pub total_amount: Option<(NumericOp, f64)>,
    pub amount_paid: Option<(NumericOp, f64)>,
}

pub async fn search(
    pool: &SqlitePool,
    filter: &OrderSearchFilter,
) -> RepoResult<Vec<OrderSummary>> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT id, created_at, closed_at, service_date, name, table_name, status, \
         to_go, amount_paid, total_amount FROM orders",
    );
    let mut has_where = false;

    fn sep(qb: &mut QueryBuilder<Sqlite>, has_where: &mut bool) {
        if *has_where {
            qb.push(" AND ");
        } else {
            qb.push(" WHERE ");
            *has_where = true;
        }
    }

    let text_filters = [
        ("id", &filter.id),
        ("name", &filter.name),
        ("table_name", &filter.table_name),
        ("status", &filter.status),
        ("service_date", &filter.service_date),
    ];
    for (column, value) in text_filters {
        if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            sep(&mut qb, &mut has_where);
            qb.push(column);
            qb.push(" LIKE ");
            qb.push_bind(format!("%{value}%"));
        }
    }

    let numeric_filters = [
        ("total_amount", filter.total_amount),
        ("amount_paid", filter.amount_paid),
    ];
    for (column, value) in numeric_filters {
        if let Some((op, value)) = value {
            sep(&mut qb, &mut has_where);
            qb.push("CAST(");
            qb.push(column);
            qb.push(" AS REAL) ");
            qb.push(op.as_sql());
            qb.push(" ");
            qb.push_bind(value);
        }
    }

    qb.push(" ORDER BY id ASC");
    let rows = qb.build_query_as::<OrderSummary>().fetch_all(pool).await?;
    Ok(rows)
}
