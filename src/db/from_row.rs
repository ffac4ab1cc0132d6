//! Row-to-model mapping shared by the query functions.

use rusqlite::{Connection, OptionalExtension, Params, Row};
use rust_decimal::Decimal;

use crate::models::*;

/// Map a TEXT column through `FromStr`, reporting unparseable stored
/// values as a column type error instead of panicking.
fn parse_enum<T: std::str::FromStr>(row: &Row, col: usize, col_name: &str) -> rusqlite::Result<T> {
    row.get::<_, String>(col)?.parse::<T>().map_err(|_| {
        rusqlite::Error::InvalidColumnType(col, col_name.to_string(), rusqlite::types::Type::Text)
    })
}

/// Decimal twin of [`parse_enum`] for amounts stored as text.
fn parse_decimal(row: &Row, col: usize, col_name: &str) -> rusqlite::Result<Decimal> {
    row.get::<_, String>(col)?.parse::<Decimal>().map_err(|_| {
        rusqlite::Error::InvalidColumnType(col, col_name.to_string(), rusqlite::types::Type::Text)
    })
}

/// How a model is built from one row of its `*_COLS` projection.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Run a query expected to match at most one row.
pub fn query_one<T: FromRow, P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> crate::error::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

/// Run a query and collect every matching row.
pub fn query_all<T: FromRow, P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> crate::error::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, T::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// Column lists for SELECTs, in the order the FromRow impls read them.

pub const ORDER_COLS: &str = "id, owner_id, items, shipping_address, total_amount, currency, payment_link_id, payment_status, payment_id, created_at, paid_at";

pub const CART_ITEM_COLS: &str = "owner_id, item_id, data, added_at";

impl FromRow for Order {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let items_str: String = row.get(2)?;
        let address_str: String = row.get(3)?;
        Ok(Order {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            items: serde_json::from_str(&items_str).unwrap_or_default(),
            shipping_address: serde_json::from_str(&address_str).unwrap_or_default(),
            total_amount: parse_decimal(row, 4, "total_amount")?,
            currency: row.get(5)?,
            payment_link_id: row.get(6)?,
            payment_status: parse_enum(row, 7, "payment_status")?,
            payment_id: row.get(8)?,
            created_at: row.get(9)?,
            paid_at: row.get(10)?,
        })
    }
}

impl FromRow for CartItem {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let data_str: String = row.get(2)?;
        Ok(CartItem {
            owner_id: row.get(0)?,
            item_id: row.get(1)?,
            data: serde_json::from_str(&data_str).unwrap_or_default(),
            added_at: row.get(3)?,
        })
    }
}
