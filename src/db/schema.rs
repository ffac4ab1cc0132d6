use rusqlite::Connection;

/// Initialize the database schema
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- Orders (one per issued payment link)
        -- total_amount is stored as decimal text in major currency units
        CREATE TABLE IF NOT EXISTS orders (
            id TEXT PRIMARY KEY,
            owner_id TEXT NOT NULL,
            items TEXT NOT NULL,
            shipping_address TEXT NOT NULL,
            total_amount TEXT NOT NULL,
            currency TEXT NOT NULL,
            payment_link_id TEXT NOT NULL,
            payment_status TEXT NOT NULL CHECK (payment_status IN ('pending', 'paid')),
            payment_id TEXT,
            created_at INTEGER NOT NULL,
            paid_at INTEGER
        );
        CREATE INDEX IF NOT EXISTS idx_orders_owner ON orders(owner_id);
        -- payment_link_id is provider-assigned and not constrained unique;
        -- duplicate rows are resolved at read time, newest order wins
        CREATE INDEX IF NOT EXISTS idx_orders_link ON orders(owner_id, payment_link_id);

        -- Cart items (cleared when the referencing order settles)
        CREATE TABLE IF NOT EXISTS cart_items (
            owner_id TEXT NOT NULL,
            item_id TEXT NOT NULL,
            data TEXT NOT NULL,
            added_at INTEGER NOT NULL,
            PRIMARY KEY (owner_id, item_id)
        );
        "#,
    )
}
