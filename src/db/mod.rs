mod from_row;
mod schema;
pub mod queries;

pub use schema::init_db;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::payments::RazorpayClient;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Application state holding the database pool and provider configuration
#[derive(Clone)]
pub struct AppState {
    /// Main database pool (orders, cart items)
    pub db: DbPool,
    /// Razorpay API client (payment links, orders, webhook verification)
    pub razorpay: RazorpayClient,
    /// ISO currency code used for all charges (e.g. INR)
    pub currency: String,
    /// Where Razorpay redirects the buyer after completing payment
    pub callback_url: Option<String>,
}

pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path);
    Pool::builder().max_size(10).build(manager)
}
