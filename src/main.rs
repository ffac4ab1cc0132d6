use clap::Parser;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use payhook::config::Config;
use payhook::db::{create_pool, init_db, queries, AppState};
use payhook::handlers;
use payhook::payments::RazorpayClient;

#[derive(Parser, Debug)]
#[command(name = "payhook")]
#[command(about = "Payment-link checkout and webhook reconciliation for Razorpay")]
struct Cli {
    /// Seed the database with a demo cart (useful for manual testing)
    #[arg(long)]
    seed: bool,
}

/// Seeds a small demo cart so the checkout flow can be exercised end to end
/// against a Razorpay test account. Skipped if the demo user already has items.
fn seed_demo_cart(state: &AppState) {
    let conn = state.db.get().expect("Failed to get db connection for seeding");

    let existing = queries::list_cart_items(&conn, "demo-user").expect("Failed to list cart items");
    if !existing.is_empty() {
        tracing::info!("Demo cart already seeded, skipping");
        return;
    }

    let items = [
        ("demo-item-1", "Espresso beans 1kg", 850),
        ("demo-item-2", "Pour-over kettle", 2400),
    ];
    for (item_id, name, price) in items {
        queries::put_cart_item(
            &conn,
            "demo-user",
            item_id,
            &serde_json::json!({ "name": name, "price": price, "qty": 1 }),
        )
        .expect("Failed to seed cart item");
    }

    tracing::info!("Seeded demo cart for uid demo-user ({} items)", items.len());
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "payhook=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    let db_pool = create_pool(&config.database_path).expect("Failed to create database pool");
    {
        let conn = db_pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize database");
    }

    let state = AppState {
        db: db_pool,
        razorpay: RazorpayClient::new(&config.razorpay),
        currency: config.currency.clone(),
        callback_url: config.callback_url.clone(),
    };

    if cli.seed {
        seed_demo_cart(&state);
    }

    let app = handlers::router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Payhook server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, stopping server...");
}
