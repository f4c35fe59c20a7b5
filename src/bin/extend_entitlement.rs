//! One-off maintenance tool: reset an order's media entitlements to expire
//! 48 hours from now. Last write wins; there are no guardrails beyond
//! reporting how many rows were touched.

use clap::Parser;
use uuid::Uuid;

use storefront::config::Config;
use storefront::db::handlers::entitlements::Entitlements;

#[derive(Parser, Debug)]
#[command(about = "Reset an order's entitlement expiry to now + 48h")]
struct Args {
    /// The order whose entitlements get the new expiry
    order_id: Uuid,

    /// Path to configuration file
    #[arg(short = 'f', long, env = "STOREFRONT_CONFIG", default_value = "config.yaml")]
    config: String,

    /// Hours from now for the new expiry
    #[arg(long, default_value_t = 48)]
    hours: i64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    storefront::telemetry::init_telemetry()?;

    let args = Args::parse();
    let config = Config::load(&storefront::config::Args {
        config: args.config.clone(),
        validate: false,
    })?;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(1)
        .connect(&config.database.url)
        .await?;

    let mut conn = pool.acquire().await?;
    let touched = Entitlements::new(&mut conn).extend_expiry(args.order_id, args.hours).await?;

    println!("Updated {touched} entitlement(s) for order {}", args.order_id);

    Ok(())
}
