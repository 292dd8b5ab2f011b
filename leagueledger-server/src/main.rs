use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use leagueledger_core::Database;

mod context;
mod routes;

use context::ServerContext;

#[derive(Parser, Debug, Clone)]
#[command(name = "leagueledger")]
#[command(author, version, about = "LeagueLedger - pub quiz redemption ledger and standings")]
pub struct Args {
    /// Address to which the HTTP server will bind
    #[arg(long, env = "LEAGUELEDGER_ADDR", default_value = "0.0.0.0:8000")]
    server_addr: String,

    /// Postgres connection URL.
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    #[arg(long, env = "LEAGUELEDGER_MAX_CONNECTIONS", default_value_t = 5)]
    max_connections: u32,

    /// Conditional-consume attempts per redemption before reporting contention
    #[arg(long, env = "LEAGUELEDGER_REDEEM_MAX_ATTEMPTS", default_value_t = 5)]
    pub redeem_max_attempts: u32,

    /// Only members of a team may redeem codes for it
    #[arg(
        long,
        env = "LEAGUELEDGER_REQUIRE_MEMBERSHIP",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    pub require_membership: bool,
}

fn init_tracing() {
    let filter = EnvFilter::from_default_env()
        .add_directive("leagueledger=info".parse().unwrap_or_default());
    let sub = fmt().with_env_filter(filter).finish();
    if let Err(e) = tracing::subscriber::set_global_default(sub) {
        eprintln!("Failed to set global subscriber: {e}");
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for ctrl-c: {}", e);
    }
    info!("Shutdown requested.");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();
    let args = Args::parse();
    info!(
        "LeagueLedger starting. addr={}, max_attempts={}, require_membership={}",
        args.server_addr, args.redeem_max_attempts, args.require_membership
    );

    let db = Database::new(&args.database_url, args.max_connections).await?;
    db.migrate().await?;

    let app = routes::router(ServerContext::postgres(&db, &args));
    let listener = TcpListener::bind(&args.server_addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server finished. Goodbye!");
    Ok(())
}
