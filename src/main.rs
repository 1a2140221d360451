//! SQUADSMITH: expected-points engine and squad optimizer
//!
//! Entry point. Loads configuration, initialises structured logging,
//! reads the facts snapshot, recomputes EP for the planning horizon and
//! prints the top players per position and the optimal squad.

use anyhow::{Context, Result};
use tracing::{error, info};

use squadsmith::config::AppConfig;
use squadsmith::data::snapshot;
use squadsmith::engine::Planner;
use squadsmith::storage::json::JsonEpStore;
use squadsmith::storage::EpStore;

const BANNER: &str = r#"
  ___  ___  _   _  _   ___  ___ ___ __  __ ___ _____ _  _
 / __|/ _ \| | | |/_\ |   \/ __/ __|  \/  |_ _|_   _| || |
 \__ \ (_) | |_| / _ \| |) \__ \__ \ |\/| || |  | | | __ |
 |___/\__\_\\___/_/ \_\___/|___/___/_|  |_|___| |_| |_||_|

  Expected points · squad optimizer
  v0.1.0
"#;

fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path = AppConfig::default_path();
    let cfg = AppConfig::load(&config_path)?;

    init_logging();

    println!("{BANNER}");
    info!(
        config = %config_path,
        gw_start = cfg.plan.gw_start,
        horizon = cfg.plan.horizon,
        budget = %cfg.optimizer.budget,
        "SQUADSMITH starting up"
    );

    // -- Facts and EP store ------------------------------------------------

    let repo = snapshot::load_snapshot(&cfg.data.snapshot_path)?;
    let mut store = JsonEpStore::open(&cfg.storage.ep_path)?;
    if let Some(at) = store.computed_at() {
        info!(
            path = %store.path().display(),
            records = store.record_count(),
            computed_at = %at,
            "Previous EP snapshot found"
        );
    }

    let planner = Planner::from_config(&cfg);
    let gw_start = cfg.plan.gw_start;
    let gw_end = cfg
        .plan
        .gw_end()
        .context("[plan] horizon must cover at least one gameweek")?;

    // -- Recompute ---------------------------------------------------------

    let written = planner.recompute(&repo, &mut store, gw_start, gw_end)?;
    info!(gw_start, gw_end, records = written, "EP recomputed");

    // -- Top EP ------------------------------------------------------------

    println!("Top EP for gameweek {gw_start}:");
    for (position, top) in planner.top_ep_by_position(&repo, &store, gw_start, cfg.plan.top_limit) {
        println!("  {position}:");
        for row in top {
            println!("    {:<20} £{:>4.1}m  EP {:>5.2}", row.web_name, row.cost, row.ep);
        }
    }
    println!();

    // -- Squad -------------------------------------------------------------

    match planner.build_squad(&repo, &store, gw_start, cfg.plan.horizon, cfg.optimizer.budget) {
        Ok(plan) => {
            println!(
                "Gameweeks {}-{} (budget £{:.1}m)",
                plan.gw_start,
                gw_end,
                plan.budget
            );
            print!("{}", plan.selection);
            info!(
                ep = plan.selection.total_ep_display(),
                cost = %plan.selection.total_cost_display(),
                "Squad built"
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Squad optimization failed");
            Err(e.into())
        }
    }
}

/// Initialise the tracing subscriber.
///
/// Set `SQUADSMITH_LOG_JSON=1` for JSON output.
/// Set `RUST_LOG=squadsmith=debug` for verbose logging.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("squadsmith=info"));

    let json_logging = std::env::var("SQUADSMITH_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
