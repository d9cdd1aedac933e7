//! Cron-invoked status reconciliation: recompute every non-canceled
//! game's lifecycle status from the clock and persist the ones that
//! moved. Runs once and exits; scheduling is the cron entry's job.

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use dotenv::dotenv;

use matchday::config::Config;
use matchday::db;
use matchday::games::Game;

#[derive(Parser)]
#[command(name = "update-game-statuses")]
#[command(about = "Update game statuses based on current time", long_about = None)]
struct Cli {
    /// Show what would be updated without making changes
    #[arg(long)]
    dry_run: bool,

    /// Show every inspected game with its computed window
    #[arg(long)]
    verbose: bool,
}

fn main() -> Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let now = Utc::now();

    println!("starting game status update at {}", now);

    if cli.dry_run {
        println!("dry run, no changes will be made");
    }

    let pool = db::build_connection_pool(Config::database_url())?;
    let conn = pool.get()?;

    if cli.verbose {
        let games = Game::find_active(&conn)?;
        println!("found {} games to check", games.len());

        for game in &games {
            println!("game: {} (id {})", game.title, game.id);
            println!("  stored status: {}", game.status);
            println!("  starts at: {}", game.starts_at());
            println!("  ends at: {}", game.ends_at());
            println!("  derived status: {}", game.status_at(now));
        }
    }

    let changes = Game::reconcile_all(&conn, now, !cli.dry_run)?;

    for change in &changes {
        if cli.dry_run {
            println!(
                "would update game \"{}\" from {} to {}",
                change.title, change.from, change.to
            );
        } else {
            println!(
                "updated game \"{}\" from {} to {}",
                change.title, change.from, change.to
            );
        }
    }

    if changes.is_empty() {
        println!("no games needed status updates");
    } else {
        println!("{} games changed status", changes.len());
    }

    let counts = Game::status_counts(now, &conn)?;
    println!("\ncurrent game status summary:");
    println!("  UPCOMING: {} games", counts.upcoming);
    println!("  ONGOING: {} games", counts.ongoing);
    println!("  COMPLETED: {} games", counts.completed);
    println!("  CANCELED: {} games", counts.canceled);

    Ok(())
}
