mod commands;
mod config;
mod demo;
mod server;

use std::time::Duration;

use commands::CommandRegistry;
use config::ServerConfig;
use server::ServerState;
use tokio::io::AsyncBufReadExt;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "horde.toml".to_string());
    let config = match ServerConfig::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load {config_path}: {e}");
            std::process::exit(1);
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(
        "{} v{} starting ({} zones, {} blocks deep)",
        config.server.name,
        env!("CARGO_PKG_VERSION"),
        config.world.zone_count,
        config.world.zone_depth
    );
    match config.world.seed {
        Some(seed) => info!("Seed: {seed}"),
        None => info!("Seed: random"),
    }
    info!("Simulated players: {}", config.demo.players);

    let mut state = match ServerState::new(&config, &config_path) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to start: {e}");
            std::process::exit(1);
        }
    };
    let registry = CommandRegistry::new();

    let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(false);

    // Handle Ctrl+C
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    // Console REPL: read lines from stdin
    let (console_tx, mut console_rx) = tokio::sync::mpsc::channel::<String>(32);
    tokio::spawn(async move {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let mut lines = stdin.lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let line = line.trim().to_string();
            if !line.is_empty() && console_tx.send(line).await.is_err() {
                break;
            }
        }
    });

    // Population report, read straight from the shared tracker
    if config.server.stats_interval > 0 {
        let population = state.director.population();
        let period = Duration::from_secs(config.server.stats_interval);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;
            loop {
                interval.tick().await;
                let zones = population.zone_counts();
                let busiest = zones.iter().max_by_key(|(_, n)| *n);
                match busiest {
                    Some((zone, n)) => info!(
                        "Population: {} mobs in {} zones (busiest: zone {zone} with {n})",
                        population.total(),
                        zones.len()
                    ),
                    None => info!("Population: no live mobs"),
                }
            }
        });
    }

    let mut tick_interval = tokio::time::interval(Duration::from_millis(50));
    loop {
        tokio::select! {
            _ = tick_interval.tick() => {
                state.game_tick();
            }
            Some(line) = console_rx.recv() => {
                let result = registry.dispatch(&mut state, &line);
                for message in &result.messages {
                    if result.success {
                        info!("{message}");
                    } else {
                        warn!("{message}");
                    }
                }
                if result.should_stop {
                    break;
                }
            }
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }

    let purged = state.director.purge(&mut state.entities, None);
    info!("Despawned {purged} mobs. Server shut down.");
}
