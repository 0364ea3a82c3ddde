use clap::Parser;
use colored::*;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use filterstream::auth::bearer_headers;
use filterstream::cli::Args;
use filterstream::config::Config;
use filterstream::error::Error;
use filterstream::rules::RuleManager;
use filterstream::{runner, StreamClient};

fn print_banner(endpoint: &str, rule_count: usize) {
    println!(
        "{} {} {}",
        "filterstream".bright_cyan().bold(),
        "→".bright_black(),
        endpoint.bright_white()
    );
    println!(
        "{}",
        format!("  {} filter rule(s) configured", rule_count).bright_black()
    );
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = Config::load(&args.config)?;
    let token = config.resolve_token()?;
    let headers = bearer_headers(&token);

    print_banner(&config.general.endpoint, config.rules.len());

    if args.skip_rule_reset {
        info!("rule reset skipped by flag, keeping remote rule set as-is");
    } else {
        let manager = RuleManager::new(headers.clone(), config.general.rules_endpoint.clone());
        manager.reset_rules(&config.rules).await?;
    }

    // Ctrl-C flips the shutdown signal; the runner exits between events.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, shutting down");
            let _ = shutdown_tx.send(true);
        }
    });

    let client = StreamClient::new(
        headers,
        config.general.endpoint.clone(),
        config.query_parameters.clone(),
    );

    if let Err(e) = runner::run(&client, shutdown_rx).await {
        eprintln!("{} {}", "fatal:".bright_red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
