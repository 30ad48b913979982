use stock_rss::config::{load_user_configs, Config, GlobalDefaults};
use stock_rss::scrapers::live::LiveSource;
use stock_rss::services::batch::BatchRunner;

use anyhow::Context;
use clap::{App, Arg, ArgMatches, SubCommand};
use env_logger::Env;
use log::{error, info, warn};
use std::sync::Arc;

fn with_common_args(app: App<'static>) -> App<'static> {
    app.arg(
        Arg::with_name("config")
            .short('c')
            .long("config")
            .value_name("FILE")
            .help("Global defaults YAML file")
            .takes_value(true)
            .default_value("configs/defaults.yaml"),
    )
    .arg(
        Arg::with_name("users-dir")
            .short('u')
            .long("users-dir")
            .value_name("DIR")
            .help("Directory holding one YAML file per user")
            .takes_value(true),
    )
    .arg(
        Arg::with_name("output-dir")
            .short('o')
            .long("output-dir")
            .value_name("DIR")
            .help("Directory the feeds are written to (overrides OUTPUT_DIR)")
            .takes_value(true),
    )
    .arg(
        Arg::with_name("user")
            .long("user")
            .value_name("USER_ID")
            .help("Only build the feed of this user")
            .takes_value(true),
    )
}

/// 命令行 > 环境变量 OUTPUT_DIR > defaults.yaml
fn load_config(matches: &ArgMatches) -> anyhow::Result<Config> {
    let path = matches.value_of("config").unwrap_or("configs/defaults.yaml");
    let defaults = GlobalDefaults::load(path).with_context(|| format!("failed to load defaults from {}", path))?;

    let mut config = Config::from_defaults(defaults)
        .with_user_filter(matches.value_of("user").map(str::to_string));

    if let Ok(dir) = std::env::var("OUTPUT_DIR") {
        if !dir.is_empty() {
            config = config.with_output_dir(dir);
        }
    }
    if let Some(dir) = matches.value_of("output-dir") {
        config = config.with_output_dir(dir);
    }
    if let Some(dir) = matches.value_of("users-dir") {
        config = config.with_users_dir(dir);
    }
    Ok(config)
}

async fn build(matches: &ArgMatches) -> anyhow::Result<bool> {
    let config = load_config(matches)?;
    info!(
        "Building feeds: users {} -> output {}",
        config.users_dir.display(),
        config.output_dir.display()
    );

    let source = LiveSource::new(&config.defaults.network).context("failed to create HTTP client")?;
    let runner = BatchRunner::new(config, Arc::new(source));
    let summary = runner.run().await.context("batch run failed")?;
    summary.log();

    Ok(summary.is_success())
}

fn check(matches: &ArgMatches) -> anyhow::Result<bool> {
    let config = load_config(matches)?;
    let set = load_user_configs(&config.users_dir, &config.defaults)
        .with_context(|| format!("failed to read {}", config.users_dir.display()))?;

    for user in &set.users {
        info!(
            "{} ({}) -> {} [{} stocks]",
            user.user_id,
            user.source.display(),
            user.feed_file_name(),
            user.stocks.len()
        );
    }
    for skipped in &set.skipped {
        warn!("[SKIP] {} -> {}", skipped.file.display(), skipped.reason);
    }

    let universe = set.ticker_universe();
    info!(
        "Ticker universe ({}): {}",
        universe.len(),
        universe.iter().map(|t| t.to_string()).collect::<Vec<_>>().join(",")
    );

    Ok(!set.users.is_empty())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // 初始化日志系统，默认日志级别为 info
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let app = App::new("stock_rss")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Per-user A-share quote and capital flow RSS feeds")
        .subcommand(with_common_args(
            SubCommand::with_name("build").about("Fetch market data and write every user's feed"),
        ))
        .subcommand(with_common_args(
            SubCommand::with_name("check").about("Validate user configs without fetching data"),
        ));

    let matches = app.get_matches();

    let ok = if let Some(matches) = matches.subcommand_matches("build") {
        build(matches).await?
    } else if let Some(matches) = matches.subcommand_matches("check") {
        check(matches)?
    } else {
        info!("No command specified. Use --help for usage information.");
        true
    };

    if !ok {
        error!("No valid user feed");
        std::process::exit(1);
    }
    Ok(())
}
