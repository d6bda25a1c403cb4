//! mediaflux - article/post time-series access CLI
//!
//! Main entry point for the mediaflux command-line tool.

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use mediaflux::cli::{
    ArticlesArgs, BatchArgs, Cli, Commands, ExistingIdsArgs, OutputFormat, TableArgs, TableKind,
    WindowArgs,
};
use mediaflux::flux::{Lookback, Limit};
use mediaflux::logging::init_cli_logging;
use mediaflux::table::Table;
use mediaflux::{Config, InfluxClient};
use serde::de::DeserializeOwned;
use std::io::Read;
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_cli_logging(cli.quiet, cli.verbose);

    let config = Config::load();
    let client = InfluxClient::new(&config.store);

    match &cli.command {
        Commands::Ping => cmd_ping(&cli, &client),
        Commands::WriteArticles(args) => cmd_write_articles(&cli, &client, args),
        Commands::WritePosts(args) => cmd_write_posts(&cli, &client, args),
        Commands::WriteStance(args) => cmd_write_stance(&cli, &client, args),
        Commands::Articles(args) => cmd_articles(&cli, &config, &client, args),
        Commands::Unlabeled(args) => cmd_unlabeled(&cli, &config, &client, args),
        Commands::ExistingIds(args) => cmd_existing_ids(&cli, &client, args),
        Commands::Table(args) => cmd_table(&cli, &config, &client, args),
        Commands::Config => cmd_config(&config),
    }
}

/// Read a JSON array of records from a file, or stdin when the path is "-".
fn read_batch<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let content = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read records from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read batch file {}", path.display()))?
    };
    serde_json::from_str(&content)
        .with_context(|| format!("Batch {} is not a JSON array of records", path.display()))
}

fn cmd_ping(cli: &Cli, client: &InfluxClient) -> Result<()> {
    let reachable = client.ping();
    match cli.format {
        OutputFormat::Json => {
            println!("{}", serde_json::json!({ "reachable": reachable }));
        }
        _ => {
            if reachable {
                println!("{}", "Store is reachable".green());
            } else {
                println!("{}", "Store is not reachable".red());
            }
        }
    }
    if reachable {
        Ok(())
    } else {
        std::process::exit(1);
    }
}

fn cmd_write_articles(cli: &Cli, client: &InfluxClient, args: &BatchArgs) -> Result<()> {
    let inputs = read_batch(&args.input)?;
    let written = client.write_articles(&inputs)?;
    report_written(cli, "article", inputs.len(), written);
    Ok(())
}

fn cmd_write_posts(cli: &Cli, client: &InfluxClient, args: &BatchArgs) -> Result<()> {
    let inputs = read_batch(&args.input)?;
    let written = client.write_posts(&inputs)?;
    report_written(cli, "post", inputs.len(), written);
    Ok(())
}

fn cmd_write_stance(cli: &Cli, client: &InfluxClient, args: &BatchArgs) -> Result<()> {
    let inputs = read_batch(&args.input)?;
    let written = client.write_stance_updates(&inputs)?;
    report_written(cli, "stance update", inputs.len(), written);
    Ok(())
}

fn report_written(cli: &Cli, kind: &str, input_len: usize, written: usize) {
    match cli.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({ "input": input_len, "written": written })
            );
        }
        _ => {
            let skipped = input_len - written;
            if skipped > 0 {
                println!(
                    "Wrote {written} {kind} points ({} records skipped)",
                    skipped.to_string().yellow()
                );
            } else {
                println!("Wrote {written} {kind} points");
            }
        }
    }
}

fn cmd_articles(
    cli: &Cli,
    config: &Config,
    client: &InfluxClient,
    args: &ArticlesArgs,
) -> Result<()> {
    let lookback = parse_lookback(args.lookback.as_deref(), &config.query.article_lookback)?;
    let articles = client.load_articles(&lookback)?;

    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&articles)?),
        OutputFormat::Csv => print!("{}", mediaflux::table::article_table(&articles).to_csv()),
        OutputFormat::Text => {
            for article in &articles {
                let time = article
                    .time
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{}  {}  [{}] {}",
                    time.dimmed(),
                    article.usid.bold(),
                    article.category,
                    article.title
                );
            }
            println!("{} articles", articles.len());
        }
    }
    Ok(())
}

fn cmd_unlabeled(
    cli: &Cli,
    config: &Config,
    client: &InfluxClient,
    args: &WindowArgs,
) -> Result<()> {
    let lookback = parse_lookback(args.lookback.as_deref(), &config.query.post_lookback)?;
    let limit = parse_limit(args.limit, config.query.default_limit)?;
    let posts = client.load_unlabeled_posts(&lookback, limit)?;

    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&posts)?),
        OutputFormat::Csv => print!("{}", mediaflux::table::post_table(&posts).to_csv()),
        OutputFormat::Text => {
            for post in &posts {
                println!(
                    "{}  {}  {}  {}",
                    post.reddit_id.bold(),
                    post.usid,
                    post.source,
                    post.title
                );
            }
            println!("{} unlabeled posts", posts.len());
        }
    }
    Ok(())
}

fn cmd_existing_ids(cli: &Cli, client: &InfluxClient, args: &ExistingIdsArgs) -> Result<()> {
    let lookback = Lookback::new(&args.lookback)?;
    let mut ids: Vec<String> = client
        .load_existing_post_ids(&args.usid, &lookback)?
        .into_iter()
        .collect();
    ids.sort_unstable();

    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&ids)?),
        _ => {
            for id in &ids {
                println!("{id}");
            }
        }
    }
    Ok(())
}

fn cmd_table(cli: &Cli, config: &Config, client: &InfluxClient, args: &TableArgs) -> Result<()> {
    let default_lookback = match args.kind {
        TableKind::Articles => &config.query.article_lookback,
        TableKind::Posts | TableKind::Labeled => &config.query.post_lookback,
    };
    let lookback = parse_lookback(args.lookback.as_deref(), default_lookback)?;
    let limit = parse_limit(args.limit, config.query.default_limit)?;

    let table = match args.kind {
        TableKind::Articles => client.load_article_table(&lookback, limit)?,
        TableKind::Posts => client.load_post_table(&lookback, limit)?,
        TableKind::Labeled => client.load_labeled_post_table(&lookback, limit)?,
    };
    print_table(cli, &table);
    Ok(())
}

fn print_table(cli: &Cli, table: &Table) {
    match cli.format {
        OutputFormat::Json => println!("{}", table.to_json()),
        _ => print!("{}", table.to_csv()),
    }
}

fn cmd_config(config: &Config) -> Result<()> {
    if let Some(path) = Config::user_config_path() {
        println!("# config file: {}", path.display());
    }
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

fn parse_lookback(arg: Option<&str>, default: &str) -> Result<Lookback> {
    Ok(Lookback::new(arg.unwrap_or(default))?)
}

fn parse_limit(arg: Option<i64>, default: usize) -> Result<Limit> {
    let value = arg.unwrap_or_else(|| i64::try_from(default).unwrap_or(i64::MAX));
    Ok(Limit::new(value)?)
}
