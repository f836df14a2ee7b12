mod cli;

use std::process;

use anyhow::{Result, bail};
use chrono::Local;
use clap::Parser;

use aixadv::{advisory, date, feed, output};
use cli::Cli;

#[tokio::main]
async fn main() {
    let args = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.verbosity.tracing_level_filter())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(args).await {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

async fn run(args: Cli) -> Result<()> {
    let records = match &args.file {
        Some(path) => {
            if !path.exists() {
                bail!("file not found: {}", path.display());
            }
            feed::load_file(path)?
        }
        None => feed::fetch_remote(feed::FLRT_FEED_URL, args.insecure).await?,
    };

    let today = Local::now().date_naive();
    let window = date::Window::trailing(today, i64::from(args.days));
    let advisories = advisory::select_advisories(records, window)?;

    let formatter = output::formatter(args.urls, args.json);
    let stdout = std::io::stdout();
    formatter.write_results(&advisories, &mut stdout.lock())?;

    Ok(())
}
