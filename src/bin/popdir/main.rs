//! `popdir` moves every message from a POP3 maildrop into a local Maildir.

mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use popdir::{fetch_all, ClientBuilder, ConnectionMode, Maildir};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Configuration file [default: ~/.popdir.conf]
    config: Option<PathBuf>,

    /// Create tmp/, new/ and cur/ under the Maildir path if they are missing
    #[arg(long)]
    create: bool,

    /// More output; repeat for a wire trace
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "popdir=info",
        1 => "popdir=debug",
        _ => "popdir=trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let path = match cli.config {
        Some(path) => path,
        None => config::default_path()?,
    };
    let config = Config::load(&path)?;

    let maildir = Maildir::new(&config.maildir_path);
    if cli.create {
        maildir
            .create_dirs()
            .with_context(|| format!("creating {}", maildir.path().display()))?;
    }

    let (host, port) = config.server()?;
    let mut builder = ClientBuilder::new(host, port);
    if config.disable_tls {
        builder = builder.mode(ConnectionMode::Plaintext);
    }
    if let Some(name) = config.tls_server_name() {
        builder = builder.tls_server_name(name);
    }
    if let Some(proxy) = config.proxy_address() {
        builder = builder.proxy(proxy);
    }

    let client = builder
        .connect()
        .with_context(|| format!("connecting to {}", config.server_address))?;
    let mut session = client
        .login(&config.username, &config.password)
        .map_err(|(e, _)| e)
        .context("logging in")?;

    let summary = fetch_all(&mut session, &maildir)?;
    info!(
        "Moved {} of {} messages to {}",
        summary.delivered.len(),
        summary.messages,
        maildir.path().display()
    );

    let farewell = session.quit()?;
    info!("\"{}\"", farewell);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run(cli)
}
