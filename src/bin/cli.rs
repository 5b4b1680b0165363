use balance_ledger::{
    config::{AppConfig, CorruptDataPolicy},
    page::{App, Page, document::Content}};

use std::path::PathBuf;
use std::process::ExitCode;
use anyhow::Context;
use colored::Colorize;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[clap(version, about, propagate_version = true)]
struct Cli {
    /// Path to a TOML configuration file
    #[clap(short, long, value_parser)]
    config: Option<PathBuf>,

    /// Path to the store file, overrides the configuration
    #[clap(short, long, value_parser)]
    store: Option<PathBuf>,

    /// What to do when stored data is malformed
    #[clap(long, value_enum)]
    on_corrupt: Option<CorruptDataPolicy>,

    /// Action to perform
    #[clap(subcommand)]
    action: Subcommands,
}

#[derive(Debug, Subcommand)]
enum Subcommands {
    /// Show the balance and transaction history
    Show,
    /// Send money to someone
    Send(SendMoney),
    /// Show the transaction history only
    History
}

#[derive(Args, Debug)]
struct SendMoney {
    /// Who receives the money
    #[clap(short='t', long="to", value_parser)]
    recipient: String,

    /// How much to send
    #[clap(short='a', long, value_parser, allow_hyphen_values = true)]
    amount: String
}

fn print_page(page: &Page) {
    for alert in page.alerts() {
        eprintln!("{}", alert.bright_red());
    }
    for element in page.elements() {
        match &element.content {
            Content::Heading(text) => println!("{}", text.bold().underline()),
            Content::Text { label, text } => println!("{}{}", label, text.green()),
            Content::List { label, items } => {
                println!("{}:", label.bold());
                if items.is_empty() {
                    println!("  {}", "(none)".dimmed());
                }
                for item in items {
                    println!("  - {}", item);
                }
            },
            Content::Form { .. } => ()
        }
    }
}

fn run(args: Cli) -> anyhow::Result<ExitCode> {
    let mut config = AppConfig::read_or_default(args.config.as_deref())?;
    if let Some(path) = args.store {
        config.store.path = path;
    }
    if let Some(policy) = args.on_corrupt {
        config.store.on_corrupt = policy;
    }

    let store = config.store.open()
        .with_context(|| format!("failed to open store {}", config.store.path.display()))?;
    let policy = config.store.on_corrupt;

    let mut app = match &args.action {
        Subcommands::History => App::history_page(store, Page::history(), policy),
        _ => App::account_page(store, Page::account(), policy)
    };
    app.load().context("failed to load ledger")?;

    if let Subcommands::Send(send) = &args.action {
        app.send(&send.recipient, &send.amount).context("failed to send money")?;
    }

    print_page(app.document());
    if app.document().alerts().is_empty() {
        return Ok(ExitCode::SUCCESS);
    }
    return Ok(ExitCode::from(1));
}

fn main() -> ExitCode {
    pretty_env_logger::init();
    let args = Cli::parse();

    match run(args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {:#}", "error:".bright_red().bold(), err);
            ExitCode::FAILURE
        }
    }
}
