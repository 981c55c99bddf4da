use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use order_client::{
    columns::render_table, links::footer, order_date_from_calendar, HttpOrderService, LocalFile,
    Notice, OrderDesk, RefreshOutcome, SortColumn, SortOrder, SubmitReport,
};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_settings, normalize_server_url, Settings};

#[derive(Parser, Debug)]
#[command(name = "uploader", about = "Purchase Order Uploader")]
struct Cli {
    /// Backend base URL, overriding config file and environment.
    #[arg(long, global = true)]
    server_url: Option<String>,
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show every stored purchase-order line item.
    List {
        #[arg(long)]
        sort: Option<SortColumn>,
        #[arg(long, requires = "sort")]
        desc: bool,
    },
    /// Upload a vendor's order CSV, then show the refreshed listing.
    Submit {
        #[arg(long)]
        vendor_name: Option<String>,
        /// Calendar date, YYYY-MM-DD.
        #[arg(long)]
        order_date: Option<NaiveDate>,
        /// CSV with Model Number, Unit Price and Quantity columns.
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long)]
        sort: Option<SortColumn>,
        #[arg(long, requires = "sort")]
        desc: bool,
    },
    /// Print the server maintenance links.
    Links,
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn sort_order(sort: Option<SortColumn>, desc: bool) -> Option<SortOrder> {
    sort.map(|column| {
        if desc {
            SortOrder::descending(column)
        } else {
            SortOrder::ascending(column)
        }
    })
}

fn drain_notices(notices: &mut broadcast::Receiver<Notice>) {
    loop {
        match notices.try_recv() {
            Ok(Notice::Success(text)) => println!("{text}"),
            Ok(Notice::Error(text)) => eprintln!("error: {text}"),
            Ok(Notice::Validation(errors)) => {
                for (field, message) in errors.iter() {
                    eprintln!("{}: {message}", field.key());
                }
            }
            Err(TryRecvError::Lagged(skipped)) => debug!(skipped, "notices lagged"),
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
}

async fn print_listing(desk: &OrderDesk, settings: &Settings) {
    let listing = desk.listing();
    let rows = match settings.display_offset() {
        Some(offset) => listing.display_rows(&offset).await,
        None => listing.display_rows(&Local).await,
    };
    println!("{}", render_table(&rows, listing.sort().await));
    println!("{}", footer(&settings.server_url));
}

async fn run_list(desk: &OrderDesk, settings: &Settings, sort: Option<SortOrder>) -> ExitCode {
    let mut notices = desk.subscribe();
    let outcome = desk.mount().await;
    desk.listing().set_sort(sort).await;
    drain_notices(&mut notices);
    print_listing(desk, settings).await;
    match outcome {
        RefreshOutcome::LoadError(_) => ExitCode::FAILURE,
        RefreshOutcome::Populated { .. } | RefreshOutcome::Superseded => ExitCode::SUCCESS,
    }
}

async fn run_submit(
    desk: &OrderDesk,
    settings: &Settings,
    vendor_name: Option<String>,
    order_date: Option<NaiveDate>,
    file: Option<PathBuf>,
    sort: Option<SortOrder>,
) -> Result<ExitCode> {
    let mut notices = desk.subscribe();
    desk.mount().await;
    desk.listing().set_sort(sort).await;

    let form = desk.form();
    if let Some(vendor_name) = vendor_name {
        form.set_vendor_name(vendor_name).await;
    }
    if let Some(date) = order_date {
        let at = match settings.display_offset() {
            Some(offset) => order_date_from_calendar(date, &offset),
            None => order_date_from_calendar(date, &Local),
        }
        .with_context(|| format!("order date {date} has no local midnight"))?;
        form.set_order_date(at).await;
    }
    if let Some(path) = file {
        form.set_file(LocalFile::Path(path)).await;
    }

    let report = desk.confirm_submit().await;
    drain_notices(&mut notices);
    match report {
        SubmitReport::Accepted { .. } => {
            print_listing(desk, settings).await;
            Ok(ExitCode::SUCCESS)
        }
        SubmitReport::Invalid(_) | SubmitReport::Rejected(_) => Ok(ExitCode::FAILURE),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut settings = load_settings(cli.config.as_deref())?;
    if let Some(server_url) = &cli.server_url {
        settings.server_url = normalize_server_url(server_url)?;
    }
    debug!(server_url = %settings.server_url, "uploader: settings resolved");

    let desk = OrderDesk::new(Arc::new(HttpOrderService::new(settings.server_url.clone())));

    match cli.command {
        Command::List { sort, desc } => Ok(run_list(&desk, &settings, sort_order(sort, desc)).await),
        Command::Submit {
            vendor_name,
            order_date,
            file,
            sort,
            desc,
        } => {
            run_submit(
                &desk,
                &settings,
                vendor_name,
                order_date,
                file,
                sort_order(sort, desc),
            )
            .await
        }
        Command::Links => {
            println!("{}", footer(&settings.server_url));
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
