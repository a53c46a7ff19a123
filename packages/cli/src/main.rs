#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command line Judge Center investigation reporter.
//!
//! Logs in with the given DCI number and password, reads every
//! investigation the account can see and prints a summary. Credentials come
//! from the command line, `login_creds.toml` or a prompt; `RUST_LOG`
//! controls log output.

mod credentials;
mod report;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use judge_center_browser::http::HttpSession;
use judge_center_cli_utils::IndicatifProgress;
use judge_center_reporter::{PageConfig, Reporter};

use crate::credentials::Credentials;

/// Exit status when the site rejects the credentials.
const LOGIN_REJECTED: u8 = 2;

#[derive(Parser)]
#[command(
    name = "judge_center",
    about = "Reads investigations, witnesses and statements from the Judge Center"
)]
struct Cli {
    /// DCI number to log in with
    user_id: Option<String>,
    /// Password for the account
    password: Option<String>,
    /// TOML file with `user_id` and `password`, used when they are not given
    #[arg(long, default_value = "login_creds.toml")]
    credentials: PathBuf,
    /// Page layout file replacing the built-in one
    #[arg(long)]
    pages: Option<PathBuf>,
    /// Write the investigations to this file as JSON
    #[arg(long)]
    json: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let multi = judge_center_cli_utils::init_logger();
    let cli = Cli::parse();

    let pages = match &cli.pages {
        Some(path) => PageConfig::from_path(path)?,
        None => PageConfig::embedded(),
    };
    let credentials = Credentials::resolve(cli.user_id, cli.password, &cli.credentials)?;

    let progress = IndicatifProgress::investigations_bar(&multi, "Reading investigations");
    let mut reporter = Reporter::new(HttpSession::new()?).with_progress(progress);

    let Some(set) = reporter
        .run(&pages, &credentials.user_id, &credentials.password)
        .await?
    else {
        return Ok(ExitCode::from(LOGIN_REJECTED));
    };
    drop(reporter);

    for line in report::summary_lines(&set) {
        println!("{line}");
    }
    if let Some(path) = &cli.json {
        report::write_json(&set, path)?;
    }

    Ok(ExitCode::SUCCESS)
}
