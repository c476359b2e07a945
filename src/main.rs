// main.rs - osintwing: authenticated OSINT tool dashboard and one-shot runner

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use osintwing::activity::ActivityLog;
use osintwing::adapter::Adapter;
use osintwing::auth::Session;
use osintwing::config::{AppConfig, DEFAULT_CONFIG_PATH};
use osintwing::console;
use osintwing::dashboard::{self, AppState};
use osintwing::lookups::NetworkLookups;
use osintwing::query::Query;
use osintwing::runner::{is_tool_installed, SystemRunner};
use osintwing::tools::{Backend, ToolId};
use osintwing::whois::{WhoisClient, WHOIS_PORT};

/// osintwing - OSINT lookups behind one authenticated dashboard
#[derive(Parser, Debug)]
#[command(
    name = "osintwing",
    version,
    about = "Run username, email, domain and image OSINT lookups from one place",
    long_about = r#"
Runs a fixed menu of OSINT lookups and shows the results:

  instagram         public Instagram profile summary
  maigret           username search across sites (JSON)
  sherlock          username search across sites
  holehe            email registration check
  whois             domain registration details
  social-analyzer   username search on popular social networks
  exif              EXIF metadata from an uploaded image or URL

EXAMPLES:
  osintwing --dashboard --config config.yaml
  osintwing --tool sherlock --query octocat
  osintwing --tool exif --image photo.jpg
  osintwing --hash-password 'hunter22'
"#
)]
struct Args {
    /// Serve the web dashboard
    #[arg(long, help_heading = "Dashboard")]
    dashboard: bool,

    /// Port for the dashboard (overrides config)
    #[arg(long, value_name = "PORT", help_heading = "Dashboard")]
    port: Option<u16>,

    /// Configuration file with credentials and tool settings
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: PathBuf,

    /// Run one tool from the terminal
    #[arg(short, long, value_name = "TOOL", help_heading = "One-shot")]
    tool: Option<ToolId>,

    /// Username, email or domain for the tool
    #[arg(short, long, value_name = "VALUE", help_heading = "One-shot")]
    query: Option<String>,

    /// Local image file for the exif tool
    #[arg(long, value_name = "FILE", help_heading = "One-shot", conflicts_with = "image_url")]
    image: Option<PathBuf>,

    /// Remote image URL for the exif tool
    #[arg(long, value_name = "URL", help_heading = "One-shot")]
    image_url: Option<String>,

    /// List available tools and whether their programs are installed
    #[arg(long)]
    list_tools: bool,

    /// Print a bcrypt hash for use in config.yaml and exit
    #[arg(long, value_name = "PASSWORD")]
    hash_password: Option<String>,

    /// Directory tools run in (overrides config)
    #[arg(long, value_name = "DIR")]
    workdir: Option<PathBuf>,

    /// JSONL activity log file (overrides config)
    #[arg(long, value_name = "FILE")]
    activity_log: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(password) = &args.hash_password {
        let hash = bcrypt::hash(password, bcrypt::DEFAULT_COST).context("Failed to hash password")?;
        println!("{}", hash);
        return Ok(());
    }

    if args.list_tools {
        print_tool_status();
        return Ok(());
    }

    if args.dashboard {
        let config = match AppConfig::load(&args.config) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{}", format!("[-] {:#}", e).red().bold());
                std::process::exit(1);
            }
        };
        console::print_banner(&config.title);

        if config.credentials.usernames.is_empty() {
            println!("{}", "[!] No users configured; nobody will be able to log in".yellow());
        }

        let adapter = build_adapter(&args, &config)?;
        let host = config.server.host.clone();
        let port = args.port.unwrap_or(config.server.port);
        let state = AppState::new(&config, adapter);

        dashboard::start_dashboard_server(state, &host, port).await?;
        return Ok(());
    }

    let Some(tool) = args.tool else {
        console::print_banner("Intelligence Wing");
        console::print_tool_menu();
        println!(
            "\n{}",
            "Use --dashboard to serve the web UI or --tool <TOOL> --query <VALUE> to run one lookup.".dimmed()
        );
        return Ok(());
    };

    let config = AppConfig::load_or_default(&args.config)?;
    console::print_banner(&config.title);
    let adapter = build_adapter(&args, &config)?;
    let query = one_shot_query(&args)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(tool.spec().messages.running);
    spinner.enable_steady_tick(Duration::from_millis(100));

    let outcome = adapter.invoke(&Session::local_operator(), tool, &query).await;
    spinner.finish_and_clear();

    match outcome {
        Ok(result) => {
            console::print_result(&result);
            if !result.is_success() {
                std::process::exit(1);
            }
        }
        Err(warning) => {
            console::print_warning(&warning.warning);
            std::process::exit(2);
        }
    }

    Ok(())
}

fn build_adapter(args: &Args, config: &AppConfig) -> Result<Adapter> {
    let workdir = match args.workdir.clone().or_else(|| config.workdir.clone()) {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to resolve working directory")?,
    };
    if !workdir.is_dir() {
        return Err(anyhow!("Working directory '{}' does not exist", workdir.display()));
    }

    let mut lookups = NetworkLookups::new();
    if let Some(server) = &config.whois_server {
        lookups = lookups.with_whois(WhoisClient::direct(server.clone(), WHOIS_PORT));
    }

    let activity_path = args
        .activity_log
        .clone()
        .or_else(|| config.logging.activity_log.clone());
    if let Some(path) = &activity_path {
        println!("{}", format!("[*] Activity log: {}", path.display()).dimmed());
    }

    Ok(Adapter::new(Arc::new(SystemRunner), Arc::new(lookups), workdir)
        .with_overrides(config.tool_overrides()?)
        .with_activity(ActivityLog::new(activity_path)))
}

fn one_shot_query(args: &Args) -> Result<Query> {
    if let Some(path) = &args.image {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read image {}", path.display()))?;
        let filename = path.file_name().map(|n| n.to_string_lossy().into_owned());
        return Ok(Query::Upload { bytes, filename });
    }

    if let Some(url) = &args.image_url {
        return Ok(Query::ImageUrl(url.clone()));
    }

    Ok(Query::Text(args.query.clone().unwrap_or_default()))
}

fn print_tool_status() {
    console::print_tool_menu();
    println!();
    for tool in ToolId::ALL {
        if let Backend::Process { program, .. } = tool.spec().backend {
            if is_tool_installed(program) {
                println!("  {} {}", "[+]".green(), program);
            } else {
                println!("  {} {} {}", "[-]".red(), program, "not found on PATH".dimmed());
            }
        }
    }
}
