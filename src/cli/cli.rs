use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;

use crate::cli::config::{DEFAULT_CONFIG_FILE, build_config, load_config_or_default};
use crate::errors::Fr3kiError;
use crate::modules::fuzz_scan::console::print_banner;
use crate::modules::fuzz_scan::{RunSummary, run_fuzz_scan};

// logging
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fr3ki", about = "fr3ki: concurrent web content discovery fuzzer", version)]
pub struct Cli {
    /// target URL, FUZZ marks where each word goes (e.g. http://host/FUZZ)
    #[arg(short, long)]
    pub url: String,

    /// wordlist file, one entry per line
    #[arg(short, long)]
    pub wordlist: Option<PathBuf>,

    /// maximum concurrent requests (also the batch size)
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    pub threads: Option<u32>,

    /// JSON lines results file (appended)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// requests per second, 0 = unlimited
    #[arg(long, default_value_t = 0)]
    pub rate: u32,

    /// cooldown in seconds after a 429 without usable Retry-After
    #[arg(long, default_value_t = 10)]
    pub cooldown: u64,

    /// persist every response, not only interesting ones
    #[arg(long)]
    pub debug: bool,

    /// also try encoded variants of each word
    #[arg(long)]
    pub obfuscate: bool,

    /// store the first 200 characters of each body
    #[arg(long)]
    pub verbose: bool,

    /// proxy list file, one scheme://host:port per line
    #[arg(long)]
    pub proxies: Option<PathBuf>,

    /// extra request header "Name: Value" (repeatable)
    #[arg(short = 'A', long = "header")]
    pub headers: Vec<String>,

    /// YAML config file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// a 429 pauses all new requests instead of only the throttled one
    #[arg(long)]
    pub global_cooldown: bool,

    /// do not print the banner
    #[arg(long)]
    pub no_banner: bool,
}

pub async fn run_from_args<I, T>(args: I) -> Result<RunSummary, Fr3kiError>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    // initialize tracing according to log_level (ok if already initialized in tests)
    let env_filter = EnvFilter::new(cli.log_level.clone());
    let _ = tracing_subscriber::fmt().with_env_filter(env_filter).with_writer(std::io::stderr).try_init();
    info!("Starting fr3ki, log_level={}", cli.log_level);

    if !cli.no_banner {
        print_banner();
    }

    if !cli.config.exists() {
        println!("{}", "Config file not found. Using default settings.".yellow());
    }
    let file_cfg = load_config_or_default(&cli.config);
    let cfg = build_config(&cli, file_cfg);

    run_fuzz_scan(cfg).await
}

/// Run using environment args
pub async fn run() -> Result<RunSummary, Fr3kiError> {
    run_from_args(std::env::args()).await
}
