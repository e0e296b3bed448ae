use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "page-sections")]
#[command(about = "Scrapes a web page into typed, labelled sections")]
#[command(version)]
pub struct Args {
    /// Absolute http(s) URL of the page to scrape
    pub url: String,

    /// JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// WebDriver endpoint (overrides the config file and WEBDRIVER_URL)
    #[arg(long)]
    pub webdriver_url: Option<String>,

    /// Never fall back to a rendered fetch
    #[arg(long)]
    pub no_render: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,
}
