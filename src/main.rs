use clap::Parser;
use page_sections::{ScrapeResponse, Scraper, ScraperConfig};
use serde::Serialize;
use std::process::ExitCode;

mod args;
use args::Args;

/// Exit status for a rejected URL
const VALIDATION_FAILURE: u8 = 2;

#[derive(Serialize)]
struct ErrorResponse<'a> {
    error: &'a page_sections::ErrorEntry,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    env_logger::init();

    // Parse command-line arguments
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => match ScraperConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                ::log::error!("Failed to load config from {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => ScraperConfig::default(),
    };
    config.apply_env();
    if let Some(webdriver_url) = &args.webdriver_url {
        config.webdriver_url = webdriver_url.clone();
    }
    if args.no_render {
        config.render = false;
    }

    let scraper = match Scraper::new(config) {
        Ok(scraper) => scraper,
        Err(e) => {
            ::log::error!("Failed to set up scraper: {}", e);
            return ExitCode::FAILURE;
        }
    };

    ::log::info!("Starting scrape of {}", args.url);
    let start_time = std::time::Instant::now();

    match scraper.scrape(&args.url).await {
        Ok(result) => {
            ::log::info!(
                "Scrape complete in {:.2} seconds",
                start_time.elapsed().as_secs_f64()
            );
            print_json(&ScrapeResponse { result: &result }, args.pretty, ExitCode::SUCCESS)
        }
        Err(e) => {
            ::log::error!("Rejected {}: {}", args.url, e);
            let entry = e.entry();
            print_json(
                &ErrorResponse { error: &entry },
                args.pretty,
                ExitCode::from(VALIDATION_FAILURE),
            )
        }
    }
}

/// Print the value to stdout and exit with `status`, or fail if it cannot be serialized
fn print_json<T: Serialize>(value: &T, pretty: bool, status: ExitCode) -> ExitCode {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    match json {
        Ok(json) => {
            println!("{}", json);
            status
        }
        Err(e) => {
            ::log::error!("Failed to serialize output: {}", e);
            ExitCode::FAILURE
        }
    }
}
