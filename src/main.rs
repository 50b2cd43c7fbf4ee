use clap::Parser;
use press_harvest::{Harvest, HarvestConfig, HarvestError};

mod args;
use args::Args;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Parse command-line arguments
    let args = Args::parse();

    let harvest = match build(&args) {
        Ok(harvest) => harvest,
        Err(e) => {
            ::log::error!("Invalid configuration: {}", e);
            std::process::exit(2);
        }
    };

    if args.list_sites {
        print_sites(harvest.config());
        return;
    }

    println!("Note: harvesting requires a WebDriver server (e.g., ChromeDriver).");
    println!(
        "Set WEBDRIVER_URL or pass --webdriver-url if not using the default http://localhost:4444"
    );

    let start_time = std::time::Instant::now();
    match harvest.run().await {
        Ok(summary) => {
            println!("New links found:        {}", summary.new_links());
            println!("Keyword matches:        {}", summary.relevant());
            println!("Rows written this run:  {}", summary.records());
            println!("Rows in results table:  {}", summary.cumulative_records);
            ::log::info!(
                "Harvest finished in {:.2} seconds",
                start_time.elapsed().as_secs_f64()
            );
        }
        Err(e) => {
            ::log::error!("Harvest failed: {}", e);
            std::process::exit(1);
        }
    }
}

/// Layer the command line over the configuration file or the built-in defaults
fn build(args: &Args) -> Result<Harvest, HarvestError> {
    let mut harvest = match &args.config {
        Some(path) => Harvest::with_config_file(path)?,
        None => Harvest::new(),
    };

    if let Some(dir) = &args.output_dir {
        harvest = harvest.with_output_dir(dir.clone());
    }
    if let Some(url) = &args.webdriver_url {
        harvest = harvest.with_webdriver_url(url.clone());
    }
    if let Some(max_clicks) = args.max_clicks {
        harvest = harvest.with_max_clicks(max_clicks);
    }

    harvest
        .with_keywords(args.keywords.clone())
        .with_sites(&args.sites)
}

fn print_sites(config: &HarvestConfig) {
    for site in &config.sites {
        println!(
            "{:<20} {:<32} {}",
            site.name,
            site.publisher.display_name(),
            site.url
        );
    }
}
