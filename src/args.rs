use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "press-harvest")]
#[command(about = "Harvests keyword-matching press releases from pharmaceutical news sites")]
#[command(version)]
pub struct Args {
    /// JSON configuration file (defaults to the built-in site table)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Folder for the results table, the checked-link ledger and page caches
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// WebDriver server URL (overrides WEBDRIVER_URL)
    #[arg(long)]
    pub webdriver_url: Option<String>,

    /// Only harvest this site; repeat for several
    #[arg(short, long = "site")]
    pub sites: Vec<String>,

    /// Keyword marking a page as relevant; repeat for several
    #[arg(short, long = "keyword")]
    pub keywords: Vec<String>,

    /// Hard cap on pagination clicks per site
    #[arg(long)]
    pub max_clicks: Option<usize>,

    /// Print the configured sites and exit
    #[arg(long)]
    pub list_sites: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeatable_flags() {
        let args = Args::parse_from([
            "press-harvest",
            "--site",
            "alzheon_inc",
            "--site",
            "neurim_pharma",
            "-k",
            "alzheim",
            "-k",
            "dementia",
            "--max-clicks",
            "3",
        ]);
        assert_eq!(args.sites, vec!["alzheon_inc", "neurim_pharma"]);
        assert_eq!(args.keywords, vec!["alzheim", "dementia"]);
        assert_eq!(args.max_clicks, Some(3));
        assert!(!args.list_sites);
        assert!(args.config.is_none());
    }
}
