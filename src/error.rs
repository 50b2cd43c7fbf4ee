use thiserror::Error;

/// Failure of a single fetch or renderer interaction.
///
/// These are absorbed by the discovery phases and the HTML cache; they only
/// surface to the caller when a site's base URL is unreachable on every
/// backend.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("webdriver command failed: {0}")]
    WebDriver(#[from] fantoccini::error::CmdError),

    #[error("could not start a webdriver session: {0}")]
    Session(#[from] fantoccini::error::NewSessionError),

    #[error("timed out waiting for {0}")]
    Timeout(String),

    #[error("unexpected script result: {0}")]
    Script(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that abort a site or the whole run.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to read configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("renderer could not be initialized: {0}")]
    Renderer(#[source] FetchError),

    #[error("site {site} is unreachable: {source}")]
    Unreachable {
        site: String,
        #[source]
        source: FetchError,
    },
}
