use thiserror::Error;

#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("routing api error: {0}")]
    Api(String),

    #[error("no route found between the requested points")]
    NoRoute,

    #[error("route lookup timed out")]
    Timeout,
}
