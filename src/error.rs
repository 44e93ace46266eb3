use reqwest::StatusCode;

/// Failure kinds for a posting run. Callers branch on the variant
/// instead of string-matching log output.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("environment variable `{0}` is not set")]
    Env(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("error occurred while generating post: {0}")]
    Generation(String),

    #[error("failed to generate a unique post after {0} attempts")]
    Exhausted(usize),

    #[error("post request returned an error: {status} {body}")]
    Rejected { status: StatusCode, body: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
