pub mod generator;
pub mod persona;
pub mod similarity;

use crate::error::Error;
use std::env;

/// Read a required configuration value from the environment. Absence is
/// startup-fatal for the caller; the error names the missing variable.
pub fn require_env(name: &str) -> Result<String, Error> {
    env::var(name).map_err(|_| Error::Env(name.to_string()))
}
