use std::{error::Error, str::FromStr};

use snafu::{whatever, ResultExt, Whatever};

/// Reads an environment variable, consulting `.env` files first.
///
/// Unlike [std::env::var], an unset variable is `Ok(None)` rather than an
/// error, so callers can layer it over defaults with `if let`.
#[track_caller]
pub fn var(key: &str) -> Result<Option<String>, Whatever> {
    match dotenvy::var(key) {
        Ok(content) => Ok(Some(content)),
        Err(dotenvy::Error::EnvVar(std::env::VarError::NotPresent)) => Ok(None),
        Err(error) => whatever!(Err(error), "failed to read {key} environment variable"),
    }
}

/// Like [var], parsing the value when it is present.
#[track_caller]
pub fn var_parsed<R>(key: &str) -> Result<Option<R>, Whatever>
where
    R: FromStr,
    R::Err: Error + Send + Sync + 'static,
{
    let Some(content) = var(key)? else {
        return Ok(None);
    };
    let parsed = content
        .trim()
        .parse()
        .with_whatever_context(|e| format!("failed to parse {key}={content:?}; {e}"))?;
    Ok(Some(parsed))
}
