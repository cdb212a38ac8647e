//! Typed reads of the dashboard settings that only exist as env vars and
//! never as cli flags, such as `LOG_FORMAT`. A value that fails to parse is
//! an error naming the variable, so startup stops instead of quietly using
//! the default.
#![warn(
    missing_debug_implementations,
    missing_docs,
    missing_copy_implementations,
    rust_2018_idioms,
    unreachable_pub,
    non_snake_case,
    non_upper_case_globals
)]
#![allow(clippy::cognitive_complexity)]
#![deny(rustdoc::broken_intra_doc_links)]
#![doc(test(
    no_crate_inject,
    attr(deny(warnings, rust_2018_idioms), allow(dead_code, unused_variables))
))]
use anyhow::Context;

use std::{env, str};

/// `name` parsed as `T`. An unset var parses `default` instead, so a bad
/// default is caught the same way a bad value is.
/// # Examples
/// ```
/// let frmt: String = env_parser::parse_var("DASH_UNSET_LOG_FORMAT", "standard").unwrap();
/// assert_eq!(frmt, "standard");
/// ```
pub fn parse_var<T, S>(name: &str, default: S) -> Result<T, <T as str::FromStr>::Err>
where
    T: str::FromStr,
    S: ToString,
{
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse::<T>()
}

/// [`parse_var`] for startup config: the error says which variable was bad,
/// e.g. `error parsing env var LOG_FORMAT`
///
/// [`parse_var`]: crate::parse_var
pub fn parse_var_with_err<T, S>(name: &str, default: S) -> anyhow::Result<T>
where
    T: str::FromStr,
    <T as str::FromStr>::Err: std::error::Error + Send + Sync + 'static,
    S: ToString + Send,
{
    parse_var::<T, S>(name, default).with_context(|| format!("error parsing env var {name}"))
}
