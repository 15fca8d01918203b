//! Command-line front end for `lso-pack`.

pub mod cli;
