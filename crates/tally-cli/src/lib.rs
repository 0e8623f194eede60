//! The `tally` command-line tool.
//!
//! Loads the dashboard's JSON datasets, narrows them with search text, a
//! query, facets and a date range, and prints the records, a group-by summary
//! or a pivot table as JSON or CSV. Filter presets live in a JSON file shared
//! across invocations.
//!
//! The binary parses a [`Cli`] and hands it to [`run`]; tests do the same with
//! an in-memory writer.

pub mod cli;
pub mod commands;
pub mod output;

pub use cli::{Cli, Commands, OutputFormat};
pub use commands::run;
