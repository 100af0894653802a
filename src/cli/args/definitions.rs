use std::path::PathBuf;

use clap::{ArgAction, ColorChoice, Parser};

use super::options::{CacheArg, OutputFormat};
use super::styles::{cli_styles, long_version};

/// Command-line arguments accepted by the `vizion` binary.
#[derive(Parser, Debug)]
#[command(
    name = "vizion",
    version,
    long_version = long_version(),
    about = "Run one search cycle over a JSON dataset and print the resulting state",
    color = ColorChoice::Auto,
    styles = cli_styles()
)]
pub(crate) struct CliArgs {
    #[arg(
        short,
        long = "config",
        value_name = "FILE",
        env = "VIZION_CONFIG",
        action = ArgAction::Append,
        help = "Additional configuration file to merge (default: none)"
    )]
    pub(crate) config: Vec<PathBuf>,
    #[arg(
        short = 'n',
        long = "no-config",
        help = "Skip loading default configuration files (default: disabled)"
    )]
    pub(crate) no_config: bool,
    #[arg(
        short = 'd',
        long,
        value_name = "FILE",
        help = "JSON dataset with records per index (default: dataset.path)"
    )]
    pub(crate) dataset: Option<PathBuf>,
    #[arg(
        long = "initial-results",
        value_name = "FILE",
        help = "Server-rendered results used to warm the client cache (default: none)"
    )]
    pub(crate) initial_results: Option<PathBuf>,
    #[arg(
        long,
        value_enum,
        help = "Response cache exposed by the client (default: structured)"
    )]
    pub(crate) cache: Option<CacheArg>,
    #[arg(
        short = 'i',
        long,
        value_name = "NAME",
        help = "Primary index to search (default: search.index)"
    )]
    pub(crate) index: Option<String>,
    #[arg(
        short = 's',
        long = "secondary-index",
        value_name = "NAME",
        value_delimiter = ',',
        help = "Additional index queried in the same cycle, repeatable (default: none)"
    )]
    pub(crate) secondary_index: Option<Vec<String>>,
    #[arg(
        short = 'q',
        long,
        value_name = "QUERY",
        help = "Search query (default: empty)"
    )]
    pub(crate) query: Option<String>,
    #[arg(long, value_name = "N", help = "Page to show, starting at 1 (default: 1)")]
    pub(crate) page: Option<u32>,
    #[arg(
        long = "per-page",
        value_name = "N",
        help = "Hits per page (default: index default)"
    )]
    pub(crate) per_page: Option<u32>,
    #[arg(
        short = 'f',
        long,
        value_name = "ATTRIBUTE=VALUE",
        help = "Facet value to filter on, repeatable (default: none)"
    )]
    pub(crate) facet: Option<Vec<String>>,
    #[arg(
        long = "stalled-search-delay-ms",
        value_name = "MS",
        help = "Delay before an unanswered search is reported as stalled (default: 200)"
    )]
    pub(crate) stalled_search_delay_ms: Option<u64>,
    #[arg(
        long = "timeout-ms",
        value_name = "MS",
        help = "Give up when the search has not settled after this long (default: 5000)"
    )]
    pub(crate) timeout_ms: Option<u64>,
    #[arg(
        short = 'p',
        long = "print-config",
        help = "Print the resolved configuration before running (default: disabled)"
    )]
    pub(crate) print_config: bool,
    #[arg(
        long = "log-level",
        value_name = "FILTER",
        help = "Log filter written to stderr, e.g. `debug` or `vizion=trace` (default: RUST_LOG or warn)"
    )]
    pub(crate) log_level: Option<String>,
    #[arg(
        short = 'o',
        long = "format",
        value_enum,
        default_value_t = OutputFormat::Plain,
        help = "Choose how to print the result"
    )]
    pub(crate) output: OutputFormat,
}
