use clap::{CommandFactory, FromArgMatches, Parser};

use super::{CacheArg, CliArgs, OutputFormat};

#[test]
fn command_is_well_formed() {
    CliArgs::command().debug_assert();
}

#[test]
fn parse_cli_accepts_default_arguments() {
    let command = CliArgs::command();
    let mut matches = command.get_matches_from(vec!["vizion"]);
    let parsed = CliArgs::from_arg_matches_mut(&mut matches).expect("parses");
    assert_eq!(parsed.output, OutputFormat::Plain);
    assert!(parsed.secondary_index.is_none());
    assert!(!parsed.print_config);
}

#[test]
fn secondary_indices_accept_lists_and_repeats() {
    let parsed = CliArgs::parse_from([
        "vizion",
        "--secondary-index",
        "articles,faq",
        "-s",
        "stores",
        "--format",
        "json",
        "--cache",
        "legacy-disabled",
    ]);

    assert_eq!(
        parsed.secondary_index,
        Some(vec!["articles".to_string(), "faq".to_string(), "stores".to_string()])
    );
    assert_eq!(parsed.output, OutputFormat::Json);
    assert_eq!(parsed.cache, Some(CacheArg::LegacyDisabled));
}

#[test]
fn facets_repeat() {
    let parsed = CliArgs::parse_from(["vizion", "-f", "brand=acme", "--facet", "color=red"]);
    assert_eq!(
        parsed.facet,
        Some(vec!["brand=acme".to_string(), "color=red".to_string()])
    );
}
