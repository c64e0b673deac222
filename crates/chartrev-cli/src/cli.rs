//! Command line definition

use std::path::PathBuf;

use clap::{value_parser, Arg, ArgAction, ArgGroup, Command};

/// Build the `chart-revisions` command
#[must_use]
pub fn command() -> Command {
    Command::new("chart-revisions")
        .version(crate::VERSION)
        .about("Stage chart revision suggestions after a dataset re-import")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML settings file; flags override its values"),
        )
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("SQLite database holding charts and suggestions"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(
            Command::new("suggest")
                .about("Rewrite every chart using a replaced variable and stage the results")
                .arg(
                    Arg::new("map")
                        .long("map")
                        .value_parser(value_parser!(PathBuf))
                        .help("Replacement map JSON file"),
                )
                .arg(
                    Arg::new("dataset-dir")
                        .long("dataset-dir")
                        .value_parser(value_parser!(PathBuf))
                        .help("Dataset directory; reads output/variable_replacements.json"),
                )
                .group(
                    ArgGroup::new("replacements")
                        .args(["map", "dataset-dir"])
                        .required(true),
                )
                .arg(
                    Arg::new("dataset")
                        .long("dataset")
                        .help("Dataset name used in the reason string"),
                )
                .arg(
                    Arg::new("dataset-version")
                        .long("dataset-version")
                        .help("Dataset version used in the reason string"),
                )
                .arg(
                    Arg::new("user")
                        .long("user")
                        .value_parser(value_parser!(i64))
                        .help("User id recorded as author"),
                )
                .arg(
                    Arg::new("reason")
                        .long("reason")
                        .help("Override the generated reason string"),
                )
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .action(ArgAction::SetTrue)
                        .help("Compute rewrites without writing"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the batch report as JSON"),
                ),
        )
        .subcommand(
            Command::new("conflicts")
                .about("List charts holding more than one pending or flagged suggestion")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the report as JSON"),
                ),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_is_well_formed() {
        command().debug_assert();
    }

    #[test]
    fn suggest_requires_a_replacement_source() {
        let result = command().try_get_matches_from(["chart-revisions", "suggest"]);
        assert!(result.is_err());

        let result = command().try_get_matches_from([
            "chart-revisions",
            "suggest",
            "--map",
            "a.json",
            "--dataset-dir",
            "data/wdi",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn global_flags_reach_subcommands() {
        let matches = command()
            .try_get_matches_from([
                "chart-revisions",
                "suggest",
                "--map",
                "a.json",
                "--db",
                "charts.db",
                "--dry-run",
            ])
            .unwrap();
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "suggest");
        assert_eq!(
            args.get_one::<PathBuf>("db"),
            Some(&PathBuf::from("charts.db"))
        );
        assert!(args.get_flag("dry-run"));
    }
}
