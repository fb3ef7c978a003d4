//! Argument definitions for the `cfknn` binary.
use std::path::PathBuf;

use clap::{Arg, ArgAction, Command, ValueHint};

pub fn build_cli() -> Command {
    Command::new("cfknn")
        .version(clap::crate_version!())
        .about("Neighborhood collaborative filtering: evaluate, recommend and predict")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            with_model_args(
                Command::new("evaluate")
                    .about("Measure RMSE/MAE on a hold-out split and HR@K on a leave-one-out split")
                    .arg(
                        Arg::new("config")
                            .help("Path to evaluation JSON configuration file")
                            .required(true)
                            .value_parser(clap::value_parser!(PathBuf))
                            .value_hint(ValueHint::FilePath),
                    )
                    .arg(
                        Arg::new("ratings")
                            .short('r')
                            .long("ratings")
                            .value_parser(clap::builder::NonEmptyStringValueParser::new())
                            .help(
                                "Path to the ratings file (*.csv or *.tsv). Overrides the \
                                 ratings file specified in the configuration file.",
                            )
                            .value_hint(ValueHint::FilePath),
                    )
                    .arg(
                        Arg::new("top_k")
                            .long("top-k")
                            .help("List length for the hit rate. Overrides the configuration file.")
                            .value_parser(clap::value_parser!(usize)),
                    )
                    .arg(
                        Arg::new("seed")
                            .long("seed")
                            .help("Seed for the hold-out splits.")
                            .value_parser(clap::value_parser!(u64)),
                    )
                    .arg(
                        Arg::new("no_hit_rate")
                            .long("no-hit-rate")
                            .help("Skip the leave-one-out hit-rate pass.")
                            .action(ArgAction::SetTrue),
                    )
                    .arg(
                        Arg::new("output_file")
                            .short('o')
                            .long("output")
                            .help("Path to write the JSON evaluation report.")
                            .value_parser(clap::builder::NonEmptyStringValueParser::new())
                            .value_hint(ValueHint::FilePath),
                    ),
            ),
        )
        .subcommand(
            with_model_args(
                Command::new("recommend")
                    .about("Print the top-N unrated items for a user")
                    .arg(ratings_arg())
                    .arg(user_arg())
                    .arg(
                        Arg::new("top_k")
                            .short('n')
                            .long("top-k")
                            .help("Number of items to recommend")
                            .default_value("10")
                            .value_parser(clap::value_parser!(usize)),
                    )
                    .arg(
                        Arg::new("output_file")
                            .short('o')
                            .long("output")
                            .help(
                                "Path to write recommendations (*.csv or *.tsv). \
                                 Defaults to stdout.",
                            )
                            .value_parser(clap::value_parser!(PathBuf))
                            .value_hint(ValueHint::FilePath),
                    ),
            ),
        )
        .subcommand(
            with_model_args(
                Command::new("predict")
                    .about("Print the predicted rating of one item by one user")
                    .arg(ratings_arg())
                    .arg(user_arg())
                    .arg(
                        Arg::new("item")
                            .short('i')
                            .long("item")
                            .required(true)
                            .help("Item id")
                            .value_parser(clap::value_parser!(u32)),
                    ),
            ),
        )
}

fn ratings_arg() -> Arg {
    Arg::new("ratings")
        .help("Path to the ratings file (*.csv or *.tsv) with user_id, item_id and rating columns")
        .required(true)
        .value_parser(clap::builder::NonEmptyStringValueParser::new())
        .value_hint(ValueHint::FilePath)
}

fn user_arg() -> Arg {
    Arg::new("user")
        .short('u')
        .long("user")
        .required(true)
        .help("User id")
        .value_parser(clap::value_parser!(u32))
}

fn with_model_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("k")
                .short('k')
                .long("k")
                .help("Maximum number of neighbors per prediction")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("role")
                .long("role")
                .help("Which side of a rating is the subject")
                .value_parser(["user_user", "item_item"]),
        )
        .arg(
            Arg::new("similarity")
                .long("similarity")
                .help("Similarity between subjects")
                .value_parser(["cosine", "pearson", "jaccard"]),
        )
}
