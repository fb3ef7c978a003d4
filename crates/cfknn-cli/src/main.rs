use anyhow::Result;
use clap::ArgMatches;
use log::LevelFilter;
use std::path::PathBuf;

use cfknn_cli::cli::build_cli;
use cfknn_cli::evaluate::input::EvaluateConfig;
use cfknn_cli::evaluate::runner::{format_summary, run_evaluation};
use cfknn_cli::query::input::QueryConfig;
use cfknn_cli::query::output::{write_recommendations, write_recommendations_to_path};
use cfknn_cli::query::runner::{run_predict, run_recommend};

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("CFKNN_LOG", "error,cfknn=info"))
        .init();

    let matches = build_cli().get_matches();

    match matches.subcommand() {
        Some(("evaluate", sub_m)) => handle_evaluate(sub_m),
        Some(("recommend", sub_m)) => handle_recommend(sub_m),
        Some(("predict", sub_m)) => handle_predict(sub_m),
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

fn handle_evaluate(matches: &ArgMatches) -> Result<()> {
    let config_path = matches
        .get_one::<PathBuf>("config")
        .ok_or_else(|| anyhow::anyhow!("A configuration file is required"))?;
    log::info!("[cfknn::evaluate] Using config: {:?}", config_path);

    let config = EvaluateConfig::from_arguments(config_path, matches)?;
    match run_evaluation(&config) {
        Ok(report) => {
            println!("{}", format_summary(&report));
            Ok(())
        }
        Err(e) => {
            log::error!("Evaluation failed: {:#}", e);
            std::process::exit(1)
        }
    }
}

fn handle_recommend(matches: &ArgMatches) -> Result<()> {
    let config = QueryConfig::from_arguments(matches)?;
    let top_k = matches.get_one::<usize>("top_k").copied().unwrap_or(10);

    let recommendations = run_recommend(&config, top_k)?;
    match matches.get_one::<PathBuf>("output_file") {
        Some(path) => write_recommendations_to_path(path, config.user, &recommendations),
        None => write_recommendations(
            std::io::stdout().lock(),
            b',',
            config.user,
            &recommendations,
        ),
    }
}

fn handle_predict(matches: &ArgMatches) -> Result<()> {
    let config = QueryConfig::from_arguments(matches)?;
    let item = *matches
        .get_one::<u32>("item")
        .ok_or_else(|| anyhow::anyhow!("--item is required"))?;

    let prediction = run_predict(&config, item)?;
    println!("{}", prediction);
    Ok(())
}
