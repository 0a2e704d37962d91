pub mod cli;
pub mod config;
pub mod models;
pub mod query_ast;
pub mod query_tools;

use clap::Parser;

/// Binary entrypoint: environment, logging, configuration, then the command.
pub async fn run() -> Result<(), query_ast::QueryAstError> {
    dotenv::dotenv().ok();
    let _ = env_logger::Builder::from_default_env()
        // Warnings only unless RUST_LOG asks for more; stdout carries results
        .filter_module("sqlchain", log::LevelFilter::Warn)
        .parse_default_env()
        .is_test(false)
        .try_init();

    let args = cli::Arguments::parse();
    let mut config = config::AppConfig::load()?;
    args.apply_to(&mut config);
    log::debug!("effective config: {:?}", config);

    cli::execute(args, &config).await
}
