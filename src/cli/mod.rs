use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use clap::{CommandFactory, Parser};

use crate::search::engine::{self, LogSearchService};
use crate::server;
use crate::store::ElasticStore;

mod args;
mod config;
mod format;

pub use args::{Cli, Commands, LogsArgs, OutputFormat, SearchArgs, ServeArgs, StoreArgs};

use config::{
    apply_logs_config_defaults, apply_search_config_defaults, apply_serve_config_defaults,
    apply_store_config_defaults, load_cli_config,
};

/// Entry point for the CLI binary.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let cli_config = load_cli_config()?;

    let mut store_args = cli.store;
    if let Some(ref config) = cli_config {
        apply_store_config_defaults(config, &mut store_args);
    }

    match cli.command {
        Some(Commands::Search(mut search_args)) => {
            if let Some(ref config) = cli_config {
                apply_search_config_defaults(config, &mut search_args);
            }

            let params = args::search_params_from_args(&search_args);

            if search_args.print_query {
                let request = params.into_request()?;
                let query = engine::plan_search(&request)?;
                serde_json::to_writer_pretty(std::io::stdout(), &query.to_json())?;
                println!();
                return Ok(());
            }

            let records = runtime()?.block_on(async {
                let service = build_service(&store_args)?;
                Ok::<_, anyhow::Error>(service.search_params(params).await?)
            })?;
            format::print_records(&records, search_args.format.unwrap_or_default())
        }
        Some(Commands::Logs(mut logs_args)) => {
            if let Some(ref config) = cli_config {
                apply_logs_config_defaults(config, &mut logs_args);
            }

            let size = logs_args.size.unwrap_or(crate::models::DEFAULT_SIZE);
            let records = runtime()?.block_on(async {
                let service = build_service(&store_args)?;
                Ok::<_, anyhow::Error>(service.get_all(size).await?)
            })?;
            format::print_records(&records, logs_args.format.unwrap_or_default())
        }
        Some(Commands::Serve(mut serve_args)) => {
            if let Some(ref config) = cli_config {
                apply_serve_config_defaults(config, &mut serve_args);
            }

            let addr: SocketAddr = serve_args.addr.parse()?;
            println!("Starting logsearch HTTP server on http://{addr}");

            runtime()?.block_on(async {
                let service = build_service(&store_args)?;
                server::run(addr, Arc::new(service)).await
            })
        }
        Some(Commands::EnsureIndex) => {
            let index = runtime()?.block_on(async {
                let store = ElasticStore::new(args::store_config_from_args(&store_args))?;
                let index = store.index().to_string();
                LogSearchService::new(Arc::new(store)).ensure_index().await?;
                Ok::<_, anyhow::Error>(index)
            })?;
            println!("Index {index} is ready");
            Ok(())
        }
        None => {
            let mut cmd = Cli::command();
            cmd.print_help()?;
            println!();
            Ok(())
        }
    }
}

fn build_service(store_args: &StoreArgs) -> Result<LogSearchService> {
    let store = ElasticStore::new(args::store_config_from_args(store_args))?;
    Ok(LogSearchService::new(Arc::new(store)))
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?)
}
