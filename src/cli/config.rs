use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::cli::args::{OutputFormat, DEFAULT_SERVE_ADDR};
use crate::cli::{LogsArgs, SearchArgs, ServeArgs, StoreArgs};

/// Top-level representation of `.logsearch/config.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub store: Option<StoreSection>,

    #[serde(default)]
    pub search: Option<SearchSection>,

    #[serde(default)]
    pub serve: Option<ServeSection>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StoreSection {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub index: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Defaults shared by `search` and `logs`.
#[derive(Debug, Default, Deserialize)]
pub struct SearchSection {
    #[serde(default)]
    pub size: Option<usize>,
    #[serde(default)]
    pub format: Option<OutputFormat>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ServeSection {
    #[serde(default)]
    pub addr: Option<String>,
}

/// Discover and load a project-local `.logsearch/config.toml` (or
/// `.logsearch/logsearch.toml`) starting from the current working
/// directory and walking up parent directories.
pub fn load_cli_config() -> Result<Option<CliConfig>> {
    let cwd = std::env::current_dir().context("failed to read current directory")?;
    let Some(path) = find_project_config(&cwd) else {
        return Ok(None);
    };

    let contents = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: CliConfig = toml::from_str(&contents)
        .with_context(|| format!("failed to parse TOML config at {}", path.display()))?;

    Ok(Some(config))
}

fn find_project_config(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);

    while let Some(current) = dir {
        let config_dir = current.join(".logsearch");
        for name in ["config.toml", "logsearch.toml"] {
            let candidate = config_dir.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        dir = current.parent();
    }

    None
}

pub fn apply_store_config_defaults(config: &CliConfig, args: &mut StoreArgs) {
    let Some(store) = &config.store else {
        return;
    };

    if args.es_url.is_none() {
        args.es_url = store.url.clone();
    }
    if args.index.is_none() {
        args.index = store.index.clone();
    }
    if args.timeout_secs.is_none() {
        args.timeout_secs = store.timeout_secs;
    }
    if args.username.is_none() {
        args.username = store.username.clone();
    }
    if args.password.is_none() {
        args.password = store.password.clone();
    }
}

pub fn apply_search_config_defaults(config: &CliConfig, args: &mut SearchArgs) {
    if let Some(search) = &config.search {
        if args.size.is_none() {
            args.size = search.size;
        }

        if args.format.is_none() {
            args.format = search.format;
        }
    }
}

pub fn apply_logs_config_defaults(config: &CliConfig, args: &mut LogsArgs) {
    if let Some(search) = &config.search {
        if args.size.is_none() {
            args.size = search.size;
        }

        if args.format.is_none() {
            args.format = search.format;
        }
    }
}

pub fn apply_serve_config_defaults(config: &CliConfig, args: &mut ServeArgs) {
    if let Some(serve) = &config.serve {
        if args.addr == DEFAULT_SERVE_ADDR {
            if let Some(addr) = &serve.addr {
                args.addr = addr.clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::tempdir;

    #[test]
    fn config_is_found_in_parent_directories() {
        let tmp = tempdir().expect("tempdir");
        let config_dir = tmp.path().join(".logsearch");
        fs::create_dir_all(&config_dir).expect("create config dir");
        fs::write(config_dir.join("logsearch.toml"), "[store]\nindex = \"audit\"\n")
            .expect("write config");

        let nested = tmp.path().join("a").join("b");
        fs::create_dir_all(&nested).expect("create nested");

        let found = find_project_config(&nested).expect("config path");
        assert_eq!(found, config_dir.join("logsearch.toml"));
    }

    #[test]
    fn flags_win_over_store_section() {
        let config: CliConfig = toml::from_str(
            r#"
[store]
url = "http://config:9200"
index = "from-config"
timeout_secs = 5
"#,
        )
        .expect("config");

        let mut args = StoreArgs {
            index: Some("from-flag".to_string()),
            ..StoreArgs::default()
        };
        apply_store_config_defaults(&config, &mut args);

        assert_eq!(args.es_url.as_deref(), Some("http://config:9200"));
        assert_eq!(args.index.as_deref(), Some("from-flag"));
        assert_eq!(args.timeout_secs, Some(5));
    }

    #[test]
    fn serve_addr_only_replaced_when_default() {
        let config: CliConfig =
            toml::from_str("[serve]\naddr = \"0.0.0.0:8080\"\n").expect("config");

        let mut args = ServeArgs {
            addr: DEFAULT_SERVE_ADDR.to_string(),
        };
        apply_serve_config_defaults(&config, &mut args);
        assert_eq!(args.addr, "0.0.0.0:8080");

        let mut args = ServeArgs {
            addr: "127.0.0.1:9000".to_string(),
        };
        apply_serve_config_defaults(&config, &mut args);
        assert_eq!(args.addr, "127.0.0.1:9000");
    }

    #[test]
    fn explicit_format_flag_wins_over_config() {
        let config: CliConfig =
            toml::from_str("[search]\nformat = \"json\"\n").expect("config");

        let cli = crate::cli::Cli::try_parse_from([
            "logsearch",
            "search",
            "timeout",
            "--format",
            "text",
        ])
        .expect("parse args");
        let Some(crate::cli::Commands::Search(mut args)) = cli.command else {
            panic!("expected search subcommand");
        };
        apply_search_config_defaults(&config, &mut args);
        assert_eq!(args.format, Some(OutputFormat::Text));

        let cli = crate::cli::Cli::try_parse_from(["logsearch", "logs"]).expect("parse args");
        let Some(crate::cli::Commands::Logs(mut args)) = cli.command else {
            panic!("expected logs subcommand");
        };
        apply_logs_config_defaults(&config, &mut args);
        assert_eq!(args.format, Some(OutputFormat::Json));
    }
}
