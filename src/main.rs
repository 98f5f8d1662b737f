use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use materials_gateway::config::{find_config_file, load_config, to_toml, write_config, Config};
use materials_gateway::models::{MaterialsResponse, RequestKind};
use materials_gateway::query::{normalize, DetailRequest};
use materials_gateway::server;
use materials_gateway::utils::{dataset_table, detail_table, summary_table};
use materials_gateway::{Gateway, MaterialsProjectClient};
use serde_json::{json, Map, Value};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Materials Gateway - Normalized search and multi-dataset detail over the Materials Project API
#[derive(Parser, Debug)]
#[command(name = "materials-gateway")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Normalized search and multi-dataset detail over the Materials Project API", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Upstream request timeout in seconds (overrides the configuration)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Show all environment variables
    #[arg(long, global = true)]
    env: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
    /// Plain text format
    Plain,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the HTTP API (default when no command is given)
    Serve {
        /// Address to bind, e.g. 0.0.0.0:8080
        #[arg(long, short)]
        bind: Option<String>,
    },

    /// Search material summaries
    #[command(alias = "s")]
    Search(SearchArgs),

    /// Fetch and merge property datasets for one material
    #[command(alias = "d")]
    Detail {
        /// Material id, e.g. mp-149
        material_id: String,

        /// Datasets to fetch (comma-separated; unknown names are ignored)
        #[arg(long, value_delimiter = ',')]
        datasets: Vec<String>,

        /// Calculation task ids; implies the tasks dataset
        #[arg(long = "task-ids", value_delimiter = ',')]
        task_ids: Vec<String>,
    },

    /// List the datasets available to detail requests
    Datasets,

    /// Show or write the configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the effective configuration as TOML (the API key is never shown)
    Show,

    /// Write a configuration file with default values
    Init {
        /// Destination (defaults to ./materials-gateway.toml)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Search filters; anything malformed is ignored the same way the HTTP API ignores it
#[derive(Args, Debug, Default)]
struct SearchArgs {
    /// Formula, e.g. Fe2O3 (comma-separated for several)
    #[arg(long, short)]
    formula: Option<String>,

    /// Chemical system, e.g. Li-Fe-O
    #[arg(long)]
    chemsys: Option<String>,

    /// Elements that must be present (comma-separated)
    #[arg(long, short)]
    elements: Option<String>,

    /// Elements that must be absent (comma-separated)
    #[arg(long)]
    exclude_elements: Option<String>,

    /// Possible species, e.g. Fe3+ (comma-separated)
    #[arg(long)]
    possible_species: Option<String>,

    /// Property coverage tags (comma-separated)
    #[arg(long)]
    has_props: Option<String>,

    #[arg(long)]
    band_gap_min: Option<f64>,
    #[arg(long)]
    band_gap_max: Option<f64>,
    #[arg(long)]
    energy_above_hull_min: Option<f64>,
    #[arg(long)]
    energy_above_hull_max: Option<f64>,
    #[arg(long)]
    formation_energy_min: Option<f64>,
    #[arg(long)]
    formation_energy_max: Option<f64>,
    #[arg(long)]
    density_min: Option<f64>,
    #[arg(long)]
    density_max: Option<f64>,
    #[arg(long)]
    volume_min: Option<f64>,
    #[arg(long)]
    volume_max: Option<f64>,
    #[arg(long)]
    total_magnetization_min: Option<f64>,
    #[arg(long)]
    total_magnetization_max: Option<f64>,

    /// Crystal system, e.g. Cubic
    #[arg(long)]
    crystal_system: Option<String>,

    /// Space group symbol, e.g. Fm-3m
    #[arg(long)]
    spacegroup_symbol: Option<String>,

    /// Restrict to stable materials (defaults to true)
    #[arg(long)]
    is_stable: Option<bool>,

    /// Restrict to theoretical (true) or experimentally observed (false) materials
    #[arg(long)]
    theoretical: Option<bool>,

    /// Sort field, e.g. band_gap
    #[arg(long)]
    sort: Option<String>,

    /// Sort order: asc or desc
    #[arg(long)]
    order: Option<String>,

    /// Page number, starting at 1
    #[arg(long, short)]
    page: Option<i64>,

    /// Results per page (clamped to 6..=60)
    #[arg(long)]
    page_size: Option<i64>,
}

impl SearchArgs {
    /// The same untyped bag the HTTP API accepts
    fn to_input(&self) -> Value {
        let mut input = Map::new();
        let mut put = |key: &str, value: Value| {
            if !value.is_null() {
                input.insert(key.to_string(), value);
            }
        };

        put("formula", json!(self.formula));
        put("chemsys", json!(self.chemsys));
        put("elements", json!(self.elements));
        put("excludeElements", json!(self.exclude_elements));
        put("possibleSpecies", json!(self.possible_species));
        put("hasProps", json!(self.has_props));
        put("bandGapMin", json!(self.band_gap_min));
        put("bandGapMax", json!(self.band_gap_max));
        put("energyAboveHullMin", json!(self.energy_above_hull_min));
        put("energyAboveHullMax", json!(self.energy_above_hull_max));
        put("formationEnergyMin", json!(self.formation_energy_min));
        put("formationEnergyMax", json!(self.formation_energy_max));
        put("densityMin", json!(self.density_min));
        put("densityMax", json!(self.density_max));
        put("volumeMin", json!(self.volume_min));
        put("volumeMax", json!(self.volume_max));
        put("totalMagnetizationMin", json!(self.total_magnetization_min));
        put("totalMagnetizationMax", json!(self.total_magnetization_max));
        put("crystalSystem", json!(self.crystal_system));
        put("spacegroupSymbol", json!(self.spacegroup_symbol));
        put("isStable", json!(self.is_stable));
        put("theoretical", json!(self.theoretical));
        put("sortField", json!(self.sort));
        put("sortOrder", json!(self.order));
        put("page", json!(self.page));
        put("pageSize", json!(self.page_size));

        Value::Object(input)
    }
}

fn print_env_vars() {
    println!("Materials Gateway Environment Variables");
    println!("=======================================");
    println!();
    println!("API Keys:");
    println!("  MP_API_KEY                  Materials Project API key (required for upstream calls)");
    println!();
    println!("Upstream Settings:");
    println!("  MATERIALS_GATEWAY_UPSTREAM__BASE_URL              Catalog base URL (default: https://api.materialsproject.org/)");
    println!("  MATERIALS_GATEWAY_UPSTREAM__API_KEY               API key (takes precedence over MP_API_KEY)");
    println!("  MATERIALS_GATEWAY_UPSTREAM__TIMEOUT_SECS          Per-request timeout in seconds (default: 30)");
    println!("  MATERIALS_GATEWAY_UPSTREAM__CONNECT_TIMEOUT_SECS  Connect timeout in seconds (default: 10)");
    println!();
    println!("Server Settings:");
    println!("  MATERIALS_GATEWAY_SERVER__BIND                    Listen address (default: 127.0.0.1:3000)");
    println!();
    println!("Logging:");
    println!("  MATERIALS_GATEWAY_LOGGING__LEVEL                  Log level (default: info)");
    println!("  MATERIALS_GATEWAY_LOGGING__FORMAT                 Set to 'json' for structured logs");
    println!("  RUST_LOG                    Full tracing filter, overrides everything above");
    println!();
    println!("Example:");
    println!("  export MP_API_KEY=\"your-key-here\"");
    println!("  export MATERIALS_GATEWAY_SERVER__BIND=\"0.0.0.0:8080\"");
    std::process::exit(0);
}

/// Install the tracing subscriber; RUST_LOG wins over flags and configuration
fn init_tracing(cli: &Cli, config: &Config) {
    let level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => config.logging.level.as_str(),
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(
        |_| format!("materials_gateway={level},tower_http={level}"),
    ));

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.is_json() {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn resolve_format(format: OutputFormat) -> OutputFormat {
    if format == OutputFormat::Auto {
        if std::io::stdout().is_terminal() {
            OutputFormat::Table
        } else {
            OutputFormat::Json
        }
    } else {
        format
    }
}

fn build_gateway(config: &Config) -> Result<Arc<Gateway>> {
    let client = MaterialsProjectClient::new(&config.upstream)?;
    Ok(Arc::new(Gateway::new(Arc::new(client))))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Show environment variables and exit if requested
    if cli.env {
        print_env_vars();
    }

    // Load configuration from file if specified or found in default locations
    let config_path = cli.config.clone().or_else(find_config_file);
    let mut config = load_config(config_path.as_deref()).with_context(|| match &config_path {
        Some(path) => format!("Failed to load configuration from {}", path.display()),
        None => "Failed to load configuration".to_string(),
    })?;
    if let Some(timeout) = cli.timeout {
        config.upstream.timeout_secs = timeout;
    }

    init_tracing(&cli, &config);
    if let Some(path) = &config_path {
        tracing::info!("Using config file: {}", path.display());
    }

    let format = resolve_format(cli.output);

    match cli.command.unwrap_or(Commands::Serve { bind: None }) {
        Commands::Serve { bind } => {
            let gateway = build_gateway(&config)?;
            if gateway.catalog().check_credentials().is_err() {
                tracing::warn!("MP_API_KEY is not set; catalog requests will fail with 500");
            }
            let addr = bind.unwrap_or_else(|| config.server.bind.clone());
            server::serve(gateway, &addr)
                .await
                .with_context(|| format!("Server on {} failed", addr))?;
        }

        Commands::Search(args) => {
            let gateway = build_gateway(&config)?;
            let params = normalize(&args.to_input(), RequestKind::Search);
            let response = gateway.search(&params).await?;
            output_search(&response, format, cli.quiet)?;
        }

        Commands::Detail {
            material_id,
            datasets,
            task_ids,
        } => {
            let gateway = build_gateway(&config)?;
            let mut raw = Map::new();
            if !datasets.is_empty() {
                raw.insert("datasets".to_string(), json!(datasets));
            }
            if !task_ids.is_empty() {
                raw.insert("taskIds".to_string(), json!(task_ids));
            }
            let request = DetailRequest::parse(&material_id, &raw);
            let detail = gateway.detail(&request).await?;

            match format {
                OutputFormat::Table => println!("{}", detail_table(&detail)),
                _ => println!("{}", serde_json::to_string_pretty(&detail)?),
            }
        }

        Commands::Datasets => {
            let registry = materials_gateway::datasets::DatasetRegistry::new();
            match format {
                OutputFormat::Table => println!("{}", dataset_table(&registry)),
                OutputFormat::Plain => {
                    for descriptor in registry.all() {
                        println!("{}\t{}", descriptor.key, descriptor.path);
                    }
                }
                _ => {
                    let descriptors: Vec<_> = registry.all().collect();
                    println!("{}", serde_json::to_string_pretty(&descriptors)?);
                }
            }
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => print!("{}", to_toml(&config)?),
            ConfigAction::Init { path, force } => {
                let path = path.unwrap_or_else(|| {
                    PathBuf::from(materials_gateway::config::LOCAL_CONFIG_FILE)
                });
                if path.exists() && !force {
                    anyhow::bail!(
                        "{} already exists (use --force to overwrite)",
                        path.display()
                    );
                }
                write_config(&Config::default(), &path)?;
                if !cli.quiet {
                    eprintln!("Wrote {}", path.display());
                }
            }
        },
    }

    Ok(())
}

fn output_search(response: &MaterialsResponse, format: OutputFormat, quiet: bool) -> Result<()> {
    match format {
        OutputFormat::Table => {
            println!("{}", summary_table(&response.data));
            if !quiet {
                let meta = &response.meta;
                eprintln!(
                    "Showing {} of {} (skip {}, page size {})",
                    response.data.len(),
                    meta.total_doc,
                    meta.skip,
                    meta.limit
                );
            }
        }
        OutputFormat::Plain => {
            for material in &response.data {
                println!("{}\t{}", material.material_id, material.formula_pretty);
            }
        }
        _ => println!("{}", serde_json::to_string_pretty(response)?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use materials_gateway::models::SortOrder;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["materials-gateway"]);
        assert_eq!(cli.verbose, 0);
        assert!(!cli.quiet);
        assert_eq!(cli.output, OutputFormat::Auto);
        assert_eq!(cli.timeout, None);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::parse_from(["materials-gateway", "-v"]);
        assert_eq!(cli.verbose, 1);

        let cli = Cli::parse_from(["materials-gateway", "-vv"]);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_cli_output_format() {
        let cli = Cli::parse_from(["materials-gateway", "-o", "json", "datasets"]);
        assert_eq!(cli.output, OutputFormat::Json);
        assert!(matches!(cli.command, Some(Commands::Datasets)));
    }

    #[test]
    fn test_cli_detail_lists() {
        let cli = Cli::parse_from([
            "materials-gateway",
            "detail",
            "mp-149",
            "--datasets",
            "thermo,eos",
            "--task-ids",
            "mp-1,mp-2",
        ]);
        match cli.command {
            Some(Commands::Detail {
                material_id,
                datasets,
                task_ids,
            }) => {
                assert_eq!(material_id, "mp-149");
                assert_eq!(datasets, vec!["thermo", "eos"]);
                assert_eq!(task_ids, vec!["mp-1", "mp-2"]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_search_args_feed_normalizer() {
        let cli = Cli::parse_from([
            "materials-gateway",
            "search",
            "--formula",
            "Fe2O3",
            "--band-gap-min",
            "2.5",
            "--band-gap-max",
            "1",
            "--order",
            "desc",
            "--page-size",
            "100",
            "--is-stable",
            "false",
        ]);
        let Some(Commands::Search(args)) = cli.command else {
            panic!("expected search");
        };

        let params = normalize(&args.to_input(), RequestKind::Search);
        assert_eq!(params.formula.as_deref(), Some("Fe2O3"));
        let band_gap = params.band_gap.unwrap();
        assert_eq!((band_gap.min, band_gap.max), (Some(1.0), Some(2.5)));
        assert_eq!(params.sort_order, Some(SortOrder::Desc));
        assert_eq!(params.page_size(), 60);
        assert_eq!(params.is_stable, Some(false));
    }

    #[test]
    fn test_empty_search_args_use_defaults() {
        let params = normalize(&SearchArgs::default().to_input(), RequestKind::Search);
        assert_eq!(params.page(), 1);
        assert_eq!(params.page_size(), 18);
        assert_eq!(params.is_stable, Some(true));
    }
}
