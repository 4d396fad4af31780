//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Result, WrapErr, eyre};
use pipelens_core::{AnalysisOptions, SortOrder, analyze, available_months, funnel};
use pipelens_ingest::{Ingested, IngestOptions, load_path};
use pipelens_shared::{AppConfig, FilterCriteria, init_config, load_config, load_config_from};
use tracing::info;

use crate::render;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// pipelens: recruiting-pipeline metrics from CRM exports.
#[derive(Parser)]
#[command(
    name = "pipelens",
    version,
    about = "Aggregate recruiting-pipeline exports into company metrics, funnels, and alerts.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.pipelens/pipelens.toml.
    #[arg(long, global = true, env = "PIPELENS_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Report output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Json,
    Text,
}

/// Company and month filters shared by the data commands.
#[derive(clap::Args, Debug)]
pub(crate) struct FilterArgs {
    /// Company to include (repeatable). `ALL` or nothing means every company.
    #[arg(long = "company", value_name = "NAME")]
    pub companies: Vec<String>,

    /// Month to include as YYYY-M (repeatable). `ALL` or nothing means every month.
    #[arg(long = "month", value_name = "YYYY-M")]
    pub months: Vec<String>,
}

impl FilterArgs {
    fn criteria(&self) -> Result<FilterCriteria> {
        Ok(FilterCriteria::from_tokens(&self.companies, &self.months)?)
    }
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the full analysis over a CSV export.
    Analyze {
        /// CSV export to read.
        csv: PathBuf,

        #[command(flatten)]
        filter: FilterArgs,

        /// Restrict the funnel to one company.
        #[arg(long)]
        funnel_company: Option<String>,

        /// Metrics sort preset (offers, offer-rate, recommendations,
        /// document-pass-rate, first-round-pass-rate, cycle, company).
        #[arg(long)]
        sort: Option<String>,

        /// Override the preset's sort direction.
        #[arg(long, value_enum)]
        order: Option<OrderArg>,

        /// Number of companies in the score ranking.
        #[arg(long)]
        top: Option<usize>,

        /// Output format (defaults to the config value).
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Check the schema and report data quality.
    Validate {
        /// CSV export to read.
        csv: PathBuf,

        /// Output format (defaults to the config value).
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// List the months present in the data, newest first.
    Months {
        /// CSV export to read.
        csv: PathBuf,
    },

    /// Print the recruiting funnel.
    Funnel {
        /// CSV export to read.
        csv: PathBuf,

        #[command(flatten)]
        filter: FilterArgs,

        /// Restrict the funnel to one company.
        #[arg(long)]
        funnel_company: Option<String>,

        /// Output format (defaults to the config value).
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub(crate) enum OrderArg {
    Asc,
    Desc,
}

impl From<OrderArg> for SortOrder {
    fn from(order: OrderArg) -> Self {
        match order {
            OrderArg::Asc => SortOrder::Asc,
            OrderArg::Desc => SortOrder::Desc,
        }
    }
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "pipelens=info",
        1 => "pipelens=debug",
        _ => "pipelens=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    // Logs go to stderr so reports on stdout stay machine-readable.
    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(cli.config.as_deref())?;

    match cli.command {
        Command::Analyze {
            csv,
            filter,
            funnel_company,
            sort,
            order,
            top,
            format,
        } => {
            let mut options = AnalysisOptions::from_defaults(&config.defaults)?;
            if let Some(sort) = sort {
                options.sort = sort.parse()?;
            }
            if let Some(top) = top {
                options.top_n = top;
            }
            options.order = order.map(SortOrder::from);
            options.funnel_company = funnel_company;
            cmd_analyze(&config, &csv, &filter, &options, output_format(&config, format)?)
        }
        Command::Validate { csv, format } => {
            cmd_validate(&config, &csv, output_format(&config, format)?)
        }
        Command::Months { csv } => cmd_months(&config, &csv),
        Command::Funnel {
            csv,
            filter,
            funnel_company,
            format,
        } => cmd_funnel(
            &config,
            &csv,
            &filter,
            funnel_company.as_deref(),
            output_format(&config, format)?,
        ),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(&config),
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    Ok(config)
}

/// The `--format` flag, falling back to `[defaults] format`.
fn output_format(config: &AppConfig, flag: Option<OutputFormat>) -> Result<OutputFormat> {
    match flag {
        Some(f) => Ok(f),
        None => OutputFormat::from_str(&config.defaults.format, true)
            .map_err(|e| eyre!("invalid [defaults] format '{}': {e}", config.defaults.format)),
    }
}

fn load(config: &AppConfig, csv: &Path) -> Result<Ingested> {
    load_path(csv, &IngestOptions::from(config))
        .wrap_err_with(|| format!("failed to load {}", csv.display()))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_analyze(
    config: &AppConfig,
    csv: &Path,
    filter: &FilterArgs,
    options: &AnalysisOptions,
    format: OutputFormat,
) -> Result<()> {
    let criteria = filter.criteria()?;
    let Ingested { table, .. } = load(config, csv)?;

    info!(
        path = %csv.display(),
        sort = %options.sort,
        top = options.top_n,
        "running analysis"
    );
    let analysis = analyze(&table, &criteria, options);

    match format {
        OutputFormat::Json => print_json(&analysis),
        OutputFormat::Text => {
            render::analysis(&analysis);
            Ok(())
        }
    }
}

fn cmd_validate(config: &AppConfig, csv: &Path, format: OutputFormat) -> Result<()> {
    let Ingested { table, report } = load(config, csv)?;

    match format {
        OutputFormat::Json => print_json(&report),
        OutputFormat::Text => {
            render::quality(&report, table.resolved());
            Ok(())
        }
    }
}

fn cmd_months(config: &AppConfig, csv: &Path) -> Result<()> {
    let Ingested { table, .. } = load(config, csv)?;
    for month in available_months(&table.view()) {
        println!("{month}");
    }
    Ok(())
}

fn cmd_funnel(
    config: &AppConfig,
    csv: &Path,
    filter: &FilterArgs,
    company: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let criteria = filter.criteria()?;
    let Ingested { table, .. } = load(config, csv)?;
    let view = table.view();
    let filtered = pipelens_core::filter::apply(&view, &criteria);
    let funnel = funnel::compute(&filtered, company);

    match format {
        OutputFormat::Json => print_json(&funnel),
        OutputFormat::Text => {
            render::funnel(&funnel);
            Ok(())
        }
    }
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}
