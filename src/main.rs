use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rrs_backtest::prelude::*;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "rrs-backtest")]
#[command(about = "Relative-strength trade simulator and performance metrics", long_about = None)]
struct Cli {
    //tracing filter directive (eg info, rrs_backtest=debug)
    #[arg(long, default_value = "info", global = true)]
    log_filter: String,

    //log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    //fetch asset and benchmark bars, derive relative strength, then backtest
    Run {
        //json configuration file; flags below override it
        #[arg(long)]
        config: Option<PathBuf>,

        //directory holding <SYMBOL>_data.csv files
        #[arg(long)]
        data_dir: Option<PathBuf>,

        //asset symbol (eg SOLUSDT)
        #[arg(long)]
        symbol: Option<String>,

        //benchmark symbol (eg BTCUSDT)
        #[arg(long)]
        benchmark: Option<String>,

        #[command(flatten)]
        settings: Settings,
    },

    //backtest a single csv that already carries an indicator column
    Simulate {
        //path to csv data file
        #[arg(long)]
        data: PathBuf,

        //json configuration file; flags below override it
        #[arg(long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        settings: Settings,
    },
}

#[derive(Args)]
struct Settings {
    //initial account balance
    #[arg(long)]
    initial_balance: Option<f64>,

    //fractional fee per side (eg 0.001)
    #[arg(long)]
    fee: Option<f64>,

    //buy when indicator is above this
    #[arg(long)]
    buy_threshold: Option<f64>,

    //sell when indicator is below this
    #[arg(long)]
    sell_threshold: Option<f64>,

    //output path for equity curve csv
    #[arg(long)]
    output_equity_csv: Option<PathBuf>,

    //output path for trades csv
    #[arg(long)]
    output_trades_csv: Option<PathBuf>,

    //output path for metrics json
    #[arg(long)]
    output_metrics_json: Option<PathBuf>,
}

impl Settings {
    //applies flag overrides on top of the file configuration
    fn apply(self, config: &mut BacktestConfiguration) {
        if let Some(v) = self.initial_balance {
            config.initial_balance = v;
        }
        if let Some(v) = self.fee {
            config.fee_rate = v;
        }
        if let Some(v) = self.buy_threshold {
            config.buy_threshold = v;
        }
        if let Some(v) = self.sell_threshold {
            config.sell_threshold = v;
        }
        if self.output_equity_csv.is_some() {
            config.output_equity_csv = self.output_equity_csv;
        }
        if self.output_trades_csv.is_some() {
            config.output_trades_csv = self.output_trades_csv;
        }
        if self.output_metrics_json.is_some() {
            config.output_metrics_json = self.output_metrics_json;
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_filter, cli.log_format)?;

    match cli.command {
        Commands::Run {
            config,
            data_dir,
            symbol,
            benchmark,
            settings,
        } => {
            let mut configuration = load_configuration(config.as_ref())?;
            if let Some(dir) = data_dir {
                configuration.data_dir = dir;
            }
            if let Some(symbol) = symbol {
                configuration.symbol = symbol;
            }
            if let Some(benchmark) = benchmark {
                configuration.benchmark_symbol = benchmark;
            }
            settings.apply(&mut configuration);
            configuration.validate()?;

            run_with_provider(&configuration)
        }
        Commands::Simulate {
            data,
            config,
            settings,
        } => {
            let mut configuration = load_configuration(config.as_ref())?;
            settings.apply(&mut configuration);
            configuration.validate()?;

            run_simulation(&data, &configuration)
        }
    }
}

fn init_tracing(filter: &str, format: LogFormat) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_new(filter)
        .context(format!("invalid log filter: {}", filter))?;

    if format == LogFormat::Json {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .json()
            .init();
        return Ok(());
    }

    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    Ok(())
}

fn load_configuration(path: Option<&PathBuf>) -> Result<BacktestConfiguration> {
    match path {
        Some(path) => BacktestConfiguration::from_json_file(path)
            .context(format!("Failed to load configuration from {:?}", path)),
        None => Ok(BacktestConfiguration::default()),
    }
}

fn run_with_provider(configuration: &BacktestConfiguration) -> Result<()> {
    let provider = CsvDataProvider::new(configuration.data_dir.clone());
    let strategy = configuration.signal_generator()?;
    log_thresholds(&strategy);
    let engine = BacktestEngine::new(configuration.backtest_config())?;

    let result = engine.run_from_provider(
        &provider,
        &configuration.symbol,
        &configuration.benchmark_symbol,
        &strategy,
    )?;

    report(&result, configuration)
}

fn run_simulation(data: &Path, configuration: &BacktestConfiguration) -> Result<()> {
    let bars = load_csv(data).context(format!("Failed to load data from {:?}", data))?;
    let strategy = configuration.signal_generator()?;
    log_thresholds(&strategy);
    let engine = BacktestEngine::new(configuration.backtest_config())?;

    let result = engine.run(&bars, &strategy)?;

    report(&result, configuration)
}

fn log_thresholds(strategy: &SignalGenerator) {
    tracing::info!(
        strategy = strategy.name(),
        buy_threshold = strategy.buy_threshold(),
        sell_threshold = strategy.sell_threshold(),
        "signal thresholds"
    );
}

fn report(result: &BacktestResult, configuration: &BacktestConfiguration) -> Result<()> {
    result.summary.pretty_print_table();

    let metrics = result.report();
    for (key, value) in metrics.iter() {
        tracing::debug!(metric = key, value, "summary metric");
    }

    if let Some(position) = &result.open_position {
        tracing::info!(
            entry_price = position.entry_price,
            entry = %position.entry_timestamp,
            "position still open at end of data"
        );
    }

    if let Some(path) = &configuration.output_equity_csv {
        write_equity_csv(&result.equity_curve, path)?;
        tracing::info!(path = %path.display(), "equity curve saved");
    }

    if let Some(path) = &configuration.output_trades_csv {
        write_trades_csv(&result.trades, path)?;
        tracing::info!(path = %path.display(), "trades saved");
    }

    if let Some(path) = &configuration.output_metrics_json {
        write_metrics_json(&metrics, path)?;
        tracing::info!(path = %path.display(), "metrics saved");
    }

    Ok(())
}
