//! CLI definition and the train-then-trade pipeline.

use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};

use candle_core::Device;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::safetensors_store::SafetensorsStore;
use crate::domain::backtest::{self, BacktestSummary};
use crate::domain::config_validation::validate_config;
use crate::domain::error::TrendError;
use crate::domain::forecaster::Forecaster;
use crate::domain::model::ModelConfig;
use crate::domain::policy::TradingPolicy;
use crate::domain::session::{TradingConfig, run_session};
use crate::domain::training::{self, EpochMetrics, Trainer, TrainingConfig};
use crate::ports::action_port::ActionPort;
use crate::ports::config_port::ConfigPort;
use crate::ports::model_store_port::ModelStore;
use crate::ports::price_port::PricePort;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "trendtrader",
    about = "Train a transformer on daily prices and emit one trading action per testing day"
)]
pub struct Cli {
    /// Training price history
    #[arg(long, default_value = "training_data.csv")]
    pub training: PathBuf,
    /// Testing price history
    #[arg(long, default_value = "testing_data.csv")]
    pub testing: PathBuf,
    /// Where to write the actions
    #[arg(long, default_value = "output.csv")]
    pub output: PathBuf,
    /// Optional INI file overriding model, training and trading settings
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Model checkpoint; metadata is kept next to it as JSON
    #[arg(long, default_value = "stock.safetensors")]
    pub model: PathBuf,
    /// Train even if a checkpoint already exists
    #[arg(long)]
    pub retrain: bool,
    /// Also write the predicted return curve to this file
    #[arg(long)]
    pub curve: Option<PathBuf>,
}

/// What a completed run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub actions: usize,
    /// Per-epoch losses when this run trained the model, empty when it loaded one.
    pub history: Vec<EpochMetrics>,
    pub trained: bool,
    pub backtest: BacktestSummary,
}

pub fn run(cli: Cli) -> ExitCode {
    match execute(&cli) {
        Ok(summary) => {
            info!(
                actions = summary.actions,
                trained = summary.trained,
                epochs = summary.history.len(),
                output = %cli.output.display(),
                "done"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            (&e).into()
        }
    }
}

pub fn execute(cli: &Cli) -> Result<RunSummary, TrendError> {
    let config = load_config(cli.config.as_deref())?;
    validate_config(&config)?;
    let model_config = build_model_config(&config);
    let training_config = build_training_config(&config);
    let trading_config = build_trading_config(&config);

    let csv = CsvAdapter::new();
    let training_bars = csv.load_prices(&cli.training)?;
    let testing_bars = csv.load_prices(&cli.testing)?;
    info!(
        training = training_bars.len(),
        testing = testing_bars.len(),
        "loaded price histories"
    );

    let device = Device::Cpu;
    let store = SafetensorsStore::new(&cli.model);
    let trained = cli.retrain || !store.exists();

    let mut history = Vec::new();
    let mut forecaster = if trained {
        info!(checkpoint = %store.weights_path().display(), "training new model");
        let data = training::prepare(&training_bars, &model_config, &training_config, &device)?;
        let mut fitted =
            Trainer::new(training_config.clone()).fit(&model_config, &data, &store, &device)?;
        history = std::mem::take(&mut fitted.history);
        info!(
            epochs = history.len(),
            best_epoch = fitted.meta.epoch,
            best_loss = %format!("{:.6}", fitted.meta.best_loss),
            "training finished"
        );
        Forecaster::from_trained(fitted, &device)
    } else {
        info!(checkpoint = %store.weights_path().display(), "loading saved model");
        let forecaster = Forecaster::load(&store, &device)?;
        if forecaster.meta().model != model_config
            || forecaster.meta().moving_average != training_config.moving_average
        {
            warn!("checkpoint settings differ from configuration; using the checkpoint's");
        }
        forecaster
    };

    let mut policy = TradingPolicy::new(trading_config.allow_shorting);
    let outcome = run_session(
        &mut forecaster,
        &training_bars,
        &testing_bars,
        trading_config.history_len,
        &mut policy,
    )?;

    csv.write_actions(&cli.output, &outcome.actions)?;
    if let Some(path) = &cli.curve {
        csv.write_curve(path, &outcome.curve)?;
    }

    let summary = backtest::evaluate(
        &testing_bars,
        &outcome.actions,
        trading_config.allow_shorting,
    )?;
    info!(
        profit = %format!("{:.4}", summary.total_profit),
        trades = summary.trades.len(),
        wins = summary.wins(),
        win_rate = %format!("{:.2}", summary.win_rate),
        max_drawdown = %format!("{:.4}", summary.max_drawdown),
        final_holding = summary.final_holding,
        "backtest"
    );

    Ok(RunSummary {
        actions: outcome.actions.len(),
        history,
        trained,
        backtest: summary,
    })
}

/// Read the INI file when one is given, otherwise run on defaults.
pub fn load_config(path: Option<&Path>) -> Result<FileConfigAdapter, TrendError> {
    match path {
        Some(path) => {
            info!(config = %path.display(), "loading config");
            FileConfigAdapter::from_file(path)
        }
        None => Ok(FileConfigAdapter::empty()),
    }
}

fn size(config: &dyn ConfigPort, section: &str, key: &str, default: usize) -> usize {
    usize::try_from(config.get_int(section, key, default as i64)).unwrap_or(default)
}

pub fn build_model_config(config: &dyn ConfigPort) -> ModelConfig {
    let d = ModelConfig::default();
    ModelConfig {
        seq_len: size(config, "model", "seq_len", d.seq_len),
        d_k: size(config, "model", "d_k", d.d_k),
        d_v: size(config, "model", "d_v", d.d_v),
        n_heads: size(config, "model", "n_heads", d.n_heads),
        ff_dim: size(config, "model", "ff_dim", d.ff_dim),
        n_layers: size(config, "model", "n_layers", d.n_layers),
        head_hidden: size(config, "model", "head_hidden", d.head_hidden),
        dropout: config.get_double("model", "dropout", d.dropout),
    }
}

pub fn build_training_config(config: &dyn ConfigPort) -> TrainingConfig {
    let d = TrainingConfig::default();
    TrainingConfig {
        batch_size: size(config, "training", "batch_size", d.batch_size),
        epochs: size(config, "training", "epochs", d.epochs),
        learning_rate: config.get_double("training", "learning_rate", d.learning_rate),
        patience: size(config, "training", "patience", d.patience),
        seed: u64::try_from(config.get_int("training", "seed", d.seed as i64)).unwrap_or(d.seed),
        moving_average: size(config, "training", "moving_average", d.moving_average),
        val_fraction: config.get_double("training", "val_fraction", d.val_fraction),
        test_fraction: config.get_double("training", "test_fraction", d.test_fraction),
    }
}

pub fn build_trading_config(config: &dyn ConfigPort) -> TradingConfig {
    let d = TradingConfig::default();
    TradingConfig {
        history_len: size(config, "trading", "history_len", d.history_len),
        allow_shorting: config.get_bool("trading", "allow_shorting", d.allow_shorting),
    }
}
