//! Configuration validation.
//!
//! Every key is optional. A present key must parse and sit inside its range;
//! the builders in [`crate::cli`] rely on this having run first.

use crate::domain::error::TrendError;
use crate::domain::model::ModelConfig;
use crate::domain::session::TradingConfig;
use crate::domain::training::TrainingConfig;
use crate::ports::config_port::ConfigPort;

const MODEL_SIZES: [&str; 7] = [
    "seq_len",
    "d_k",
    "d_v",
    "n_heads",
    "ff_dim",
    "n_layers",
    "head_hidden",
];

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), TrendError> {
    validate_model_config(config)?;
    validate_training_config(config)?;
    validate_trading_config(config)?;
    Ok(())
}

pub fn validate_model_config(config: &dyn ConfigPort) -> Result<(), TrendError> {
    for key in MODEL_SIZES {
        positive_int(config, "model", key)?;
    }
    let dropout = float_value(config, "model", "dropout")?;
    if let Some(p) = dropout {
        if !(0.0..1.0).contains(&p) {
            return Err(TrendError::invalid_config(
                "model",
                "dropout",
                "dropout must be in [0, 1)",
            ));
        }
    }
    Ok(())
}

pub fn validate_training_config(config: &dyn ConfigPort) -> Result<(), TrendError> {
    for key in ["batch_size", "epochs", "moving_average"] {
        positive_int(config, "training", key)?;
    }
    for key in ["patience", "seed"] {
        if let Some(v) = int_value(config, "training", key)? {
            if v < 0 {
                return Err(TrendError::invalid_config(
                    "training",
                    key,
                    format!("{key} must be non-negative"),
                ));
            }
        }
    }

    if let Some(lr) = float_value(config, "training", "learning_rate")? {
        if lr <= 0.0 || !lr.is_finite() {
            return Err(TrendError::invalid_config(
                "training",
                "learning_rate",
                "learning_rate must be positive",
            ));
        }
    }

    for key in ["val_fraction", "test_fraction"] {
        if let Some(f) = float_value(config, "training", key)? {
            if !(0.0..0.5).contains(&f) {
                return Err(TrendError::invalid_config(
                    "training",
                    key,
                    format!("{key} must be in [0, 0.5)"),
                ));
            }
        }
    }
    Ok(())
}

pub fn validate_trading_config(config: &dyn ConfigPort) -> Result<(), TrendError> {
    let history_len = positive_int(config, "trading", "history_len")?;

    if let Some(raw) = config.get_string("trading", "allow_shorting") {
        if parse_bool(&raw).is_none() {
            return Err(TrendError::invalid_config(
                "trading",
                "allow_shorting",
                "expected true/false, yes/no or 1/0",
            ));
        }
    }

    // unset keys still take part through their defaults
    let history_len = history_len.unwrap_or(TradingConfig::default().history_len as i64);
    let seq_len = config.get_int("model", "seq_len", ModelConfig::default().seq_len as i64);
    let moving_average = config.get_int(
        "training",
        "moving_average",
        TrainingConfig::default().moving_average as i64,
    );
    if history_len < seq_len + moving_average {
        return Err(TrendError::invalid_config(
            "trading",
            "history_len",
            format!(
                "history_len ({history_len}) must be at least seq_len + moving_average ({})",
                seq_len + moving_average
            ),
        ));
    }
    Ok(())
}

pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

fn int_value(config: &dyn ConfigPort, section: &str, key: &str) -> Result<Option<i64>, TrendError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<i64>().map(Some).map_err(|_| {
            TrendError::invalid_config(section, key, format!("expected an integer, got '{raw}'"))
        }),
    }
}

fn float_value(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<f64>, TrendError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<f64>().map(Some).map_err(|_| {
            TrendError::invalid_config(section, key, format!("expected a number, got '{raw}'"))
        }),
    }
}

fn positive_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<i64>, TrendError> {
    let value = int_value(config, section, key)?;
    if let Some(v) = value {
        if v <= 0 {
            return Err(TrendError::invalid_config(
                section,
                key,
                format!("{key} must be positive"),
            ));
        }
    }
    Ok(value)
}
