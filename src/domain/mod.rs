//! Core domain types and logic.

pub mod action;
pub mod backtest;
pub mod config_validation;
pub mod dataset;
pub mod error;
pub mod features;
pub mod forecaster;
pub mod model;
pub mod policy;
pub mod position;
pub mod price_bar;
pub mod session;
pub mod training;
