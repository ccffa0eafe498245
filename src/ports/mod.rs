//! Port traits at the I/O seams.

pub mod action_port;
pub mod config_port;
pub mod forecast_port;
pub mod model_store_port;
pub mod price_port;
