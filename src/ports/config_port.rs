//! Configuration access port.
//!
//! Getters fall back to the supplied default when a key is missing or does
//! not parse; [`ConfigPort::get_string`] lets validation see the raw value.

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;
}
