//! Configuration access port trait.
//!
//! Numeric values are read as strings so that validation can tell an absent
//! key from a malformed one.

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;
}
