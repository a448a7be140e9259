//! Configuration access port trait.

use crate::domain::error::SigtraderError;

/// Read-only access to sectioned key/value configuration.
///
/// Numeric getters return `default` when the key is absent and
/// `ConfigInvalid` when it is present but does not parse.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> Result<i64, SigtraderError>;
    fn get_double(&self, section: &str, key: &str, default: f64) -> Result<f64, SigtraderError>;

    fn has_key(&self, section: &str, key: &str) -> bool {
        self.get_string(section, key)
            .is_some_and(|v| !v.trim().is_empty())
    }
}
