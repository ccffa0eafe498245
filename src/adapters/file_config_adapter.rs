//! INI file configuration adapter.

use crate::domain::config_validation::parse_bool;
use crate::domain::error::TrendError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TrendError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config.load(path).map_err(|reason| TrendError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, TrendError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| TrendError::ConfigParse {
                file: "<string>".into(),
                reason,
            })?;
        Ok(Self { config })
    }

    /// A configuration with no sections, so every getter yields its default.
    pub fn empty() -> Self {
        Self { config: Ini::new() }
    }
}

impl Default for FileConfigAdapter {
    fn default() -> Self {
        Self::empty()
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_deref()
            .and_then(parse_bool)
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn reads_model_training_and_trading_sections() {
        let content = r#"
[model]
seq_len = 64
dropout = 0.2

[training]
epochs = 20
learning_rate = 0.0005

[trading]
allow_shorting = yes
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(adapter.get_int("model", "seq_len", 128), 64);
        assert_eq!(adapter.get_double("model", "dropout", 0.1), 0.2);
        assert_eq!(adapter.get_int("training", "epochs", 50), 20);
        assert_eq!(adapter.get_double("training", "learning_rate", 1e-3), 0.0005);
        assert!(adapter.get_bool("trading", "allow_shorting", false));
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let adapter = FileConfigAdapter::from_string("[model]\nseq_len = 64\n").unwrap();
        assert_eq!(adapter.get_string("model", "d_k"), None);
        assert_eq!(adapter.get_string("trading", "history_len"), None);
        assert_eq!(adapter.get_int("model", "d_k", 256), 256);
        assert_eq!(adapter.get_double("training", "val_fraction", 0.1), 0.1);
        assert!(!adapter.get_bool("trading", "allow_shorting", false));
    }

    #[test]
    fn unparsable_values_fall_back_to_defaults() {
        let adapter =
            FileConfigAdapter::from_string("[model]\nn_heads = many\ndropout = lots\n").unwrap();
        assert_eq!(adapter.get_int("model", "n_heads", 12), 12);
        assert_eq!(adapter.get_double("model", "dropout", 0.1), 0.1);
        assert_eq!(adapter.get_string("model", "n_heads"), Some("many".into()));
    }

    #[test]
    fn bool_spellings() {
        let adapter =
            FileConfigAdapter::from_string("[trading]\na = TRUE\nb = no\nc = 1\nd = maybe\n")
                .unwrap();
        assert!(adapter.get_bool("trading", "a", false));
        assert!(!adapter.get_bool("trading", "b", true));
        assert!(adapter.get_bool("trading", "c", false));
        assert!(adapter.get_bool("trading", "d", true));
    }

    #[test]
    fn empty_config_yields_defaults() {
        let adapter = FileConfigAdapter::empty();
        assert_eq!(adapter.get_int("model", "seq_len", 128), 128);
        assert_eq!(adapter.get_string("model", "seq_len"), None);
    }

    #[test]
    fn from_file_reads_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[trading]\nhistory_len = 300\n").unwrap();
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(adapter.get_int("trading", "history_len", 256), 300);
    }

    #[test]
    fn from_file_missing_is_parse_error() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        assert!(matches!(result, Err(TrendError::ConfigParse { .. })));
    }
}
