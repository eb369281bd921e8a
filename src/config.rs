use std::path::PathBuf;

/// Runtime settings, read from `INNKEEP_*` environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub bind: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub seed_file: Option<PathBuf>,
    pub metrics_port: Option<u16>,
    pub compact_threshold: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".into(),
            port: 8080,
            data_dir: PathBuf::from("./data"),
            seed_file: None,
            metrics_port: None,
            compact_threshold: 1000,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Unparseable numbers fall back to their defaults.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            bind: get("INNKEEP_BIND").unwrap_or(defaults.bind),
            port: get("INNKEEP_PORT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            data_dir: get("INNKEEP_DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir),
            seed_file: get("INNKEEP_SEED_FILE").filter(|s| !s.is_empty()).map(PathBuf::from),
            metrics_port: get("INNKEEP_METRICS_PORT").and_then(|s| s.parse().ok()),
            compact_threshold: get("INNKEEP_COMPACT_THRESHOLD")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.compact_threshold),
        }
    }

    pub fn wal_path(&self) -> PathBuf {
        self.data_dir.join("reservations.wal")
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = Config::from_lookup(lookup(&[]));
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.wal_path(), PathBuf::from("./data/reservations.wal"));
        assert_eq!(cfg.listen_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn reads_every_variable() {
        let cfg = Config::from_lookup(lookup(&[
            ("INNKEEP_BIND", "127.0.0.1"),
            ("INNKEEP_PORT", "9000"),
            ("INNKEEP_DATA_DIR", "/var/lib/innkeep"),
            ("INNKEEP_SEED_FILE", "/etc/innkeep/hotels.json"),
            ("INNKEEP_METRICS_PORT", "9100"),
            ("INNKEEP_COMPACT_THRESHOLD", "50"),
        ]));
        assert_eq!(cfg.listen_addr(), "127.0.0.1:9000");
        assert_eq!(cfg.wal_path(), PathBuf::from("/var/lib/innkeep/reservations.wal"));
        assert_eq!(cfg.seed_file, Some(PathBuf::from("/etc/innkeep/hotels.json")));
        assert_eq!(cfg.metrics_port, Some(9100));
        assert_eq!(cfg.compact_threshold, 50);
    }

    #[test]
    fn bad_numbers_fall_back() {
        let cfg = Config::from_lookup(lookup(&[
            ("INNKEEP_PORT", "eighty"),
            ("INNKEEP_METRICS_PORT", "-1"),
            ("INNKEEP_COMPACT_THRESHOLD", ""),
        ]));
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.metrics_port, None);
        assert_eq!(cfg.compact_threshold, 1000);
    }
}
