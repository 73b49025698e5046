/// Runtime configuration: a `Default` for the zero-configuration case
/// plus a `merge` that amends fields from a parsed `toml::Value`.
///
/// Deliberately small: this runtime has no bounded mailboxes, no
/// per-resume message-process-limit, and no pluggable dispatcher, so
/// those sections are left out rather than carried as dead configuration
/// surface.
#[derive(Clone, Debug)]
pub struct Config {
    /// Number of worker threads a pool built with [`crate::Pool::from_config`]
    /// spawns.
    pub workers: usize,
    pub scheduler: SchedulerConfig,
}

#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    /// How often `Pool::run`'s supervision loop polls `mailhub.len()`, in
    /// milliseconds. 10-50ms is a reasonable range.
    pub tick_interval_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            tick_interval_ms: 20,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            workers: num_cpus::get(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl Config {
    // `Option<()>` lets us use `?` to bail out of a partially-present TOML
    // table without treating any missing section as an error.
    fn merge(&mut self, v: &toml::Value) -> Option<()> {
        let v = v.as_table()?;
        if let Some(workers) = v.get("workers").and_then(toml::Value::as_integer) {
            self.workers = workers as usize;
        }
        if let Some(scheduler) = v.get("scheduler").and_then(toml::Value::as_table) {
            if let Some(ms) = scheduler
                .get("tick_interval_ms")
                .and_then(toml::Value::as_integer)
            {
                self.scheduler.tick_interval_ms = ms as u64;
            }
        }
        None
    }
}

/// Load the default configuration, amended by an optional TOML file named
/// by the `POOL_CONF` environment variable (`config/pool.toml` if unset). A
/// missing or unparsable file is ignored and the defaults are kept.
pub fn load_config() -> Config {
    use std::env;
    use std::fs;

    let mut cfg = Config::default();

    let path = env::var("POOL_CONF").unwrap_or_else(|_| "config/pool.toml".into());
    if let Ok(contents) = fs::read_to_string(&path) {
        if let Ok(value) = contents.parse::<toml::Value>() {
            cfg.merge(&value);
        }
    }

    cfg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_overrides_only_present_fields() {
        let mut cfg = Config::default();
        let original_tick = cfg.scheduler.tick_interval_ms;
        let toml: toml::Value = "workers = 8".parse().unwrap();
        cfg.merge(&toml);
        assert_eq!(cfg.workers, 8);
        assert_eq!(cfg.scheduler.tick_interval_ms, original_tick);
    }

    #[test]
    fn merge_ignores_malformed_table() {
        let mut cfg = Config::default();
        let before = cfg.workers;
        let toml: toml::Value = "not_a_known_key = 1".parse().unwrap();
        cfg.merge(&toml);
        assert_eq!(cfg.workers, before);
    }
}
