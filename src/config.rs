use crate::error::{Error, Result as CoreResult};
use crate::util::top_n::TrackerConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub history: HistoryConfig,

    #[serde(default)]
    pub top_circuits: TrackerConfig,

    #[serde(default = "default_asn_tracker", deserialize_with = "asn_tracker")]
    pub top_asns: TrackerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Snapshot interval for `--follow` mode in milliseconds. Trackers age
    /// per message, not per wall-clock tick.
    pub tick_interval_ms: u64,
}

/// Ring-buffer windows, in ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Throughput samples kept (300 @ 1 s = 5 min)
    pub throughput_capacity:  usize,
    /// RTT histograms kept
    pub rtt_capacity:         usize,
    /// Buckets per RTT histogram; shorter inputs are zero-padded, longer truncated
    pub rtt_buckets:          usize,
    /// Bandwidth-adjustment counts kept
    pub adjustments_capacity: usize,
}

// ── Defaults ─────────────────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        Self {
            general:      GeneralConfig::default(),
            history:      HistoryConfig::default(),
            top_circuits: TrackerConfig::default(),
            top_asns:     default_asn_tracker(),
        }
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self { tick_interval_ms: 1000 }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            throughput_capacity:  300,
            rtt_capacity:         60,
            rtt_buckets:          20,
            adjustments_capacity: 300,
        }
    }
}

/// ASN rankings churn less than circuits; smooth them harder and let them
/// linger longer.
fn default_asn_tracker() -> TrackerConfig {
    TrackerConfig {
        alpha_value:  0.2,
        linger_ticks: 5,
        ..TrackerConfig::default()
    }
}

/// A tracker section as written in the file. Keys left out keep the
/// section's own defaults rather than the generic tracker defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PartialTrackerConfig {
    alpha_value:       Option<f64>,
    alpha_quality:     Option<f64>,
    decay_factor:      Option<f64>,
    linger_ticks:      Option<u32>,
    top_n:             Option<usize>,
    min_visible_value: Option<f64>,
    history_len:       Option<usize>,
}

impl PartialTrackerConfig {
    fn apply(self, base: TrackerConfig) -> TrackerConfig {
        TrackerConfig {
            alpha_value:       self.alpha_value.unwrap_or(base.alpha_value),
            alpha_quality:     self.alpha_quality.unwrap_or(base.alpha_quality),
            decay_factor:      self.decay_factor.unwrap_or(base.decay_factor),
            linger_ticks:      self.linger_ticks.unwrap_or(base.linger_ticks),
            top_n:             self.top_n.unwrap_or(base.top_n),
            min_visible_value: self.min_visible_value.unwrap_or(base.min_visible_value),
            history_len:       self.history_len.unwrap_or(base.history_len),
        }
    }
}

fn asn_tracker<'de, D>(de: D) -> std::result::Result<TrackerConfig, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(PartialTrackerConfig::deserialize(de)?.apply(default_asn_tracker()))
}

// ── Validation ────────────────────────────────────────────────────────

impl Config {
    pub fn validate(&self) -> CoreResult<()> {
        let h = &self.history;
        if h.throughput_capacity == 0 {
            return Err(Error::invalid("history.throughput_capacity", "must be at least 1"));
        }
        if h.rtt_capacity == 0 {
            return Err(Error::invalid("history.rtt_capacity", "must be at least 1"));
        }
        if h.rtt_buckets == 0 {
            return Err(Error::invalid("history.rtt_buckets", "must be at least 1"));
        }
        if h.adjustments_capacity == 0 {
            return Err(Error::invalid("history.adjustments_capacity", "must be at least 1"));
        }
        self.top_circuits.validate()?;
        self.top_asns.validate()?;
        Ok(())
    }

    /// Override `top_n` on every tracker.
    pub fn with_top_n(mut self, n: usize) -> Self {
        self.top_circuits.top_n = n;
        self.top_asns.top_n     = n;
        self
    }
}

// ── Load / Save ───────────────────────────────────────────────────────

impl Config {
    /// Loads the user config, falling back to defaults when it is missing or
    /// broken.
    pub fn load() -> Self {
        match try_load() {
            Ok(c)  => c,
            Err(e) => {
                log::debug!("using default config: {:#}", e);
                // Write defaults on first run (best-effort)
                if let Err(e) = try_write_defaults() {
                    log::debug!("could not write default config: {:#}", e);
                }
                Config::default()
            }
        }
    }

    /// Strict load from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let cfg: Config = toml::from_str(&text)
            .with_context(|| format!("parsing {}", path.display()))?;
        cfg.validate()
            .with_context(|| format!("validating {}", path.display()))?;
        Ok(cfg)
    }

    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("ticktop").join("ticktop.toml"))
    }
}

fn try_load() -> Result<Config> {
    let path = Config::config_path().ok_or_else(|| anyhow::anyhow!("no config dir"))?;
    Config::load_from(&path)
}

fn try_write_defaults() -> Result<()> {
    let path = Config::config_path().ok_or_else(|| anyhow::anyhow!("no config dir"))?;
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let text = toml::to_string_pretty(&Config::default())?;
    fs::write(path, format!("# ticktop configuration\n# Generated on first run, edit freely\n\n{}", text))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        Config::default().validate().unwrap();
        assert_eq!(Config::default().top_asns.linger_ticks, 5);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "[top_circuits]\ntop_n = 3\nalpha_value = 0.5\n").unwrap();
        let cfg = Config::load_from(f.path()).unwrap();
        assert_eq!(cfg.top_circuits.top_n, 3);
        assert_eq!(cfg.top_circuits.alpha_value, 0.5);
        assert_eq!(cfg.top_circuits.decay_factor, 0.15);
        assert_eq!(cfg.history, HistoryConfig::default());
        assert_eq!(cfg.top_asns, default_asn_tracker());
    }

    #[test]
    fn partial_asn_section_keeps_asn_defaults() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "[top_asns]\ntop_n = 5\n").unwrap();
        let cfg = Config::load_from(f.path()).unwrap();
        assert_eq!(cfg.top_asns.top_n, 5);
        assert_eq!(cfg.top_asns.linger_ticks, 5);
        assert_eq!(cfg.top_asns.alpha_value, 0.2);
        assert_eq!(cfg.top_asns.decay_factor, 0.15);
        assert_eq!(cfg.top_circuits, TrackerConfig::default());
    }

    #[test]
    fn invalid_values_are_reported() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "[top_asns]\ndecay_factor = 1.5\n").unwrap();
        let err = Config::load_from(f.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("decay_factor"));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let mut cfg = Config::default();
        cfg.history.rtt_capacity = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn defaults_round_trip_through_toml() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back, Config::default());
    }

    #[test]
    fn top_n_override() {
        let cfg = Config::default().with_top_n(4);
        assert_eq!(cfg.top_circuits.top_n, 4);
        assert_eq!(cfg.top_asns.top_n, 4);
    }
}
