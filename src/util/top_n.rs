//! Smoothed Top-N ranking with linger and decay.
//!
//! Every tick the tracker receives whatever entities the source reported.
//! Present entities are smoothed toward their new sample (EWMA). Entities
//! that dropped out are kept for `linger_ticks` more ticks while their value
//! decays, so a ranking redraw fades them out instead of popping them.

use crate::error::{Error, Result};
use crate::models::observation::{Observation, RankedEntity, RawObservation};
use crate::util::ring_buffer::RingBuffer;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Tuning knobs for one tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// EWMA weight of a new primary sample, in (0, 1]. Higher = more responsive.
    pub alpha_value:       f64,
    /// EWMA weight of a new quality sample, in (0, 1].
    pub alpha_quality:     f64,
    /// Fraction of the value removed per absent tick, in [0, 1).
    pub decay_factor:      f64,
    /// Absent ticks an entity survives before eviction.
    pub linger_ticks:      u32,
    /// Maximum entities returned by `top_entities`.
    pub top_n:             usize,
    /// Lingering entities that decay below this are evicted early.
    pub min_visible_value: f64,
    /// Per-entity history of smoothed values, in ticks. 0 = disabled.
    pub history_len:       usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            alpha_value:       0.3,
            alpha_quality:     0.3,
            decay_factor:      0.15,
            linger_ticks:      3,
            top_n:             10,
            min_visible_value: 1.0,
            history_len:       0,
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.alpha_value > 0.0 && self.alpha_value <= 1.0) {
            return Err(Error::invalid("alpha_value", format!("{} is outside (0, 1]", self.alpha_value)));
        }
        if !(self.alpha_quality > 0.0 && self.alpha_quality <= 1.0) {
            return Err(Error::invalid("alpha_quality", format!("{} is outside (0, 1]", self.alpha_quality)));
        }
        if !(self.decay_factor >= 0.0 && self.decay_factor < 1.0) {
            return Err(Error::invalid("decay_factor", format!("{} is outside [0, 1)", self.decay_factor)));
        }
        if self.top_n == 0 {
            return Err(Error::invalid("top_n", "must be at least 1"));
        }
        if !self.min_visible_value.is_finite() {
            return Err(Error::invalid("min_visible_value", "must be a finite number"));
        }
        Ok(())
    }
}

/// One entity currently held by a tracker.
#[derive(Debug, Clone)]
pub struct TrackedEntity {
    pub smoothed_value:   f64,
    pub smoothed_quality: f64,
    /// Absent ticks the entity may still survive. At 0 it is on its last
    /// visible tick and goes on the next tick it is absent.
    pub linger:           u32,
    history:              Option<RingBuffer<f64>>,
}

impl TrackedEntity {
    fn seed(value: f64, quality: f64, cfg: &TrackerConfig) -> Self {
        Self {
            smoothed_value:   value,
            smoothed_quality: quality,
            linger:           cfg.linger_ticks,
            history:          history_ring(cfg.history_len),
        }
    }

    fn observe(&mut self, value: f64, quality: f64, cfg: &TrackerConfig) {
        self.smoothed_value   = ewma(self.smoothed_value, value, cfg.alpha_value);
        self.smoothed_quality = ewma(self.smoothed_quality, quality, cfg.alpha_quality);
        self.linger           = cfg.linger_ticks;
    }

    /// Ages an absent entity by one tick. Returns false once it should go.
    fn decay(&mut self, cfg: &TrackerConfig) -> bool {
        if self.linger == 0 {
            return false;
        }
        self.smoothed_value *= 1.0 - cfg.decay_factor;
        self.linger -= 1;
        self.smoothed_value >= cfg.min_visible_value
    }

    fn record_history(&mut self) {
        if let Some(h) = &mut self.history {
            h.push(self.smoothed_value);
        }
    }

    /// Smoothed values recorded while tracked, oldest first.
    pub fn history(&self) -> Option<Vec<f64>> {
        self.history.as_ref().map(|h| h.last_n(h.filled()))
    }

    pub fn is_lingering(&self, cfg: &TrackerConfig) -> bool {
        self.linger < cfg.linger_ticks
    }
}

/// `history_len == 0` turns history off.
fn history_ring(len: usize) -> Option<RingBuffer<f64>> {
    if len == 0 {
        return None;
    }
    RingBuffer::new(len, 0.0).ok()
}

fn ewma(old: f64, sample: f64, alpha: f64) -> f64 {
    (1.0 - alpha) * old + alpha * sample
}

/// Keyed Top-N cache fed once per tick.
#[derive(Debug, Clone)]
pub struct TopNTracker {
    config:   TrackerConfig,
    entities: HashMap<String, TrackedEntity>,
    ticks:    u64,
}

impl TopNTracker {
    pub fn new(config: TrackerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, entities: HashMap::new(), ticks: 0 })
    }

    /// Swap in new tuning. On error the previous configuration stays.
    pub fn configure(&mut self, config: TrackerConfig) -> Result<()> {
        config.validate()?;
        let rebuild_history = config.history_len != self.config.history_len;
        for ent in self.entities.values_mut() {
            ent.linger = ent.linger.min(config.linger_ticks);
            if rebuild_history {
                ent.history = history_ring(config.history_len);
            }
        }
        self.config = config;
        Ok(())
    }

    pub fn config(&self) -> &TrackerConfig { &self.config }

    /// Feeds one tick of observations. Later duplicates of a key win;
    /// non-finite samples are skipped.
    pub fn ingest_tick<I>(&mut self, observations: I)
    where
        I: IntoIterator<Item = Observation>,
    {
        self.ticks += 1;

        let mut incoming: HashMap<String, (f64, f64)> = HashMap::new();
        for Observation { key, value, quality } in observations {
            if key.trim().is_empty() || !value.is_finite() || !quality.is_finite() {
                debug!("dropping malformed observation for {:?}", key);
                continue;
            }
            incoming.insert(key, (value, quality));
        }

        let cfg = &self.config;
        self.entities.retain(|key, ent| {
            if incoming.contains_key(key) {
                return true;
            }
            let keep = ent.decay(cfg);
            if !keep {
                debug!("evicting {} (value {:.2})", key, ent.smoothed_value);
            }
            keep
        });

        for (key, (value, quality)) in incoming {
            self.entities
                .entry(key)
                .and_modify(|ent| ent.observe(value, quality, cfg))
                .or_insert_with(|| TrackedEntity::seed(value, quality, cfg));
        }

        for ent in self.entities.values_mut() {
            ent.record_history();
        }
    }

    /// Like `ingest_tick`, but accepts unvalidated samples and silently
    /// drops the ones missing a key or value.
    pub fn ingest_raw<I>(&mut self, raw: I)
    where
        I: IntoIterator<Item = RawObservation>,
    {
        let mut dropped = 0usize;
        let valid: Vec<Observation> = raw
            .into_iter()
            .filter_map(|r| {
                let obs = r.into_observation();
                if obs.is_none() { dropped += 1; }
                obs
            })
            .collect();
        if dropped > 0 {
            debug!("dropped {} malformed observation(s)", dropped);
        }
        self.ingest_tick(valid);
    }

    /// Up to `top_n` entities, highest smoothed value first, ties by key.
    pub fn top_entities(&self) -> Vec<RankedEntity> {
        let mut ranked: Vec<RankedEntity> = self.entities
            .iter()
            .map(|(key, ent)| RankedEntity {
                key:     key.clone(),
                value:   ent.smoothed_value,
                quality: ent.smoothed_quality,
            })
            .collect();
        ranked.sort_by(|a, b| b.value.total_cmp(&a.value).then_with(|| a.key.cmp(&b.key)));
        ranked.truncate(self.config.top_n);
        ranked
    }

    pub fn get(&self, key: &str) -> Option<&TrackedEntity> {
        self.entities.get(key)
    }

    pub fn history(&self, key: &str) -> Option<Vec<f64>> {
        self.entities.get(key).and_then(TrackedEntity::history)
    }

    pub fn len(&self) -> usize { self.entities.len() }
    pub fn is_empty(&self) -> bool { self.entities.is_empty() }

    /// Ticks ingested since creation or the last `clear`.
    pub fn ticks(&self) -> u64 { self.ticks }

    pub fn clear(&mut self) {
        self.entities.clear();
        self.ticks = 0;
    }
}
