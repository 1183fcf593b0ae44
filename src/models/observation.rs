use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One scored sample for one entity in one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub key:     String,
    pub value:   f64,
    /// Secondary metric (e.g. TCP retransmit %). 0 when the source omits it.
    #[serde(default)]
    pub quality: f64,
}

impl Observation {
    pub fn new(key: impl Into<String>, value: f64, quality: f64) -> Self {
        Self { key: key.into(), value, quality }
    }
}

/// An observation as it arrives off the wire: every field may be missing or
/// carry the wrong type. Numeric keys (bare ASNs) are kept as strings; any
/// other wrong-typed field reads as missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
    #[serde(default, deserialize_with = "lenient_key")]
    pub key:     Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub value:   Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub quality: Option<f64>,
}

fn lenient<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let v = Value::deserialize(de)?;
    Ok(serde_json::from_value(v).ok())
}

fn lenient_key<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(de)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _                => None,
    })
}

/// Reads a batch item by item. Items that are not observation objects become
/// empty observations, which the trackers drop, so one bad item never costs
/// the rest of the tick.
pub fn lenient_batch<'de, D>(de: D) -> Result<Vec<RawObservation>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(de)? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).unwrap_or_default())
            .collect(),
        _ => Vec::new(),
    })
}

impl RawObservation {
    /// Validated form, or `None` for samples that should not render
    /// (no key, blank key, no value, non-finite numbers).
    pub fn into_observation(self) -> Option<Observation> {
        let key = self.key.filter(|k| !k.trim().is_empty())?;
        let value = self.value.filter(|v| v.is_finite())?;
        let quality = match self.quality {
            Some(q) if q.is_finite() => q,
            Some(_)                  => return None,
            None                     => 0.0,
        };
        Some(Observation { key, value, quality })
    }
}

/// A ranked entity as read back from a tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntity {
    pub key:     String,
    pub value:   f64,
    pub quality: f64,
}
