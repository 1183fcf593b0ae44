use crate::error::Result;
use crate::models::observation::{lenient_batch, RawObservation};
use serde::{Deserialize, Serialize};

/// One decoded event from the dashboard's push channel.
///
/// Wire form is a JSON object tagged by `"event"`:
/// ```json
/// {"event":"throughput","down_bps":1.2e9,"up_bps":3.4e8}
/// {"event":"top_circuits","data":[{"key":"c-17","value":9.1e7,"quality":0.4}]}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Message {
    Throughput {
        down_bps: f64,
        up_bps:   f64,
        #[serde(default)]
        shaped_down_bps: f64,
        #[serde(default)]
        shaped_up_bps:   f64,
    },
    RttHistogram {
        buckets: Vec<u32>,
    },
    BandwidthAdjustments {
        count: u32,
    },
    TopCircuits {
        #[serde(default, deserialize_with = "lenient_batch")]
        data: Vec<RawObservation>,
    },
    TopAsns {
        #[serde(default, deserialize_with = "lenient_batch")]
        data: Vec<RawObservation>,
    },
    /// A tick with nothing new: trackers age by one tick.
    Tick,
    #[serde(other)]
    Unknown,
}

impl Message {
    pub fn parse_line(line: &str) -> Result<Self> {
        Ok(serde_json::from_str(line.trim())?)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Message::Throughput { .. }           => "throughput",
            Message::RttHistogram { .. }         => "rtt_histogram",
            Message::BandwidthAdjustments { .. } => "bandwidth_adjustments",
            Message::TopCircuits { .. }          => "top_circuits",
            Message::TopAsns { .. }              => "top_asns",
            Message::Tick                        => "tick",
            Message::Unknown                     => "unknown",
        }
    }
}
