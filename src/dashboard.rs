use crate::config::Config;
use crate::error::Result;
use crate::models::message::Message;
use crate::models::observation::RankedEntity;
use crate::models::sample::{ThroughputSample, WindowStats};
use crate::util::ring_buffer::RingBuffer;
use crate::util::top_n::TopNTracker;
use log::debug;
use serde::{Deserialize, Serialize};

/// Everything one dashboard view keeps between redraws.
///
/// Owned by the view that created it; nothing here is global. Feed it with
/// [`Dashboard::handle`] and read it back through [`Dashboard::snapshot`].
#[derive(Debug, Clone)]
pub struct Dashboard {
    throughput:   RingBuffer<ThroughputSample>,
    rtt:          RingBuffer<Vec<u32>>,
    rtt_buckets:  usize,
    adjustments:  RingBuffer<u32>,
    top_circuits: TopNTracker,
    top_asns:     TopNTracker,
    handled:      u64,
    ignored:      u64,
}

/// Owned copy of a dashboard's series and rankings, ready for a renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub messages_handled:   u64,
    pub messages_ignored:   u64,
    /// Full window, oldest first; unfilled slots are zero samples.
    pub throughput:         Vec<ThroughputSample>,
    pub throughput_samples: usize,
    pub down_stats:         WindowStats,
    pub up_stats:           WindowStats,
    pub rtt_histograms:     Vec<Vec<u32>>,
    pub rtt_latest:         Vec<u32>,
    pub adjustments:        Vec<u32>,
    pub top_circuits:       Vec<RankedEntity>,
    pub top_asns:           Vec<RankedEntity>,
}

impl Dashboard {
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        let h = &config.history;
        let buckets = h.rtt_buckets;
        Ok(Self {
            throughput:   RingBuffer::new(h.throughput_capacity, ThroughputSample::default())?,
            rtt:          RingBuffer::with_factory(h.rtt_capacity, || vec![0; buckets])?,
            rtt_buckets:  buckets,
            adjustments:  RingBuffer::new(h.adjustments_capacity, 0)?,
            top_circuits: TopNTracker::new(config.top_circuits.clone())?,
            top_asns:     TopNTracker::new(config.top_asns.clone())?,
            handled:      0,
            ignored:      0,
        })
    }

    /// Routes one message to the buffer or tracker it feeds.
    pub fn handle(&mut self, message: Message) {
        match message {
            Message::Throughput { down_bps, up_bps, shaped_down_bps, shaped_up_bps } => {
                self.throughput.push(ThroughputSample { down_bps, up_bps, shaped_down_bps, shaped_up_bps });
            }
            Message::RttHistogram { mut buckets } => {
                buckets.resize(self.rtt_buckets, 0);
                self.rtt.push(buckets);
            }
            Message::BandwidthAdjustments { count } => {
                self.adjustments.push(count);
            }
            Message::TopCircuits { data } => self.top_circuits.ingest_raw(data),
            Message::TopAsns { data }     => self.top_asns.ingest_raw(data),
            Message::Tick => {
                self.top_circuits.ingest_tick(Vec::new());
                self.top_asns.ingest_tick(Vec::new());
            }
            Message::Unknown => {
                debug!("ignoring unrecognised event");
                self.ignored += 1;
                return;
            }
        }
        self.handled += 1;
    }

    /// Decodes and handles one JSON line.
    pub fn handle_line(&mut self, line: &str) -> Result<()> {
        let message = Message::parse_line(line)?;
        self.handle(message);
        Ok(())
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        let filled = self.throughput.filled();
        let recent = self.throughput.last_n(filled);
        let down: Vec<f64> = recent.iter().map(|s| s.down_bps).collect();
        let up:   Vec<f64> = recent.iter().map(|s| s.up_bps).collect();

        DashboardSnapshot {
            messages_handled:   self.handled,
            messages_ignored:   self.ignored,
            throughput:         self.throughput.to_series(),
            throughput_samples: filled,
            down_stats:         WindowStats::from_series(&down),
            up_stats:           WindowStats::from_series(&up),
            rtt_histograms:     self.rtt.to_series(),
            rtt_latest:         self.rtt.latest().clone(),
            adjustments:        self.adjustments.to_series(),
            top_circuits:       self.top_circuits.top_entities(),
            top_asns:           self.top_asns.top_entities(),
        }
    }

    pub fn throughput(&self) -> &RingBuffer<ThroughputSample> { &self.throughput }
    pub fn rtt(&self) -> &RingBuffer<Vec<u32>> { &self.rtt }
    pub fn adjustments(&self) -> &RingBuffer<u32> { &self.adjustments }
    pub fn top_circuits(&self) -> &TopNTracker { &self.top_circuits }
    pub fn top_asns(&self) -> &TopNTracker { &self.top_asns }

    /// Messages that changed state (unknown events excluded).
    pub fn handled(&self) -> u64 { self.handled }
}
