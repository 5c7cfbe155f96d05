use std::collections::{HashMap, HashSet, VecDeque};
use chrono::{DateTime, Duration, Utc};
use crate::flow::{Counters, FlowSummary, Rate};

/// Per-summary counter history used to derive rates over a sliding
/// window.
pub struct RateCalc {
    window:  Duration,
    history: HashMap<i64, VecDeque<Sample>>,
}

#[derive(Copy, Clone, Debug)]
struct Sample {
    at:  DateTime<Utc>,
    src: Counters,
    dst: Counters,
}

impl RateCalc {
    pub fn new(window: Duration) -> Self {
        Self {
            window:  window,
            history: HashMap::new(),
        }
    }

    /// Records the summary's current counters at `now` and returns its
    /// rates relative to the counters one window ago. A summary younger
    /// than the window is measured from its creation, when all counters
    /// were zero. Creation is taken as the instant before the first
    /// record was added, so that record counts toward the rate. With no
    /// elapsed time the previous rate is kept.
    pub fn rate(&mut self, sum: &FlowSummary, now: DateTime<Utc>) -> Rate {
        let curr    = Sample::of(sum, now);
        let cutoff  = now - self.window;
        let samples = self.history.entry(sum.id).or_insert_with(VecDeque::new);

        samples.push_back(curr);

        while samples.len() > 1 && samples[1].at <= cutoff {
            samples.pop_front();
        }

        let base = match samples.front() {
            _ if sum.created > cutoff => Sample::zero(sum.created),
            Some(sample)              => *sample,
            None                      => curr,
        };

        let secs = (now - base.at).num_milliseconds() as f64 / 1000.0;
        if secs <= 0.0 {
            return sum.rate;
        }

        let per = |curr: u64, base: u64| curr.saturating_sub(base) as f64 / secs;

        Rate {
            src_packets: per(curr.src.packets(), base.src.packets()),
            src_bytes:   per(curr.src.bytes(),   base.src.bytes()),
            dst_packets: per(curr.dst.packets(), base.dst.packets()),
            dst_bytes:   per(curr.dst.bytes(),   base.dst.bytes()),
        }
    }

    /// Drops history for summaries that no longer exist.
    pub fn retain(&mut self, ids: &HashSet<i64>) {
        self.history.retain(|id, _| ids.contains(id));
    }
}

impl Sample {
    fn of(sum: &FlowSummary, at: DateTime<Utc>) -> Self {
        Self {
            at:  at,
            src: sum.src_stats,
            dst: sum.dst_stats,
        }
    }

    fn zero(at: DateTime<Utc>) -> Self {
        Self {
            at:  at,
            src: Counters::default(),
            dst: Counters::default(),
        }
    }
}
