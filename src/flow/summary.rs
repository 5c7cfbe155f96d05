use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use super::{Action, Endpoint, FlowRecord, PolicyTrace, Reporter};

/// Running aggregate of every record reported for one flow key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlowSummary {
    #[serde(skip)]
    pub id:         i64,
    pub key:        String,
    pub created:    DateTime<Utc>,
    pub start_time: DateTime<Utc>,
    pub end_time:   DateTime<Utc>,
    pub action:     Action,
    pub src:        Endpoint,
    pub dst:        Endpoint,
    pub protocol:   String,
    pub dst_port:   u16,
    pub policies:   Option<PolicyTrace>,
    pub src_stats:  Counters,
    pub dst_stats:  Counters,
    pub rate:       Rate,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Counters {
    pub reports:     u64,
    pub packets_in:  u64,
    pub packets_out: u64,
    pub bytes_in:    u64,
    pub bytes_out:   u64,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rate {
    pub src_packets: f64,
    pub src_bytes:   f64,
    pub dst_packets: f64,
    pub dst_bytes:   f64,
}

impl FlowSummary {
    /// An empty summary for `record`'s key; counters start at zero and
    /// are filled in by `add`.
    pub fn new(record: &FlowRecord, created: DateTime<Utc>) -> Self {
        Self {
            id:         0,
            key:        record.key(),
            created:    created,
            start_time: record.start_time,
            end_time:   record.end_time,
            action:     record.action,
            src:        record.src.clone(),
            dst:        record.dst.clone(),
            protocol:   record.protocol.clone(),
            dst_port:   record.dst_port,
            policies:   record.policies.clone(),
            src_stats:  Counters::default(),
            dst_stats:  Counters::default(),
            rate:       Rate::default(),
        }
    }

    pub fn add(&mut self, record: &FlowRecord) {
        self.start_time = self.start_time.min(record.start_time);
        self.end_time   = self.end_time.max(record.end_time);
        self.action     = record.action;
        self.src        = record.src.clone();
        self.dst        = record.dst.clone();
        self.protocol   = record.protocol.clone();
        self.dst_port   = record.dst_port;
        self.policies   = record.policies.clone();

        match record.reporter {
            Reporter::Src => self.src_stats.add(record),
            Reporter::Dst => self.dst_stats.add(record),
        }
    }
}

impl Counters {
    pub fn add(&mut self, record: &FlowRecord) {
        self.reports     += 1;
        self.packets_in  += record.packets_in;
        self.packets_out += record.packets_out;
        self.bytes_in    += record.bytes_in;
        self.bytes_out   += record.bytes_out;
    }

    pub fn packets(&self) -> u64 {
        self.packets_in + self.packets_out
    }

    pub fn bytes(&self) -> u64 {
        self.bytes_in + self.bytes_out
    }
}
