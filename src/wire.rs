use std::collections::BTreeMap;
use chrono::{DateTime, Utc};
use log::trace;
use serde::Deserialize;
use crate::flow::{Action, Endpoint, FlowRecord, PolicyHit, PolicyTrace, Reporter};

/// One flow as emitted on the push stream.
#[derive(Debug, Deserialize)]
pub struct Flow {
    pub start_time:       DateTime<Utc>,
    pub end_time:         DateTime<Utc>,
    #[serde(default)]
    pub action:           String,
    pub source_name:      String,
    pub source_namespace: String,
    #[serde(default)]
    pub source_labels:    Labels,
    pub dest_name:        String,
    pub dest_namespace:   String,
    #[serde(default)]
    pub dest_labels:      Labels,
    pub protocol:         String,
    pub dest_port:        u16,
    pub reporter:         String,
    #[serde(default)]
    pub packets_in:       u64,
    #[serde(default)]
    pub packets_out:      u64,
    #[serde(default)]
    pub bytes_in:         u64,
    #[serde(default)]
    pub bytes_out:        u64,
    pub policies:         Option<Policies>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Labels {
    Text(String),
    Map(BTreeMap<String, String>),
}

#[derive(Debug, Default, Deserialize)]
pub struct Policies {
    #[serde(default)]
    pub enforced_policies: Vec<PolicyHit>,
    #[serde(default)]
    pub pending_policies:  Vec<PolicyHit>,
}

impl Flow {
    /// Converts the payload into a record ready for aggregation.
    ///
    /// # Panics
    ///
    /// An unknown reporter means the producer speaks a protocol this
    /// build does not understand; aggregating such a record would put
    /// its counters on the wrong side, so conversion panics.
    pub fn into_record(self) -> FlowRecord {
        let reporter = match self.reporter.parse::<Reporter>() {
            Ok(reporter) => reporter,
            Err(e)       => panic!("incompatible flow producer: {}", e),
        };

        let action = self.action.parse().unwrap_or_else(|e| {
            trace!("{}, treating as unspecified", e);
            Action::Unspecified
        });

        FlowRecord {
            id:          0,
            sum_id:      0,
            start_time:  self.start_time,
            end_time:    self.end_time,
            action:      action,
            src:         Endpoint {
                namespace: self.source_namespace,
                name:      self.source_name,
                labels:    self.source_labels.normalize(),
            },
            dst:         Endpoint {
                namespace: self.dest_namespace,
                name:      self.dest_name,
                labels:    self.dest_labels.normalize(),
            },
            protocol:    self.protocol,
            dst_port:    self.dest_port,
            reporter:    reporter,
            packets_in:  self.packets_in,
            packets_out: self.packets_out,
            bytes_in:    self.bytes_in,
            bytes_out:   self.bytes_out,
            policies:    self.policies.map(|p| PolicyTrace {
                enforced: p.enforced_policies,
                pending:  p.pending_policies,
            }),
        }
    }
}

impl Labels {
    /// Label sets become a sorted, comma separated `key=value` list.
    pub fn normalize(self) -> String {
        match self {
            Labels::Text(s) => {
                let mut labels = s.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>();
                labels.sort_unstable();
                labels.join(",")
            },
            Labels::Map(map) => map.iter().map(|(k, v)| {
                format!("{}={}", k, v)
            }).collect::<Vec<_>>().join(","),
        }
    }
}

impl Default for Labels {
    fn default() -> Self {
        Labels::Text(String::new())
    }
}

#[cfg(test)]
mod test {
    use anyhow::Result;
    use crate::flow::{Action, Reporter};
    use super::Flow;

    const FLOW: &str = r#"{
        "start_time": "2024-05-01T10:00:00Z",
        "end_time": "2024-05-01T10:00:15Z",
        "action": "Deny",
        "source_name": "web-7d9f",
        "source_namespace": "shop",
        "source_labels": {"tier": "front", "app": "web"},
        "dest_name": "db-0",
        "dest_namespace": "data",
        "dest_labels": "role=primary, app=db",
        "protocol": "TCP",
        "dest_port": 5432,
        "reporter": "Dst",
        "packets_in": 12,
        "packets_out": 8,
        "bytes_in": 1400,
        "bytes_out": 900,
        "policies": {
            "enforced_policies": [{
                "kind": "NetworkPolicy",
                "name": "deny-all",
                "namespace": "data",
                "tier": "default",
                "action": "Deny",
                "policy_index": 0,
                "rule_index": -1,
                "trigger": null
            }]
        }
    }"#;

    #[test]
    fn decode() -> Result<()> {
        let flow   = serde_json::from_str::<Flow>(FLOW)?;
        let record = flow.into_record();

        assert_eq!(Action::Deny,             record.action);
        assert_eq!(Reporter::Dst,            record.reporter);
        assert_eq!("app=web,tier=front",     record.src.labels);
        assert_eq!("app=db,role=primary",    record.dst.labels);
        assert_eq!("shop|web-7d9f|data|db-0|TCP|5432", record.key());
        assert_eq!(1400,                     record.bytes_in);

        let policies = record.policies.unwrap_or_default();
        assert_eq!(1,          policies.enforced.len());
        assert_eq!("deny-all", policies.enforced[0].name);
        assert!(policies.pending.is_empty());

        Ok(())
    }

    #[test]
    #[should_panic(expected = "unknown reporter")]
    fn unknown_reporter_panics() {
        let json = FLOW.replace(r#""reporter": "Dst""#, r#""reporter": "Unknown""#);
        if let Ok(flow) = serde_json::from_str::<Flow>(&json) {
            flow.into_record();
        }
    }
}
