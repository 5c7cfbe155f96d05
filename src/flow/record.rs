use std::fmt;
use std::str::FromStr;
use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlowRecord {
    #[serde(skip)]
    pub id:          i64,
    pub sum_id:      i64,
    pub start_time:  DateTime<Utc>,
    pub end_time:    DateTime<Utc>,
    pub action:      Action,
    pub src:         Endpoint,
    pub dst:         Endpoint,
    pub protocol:    String,
    pub dst_port:    u16,
    pub reporter:    Reporter,
    pub packets_in:  u64,
    pub packets_out: u64,
    pub bytes_in:    u64,
    pub bytes_out:   u64,
    pub policies:    Option<PolicyTrace>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub namespace: String,
    pub name:      String,
    pub labels:    String,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Action {
    Allow,
    Deny,
    Pass,
    Unspecified,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Reporter {
    Src,
    Dst,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyTrace {
    pub enforced: Vec<PolicyHit>,
    pub pending:  Vec<PolicyHit>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyHit {
    pub kind:         String,
    pub name:         String,
    pub namespace:    String,
    pub tier:         String,
    pub action:       String,
    pub policy_index: i64,
    pub rule_index:   i64,
    pub trigger:      Option<Box<PolicyHit>>,
}

impl FlowRecord {
    /// Logical flow identity shared by both reporters of a flow.
    pub fn key(&self) -> String {
        format!("{}|{}|{}|{}|{}|{}",
                self.src.namespace, self.src.name,
                self.dst.namespace, self.dst.name,
                self.protocol,      self.dst_port,
        )
    }
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Allow       => "Allow",
            Action::Deny        => "Deny",
            Action::Pass        => "Pass",
            Action::Unspecified => "Unspecified",
        }
    }
}

impl Default for Action {
    fn default() -> Self {
        Action::Unspecified
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "allow"            => Ok(Action::Allow),
            "deny"             => Ok(Action::Deny),
            "pass"             => Ok(Action::Pass),
            "" | "unspecified" => Ok(Action::Unspecified),
            _                  => Err(format!("invalid action: {}", s)),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Reporter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Src" => Ok(Reporter::Src),
            "Dst" => Ok(Reporter::Dst),
            _     => Err(format!("unknown reporter '{}'", s)),
        }
    }
}

impl fmt::Display for Reporter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Reporter::Src => f.write_str("Src"),
            Reporter::Dst => f.write_str("Dst"),
        }
    }
}
