use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Serialize, Deserialize};
use crate::flow::{Action, Endpoint, FlowRecord, FlowSummary};

/// Predicate over flows. Every set field must match; the default value
/// matches everything.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterAttributes {
    pub action:    Option<Action>,
    pub port:      u16,
    pub namespace: String,
    pub name:      String,
    pub label:     String,
    pub start:     Option<DateTime<Utc>>,
    pub end:       Option<DateTime<Utc>>,
}

/// Fields a filter can inspect.
pub trait Attributes {
    fn action(&self)     -> Action;
    fn dst_port(&self)   -> u16;
    fn src(&self)        -> &Endpoint;
    fn dst(&self)        -> &Endpoint;
    fn start_time(&self) -> DateTime<Utc>;
    fn end_time(&self)   -> DateTime<Utc>;
}

/// A `FilterAttributes` with its patterns compiled.
pub struct Matcher {
    action:    Option<Action>,
    port:      u16,
    namespace: Option<Pattern>,
    name:      Option<Pattern>,
    label:     Option<String>,
    start:     Option<DateTime<Utc>>,
    end:       Option<DateTime<Utc>>,
}

enum Pattern {
    Regex(Regex),
    Text(String),
}

impl FilterAttributes {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn matcher(&self) -> Matcher {
        Matcher {
            action:    self.action,
            port:      self.port,
            namespace: Pattern::new(&self.namespace),
            name:      Pattern::new(&self.name),
            label:     Some(self.label.clone()).filter(|s| !s.is_empty()),
            start:     self.start,
            end:       self.end,
        }
    }

    pub fn matches<T: Attributes>(&self, item: &T) -> bool {
        self.matcher().matches(item)
    }
}

impl Matcher {
    pub fn matches<T: Attributes>(&self, item: &T) -> bool {
        let (src, dst) = (item.src(), item.dst());

        let either = |p: &Option<Pattern>, f: fn(&Endpoint) -> &str| {
            p.as_ref().map_or(true, |p| p.matches(f(src)) || p.matches(f(dst)))
        };

        self.action.map_or(true, |a| a == item.action())
            && (self.port == 0 || self.port == item.dst_port())
            && either(&self.namespace, |e| e.namespace.as_str())
            && either(&self.name,      |e| e.name.as_str())
            && self.label.as_ref().map_or(true, |l| {
                src.labels.contains(l.as_str()) || dst.labels.contains(l.as_str())
            })
            && self.start.map_or(true, |start| item.end_time() >= start)
            && self.end.map_or(true, |end| item.start_time() <= end)
    }
}

impl Pattern {
    fn new(pattern: &str) -> Option<Self> {
        if pattern.is_empty() {
            return None;
        }
        Some(match Regex::new(pattern) {
            Ok(re) => Pattern::Regex(re),
            Err(_) => Pattern::Text(pattern.to_owned()),
        })
    }

    fn matches(&self, s: &str) -> bool {
        match self {
            Pattern::Regex(re)  => re.is_match(s),
            Pattern::Text(text) => s.contains(text.as_str()),
        }
    }
}

/// Keeps the items matching `filter`, preserving order.
pub fn select<T: Attributes>(items: Vec<T>, filter: &FilterAttributes) -> Vec<T> {
    if filter.is_empty() {
        return items;
    }
    let matcher = filter.matcher();
    items.into_iter().filter(|item| matcher.matches(item)).collect()
}

impl Attributes for FlowRecord {
    fn action(&self)     -> Action        { self.action     }
    fn dst_port(&self)   -> u16           { self.dst_port   }
    fn src(&self)        -> &Endpoint     { &self.src       }
    fn dst(&self)        -> &Endpoint     { &self.dst       }
    fn start_time(&self) -> DateTime<Utc> { self.start_time }
    fn end_time(&self)   -> DateTime<Utc> { self.end_time   }
}

impl Attributes for FlowSummary {
    fn action(&self)     -> Action        { self.action     }
    fn dst_port(&self)   -> u16           { self.dst_port   }
    fn src(&self)        -> &Endpoint     { &self.src       }
    fn dst(&self)        -> &Endpoint     { &self.dst       }
    fn start_time(&self) -> DateTime<Utc> { self.start_time }
    fn end_time(&self)   -> DateTime<Utc> { self.end_time   }
}
