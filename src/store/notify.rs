use crossbeam_channel::{bounded, Receiver, Sender};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Event {
    FlowAdded,
    SummaryAdded,
    SumsUpdated,
    RatesUpdated,
}

/// Best-effort change signals. Each event kind holds at most one
/// pending signal; sending never blocks and extra signals are dropped.
pub struct Notify {
    flow_added:    Channel,
    summary_added: Channel,
    sums_updated:  Channel,
    rates_updated: Channel,
}

struct Channel {
    tx: Sender<()>,
    rx: Receiver<()>,
}

impl Notify {
    pub fn new() -> Self {
        Self {
            flow_added:    Channel::new(),
            summary_added: Channel::new(),
            sums_updated:  Channel::new(),
            rates_updated: Channel::new(),
        }
    }

    /// Never blocks. The channel keeps its own receiver and so cannot
    /// disconnect; a full channel already holds a pending signal.
    pub fn send(&self, event: Event) {
        let _ = self.channel(event).tx.try_send(());
    }

    pub fn subscribe(&self, event: Event) -> Receiver<()> {
        self.channel(event).rx.clone()
    }

    fn channel(&self, event: Event) -> &Channel {
        match event {
            Event::FlowAdded    => &self.flow_added,
            Event::SummaryAdded => &self.summary_added,
            Event::SumsUpdated  => &self.sums_updated,
            Event::RatesUpdated => &self.rates_updated,
        }
    }
}

impl Default for Notify {
    fn default() -> Self {
        Self::new()
    }
}

impl Channel {
    fn new() -> Self {
        let (tx, rx) = bounded(1);
        Self { tx, rx }
    }
}
