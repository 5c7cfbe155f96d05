use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use anyhow::{anyhow, Result};
use crate::flow::FlowSummary;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SortField {
    Id,
    Key,
    StartTime,
    EndTime,
    Action,
    SrcNamespace,
    SrcName,
    DstNamespace,
    DstName,
    Protocol,
    DstPort,
    SrcReports,
    SrcPacketsIn,
    SrcPacketsOut,
    SrcBytesIn,
    SrcBytesOut,
    DstReports,
    DstPacketsIn,
    DstPacketsOut,
    DstBytesIn,
    DstBytesOut,
    SrcPacketRate,
    SrcByteRate,
    DstPacketRate,
    DstByteRate,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SortBy {
    pub field:     SortField,
    pub ascending: bool,
}

/// Orderings for the totals and rates projections.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SortAttributes {
    pub totals: SortBy,
    pub rates:  SortBy,
}

const FIELDS: &[(&str, SortField)] = &[
    ("id",              SortField::Id),
    ("key",             SortField::Key),
    ("start_time",      SortField::StartTime),
    ("end_time",        SortField::EndTime),
    ("action",          SortField::Action),
    ("src_namespace",   SortField::SrcNamespace),
    ("src_name",        SortField::SrcName),
    ("dst_namespace",   SortField::DstNamespace),
    ("dst_name",        SortField::DstName),
    ("protocol",        SortField::Protocol),
    ("dst_port",        SortField::DstPort),
    ("src_reports",     SortField::SrcReports),
    ("src_packets_in",  SortField::SrcPacketsIn),
    ("src_packets_out", SortField::SrcPacketsOut),
    ("src_bytes_in",    SortField::SrcBytesIn),
    ("src_bytes_out",   SortField::SrcBytesOut),
    ("dst_reports",     SortField::DstReports),
    ("dst_packets_in",  SortField::DstPacketsIn),
    ("dst_packets_out", SortField::DstPacketsOut),
    ("dst_bytes_in",    SortField::DstBytesIn),
    ("dst_bytes_out",   SortField::DstBytesOut),
    ("src_packet_rate", SortField::SrcPacketRate),
    ("src_byte_rate",   SortField::SrcByteRate),
    ("dst_packet_rate", SortField::DstPacketRate),
    ("dst_byte_rate",   SortField::DstByteRate),
];

impl SortField {
    pub fn name(&self) -> &'static str {
        FIELDS.iter().find(|(_, f)| f == self).map_or("", |(name, _)| name)
    }

    pub fn compare(&self, a: &FlowSummary, b: &FlowSummary) -> Ordering {
        let (s, d) = ((&a.src_stats, &b.src_stats), (&a.dst_stats, &b.dst_stats));
        let (r, q) = (&a.rate, &b.rate);

        match self {
            SortField::Id            => a.id.cmp(&b.id),
            SortField::Key           => a.key.cmp(&b.key),
            SortField::StartTime     => a.start_time.cmp(&b.start_time),
            SortField::EndTime       => a.end_time.cmp(&b.end_time),
            SortField::Action        => a.action.as_str().cmp(b.action.as_str()),
            SortField::SrcNamespace  => a.src.namespace.cmp(&b.src.namespace),
            SortField::SrcName       => a.src.name.cmp(&b.src.name),
            SortField::DstNamespace  => a.dst.namespace.cmp(&b.dst.namespace),
            SortField::DstName       => a.dst.name.cmp(&b.dst.name),
            SortField::Protocol      => a.protocol.cmp(&b.protocol),
            SortField::DstPort       => a.dst_port.cmp(&b.dst_port),
            SortField::SrcReports    => s.0.reports.cmp(&s.1.reports),
            SortField::SrcPacketsIn  => s.0.packets_in.cmp(&s.1.packets_in),
            SortField::SrcPacketsOut => s.0.packets_out.cmp(&s.1.packets_out),
            SortField::SrcBytesIn    => s.0.bytes_in.cmp(&s.1.bytes_in),
            SortField::SrcBytesOut   => s.0.bytes_out.cmp(&s.1.bytes_out),
            SortField::DstReports    => d.0.reports.cmp(&d.1.reports),
            SortField::DstPacketsIn  => d.0.packets_in.cmp(&d.1.packets_in),
            SortField::DstPacketsOut => d.0.packets_out.cmp(&d.1.packets_out),
            SortField::DstBytesIn    => d.0.bytes_in.cmp(&d.1.bytes_in),
            SortField::DstBytesOut   => d.0.bytes_out.cmp(&d.1.bytes_out),
            SortField::SrcPacketRate => r.src_packets.total_cmp(&q.src_packets),
            SortField::SrcByteRate   => r.src_bytes.total_cmp(&q.src_bytes),
            SortField::DstPacketRate => r.dst_packets.total_cmp(&q.dst_packets),
            SortField::DstByteRate   => r.dst_bytes.total_cmp(&q.dst_bytes),
        }
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FIELDS.iter().find(|(name, _)| *name == s).map(|(_, f)| *f).ok_or_else(|| {
            format!("unknown sort field '{}'", s)
        })
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl SortBy {
    pub fn new(field: SortField, ascending: bool) -> Self {
        Self { field, ascending }
    }

    pub fn parse(name: &str, ascending: bool) -> Result<Self> {
        let field = name.parse::<SortField>().map_err(|e| anyhow!(e))?;
        Ok(Self::new(field, ascending))
    }

    /// Stable sort; equal elements keep their relative order.
    pub fn sort(&self, sums: &mut [FlowSummary]) {
        let field = self.field;
        match self.ascending {
            true  => sums.sort_by(|a, b| field.compare(a, b)),
            false => sums.sort_by(|a, b| field.compare(b, a)),
        }
    }
}

impl Default for SortAttributes {
    fn default() -> Self {
        Self {
            totals: SortBy::new(SortField::Key, true),
            rates:  SortBy::new(SortField::SrcByteRate, false),
        }
    }
}

/// Sorts `sums` by the field called `name`.
pub fn sort_by_name(sums: &mut [FlowSummary], name: &str, ascending: bool) -> Result<()> {
    SortBy::parse(name, ascending)?.sort(sums);
    Ok(())
}
