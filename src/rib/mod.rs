pub mod aggregate;
pub mod bestpath;

use std::collections::BTreeMap;
use std::fmt;
use std::net::Ipv4Addr;

use chrono::{DateTime, Utc};
use log::trace;

use crate::message::{Origin, RouteAdvert, TableEntry};
use crate::prefix::{self, Prefix};
use crate::utils::format_time_as_elapsed;

/// Attributes carried by an announcement; two routes with equal attributes
/// are candidates for aggregation
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RouteAttributes {
    pub local_pref: u32,
    pub self_origin: bool,
    pub as_path: Vec<u32>,
    pub origin: Origin,
}

impl From<&RouteAdvert> for RouteAttributes {
    fn from(advert: &RouteAdvert) -> Self {
        Self {
            local_pref: advert.local_pref,
            self_origin: advert.self_origin,
            as_path: advert.as_path.clone(),
            origin: advert.origin,
        }
    }
}

#[derive(Clone, Debug)]
pub struct RouteEntry {
    pub prefix: Prefix,
    pub attributes: RouteAttributes,
    /// Neighbor the announcement arrived from; doubles as the nexthop
    pub learned_from: Ipv4Addr,
    // Time received
    pub timestamp: DateTime<Utc>,
}

impl RouteEntry {
    pub fn new(prefix: Prefix, attributes: RouteAttributes, learned_from: Ipv4Addr) -> Self {
        Self {
            prefix,
            attributes,
            learned_from,
            timestamp: Utc::now(),
        }
    }
}

impl fmt::Display for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "<Route {} via {} age={}>",
            self.prefix,
            self.learned_from,
            format_time_as_elapsed(self.timestamp),
        )
    }
}

impl From<&RouteEntry> for TableEntry {
    fn from(entry: &RouteEntry) -> Self {
        TableEntry {
            network: Ipv4Addr::from(entry.prefix.network),
            netmask: Ipv4Addr::from(entry.prefix.netmask),
            peer: entry.learned_from,
            local_pref: entry.attributes.local_pref,
            self_origin: entry.attributes.self_origin,
            as_path: entry.attributes.as_path.clone(),
            origin: entry.attributes.origin,
        }
    }
}

/// Per-neighbor route tables. `disaggregated` records every accepted
/// announcement verbatim and is the ground truth; `aggregated` is the
/// coalesced view used for all forwarding and dump replies.
#[derive(Debug, Default)]
pub struct RouteStore {
    disaggregated: BTreeMap<Ipv4Addr, Vec<RouteEntry>>,
    aggregated: BTreeMap<Ipv4Addr, Vec<RouteEntry>>,
}

impl RouteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an announcement and fold it into the forwarding view
    pub fn insert(&mut self, from: Ipv4Addr, entry: RouteEntry) {
        self.disaggregated
            .entry(from)
            .or_insert_with(Vec::new)
            .push(entry.clone());
        let view = self.aggregated.entry(from).or_insert_with(Vec::new);
        view.push(entry);
        aggregate::coalesce(view);
    }

    /// Remove every announcement from `from` matching a victim prefix, then
    /// rebuild the forwarding view from ground truth. Earlier aggregation may
    /// have fused a victim with siblings, so partial unmerging is never
    /// attempted.
    pub fn withdraw(&mut self, from: Ipv4Addr, victims: &[Prefix]) {
        if let Some(entries) = self.disaggregated.get_mut(&from) {
            let before = entries.len();
            for victim in victims {
                entries.retain(|entry| {
                    !(entry.prefix.netmask == victim.netmask
                        && prefix::same_network(
                            entry.prefix.network,
                            victim.network,
                            victim.netmask,
                        ))
                });
            }
            trace!("Removed {} routes for {}", before - entries.len(), from);
        }
        self.rebuild();
    }

    fn rebuild(&mut self) {
        self.aggregated = self.disaggregated.clone();
        for view in self.aggregated.values_mut() {
            aggregate::coalesce(view);
        }
    }

    /// All forwarding-view entries across neighbors
    pub fn entries(&self) -> impl Iterator<Item = &RouteEntry> {
        self.aggregated.values().flatten()
    }

    /// Flat forwarding table tagged with the neighbor each route came from
    pub fn dump(&self) -> Vec<TableEntry> {
        self.entries().map(TableEntry::from).collect()
    }

    pub fn aggregated_for(&self, neighbor: Ipv4Addr) -> &[RouteEntry] {
        self.aggregated
            .get(&neighbor)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn disaggregated_for(&self, neighbor: Ipv4Addr) -> &[RouteEntry] {
        self.disaggregated
            .get(&neighbor)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
