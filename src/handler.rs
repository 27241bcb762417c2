use std::collections::BTreeMap;
use std::io;
use std::net::Ipv4Addr;

use log::{debug, info, trace, warn};
use tokio::select;
use tokio::signal;

use crate::config::{local_addr, Relation, RouterConfig};
use crate::message::{Empty, Envelope, Outbound, Payload, PrefixSpec, RouteAdvert};
use crate::policy;
use crate::prefix::Prefix;
use crate::rib::{bestpath, RouteAttributes, RouteEntry, RouteStore};
use crate::transport::Transports;

/// The route processor for one autonomous system. Owns the route tables and
/// the neighbor relations; every mutation goes through `handle`, which
/// processes one inbound message to completion and returns the messages to
/// send in response.
pub struct Router {
    asn: u32,
    neighbors: BTreeMap<Ipv4Addr, Relation>,
    store: RouteStore,
}

impl Router {
    pub fn new(config: &RouterConfig) -> Self {
        let neighbors = config
            .neighbors
            .iter()
            .map(|n| (n.addr, n.relation))
            .collect();
        Self {
            asn: config.asn,
            neighbors,
            store: RouteStore::new(),
        }
    }

    /// One handshake per neighbor, sent once at startup
    pub fn handshakes(&self) -> Vec<Outbound> {
        self.neighbors
            .keys()
            .map(|&addr| Outbound {
                to: addr,
                envelope: Envelope {
                    src: local_addr(addr),
                    dst: addr,
                    payload: Payload::Handshake(Empty {}),
                },
            })
            .collect()
    }

    pub fn handle(&mut self, from: Ipv4Addr, envelope: Envelope) -> Vec<Outbound> {
        let relation = match self.neighbors.get(&from) {
            Some(&relation) => relation,
            None => {
                warn!("Dropping {} from unknown source {}", envelope, from);
                return Vec::new();
            }
        };
        trace!("Received {} [{}]", envelope, relation);

        let Envelope { src, dst, payload } = envelope;
        match payload {
            Payload::Update(advert) => self.handle_update(from, advert),
            Payload::Withdraw(victims) => self.handle_withdraw(from, victims),
            Payload::Data(value) => self.handle_data(
                from,
                Envelope {
                    src,
                    dst,
                    payload: Payload::Data(value),
                },
            ),
            Payload::Dump(_) => self.handle_dump(from, src, dst),
            other => {
                debug!("Ignoring {} message from {}", other.kind(), from);
                Vec::new()
            }
        }
    }

    /// Neighbors that should hear about reachability learned on `from`
    fn propagation_targets(&self, from: Ipv4Addr) -> Vec<Ipv4Addr> {
        let source = self.neighbors[&from];
        self.neighbors
            .iter()
            .filter(|&(&addr, &relation)| {
                addr != from && policy::should_propagate(source, relation)
            })
            .map(|(&addr, _)| addr)
            .collect()
    }

    fn handle_update(&mut self, from: Ipv4Addr, advert: RouteAdvert) -> Vec<Outbound> {
        let prefix = advert.prefix();
        if !prefix.is_valid() {
            warn!(
                "Dropping update from {}: malformed prefix {} mask {}",
                from, advert.network, advert.netmask
            );
            return Vec::new();
        }
        let entry = RouteEntry::new(prefix, RouteAttributes::from(&advert), from);
        debug!("Learned {}", entry);
        self.store.insert(from, entry);

        let mut advert = advert;
        advert.as_path.insert(0, self.asn);
        self.propagation_targets(from)
            .into_iter()
            .map(|target| Outbound {
                to: target,
                envelope: Envelope {
                    src: local_addr(target),
                    dst: target,
                    payload: Payload::Update(advert.clone()),
                },
            })
            .collect()
    }

    fn handle_withdraw(&mut self, from: Ipv4Addr, victims: Vec<PrefixSpec>) -> Vec<Outbound> {
        let prefixes: Vec<Prefix> = victims.iter().map(Prefix::from).collect();
        self.store.withdraw(from, &prefixes);
        self.propagation_targets(from)
            .into_iter()
            .map(|target| Outbound {
                to: target,
                envelope: Envelope {
                    src: local_addr(target),
                    dst: target,
                    payload: Payload::Withdraw(victims.clone()),
                },
            })
            .collect()
    }

    fn handle_data(&mut self, from: Ipv4Addr, envelope: Envelope) -> Vec<Outbound> {
        let verdict = bestpath::best_route(&self.store, envelope.dst).map(|route| {
            let nexthop = route.learned_from;
            // The nexthop is always a configured neighbor
            let allowed =
                policy::forwarding_allowed(self.neighbors[&from], self.neighbors[&nexthop]);
            (nexthop, allowed)
        });
        match verdict {
            Some((nexthop, true)) => {
                trace!("Forwarding data for {} via {}", envelope.dst, nexthop);
                vec![Outbound {
                    to: nexthop,
                    envelope,
                }]
            }
            _ => {
                debug!("No viable route for data to {}", envelope.dst);
                vec![Outbound {
                    to: from,
                    envelope: Envelope {
                        src: local_addr(from),
                        dst: envelope.src,
                        payload: Payload::NoRoute(Empty {}),
                    },
                }]
            }
        }
    }

    fn handle_dump(&self, from: Ipv4Addr, src: Ipv4Addr, dst: Ipv4Addr) -> Vec<Outbound> {
        vec![Outbound {
            to: from,
            envelope: Envelope {
                src: dst,
                dst: src,
                payload: Payload::Table(self.store.dump()),
            },
        }]
    }
}

/// Bring up transports, send handshakes, then pump inbound messages through
/// the router one at a time until shutdown. All sends triggered by a message
/// complete before the next message is read.
pub async fn serve(config: RouterConfig) -> io::Result<()> {
    let mut router = Router::new(&config);
    let (transports, mut inbound) = Transports::connect(&config.neighbors).await?;

    for outbound in router.handshakes() {
        transports.send(&outbound).await?;
    }
    info!(
        "Router up for AS {} with {} neighbors",
        config.asn,
        config.neighbors.len()
    );

    loop {
        select! {
            received = inbound.recv() => {
                let (from, datagram) = match received {
                    Some(received) => received,
                    None => break,
                };
                let envelope: Envelope = match serde_json::from_slice(&datagram) {
                    Ok(envelope) => envelope,
                    Err(err) => {
                        warn!("Malformed message from {}: {}", from, err);
                        continue;
                    }
                };
                for outbound in router.handle(from, envelope) {
                    transports.send(&outbound).await?;
                }
            }
            _ = signal::ctrl_c() => {
                info!("Stopping router...");
                break;
            }
        }
    }
    Ok(())
}
