use std::collections::BTreeMap;
use std::io;
use std::net::Ipv4Addr;
use std::sync::Arc;

use log::{debug, trace, warn};
use tokio::net::UdpSocket;
use tokio::sync::mpsc;

use crate::config::NeighborConfig;
use crate::message::Outbound;

const MAX_DATAGRAM: usize = 65_535;

pub type IngestTx = mpsc::UnboundedSender<(Ipv4Addr, Vec<u8>)>;
pub type IngestRx = mpsc::UnboundedReceiver<(Ipv4Addr, Vec<u8>)>;

/// One connected UDP socket per neighbor. Inbound datagrams from every
/// neighbor funnel into a single channel so the dispatcher stays the only
/// consumer; outbound sends go through the per-neighbor socket map.
pub struct Transports {
    sockets: BTreeMap<Ipv4Addr, Arc<UdpSocket>>,
}

impl Transports {
    pub async fn connect(neighbors: &[NeighborConfig]) -> io::Result<(Self, IngestRx)> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut sockets = BTreeMap::new();
        for neighbor in neighbors {
            let socket = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await?;
            socket.connect((Ipv4Addr::LOCALHOST, neighbor.port)).await?;
            debug!("{} reachable on UDP port {}", neighbor, neighbor.port);
            let socket = Arc::new(socket);
            tokio::spawn(read_datagrams(
                neighbor.addr,
                Arc::clone(&socket),
                tx.clone(),
            ));
            sockets.insert(neighbor.addr, socket);
        }
        Ok((Self { sockets }, rx))
    }

    pub async fn send(&self, outbound: &Outbound) -> io::Result<()> {
        let socket = self.sockets.get(&outbound.to).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("No transport for neighbor {}", outbound.to),
            )
        })?;
        let payload = serde_json::to_vec(&outbound.envelope)?;
        trace!("Sending {} to {}", outbound.envelope, outbound.to);
        socket.send(&payload).await?;
        Ok(())
    }
}

async fn read_datagrams(neighbor: Ipv4Addr, socket: Arc<UdpSocket>, tx: IngestTx) {
    let mut buffer = vec![0u8; MAX_DATAGRAM];
    loop {
        match socket.recv(&mut buffer).await {
            Ok(len) => {
                if tx.send((neighbor, buffer[..len].to_vec())).is_err() {
                    // Dispatcher has shut down
                    break;
                }
            }
            Err(err) => {
                warn!("Error receiving from {}: {}", neighbor, err);
            }
        }
    }
}
