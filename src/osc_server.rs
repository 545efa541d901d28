use std::collections::HashSet;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use rosc::{OscMessage, OscPacket, OscType};
use tokio::net::UdpSocket;
use wildmatch::WildMatch;

/// One float position update, stamped at receipt on the session clock.
#[derive(Debug, Clone, Default)]
pub struct PositionUpdate {
    pub address: String,
    pub value: f32,
    /// Seconds since the session epoch.
    pub timestamp: f64,
}

/// Listens for OSC float messages on a UDP port, filters them through a
/// wildcard address pattern, and hands matching updates to the pipeline
/// over a channel. The channel is the only writer path into the filter,
/// which keeps buffer pushes and estimator scans from interleaving.
pub struct OscServer {
    data_rx: Receiver<PositionUpdate>,
    found_addresses: Arc<Mutex<HashSet<String>>>,
}

impl OscServer {
    /// `epoch` is the session start used to stamp arrivals.
    pub fn new(port: u16, pattern: WildMatch, epoch: Instant) -> Self {
        let (data_tx, data_rx) = channel::<PositionUpdate>();

        let found_addresses = Arc::new(Mutex::new(HashSet::new()));

        let found_addresses_clone = found_addresses.clone();
        tokio::spawn(async move {
            if let Err(error) =
                OscServer::recv_loop(data_tx, pattern, found_addresses_clone, port, epoch).await
            {
                tracing::error!(%error, "osc server stopped");
            }
        });

        Self {
            data_rx,
            found_addresses,
        }
    }

    async fn recv_loop(
        tx: Sender<PositionUpdate>,
        pattern: WildMatch,
        found_addresses: Arc<Mutex<HashSet<String>>>,
        port: u16,
        epoch: Instant,
    ) -> anyhow::Result<()> {
        let socket = UdpSocket::bind(("0.0.0.0", port)).await?;
        tracing::info!(port, "listening for osc updates");

        let mut buffer = [0; rosc::decoder::MTU];
        loop {
            let (size, _) = socket.recv_from(&mut buffer).await?;
            // garbage datagrams are dropped, never faulted on
            let Ok((_, packet)) = rosc::decoder::decode_udp(&buffer[..size]) else {
                tracing::debug!(size, "skipping undecodable datagram");
                continue;
            };
            let timestamp = epoch.elapsed().as_secs_f64();
            handle_packet(packet, &tx, &pattern, &found_addresses, timestamp)?;
        }
    }

    /// Non-blocking read of the next buffered update, if any.
    pub fn try_read_update(&self) -> Option<PositionUpdate> {
        self.data_rx.try_recv().ok()
    }

    /// Every address seen on the socket so far, matched or not. Useful for
    /// figuring out what a game actually publishes.
    pub fn found_addresses(&self) -> HashSet<String> {
        self.found_addresses
            .lock()
            .expect("address set lock poisoned")
            .clone()
    }
}

/// Unpacks bundles recursively; forwards matching float messages.
fn handle_packet(
    packet: OscPacket,
    tx: &Sender<PositionUpdate>,
    pattern: &WildMatch,
    found_addresses: &Arc<Mutex<HashSet<String>>>,
    timestamp: f64,
) -> anyhow::Result<()> {
    match packet {
        OscPacket::Message(OscMessage { addr, args }) => {
            let Some(OscType::Float(value)) = args.into_iter().next() else {
                return Ok(());
            };

            let newly_seen = found_addresses
                .lock()
                .expect("address set lock poisoned")
                .insert(addr.clone());
            if newly_seen {
                tracing::debug!(address = %addr, "new osc address");
            }

            if pattern.matches(&addr) {
                tx.send(PositionUpdate {
                    address: addr,
                    value,
                    timestamp,
                })?;
            }
        }
        OscPacket::Bundle(bundle) => {
            for inner in bundle.content {
                handle_packet(inner, tx, pattern, found_addresses, timestamp)?;
            }
        }
    }
    Ok(())
}
