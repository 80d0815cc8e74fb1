// UDP pose ingest: one JSON pose frame per datagram from the vision process.
// Invariants: datagrams from peers other than the configured one are ignored;
// payloads are never logged.

use std::net::{IpAddr, SocketAddr};

use gesture_core::{parse_frame, PoseFrame};
use tokio::net::UdpSocket;
use tokio::time::Instant;
use tracing::{debug, info};

use super::{peer_allowed, PoseSource, SourceError};
use crate::constants::{INSPECT_LOG_INTERVAL_MS, MAX_DATAGRAM_LEN};
use crate::utils::{monotonic_ms, throttle_elapsed};

pub struct UdpPoseSource {
    socket: UdpSocket,
    allowed_peer: Option<IpAddr>,
    buf: Vec<u8>,
    start: Instant,
    datagrams: u64,
    last_inspect_log_ms: Option<u64>,
}

impl UdpPoseSource {
    pub async fn bind(addr: SocketAddr, allowed_peer: Option<IpAddr>) -> std::io::Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        info!(addr = %socket.local_addr()?, ?allowed_peer, "pose udp ingest started");
        Ok(Self {
            socket,
            allowed_peer,
            buf: vec![0u8; MAX_DATAGRAM_LEN],
            start: Instant::now(),
            datagrams: 0,
            last_inspect_log_ms: None,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

impl PoseSource for UdpPoseSource {
    async fn next_frame(&mut self) -> Option<Result<PoseFrame, SourceError>> {
        loop {
            let (len, source) = match self.socket.recv_from(&mut self.buf).await {
                Ok(recv) => recv,
                Err(err) => return Some(Err(SourceError::Io(err))),
            };
            if !peer_allowed(self.allowed_peer, source) {
                debug!(%source, "ignoring datagram from unexpected peer");
                continue;
            }
            self.datagrams += 1;

            let frame = parse_frame(&self.buf[..len]).map_err(SourceError::Decode);
            let now_ms = monotonic_ms(self.start);
            if throttle_elapsed(&mut self.last_inspect_log_ms, now_ms, INSPECT_LOG_INTERVAL_MS) {
                info!(
                    %source,
                    len,
                    datagrams = self.datagrams,
                    hands = frame.as_ref().map(|frame| frame.hands.len()).ok(),
                    "pose inspect"
                );
            }
            return Some(frame);
        }
    }
}
