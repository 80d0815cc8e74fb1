// Pose sources: adapters around the external landmark producer.
// Invariants: `None` means the stream is exhausted; `Some(Err)` is a single failed frame.

mod replay;
mod udp;

use std::fmt;
use std::future::Future;
use std::net::SocketAddr;

use anyhow::Context;
use gesture_core::{FrameError, PoseFrame};

use crate::config::SourceConfig;

pub use replay::{ReplayInput, ReplaySource};
pub use udp::UdpPoseSource;

#[derive(Debug)]
pub enum SourceError {
    Io(std::io::Error),
    Decode(FrameError),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::Io(err) => write!(f, "pose source read failed: {err}"),
            SourceError::Decode(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SourceError::Io(err) => Some(err),
            SourceError::Decode(err) => Some(err),
        }
    }
}

pub trait PoseSource: Send {
    fn next_frame(&mut self) -> impl Future<Output = Option<Result<PoseFrame, SourceError>>> + Send;
}

pub enum ConfiguredSource {
    Udp(UdpPoseSource),
    Replay(ReplaySource),
}

impl ConfiguredSource {
    pub async fn open(config: &SourceConfig) -> anyhow::Result<Self> {
        match config {
            SourceConfig::Udp { bind, allowed_peer } => {
                let source = UdpPoseSource::bind(*bind, *allowed_peer)
                    .await
                    .with_context(|| format!("failed to bind pose udp socket on {bind}"))?;
                Ok(ConfiguredSource::Udp(source))
            }
            SourceConfig::Replay { input, pace, looping } => {
                let source = ReplaySource::open(input.clone(), *pace, *looping)
                    .await
                    .with_context(|| format!("failed to open pose replay {input}"))?;
                Ok(ConfiguredSource::Replay(source))
            }
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ConfiguredSource::Udp(source) => match source.local_addr() {
                Ok(addr) => format!("udp://{addr}"),
                Err(_) => "udp".to_string(),
            },
            ConfiguredSource::Replay(source) => format!("replay {}", source.input()),
        }
    }
}

impl PoseSource for ConfiguredSource {
    async fn next_frame(&mut self) -> Option<Result<PoseFrame, SourceError>> {
        match self {
            ConfiguredSource::Udp(source) => source.next_frame().await,
            ConfiguredSource::Replay(source) => source.next_frame().await,
        }
    }
}

pub(crate) fn peer_allowed(allowed: Option<std::net::IpAddr>, source: SocketAddr) -> bool {
    allowed.map(|ip| ip == source.ip()).unwrap_or(true)
}
