// Startup configuration read from environment variables.
// Invariants: a value that is set but cannot be parsed is a startup error, never a silent default.

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};

use crate::constants::{
    DEFAULT_SEND_TIMEOUT_MS, DEFAULT_SUBSCRIBER_BUFFER, DEFAULT_UDP_BIND, DEFAULT_UDP_PORT,
    DEFAULT_WS_BIND, DEFAULT_WS_PORT,
};
use crate::source::ReplayInput;

#[derive(Clone, Debug, PartialEq)]
pub enum SourceConfig {
    Udp {
        bind: SocketAddr,
        allowed_peer: Option<IpAddr>,
    },
    Replay {
        input: ReplayInput,
        pace: bool,
        looping: bool,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub ws_addr: SocketAddr,
    pub source: SourceConfig,
    pub send_timeout: Duration,
    pub subscriber_buffer: usize,
    pub codes_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let ws_bind: IpAddr = parse_or(&get, "GESTURE_WS_BIND", DEFAULT_WS_BIND.parse()?)?;
        let ws_port: u16 = parse_or(&get, "GESTURE_WS_PORT", DEFAULT_WS_PORT)?;

        let source = match get("GESTURE_SOURCE").as_deref() {
            None | Some("udp") => {
                let bind: IpAddr = parse_or(&get, "GESTURE_UDP_BIND", DEFAULT_UDP_BIND.parse()?)?;
                let port: u16 = parse_or(&get, "GESTURE_UDP_PORT", DEFAULT_UDP_PORT)?;
                let allowed_peer = parse_opt::<IpAddr, _>(&get, "GESTURE_UDP_PEER")?;
                SourceConfig::Udp {
                    bind: SocketAddr::new(bind, port),
                    allowed_peer,
                }
            }
            Some("replay") => {
                let input = match get("GESTURE_REPLAY_PATH").as_deref() {
                    Some("-") => ReplayInput::Stdin,
                    Some(path) => ReplayInput::File(PathBuf::from(path)),
                    None => bail!("GESTURE_REPLAY_PATH is required when GESTURE_SOURCE=replay"),
                };
                let pace = parse_bool_or(&get, "GESTURE_REPLAY_PACE", true)?;
                let looping = parse_bool_or(&get, "GESTURE_REPLAY_LOOP", false)?;
                if looping && input == ReplayInput::Stdin {
                    bail!("GESTURE_REPLAY_LOOP cannot be used with stdin");
                }
                SourceConfig::Replay {
                    input,
                    pace,
                    looping,
                }
            }
            Some(other) => bail!("unknown GESTURE_SOURCE {other:?} (expected udp or replay)"),
        };

        let send_timeout_ms: u64 =
            parse_or(&get, "GESTURE_SEND_TIMEOUT_MS", DEFAULT_SEND_TIMEOUT_MS)?;
        if send_timeout_ms == 0 {
            bail!("GESTURE_SEND_TIMEOUT_MS must be positive");
        }
        let subscriber_buffer: usize =
            parse_or(&get, "GESTURE_SUBSCRIBER_BUFFER", DEFAULT_SUBSCRIBER_BUFFER)?;
        if subscriber_buffer == 0 {
            bail!("GESTURE_SUBSCRIBER_BUFFER must be positive");
        }

        Ok(Self {
            ws_addr: SocketAddr::new(ws_bind, ws_port),
            source,
            send_timeout: Duration::from_millis(send_timeout_ms),
            subscriber_buffer,
            codes_path: get("GESTURE_CODES_PATH").map(PathBuf::from),
        })
    }
}

fn parse_opt<T, G>(get: &G, key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    get(key)
        .map(|value| {
            value
                .parse::<T>()
                .map_err(|err| anyhow!("{err}"))
                .with_context(|| format!("invalid {key}={value:?}"))
        })
        .transpose()
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    Ok(parse_opt(get, key)?.unwrap_or(default))
}

fn parse_bool_or<G>(get: &G, key: &str, default: bool) -> anyhow::Result<bool>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key).map(|value| value.to_ascii_lowercase()).as_deref() {
        None => Ok(default),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => bail!("invalid {key}={other:?} (expected true or false)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::net::Ipv4Addr;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_listen_on_all_interfaces_port_8765() {
        let config = config(&[]).unwrap();
        assert_eq!(
            config.ws_addr,
            SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8765)
        );
        assert_eq!(
            config.source,
            SourceConfig::Udp {
                bind: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 5005),
                allowed_peer: None,
            }
        );
        assert_eq!(config.send_timeout, Duration::from_millis(250));
        assert_eq!(config.subscriber_buffer, 32);
        assert_eq!(config.codes_path, None);
    }

    #[test]
    fn reads_replay_settings() {
        let config = config(&[
            ("GESTURE_SOURCE", "replay"),
            ("GESTURE_REPLAY_PATH", "frames.jsonl"),
            ("GESTURE_REPLAY_PACE", "off"),
            ("GESTURE_REPLAY_LOOP", "true"),
            ("GESTURE_WS_PORT", "9001"),
        ])
        .unwrap();
        assert_eq!(config.ws_addr.port(), 9001);
        assert_eq!(
            config.source,
            SourceConfig::Replay {
                input: ReplayInput::File(PathBuf::from("frames.jsonl")),
                pace: false,
                looping: true,
            }
        );
    }

    #[test]
    fn dash_means_stdin() {
        let config = config(&[("GESTURE_SOURCE", "replay"), ("GESTURE_REPLAY_PATH", "-")]).unwrap();
        assert!(matches!(
            config.source,
            SourceConfig::Replay { input: ReplayInput::Stdin, .. }
        ));
    }

    #[test]
    fn invalid_values_are_errors() {
        assert!(config(&[("GESTURE_WS_PORT", "70000")]).is_err());
        assert!(config(&[("GESTURE_WS_BIND", "localhost:1")]).is_err());
        assert!(config(&[("GESTURE_SOURCE", "camera")]).is_err());
        assert!(config(&[("GESTURE_SOURCE", "replay")]).is_err());
        assert!(config(&[("GESTURE_SUBSCRIBER_BUFFER", "0")]).is_err());
        assert!(config(&[("GESTURE_UDP_PEER", "nope")]).is_err());
        assert!(config(&[
            ("GESTURE_SOURCE", "replay"),
            ("GESTURE_REPLAY_PATH", "-"),
            ("GESTURE_REPLAY_LOOP", "1"),
        ])
        .is_err());

        let err = config(&[("GESTURE_SEND_TIMEOUT_MS", "soon")]).unwrap_err();
        assert!(format!("{err:#}").contains("GESTURE_SEND_TIMEOUT_MS"));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = config(&[("GESTURE_WS_PORT", "  "), ("GESTURE_CODES_PATH", "")]).unwrap();
        assert_eq!(config.ws_addr.port(), 8765);
        assert_eq!(config.codes_path, None);
    }
}
