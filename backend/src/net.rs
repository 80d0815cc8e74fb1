// Network helpers for the subscriber listener.

use std::net::{IpAddr, Ipv4Addr, SocketAddr, TcpListener};

use anyhow::Context;
use if_addrs::get_if_addrs;

/// Binds the subscriber listener up front so a bad address fails startup.
pub fn bind_listener(addr: SocketAddr) -> anyhow::Result<TcpListener> {
    let listener = TcpListener::bind(addr)
        .with_context(|| format!("failed to bind websocket listener on {addr}"))?;
    listener
        .set_nonblocking(true)
        .context("failed to make websocket listener non-blocking")?;
    Ok(listener)
}

/// `ws://` URLs a client on the network can use to reach `local`.
pub fn advertised_urls(local: SocketAddr) -> Vec<String> {
    let ips = if local.ip().is_unspecified() {
        let mut ips = interface_ipv4s();
        if ips.is_empty() {
            ips.push(IpAddr::V4(Ipv4Addr::LOCALHOST));
        }
        ips
    } else {
        vec![local.ip()]
    };
    ips.into_iter()
        .map(|ip| format!("ws://{}", SocketAddr::new(ip, local.port())))
        .collect()
}

fn interface_ipv4s() -> Vec<IpAddr> {
    let ifaces = match get_if_addrs() {
        Ok(ifaces) => ifaces,
        Err(_) => return Vec::new(),
    };
    let mut ips: Vec<IpAddr> = ifaces
        .into_iter()
        .filter_map(|iface| match iface.addr {
            if_addrs::IfAddr::V4(v4) if !v4.ip.is_loopback() && !v4.ip.is_link_local() => {
                Some(IpAddr::V4(v4.ip))
            }
            _ => None,
        })
        .collect();
    ips.sort_by_key(|ip| match ip {
        IpAddr::V4(v4) if is_private_ipv4(*v4) => 0,
        _ => 1,
    });
    ips.dedup();
    ips
}

pub fn is_private_ipv4(ip: Ipv4Addr) -> bool {
    let octets = ip.octets();
    match octets {
        [10, ..] => true,
        [172, second, ..] if (16..=31).contains(&second) => true,
        [192, 168, ..] => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_private_ranges() {
        assert!(is_private_ipv4(Ipv4Addr::new(10, 1, 2, 3)));
        assert!(is_private_ipv4(Ipv4Addr::new(172, 16, 0, 1)));
        assert!(!is_private_ipv4(Ipv4Addr::new(172, 32, 0, 1)));
        assert!(is_private_ipv4(Ipv4Addr::new(192, 168, 1, 20)));
        assert!(!is_private_ipv4(Ipv4Addr::new(8, 8, 8, 8)));
    }

    #[test]
    fn specific_bind_is_advertised_as_is() {
        let local: SocketAddr = "127.0.0.1:8765".parse().unwrap();
        assert_eq!(advertised_urls(local), vec!["ws://127.0.0.1:8765".to_string()]);
    }

    #[test]
    fn unspecified_bind_advertises_at_least_one_url() {
        let local: SocketAddr = "0.0.0.0:8765".parse().unwrap();
        let urls = advertised_urls(local);
        assert!(!urls.is_empty());
        assert!(urls.iter().all(|url| url.starts_with("ws://") && url.ends_with(":8765")));
    }

    #[test]
    fn occupied_port_fails_to_bind() {
        let first = bind_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = first.local_addr().unwrap();
        let err = bind_listener(addr).unwrap_err();
        assert!(err.to_string().contains(&addr.to_string()));
    }
}
