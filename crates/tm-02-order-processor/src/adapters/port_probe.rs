//! Port probing by bind-and-release.

use std::io::ErrorKind;
use std::net::{IpAddr, Ipv4Addr};

use async_trait::async_trait;
use tokio::net::TcpListener;

use crate::ports::{PortAllocator, PortError};

/// Probes a port by binding it on `host` and closing it again.
///
/// There is a window between the probe and the real bind in which another
/// process can take the port; the launcher reports that case separately.
#[derive(Clone, Copy, Debug)]
pub struct TcpPortProbe {
    host: IpAddr,
}

impl TcpPortProbe {
    pub fn new(host: IpAddr) -> Self {
        Self { host }
    }
}

impl Default for TcpPortProbe {
    fn default() -> Self {
        Self::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
    }
}

#[async_trait]
impl PortAllocator for TcpPortProbe {
    async fn probe(&self, port: u16) -> Result<(), PortError> {
        match TcpListener::bind((self.host, port)).await {
            Ok(listener) => {
                drop(listener);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::AddrInUse => Err(PortError::InUse(port)),
            Err(e) => Err(PortError::Io(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_probe_detects_busy_port() {
        let holder = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = holder.local_addr().unwrap().port();

        let probe = TcpPortProbe::new(IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(probe.probe(port).await, Err(PortError::InUse(port)));

        drop(holder);
        assert_eq!(probe.probe(port).await, Ok(()));
    }
}
