//! TCP tunnel listener.
//!
//! Binds the assigned port and relays every accepted connection to the
//! descriptor's `target_host:target_port`. The relay is a plain byte copy
//! in both directions; no framing is added.

use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::{ListenerOutcome, ListenerReport, TunnelHandle, TunnelSpec};
use crate::ports::{LaunchError, TunnelLauncher};

/// Launcher that serves tunnels from tokio `TcpListener`s.
#[derive(Clone, Debug)]
pub struct TcpTunnelLauncher {
    bind_host: IpAddr,
    reports: mpsc::Sender<ListenerReport>,
}

impl TcpTunnelLauncher {
    /// `reports` receives one [`ListenerReport`] per listener when its accept
    /// loop ends.
    pub fn new(bind_host: IpAddr, reports: mpsc::Sender<ListenerReport>) -> Self {
        Self { bind_host, reports }
    }

    /// Launcher on all interfaces together with its report receiver.
    pub fn with_reports(capacity: usize) -> (Self, mpsc::Receiver<ListenerReport>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), tx), rx)
    }
}

#[async_trait]
impl TunnelLauncher for TcpTunnelLauncher {
    async fn launch(
        &self,
        spec: TunnelSpec,
        cancel: CancellationToken,
    ) -> Result<TunnelHandle, LaunchError> {
        if let Some(protocol) = spec.descriptor.protocol.as_deref() {
            if !protocol.eq_ignore_ascii_case("tcp") {
                return Err(LaunchError::Unsupported(format!("protocol {protocol}")));
            }
        }

        let listener = TcpListener::bind((self.bind_host, spec.port))
            .await
            .map_err(|e| LaunchError::Bind(e.to_string()))?;
        let local = listener
            .local_addr()
            .map_err(|e| LaunchError::Bind(e.to_string()))?;

        let target = spec.descriptor.target_addr();
        info!(
            uuid = %spec.order_uuid,
            listen = %local,
            %target,
            "Tunnel listener started"
        );

        tokio::spawn(accept_loop(
            listener,
            target,
            spec.order_uuid,
            cancel.clone(),
            self.reports.clone(),
        ));

        Ok(TunnelHandle::new(local.port(), cancel))
    }
}

async fn accept_loop(
    listener: TcpListener,
    target: String,
    order_uuid: String,
    cancel: CancellationToken,
    reports: mpsc::Sender<ListenerReport>,
) {
    let port = listener.local_addr().map(|a| a.port()).unwrap_or_default();

    let outcome = loop {
        tokio::select! {
            _ = cancel.cancelled() => break ListenerOutcome::Stopped,
            accepted = listener.accept() => match accepted {
                Ok((inbound, peer)) => {
                    debug!(uuid = %order_uuid, %peer, "Tunnel connection accepted");
                    tokio::spawn(relay(inbound, peer, target.clone(), cancel.clone()));
                }
                Err(e) => match classify_accept_error(&e) {
                    AcceptRecovery::Retry => {
                        debug!(uuid = %order_uuid, error = %e, "Connection dropped before accept");
                    }
                    AcceptRecovery::Backoff(pause) => {
                        warn!(uuid = %order_uuid, error = %e, "Out of descriptors, pausing accept");
                        tokio::select! {
                            _ = cancel.cancelled() => break ListenerOutcome::Stopped,
                            _ = tokio::time::sleep(pause) => {}
                        }
                    }
                    AcceptRecovery::Fail => break ListenerOutcome::Failed(e.to_string()),
                },
            },
        }
    };

    match &outcome {
        ListenerOutcome::Stopped => info!(uuid = %order_uuid, port, "Tunnel listener stopped"),
        ListenerOutcome::Failed(reason) => {
            warn!(uuid = %order_uuid, port, %reason, "Tunnel listener failed")
        }
    }

    let report = ListenerReport {
        order_uuid,
        port,
        outcome,
    };
    if reports.send(report).await.is_err() {
        debug!(port, "No listener health monitor attached");
    }
}

const DESCRIPTOR_BACKOFF: Duration = Duration::from_millis(100);

/// What the accept loop does after a failed `accept()`.
#[derive(Debug, PartialEq, Eq)]
enum AcceptRecovery {
    /// The error belonged to one connection; keep accepting.
    Retry,
    /// Process or system out of file descriptors; wait, then keep accepting.
    Backoff(Duration),
    /// The listener itself is broken.
    Fail,
}

fn classify_accept_error(e: &io::Error) -> AcceptRecovery {
    const ENFILE: i32 = 23;
    const EMFILE: i32 = 24;

    match e.kind() {
        io::ErrorKind::ConnectionAborted
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionRefused
        | io::ErrorKind::Interrupted
        | io::ErrorKind::WouldBlock => AcceptRecovery::Retry,
        _ if matches!(e.raw_os_error(), Some(ENFILE | EMFILE)) => {
            AcceptRecovery::Backoff(DESCRIPTOR_BACKOFF)
        }
        _ => AcceptRecovery::Fail,
    }
}

async fn relay(
    mut inbound: TcpStream,
    peer: SocketAddr,
    target: String,
    cancel: CancellationToken,
) {
    let mut upstream = match TcpStream::connect(&target).await {
        Ok(stream) => stream,
        Err(e) => {
            warn!(%peer, %target, error = %e, "Tunnel upstream unreachable");
            return;
        }
    };

    tokio::select! {
        _ = cancel.cancelled() => {}
        copied = tokio::io::copy_bidirectional(&mut inbound, &mut upstream) => match copied {
            Ok((to_upstream, to_client)) => {
                debug!(%peer, to_upstream, to_client, "Tunnel connection closed");
            }
            Err(e) => debug!(%peer, error = %e, "Tunnel connection aborted"),
        },
    }
}
