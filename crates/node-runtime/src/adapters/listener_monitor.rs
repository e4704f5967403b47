//! Consumes `ListenerReport`s from tunnel accept loops.

use std::sync::Arc;

use market_telemetry::{
    log_event, metric_inc, ACTIVE_TUNNELS, COMPONENT_ERRORS, LISTENER_FAILURES,
};
use tm_02_order_processor::{ListenerOutcome, ListenerReport};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::adapters::tunnels::TunnelRegistry;

pub struct ListenerMonitor {
    reports: mpsc::Receiver<ListenerReport>,
    tunnels: Arc<TunnelRegistry>,
}

impl ListenerMonitor {
    pub fn new(reports: mpsc::Receiver<ListenerReport>, tunnels: Arc<TunnelRegistry>) -> Self {
        Self { reports, tunnels }
    }

    /// Runs until cancelled or until every launcher has gone away.
    /// Returns the number of failed listeners seen.
    pub async fn run(mut self, cancel: CancellationToken) -> u64 {
        let mut failures = 0;
        loop {
            let report = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                report = self.reports.recv() => match report {
                    Some(report) => report,
                    None => break,
                },
            };
            if self.observe(report) {
                failures += 1;
            }
        }
        failures
    }

    /// Returns `true` if the listener failed.
    fn observe(&self, report: ListenerReport) -> bool {
        self.tunnels.release(&report.order_uuid, report.port);
        ACTIVE_TUNNELS.set(self.tunnels.len() as i64);

        match report.outcome {
            ListenerOutcome::Stopped => {
                log_event!(
                    info,
                    "tunnel_listener",
                    "[tm-02] Tunnel stopped",
                    order_uuid = %report.order_uuid,
                    port = report.port
                );
                false
            }
            ListenerOutcome::Failed(reason) => {
                LISTENER_FAILURES.inc();
                metric_inc!(COMPONENT_ERRORS, &["tunnel_listener", "accept"]);
                log_event!(
                    error,
                    "tunnel_listener",
                    "[tm-02] Tunnel failed",
                    order_uuid = %report.order_uuid,
                    port = report.port,
                    reason = %reason
                );
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tm_02_order_processor::TunnelHandle;

    #[tokio::test]
    async fn test_reports_release_tunnels_and_count_failures() {
        let tunnels = Arc::new(TunnelRegistry::new());
        tunnels.insert("a", TunnelHandle::new(7001, CancellationToken::new()));
        tunnels.insert("b", TunnelHandle::new(7002, CancellationToken::new()));

        let (tx, rx) = mpsc::channel(4);
        let monitor = ListenerMonitor::new(rx, tunnels.clone());

        tx.send(ListenerReport {
            order_uuid: "a".into(),
            port: 7001,
            outcome: ListenerOutcome::Stopped,
        })
        .await
        .unwrap();
        tx.send(ListenerReport {
            order_uuid: "b".into(),
            port: 7002,
            outcome: ListenerOutcome::Failed("accept: too many open files".into()),
        })
        .await
        .unwrap();
        drop(tx);

        let failures = monitor.run(CancellationToken::new()).await;
        assert_eq!(failures, 1);
        assert!(tunnels.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_stops_monitor() {
        let (_tx, rx) = mpsc::channel(1);
        let monitor = ListenerMonitor::new(rx, Arc::new(TunnelRegistry::new()));
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert_eq!(monitor.run(cancel).await, 0);
    }
}
