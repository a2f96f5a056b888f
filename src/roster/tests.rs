//! Roster Module Tests
//!
//! ## Test Scopes
//! - **Probe**: reachable vs unreachable addresses with real sockets.
//! - **Health state**: transitions driven by probes and dispatch outcomes.

#[cfg(test)]
mod tests {
    use crate::roster::service::{Roster, probe};
    use crate::roster::types::{WorkerHandle, WorkerState};
    use std::time::Duration;
    use tokio::net::TcpListener;

    const PROBE: Duration = Duration::from_millis(500);

    /// An address nothing listens on: bind, read the port, release it.
    async fn dead_addr() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);
        addr
    }

    // ============================================================
    // PROBE TESTS
    // ============================================================

    #[tokio::test]
    async fn test_probe_reachable_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        assert!(probe(&addr, PROBE).await);
    }

    #[tokio::test]
    async fn test_probe_unreachable_address() {
        let addr = dead_addr().await;
        assert!(!probe(&addr, PROBE).await);
    }

    // ============================================================
    // HEALTH STATE TESTS
    // ============================================================

    #[test]
    fn test_new_handle_is_unknown() {
        let handle = WorkerHandle::new("10.0.0.1:9002");
        assert_eq!(handle.state, WorkerState::Unknown);
        assert!(handle.last_healthy_ms.is_none());
        assert_eq!(handle.consecutive_failures, 0);
    }

    #[tokio::test]
    async fn test_roster_keeps_order_and_drops_duplicates() {
        let roster = Roster::new(
            vec![
                "127.0.0.1:1".to_string(),
                "127.0.0.1:2".to_string(),
                "127.0.0.1:1".to_string(),
            ],
            PROBE,
        );

        assert_eq!(roster.len(), 2);
        let addrs: Vec<String> = roster.snapshot().into_iter().map(|h| h.addr).collect();
        assert_eq!(addrs, vec!["127.0.0.1:1", "127.0.0.1:2"]);
    }

    #[tokio::test]
    async fn test_probe_updates_health() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let alive = listener.local_addr().unwrap().to_string();
        let dead = dead_addr().await;

        let roster = Roster::new(vec![alive.clone(), dead.clone()], PROBE);

        assert_eq!(roster.probe_all().await, 1);

        let alive_handle = roster.handle(&alive).unwrap();
        assert_eq!(alive_handle.state, WorkerState::Connected);
        assert!(alive_handle.last_healthy_ms.is_some());

        let dead_handle = roster.handle(&dead).unwrap();
        assert_eq!(dead_handle.state, WorkerState::Disconnected);
        assert_eq!(dead_handle.consecutive_failures, 1);

        assert_eq!(roster.healthy_count(), 1);
    }

    #[tokio::test]
    async fn test_failures_accumulate_until_success() {
        let roster = Roster::new(vec!["127.0.0.1:9".to_string()], PROBE);

        roster.mark_failed("127.0.0.1:9");
        roster.mark_failed("127.0.0.1:9");
        assert_eq!(roster.handle("127.0.0.1:9").unwrap().consecutive_failures, 2);

        roster.mark_healthy("127.0.0.1:9");
        let handle = roster.handle("127.0.0.1:9").unwrap();
        assert_eq!(handle.state, WorkerState::Connected);
        assert_eq!(handle.consecutive_failures, 0);
    }

    #[tokio::test]
    async fn test_marking_unknown_address_is_ignored() {
        let roster = Roster::new(vec!["127.0.0.1:9".to_string()], PROBE);
        roster.mark_failed("192.0.2.1:1");
        assert!(roster.handle("192.0.2.1:1").is_none());
    }

    #[tokio::test]
    async fn test_handle_serializes_for_api() {
        let roster = Roster::new(vec!["127.0.0.1:9".to_string()], PROBE);
        let json = serde_json::to_value(roster.snapshot()).unwrap();

        assert_eq!(json[0]["addr"], "127.0.0.1:9");
        assert_eq!(json[0]["state"], "Unknown");
    }
}
