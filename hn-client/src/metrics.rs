use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::RwLock;

/// Aggregate request counters for the API client, exposed through the
/// scheduler status surface.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiMetrics {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    /// Requests that succeeded but returned no item (deleted/missing).
    pub absent_items: u64,
    pub total_response_time: Duration,
    pub last_request_time: Option<SystemTime>,
}

impl ApiMetrics {
    pub fn average_response_time(&self) -> Duration {
        if self.total_requests == 0 {
            Duration::from_millis(0)
        } else {
            self.total_response_time / self.total_requests as u32
        }
    }

    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.successful_requests as f64 / self.total_requests as f64
        }
    }
}

#[derive(Debug, Clone)]
pub struct RequestMetrics {
    pub endpoint: String,
    pub response_time: Duration,
    pub success: bool,
    pub error_type: Option<String>,
}

#[derive(Debug, Default)]
pub struct MetricsCollector {
    metrics: Arc<RwLock<ApiMetrics>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record_request(&self, request: RequestMetrics) {
        let mut metrics = self.metrics.write().await;
        metrics.total_requests += 1;
        metrics.total_response_time += request.response_time;
        metrics.last_request_time = Some(SystemTime::now());

        if request.success {
            metrics.successful_requests += 1;
        } else {
            metrics.failed_requests += 1;
        }
    }

    pub async fn record_absent(&self) {
        let mut metrics = self.metrics.write().await;
        metrics.absent_items += 1;
    }

    pub async fn snapshot(&self) -> ApiMetrics {
        self.metrics.read().await.clone()
    }

    pub async fn reset(&self) {
        let mut metrics = self.metrics.write().await;
        *metrics = ApiMetrics::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_success_and_failure() {
        let collector = MetricsCollector::new();

        collector
            .record_request(RequestMetrics {
                endpoint: "/item/1.json".to_string(),
                response_time: Duration::from_millis(100),
                success: true,
                error_type: None,
            })
            .await;
        collector
            .record_request(RequestMetrics {
                endpoint: "/item/2.json".to_string(),
                response_time: Duration::from_millis(300),
                success: false,
                error_type: Some("timeout".to_string()),
            })
            .await;

        let metrics = collector.snapshot().await;
        assert_eq!(metrics.total_requests, 2);
        assert_eq!(metrics.successful_requests, 1);
        assert_eq!(metrics.failed_requests, 1);
        assert_eq!(metrics.average_response_time(), Duration::from_millis(200));
        assert_eq!(metrics.success_rate(), 0.5);
    }

    #[tokio::test]
    async fn absent_items_are_counted_separately() {
        let collector = MetricsCollector::new();
        collector.record_absent().await;
        collector.record_absent().await;

        let metrics = collector.snapshot().await;
        assert_eq!(metrics.absent_items, 2);
        assert_eq!(metrics.total_requests, 0);
    }

    #[tokio::test]
    async fn reset_clears_counters() {
        let collector = MetricsCollector::new();
        collector.record_absent().await;
        collector.reset().await;
        assert_eq!(collector.snapshot().await.absent_items, 0);
    }
}
