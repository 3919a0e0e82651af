pub mod api;
pub mod metrics;
pub mod source;

pub use api::{HnClient, HnItem, HnUser, StoryCategory};
pub use metrics::{ApiMetrics, MetricsCollector, RequestMetrics};
pub use source::ItemSource;
