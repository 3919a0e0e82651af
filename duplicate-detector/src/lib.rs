pub mod detector;
pub mod normalize;
pub mod similarity;

pub use detector::{
    content_fingerprint, DetectorThresholds, DuplicateAction, DuplicateDetector,
    KeepRecommendation, MatchReport,
};
pub use normalize::{normalize_content, normalize_title, normalize_url};
pub use similarity::similarity_ratio;
