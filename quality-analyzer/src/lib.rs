pub mod github;
pub mod keywords;
pub mod scorer;

pub use github::{GithubRepoSignal, RepoSignalSource};
pub use scorer::{PostContent, QualityAnalyzer};
