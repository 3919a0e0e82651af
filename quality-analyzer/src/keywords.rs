//! Keyword and domain tables the scorer matches against. Empirical
//! lists; tuned by observation, not derived.

pub const TECH_KEYWORDS: &[&str] = &[
    "algorithm",
    "implementation",
    "architecture",
    "performance",
    "open source",
    "api",
    "framework",
    "database",
    "docker",
    "kubernetes",
    "ai",
    "machine learning",
    "compiler",
    "rust",
    "golang",
    "python",
    "javascript",
    "typescript",
    "react",
    "vue",
    "angular",
    "node.js",
    "postgresql",
    "mongodb",
    "redis",
    "elasticsearch",
    "tensorflow",
    "pytorch",
    "microservices",
    "devops",
    "ci/cd",
    "testing",
    "security",
];

pub const ADVANCED_KEYWORDS: &[&str] = &[
    "distributed systems",
    "concurrency",
    "parallel processing",
    "optimization",
    "scalability",
    "fault tolerance",
    "consensus",
    "cryptography",
    "blockchain",
    "neural networks",
    "deep learning",
    "compiler design",
    "operating systems",
    "memory management",
    "garbage collection",
    "jit compilation",
    "virtualization",
];

pub const CREATION_WORDS: &[&str] = &["built", "created", "made", "developed", "wrote", "designed"];

pub const PERSONAL_INDICATORS: &[&str] = &["my", "i built", "i made", "i created", "i wrote"];

pub const DEMO_WORDS: &[&str] = &["demo", "try it", "live", "playground", "interactive"];

pub const SOLUTION_KEYWORDS: &[&str] = &[
    "solution",
    "solves",
    "fixes",
    "helps",
    "easier",
    "faster",
    "alternative",
    "replacement",
    "tool",
    "utility",
    "automates",
    "simplifies",
    "improves",
    "optimizes",
    "reduces",
    "eliminates",
];

pub const PAIN_POINT_KEYWORDS: &[&str] = &[
    "frustrating",
    "annoying",
    "difficult",
    "hard",
    "impossible",
    "slow",
    "inefficient",
    "manual",
    "tedious",
    "repetitive",
];

pub const SPAM_KEYWORDS: &[&str] = &[
    "cryptocurrency",
    "crypto",
    "nft",
    "blockchain",
    "earn money",
    "make money",
    "get rich",
    "investment",
    "trading",
    "forex",
    "click here",
    "limited time",
    "act now",
    "exclusive",
];

/// Hosts whose presence in a link counts toward technical depth.
pub const TECH_DOMAINS: &[&str] = &["github.com", "arxiv.org", "papers.withcode.com"];

pub const HIGH_REPUTATION_DOMAINS: &[&str] = &[
    "github.com",
    "arxiv.org",
    "papers.withcode.com",
    "medium.com",
    "dev.to",
    "hackernoon.com",
    "towardsdatascience.com",
    "stackoverflow.com",
    "reddit.com",
    "youtube.com",
    "microsoft.com",
    "google.com",
    "amazon.com",
    "facebook.com",
    "twitter.com",
    "linkedin.com",
    "ieee.org",
    "acm.org",
];

pub const MEDIUM_REPUTATION_DOMAINS: &[&str] = &[
    "substack.com",
    "hashnode.com",
    "blogspot.com",
    "wordpress.com",
    "gitlab.com",
    "bitbucket.org",
    "sourceforge.net",
];

pub const SUSPICIOUS_DOMAINS: &[&str] = &[
    "bit.ly",
    "tinyurl.com",
    "goo.gl",
    "t.co",
    "affiliate",
    "referral",
    "promo",
];
