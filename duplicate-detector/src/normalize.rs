//! Canonical forms for the three fields duplicate detection compares.
//! Two posts that differ only in tracking query parameters, punctuation,
//! whitespace, or forum prefixes normalize to identical strings.

use url::Url;

/// Query parameters that identify a click, not a resource.
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "mc_cid",
    "mc_eid",
    "_ga",
    "ref",
    "source",
];

/// Title prefixes the forum itself adds; stripped before content
/// comparison so "Show HN: Foo" and "Foo" compare equal.
const FORUM_PREFIXES: &[&str] = &["ask hn", "show hn", "tell hn", "hn", "poll"];

/// Lowercase, drop tracking parameters, drop the fragment, drop a
/// trailing slash. Unparseable input falls back to a lowercased trim.
pub fn normalize_url(url: &str) -> String {
    if url.is_empty() {
        return String::new();
    }

    let lowered = url.to_lowercase();
    let parsed = match Url::parse(&lowered) {
        Ok(parsed) => parsed,
        Err(_) => return lowered.trim().to_string(),
    };

    let host = match parsed.host_str() {
        Some(host) => host,
        None => return lowered.trim().to_string(),
    };

    let kept_params: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, _)| !TRACKING_PARAMS.contains(&k.as_ref()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut normalized = format!("{}://{}", parsed.scheme(), host);
    if let Some(port) = parsed.port() {
        normalized.push_str(&format!(":{}", port));
    }
    normalized.push_str(parsed.path().trim_end_matches('/'));

    if !kept_params.is_empty() {
        let query: String = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(kept_params)
            .finish();
        normalized.push('?');
        normalized.push_str(&query);
    }

    normalized
}

/// Lowercase, punctuation to spaces, whitespace collapsed.
pub fn normalize_title(title: &str) -> String {
    let lowered = title.to_lowercase();
    let stripped: String = lowered
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();
    collapse_whitespace(&stripped)
}

/// Markup tags removed, whitespace collapsed, lowercased, forum
/// prefixes stripped.
pub fn normalize_content(text: &str) -> String {
    let without_tags = strip_tags(text);
    let mut normalized = collapse_whitespace(&without_tags.to_lowercase());

    for prefix in FORUM_PREFIXES {
        if let Some(rest) = normalized.strip_prefix(prefix) {
            let rest = rest.strip_prefix(':').unwrap_or(rest);
            normalized = rest.trim_start().to_string();
        }
    }

    normalized.trim().to_string()
}

fn strip_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_tracking_parameters_are_dropped() {
        assert_eq!(
            normalize_url("https://example.com/article?utm_source=hn&utm_medium=social"),
            "https://example.com/article"
        );
        assert_eq!(
            normalize_url("https://example.com/article?id=7&utm_campaign=x"),
            "https://example.com/article?id=7"
        );
    }

    #[test]
    fn url_fragment_and_trailing_slash_are_dropped() {
        assert_eq!(
            normalize_url("https://Example.com/Path/#section"),
            "https://example.com/path"
        );
    }

    #[test]
    fn urls_differing_only_by_tracking_params_normalize_identically() {
        let a = normalize_url("https://blog.example.com/post?fbclid=abc123");
        let b = normalize_url("https://blog.example.com/post");
        assert_eq!(a, b);
    }

    #[test]
    fn unparseable_url_falls_back_to_lowercase_trim() {
        assert_eq!(normalize_url(" Not A Url "), "not a url");
        assert_eq!(normalize_url(""), "");
    }

    #[test]
    fn title_punctuation_and_case_are_ignored() {
        assert_eq!(
            normalize_title("Show HN: My  Tiny-Tool!!"),
            "show hn my tiny tool"
        );
    }

    #[test]
    fn content_tags_and_prefixes_are_stripped() {
        assert_eq!(
            normalize_content("Show HN: <p>I built  a thing</p>"),
            "i built a thing"
        );
        assert_eq!(normalize_content("Ask HN: how do I X?"), "how do i x?");
    }

    #[test]
    fn empty_inputs_stay_empty() {
        assert_eq!(normalize_title(""), "");
        assert_eq!(normalize_content(""), "");
    }
}
