//! Generic URL template matcher (C2).
//!
//! Grounded in the teacher's `Url::matches`/`starts_with` segment-comparison
//! style (`http/types.rs`), generalized from exact-byte comparison to the
//! exact-or-`{placeholder}` rule; the `{name}` placeholder syntax itself is
//! grounded in `other_examples/4adee13f_eze-works-vintage__src-server_config.rs.rs`'s
//! `{id}` segment matcher.

use crate::http::types::Url;

/// One URL shape with placeholder segments and query keys/values, parsed
/// once from a template string at startup (C2/C4, §4.4 "URL template table").
#[derive(Debug, Clone)]
pub(crate) struct Template {
    segments: Vec<Segment>,
    query: Option<Vec<(Segment, Segment)>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

impl Segment {
    fn parse(raw: &str) -> Self {
        if raw.starts_with('{') && raw.ends_with('}') && raw.len() >= 2 {
            Segment::Placeholder(raw[1..raw.len() - 1].to_string())
        } else {
            Segment::Literal(raw.to_string())
        }
    }

    fn matches(&self, value: &[u8]) -> bool {
        match self {
            Segment::Literal(lit) => lit.as_bytes() == value,
            Segment::Placeholder(_) => true,
        }
    }
}

impl Template {
    /// Parses a template string such as `/files/name/{name}?action=view`.
    pub(crate) fn parse(raw: &str) -> Self {
        let (path, query) = match raw.split_once('?') {
            Some((p, q)) => (p, Some(q)),
            None => (raw, None),
        };

        let segments = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(Segment::parse)
            .collect();

        let query = query.map(|q| {
            q.split('&')
                .map(|pair| match pair.split_once('=') {
                    Some((k, v)) => (Segment::parse(k), Segment::parse(v)),
                    None => (Segment::parse(pair), Segment::Literal(String::new())),
                })
                .collect()
        });

        Self { segments, query }
    }

    /// True iff `url` has the same segment/query shape as this template and
    /// every literal segment/key/value matches exactly (§4.2).
    pub(crate) fn matches(&self, url: &Url) -> bool {
        let parts = url.path_segments();
        if parts.len() != self.segments.len() {
            return false;
        }
        if !self.segments.iter().zip(parts.iter()).all(|(seg, part)| seg.matches(part)) {
            return false;
        }

        match (&self.query, url.query_full()) {
            (None, None) => true,
            (Some(tmpl_pairs), Some(_)) => {
                let Ok(url_pairs) = crate::http::query::Query::parse::<Vec<(&[u8], &[u8])>>(
                    url.query_full().unwrap(),
                    usize::MAX,
                ) else {
                    return false;
                };
                if url_pairs.len() != tmpl_pairs.len() {
                    return false;
                }
                tmpl_pairs
                    .iter()
                    .zip(url_pairs.iter())
                    .all(|((k, v), (uk, uv))| k.matches(uk) && v.matches(uv))
            }
            _ => false,
        }
    }

    /// Extracts the value bound to `{name}` from a matching URL, searching
    /// path segments first, then query pairs.
    pub(crate) fn extract<'u>(&self, name: &str, url: &'u Url) -> Option<&'u [u8]> {
        let parts = url.path_segments();
        for (seg, part) in self.segments.iter().zip(parts.iter()) {
            if let Segment::Placeholder(n) = seg {
                if n == name {
                    return Some(part);
                }
            }
        }

        if let Some(tmpl_pairs) = &self.query {
            if let Ok(url_pairs) =
                crate::http::query::Query::parse::<Vec<(&[u8], &[u8])>>(url.query_full()?, usize::MAX)
            {
                for ((k, v), (_, uv)) in tmpl_pairs.iter().zip(url_pairs.iter()) {
                    if let Segment::Placeholder(n) = v {
                        if n == name {
                            return Some(uv);
                        }
                    }
                    if let Segment::Placeholder(n) = k {
                        if n == name {
                            return Some(uv);
                        }
                    }
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_path_placeholder() {
        let tmpl = Template::parse("/files/name/{name}");
        let url = Url::parse(b"/files/name/a.txt");
        assert!(tmpl.matches(&url));
        assert_eq!(tmpl.extract("name", &url), Some(b"a.txt".as_slice()));
    }

    #[test]
    fn matches_query_placeholder() {
        let tmpl = Template::parse("/files/name/{name}?action=view");
        let matching = Url::parse(b"/files/name/a.txt?action=view");
        let wrong_action = Url::parse(b"/files/name/a.txt?action=download");
        assert!(tmpl.matches(&matching));
        assert!(!tmpl.matches(&wrong_action));
    }

    #[test]
    fn query_presence_must_agree() {
        let tmpl = Template::parse("/files/upload");
        let with_query = Url::parse(b"/files/upload?x=1");
        assert!(!tmpl.matches(&with_query));
    }

    #[test]
    fn segment_count_must_agree() {
        let tmpl = Template::parse("/files/name/{name}");
        let url = Url::parse(b"/files/name/a/b");
        assert!(!tmpl.matches(&url));
    }

    #[test]
    fn extracts_query_value_placeholder() {
        let tmpl = Template::parse("/files/id/{id}?action=update-name&value={value}");
        let url = Url::parse(b"/files/id/1?action=update-name&value=b.txt");
        assert!(tmpl.matches(&url));
        assert_eq!(tmpl.extract("id", &url), Some(b"1".as_slice()));
        assert_eq!(tmpl.extract("value", &url), Some(b"b.txt".as_slice()));
    }
}
