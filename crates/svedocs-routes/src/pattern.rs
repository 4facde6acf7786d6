//! Compiled URL patterns and parameter extraction.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;

/// One segment of a URL pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal text, matched exactly
    Static(String),
    /// `:name`, matches exactly one segment
    Param(String),
    /// `*name`, matches one or more trailing segments
    CatchAll(String),
}

impl Segment {
    /// Precedence when two patterns match the same path: static beats
    /// param, param beats catch-all.
    fn rank(&self) -> u8 {
        match self {
            Self::Static(_) => 2,
            Self::Param(_) => 1,
            Self::CatchAll(_) => 0,
        }
    }
}

/// A captured path parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Param {
    /// Value of a `:name` segment
    One(String),
    /// Segments captured by `*name`
    Many(Vec<String>),
}

impl Param {
    /// The parameter as a single string; catch-all segments are joined by `/`.
    pub fn joined(&self) -> String {
        match self {
            Self::One(value) => value.clone(),
            Self::Many(values) => values.join("/"),
        }
    }
}

/// Parameters captured while matching a path.
pub type Params = BTreeMap<String, Param>;

/// A parsed URL pattern such as `/posts/:slug` or `/docs/*rest`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    segments: Vec<Segment>,
}

impl Pattern {
    /// Parse a pattern. Segments after a catch-all can never match and are
    /// kept as written.
    pub fn parse(pattern: &str) -> Self {
        let segments = split(pattern)
            .map(|s| {
                if let Some(name) = s.strip_prefix(':').filter(|n| !n.is_empty()) {
                    Segment::Param(name.to_string())
                } else if let Some(name) = s.strip_prefix('*').filter(|n| !n.is_empty()) {
                    Segment::CatchAll(name.to_string())
                } else {
                    Segment::Static(s.to_string())
                }
            })
            .collect();

        Self { segments }
    }

    /// Parsed segments.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Match a normalized request path, returning the captured parameters.
    pub fn matches(&self, path: &str) -> Option<Params> {
        let parts: Vec<&str> = split(path).collect();
        let mut params = Params::new();

        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Static(text) => {
                    if parts.get(i) != Some(&text.as_str()) {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    let value = parts.get(i)?;
                    params.insert(name.clone(), Param::One((*value).to_string()));
                }
                Segment::CatchAll(name) => {
                    let rest = &parts[i.min(parts.len())..];
                    if rest.is_empty() || i + 1 != self.segments.len() {
                        return None;
                    }
                    let values = rest.iter().map(|s| (*s).to_string()).collect();
                    params.insert(name.clone(), Param::Many(values));
                    return Some(params);
                }
            }
        }

        (parts.len() == self.segments.len()).then_some(params)
    }

    /// Compare specificity segment by segment; `Greater` is more specific.
    pub fn specificity(&self, other: &Pattern) -> Ordering {
        let ours = self.segments.iter().map(Segment::rank);
        let theirs = other.segments.iter().map(Segment::rank);
        ours.cmp(theirs)
    }
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_segments() {
        let pattern = Pattern::parse("/docs/:section/*rest");

        assert_eq!(
            pattern.segments(),
            &[
                Segment::Static("docs".to_string()),
                Segment::Param("section".to_string()),
                Segment::CatchAll("rest".to_string()),
            ]
        );
        assert!(Pattern::parse("/").segments().is_empty());
    }

    #[test]
    fn matches_static_paths() {
        let pattern = Pattern::parse("/posts");

        assert_eq!(pattern.matches("/posts"), Some(Params::new()));
        assert_eq!(pattern.matches("/posts/"), Some(Params::new()));
        assert_eq!(pattern.matches("/posts/a"), None);
        assert_eq!(pattern.matches("/"), None);
    }

    #[test]
    fn root_matches_only_root() {
        let pattern = Pattern::parse("/");

        assert!(pattern.matches("/").is_some());
        assert!(pattern.matches("/a").is_none());
    }

    #[test]
    fn captures_params() {
        let params = Pattern::parse("/posts/:slug").matches("/posts/hello").unwrap();

        assert_eq!(params.get("slug"), Some(&Param::One("hello".to_string())));
    }

    #[test]
    fn catch_all_needs_at_least_one_segment() {
        let pattern = Pattern::parse("/docs/*rest");

        assert!(pattern.matches("/docs").is_none());

        let params = pattern.matches("/docs/guide/install").unwrap();
        assert_eq!(
            params.get("rest"),
            Some(&Param::Many(vec!["guide".to_string(), "install".to_string()]))
        );
        assert_eq!(params["rest"].joined(), "guide/install");
    }

    #[test]
    fn literal_brackets_match_literally() {
        let pattern = Pattern::parse("/posts/[slug");

        assert!(pattern.matches("/posts/[slug").is_some());
        assert!(pattern.matches("/posts/hello").is_none());
    }

    #[test]
    fn ranks_static_over_param_over_catch_all() {
        let fixed = Pattern::parse("/posts/new");
        let param = Pattern::parse("/posts/:slug");
        let rest = Pattern::parse("/posts/*rest");

        assert_eq!(fixed.specificity(&param), Ordering::Greater);
        assert_eq!(param.specificity(&rest), Ordering::Greater);
        assert_eq!(rest.specificity(&fixed), Ordering::Less);
    }

    #[test]
    fn params_serialize_untagged() {
        let mut params = Params::new();
        params.insert("slug".to_string(), Param::One("a".to_string()));
        params.insert("rest".to_string(), Param::Many(vec!["b".to_string()]));

        let json = serde_json::to_string(&params).unwrap();

        assert_eq!(json, r#"{"rest":["b"],"slug":"a"}"#);
    }
}
