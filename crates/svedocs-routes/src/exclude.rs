//! Glob-style exclusion patterns for the route scan.

use regex::RegexSet;

/// A compiled set of exclusion globs.
///
/// Supported syntax: `*` (within a segment), `**` (across segments), `?`,
/// and `{a,b}` alternatives. Patterns match the whole `/`-separated path
/// relative to the routes directory.
#[derive(Debug, Clone)]
pub struct ExcludeSet {
    set: RegexSet,
}

impl ExcludeSet {
    /// Compile a list of glob patterns.
    pub fn new<I, S>(patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let translated: Vec<String> = patterns
            .into_iter()
            .map(|p| glob_to_regex(p.as_ref()))
            .collect();

        Ok(Self {
            set: RegexSet::new(translated)?,
        })
    }

    /// An empty set that excludes nothing.
    pub fn empty() -> Self {
        Self {
            set: RegexSet::empty(),
        }
    }

    /// Whether `relative` matches any pattern.
    pub fn is_excluded(&self, relative: &str) -> bool {
        self.set.is_match(relative)
    }
}

impl Default for ExcludeSet {
    fn default() -> Self {
        Self::empty()
    }
}

/// Translate a glob into an anchored regular expression.
fn glob_to_regex(glob: &str) -> String {
    let glob = glob.strip_prefix("./").unwrap_or(glob);
    let chars: Vec<char> = glob.chars().collect();
    let mut out = String::from("^");
    let mut in_group = false;
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' if chars.get(i + 1) == Some(&'*') => {
                if chars.get(i + 2) == Some(&'/') {
                    out.push_str("(?:.*/)?");
                    i += 3;
                } else {
                    out.push_str(".*");
                    i += 2;
                }
                continue;
            }
            '*' => out.push_str("[^/]*"),
            '?' => out.push_str("[^/]"),
            '{' => {
                in_group = true;
                out.push_str("(?:");
            }
            '}' if in_group => {
                in_group = false;
                out.push(')');
            }
            ',' if in_group => out.push('|'),
            c => out.push_str(&regex::escape(&c.to_string())),
        }
        i += 1;
    }

    out.push('$');
    out
}
