//! Boundary-aware dotted-name prefix matching.

/// Ordered set of dotted-name prefixes.
///
/// A candidate `n` matches prefix `p` iff `n == p`, or `n` starts with `p`
/// and the byte immediately after `p` in `n` is `.`. The boundary rule keeps
/// `java.lang.StringExploit` from matching a `java.lang.String` prefix.
///
/// Constructed once from static configuration and immutable thereafter.
/// Matching is case-sensitive, total over arbitrary strings, and allocates
/// nothing (it runs on every class resolution).
#[derive(Clone, Debug, Default)]
pub struct PrefixMatcher {
    prefixes: Vec<String>,
}

impl PrefixMatcher {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether `name` equals any prefix or is a dot-delimited descendant of
    /// one. An empty prefix list matches nothing.
    pub fn matches(&self, name: &str) -> bool {
        self.prefixes.iter().any(|p| prefix_matches(p, name))
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }
}

fn prefix_matches(prefix: &str, name: &str) -> bool {
    if name == prefix {
        return true;
    }
    name.len() > prefix.len()
        && name.starts_with(prefix)
        && name.as_bytes()[prefix.len()] == b'.'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match() {
        let matcher = PrefixMatcher::new(["java.lang.String"]);
        assert!(matcher.matches("java.lang.String"));
    }

    #[test]
    fn descendant_match_requires_dot_boundary() {
        let matcher = PrefixMatcher::new(["java.lang.reflect"]);
        assert!(matcher.matches("java.lang.reflect.Method"));
        assert!(!matcher.matches("java.lang.reflection"));
        assert!(!matcher.matches("java.lang.reflectX.Method"));
    }

    #[test]
    fn sibling_class_with_common_stem_does_not_match() {
        let matcher = PrefixMatcher::new(["java.lang.String"]);
        assert!(!matcher.matches("java.lang.StringBuilder"));
        assert!(!matcher.matches("java.lang.StringExploit"));
    }

    #[test]
    fn empty_list_matches_nothing() {
        let matcher = PrefixMatcher::default();
        assert!(!matcher.matches("java.lang.String"));
        assert!(!matcher.matches(""));
    }

    #[test]
    fn total_over_odd_inputs() {
        let matcher = PrefixMatcher::new(["a.b"]);
        assert!(!matcher.matches(""));
        assert!(!matcher.matches("."));
        assert!(!matcher.matches("a"));
        assert!(matcher.matches("a.b.c"));
        assert!(!matcher.matches("a.bc"));
        assert!(!matcher.matches("\u{0}a.b"));
        assert!(!matcher.matches("ид.b"));
    }

    #[test]
    fn matching_is_case_sensitive() {
        let matcher = PrefixMatcher::new(["host.App"]);
        assert!(!matcher.matches("host.app"));
        assert!(matcher.matches("host.App.Window"));
    }

    #[test]
    fn multibyte_name_after_boundary() {
        let matcher = PrefixMatcher::new(["host.app"]);
        assert!(matcher.matches("host.app.книга"));
    }
}
