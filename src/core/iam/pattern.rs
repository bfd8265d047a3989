//! Pattern matching for rule targets
//!
//! Supports wildcards:
//! - `*` - Matches zero or more characters, including `/` and `.`
//! - `?` - Matches exactly one character
//!
//! Matching is case-sensitive and anchored at both ends. Every other character,
//! regex metacharacters included, matches literally.

/// Decides whether a rule's path patterns select a target identifier
///
/// The engine only ever calls [`PathMatcher::find`]; implementors that need
/// something smarter than "any pattern matches" can override it.
pub trait PathMatcher: Send + Sync {
    /// Check a single pattern against the target
    fn matches(&self, target: &str, pattern: &str) -> bool;

    /// Check whether any of `patterns` matches the target
    fn find(&self, target: &str, patterns: &[String]) -> bool {
        patterns.iter().any(|pattern| self.matches(target, pattern))
    }
}

/// Default shell-style glob matcher
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobMatcher;

impl PathMatcher for GlobMatcher {
    fn matches(&self, target: &str, pattern: &str) -> bool {
        glob_match(target, pattern)
    }
}

/// Match `target` against a glob `pattern`
///
/// Greedy two-pointer scan with a single backtrack anchor, O(N * M) worst case
/// and O(N + M) for typical patterns. Operates on bytes, so `?` consumes one
/// byte of a multi-byte UTF-8 character.
///
/// # Examples
/// ```
/// use policy_gate::glob_match;
///
/// assert!(glob_match("/api.v1.order.GetOrder", "/api.v1.*"));
/// assert!(glob_match("/a/b", "/a/?"));
/// assert!(!glob_match("/a/bc", "/a/?"));
/// ```
pub fn glob_match(target: &str, pattern: &str) -> bool {
    let t = target.as_bytes();
    let p = pattern.as_bytes();

    let mut ti = 0;
    let mut pi = 0;
    // (pattern index of the '*', target index it was anchored at)
    let mut anchor: Option<(usize, usize)> = None;

    while ti < t.len() {
        match p.get(pi).copied() {
            // A '*' in the pattern is always a wildcard, even against a literal '*'
            Some(b'*') => {
                anchor = Some((pi, ti));
                pi += 1;
            }
            Some(c) if c == b'?' || c == t[ti] => {
                ti += 1;
                pi += 1;
            }
            _ => match anchor {
                Some((star, matched)) => {
                    let matched = matched + 1;
                    anchor = Some((star, matched));
                    pi = star + 1;
                    ti = matched;
                }
                None => return false,
            },
        }
    }

    while p.get(pi) == Some(&b'*') {
        pi += 1;
    }

    pi == p.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(glob_match("/users/alice", "/users/alice"));
        assert!(!glob_match("/users/alice", "/users/bob"));
        assert!(!glob_match("/users/alice", "/users/alic"));
        assert!(!glob_match("/users/alic", "/users/alice"));
    }

    #[test]
    fn test_case_sensitive() {
        assert!(!glob_match("/Users/alice", "/users/alice"));
        assert!(!glob_match("GetOrder", "*getorder"));
    }

    #[test]
    fn test_star_crosses_separators() {
        assert!(glob_match("/a/b", "/a/*"));
        assert!(glob_match("/a/b/c/d", "/a/*"));
        assert!(glob_match("/a/", "/a/*"));
        assert!(!glob_match("/a", "/a/*"));
        assert!(glob_match("/api.v2.order.ListOrders", "/api.*.order.*"));
    }

    #[test]
    fn test_question_mark() {
        assert!(glob_match("/v1", "/v?"));
        assert!(!glob_match("/v", "/v?"));
        assert!(!glob_match("/v10", "/v?"));
        assert!(glob_match("/v10", "/v??"));
    }

    #[test]
    fn test_backtracking() {
        assert!(glob_match("abcbcd", "a*bcd"));
        assert!(glob_match("aXXbYYc", "a*b*c"));
        assert!(!glob_match("acb", "a*b*c"));
        assert!(glob_match("mississippi", "m*iss*ppi"));
        assert!(!glob_match("mississippi", "m*iss*ppx"));
    }

    #[test]
    fn test_trailing_stars() {
        assert!(glob_match("abc", "abc*"));
        assert!(glob_match("abc", "abc***"));
        assert!(!glob_match("abc", "abc*?"));
    }

    #[test]
    fn test_empty_inputs() {
        assert!(glob_match("", ""));
        assert!(glob_match("", "*"));
        assert!(glob_match("", "***"));
        assert!(!glob_match("", "?"));
        assert!(!glob_match("", "a*"));
        assert!(!glob_match("a", ""));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        assert!(glob_match("/a.b", "/a.b"));
        assert!(!glob_match("/aXb", "/a.b"));
        assert!(glob_match("[x]+", "[x]+"));
        assert!(!glob_match("x", "[x]"));
    }

    #[test]
    fn test_literal_star_in_target() {
        assert!(glob_match("*x", "*"));
        assert!(glob_match("*", "*"));
        assert!(glob_match("a*bc", "a*c"));
        assert!(glob_match("/admin/**", "/admin/*"));
        assert!(glob_match("/admin/*/x", "/admin/*"));
        assert!(!glob_match("*x", "*y"));
        assert!(glob_match("?*", "??"));
    }

    #[test]
    fn test_find_any_pattern() {
        let matcher = GlobMatcher;
        let patterns = vec!["/admin/*".to_string(), "/api.v1.*".to_string()];

        assert!(matcher.find("/admin/users", &patterns));
        assert!(matcher.find("/api.v1.order.GetOrder", &patterns));
        assert!(!matcher.find("/public/index", &patterns));
        assert!(!matcher.find("/admin/users", &[]));
    }
}
