//! Glob patterns compiled to anchored regexes.
//!
//! Supported syntax, matched against `/`-separated relative paths:
//!
//! | Pattern  | Matches                                    |
//! |----------|--------------------------------------------|
//! | `*`      | any run of characters except `/`           |
//! | `**/`    | zero or more whole directories             |
//! | `**`     | anything, including `/` (trailing form)    |
//! | `?`      | one character except `/`                   |
//! | `[abc]`  | character class, `[!abc]` negates          |
//! | `{a,b}`  | alternation                                |
//!
//! A leading `/` is ignored, so `/**/*.html` and `**/*.html` are the same
//! pattern rooted at the walk directory.

use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GlobError {
    #[error("unclosed `{0}` in glob pattern `{1}`")]
    Unclosed(char, String),

    #[error("invalid glob pattern `{0}`: {1}")]
    Regex(String, #[source] regex::Error),
}

/// A compiled glob pattern.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    source: String,
    regex: Regex,
}

impl GlobPattern {
    pub fn new(pattern: &str) -> Result<Self, GlobError> {
        let trimmed = pattern.trim_start_matches('/');
        let translated = translate(trimmed, pattern)?;
        let regex = Regex::new(&format!("^{translated}$"))
            .map_err(|e| GlobError::Regex(pattern.to_string(), e))?;

        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Match a relative path using `/` as separator.
    #[inline]
    pub fn matches(&self, relative: &str) -> bool {
        self.regex.is_match(relative)
    }
}

fn translate(glob: &str, original: &str) -> Result<String, GlobError> {
    let chars: Vec<char> = glob.chars().collect();
    let mut out = String::with_capacity(glob.len() * 2);
    let mut in_braces = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '*' if chars.get(i + 1) == Some(&'*') => {
                let at_segment_start = i == 0 || chars[i - 1] == '/';
                if at_segment_start && chars.get(i + 2) == Some(&'/') {
                    out.push_str("(?:[^/]*/)*");
                    i += 3;
                    continue;
                }
                out.push_str(".*");
                i += 2;
                continue;
            }
            '*' => out.push_str("[^/]*"),
            '?' => out.push_str("[^/]"),
            '[' => {
                let close = chars[i + 1..]
                    .iter()
                    .position(|&ch| ch == ']')
                    .ok_or_else(|| GlobError::Unclosed('[', original.to_string()))?;
                let body: String = chars[i + 1..i + 1 + close].iter().collect();
                out.push('[');
                match body.strip_prefix('!') {
                    Some(negated) => {
                        out.push('^');
                        out.push_str(&escape_class(negated));
                    }
                    None => out.push_str(&escape_class(&body)),
                }
                out.push(']');
                i += close + 2;
                continue;
            }
            '{' if !in_braces => {
                in_braces = true;
                out.push_str("(?:");
            }
            ',' if in_braces => out.push('|'),
            '}' if in_braces => {
                in_braces = false;
                out.push(')');
            }
            _ => out.push_str(&regex::escape(&c.to_string())),
        }
        i += 1;
    }

    if in_braces {
        return Err(GlobError::Unclosed('{', original.to_string()));
    }

    Ok(out)
}

/// Escape characters that are special inside a regex class, keeping `-` ranges.
fn escape_class(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    for c in body.chars() {
        if matches!(c, '\\' | '[' | ']' | '^' | '&' | '~') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glob(p: &str) -> GlobPattern {
        GlobPattern::new(p).unwrap()
    }

    #[test]
    fn test_recursive_html() {
        let g = glob("/**/*.html");
        assert!(g.matches("index.html"));
        assert!(g.matches("a/b.html"));
        assert!(g.matches("a/b/c/d.html"));
        assert!(!g.matches("a/b.htm"));
        assert!(!g.matches("a/b.html.bak"));
    }

    #[test]
    fn test_single_star_stays_in_segment() {
        let g = glob("*.html");
        assert!(g.matches("index.html"));
        assert!(!g.matches("a/index.html"));
    }

    #[test]
    fn test_question_and_class() {
        let g = glob("page-?.[hx]tml");
        assert!(g.matches("page-1.html"));
        assert!(g.matches("page-a.xtml"));
        assert!(!g.matches("page-10.html"));

        let negated = glob("[!_]*.html");
        assert!(negated.matches("index.html"));
        assert!(!negated.matches("_draft.html"));
    }

    #[test]
    fn test_braces() {
        let g = glob("**/*.{html,htm}");
        assert!(g.matches("a/x.htm"));
        assert!(g.matches("x.html"));
        assert!(!g.matches("x.xml"));
    }

    #[test]
    fn test_literal_dot_is_escaped() {
        let g = glob("a.html");
        assert!(!g.matches("aXhtml"));
    }

    #[test]
    fn test_unclosed() {
        assert!(matches!(
            GlobPattern::new("*.{html"),
            Err(GlobError::Unclosed('{', _))
        ));
        assert!(matches!(
            GlobPattern::new("[ab"),
            Err(GlobError::Unclosed('[', _))
        ));
    }
}
