//! Glob matching for `SCAN ... MATCH`
//!
//! Supports `*`, `?`, character classes (`[abc]`, `[a-z]`, `[^x]`) and
//! backslash escapes.

/// Whether `text` matches `pattern`
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    match_from(&p, &t)
}

fn match_from(p: &[char], t: &[char]) -> bool {
    let Some((&head, rest)) = p.split_first() else {
        return t.is_empty();
    };
    match head {
        '*' => {
            // Collapse runs of stars
            let rest = {
                let mut r = rest;
                while r.first() == Some(&'*') {
                    r = &r[1..];
                }
                r
            };
            if rest.is_empty() {
                return true;
            }
            (0..=t.len()).any(|skip| match_from(rest, &t[skip..]))
        }
        '?' => !t.is_empty() && match_from(rest, &t[1..]),
        '[' => {
            let Some((&c, t_rest)) = t.split_first() else {
                return false;
            };
            match class_matches(rest, c) {
                Some((true, after)) => match_from(after, t_rest),
                Some((false, _)) => false,
                // Unterminated class: treat '[' literally
                None => c == '[' && match_from(rest, t_rest),
            }
        }
        '\\' if !rest.is_empty() => {
            !t.is_empty() && t[0] == rest[0] && match_from(&rest[1..], &t[1..])
        }
        literal => !t.is_empty() && t[0] == literal && match_from(rest, &t[1..]),
    }
}

/// Evaluate a class body starting after '['
///
/// Returns whether `c` matched and the pattern after the closing ']'.
fn class_matches(body: &[char], c: char) -> Option<(bool, &[char])> {
    let (negated, mut i) = match body.first() {
        Some('^') => (true, 1),
        _ => (false, 0),
    };
    let mut matched = false;
    while i < body.len() {
        match body[i] {
            ']' => return Some((matched != negated, &body[i + 1..])),
            '\\' if i + 1 < body.len() => {
                matched |= body[i + 1] == c;
                i += 2;
            }
            lo if i + 2 < body.len() && body[i + 1] == '-' && body[i + 2] != ']' => {
                let hi = body[i + 2];
                let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
                matched |= (lo..=hi).contains(&c);
                i += 3;
            }
            single => {
                matched |= single == c;
                i += 1;
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_and_question() {
        assert!(glob_match("*", ""));
        assert!(glob_match("*", "anything"));
        assert!(glob_match("user:*", "user:42"));
        assert!(!glob_match("user:*", "item:42"));
        assert!(glob_match("h?llo", "hello"));
        assert!(!glob_match("h?llo", "hllo"));
        assert!(glob_match("a*b*c", "aXXbYYc"));
        assert!(!glob_match("a*b*c", "aXXbYY"));
    }

    #[test]
    fn test_classes() {
        assert!(glob_match("h[ae]llo", "hallo"));
        assert!(!glob_match("h[ae]llo", "hillo"));
        assert!(glob_match("h[^e]llo", "hallo"));
        assert!(!glob_match("h[^e]llo", "hello"));
        assert!(glob_match("k[0-9]", "k7"));
        assert!(!glob_match("k[0-9]", "kx"));
    }

    #[test]
    fn test_escapes() {
        assert!(glob_match("a\\*b", "a*b"));
        assert!(!glob_match("a\\*b", "axb"));
    }

    #[test]
    fn test_unterminated_class_is_literal() {
        assert!(glob_match("a[b", "a[b"));
    }
}
