/// Minimal glob matcher for `FileAccessRule::glob` patterns: `*` matches any
/// run of characters within a path segment, `**` matches across segment
/// boundaries, everything else is literal. Enough for policy path rules
/// without pulling in a dedicated glob crate.
pub fn glob_match(pattern: &str, path: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let path: Vec<char> = path.chars().collect();
    matches(&pattern, &path)
}

fn matches(pattern: &[char], path: &[char]) -> bool {
    if pattern.is_empty() {
        return path.is_empty();
    }
    if pattern[0] == '*' {
        if pattern.len() >= 2 && pattern[1] == '*' {
            let rest = &pattern[2..];
            let rest = if rest.first() == Some(&'/') { &rest[1..] } else { rest };
            (0..=path.len()).any(|i| matches(rest, &path[i..]))
        } else {
            let rest = &pattern[1..];
            (0..=path.len()).filter(|&i| path[..i].iter().all(|&c| c != '/')).any(|i| matches(rest, &path[i..]))
        }
    } else if path.is_empty() {
        false
    } else if pattern[0] == path[0] {
        matches(&pattern[1..], &path[1..])
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_match() {
        assert!(glob_match("src/main.rs", "src/main.rs"));
        assert!(!glob_match("src/main.rs", "src/lib.rs"));
    }

    #[test]
    fn single_star_confined_to_segment() {
        assert!(glob_match("src/*.rs", "src/main.rs"));
        assert!(!glob_match("src/*.rs", "src/sub/main.rs"));
    }

    #[test]
    fn double_star_crosses_segments() {
        assert!(glob_match("**/*.rs", "src/sub/main.rs"));
        assert!(glob_match("**/*", "anything/at/all"));
    }
}
