//! Wildcard matching for actor type filters.
//!
//! Filters such as `vehicle.*` or `walker.pedestrian.000?` select actors
//! and blueprints by type id. `*` matches any run of characters (including
//! none) and `?` matches exactly one character. Everything else matches
//! itself.

/// Whether `text` matches the wildcard `pattern`.
pub fn wildcard_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let mut p: usize = 0;
    let mut t: usize = 0;
    // Position of the last `*` seen, and the text position it was matched at.
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match (pattern.get(p), text.get(t)) {
            (Some('*'), _) => {
                backtrack = Some((p, t));
                p = p.saturating_add(1);
            }
            (Some(&pc), Some(&tc)) if pc == '?' || pc == tc => {
                p = p.saturating_add(1);
                t = t.saturating_add(1);
            }
            _ => match backtrack {
                Some((star, matched)) => {
                    let next = matched.saturating_add(1);
                    backtrack = Some((star, next));
                    p = star.saturating_add(1);
                    t = next;
                }
                None => return false,
            },
        }
    }

    while pattern.get(p) == Some(&'*') {
        p = p.saturating_add(1);
    }
    p == pattern.len()
}
