/// Truncate a string for display by character count, appending `...`.
///
/// Counts characters, not bytes, so multi-byte UTF-8 is never split.
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}

/// Cap a string at `max_chars` characters with no marker.
///
/// Used for payload bounds where the receiver should see the raw prefix.
pub fn cap(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Return the last `n` non-empty-trimmed lines of `text`.
pub fn last_lines(text: &str, n: usize) -> Vec<&str> {
    let lines: Vec<&str> = text.trim().lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].to_vec()
}

/// Preview text for progress output: `limit` characters plus `...` when cut.
pub fn preview(text: &str, limit: usize) -> String {
    if text.chars().count() > limit {
        format!("{}...", cap(text, limit))
    } else {
        text.to_string()
    }
}
