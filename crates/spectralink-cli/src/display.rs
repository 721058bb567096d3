//! Incremental printing of the rendered message list.

use spectralink_core::RenderedMessage;

/// Lines to print to move the terminal from `shown` to `next`.
///
/// The list is replaced wholesale on every poll. When the old list is a
/// prefix of the new one only the tail is printed; otherwise the whole
/// conversation is reprinted under a separator.
pub fn delta(shown: &[RenderedMessage], next: &[RenderedMessage]) -> Vec<String> {
    if next.len() >= shown.len() && next[..shown.len()] == *shown {
        return numbered(next, shown.len());
    }
    let mut lines = vec!["──────────".to_string()];
    lines.extend(numbered(next, 0));
    lines
}

fn numbered(messages: &[RenderedMessage], from: usize) -> Vec<String> {
    messages
        .iter()
        .enumerate()
        .skip(from)
        .map(|(i, m)| format!("{:>3} {}", i + 1, m))
        .collect()
}
