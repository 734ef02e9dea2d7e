// Output formatting — terminal display and report generation.

pub mod markdown;
pub mod terminal;

/// Flatten a text to one line and cap it at `max_chars` characters,
/// appending "..." if shortened.
///
/// Operates on characters, not bytes, so multi-byte content (emoji,
/// accents) never panics the slice. Newlines become spaces so tweet
/// previews stay on one terminal row.
pub fn preview(text: &str, max_chars: usize) -> String {
    let flat: String = text
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();

    if flat.chars().count() <= max_chars {
        flat
    } else {
        let shortened: String = flat.chars().take(max_chars).collect();
        format!("{shortened}...")
    }
}
