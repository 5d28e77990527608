//! Heading id generation

/// Turn heading text into an id: lower-cased, with each whitespace run
/// replaced by a single `-`. Other characters are kept as they are.
pub fn slug(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_dash = false;

    for ch in text.trim().chars() {
        if ch.is_whitespace() {
            pending_dash = true;
            continue;
        }
        if pending_dash {
            out.push('-');
            pending_dash = false;
        }
        out.extend(ch.to_lowercase());
    }

    out
}
