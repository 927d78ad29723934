/// Turn a display title into a URL-safe slug.
///
/// Letters are lowercased, letters and digits are kept, whitespace becomes a
/// single hyphen and all other characters are dropped. Leading and trailing
/// hyphens are stripped, so titles made only of punctuation yield `""`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for ch in title.chars() {
        if ch.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(ch.to_lowercase());
        } else if ch.is_whitespace() {
            pending_dash = true;
        }
    }

    slug
}
