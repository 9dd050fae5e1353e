/// URL-safe identifier derivation for posts and categories.
///
/// Lowercase, strip everything outside `[a-z0-9\s-]`, collapse whitespace
/// and hyphen runs to a single hyphen, trim hyphens at the ends. Collision
/// handling differs per entity and lives with the storage layer: category
/// slugs must be free, post slugs get a numeric suffix.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_hyphen = false;

    for ch in input.to_lowercase().chars() {
        match ch {
            'a'..='z' | '0'..='9' => {
                if pending_hyphen && !slug.is_empty() {
                    slug.push('-');
                }
                pending_hyphen = false;
                slug.push(ch);
            }
            '-' => pending_hyphen = true,
            c if c.is_whitespace() => pending_hyphen = true,
            _ => {}
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_punctuation_and_lowercases() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
    }

    #[test]
    fn collapses_whitespace_and_hyphen_runs() {
        assert_eq!(slugify("  multiple   spaces--here "), "multiple-spaces-here");
    }

    #[test]
    fn trims_leading_and_trailing_hyphens() {
        assert_eq!(slugify("--Edge Case--"), "edge-case");
        assert_eq!(slugify(" - - "), "");
    }

    #[test]
    fn keeps_digits() {
        assert_eq!(slugify("Top 10 Rust Crates of 2026"), "top-10-rust-crates-of-2026");
    }

    #[test]
    fn non_ascii_is_dropped() {
        assert_eq!(slugify("Caffè Über Alles"), "caff-ber-alles");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn mixed_separators_collapse() {
        assert_eq!(slugify("a - b -- c"), "a-b-c");
    }
}
