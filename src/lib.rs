#![deny(clippy::unwrap_used)]
#![allow(clippy::from_over_into)]

pub mod catalog;
pub mod cms;
pub mod control;
pub mod notify;

/// Reads an env variable, trimming whitespace and treating empty values as unset.
pub fn env_trimmed(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn env_u64(key: &str, default_value: u64) -> u64 {
    env_trimmed(key)
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default_value)
}

/// Strips markup tags and collapses whitespace. CMS rich text arrives as HTML;
/// excerpts and notification bodies need plain text.
pub fn plain_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_tag = false;
    for ch in input.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn trim_to(input: &str, max: usize) -> String {
    if input.chars().count() <= max {
        return input.to_string();
    }
    input
        .chars()
        .take(max.saturating_sub(1))
        .collect::<String>()
        .trim_end()
        .to_string()
        + "…"
}

#[cfg(test)]
pub mod test {
    use super::*;

    #[test]
    fn strips_tags_from_rich_text() {
        assert_eq!(
            "Front splitter for BMW",
            plain_text("<p>Front  splitter</p> <b>for</b> BMW")
        );
    }

    #[test]
    fn trims_long_text_with_ellipsis() {
        assert_eq!("ab", trim_to("ab", 2));
        assert_eq!("a…", trim_to("abc", 2));
    }
}
