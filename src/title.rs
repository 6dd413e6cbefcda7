use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();
}

/// Marketing noise stripped from product titles before display
const MARKETING_SUFFIXES: [&str; 10] = [
    " - Amazon.com",
    ", Amazon Exclusive",
    " (Discontinued by Manufacturer)",
    " (Old Version)",
    " (Latest Model)",
    " (Latest Version)",
    " (NOT for",
    " with Auto Backup",
    " for The ",
    " (Frustration-Free Packaging)",
];

const DETAIL_SEPARATOR: &str = " - ";
const ELLIPSIS: &str = "...";

/// Shown when a product has no title at all
pub const UNKNOWN_TITLE: &str = "Unknown Title";

/// Shorten a product title for a chart axis
///
/// Strips marketing suffixes, keeps only the product name before the first
/// `" - "` (what follows is usually a feature list), and hard-truncates to
/// `max_len` characters with a trailing `...`. Normalising an already
/// normalised title returns it unchanged.
///
/// # Examples
/// ```
/// use review_dashboard::title::normalize_title;
///
/// let title = normalize_title(Some("Echo Dot (Old Version) - Smart speaker with Alexa"), 40);
/// assert_eq!(title, "Echo Dot");
/// ```
pub fn normalize_title(title: Option<&str>, max_len: usize) -> String {
    let Some(title) = title else {
        return UNKNOWN_TITLE.to_string();
    };

    // Removing a suffix or collapsing whitespace can splice together another
    // suffix, so repeat until nothing changes
    let mut cleaned = title.to_string();
    loop {
        let mut next = WHITESPACE_RUN.replace_all(&cleaned, " ").into_owned();
        for suffix in MARKETING_SUFFIXES {
            next = next.replace(suffix, "");
        }
        if next == cleaned {
            break;
        }
        cleaned = next;
    }

    let name = cleaned
        .split(DETAIL_SEPARATOR)
        .next()
        .unwrap_or_default()
        .trim();

    truncate_chars(name, max_len)
}

/// Cut to at most `max_len` characters, marking the cut with `...`
fn truncate_chars(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }

    let keep = max_len.saturating_sub(ELLIPSIS.len());
    let mut short: String = text.chars().take(keep).collect();
    short.push_str(ELLIPSIS);
    short
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_suffixes_and_spec_list() {
        assert_eq!(
            normalize_title(Some("Kindle Paperwhite, Amazon Exclusive - 6\" High-Resolution Display"), 40),
            "Kindle Paperwhite"
        );
        assert_eq!(
            normalize_title(Some("USB Cable (Frustration-Free Packaging)"), 40),
            "USB Cable"
        );
    }

    #[test]
    fn long_titles_are_truncated_with_ellipsis() {
        let long = "Wireless Noise Cancelling Over Ear Headphones With Microphone";
        let short = normalize_title(Some(long), 40);
        assert_eq!(short.chars().count(), 40);
        assert!(short.ends_with("..."));
        assert!(short.starts_with("Wireless Noise Cancelling"));
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let title = "Câble de chargement rapide élégant pour téléphone et tablette";
        let short = normalize_title(Some(title), 20);
        assert_eq!(short.chars().count(), 20);
    }

    #[test]
    fn missing_title_has_placeholder() {
        assert_eq!(normalize_title(None, 40), UNKNOWN_TITLE);
    }

    #[test]
    fn normalisation_is_idempotent() {
        let samples = [
            "Fire TV Stick with Alexa Voice Remote - Amazon.com - Streaming Media Player",
            "SanDisk Ultra 32GB microSDHC UHS-I Card with Adapter, Grey/Red, Standard Packaging",
            "Echo Show 5 (Latest Model)   Compact smart display",
            "Cable  -  3ft",
            " - leading separator",
            "A (NOT (NOT for for) thing",
            "Speaker for  The Home",
            "Mount ,  Amazon Exclusive edition",
            "x",
        ];
        for max_len in [5, 20, 40] {
            for sample in samples {
                let once = normalize_title(Some(sample), max_len);
                let twice = normalize_title(Some(&once), max_len);
                assert_eq!(once, twice, "not idempotent for {:?} at {}", sample, max_len);
            }
        }
    }
}
