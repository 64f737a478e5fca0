//! Turn raw mention text into the question sent downstream.

use std::sync::LazyLock;

use regex::Regex;

#[allow(clippy::expect_used)]
static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("URL pattern compiles"));

#[allow(clippy::expect_used)]
static HANDLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@[A-Za-z0-9_]+").expect("handle pattern compiles"));

/// Strip URLs and `@handles`, collapse whitespace, trim.
///
/// Idempotent: `normalize(&normalize(s)) == normalize(s)`.
pub fn normalize(text: &str) -> String {
    let text = URL.replace_all(text, " ");
    let text = HANDLE.replace_all(&text, " ");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_handles_and_urls() {
        assert_eq!(normalize("@bot price of btc? https://x"), "price of btc?");
        assert_eq!(
            normalize("  @cg_bot   what's\tthe\n\nETH mcap?  http://t.co/abc @someone "),
            "what's the ETH mcap?"
        );
    }

    #[test]
    fn keeps_punctuation_next_to_handles() {
        assert_eq!(normalize("hey @bot, price?"), "hey , price?");
        assert_eq!(normalize("mail me@example.com"), "mail me .com");
    }

    #[test]
    fn empty_and_mention_only() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("@bot"), "");
        assert_eq!(normalize("https://a.b/c"), "");
    }

    #[test]
    fn idempotent() {
        for sample in [
            "@bot price of btc? https://x",
            "a@bhttp://x y",
            "@@ab @ cd",
            "http://http://x",
            "hey @bot,\u{a0}price? (see https://cg.com/x)",
            "ÜBER @münchen coin",
            "",
        ] {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "sample {sample:?}");
        }
    }
}
