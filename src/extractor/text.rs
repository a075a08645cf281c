use regex::Regex;
use scraper::Html;
use std::sync::LazyLock;

/// Appended to every truncated excerpt.
pub const ELLIPSIS: &str = " ...";

static SPACES_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

// A period glued to the next word, unless it follows a digit ("2.5").
static JOINED_SENTENCE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9]\.\S").unwrap());

const HIDDEN_ELEMENTS: [&str; 3] = ["script", "style", "noscript"];

/// Plain text of an HTML fragment, whitespace-normalized.
pub fn clean(html: &str, title: &str) -> String {
    normalize(&strip_markup(html), title)
}

/// Normalizes text that is already plain; it is never parsed as markup.
///
/// The first occurrence of `title` is dropped so the headline is not repeated
/// in the body. Sentences whose separating markup vanished ("end.Start") get
/// their space back.
pub fn normalize(plain: &str, title: &str) -> String {
    let text = if title.is_empty() {
        plain.to_string()
    } else {
        plain.replacen(title, "", 1)
    };
    let text = text.replace('\t', " ");
    let text = SPACES_REGEX.replace_all(text.trim(), " ").into_owned();

    split_joined_sentences(text)
}

/// Excerpt of at most `max_len` characters, cut at a word boundary.
///
/// Text that already fits is returned whole, without the ellipsis.
pub fn excerpt(text: &str, max_len: usize) -> String {
    let flat = text.replace('\n', " ");
    let chars: Vec<char> = flat.chars().collect();
    if chars.len() <= max_len {
        return flat;
    }

    let mut end = max_len;
    if chars[max_len] != ' '
        && let Some(space) = chars[..max_len].iter().rposition(|&c| c == ' ')
    {
        end = space;
    }

    let mut snippet: String = chars[..end].iter().collect();
    snippet.truncate(snippet.trim_end().len());
    snippet.push_str(ELLIPSIS);
    snippet
}

/// Concatenated text nodes of `html`, skipping script and style bodies.
pub fn strip_markup(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::with_capacity(html.len());

    for node in fragment.tree.root().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| HIDDEN_ELEMENTS.contains(&el.name()))
        });
        if !hidden {
            out.push_str(text);
        }
    }

    out
}

fn split_joined_sentences(mut text: String) -> String {
    let joined: Vec<String> = JOINED_SENTENCE_REGEX
        .find_iter(&text)
        .map(|m| m.as_str().to_string())
        .collect();

    for src in joined {
        let dst = src.replacen('.', ". ", 1);
        text = text.replacen(&src, &dst, 1);
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_strips_markup() {
        let html = "<div><p>Hello   <b>world</b></p>\n\t<p>again &amp; again</p></div>";
        assert_eq!(clean(html, ""), "Hello world again & again");
    }

    #[test]
    fn test_clean_skips_script_and_style() {
        let html = "<p>Visible</p><script>var hidden = 1;</script><style>p{color:red}</style>";
        assert_eq!(clean(html, ""), "Visible");
    }

    #[test]
    fn test_clean_removes_first_title_occurrence() {
        let html = "<h1>Big News</h1><p>Big News is everywhere.</p>";
        assert_eq!(clean(html, "Big News"), "Big News is everywhere.");
    }

    #[test]
    fn test_clean_splits_joined_sentences() {
        let html = "<p>First sentence.</p><p>Second one.</p><p>Version 2.5 stays</p>";
        assert_eq!(
            clean(html, ""),
            "First sentence. Second one. Version 2.5 stays"
        );
    }

    #[test]
    fn test_clean_keeps_escaped_markup_as_text() {
        let html = "<p>Wrap it in a &lt;div&gt; element for layout.</p>";
        assert_eq!(clean(html, ""), "Wrap it in a <div> element for layout.");
    }

    #[test]
    fn test_normalize_does_not_parse_markup() {
        assert_eq!(
            normalize("Compare if a<b and b>c holds in the loop.", ""),
            "Compare if a<b and b>c holds in the loop."
        );
        assert_eq!(
            normalize("Wrap it in a <div> element.", ""),
            "Wrap it in a <div> element."
        );
    }

    #[test]
    fn test_normalize_title_and_whitespace() {
        assert_eq!(
            normalize("Big News\t\tBig News  is\neverywhere.Really", "Big News"),
            "Big News is everywhere. Really"
        );
    }

    #[test]
    fn test_clean_repeated_joins() {
        assert_eq!(clean("a.b and a.b", ""), "a. b and a. b");
    }

    #[test]
    fn test_excerpt_backs_up_to_space() {
        assert_eq!(excerpt("one two three four", 9), "one two ...");
    }

    #[test]
    fn test_excerpt_cut_on_word_boundary() {
        assert_eq!(excerpt("one two three four", 7), "one two ...");
    }

    #[test]
    fn test_excerpt_short_text_is_unchanged() {
        assert_eq!(excerpt("short text", 300), "short text");
        assert_eq!(excerpt("exactly", 7), "exactly");
    }

    #[test]
    fn test_excerpt_counts_characters_not_bytes() {
        let text = "Привет мир, как дела";
        let snippet = excerpt(text, 8);
        assert_eq!(snippet, "Привет ...");
    }

    #[test]
    fn test_excerpt_without_spaces_keeps_hard_cut() {
        assert_eq!(excerpt("abcdefghij", 4), "abcd ...");
    }

    #[test]
    fn test_excerpt_flattens_newlines() {
        assert_eq!(excerpt("line one\nline two", 100), "line one line two");
    }

    #[test]
    fn test_excerpt_length_bound() {
        let text = "lorem ipsum dolor sit amet ".repeat(40);
        let snippet = excerpt(&text, 300);
        let body = snippet.strip_suffix(ELLIPSIS).unwrap();
        assert!(body.chars().count() <= 300);
        assert!(text.starts_with(body));
    }
}
