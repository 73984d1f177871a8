//! Turning URLs in the text into links.

use std::ops::Range;

use crate::interactive::annotation::{LinkAnnotation, Target};
use crate::text::Line;

const PREFIXES: [&str; 5] = ["http://", "https://", "ftp://", "mailto:", "www."];

/// Characters that end a sentence rather than a URL.
const TRAILING: &str = ".,;:!?'\")]}>";

/// A URL found in a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct WebLink {
    pub(crate) uri: String,
    /// The characters of the line covered by the URL.
    pub(crate) range: Range<usize>,
}

fn starts_with_ignore_case(chars: &[char], prefix: &str) -> bool {
    chars.len() >= prefix.len()
        && chars
            .iter()
            .zip(prefix.chars())
            .all(|(a, b)| a.eq_ignore_ascii_case(&b))
}

/// Find all URLs in a sequence of characters. A URL starts with a known prefix at the
/// start of a word and extends up to the next whitespace.
pub(crate) fn find_web_links(chars: &[char]) -> Vec<WebLink> {
    let mut links = vec![];
    let mut i = 0;

    while i < chars.len() {
        let word_start = i == 0 || !chars[i - 1].is_alphanumeric();
        let prefix = PREFIXES
            .iter()
            .find(|p| word_start && starts_with_ignore_case(&chars[i..], p));

        let Some(prefix) = prefix else {
            i += 1;
            continue;
        };

        let mut end = i;
        while end < chars.len() && !chars[end].is_whitespace() {
            end += 1;
        }

        while end > i && TRAILING.contains(chars[end - 1]) {
            end -= 1;
        }

        if end - i > prefix.len() {
            let text: String = chars[i..end].iter().collect();
            let uri = if *prefix == "www." {
                format!("http://{text}")
            } else {
                text
            };

            links.push(WebLink { uri, range: i..end });
            i = end;
        } else {
            i += prefix.len();
        }
    }

    links
}

/// Create the link annotations for the URLs in a line.
pub(crate) fn web_links(line: &Line, border_width: f32) -> Vec<LinkAnnotation> {
    find_web_links(&line.chars())
        .into_iter()
        .filter_map(|link| {
            let rect = line.bounds(link.range)?;
            Some(LinkAnnotation::new(rect, Target::Uri(link.uri)).with_border(border_width))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::tests::segment;
    use crate::text::TextLine;

    fn find(text: &str) -> Vec<WebLink> {
        find_web_links(&text.chars().collect::<Vec<_>>())
    }

    #[test]
    fn finds_all_prefixes() {
        let links = find(
            "see http://a.org, https://b.org ftp://c.org mailto:me@d.org or www.e.org.",
        );
        let uris: Vec<_> = links.iter().map(|l| l.uri.as_str()).collect();

        assert_eq!(
            uris,
            vec![
                "http://a.org",
                "https://b.org",
                "ftp://c.org",
                "mailto:me@d.org",
                "http://www.e.org"
            ]
        );
        assert_eq!(links[0].range, 4..16);
    }

    #[test]
    fn prefixes_only_match_at_word_starts() {
        assert!(find("awww.example.com").is_empty());
        assert!(find("http://").is_empty());
        assert_eq!(find("(WWW.Example.com)")[0].uri, "http://WWW.Example.com");
    }

    #[test]
    fn links_cover_the_url() {
        let mut line = TextLine::new();
        line.add(segment("go to www.x.com now", 100.0, 50.0));
        let line = line.flush().unwrap();

        let links = web_links(&line, 1.0);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].rect.left(), 130.0);
        assert_eq!(links[0].rect.right(), 175.0);
        assert_eq!(links[0].border_width, 1.0);
        assert_eq!(links[0].target, Target::Uri("http://www.x.com".to_string()));
    }
}
