use log::debug;
use scraper::{Html, Node, Selector};
use std::fmt::Display;

use crate::error::WatchError;

/// Scans page content for configured keywords, with noisy regions removed
pub struct KeywordMatcher {
    /// Keywords to search for, lowercased once at construction
    keywords: Vec<String>,
    /// Regions whose text never participates in matching
    exclude: Vec<Selector>,
    /// Optional region the scan is restricted to; whole document when unset
    scope: Option<Selector>,
}

impl KeywordMatcher {
    /// Create a matcher for a static keyword set. Selector strings are
    /// validated here so a malformed configuration fails at startup.
    pub fn new(
        keywords: &[String],
        exclude_selectors: &[String],
        scan_selector: Option<&str>,
    ) -> Result<Self, WatchError> {
        let exclude = exclude_selectors
            .iter()
            .map(|s| parse_selector(s))
            .collect::<Result<Vec<_>, _>>()?;
        let scope = match scan_selector {
            Some(s) => Some(parse_selector(s)?),
            None => None,
        };

        Ok(Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            exclude,
            scope,
        })
    }

    /// Check whether any configured keyword appears in the page text.
    ///
    /// Excluded subtrees are detached from the parsed tree before any text is
    /// extracted, so their content cannot contribute to a match, not even a
    /// keyword spanning the region boundary. Content that yields no
    /// extractable text never matches.
    pub fn matches(&self, content: &str) -> bool {
        if self.keywords.is_empty() {
            return false;
        }

        let mut document = Html::parse_document(content);
        for selector in &self.exclude {
            let excluded: Vec<_> = document.select(selector).map(|element| element.id()).collect();
            for id in excluded {
                if let Some(mut node) = document.tree.get_mut(id) {
                    node.detach();
                }
            }
        }

        let text = self.scan_text(&document).to_lowercase();
        let hit = self.keywords.iter().any(|keyword| text.contains(keyword));
        if hit {
            debug!("Keyword found in {} bytes of page text", text.len());
        }
        hit
    }

    /// Collect the text the keyword scan runs against
    fn scan_text(&self, document: &Html) -> String {
        let mut text = String::new();
        match &self.scope {
            Some(scope) => {
                for element in document.select(scope) {
                    for fragment in element.text() {
                        text.push_str(fragment);
                    }
                }
            }
            None => {
                for node in document.tree.root().descendants() {
                    if let Node::Text(fragment) = node.value() {
                        text.push_str(&fragment.text);
                    }
                }
            }
        }
        text
    }
}

/// One listing item extracted from the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    /// Listing headline
    pub title: String,
    /// Link to the listing detail page
    pub link: String,
}

impl Display for Listing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\n{}", self.title, self.link)
    }
}

/// Extracts listing items from the page for notification payloads
pub struct ListingExtractor {
    /// Selector for one listing item
    item: Selector,
    /// Selector for the headline inside an item
    title: Selector,
    /// Selector for the detail link inside an item
    link: Selector,
}

impl ListingExtractor {
    /// Create an extractor with the given item selector
    pub fn new(item_selector: &str) -> Result<Self, WatchError> {
        Ok(Self {
            item: parse_selector(item_selector)?,
            title: parse_selector("h2")?,
            link: parse_selector("a[href]")?,
        })
    }

    /// Pull listing entries out of the page. Items missing a headline or a
    /// link are skipped.
    pub fn extract(&self, content: &str) -> Vec<Listing> {
        let document = Html::parse_document(content);

        let mut listings = Vec::new();
        for item in document.select(&self.item) {
            let title = item
                .select(&self.title)
                .next()
                .map(|heading| heading.text().collect::<String>());
            let link = item
                .select(&self.link)
                .next()
                .and_then(|anchor| anchor.value().attr("href"))
                .map(|href| href.to_string());

            if let (Some(title), Some(link)) = (title, link) {
                let title = title.trim().to_string();
                if !title.is_empty() {
                    listings.push(Listing { title, link });
                }
            }
        }

        debug!("Extracted {} listings", listings.len());
        listings
    }
}

fn parse_selector(selector: &str) -> Result<Selector, WatchError> {
    Selector::parse(selector)
        .map_err(|e| WatchError::Parse(format!("invalid selector '{}': {}", selector, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(keywords: &[&str], exclude: &[&str]) -> KeywordMatcher {
        let keywords: Vec<String> = keywords.iter().map(|s| s.to_string()).collect();
        let exclude: Vec<String> = exclude.iter().map(|s| s.to_string()).collect();
        KeywordMatcher::new(&keywords, &exclude, None).unwrap()
    }

    #[test]
    fn keyword_in_page_text_matches() {
        let m = matcher(&["Kreuzberg"], &[]);
        assert!(m.matches("<html><body><h2>Flat in Kreuzberg</h2></body></html>"));
    }

    #[test]
    fn matching_is_case_insensitive() {
        let m = matcher(&["KREUZBERG"], &[]);
        assert!(m.matches("<html><body>2 rooms, kreuzberg, 62 m²</body></html>"));
    }

    #[test]
    fn absent_keyword_does_not_match() {
        let m = matcher(&["Kreuzberg"], &[]);
        assert!(!m.matches("<html><body><h2>Flat in Spandau</h2></body></html>"));
    }

    #[test]
    fn keyword_only_in_excluded_region_does_not_match() {
        let m = matcher(&["Kreuzberg"], &[".teaser"]);
        let page = r#"<html><body>
            <article><h2>Flat in Spandau</h2></article>
            <aside class="teaser">More flats in Kreuzberg</aside>
        </body></html>"#;
        assert!(!m.matches(page));
    }

    #[test]
    fn keyword_inside_and_outside_excluded_region_matches() {
        let m = matcher(&["Kreuzberg"], &[".teaser"]);
        let page = r#"<html><body>
            <article><h2>Flat in Kreuzberg</h2></article>
            <aside class="teaser">More flats in Kreuzberg</aside>
        </body></html>"#;
        assert!(m.matches(page));
    }

    #[test]
    fn keyword_spanning_into_excluded_region_does_not_match() {
        // without the exclusion the text nodes would join up to "Kreuzberg"
        let m = matcher(&["Kreuzberg"], &[".ad"]);
        let page = r#"<html><body><p>Kreuz<span class="ad">berg</span></p></body></html>"#;
        assert!(!m.matches(page));
    }

    #[test]
    fn scan_region_restricts_matching() {
        let keywords = vec!["Kreuzberg".to_string()];
        let m = KeywordMatcher::new(&keywords, &[], Some("main")).unwrap();
        let outside = "<html><body><footer>Kreuzberg</footer></body></html>";
        let inside = "<html><body><main>Kreuzberg</main><footer>imprint</footer></body></html>";
        assert!(!m.matches(outside));
        assert!(m.matches(inside));
    }

    #[test]
    fn empty_keyword_set_never_matches() {
        let m = matcher(&[], &[]);
        assert!(!m.matches("<html><body>anything at all</body></html>"));
    }

    #[test]
    fn garbage_content_does_not_match() {
        let m = matcher(&["Kreuzberg"], &[]);
        assert!(!m.matches("\u{0}\u{1}\u{2} not html at all >>>"));
        assert!(!m.matches(""));
    }

    #[test]
    fn invalid_selector_is_rejected_at_construction() {
        let keywords = vec!["Kreuzberg".to_string()];
        let exclude = vec!["[[".to_string()];
        assert!(KeywordMatcher::new(&keywords, &exclude, None).is_err());
    }

    #[test]
    fn extracts_title_and_link_per_item() {
        let extractor = ListingExtractor::new("article").unwrap();
        let page = r#"<html><body>
            <article><h2> 2-room flat, Neukölln </h2><a href="/expose/1">View</a></article>
            <article><h2>3-room flat, Mitte</h2><a href="/expose/2">View</a></article>
        </body></html>"#;

        let listings = extractor.extract(page);
        assert_eq!(
            listings,
            vec![
                Listing {
                    title: "2-room flat, Neukölln".to_string(),
                    link: "/expose/1".to_string(),
                },
                Listing {
                    title: "3-room flat, Mitte".to_string(),
                    link: "/expose/2".to_string(),
                },
            ]
        );
    }

    #[test]
    fn items_without_link_or_title_are_skipped() {
        let extractor = ListingExtractor::new("article").unwrap();
        let page = r#"<html><body>
            <article><h2>No link here</h2></article>
            <article><a href="/expose/3">No headline here</a></article>
            <article><h2>Complete</h2><a href="/expose/4">View</a></article>
        </body></html>"#;

        let listings = extractor.extract(page);
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].title, "Complete");
    }
}
