use scraper::{Html, Selector};

/// Element id of the embedded manifest in the hosting page.
pub const INLINE_MANIFEST_ID: &str = "gamesManifest";

/// Text content of the embedded manifest element, if the page has one.
///
/// Only the element's presence matters here; its text is returned untouched
/// and parsed by the loader.
pub fn extract_inline_manifest(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(&format!("#{}", INLINE_MANIFEST_ID)).ok()?;
    document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>())
}
