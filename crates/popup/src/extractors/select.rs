// ABOUTME: Selector and text helpers shared by the popup extractor.
// ABOUTME: Flattens element text per text node and resolves prioritized selector lists.

//! Selector-based text helpers.
//!
//! Key behaviors:
//! - Selector lists are tried in order; the first selector with a match wins.
//! - Text flattening normalizes whitespace inside each text node, drops empty
//!   nodes and joins the rest with a caller-chosen separator.

use scraper::{ElementRef, Html, Selector};

use crate::error::ParseError;

/// Collapses runs of whitespace into single spaces and trims the ends.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Joins the element's non-empty text nodes with `sep`.
///
/// With `"\n"` as separator, text split by `<br>` keeps its line breaks.
pub fn flatten_text(el: &ElementRef<'_>, sep: &str) -> String {
    el.text()
        .map(normalize_whitespace)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(sep)
}

/// Compiles a CSS selector, reporting the offending selector on failure.
pub fn compile_selector(css: &str) -> Result<Selector, ParseError> {
    Selector::parse(css).map_err(|e| {
        ParseError::invalid_input(
            css,
            "CompileSelector",
            Some(anyhow::anyhow!("invalid selector: {:?}", e)),
        )
    })
}

/// Returns the first element matched by the earliest selector that matches anything.
pub fn first_in_document<'a>(doc: &'a Html, selectors: &[Selector]) -> Option<ElementRef<'a>> {
    selectors.iter().find_map(|sel| doc.select(sel).next())
}

/// Returns the first non-empty attribute value among elements under `scope`.
pub fn first_attr(scope: &ElementRef<'_>, selector: &Selector, attr: &str) -> Option<String> {
    scope.select(selector).find_map(|el| {
        el.value()
            .attr(attr)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_HTML: &str = r#"
        <html><body>
            <div class="a">  Main
                Title  </div>
            <div class="b">line one<br>line   two<br> </div>
            <div class="c"><span>稀有度</span>: <span>普通</span></div>
            <img class="empty" src="  ">
            <img class="hero" src=" /images/hero.webp ">
        </body></html>
    "#;

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  hello   world  "), "hello world");
        assert_eq!(normalize_whitespace("no\textra\nspaces"), "no extra spaces");
        assert_eq!(normalize_whitespace(""), "");
    }

    #[test]
    fn flatten_joins_text_nodes() {
        let doc = Html::parse_document(SAMPLE_HTML);
        let a = doc.select(&compile_selector(".a").unwrap()).next().unwrap();
        assert_eq!(flatten_text(&a, " "), "Main Title");

        let b = doc.select(&compile_selector(".b").unwrap()).next().unwrap();
        assert_eq!(flatten_text(&b, "\n"), "line one\nline two");

        let c = doc.select(&compile_selector(".c").unwrap()).next().unwrap();
        assert_eq!(flatten_text(&c, " "), "稀有度 : 普通");
    }

    #[test]
    fn first_in_document_respects_priority() {
        let doc = Html::parse_document(SAMPLE_HTML);
        let sels = vec![
            compile_selector(".missing").unwrap(),
            compile_selector(".b").unwrap(),
            compile_selector(".a").unwrap(),
        ];
        let el = first_in_document(&doc, &sels).unwrap();
        assert_eq!(el.value().attr("class"), Some("b"));
    }

    #[test]
    fn first_attr_skips_blank_values() {
        let doc = Html::parse_document(SAMPLE_HTML);
        let body = doc.select(&compile_selector("body").unwrap()).next().unwrap();
        let img = compile_selector("img").unwrap();
        assert_eq!(
            first_attr(&body, &img, "src").as_deref(),
            Some("/images/hero.webp")
        );
    }

    #[test]
    fn invalid_selector_is_invalid_input() {
        let err = compile_selector("[[[invalid").unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::InvalidInput);
        assert_eq!(err.target, "[[[invalid");
    }
}
