//! HTML parsing: the [`HtmlParser`] capability and its `scraper`-based implementation.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

/// Elements whose text is never visible page content.
const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template", "head", "svg"];

static TITLE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("valid selector"));
static H1_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1").expect("valid selector"));
static BODY_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("valid selector"));

/// Title and visible text nodes of a parsed document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPage {
    /// First title-like element, if any.
    pub title: Option<String>,
    /// Visible text nodes in document order, untrimmed.
    pub text_nodes: Vec<String>,
}

/// The document could not be treated as HTML.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ParseError(pub String);

/// Turns raw markup into a [`ParsedPage`].
pub trait HtmlParser: Send + Sync {
    fn parse(&self, raw: &str) -> Result<ParsedPage, ParseError>;
}

/// html5ever-backed parser via the `scraper` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct DomParser;

impl HtmlParser for DomParser {
    fn parse(&self, raw: &str) -> Result<ParsedPage, ParseError> {
        // html5ever accepts anything; NUL bytes mean we were handed a binary payload.
        if raw.contains('\0') {
            return Err(ParseError("content is binary, not HTML".into()));
        }

        let doc = Html::parse_document(raw);

        let title = first_text(&doc, &TITLE_SEL).or_else(|| first_text(&doc, &H1_SEL));

        let root = doc
            .select(&BODY_SEL)
            .next()
            .unwrap_or_else(|| doc.root_element());

        Ok(ParsedPage {
            title,
            text_nodes: visible_text_nodes(root),
        })
    }
}

/// Trimmed text of the first element matching `sel`, if non-empty.
fn first_text(doc: &Html, sel: &Selector) -> Option<String> {
    doc.select(sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Collect every text node under `root` that is not inside a hidden element.
fn visible_text_nodes(root: ElementRef<'_>) -> Vec<String> {
    root.descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let hidden = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|el| HIDDEN_TAGS.contains(&el.name()))
            });
            (!hidden && !text.trim().is_empty()).then(|| text.to_string())
        })
        .collect()
}
