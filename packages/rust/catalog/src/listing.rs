//! Model ID harvesting from the public model listing page.
//!
//! Model pages live at `/<org>/<name>`; everything else on the page
//! (site sections, docs, search) shares that shape only by accident and is
//! filtered out by a reserved-prefix list.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

/// Matches `/<org>/<name>` with no further path segments.
static MODEL_HREF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/([A-Za-z0-9][A-Za-z0-9_.-]*)/([A-Za-z0-9][A-Za-z0-9_.-]*)$")
        .expect("model href regex")
});

static LINK_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid selector"));

/// Top-level paths that are site sections, not organizations.
const RESERVED_ORGS: &[&str] = &[
    "models",
    "datasets",
    "spaces",
    "docs",
    "search",
    "organizations",
    "settings",
    "pricing",
    "login",
    "join",
    "new",
    "collections",
    "tasks",
    "events",
    "api",
    "blog",
    "about",
    "terms",
    "privacy",
    "contact",
    "people",
];

/// Extract up to `limit` unique model IDs (`org/name`) in first-seen order.
pub fn parse_model_ids(html: &str, limit: usize) -> Vec<String> {
    let doc = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut ids = Vec::new();

    for el in doc.select(&LINK_SEL) {
        if ids.len() >= limit {
            break;
        }

        let Some(href) = el.value().attr("href") else {
            continue;
        };
        let path = strip_query_and_fragment(href);

        let Some(caps) = MODEL_HREF_RE.captures(path) else {
            continue;
        };
        let org = &caps[1];
        if RESERVED_ORGS.contains(&org) {
            continue;
        }

        let id = format!("{org}/{}", &caps[2]);
        if id.contains('%') {
            continue;
        }
        if seen.insert(id.clone()) {
            ids.push(id);
        }
    }

    ids
}

fn strip_query_and_fragment(href: &str) -> &str {
    let end = href.find(['?', '#']).unwrap_or(href.len());
    &href[..end]
}
