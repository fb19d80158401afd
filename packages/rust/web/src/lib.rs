//! Web page scraping: fetch a URL, extract its title and visible text.
//!
//! This crate provides:
//! - [`fetch`]: the [`PageFetcher`] capability and the reqwest-backed [`HttpFetcher`]
//! - [`parse`]: the [`HtmlParser`] capability and the html5ever-backed [`DomParser`]
//! - [`scrape`]: [`Scraper`], which turns any URL into a classified [`ScrapeResult`]
//!
//! [`ScrapeResult`]: ragscraper_shared::ScrapeResult

pub mod fetch;
pub mod parse;
pub mod scrape;

pub use fetch::{FetchError, HttpFetcher, PageFetcher};
pub use parse::{DomParser, HtmlParser, ParseError, ParsedPage};
pub use scrape::{Scraper, collapse_whitespace, validate_url};
