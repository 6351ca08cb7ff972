//! Corpus discovery sources.
//!
//! Two ways content reaches the ingestion pipeline: a sitemap crawl over
//! the published textbook, or a local markdown directory.

mod local;
mod sitemap;

pub use local::LocalSource;
pub use sitemap::SitemapSource;
