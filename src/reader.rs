//! Terminal headline reader.
//!
//! Stands in for the browser view: it mounts a [`PagedLoader`] against a
//! running proxy, prints the first page, then keeps firing the scroll trigger
//! and printing each appended page until the collection is exhausted, a fetch
//! fails, or the page cap is reached.
//!
//! Headlines go to stdout; the progress indicator goes to stderr.

use crate::cli::BrowseArgs;
use crate::loader::{HttpPageSource, LoadOutcome, LoaderFilter, PagedLoader, ProgressSink};
use crate::models::Article;
use crate::utils::upcase;
use std::error::Error;
use std::io::{self, Write};
use tracing::{info, instrument, warn};
use url::Url;

const APP_NAME: &str = "NewsUpdate";

/// Progress indicator drawn on stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalProgress;

impl ProgressSink for TerminalProgress {
    fn set_progress(&self, percent: u8) {
        eprintln!("[progress] {percent:>3}%");
    }
}

/// `General - NewsUpdate`
pub fn window_title(category: &str) -> String {
    format!("{} - {APP_NAME}", upcase(category))
}

/// `NewsUpdate - Top General Headlines`
pub fn heading(category: &str) -> String {
    format!("{APP_NAME} - Top {} Headlines", upcase(category))
}

/// Write one headline card.
pub fn render_card<W: Write>(out: &mut W, index: usize, article: &Article) -> io::Result<()> {
    writeln!(out, "{:>3}. {}  [{}]", index + 1, article.display_title(), article.source_name())?;
    writeln!(out, "     {}", article.display_description())?;
    let date = article.display_date().unwrap_or_else(|| "date unknown".to_string());
    writeln!(out, "     By {} on {}", article.display_author(), date)?;
    if let Some(image) = article.image() {
        writeln!(out, "     Image: {image}")?;
    }
    match article.link() {
        Some(link) => writeln!(out, "     Read more: {link}")?,
        None => writeln!(out, "     (no link)")?,
    }
    writeln!(out)
}

/// Write cards for `items`, numbering from `offset`.
pub fn render_cards<W: Write>(out: &mut W, offset: usize, items: &[Article]) -> io::Result<()> {
    for (i, article) in items.iter().enumerate() {
        render_card(out, offset + i, article)?;
    }
    Ok(())
}

/// Drive `loader` to completion, writing every page to `out`.
///
/// Returns the number of headlines shown.
pub async fn read_all<S, P, W>(loader: &PagedLoader<S, P>, max_pages: u32, out: &mut W) -> io::Result<usize>
where
    S: crate::loader::PageSource,
    P: ProgressSink,
    W: Write,
{
    let category = &loader.filter().category;
    writeln!(out, "{}", window_title(category))?;
    writeln!(out, "{}", heading(category))?;
    writeln!(out)?;

    if let LoadOutcome::Failed(e) = loader.initial_load().await {
        warn!(error = %e, "Initial load failed");
        return Ok(0);
    }
    let mut shown = {
        let state = loader.snapshot();
        render_cards(out, 0, &state.items)?;
        state.items.len()
    };

    let mut pages = 1;
    while pages < max_pages {
        match loader.load_more().await {
            LoadOutcome::Loaded { .. } => {
                pages += 1;
                let state = loader.snapshot();
                render_cards(out, shown, &state.items[shown..])?;
                shown = state.items.len();
            }
            // Triggers are awaited one at a time here, so `Busy` cannot occur.
            LoadOutcome::Exhausted | LoadOutcome::Busy | LoadOutcome::Failed(_) => break,
        }
    }

    let state = loader.snapshot();
    if state.has_more() {
        writeln!(
            out,
            "-- showing {} of {} headlines; raise --max-pages for more --",
            shown, state.total_available
        )?;
    } else {
        writeln!(out, "-- end of headlines ({shown}) --")?;
    }
    Ok(shown)
}

/// Entry point for `news_update browse`.
#[instrument(level = "info", skip_all, fields(%proxy_url, country = %args.country, category = %args.category))]
pub async fn run(args: &BrowseArgs, proxy_url: &Url) -> Result<(), Box<dyn Error>> {
    let source = HttpPageSource::new(proxy_url)?;
    let filter = LoaderFilter {
        country: args.country.clone(),
        category: args.category.clone(),
        page_size: args.page_size,
    };
    let loader = PagedLoader::with_progress(source, filter, TerminalProgress);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let shown = read_all(&loader, args.max_pages, &mut out).await?;
    out.flush()?;

    info!(shown, "Reader finished");
    Ok(())
}
