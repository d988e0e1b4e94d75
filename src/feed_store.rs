use log::debug;
use rand::Rng;

use crate::article::Article;

/// Articles pulled per infinite-scroll load
pub const DEFAULT_PAGE_SIZE: usize = 5;

/// Articles shown on the fixed desktop page
pub const DEFAULT_DESKTOP_LIMIT: usize = 9;

/// In-memory article collection backing the feed
///
/// Holds the fetched articles in display order together with a read cursor.
/// The cursor only moves forward through [`FeedStore::next_batch`]; it goes
/// back to zero on [`FeedStore::load`], [`FeedStore::reshuffle`] and
/// [`FeedStore::reset_cursor`].
#[derive(Debug, Clone)]
pub struct FeedStore {
    articles: Vec<Article>,
    cursor: usize,
    page_size: usize,
    desktop_limit: usize,
    has_looped: bool,
}

impl Default for FeedStore {
    fn default() -> Self {
        FeedStore::new(DEFAULT_PAGE_SIZE, DEFAULT_DESKTOP_LIMIT)
    }
}

impl FeedStore {
    /// Create an empty store
    ///
    /// # Arguments
    /// * `page_size` - Batch size for infinite scroll (a zero value is raised to 1)
    /// * `desktop_limit` - Number of articles on the fixed desktop page
    pub fn new(page_size: usize, desktop_limit: usize) -> Self {
        FeedStore {
            articles: Vec::new(),
            cursor: 0,
            page_size: page_size.max(1),
            desktop_limit,
            has_looped: false,
        }
    }

    /// Replace the held articles and start reading from the beginning
    pub fn load(&mut self, articles: Vec<Article>) {
        debug!("Feed store loaded with {} articles", articles.len());
        self.articles = articles;
        self.cursor = 0;
        self.has_looped = false;
    }

    /// Next page of articles using the configured page size
    pub fn next_batch(&mut self) -> Vec<Article> {
        self.next_batch_of(self.page_size)
    }

    /// Up to `n` articles starting at the cursor
    ///
    /// The cursor advances by the number of articles returned. Once the cursor
    /// has reached the end the result is empty; that is the normal exhausted
    /// state, not an error.
    pub fn next_batch_of(&mut self, n: usize) -> Vec<Article> {
        let end = self.cursor.saturating_add(n).min(self.articles.len());
        let batch = self.articles[self.cursor..end].to_vec();
        self.cursor = end;
        batch
    }

    /// Shuffle with the thread-local generator
    pub fn reshuffle(&mut self) {
        self.reshuffle_with(&mut rand::thread_rng());
    }

    /// Fisher-Yates shuffle of the whole sequence, then rewind
    ///
    /// For `i` from `len - 1` down to 1 the article at `i` is swapped with one
    /// chosen uniformly from `0..=i`. Sets the looped flag.
    pub fn reshuffle_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for i in (1..self.articles.len()).rev() {
            let j = rng.gen_range(0..=i);
            self.articles.swap(i, j);
        }

        self.cursor = 0;
        self.has_looped = true;
        debug!("Articles shuffled for infinite scroll");
    }

    /// Fixed prefix of at most `n` articles; the cursor is untouched
    pub fn first_n(&self, n: usize) -> &[Article] {
        &self.articles[..n.min(self.articles.len())]
    }

    /// Prefix shown on the non-scrolling desktop layout
    pub fn desktop_articles(&self) -> &[Article] {
        self.first_n(self.desktop_limit)
    }

    /// Rewind for a fresh render and forget any previous loop
    pub fn reset_cursor(&mut self) {
        self.cursor = 0;
        self.has_looped = false;
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.articles.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    pub fn has_looped(&self) -> bool {
        self.has_looped
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn desktop_limit(&self) -> usize {
        self.desktop_limit
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }
}
