//! Cursor-based pagination as a background producer
//!
//! A traversal runs in its own tokio task and pushes pages into a bounded
//! channel; the consumer pulls them with [`Paginator::next`] at its own pace.

use crate::slack::Fragment;
use crate::ScrapeError;
use std::future::Future;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Pages buffered ahead of the consumer
const PAGE_BUFFER: usize = 4;

/// One element of a traversal: a page of items or the error that ended it
pub type Page<T> = Result<Vec<T>, ScrapeError>;

/// Single-consumer handle on a running traversal
///
/// Dropping it aborts the traversal task, including a fetch still in flight.
#[derive(Debug)]
pub struct Paginator<T> {
    pages: mpsc::Receiver<Page<T>>,
    task: JoinHandle<()>,
}

impl<T> Paginator<T> {
    /// Waits for the next page
    ///
    /// Returns `None` once the page with an empty next cursor (or an error)
    /// has been delivered.
    pub async fn next(&mut self) -> Option<Page<T>> {
        self.pages.recv().await
    }
}

impl<T> Drop for Paginator<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Starts a traversal of a cursor-paginated collection
///
/// `fetch` is called with `""` first and then with each returned cursor. The
/// final page, the one whose next cursor is empty, is always delivered before
/// the traversal closes. A fetch error is delivered as an element; it carries
/// no cursor, so it is also the last element. Dropping the paginator aborts
/// the traversal.
///
/// A fetch returns either a page or an error, never both: a failed fetch has
/// no items and no cursor to continue from.
///
/// # Example
///
/// ```no_run
/// use slack_census::crawler::paginate;
/// use slack_census::slack::{SlackApi, SlackClient};
/// use std::sync::Arc;
///
/// # async fn example(client: Arc<SlackClient>) {
/// let mut channels = paginate(move |cursor| {
///     let client = Arc::clone(&client);
///     async move { client.fetch_channels_page(&cursor).await }
/// });
/// while let Some(page) = channels.next().await {
///     println!("{} channels", page.map(|p| p.len()).unwrap_or(0));
/// }
/// # }
/// ```
pub fn paginate<T, F, Fut>(mut fetch: F) -> Paginator<T>
where
    T: Send + 'static,
    F: FnMut(String) -> Fut + Send + 'static,
    Fut: Future<Output = Result<Fragment<T>, ScrapeError>> + Send + 'static,
{
    let (tx, rx) = mpsc::channel(PAGE_BUFFER);

    let task = tokio::spawn(async move {
        let mut cursor = String::new();
        loop {
            let (page, next_cursor) = match fetch(cursor).await {
                Ok(fragment) => (Ok(fragment.items), fragment.next_cursor),
                Err(e) => (Err(e), String::new()),
            };

            if tx.send(page).await.is_err() {
                tracing::trace!("Paginator dropped, stopping traversal");
                return;
            }

            if next_cursor.is_empty() {
                return;
            }
            cursor = next_cursor;
        }
    });

    Paginator { pages: rx, task }
}
