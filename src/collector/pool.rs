use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::entries::Entry;

/// Runs `work` over every entry of `input` with at most `limit` calls in
/// flight, forwarding the entries it returns to `output` as they complete.
///
/// Returns the ids of notes that were unread when their content fetch was
/// started. Dispatch stops when `cancel` fires; fetches already started run
/// to completion. `output` is borrowed, so the stream stays open until the
/// caller drops its sender.
pub async fn run_content_pool<F, Fut>(
    mut input: mpsc::Receiver<Entry>,
    output: &mpsc::Sender<Entry>,
    limit: usize,
    cancel: &CancellationToken,
    work: F,
) -> Vec<u64>
where
    F: Fn(Entry) -> Fut,
    Fut: Future<Output = Option<Entry>> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let mut tasks = JoinSet::new();
    let mut unread_notes = Vec::new();

    loop {
        let entry = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Content pool cancelled, waiting for {} fetches", tasks.len());
                break;
            }
            entry = input.recv() => match entry {
                Some(entry) => entry,
                None => break,
            },
        };

        let Ok(permit) = semaphore.clone().acquire_owned().await else {
            break;
        };

        if let Entry::Note(note) = &entry
            && note.was_unread()
        {
            unread_notes.push(note.id());
        }

        let job = work(entry);
        let output = output.clone();
        tasks.spawn(async move {
            let _permit = permit;
            if let Some(entry) = job.await
                && output.send(entry).await.is_err()
            {
                debug!("Entry receiver dropped");
            }
        });
    }

    while let Some(result) = tasks.join_next().await {
        if let Err(e) = result {
            if e.is_panic() {
                error!("Content fetch task panicked: {}", e);
            } else {
                warn!("Content fetch task failed: {}", e);
            }
        }
    }

    unread_notes
}
