use tokio::sync::mpsc;

/// Drains `input` completely, then re-emits its items last to first.
///
/// `capacity` pre-sizes the buffer and the output channel; it is the number of
/// items one listing page can hold.
pub fn reverse_stream<T: Send + 'static>(
    mut input: mpsc::Receiver<T>,
    capacity: usize,
) -> mpsc::Receiver<T> {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    tokio::spawn(async move {
        let mut buffer = Vec::with_capacity(capacity);
        while let Some(item) = input.recv().await {
            buffer.push(item);
        }
        while let Some(item) = buffer.pop() {
            if tx.send(item).await.is_err() {
                break;
            }
        }
    });
    rx
}
