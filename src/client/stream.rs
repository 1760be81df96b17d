//! Message stream for receiving pushed messages.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use serde_json::Value;
use tokio::sync::mpsc;

/// An async stream of messages for one event type.
///
/// Implements [`futures::Stream`]. The stream ends when every sender is
/// dropped, which is how a client closes it.
///
/// # Example
///
/// ```
/// use aixpand_gateway::client::MessageStream;
/// use serde_json::json;
///
/// futures::executor::block_on(async {
///     let (tx, mut stream) = MessageStream::channel();
///     tx.send(json!({"seq": 1})).unwrap();
///     drop(tx);
///
///     assert_eq!(stream.next().await, Some(json!({"seq": 1})));
///     assert_eq!(stream.next().await, None);
/// });
/// ```
#[derive(Debug)]
pub struct MessageStream {
    receiver: mpsc::UnboundedReceiver<Value>,
}

impl MessageStream {
    /// Create a stream fed by `receiver`.
    pub fn new(receiver: mpsc::UnboundedReceiver<Value>) -> Self {
        Self { receiver }
    }

    /// Create a sender and the stream it feeds.
    pub fn channel() -> (mpsc::UnboundedSender<Value>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self::new(rx))
    }

    /// Receive the next message.
    ///
    /// Returns `None` once the stream is closed.
    pub async fn next(&mut self) -> Option<Value> {
        self.receiver.recv().await
    }

    /// Try to receive the next message without waiting.
    pub fn try_next(&mut self) -> Option<Value> {
        self.receiver.try_recv().ok()
    }
}

impl Stream for MessageStream {
    type Item = Value;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}
