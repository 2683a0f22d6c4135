//! WebSocket を使った MessageSink 実装
//!
//! ## 責務
//!
//! - 接続ごとの有界な送信キュー（`mpsc::Sender`）への書き込み
//!
//! ## 設計ノート
//!
//! WebSocket への実際の書き込みは UI 層（`ui/handler/websocket.rs`）の pusher ループが
//! キューを読み出して行います。キューが満杯のときは待たずに `QueueFull` を返すため、
//! 遅い受信者が同じ Room の他のメンバーへの配送を遅らせることはありません。

use async_trait::async_trait;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::domain::{MessagePushError, MessageSink};

/// 送信キューと、それを読み出す側の組を作成する
///
/// # Panics
///
/// `capacity` が 0 の場合（`tokio::sync::mpsc::channel` と同じ）。
pub fn outbound_channel(capacity: usize) -> (WebSocketMessageSink, mpsc::Receiver<String>) {
    let (sender, receiver) = mpsc::channel(capacity);
    (WebSocketMessageSink::new(sender), receiver)
}

/// WebSocket 接続 1 本分の送信口
pub struct WebSocketMessageSink {
    sender: mpsc::Sender<String>,
}

impl WebSocketMessageSink {
    pub fn new(sender: mpsc::Sender<String>) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl MessageSink for WebSocketMessageSink {
    async fn push(&self, content: &str) -> Result<(), MessagePushError> {
        self.sender
            .try_send(content.to_string())
            .map_err(|e| match e {
                TrySendError::Full(_) => MessagePushError::QueueFull,
                TrySendError::Closed(_) => MessagePushError::Closed,
            })
    }
}
