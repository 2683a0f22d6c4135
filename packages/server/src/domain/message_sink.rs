//! MessageSink trait 定義
//!
//! 1 接続分の送信口を表す。Room はこの trait 越しにメッセージを配送し、
//! WebSocket などの具体的な送信手段には依存しない（依存性の逆転）。

use async_trait::async_trait;

use super::error::MessagePushError;

/// 1 接続へのメッセージ送信口
///
/// 実装は送信完了を待たずに戻ること。詰まった受信者が Room 全体の配送を
/// 止めてはならないため、送れない場合は即座に `MessagePushError` を返す。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// メッセージを送信キューに積む
    async fn push(&self, content: &str) -> Result<(), MessagePushError>;
}
