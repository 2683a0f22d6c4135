//! ドメイン層のエラー定義

use thiserror::Error;

/// 値オブジェクト生成時のバリデーションエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("room name must not be empty")]
    EmptyRoomName,

    #[error("display name must not be empty")]
    EmptyDisplayName,
}

/// クライアントへのメッセージ送信エラー
///
/// ブロードキャストではこのエラーはログに記録されるだけで、呼び出し元には伝播しない。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    /// 送信キューが満杯（受信側が詰まっている）
    #[error("outbound queue is full")]
    QueueFull,

    /// 接続が既に閉じている
    #[error("connection is closed")]
    Closed,
}

/// Room 操作のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    /// Room が空になりレジストリから除去済み
    #[error("room '{0}' has been retired")]
    Retired(String),
}
