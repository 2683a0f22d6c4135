//! UseCase 層のエラー定義

use thiserror::Error;

/// 参加者接続のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    /// 空 Room の除去と join の競合が規定回数続いた
    #[error("room '{0}' is unavailable, gave up after repeated retirement races")]
    RoomUnavailable(String),
}
