//! UseCase: 参加者切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectParticipantUseCase::execute() メソッド
//! - Room からのメンバー削除と、設定に応じた空 Room の除去
//!
//! ### なぜこのテストが必要か
//! - 切断した接続に以降のメッセージが届かないことを保証する
//! - 空 Room の除去が同時に行われる join を取りこぼさないことを確認する
//!
//! ### どのような状況を想定しているか
//! - 正常系：参加者の切断
//! - エッジケース：最後の参加者の切断（Room を残す／除去する）、join との競合

use std::sync::Arc;

use crate::domain::{ClientSession, RoomRepository};

/// 切断処理の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisconnectOutcome {
    /// Room から実際にメンバーを削除したか
    pub left: bool,
    /// 空になった Room をレジストリから除去したか
    pub room_removed: bool,
}

/// 参加者切断のユースケース
pub struct DisconnectParticipantUseCase {
    /// Repository（Room レジストリの抽象化）
    repository: Arc<dyn RoomRepository>,
    /// 最後の参加者が抜けた Room をレジストリから除去するか
    evict_empty_rooms: bool,
}

impl DisconnectParticipantUseCase {
    /// 新しい DisconnectParticipantUseCase を作成
    pub fn new(repository: Arc<dyn RoomRepository>, evict_empty_rooms: bool) -> Self {
        Self {
            repository,
            evict_empty_rooms,
        }
    }

    /// 参加者切断を実行
    ///
    /// セッションを値で受け取るため、1 つのセッションにつき leave は 1 回だけ行われる。
    ///
    /// # Arguments
    ///
    /// * `session` - 終了するセッション
    pub async fn execute(&self, session: ClientSession) -> DisconnectOutcome {
        let room = session.room();

        // 1. Room からメンバーを削除
        let left = room.leave(&session.connection_id()).await;
        let remaining = room.member_count().await;
        tracing::info!(
            "'{}' left room '{}' (connection {}, {} remaining)",
            session.display_name(),
            session.room_name(),
            session.connection_id(),
            remaining
        );

        // 2. 空になった Room を除去（有効な場合のみ）
        let room_removed = self.evict_empty_rooms && self.repository.remove_if_empty(room).await;

        DisconnectOutcome { left, room_removed }
    }
}
