//! UseCase: メッセージ送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() メソッド
//! - セッションの Room 内でのブロードキャスト
//!
//! ### なぜこのテストが必要か
//! - 送信者自身を含む同じ Room の全員にだけ届くことを保証する
//! - 別の Room へのメッセージ漏れがないことを確認する
//!
//! ### どのような状況を想定しているか
//! - 正常系：複数メンバーへのブロードキャスト
//! - エッジケース：送信者のみが参加している Room、Room をまたいだ分離

use crate::domain::ClientSession;

/// メッセージ送信のユースケース
#[derive(Debug, Default)]
pub struct SendMessageUseCase;

impl SendMessageUseCase {
    /// 新しい SendMessageUseCase を作成
    pub fn new() -> Self {
        Self
    }

    /// メッセージ送信を実行
    ///
    /// セッションが参加している Room の全メンバー（送信者を含む）に
    /// `"<displayName>: <text>"` を配送する。個々の配送失敗は呼び出し元に返らない。
    ///
    /// # Arguments
    ///
    /// * `session` - 送信者のセッション
    /// * `text` - 受信したメッセージ本文（そのまま転送される）
    pub async fn execute(&self, session: &ClientSession, text: &str) {
        tracing::debug!(
            "Broadcasting message from '{}' in room '{}' ({} bytes)",
            session.display_name(),
            session.room_name(),
            text.len()
        );
        session
            .room()
            .broadcast(session.display_name(), text)
            .await;
    }
}
