//! Room エンティティ
//!
//! 1 つの Room 名に属する接続の集合を保持し、join / leave / broadcast を提供する。
//! メンバー集合は Room 自身のロックの内側でのみ読み書きされる。
//!
//! ## ブロードキャストの方式
//!
//! メンバーの送信口はロック内でスナップショットを取り、ロックを解放してから送信する。
//! そのため、ブロードキャスト中に leave したメンバーには最大 1 件だけ古い配送が届きうる。

use std::{collections::HashMap, sync::Arc};

use hubbub_shared::time::millis_to_rfc3339;
use tokio::sync::Mutex;

use super::{
    error::RoomError,
    message_sink::MessageSink,
    value_object::{ConnectionId, DisplayName, RoomName, Timestamp},
};

/// 送信者名と本文からワイヤー上のチャット行を組み立てる
///
/// 形式は `"<displayName>: <text>"`。エスケープや長さ制限は行わない。
pub fn format_chat_line(sender: &DisplayName, text: &str) -> String {
    format!("{}: {}", sender.as_str(), text)
}

/// Room のメンバー（1 接続分）
#[derive(Clone)]
pub struct Member {
    pub display_name: DisplayName,
    pub joined_at: Timestamp,
    sink: Arc<dyn MessageSink>,
}

struct RoomState {
    members: HashMap<ConnectionId, Member>,
    /// レジストリから除去された Room には join できない
    retired: bool,
}

/// チャットルーム
pub struct Room {
    name: RoomName,
    created_at: Timestamp,
    state: Mutex<RoomState>,
}

impl Room {
    /// 空の Room を作成
    pub fn new(name: RoomName, created_at: Timestamp) -> Self {
        Self {
            name,
            created_at,
            state: Mutex::new(RoomState {
                members: HashMap::new(),
                retired: false,
            }),
        }
    }

    pub fn name(&self) -> &RoomName {
        &self.name
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// 接続をメンバーとして登録する
    ///
    /// 同じ接続で再度呼ぶと表示名と送信口が置き換わる（メンバー数は変わらない）。
    ///
    /// # Errors
    ///
    /// 空 Room の除去と競合し、既にレジストリから外れていた場合は
    /// `RoomError::Retired` を返す。呼び出し側はレジストリから Room を引き直す。
    pub async fn join(
        &self,
        connection_id: ConnectionId,
        display_name: DisplayName,
        joined_at: Timestamp,
        sink: Arc<dyn MessageSink>,
    ) -> Result<(), RoomError> {
        let mut state = self.state.lock().await;
        if state.retired {
            return Err(RoomError::Retired(self.name.as_str().to_string()));
        }

        let member = Member {
            display_name,
            joined_at,
            sink,
        };
        if let Some(previous) = state.members.insert(connection_id, member) {
            tracing::debug!(
                "Connection {} in room '{}' renamed from '{}'",
                connection_id,
                self.name,
                previous.display_name
            );
        }
        Ok(())
    }

    /// 接続をメンバーから外す
    ///
    /// 未登録・削除済みの接続に対しては何もしない。実際に削除した場合のみ `true`。
    pub async fn leave(&self, connection_id: &ConnectionId) -> bool {
        let mut state = self.state.lock().await;
        match state.members.remove(connection_id) {
            Some(member) => {
                tracing::debug!(
                    "'{}' ({}) left room '{}', member since {}",
                    member.display_name,
                    connection_id,
                    self.name,
                    millis_to_rfc3339(member.joined_at.value())
                );
                true
            }
            None => false,
        }
    }

    /// 現在の全メンバー（送信者自身を含む）にメッセージを配送する
    ///
    /// 個々の送信失敗はログに記録して握りつぶす。失敗したメンバーも Room からは外さない
    /// （外すのはその接続自身の受信ループ終了時の leave のみ）。
    pub async fn broadcast(&self, sender: &DisplayName, text: &str) {
        let line = format_chat_line(sender, text);

        let targets: Vec<(ConnectionId, Member)> = {
            let state = self.state.lock().await;
            state
                .members
                .iter()
                .map(|(id, member)| (*id, member.clone()))
                .collect()
        };

        for (connection_id, member) in targets {
            match member.sink.push(&line).await {
                Ok(()) => tracing::debug!(
                    "Delivered message in room '{}' to '{}' ({})",
                    self.name,
                    member.display_name,
                    connection_id
                ),
                Err(e) => tracing::warn!(
                    "Failed to deliver message in room '{}' to '{}' ({}): {}",
                    self.name,
                    member.display_name,
                    connection_id,
                    e
                ),
            }
        }
    }

    /// 現在のメンバー数
    pub async fn member_count(&self) -> usize {
        self.state.lock().await.members.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.members.is_empty()
    }

    /// メンバーの表示名一覧（ソート済み）
    pub async fn display_names(&self) -> Vec<DisplayName> {
        let state = self.state.lock().await;
        let mut names: Vec<DisplayName> = state
            .members
            .values()
            .map(|member| member.display_name.clone())
            .collect();
        names.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        names
    }

    /// メンバーが 0 人なら除去済みとしてマークする
    ///
    /// レジストリのロックを保持した状態で呼ばれる。マーク後の join は失敗する。
    pub(crate) async fn retire_if_empty(&self) -> bool {
        let mut state = self.state.lock().await;
        if state.members.is_empty() {
            state.retired = true;
        }
        state.retired
    }
}
