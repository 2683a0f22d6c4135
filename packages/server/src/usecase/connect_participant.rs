//! UseCase: 参加者接続処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectParticipantUseCase::execute() メソッド
//! - Room の取得（または作成）とメンバー登録
//!
//! ### なぜこのテストが必要か
//! - 同じ Room 名の参加者が同じ Room に集まることを保証する
//! - 接続ごとに別の ConnectionId が払い出されることを確認する
//!
//! ### どのような状況を想定しているか
//! - 正常系：新規 Room への参加、既存 Room への参加
//! - エッジケース：同じ表示名での複数接続、除去済み Room との競合

use std::sync::Arc;

use hubbub_shared::time::{Clock, millis_to_rfc3339};

use crate::domain::{
    ClientSession, ConnectionId, DisplayName, MessageSink, RoomError, RoomName, RoomRepository,
    Timestamp,
};

use super::error::ConnectError;

/// 除去済み Room との競合時に Room を引き直す最大回数
const MAX_JOIN_ATTEMPTS: usize = 8;

/// 参加者接続のユースケース
pub struct ConnectParticipantUseCase {
    /// Repository（Room レジストリの抽象化）
    repository: Arc<dyn RoomRepository>,
    /// 参加時刻の取得に使う時計
    clock: Arc<dyn Clock>,
}

impl ConnectParticipantUseCase {
    /// 新しい ConnectParticipantUseCase を作成
    pub fn new(repository: Arc<dyn RoomRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// 参加者接続を実行
    ///
    /// # Arguments
    ///
    /// * `room_name` - 参加する Room 名（検証済み）
    /// * `display_name` - 参加者の表示名（検証済み）
    /// * `sink` - この接続への送信口
    ///
    /// # Returns
    ///
    /// * `Ok(ClientSession)` - 参加成功。切断時に `DisconnectParticipantUseCase` へ渡すこと
    /// * `Err(ConnectError)` - 空 Room の除去との競合が解消しなかった
    pub async fn execute(
        &self,
        room_name: RoomName,
        display_name: DisplayName,
        sink: Arc<dyn MessageSink>,
    ) -> Result<ClientSession, ConnectError> {
        let connection_id = ConnectionId::generate();

        for attempt in 1..=MAX_JOIN_ATTEMPTS {
            // 1. Room を取得（なければ作成）
            let room = self.repository.get_or_create(room_name.clone()).await;

            // 2. メンバーとして登録
            let joined_at = Timestamp::new(self.clock.now_millis());
            match room
                .join(connection_id, display_name.clone(), joined_at, sink.clone())
                .await
            {
                Ok(()) => {
                    tracing::info!(
                        "'{}' joined room '{}' as connection {} at {}",
                        display_name,
                        room_name,
                        connection_id,
                        millis_to_rfc3339(joined_at.value())
                    );
                    return Ok(ClientSession::new(room, display_name, connection_id));
                }
                Err(RoomError::Retired(_)) => {
                    tracing::debug!(
                        "Room '{}' was retired while joining (attempt {}/{}), retrying",
                        room_name,
                        attempt,
                        MAX_JOIN_ATTEMPTS
                    );
                }
            }
        }

        Err(ConnectError::RoomUnavailable(room_name.as_str().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::Room,
        infrastructure::{message_sink::outbound_channel, repository::InMemoryRoomRepository},
    };
    use async_trait::async_trait;
    use hubbub_shared::time::FixedClock;

    fn create_usecase() -> (ConnectParticipantUseCase, Arc<InMemoryRoomRepository>) {
        let repository = Arc::new(InMemoryRoomRepository::new());
        let usecase =
            ConnectParticipantUseCase::new(repository.clone(), Arc::new(FixedClock::new(1000)));
        (usecase, repository)
    }

    fn room_name(value: &str) -> RoomName {
        RoomName::new(value.to_string()).unwrap()
    }

    fn display_name(value: &str) -> DisplayName {
        DisplayName::new(value.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_connect_participant_creates_room() {
        // テスト項目: 未知の Room 名で接続すると Room が作られ、メンバーとして登録される
        // given (前提条件):
        let (usecase, repository) = create_usecase();
        let (sink, _rx) = outbound_channel(8);

        // when (操作):
        let session = usecase
            .execute(room_name("lobby"), display_name("alice"), Arc::new(sink))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(session.room_name().as_str(), "lobby");
        assert_eq!(session.display_name().as_str(), "alice");
        let room = repository.find(&room_name("lobby")).await.unwrap();
        assert!(Arc::ptr_eq(&room, session.room()));
        assert_eq!(room.display_names().await, vec![display_name("alice")]);
    }

    #[tokio::test]
    async fn test_connect_participants_share_room() {
        // テスト項目: 同じ Room 名の参加者は同じ Room に登録される
        // given (前提条件):
        let (usecase, repository) = create_usecase();
        let (alice_sink, _alice_rx) = outbound_channel(8);
        let (bob_sink, _bob_rx) = outbound_channel(8);

        // when (操作):
        let alice = usecase
            .execute(room_name("lobby"), display_name("alice"), Arc::new(alice_sink))
            .await
            .unwrap();
        let bob = usecase
            .execute(room_name("lobby"), display_name("bob"), Arc::new(bob_sink))
            .await
            .unwrap();

        // then (期待する結果):
        assert!(Arc::ptr_eq(alice.room(), bob.room()));
        assert_eq!(alice.room().member_count().await, 2);
        assert_eq!(repository.room_count().await, 1);
    }

    #[tokio::test]
    async fn test_same_display_name_gets_distinct_connections() {
        // テスト項目: 同じ表示名でも接続ごとに別のメンバーとして登録される
        // given (前提条件):
        let (usecase, _repository) = create_usecase();
        let (sink1, _rx1) = outbound_channel(8);
        let (sink2, _rx2) = outbound_channel(8);

        // when (操作):
        let first = usecase
            .execute(room_name("lobby"), display_name("alice"), Arc::new(sink1))
            .await
            .unwrap();
        let second = usecase
            .execute(room_name("lobby"), display_name("alice"), Arc::new(sink2))
            .await
            .unwrap();

        // then (期待する結果):
        assert_ne!(first.connection_id(), second.connection_id());
        assert_eq!(first.room().member_count().await, 2);
    }

    /// 常に除去済みの Room を返すレジストリ
    struct RetiredRoomRepository {
        room: Arc<Room>,
    }

    #[async_trait]
    impl RoomRepository for RetiredRoomRepository {
        async fn get_or_create(&self, _name: RoomName) -> Arc<Room> {
            self.room.clone()
        }

        async fn find(&self, _name: &RoomName) -> Option<Arc<Room>> {
            None
        }

        async fn room_count(&self) -> usize {
            0
        }

        async fn remove_if_empty(&self, _room: &Arc<Room>) -> bool {
            false
        }
    }

    #[tokio::test]
    async fn test_connect_gives_up_on_retired_room() {
        // テスト項目: 除去済み Room しか得られない場合、規定回数で諦めてエラーを返す
        // given (前提条件):
        let room = Arc::new(Room::new(room_name("ghost"), Timestamp::new(0)));
        assert!(room.retire_if_empty().await);
        let repository = Arc::new(RetiredRoomRepository { room });
        let usecase = ConnectParticipantUseCase::new(repository, Arc::new(FixedClock::new(0)));
        let (sink, _rx) = outbound_channel(8);

        // when (操作):
        let result = usecase
            .execute(room_name("ghost"), display_name("alice"), Arc::new(sink))
            .await;

        // then (期待する結果):
        assert!(matches!(result, Err(ConnectError::RoomUnavailable(name)) if name == "ghost"));
    }
}
