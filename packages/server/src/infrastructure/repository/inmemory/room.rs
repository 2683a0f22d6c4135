//! InMemory Room Repository 実装
//!
//! ドメイン層が定義する RoomRepository trait の具体的な実装。
//! HashMap をインメモリのレジストリとして使用します。
//!
//! ## ロック順序
//!
//! レジストリのロック → Room のロック の順でのみ取得する。
//! Room のロックを保持したままレジストリのロックを取るコードパスは存在しない。

use std::{
    collections::{HashMap, hash_map::Entry},
    sync::Arc,
};

use async_trait::async_trait;
use hubbub_shared::time::{Clock, SystemClock, millis_to_rfc3339};
use tokio::sync::Mutex;

use crate::domain::{Room, RoomName, RoomRepository, Timestamp};

/// インメモリ Room Repository 実装
pub struct InMemoryRoomRepository {
    /// Room 名 → Room
    rooms: Mutex<HashMap<RoomName, Arc<Room>>>,
    /// Room の作成時刻に使う時計
    clock: Arc<dyn Clock>,
}

impl InMemoryRoomRepository {
    /// システム時計を使う空のレジストリを作成
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            clock,
        }
    }
}

impl Default for InMemoryRoomRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn get_or_create(&self, name: RoomName) -> Arc<Room> {
        let mut rooms = self.rooms.lock().await;
        match rooms.entry(name) {
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(entry) => {
                let created_at = Timestamp::new(self.clock.now_millis());
                let room = Arc::new(Room::new(entry.key().clone(), created_at));
                tracing::info!(
                    "Room '{}' created at {}",
                    room.name(),
                    millis_to_rfc3339(created_at.value())
                );
                entry.insert(room).clone()
            }
        }
    }

    async fn find(&self, name: &RoomName) -> Option<Arc<Room>> {
        let rooms = self.rooms.lock().await;
        rooms.get(name).cloned()
    }

    async fn room_count(&self) -> usize {
        let rooms = self.rooms.lock().await;
        rooms.len()
    }

    async fn remove_if_empty(&self, room: &Arc<Room>) -> bool {
        let mut rooms = self.rooms.lock().await;

        let registered = match rooms.get(room.name()) {
            Some(registered) => registered,
            None => return false,
        };
        // 既に別インスタンスに置き換わっている場合は触らない
        if !Arc::ptr_eq(registered, room) {
            return false;
        }
        if !room.retire_if_empty().await {
            return false;
        }

        rooms.remove(room.name());
        tracing::info!("Room '{}' was empty and has been removed", room.name());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConnectionId, DisplayName, MessagePushError, MessageSink};
    use hubbub_shared::time::FixedClock;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - get_or_create が既存の Room を返し、未知の名前では作成すること
    // - 同じ未知の名前への同時 get_or_create が同一インスタンスを返すこと
    // - remove_if_empty が空の Room だけを除去すること
    //
    // 【なぜこのテストが必要か】
    // - レジストリの get-or-create が非アトミックだと 1 つの Room 名に
    //   2 つの Room ができ、クライアントが分断される
    // ========================================

    struct NullSink;

    #[async_trait]
    impl MessageSink for NullSink {
        async fn push(&self, _content: &str) -> Result<(), MessagePushError> {
            Ok(())
        }
    }

    fn room_name(value: &str) -> RoomName {
        RoomName::new(value.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_get_or_create_creates_room_once() {
        // テスト項目: 未知の Room 名では作成し、既知の名前では同じ Room を返す
        // given (前提条件):
        let repo = InMemoryRoomRepository::with_clock(Arc::new(FixedClock::new(42)));

        // when (操作):
        let first = repo.get_or_create(room_name("lobby")).await;
        let second = repo.get_or_create(room_name("lobby")).await;

        // then (期待する結果):
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.created_at().value(), 42);
        assert_eq!(repo.room_count().await, 1);
    }

    #[tokio::test]
    async fn test_get_or_create_separates_rooms_by_name() {
        // テスト項目: 異なる Room 名では別の Room が作られる
        // given (前提条件):
        let repo = InMemoryRoomRepository::new();

        // when (操作):
        let lobby = repo.get_or_create(room_name("lobby")).await;
        let support = repo.get_or_create(room_name("support")).await;

        // then (期待する結果):
        assert!(!Arc::ptr_eq(&lobby, &support));
        assert_eq!(lobby.name().as_str(), "lobby");
        assert_eq!(support.name().as_str(), "support");
        assert_eq!(repo.room_count().await, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_get_or_create_returns_same_room() {
        // テスト項目: 同じ未知の Room 名への同時呼び出しが全て同一の Room を返す
        // given (前提条件):
        let repo = Arc::new(InMemoryRoomRepository::new());
        let barrier = Arc::new(tokio::sync::Barrier::new(32));

        // when (操作):
        let handles: Vec<_> = (0..32)
            .map(|_| {
                let repo = repo.clone();
                let barrier = barrier.clone();
                tokio::spawn(async move {
                    barrier.wait().await;
                    repo.get_or_create(room_name("race")).await
                })
            })
            .collect();
        let mut rooms = Vec::new();
        for handle in handles {
            rooms.push(handle.await.unwrap());
        }

        // then (期待する結果):
        assert!(rooms.iter().all(|room| Arc::ptr_eq(room, &rooms[0])));
        assert_eq!(repo.room_count().await, 1);
    }

    #[tokio::test]
    async fn test_find_does_not_create() {
        // テスト項目: find は Room を作成しない
        // given (前提条件):
        let repo = InMemoryRoomRepository::new();

        // when (操作):
        let found = repo.find(&room_name("nowhere")).await;

        // then (期待する結果):
        assert!(found.is_none());
        assert_eq!(repo.room_count().await, 0);
    }

    #[tokio::test]
    async fn test_remove_if_empty_removes_empty_room() {
        // テスト項目: 空の Room は除去され、以降の join は拒否される
        // given (前提条件):
        let repo = InMemoryRoomRepository::new();
        let room = repo.get_or_create(room_name("lobby")).await;

        // when (操作):
        let removed = repo.remove_if_empty(&room).await;

        // then (期待する結果):
        assert!(removed);
        assert!(repo.find(&room_name("lobby")).await.is_none());
        let join = room
            .join(
                ConnectionId::generate(),
                DisplayName::new("late".to_string()).unwrap(),
                Timestamp::new(0),
                Arc::new(NullSink),
            )
            .await;
        assert!(join.is_err());
    }

    #[tokio::test]
    async fn test_remove_if_empty_keeps_occupied_room() {
        // テスト項目: メンバーがいる Room は除去されない
        // given (前提条件):
        let repo = InMemoryRoomRepository::new();
        let room = repo.get_or_create(room_name("lobby")).await;
        room.join(
            ConnectionId::generate(),
            DisplayName::new("alice".to_string()).unwrap(),
            Timestamp::new(0),
            Arc::new(NullSink),
        )
        .await
        .unwrap();

        // when (操作):
        let removed = repo.remove_if_empty(&room).await;

        // then (期待する結果):
        assert!(!removed);
        assert!(repo.find(&room_name("lobby")).await.is_some());
    }

    #[tokio::test]
    async fn test_remove_if_empty_ignores_stale_instance() {
        // テスト項目: 既に置き換わった古い Room インスタンスでは新しい Room を除去しない
        // given (前提条件):
        let repo = InMemoryRoomRepository::new();
        let stale = repo.get_or_create(room_name("lobby")).await;
        assert!(repo.remove_if_empty(&stale).await);
        let fresh = repo.get_or_create(room_name("lobby")).await;

        // when (操作):
        let removed = repo.remove_if_empty(&stale).await;

        // then (期待する結果):
        assert!(!removed);
        let registered = repo.find(&room_name("lobby")).await.unwrap();
        assert!(Arc::ptr_eq(&registered, &fresh));
    }
}
