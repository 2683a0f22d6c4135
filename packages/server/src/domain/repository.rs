//! Repository trait 定義
//!
//! Room 名から Room を引くレジストリのインターフェース。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use std::sync::Arc;

use async_trait::async_trait;

use super::{Room, RoomName};

/// Room レジストリ
///
/// プロセス全体で 1 つ。Room は初めて参照されたときに作られる。
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// Room を取得し、存在しなければ空の Room を作成して登録する
    ///
    /// 同じ未知の Room 名に対する同時呼び出しは、必ず同じ Room を返す。
    async fn get_or_create(&self, name: RoomName) -> Arc<Room>;

    /// Room を取得（作成はしない）
    async fn find(&self, name: &RoomName) -> Option<Arc<Room>>;

    /// 登録されている Room の数
    async fn room_count(&self) -> usize;

    /// `room` が登録中のインスタンスと同一で、かつ空であればレジストリから除去する
    ///
    /// 除去した場合は `true`。除去された Room は以降の join を拒否する。
    async fn remove_if_empty(&self, room: &Arc<Room>) -> bool;
}
