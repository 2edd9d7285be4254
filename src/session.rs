//! Черновики диалогов. Всё состояние незавершённых сценариев живёт в
//! памяти процесса, ключ — telegram id пользователя. Перезапуск процесса
//! теряет черновики: в базе к этому моменту ещё ничего нет.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::admin::AdminState;
use crate::booking::BookingDraft;
use crate::models::ProductKind;

/// Текущий сценарий пользователя.
#[derive(Debug, Clone, Default)]
pub enum Conversation {
    #[default]
    Idle,
    Booking(BookingDraft),
    Admin(AdminState),
}

/// Курсор листания каталога: что смотрим и на какой позиции.
/// Сбрасывается при смене фильтра.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavCursor {
    Services { index: usize },
    Products { filter: Option<ProductKind>, index: usize },
}

#[derive(Debug)]
struct Entry {
    conversation: Conversation,
    nav: Option<NavCursor>,
    touched: Instant,
}

impl Entry {
    fn new() -> Self {
        Entry {
            conversation: Conversation::Idle,
            nav: None,
            touched: Instant::now(),
        }
    }
}

/// Общее хранилище черновиков, клонируется в обработчики.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<u64, Entry>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        SessionStore::default()
    }

    pub async fn conversation(&self, user_id: u64) -> Conversation {
        let map = self.inner.lock().await;
        map.get(&user_id)
            .map(|entry| entry.conversation.clone())
            .unwrap_or_default()
    }

    /// Запись перекрывает предыдущий сценарий целиком: начатый заново
    /// диалог молча вытесняет недописанный (last-write-wins).
    pub async fn set_conversation(&self, user_id: u64, conversation: Conversation) {
        let mut map = self.inner.lock().await;
        let entry = map.entry(user_id).or_insert_with(Entry::new);
        entry.conversation = conversation;
        entry.touched = Instant::now();
    }

    pub async fn clear_conversation(&self, user_id: u64) {
        let mut map = self.inner.lock().await;
        if let Some(entry) = map.get_mut(&user_id) {
            entry.conversation = Conversation::Idle;
            entry.touched = Instant::now();
        }
    }

    pub async fn nav(&self, user_id: u64) -> Option<NavCursor> {
        let map = self.inner.lock().await;
        map.get(&user_id).and_then(|entry| entry.nav)
    }

    pub async fn set_nav(&self, user_id: u64, cursor: NavCursor) {
        let mut map = self.inner.lock().await;
        let entry = map.entry(user_id).or_insert_with(Entry::new);
        entry.nav = Some(cursor);
        entry.touched = Instant::now();
    }

    /// Убирает записи, к которым не прикасались дольше `ttl`.
    /// Возвращает число вытесненных.
    pub async fn evict_stale(&self, ttl: Duration) -> usize {
        let mut map = self.inner.lock().await;
        let before = map.len();
        map.retain(|_, entry| entry.touched.elapsed() < ttl);
        before - map.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::{BookingDraft, BookingStep};

    #[tokio::test]
    async fn idle_by_default() {
        let store = SessionStore::new();
        assert!(matches!(store.conversation(1).await, Conversation::Idle));
    }

    #[tokio::test]
    async fn second_flow_overwrites_first() {
        let store = SessionStore::new();
        let mut first = BookingDraft::for_service(1, "Свадебная", 10_000.0);
        first.first_name = "Аня".to_string();
        store.set_conversation(7, Conversation::Booking(first)).await;

        let second = BookingDraft::for_service(2, "Семейная", 5_000.0);
        store.set_conversation(7, Conversation::Booking(second)).await;

        match store.conversation(7).await {
            Conversation::Booking(draft) => {
                assert_eq!(draft.service_id, Some(2));
                assert!(draft.first_name.is_empty());
            }
            other => panic!("unexpected conversation: {:?}", other),
        }
    }

    #[tokio::test]
    async fn clear_returns_to_idle() {
        let store = SessionStore::new();
        store
            .set_conversation(7, Conversation::Booking(BookingDraft::new()))
            .await;
        store.clear_conversation(7).await;
        assert!(matches!(store.conversation(7).await, Conversation::Idle));
    }

    #[tokio::test]
    async fn nav_cursor_is_independent_of_conversation() {
        let store = SessionStore::new();
        store
            .set_nav(3, NavCursor::Services { index: 2 })
            .await;
        assert_eq!(store.nav(3).await, Some(NavCursor::Services { index: 2 }));
        assert!(matches!(store.conversation(3).await, Conversation::Idle));
    }

    #[tokio::test]
    async fn eviction_respects_ttl() {
        let store = SessionStore::new();
        let mut draft = BookingDraft::new();
        draft.step = BookingStep::EnteringName;
        store.set_conversation(1, Conversation::Booking(draft)).await;

        assert_eq!(store.evict_stale(Duration::from_secs(3600)).await, 0);
        assert!(matches!(store.conversation(1).await, Conversation::Booking(_)));

        assert_eq!(store.evict_stale(Duration::ZERO).await, 1);
        assert!(matches!(store.conversation(1).await, Conversation::Idle));
    }
}
