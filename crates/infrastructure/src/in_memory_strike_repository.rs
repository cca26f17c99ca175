use std::collections::HashMap;

use async_trait::async_trait;
use floodgate_application::StrikeRepository;
use floodgate_core::{AppError, AppResult, MemberKey};
use tokio::sync::RwLock;

/// In-memory strike counters for tests and local development.
///
/// Counts are lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryStrikeRepository {
    counts: RwLock<HashMap<MemberKey, u32>>,
}

impl InMemoryStrikeRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StrikeRepository for InMemoryStrikeRepository {
    async fn increment(&self, member: MemberKey) -> AppResult<u32> {
        let mut counts = self.counts.write().await;
        let count = counts.entry(member).or_insert(0);
        *count = count.checked_add(1).ok_or_else(|| {
            AppError::Store(format!("strike count overflow for member {member}"))
        })?;
        Ok(*count)
    }

    async fn get(&self, member: MemberKey) -> AppResult<u32> {
        Ok(self.counts.read().await.get(&member).copied().unwrap_or(0))
    }

    async fn reset(&self, member: MemberKey) -> AppResult<()> {
        self.counts.write().await.remove(&member);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use floodgate_application::StrikeRepository;
    use floodgate_core::{ChatId, MemberKey, UserId};

    use super::InMemoryStrikeRepository;

    fn member(user: i64) -> MemberKey {
        MemberKey::new(ChatId::new(-1), UserId::new(user))
    }

    #[tokio::test]
    async fn increment_returns_new_count() {
        let repository = InMemoryStrikeRepository::new();
        assert_eq!(repository.get(member(1)).await.ok(), Some(0));
        assert_eq!(repository.increment(member(1)).await.ok(), Some(1));
        assert_eq!(repository.increment(member(1)).await.ok(), Some(2));
        assert_eq!(repository.get(member(2)).await.ok(), Some(0));
    }

    #[tokio::test]
    async fn reset_zeroes_count_and_tolerates_missing_record() {
        let repository = InMemoryStrikeRepository::new();
        assert!(repository.reset(member(1)).await.is_ok());

        assert!(repository.increment(member(1)).await.is_ok());
        assert!(repository.reset(member(1)).await.is_ok());
        assert_eq!(repository.get(member(1)).await.ok(), Some(0));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_increments_are_never_lost() {
        let repository = Arc::new(InMemoryStrikeRepository::new());

        let handles: Vec<_> = (0..64)
            .map(|_| {
                let repository = Arc::clone(&repository);
                tokio::spawn(async move { repository.increment(member(7)).await })
            })
            .collect();

        let mut returned = Vec::new();
        for handle in handles {
            let count = handle
                .await
                .unwrap_or_else(|_| unreachable!())
                .unwrap_or_else(|_| unreachable!());
            returned.push(count);
        }

        returned.sort_unstable();
        assert_eq!(returned, (1..=64).collect::<Vec<u32>>());
        assert_eq!(repository.get(member(7)).await.ok(), Some(64));
    }
}
