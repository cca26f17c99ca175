use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::oneshot;

use floodgate_core::MemberKey;

/// Per-member arrival-order queues.
///
/// A place in a member's queue is taken synchronously by [`MemberLocks::reserve`],
/// so events run in the order they were reserved no matter when their tasks
/// are first polled. Different members never wait on each other.
#[derive(Debug, Default)]
pub struct MemberLocks {
    tails: Arc<DashMap<MemberKey, Tail>>,
    next_ticket: AtomicU64,
}

/// Last reserved turn of a member; resolves when that turn is released.
#[derive(Debug)]
struct Tail {
    ticket: u64,
    released: oneshot::Receiver<()>,
}

impl MemberLocks {
    /// Creates an empty queue table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the next place in the member's queue without waiting.
    pub fn reserve(&self, member: MemberKey) -> MemberTurn {
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        let (release, released) = oneshot::channel();
        let previous = self
            .tails
            .insert(member, Tail { ticket, released })
            .map(|tail| tail.released);

        MemberTurn {
            member,
            ticket,
            previous,
            release: Some(release),
            tails: Arc::clone(&self.tails),
        }
    }

    /// Reserves a turn and waits for it.
    pub async fn acquire(&self, member: MemberKey) -> MemberGuard {
        self.reserve(member).wait().await
    }

    /// Returns the number of members with a queued or running event.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tails.len()
    }

    /// Returns true when no member has a queued or running event.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tails.is_empty()
    }
}

/// A reserved place in a member's queue.
///
/// Dropping a turn that was never waited on hands its place to the next
/// event once every earlier event has finished.
#[derive(Debug)]
#[must_use = "later events of the member wait until this turn is used or dropped"]
pub struct MemberTurn {
    member: MemberKey,
    ticket: u64,
    previous: Option<oneshot::Receiver<()>>,
    release: Option<oneshot::Sender<()>>,
    tails: Arc<DashMap<MemberKey, Tail>>,
}

impl MemberTurn {
    /// Waits until every earlier event of the member has released its turn.
    pub async fn wait(mut self) -> MemberGuard {
        if let Some(previous) = self.previous.as_mut() {
            // A dropped sender also means the earlier turn is over.
            let _ = previous.await;
            self.previous = None;
        }

        MemberGuard {
            member: self.member,
            ticket: self.ticket,
            _release: self.release.take(),
            tails: Arc::clone(&self.tails),
        }
    }
}

impl Drop for MemberTurn {
    fn drop(&mut self) {
        if self.release.is_none() {
            return;
        }
        let guard = MemberGuard {
            member: self.member,
            ticket: self.ticket,
            _release: self.release.take(),
            tails: Arc::clone(&self.tails),
        };

        let Some(previous) = self.previous.take() else {
            return;
        };
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(async move {
                let _ = previous.await;
                drop(guard);
            });
        }
    }
}

/// Exclusive access to a member's state. The next queued event runs once
/// this guard is dropped.
#[derive(Debug)]
pub struct MemberGuard {
    member: MemberKey,
    ticket: u64,
    _release: Option<oneshot::Sender<()>>,
    tails: Arc<DashMap<MemberKey, Tail>>,
}

impl Drop for MemberGuard {
    fn drop(&mut self) {
        // Only the newest turn owns the tail entry.
        self.tails
            .remove_if(&self.member, |_, tail| tail.ticket == self.ticket);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use floodgate_core::{ChatId, MemberKey, UserId};

    use super::MemberLocks;

    fn member(user: i64) -> MemberKey {
        MemberKey::new(ChatId::new(1), UserId::new(user))
    }

    fn push(order: &Mutex<Vec<&'static str>>, label: &'static str) {
        if let Ok(mut entries) = order.lock() {
            entries.push(label);
        }
    }

    fn entries(order: &Mutex<Vec<&'static str>>) -> Vec<&'static str> {
        order
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn same_member_is_serialized() {
        let locks = Arc::new(MemberLocks::new());

        let guard = locks.acquire(member(1)).await;
        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.acquire(member(1)).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        assert!(contender.await.is_ok());
    }

    #[tokio::test]
    async fn different_members_do_not_block() {
        let locks = MemberLocks::new();

        let _first_guard = locks.acquire(member(1)).await;
        let second_guard =
            tokio::time::timeout(Duration::from_millis(100), locks.acquire(member(2))).await;
        assert!(second_guard.is_ok());
    }

    #[tokio::test]
    async fn turns_run_in_reservation_order_even_when_polled_late() {
        let locks = MemberLocks::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let first = locks.reserve(member(1));
        let second = locks.reserve(member(1));

        let late = {
            let order = Arc::clone(&order);
            tokio::spawn(async move {
                let _guard = second.wait().await;
                push(&order, "second");
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        let early = {
            let order = Arc::clone(&order);
            tokio::spawn(async move {
                let _guard = first.wait().await;
                tokio::time::sleep(Duration::from_millis(50)).await;
                push(&order, "first");
            })
        };

        assert!(early.await.is_ok());
        assert!(late.await.is_ok());
        assert_eq!(entries(&order), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn dropped_turn_does_not_let_later_events_jump_ahead() {
        let locks = MemberLocks::new();

        let holder = locks.acquire(member(1)).await;
        let abandoned = locks.reserve(member(1));
        let last = locks.reserve(member(1));
        drop(abandoned);

        let waiter = tokio::spawn(async move {
            let _guard = last.wait().await;
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(holder);
        let finished = tokio::time::timeout(Duration::from_millis(200), waiter).await;
        assert!(matches!(finished, Ok(Ok(()))));
    }

    #[tokio::test]
    async fn released_members_leave_the_table() {
        let locks = MemberLocks::new();

        let held = locks.acquire(member(1)).await;
        drop(locks.acquire(member(2)).await);
        assert_eq!(locks.len(), 1);

        let queued = locks.reserve(member(1));
        drop(held);
        assert_eq!(locks.len(), 1);

        drop(queued.wait().await);
        assert!(locks.is_empty());
    }
}
