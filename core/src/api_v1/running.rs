//! Bookkeeping of in-flight request ids.
//!
//! Each handler instance owns one `RunningRequests`. Ids are inserted with
//! their cancellation token when a request is dispatched and removed by
//! `RunningGuard::drop`, so removal happens exactly once for every terminal
//! outcome, including a dispatch future that is dropped before it settles.
//!
//! The token is registered together with the id. A cancellation that arrives
//! while the request is tracked but not yet handed to the transport trips the
//! token, and the dispatch settles as cancelled as soon as it is polled.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;

use crate::http::RequestId;
use crate::sync::lock;

#[derive(Debug, Clone, Default)]
pub struct RunningRequests {
    ids: Arc<Mutex<HashMap<RequestId, CancellationToken>>>,
}

impl RunningRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `id` with `token` until the returned guard is dropped.
    pub fn track(&self, id: RequestId, token: CancellationToken) -> RunningGuard {
        lock(&self.ids).insert(id.clone(), token);
        RunningGuard {
            ids: Arc::clone(&self.ids),
            id,
        }
    }

    /// Trip the token of `id`. Returns `false` if `id` is not tracked.
    pub fn cancel(&self, id: &RequestId) -> bool {
        match lock(&self.ids).get(id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: &RequestId) -> bool {
        lock(&self.ids).contains_key(id)
    }

    /// Copy of the tracked ids, so callers can act on them without holding
    /// the lock.
    pub fn snapshot(&self) -> Vec<RequestId> {
        lock(&self.ids).keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.ids).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug)]
pub struct RunningGuard {
    ids: Arc<Mutex<HashMap<RequestId, CancellationToken>>>,
    id: RequestId,
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        lock(&self.ids).remove(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_untracks_on_drop() {
        let running = RunningRequests::new();
        let id = RequestId::new();
        let guard = running.track(id.clone(), CancellationToken::new());
        assert!(running.contains(&id));
        assert_eq!(running.snapshot(), vec![id.clone()]);
        drop(guard);
        assert!(!running.contains(&id));
        assert!(running.is_empty());
    }

    #[test]
    fn separate_instances_do_not_share_ids() {
        let a = RunningRequests::new();
        let b = RunningRequests::new();
        let _guard = a.track(RequestId::new(), CancellationToken::new());
        assert_eq!(a.len(), 1);
        assert!(b.is_empty());
    }

    #[test]
    fn cancel_trips_the_tracked_token() {
        let running = RunningRequests::new();
        let id = RequestId::new();
        let token = CancellationToken::new();
        let _guard = running.track(id.clone(), token.clone());

        assert!(running.cancel(&id));
        assert!(token.is_cancelled());
        assert!(!running.cancel(&RequestId::new()));
    }
}
