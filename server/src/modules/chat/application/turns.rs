// 对话轮次协调
//
// - 每个会话一把异步互斥锁，整轮（解析会话到持久化回复）持有，
//   同一会话的轮次串行，不同会话互不影响；无人持有时回收锁条目
// - 正在执行的轮次登记取消信号，供 stop 使用

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{watch, Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

use crate::modules::chat::domain::SessionId;

type LockMap = HashMap<SessionId, Arc<AsyncMutex<()>>>;
type ActiveMap = HashMap<SessionId, (u64, watch::Sender<bool>)>;

fn lock_map<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // 持锁期间不会 panic，中毒时数据仍然有效
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// 按会话划分的异步锁
#[derive(Default)]
pub struct SessionLocks {
    locks: Arc<Mutex<LockMap>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// 等待并获取会话的锁
    pub async fn lock(&self, session_id: SessionId) -> SessionLock {
        let mutex = lock_map(&self.locks)
            .entry(session_id)
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone();

        let guard = mutex.lock_owned().await;
        SessionLock {
            session_id,
            guard: Some(guard),
            locks: self.locks.clone(),
        }
    }

    /// 当前保留的锁条目数
    #[cfg(test)]
    pub(crate) fn entries(&self) -> usize {
        lock_map(&self.locks).len()
    }
}

/// 会话锁，drop 时释放并在无人等待时回收条目
pub struct SessionLock {
    session_id: SessionId,
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<Mutex<LockMap>>,
}

impl Drop for SessionLock {
    fn drop(&mut self) {
        // 先释放互斥锁，再检查是否还有等待者
        self.guard.take();

        let mut locks = lock_map(&self.locks);
        if let Some(mutex) = locks.get(&self.session_id) {
            if Arc::strong_count(mutex) == 1 {
                locks.remove(&self.session_id);
            }
        }
    }
}

/// 轮次协调器
#[derive(Default)]
pub struct TurnCoordinator {
    locks: SessionLocks,
    active: Arc<Mutex<ActiveMap>>,
    next_turn: AtomicU64,
}

impl TurnCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 等待并获取会话的轮次锁
    pub async fn lock(&self, session_id: SessionId) -> SessionLock {
        self.locks.lock(session_id).await
    }

    /// 登记正在执行的轮次，返回的句柄在 drop 时注销
    pub fn begin(&self, session_id: SessionId) -> ActiveTurn {
        let turn_id = self.next_turn.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = watch::channel(false);

        lock_map(&self.active).insert(session_id, (turn_id, sender));

        ActiveTurn {
            session_id,
            turn_id,
            receiver,
            active: self.active.clone(),
        }
    }

    /// 取消会话上正在执行的轮次，返回是否存在这样的轮次
    pub fn cancel(&self, session_id: SessionId) -> bool {
        match lock_map(&self.active).get(&session_id) {
            Some((turn_id, sender)) => {
                debug!("Cancelling turn {} on session {}", turn_id, session_id);
                sender.send_replace(true);
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    pub(crate) fn is_active(&self, session_id: SessionId) -> bool {
        lock_map(&self.active).contains_key(&session_id)
    }

    #[cfg(test)]
    pub(crate) fn lock_entries(&self) -> usize {
        self.locks.entries()
    }
}

/// 正在执行的轮次
pub struct ActiveTurn {
    session_id: SessionId,
    turn_id: u64,
    receiver: watch::Receiver<bool>,
    active: Arc<Mutex<ActiveMap>>,
}

impl ActiveTurn {
    /// 收到取消信号后完成
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        if receiver.wait_for(|cancelled| *cancelled).await.is_err() {
            // 发送端已注销，不会再被取消
            std::future::pending::<()>().await;
        }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }
}

impl Drop for ActiveTurn {
    fn drop(&mut self) {
        let mut active = lock_map(&self.active);
        if matches!(active.get(&self.session_id), Some((id, _)) if *id == self.turn_id) {
            active.remove(&self.session_id);
        }
    }
}
