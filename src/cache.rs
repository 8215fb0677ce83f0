use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use log::{debug, warn};
use lru::LruCache;

use crate::model::{ClearedCounts, Payload};
use crate::param::CacheKind;
use crate::util::{Clock, SystemClock};

#[derive(Clone)]
struct CacheEntry {
    payload: Arc<Payload>,
    created_at: Instant,
}

type Store = RwLock<LruCache<String, CacheEntry>>;

/// 在开始抓取前领取的代数凭证，见 [`ResultCache::put_since`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation(u64);

/// 按 (学号, 查询类别) 缓存抓取结果，过期判断在读取时进行。
///
/// 三个类别各自持有一把读写锁。`clear` 会同时持有三把写锁并推进代数，
/// 在 `clear` 之前领取凭证的写入会被丢弃。
pub struct ResultCache {
    attendance: Store,
    datewise: Store,
    tilldate: Store,
    generation: AtomicU64,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl ResultCache {
    // 根据容量与有效期构造
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self::with_clock(capacity, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(capacity: usize, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let capacity = match NonZeroUsize::new(capacity) {
            Some(c) => c,
            None => {
                warn!("缓存容量被指定为0，改为1");
                NonZeroUsize::MIN
            }
        };
        Self {
            attendance: RwLock::new(LruCache::new(capacity)),
            datewise: RwLock::new(LruCache::new(capacity)),
            tilldate: RwLock::new(LruCache::new(capacity)),
            generation: AtomicU64::new(0),
            ttl,
            clock,
        }
    }

    fn store(&self, kind: CacheKind) -> &Store {
        match kind {
            CacheKind::Attendance => &self.attendance,
            CacheKind::DateWise => &self.datewise,
            CacheKind::TillDate => &self.tilldate,
        }
    }

    fn read(store: &Store) -> RwLockReadGuard<'_, LruCache<String, CacheEntry>> {
        match store.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("缓存锁被污染，恢复并继续");
                poisoned.into_inner()
            }
        }
    }

    fn write(store: &Store) -> RwLockWriteGuard<'_, LruCache<String, CacheEntry>> {
        match store.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("缓存锁被污染，恢复并继续");
                poisoned.into_inner()
            }
        }
    }

    fn is_fresh(&self, entry: &CacheEntry, now: Instant) -> bool {
        now.saturating_duration_since(entry.created_at) < self.ttl
    }

    // 查询有效缓存
    pub fn get(&self, identity: &str, kind: CacheKind) -> Option<Arc<Payload>> {
        let store = self.store(kind);
        let now = self.clock.now();
        {
            let guard = Self::read(store);
            match guard.peek(identity) {
                Some(entry) if self.is_fresh(entry, now) => {
                    debug!("缓存命中：{} - {}", identity, kind);
                    return Some(Arc::clone(&entry.payload));
                }
                Some(_) => {}
                None => return None,
            }
        }
        // 过期条目在此惰性移除；期间可能已有新值写入，因此需要再次检查
        let mut guard = Self::write(store);
        if let Some(entry) = guard.peek(identity) {
            if self.is_fresh(entry, now) {
                return Some(Arc::clone(&entry.payload));
            }
            guard.pop(identity);
            debug!("缓存过期并移除：{} - {}", identity, kind);
        }
        None
    }

    /// 当前代数，应在开始抓取前领取
    pub fn generation(&self) -> Generation {
        Generation(self.generation.load(Ordering::SeqCst))
    }

    // 放入
    pub fn put(&self, identity: &str, kind: CacheKind, payload: Payload) {
        let mut guard = Self::write(self.store(kind));
        self.insert(&mut guard, identity, kind, payload);
    }

    /// 仅当凭证领取之后没有发生过 `clear` 时才写入。返回是否写入。
    pub fn put_since(&self, ticket: Generation, identity: &str, kind: CacheKind, payload: Payload) -> bool {
        let mut guard = Self::write(self.store(kind));
        // clear 持有全部写锁时推进代数，这里持有写锁后读取即可得到一致的结果
        if self.generation.load(Ordering::SeqCst) != ticket.0 {
            debug!("抓取期间缓存已被清空，丢弃结果：{} - {}", identity, kind);
            return false;
        }
        self.insert(&mut guard, identity, kind, payload);
        true
    }

    fn insert(
        &self,
        guard: &mut LruCache<String, CacheEntry>,
        identity: &str,
        kind: CacheKind,
        payload: Payload,
    ) {
        let entry = CacheEntry {
            payload: Arc::new(payload),
            created_at: self.clock.now(),
        };
        guard.put(identity.to_string(), entry);
        debug!("已缓存：{} - {}", identity, kind);
    }

    /// 清空全部存储区并返回清空前的条目数
    pub fn clear(&self) -> ClearedCounts {
        let mut attendance = Self::write(&self.attendance);
        let mut datewise = Self::write(&self.datewise);
        let mut tilldate = Self::write(&self.tilldate);
        let counts = ClearedCounts {
            attendance: attendance.len(),
            datewise: datewise.len(),
            tilldate: tilldate.len(),
        };
        attendance.clear();
        datewise.clear();
        tilldate.clear();
        self.generation.fetch_add(1, Ordering::SeqCst);
        counts
    }

    /// 某个存储区的条目数（包含尚未被惰性移除的过期条目）
    pub fn len(&self, kind: CacheKind) -> usize {
        Self::read(self.store(kind)).len()
    }

    pub fn is_empty(&self) -> bool {
        CacheKind::ALL.iter().all(|kind| self.len(*kind) == 0)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn capacity(&self) -> usize {
        Self::read(&self.attendance).cap().get()
    }
}
