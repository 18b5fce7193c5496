//! In-Flight Registry - 单飞（single-flight）任务注册表
//!
//! 同一个 key 同时只有一个生成任务在运行，后来的调用者等待同一个结果。
//! 任务结束（成功或失败）后条目被无条件移除，失败不会“毒化”该 key。

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use std::future::Future;
use std::sync::Arc;

use crate::application::ports::CacheError;

type Flight<T> = Shared<BoxFuture<'static, Result<T, CacheError>>>;

/// 单飞注册表
pub struct InFlightRegistry<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// key -> 进行中的任务
    flights: Arc<DashMap<String, Flight<T>>>,
}

impl<T> Default for InFlightRegistry<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> InFlightRegistry<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            flights: Arc::new(DashMap::new()),
        }
    }

    /// 进行中的任务数
    pub fn len(&self) -> usize {
        self.flights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flights.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.flights.contains_key(key)
    }

    /// 对同一 key 至多执行一次 `produce`
    ///
    /// `produce` 在注册时立即调用，生成的 future 被 spawn 到后台运行，
    /// 即使所有等待者都被取消也会执行完并清理注册表。
    pub async fn resolve_once<F, Fut>(&self, key: &str, produce: F) -> Result<T, CacheError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, CacheError>> + Send + 'static,
    {
        let flight = match self.flights.entry(key.to_string()) {
            Entry::Occupied(entry) => {
                tracing::debug!(key = %key, "Waiting for ongoing generation");
                entry.get().clone()
            }
            Entry::Vacant(entry) => {
                // produce 同步 panic 时 entry 仍持有分片锁，guard 必须在其后创建
                let task = produce();
                let guard = FlightGuard {
                    flights: self.flights.clone(),
                    key: key.to_string(),
                };
                let handle = tokio::spawn(async move {
                    let _guard = guard; // 结束或 panic 时移除条目
                    task.await
                });

                let flight: Flight<T> = async move {
                    handle.await.unwrap_or_else(|e| {
                        Err(CacheError::GenerationFailed(format!(
                            "generation task aborted: {}",
                            e
                        )))
                    })
                }
                .boxed()
                .shared();

                entry.insert(flight.clone());
                flight
            }
        };

        flight.await
    }
}

/// 任务结束时移除注册表条目
struct FlightGuard<T>
where
    T: Clone + Send + Sync + 'static,
{
    flights: Arc<DashMap<String, Flight<T>>>,
    key: String,
}

impl<T> Drop for FlightGuard<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn drop(&mut self) {
        self.flights.remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_share_one_invocation() {
        let registry = Arc::new(InFlightRegistry::<String>::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = registry.clone();
                let calls = calls.clone();
                tokio::spawn(async move {
                    registry
                        .resolve_once("voice-hello", move || {
                            calls.fetch_add(1, Ordering::SeqCst);
                            async move {
                                tokio::time::sleep(Duration::from_millis(100)).await;
                                Ok("artifact".to_string())
                            }
                        })
                        .await
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "artifact");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_failure_is_shared_and_not_sticky() {
        let registry = Arc::new(InFlightRegistry::<u32>::new());

        let first = registry.resolve_once("k", || async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Err(CacheError::QuotaExceeded("limit".to_string()))
        });
        let second = registry.resolve_once("k", || async { Ok(7) });

        let (a, b) = tokio::join!(first, second);
        assert_eq!(a, Err(CacheError::QuotaExceeded("limit".to_string())));
        assert_eq!(b, a);
        assert!(!registry.contains("k"));

        // 失败后可以重试
        let retry = registry.resolve_once("k", || async { Ok(7) }).await;
        assert_eq!(retry, Ok(7));
    }

    #[tokio::test]
    async fn test_distinct_keys_run_in_parallel() {
        let registry = Arc::new(InFlightRegistry::<&'static str>::new());
        let started = std::time::Instant::now();

        let a = registry.resolve_once("a", || async {
            tokio::time::sleep(Duration::from_millis(150)).await;
            Ok("a")
        });
        let b = registry.resolve_once("b", || async {
            tokio::time::sleep(Duration::from_millis(150)).await;
            Ok("b")
        });

        let (a, b) = tokio::join!(a, b);
        assert_eq!((a, b), (Ok("a"), Ok("b")));
        assert!(started.elapsed() < Duration::from_millis(290));
    }

    #[tokio::test]
    async fn test_cancelled_waiter_still_cleans_up() {
        let registry = Arc::new(InFlightRegistry::<u32>::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let waiter = {
            let registry = registry.clone();
            let calls = calls.clone();
            tokio::spawn(async move {
                registry
                    .resolve_once("k", move || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        async {
                            tokio::time::sleep(Duration::from_millis(50)).await;
                            Ok(1)
                        }
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        waiter.abort();
        assert!(registry.contains("k"));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(registry.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_synchronous_panic_in_produce_leaves_registry_usable() {
        use std::panic::AssertUnwindSafe;

        let registry = InFlightRegistry::<u32>::new();

        let result = AssertUnwindSafe(registry.resolve_once(
            "k",
            || -> std::future::Ready<Result<u32, CacheError>> { panic!("produce failed") },
        ))
        .catch_unwind()
        .await;
        assert!(result.is_err());
        assert!(registry.is_empty());

        let retry = registry.resolve_once("k", || async { Ok(3) }).await;
        assert_eq!(retry, Ok(3));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_panicking_producer_releases_key() {
        let registry = InFlightRegistry::<u32>::new();

        let result = registry
            .resolve_once("k", || async {
                if true {
                    panic!("boom");
                }
                Ok(1)
            })
            .await;

        assert!(matches!(result, Err(CacheError::GenerationFailed(_))));
        assert!(registry.is_empty());
    }
}
