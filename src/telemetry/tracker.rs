//! 使用统计追踪器
//!
//! 以操作名为键的并发计数器。记录首次创建是单个原子操作
//! （`DashMap::entry().or_insert_with`），并发的首次调用者只会得到同一条记录。

use crate::plugins::registry::panic_message;
use crate::types::ParamBag;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 单个操作的实时统计
///
/// 各字段分别原子更新，彼此之间不构成事务。
#[derive(Debug)]
pub struct UsageRecord {
    operation: String,
    total_calls: AtomicU64,
    first_used_at: DateTime<Utc>,
    /// 微秒时间戳，只前进不后退
    last_used_micros: AtomicI64,
    cumulative_parameter_count: AtomicU64,
    parameter_frequency: DashMap<String, AtomicU64>,
}

impl UsageRecord {
    fn new(operation: &str, created_at: DateTime<Utc>) -> Self {
        Self {
            operation: operation.to_string(),
            total_calls: AtomicU64::new(0),
            first_used_at: created_at,
            last_used_micros: AtomicI64::new(created_at.timestamp_micros()),
            cumulative_parameter_count: AtomicU64::new(0),
            parameter_frequency: DashMap::new(),
        }
    }

    fn observe(&self, parameters: &ParamBag, at: DateTime<Utc>) {
        self.total_calls.fetch_add(1, Ordering::Relaxed);
        self.last_used_micros.fetch_max(at.timestamp_micros(), Ordering::Relaxed);

        for key in parameters.keys() {
            if let Some(counter) = self.parameter_frequency.get(key.as_str()) {
                counter.fetch_add(1, Ordering::Relaxed);
                continue;
            }
            self.parameter_frequency
                .entry(key.clone())
                .or_insert_with(|| AtomicU64::new(0))
                .fetch_add(1, Ordering::Relaxed);
        }

        self.cumulative_parameter_count
            .fetch_add(parameters.len() as u64, Ordering::Relaxed);
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn total_calls(&self) -> u64 {
        self.total_calls.load(Ordering::Relaxed)
    }

    pub fn first_used_at(&self) -> DateTime<Utc> {
        self.first_used_at
    }

    pub fn last_used_at(&self) -> DateTime<Utc> {
        let micros = self.last_used_micros.load(Ordering::Relaxed);
        DateTime::<Utc>::from_timestamp_micros(micros).unwrap_or(self.first_used_at)
    }

    /// 独立副本
    pub fn snapshot(&self) -> UsageSnapshot {
        UsageSnapshot {
            operation: self.operation.clone(),
            total_calls: self.total_calls(),
            first_used_at: self.first_used_at,
            last_used_at: self.last_used_at(),
            cumulative_parameter_count: self.cumulative_parameter_count.load(Ordering::Relaxed),
            parameter_frequency: self
                .parameter_frequency
                .iter()
                .map(|entry| (entry.key().clone(), entry.value().load(Ordering::Relaxed)))
                .collect(),
        }
    }
}

/// 使用统计快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSnapshot {
    pub operation: String,
    pub total_calls: u64,
    pub first_used_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
    pub cumulative_parameter_count: u64,
    pub parameter_frequency: BTreeMap<String, u64>,
}

impl UsageSnapshot {
    /// 平均参数个数，无调用时为 0
    pub fn average_parameter_count(&self) -> f64 {
        if self.total_calls == 0 {
            0.0
        } else {
            self.cumulative_parameter_count as f64 / self.total_calls as f64
        }
    }
}

/// 使用统计追踪器
#[derive(Debug)]
pub struct UsageTracker {
    records: DashMap<String, Arc<UsageRecord>>,
    enabled: AtomicBool,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            enabled: AtomicBool::new(true),
        }
    }

    /// 创建停用的追踪器，`record` 不产生任何记录
    pub fn disabled() -> Self {
        let tracker = Self::new();
        tracker.set_enabled(false);
        tracker
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// 记录一次调用
    ///
    /// 尽力而为：内部故障只记录日志，不会影响调用方。
    pub fn record(&self, operation: &str, parameters: &ParamBag) {
        if !self.is_enabled() {
            return;
        }

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let now = Utc::now();
            self.record_for(operation, now).observe(parameters, now);
        }));

        match outcome {
            Ok(()) => debug!("Usage tracked: {} with {} parameters", operation, parameters.len()),
            Err(payload) => warn!(
                "Failed to track usage for {}: {}",
                operation,
                panic_message(payload)
            ),
        }
    }

    /// 记录后执行闭包
    pub fn traced<T>(&self, operation: &str, parameters: &ParamBag, f: impl FnOnce() -> T) -> T {
        self.record(operation, parameters);
        f()
    }

    fn record_for(&self, operation: &str, now: DateTime<Utc>) -> Arc<UsageRecord> {
        if let Some(record) = self.records.get(operation) {
            return record.value().clone();
        }
        self.records
            .entry(operation.to_string())
            .or_insert_with(|| Arc::new(UsageRecord::new(operation, now)))
            .value()
            .clone()
    }

    pub fn get_snapshot(&self, operation: &str) -> Option<UsageSnapshot> {
        self.records.get(operation).map(|record| record.snapshot())
    }

    /// 所有快照，按调用次数降序、操作名升序
    pub fn get_all_snapshots(&self) -> Vec<UsageSnapshot> {
        let mut snapshots: Vec<UsageSnapshot> = self
            .records
            .iter()
            .map(|entry| entry.value().snapshot())
            .collect();
        snapshots.sort_by(|a, b| {
            b.total_calls
                .cmp(&a.total_calls)
                .then_with(|| a.operation.cmp(&b.operation))
        });
        snapshots
    }

    /// 清空所有记录，调用方需保证此时没有并发记录
    pub fn reset(&self) {
        self.records.clear();
        info!("Usage statistics reset");
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for UsageTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Barrier;

    fn bag(keys: &[&str]) -> ParamBag {
        keys.iter().map(|k| (k.to_string(), json!(true))).collect()
    }

    #[test]
    fn test_concurrent_records_are_not_lost() {
        const THREADS: usize = 100;
        const CALLS: usize = 1000;

        let tracker = UsageTracker::new();
        let barrier = Barrier::new(THREADS);
        let empty = ParamBag::new();

        crossbeam::thread::scope(|s| {
            for _ in 0..THREADS {
                s.spawn(|_| {
                    barrier.wait();
                    for _ in 0..CALLS {
                        tracker.record("op", &empty);
                    }
                });
            }
        })
        .unwrap();

        let snapshot = tracker.get_snapshot("op").unwrap();
        assert_eq!(snapshot.total_calls, (THREADS * CALLS) as u64);
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_first_used_at_set_once_under_contention() {
        let tracker = UsageTracker::new();
        let barrier = Barrier::new(16);
        let params = bag(&["selector"]);

        crossbeam::thread::scope(|s| {
            for _ in 0..16 {
                s.spawn(|_| {
                    barrier.wait();
                    tracker.record("click", &params);
                });
            }
        })
        .unwrap();

        let first = tracker.get_snapshot("click").unwrap();
        assert_eq!(first.total_calls, 16);
        assert_eq!(first.parameter_frequency["selector"], 16);

        std::thread::sleep(std::time::Duration::from_millis(2));
        tracker.record("click", &params);

        let later = tracker.get_snapshot("click").unwrap();
        assert_eq!(later.first_used_at, first.first_used_at);
        assert!(later.last_used_at >= first.last_used_at);
        assert!(later.first_used_at <= later.last_used_at);
    }

    #[test]
    fn test_average_parameter_count() {
        let tracker = UsageTracker::new();
        tracker.record("type", &bag(&["selector", "text"]));
        tracker.record("type", &bag(&["selector", "text", "clearFirst"]));
        tracker.record("type", &bag(&[]));

        let snapshot = tracker.get_snapshot("type").unwrap();
        assert_eq!(snapshot.cumulative_parameter_count, 5);
        assert!((snapshot.average_parameter_count() - 5.0 / 3.0).abs() < 1e-9);
        assert_eq!(snapshot.parameter_frequency["selector"], 2);
        assert_eq!(snapshot.parameter_frequency["clearFirst"], 1);
    }

    #[test]
    fn test_average_is_zero_without_calls() {
        let snapshot = UsageSnapshot {
            operation: "idle".into(),
            total_calls: 0,
            first_used_at: Utc::now(),
            last_used_at: Utc::now(),
            cumulative_parameter_count: 0,
            parameter_frequency: BTreeMap::new(),
        };
        assert_eq!(snapshot.average_parameter_count(), 0.0);
    }

    #[test]
    fn test_snapshots_are_copies() {
        let tracker = UsageTracker::new();
        tracker.record("navigateTo", &bag(&["url"]));

        let mut snapshots = tracker.get_all_snapshots();
        snapshots[0].total_calls = 999;
        snapshots[0].parameter_frequency.clear();

        tracker.record("navigateTo", &bag(&["url"]));
        let fresh = tracker.get_snapshot("navigateTo").unwrap();
        assert_eq!(fresh.total_calls, 2);
        assert_eq!(fresh.parameter_frequency["url"], 2);
    }

    #[test]
    fn test_snapshots_sorted_by_calls() {
        let tracker = UsageTracker::new();
        for _ in 0..3 {
            tracker.record("b", &ParamBag::new());
        }
        tracker.record("c", &ParamBag::new());
        tracker.record("a", &ParamBag::new());

        let order: Vec<String> = tracker.get_all_snapshots().into_iter().map(|s| s.operation).collect();
        assert_eq!(order, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_reset_clears_records() {
        let tracker = UsageTracker::new();
        tracker.record("op", &ParamBag::new());
        tracker.reset();
        assert!(tracker.is_empty());
        assert!(tracker.get_snapshot("op").is_none());

        tracker.record("op", &ParamBag::new());
        assert_eq!(tracker.get_snapshot("op").unwrap().total_calls, 1);
    }

    #[test]
    fn test_disabled_tracker_records_nothing() {
        let tracker = UsageTracker::disabled();
        tracker.record("op", &ParamBag::new());
        assert!(tracker.is_empty());

        tracker.set_enabled(true);
        tracker.record("op", &ParamBag::new());
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_traced_records_then_runs() {
        let tracker = UsageTracker::new();
        let value = tracker.traced("getPerformanceMetrics", &ParamBag::new(), || 42);
        assert_eq!(value, 42);
        assert_eq!(tracker.get_snapshot("getPerformanceMetrics").unwrap().total_calls, 1);
    }

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let tracker = UsageTracker::new();
        tracker.record("op", &bag(&["k"]));
        let json = serde_json::to_value(tracker.get_snapshot("op").unwrap()).unwrap();
        assert_eq!(json["totalCalls"], json!(1));
        assert_eq!(json["parameterFrequency"]["k"], json!(1));
    }
}
