//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 通知生命周期集成测试。使用暂停时钟验证到期边界。

#[path = "../common/mod.rs"]
mod common;

use common::{setup_logging, MemoryStore};
use oxsync::{
    Config, KeyPrefix, MutationDescriptor, NotificationCenter, NotificationKind, ResourceClient,
    SyncContext, WriteOp,
};
use std::time::Duration;

/// duration=5000 的通知在 4999ms 仍在、5001ms 已消失
#[tokio::test(start_paused = true)]
async fn test_timed_notification_expires_on_schedule() {
    setup_logging();
    let center = NotificationCenter::new(5000);
    let id = center.push(NotificationKind::Info, "Info", "will expire", Some(5000));

    tokio::time::sleep(Duration::from_millis(4999)).await;
    assert!(center.contains(id), "present at t=4999ms");

    tokio::time::sleep(Duration::from_millis(2)).await;
    assert!(!center.contains(id), "absent at t=5001ms");
}

/// duration=0 的通知常驻，直到显式关闭
#[tokio::test(start_paused = true)]
async fn test_sticky_notification_persists_until_dismissed() {
    setup_logging();
    let center = NotificationCenter::new(5000);
    let id = center.push(NotificationKind::Warning, "Warning", "sticky", Some(0));

    tokio::time::sleep(Duration::from_millis(1_000_000)).await;
    assert!(center.contains(id), "sticky notification must persist");

    assert!(center.dismiss(id));
    assert!(!center.contains(id));
}

/// 重复关闭是无操作：不报错、无重复副作用
#[tokio::test(start_paused = true)]
async fn test_double_dismiss_is_noop() {
    setup_logging();
    let center = NotificationCenter::new(5000);
    let id = center.push(NotificationKind::Success, "OK", "done", Some(5000));

    assert!(center.dismiss(id));
    assert!(!center.dismiss(id));

    // 定时器已被中止，到期后不会对已移除的ID产生悬挂触发
    let mut rx = center.subscribe();
    let revision = *rx.borrow_and_update();
    tokio::time::sleep(Duration::from_millis(6000)).await;
    assert_eq!(*rx.borrow_and_update(), revision, "no further removal side effect");
}

/// 变更产生的通知使用上下文配置的默认时长
#[tokio::test(start_paused = true)]
async fn test_mutation_notification_uses_default_duration() {
    setup_logging();
    let mut config = Config::default();
    config.notifications.default_duration_ms = 2000;
    let ctx = SyncContext::new(config).unwrap();
    let store = MemoryStore::new();
    let client = ResourceClient::new(ctx.clone(), store);

    let descriptor = MutationDescriptor::new("Create RFI")
        .on_success("RFI created successfully")
        .invalidates(KeyPrefix::resource("rfis"));
    client
        .mutate_write(
            "rfis",
            WriteOp::Insert,
            serde_json::json!({"id": "r1", "subject": "Clarify loads"}),
            &descriptor,
        )
        .await
        .unwrap();

    let snapshot = ctx.notifications().snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].duration_ms, 2000);

    tokio::time::sleep(Duration::from_millis(2001)).await;
    assert!(ctx.notifications().snapshot().is_empty());
}

/// 通知按插入顺序出现
#[tokio::test(start_paused = true)]
async fn test_notifications_appear_in_insertion_order() {
    setup_logging();
    let center = NotificationCenter::new(0);
    center.success("A", "first");
    center.error("B", "second");
    center.push(NotificationKind::Info, "C", "third", None);

    let titles: Vec<String> = center.snapshot().into_iter().map(|n| n.title).collect();
    assert_eq!(titles, vec!["A", "B", "C"]);
}
