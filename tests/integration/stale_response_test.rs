//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 过期响应丢弃集成测试：乱序完成的旧响应不得污染缓存。
//! 使用暂停时钟精确控制响应完成顺序。

#[path = "../common/mod.rs"]
mod common;

use common::{test_context, MemoryStore};
use oxsync::{
    KeyPrefix, MutationDescriptor, ReadOptions, ResourceClient, ResourceKey,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// R1先发出、失效发生、R2后发出且先完成：缓存必须反映R2的结果，
/// R1迟到的响应被序列号验收丢弃。
#[tokio::test(start_paused = true)]
async fn test_out_of_order_resolution_does_not_corrupt_cache() {
    let ctx = test_context();
    let client = Arc::new(ResourceClient::new(ctx.clone(), MemoryStore::new()));
    let key = ResourceKey::new("projects").with("owner_id").with("u1");

    // R1：慢响应，100ms后返回变更前的数据
    let r1_client = client.clone();
    let r1_key = key.clone();
    let r1 = tokio::spawn(async move {
        r1_client
            .read(
                &r1_key,
                || async {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    Ok("pre-mutation".to_string())
                },
                ReadOptions::default(),
            )
            .await
    });

    // 让R1注册在飞请求
    tokio::time::sleep(Duration::from_millis(1)).await;

    // 变更使该键失效（序列号推进，R1的响应作废）
    let descriptor =
        MutationDescriptor::new("Update project").invalidates(KeyPrefix::resource("projects"));
    client
        .mutate((), |_| async { Ok(()) }, &descriptor)
        .await
        .unwrap();

    // R2：失效之后发出，快速返回变更后的数据
    let r2_state = client
        .read(
            &key,
            || async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok("post-mutation".to_string())
            },
            ReadOptions::default(),
        )
        .await;
    assert_eq!(r2_state.data.as_deref(), Some("post-mutation"));

    // R1在R2之后才完成；其调用方拿到自己请求的数据，但缓存不受影响
    let r1_state = r1.await.unwrap();
    assert_eq!(r1_state.data.as_deref(), Some("pre-mutation"));

    // 第三次读取必须命中R2的结果，拉取闭包不得被调用
    let refetched = Arc::new(AtomicBool::new(false));
    let flag = refetched.clone();
    let r3_state = client
        .read(
            &key,
            move || async move {
                flag.store(true, Ordering::SeqCst);
                Ok("unexpected".to_string())
            },
            ReadOptions::default(),
        )
        .await;
    assert_eq!(r3_state.data.as_deref(), Some("post-mutation"));
    assert!(!refetched.load(Ordering::SeqCst));

    assert!(ctx.metrics().snapshot().discarded_responses >= 1);
}

/// 失效前发出的在飞请求不可被失效后的读取加入：
/// 失效后的读取必须发出新的远程请求
#[tokio::test(start_paused = true)]
async fn test_read_after_invalidation_does_not_join_stale_flight() {
    let ctx = test_context();
    let client = Arc::new(ResourceClient::new(ctx.clone(), MemoryStore::new()));
    let key = ResourceKey::new("incidents").with("site").with("s1");

    let r1_client = client.clone();
    let r1_key = key.clone();
    let r1 = tokio::spawn(async move {
        r1_client
            .read(
                &r1_key,
                || async {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok("old".to_string())
                },
                ReadOptions::default(),
            )
            .await
    });
    tokio::time::sleep(Duration::from_millis(1)).await;

    ctx.cache()
        .invalidate_prefixes(&[KeyPrefix::resource("incidents")])
        .await;

    // 失效后的读取成为新的领飞者而不是加入旧在飞请求
    let issued = Arc::new(AtomicBool::new(false));
    let flag = issued.clone();
    let r2_state = client
        .read(
            &key,
            move || async move {
                flag.store(true, Ordering::SeqCst);
                Ok("new".to_string())
            },
            ReadOptions::default(),
        )
        .await;
    assert!(issued.load(Ordering::SeqCst), "post-invalidation read must refetch");
    assert_eq!(r2_state.data.as_deref(), Some("new"));

    let _ = r1.await.unwrap();
    let cached = ctx.cache().get(&key).await.unwrap();
    assert_eq!(cached.bytes, serde_json::to_vec("new").unwrap());
}
