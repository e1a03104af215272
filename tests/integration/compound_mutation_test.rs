//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 复合变更集成测试：第二步失败时补偿回滚第一步，
//! 补偿自身失败时同时报告两个原因。

#[path = "../common/mod.rs"]
mod common;

use common::{test_context, MemoryStore};
use oxsync::error::{RemoteError, RemoteErrorCode};
use oxsync::remote::{ObjectStore, RemoteStore};
use oxsync::{
    with_compensation, KeyPrefix, MutationDescriptor, ResourceClient, SyncError, WriteOp,
};
use std::sync::Arc;

/// 两步都成功：补偿不执行，两个资源都被写入
#[tokio::test]
async fn test_two_step_mutation_success() {
    let ctx = test_context();
    let store = MemoryStore::new();
    let client = ResourceClient::new(ctx.clone(), store.clone());

    let descriptor = MutationDescriptor::new("Create project")
        .on_success("Project created successfully")
        .invalidates(KeyPrefix::resource("projects"))
        .invalidates(KeyPrefix::resource("project_members"));

    let s1 = store.clone();
    let s2 = store.clone();
    let result = client
        .mutate(
            (),
            move |_| async move {
                with_compensation(
                    || async move {
                        s1.write(
                            "projects",
                            WriteOp::Insert,
                            serde_json::json!({"id": "p1", "name": "Renovation", "owner_id": "u1"}),
                        )
                        .await?;
                        Ok("p1".to_string())
                    },
                    |project_id| async move {
                        s2.write(
                            "project_members",
                            WriteOp::Insert,
                            serde_json::json!({"id": "pm1", "project_id": project_id, "user_id": "u1"}),
                        )
                        .await?;
                        Ok(())
                    },
                    |_project_id| async move {
                        panic!("compensation must not run on success");
                    },
                )
                .await
            },
            &descriptor,
        )
        .await;

    assert!(result.is_ok());
    assert_eq!(store.rows("projects").len(), 1);
    assert_eq!(store.rows("project_members").len(), 1);
}

/// 第一步成功、第二步失败：补偿撤销第一步，错误是第二步的错误
#[tokio::test]
async fn test_rollback_on_second_step_failure() {
    let ctx = test_context();
    let store = MemoryStore::new();
    let client = ResourceClient::new(ctx.clone(), store.clone());

    let descriptor = MutationDescriptor::new("Create project")
        .on_failure("Failed to create project")
        .invalidates(KeyPrefix::resource("projects"));

    let s1 = store.clone();
    let s2 = store.clone();
    let result: oxsync::Result<(String, ())> = client
        .mutate(
            (),
            move |_| async move {
                with_compensation(
                    || async move {
                        s1.write(
                            "projects",
                            WriteOp::Insert,
                            serde_json::json!({"id": "p1", "name": "Renovation", "owner_id": "u1"}),
                        )
                        .await?;
                        Ok("p1".to_string())
                    },
                    |_project_id| async move {
                        Err(SyncError::Remote(RemoteError::new(
                            RemoteErrorCode::Server,
                            "insert member failed",
                        )))
                    },
                    move |project_id| async move {
                        s2.write(
                            "projects",
                            WriteOp::Delete,
                            serde_json::json!({"id": project_id}),
                        )
                        .await?;
                        Ok(())
                    },
                )
                .await
            },
            &descriptor,
        )
        .await;

    // 返回的是第二步的错误
    match result {
        Err(SyncError::Remote(e)) => assert_eq!(e.message, "insert member failed"),
        other => panic!("expected the secondary error, got {:?}", other.err()),
    }
    // 补偿已撤销第一步的写入
    assert!(store.rows("projects").is_empty());
    // 失败通知已发出
    assert_eq!(ctx.notifications().snapshot().len(), 1);
}

/// 补偿自身也失败：错误同时携带两个原因
#[tokio::test]
async fn test_compensation_failure_reports_both_causes() {
    let result: oxsync::Result<(String, ())> = with_compensation(
        || async { Ok("p1".to_string()) },
        |_id| async {
            Err(SyncError::Remote(RemoteError::new(
                RemoteErrorCode::Server,
                "insert member failed",
            )))
        },
        |_id| async {
            Err(SyncError::Remote(RemoteError::new(
                RemoteErrorCode::Network,
                "rollback delete failed",
            )))
        },
    )
    .await;

    match result {
        Err(SyncError::Compensation {
            primary,
            compensation,
        }) => {
            assert!(primary.to_string().contains("insert member failed"));
            assert!(compensation.to_string().contains("rollback delete failed"));
        }
        other => panic!("expected a compensation error, got {:?}", other.err()),
    }
}

mockall::mock! {
    pub Storage {}

    #[async_trait::async_trait]
    impl ObjectStore for Storage {
        async fn upload(
            &self,
            path: &str,
            bytes: Vec<u8>,
            content_type: &str,
        ) -> std::result::Result<String, RemoteError>;
        fn public_url(&self, path: &str) -> String;
        async fn remove(&self, paths: &[String]) -> std::result::Result<(), RemoteError>;
    }
}

/// 附件类复合变更：上传成功、记录写入失败时删除已上传对象
#[tokio::test]
async fn test_attachment_upload_is_rolled_back() {
    let store = MemoryStore::new();
    store.fail_next_write(RemoteError::new(RemoteErrorCode::Permission, "write denied"));

    let mut objects = MockStorage::new();
    objects
        .expect_upload()
        .times(1)
        .returning(|path, _, _| Ok(path.to_string()));
    objects
        .expect_remove()
        .times(1)
        .withf(|paths| paths.len() == 1 && paths[0] == "plans/site.pdf")
        .returning(|_| Ok(()));
    let objects = Arc::new(objects);

    let up = objects.clone();
    let down = objects.clone();
    let db = store.clone();
    let result: oxsync::Result<(String, ())> = with_compensation(
        move || async move {
            Ok(up
                .upload("plans/site.pdf", b"pdf".to_vec(), "application/pdf")
                .await?)
        },
        move |path| async move {
            db.write(
                "attachments",
                WriteOp::Insert,
                serde_json::json!({"id": "a1", "path": path}),
            )
            .await?;
            Ok(())
        },
        move |path| async move {
            down.remove(&[path]).await?;
            Ok(())
        },
    )
    .await;

    match result {
        Err(SyncError::Remote(e)) => assert_eq!(e.code, RemoteErrorCode::Permission),
        other => panic!("expected the write error, got {:?}", other.err()),
    }
    assert!(store.rows("attachments").is_empty());
}
