mod common;

use common::{
    context, context_with, service_object, shadow, with_access_points, with_files, FOLDER,
    OBJECT_TYPE,
};
use harvester::service::memory::{FailureLayer, InMemoryService, Operation, ServiceCall};
use harvester::{CommitError, RuntimeOptions, ServiceError, Shadow, DUPLICATE_THRESHOLD};
use std::sync::Arc;

#[tokio::test]
async fn test_zero_matches_creates_exactly_one_object() {
    let service = Arc::new(InMemoryService::new());
    let ctx = context(&service);
    let mut shadow = shadow("ext-new");

    let object = shadow
        .commit(&ctx, None)
        .await
        .expect("Should commit")
        .expect("Should bind an object");

    assert_eq!(service.count(Operation::CreateObject), 1);
    assert_eq!(
        service.calls()[1],
        ServiceCall::CreateObject {
            object_type_id: OBJECT_TYPE,
            folder_id: FOLDER,
        }
    );
    assert_eq!(shadow.bound_object(), Some(&object));
    assert_eq!(service.objects().len(), 1);
}

#[tokio::test]
async fn test_query_requests_threshold_plus_one() {
    let service = Arc::new(InMemoryService::new());
    let ctx = context(&service);
    let shadow = shadow("ext-1");

    shadow.get(&ctx, false).await.expect("Should query");

    assert_eq!(
        service.calls(),
        vec![ServiceCall::QueryObjects {
            query: "ext-1".to_string(),
            page_size: (DUPLICATE_THRESHOLD + 1) as u32,
        }]
    );
}

#[tokio::test]
async fn test_single_match_is_reused() {
    let service = Arc::new(InMemoryService::new());
    service.insert_object(service_object("guid-a", 3, "ext-1"));
    let ctx = context(&service);
    let mut shadow = shadow("ext-1");

    let object = shadow.commit(&ctx, None).await.unwrap().unwrap();

    assert_eq!(object.id, "guid-a");
    assert_eq!(service.count(Operation::CreateObject), 0);
    assert!(shadow.duplicate_objects().is_empty());
}

#[tokio::test]
async fn test_similar_references_are_not_duplicates() {
    let service = Arc::new(InMemoryService::new());
    service.insert_object(service_object("guid-1", 1, "ext-1"));
    service.insert_object(with_access_points(
        service_object("guid-10", 2, "ext-10"),
        &["ap-web"],
    ));
    let ctx = context(&service);
    let mut first = shadow("ext-1");
    first.unpublish_everywhere = true;

    let object = first.commit(&ctx, None).await.unwrap().unwrap();

    assert_eq!(object.id, "guid-1");
    assert!(first.duplicate_objects().is_empty());
    assert_eq!(service.count(Operation::SetPublishSettings), 0);

    let other = shadow("ext-10");
    let object = other.get(&ctx, false).await.unwrap().unwrap();
    assert_eq!(object.id, "guid-10");
    assert!(other.duplicate_objects().is_empty());
}

#[tokio::test]
async fn test_duplicates_bind_earliest_created() {
    let service = Arc::new(InMemoryService::new());
    service.insert_object(service_object("guid-mid", 5, "ext-1"));
    service.insert_object(service_object("guid-early", 2, "ext-1"));
    service.insert_object(service_object("guid-late", 9, "ext-1"));
    let ctx = context(&service);
    let shadow = shadow("ext-1");

    let object = shadow.get(&ctx, true).await.unwrap().unwrap();

    assert_eq!(object.id, "guid-early");
    let duplicates: Vec<&str> = shadow
        .duplicate_objects()
        .iter()
        .map(|o| o.id.as_str())
        .collect();
    assert_eq!(duplicates, vec!["guid-mid", "guid-late"]);
}

#[tokio::test]
async fn test_too_many_duplicates_is_fatal_without_mutation() {
    let service = Arc::new(InMemoryService::new());
    for day in 1..=5 {
        service.insert_object(service_object(&format!("guid-{}", day), day, "ext-1"));
    }
    let ctx = context(&service);
    let mut shadow = shadow("ext-1");
    shadow.publish_accesspoint_ids.insert("ap-web".to_string());

    let err = shadow.commit(&ctx, None).await.unwrap_err();

    assert!(matches!(
        err,
        CommitError::TooAmbiguous {
            duplicates: 4,
            threshold: DUPLICATE_THRESHOLD,
            ..
        }
    ));
    assert!(service.mutating_calls().is_empty());
    assert!(shadow.bound_object().is_none());
}

#[tokio::test]
async fn test_resolve_is_idempotent() {
    let service = Arc::new(InMemoryService::new());
    let ctx = context(&service);
    let shadow = shadow("ext-new");

    let first = shadow.get(&ctx, true).await.unwrap().cloned();
    let second = shadow.get(&ctx, true).await.unwrap().cloned();

    assert_eq!(first, second);
    assert_eq!(service.count(Operation::QueryObjects), 1);
    assert_eq!(service.count(Operation::CreateObject), 1);
}

#[tokio::test]
async fn test_get_without_create_does_not_bind() {
    let service = Arc::new(InMemoryService::new());
    let ctx = context(&service);
    let shadow = shadow("ext-missing");

    assert!(shadow.get(&ctx, false).await.unwrap().is_none());
    assert!(shadow.get(&ctx, false).await.unwrap().is_none());

    assert_eq!(service.count(Operation::QueryObjects), 2);
    assert_eq!(service.count(Operation::CreateObject), 0);
}

#[tokio::test]
async fn test_query_transport_failure_is_fatal() {
    let service = Arc::new(InMemoryService::new());
    service.fail(Operation::QueryObjects, FailureLayer::Transport);
    let ctx = context(&service);
    let mut shadow = shadow("ext-1");

    let err = shadow.commit(&ctx, None).await.unwrap_err();

    assert!(matches!(
        err,
        CommitError::Service(ServiceError::Transport { .. })
    ));
    assert_eq!(service.calls().len(), 1);
}

#[tokio::test]
async fn test_create_application_failure_is_fatal() {
    let service = Arc::new(InMemoryService::new());
    service.fail(Operation::CreateObject, FailureLayer::Application);
    let ctx = context(&service);
    let mut shadow = shadow("ext-1");

    let err = shadow.commit(&ctx, None).await.unwrap_err();

    assert!(matches!(
        err,
        CommitError::Service(ServiceError::Application { .. })
    ));
    assert!(shadow.bound_object().is_none());
}

#[tokio::test]
async fn test_create_must_return_one_object() {
    let service = Arc::new(InMemoryService::new());
    service.set_create_result_count(2);
    let ctx = context(&service);
    let mut shadow = shadow("ext-1");

    let err = shadow.commit(&ctx, None).await.unwrap_err();

    assert!(matches!(err, CommitError::UnexpectedCreateCount { count: 2 }));
    assert!(shadow.bound_object().is_none());
}

#[tokio::test]
async fn test_related_objects_are_unsupported() {
    let service = Arc::new(InMemoryService::new());
    let ctx = context(&service);
    let mut parent = shadow("ext-parent");
    parent.related_object_shadows.push(shadow("ext-child"));
    parent.publish_accesspoint_ids.insert("ap-web".to_string());

    let err = parent.commit(&ctx, None).await.unwrap_err();

    assert!(matches!(err, CommitError::RelatedObjectsUnsupported));
    assert!(!err.is_service_error());
    // The parent was created but never published
    assert!(parent.bound_object().is_some());
    assert_eq!(service.count(Operation::SetPublishSettings), 0);
}

#[tokio::test]
async fn test_commit_with_parent_is_rejected() {
    let service = Arc::new(InMemoryService::new());
    let parent_object = service_object("guid-p", 1, "ext-p");
    let ctx = context(&service);
    let mut child = shadow("ext-child");

    let err = child.commit(&ctx, Some(&parent_object)).await.unwrap_err();

    assert!(matches!(err, CommitError::RelatedObjectsUnsupported));
    assert!(service.calls().is_empty());
}

#[tokio::test]
async fn test_no_shadow_commit_never_creates() {
    let service = Arc::new(InMemoryService::new());
    let ctx = context_with(
        &service,
        RuntimeOptions {
            no_shadow_commit: true,
            ..RuntimeOptions::default()
        },
    );
    let mut shadow = shadow("ext-new");
    shadow.publish_accesspoint_ids.insert("ap-web".to_string());

    let result = shadow.commit(&ctx, None).await.unwrap();

    assert!(result.is_none());
    assert_eq!(service.count(Operation::CreateObject), 0);
    assert!(service.mutating_calls().is_empty());
}

#[tokio::test]
async fn test_no_shadow_commit_returns_existing_without_changes() {
    let service = Arc::new(InMemoryService::new());
    service.insert_object(with_files(
        service_object("guid-a", 1, "ext-1"),
        &[(1, "orphan.mp4")],
    ));
    service.insert_object(service_object("guid-b", 2, "ext-1"));
    let ctx = context_with(
        &service,
        RuntimeOptions {
            no_shadow_commit: true,
            ..RuntimeOptions::default()
        },
    );
    let mut shadow = shadow("ext-1");
    shadow.publish_accesspoint_ids.insert("ap-web".to_string());
    shadow.unpublish_accesspoint_ids.insert("ap-old".to_string());

    let object = shadow.commit(&ctx, None).await.unwrap().unwrap();

    assert_eq!(object.id, "guid-a");
    assert!(service.mutating_calls().is_empty());
}

#[tokio::test]
async fn test_require_files_forces_skip() {
    let service = Arc::new(InMemoryService::new());
    let ctx = context_with(
        &service,
        RuntimeOptions {
            require_files_on_objects: true,
            ..RuntimeOptions::default()
        },
    );
    let mut shadow = shadow("ext-new");
    shadow.skipped = false;
    shadow.publish_accesspoint_ids.insert("ap-web".to_string());

    let result = shadow.commit(&ctx, None).await.unwrap();

    assert!(shadow.skipped);
    assert!(result.is_none());
    assert_eq!(service.count(Operation::CreateObject), 0);
    assert!(service.mutating_calls().is_empty());
}

#[tokio::test]
async fn test_require_files_keeps_shadows_with_files() {
    let service = Arc::new(InMemoryService::new());
    let ctx = context_with(
        &service,
        RuntimeOptions {
            require_files_on_objects: true,
            ..RuntimeOptions::default()
        },
    );
    let mut shadow = shadow("ext-new");
    shadow
        .file_shadows
        .push(harvester::FileShadow::new(common::file_spec("movie.mp4")));

    let result = shadow.commit(&ctx, None).await.unwrap();

    assert!(!shadow.skipped);
    assert!(result.is_some());
    assert_eq!(service.count(Operation::CreateFile), 1);
}

#[tokio::test]
async fn test_skipped_shadow_does_not_touch_children() {
    let service = Arc::new(InMemoryService::new());
    service.insert_object(with_files(
        service_object("guid-a", 1, "ext-1"),
        &[(1, "kept.mp4")],
    ));
    let ctx = context(&service);
    let mut shadow = shadow("ext-1");
    shadow.skipped = true;
    shadow.metadata_shadows.push(harvester::MetadataShadow {
        schema_id: "dc".to_string(),
        language_code: String::new(),
        document: "<dc/>".to_string(),
    });

    let object = shadow.commit(&ctx, None).await.unwrap().unwrap();

    assert_eq!(object.id, "guid-a");
    assert!(service.mutating_calls().is_empty());
    assert!(shadow.file_summary().is_none());
    assert_eq!(service.object("guid-a").unwrap().files.len(), 1);
}
