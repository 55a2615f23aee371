//! Repository behaviour against the in-memory backend.

use chrono::{Duration, TimeZone, Utc};

use chronocap_db::{
    AccountType, CapsuleFilter, CapsuleQuery, CapsuleRepository, CreateCapsuleRequest,
    LocationInput, MemoryCapsuleRepository, MemoryNewsRepository, MemoryUserRepository,
    NewNews, NewUser, NewsFilter, NewsQuery, NewsRepository, NewsType, UpdateCapsuleRequest,
    UserRepository,
};

fn create_request(lat: f64, lon: f64, city: &str) -> CreateCapsuleRequest {
    CreateCapsuleRequest {
        user_id: Some("user-1".to_string()),
        location: Some(LocationInput {
            lat: Some(lat),
            lon: Some(lon),
            country: Some("Somewhere".to_string()),
            city: Some(city.to_string()),
        }),
        time_to_open: Some(Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()),
        message: Some("open me".to_string()),
        media: Some(vec!["https://cdn.example/a.png".to_string()]),
        files: Some(vec!["https://cdn.example/b.pdf".to_string()]),
    }
}

#[tokio::test]
async fn test_create_then_fetch_round_trip() {
    let repo = MemoryCapsuleRepository::new();
    let input = create_request(50.45, 30.52, "Kyiv").validate().unwrap();
    let created = repo.insert(input.clone()).await.unwrap();

    let fetched = repo.fetch(created.id).await.unwrap().expect("capsule exists");
    assert_eq!(fetched.user_id, input.user_id);
    assert_eq!(fetched.location, input.location);
    assert_eq!(fetched.time_to_open, input.time_to_open);
    assert_eq!(fetched.message, input.message);
    assert_eq!(fetched.media, input.media);
    assert_eq!(fetched.files, input.files);
}

#[tokio::test]
async fn test_update_message_only_is_a_merge() {
    let repo = MemoryCapsuleRepository::new();
    let created = repo
        .insert(create_request(50.45, 30.52, "Kyiv").validate().unwrap())
        .await
        .unwrap();

    let patch = UpdateCapsuleRequest {
        message: Some("changed".to_string()),
        ..Default::default()
    }
    .validate()
    .unwrap();
    let updated = repo.update(created.id, patch).await.unwrap().expect("updated");

    assert_eq!(updated.message, "changed");
    assert_eq!(updated.location, created.location);
    assert_eq!(updated.media, created.media);
    assert_eq!(updated.files, created.files);
    assert!(updated.updated_at >= created.updated_at);
}

#[tokio::test]
async fn test_update_unknown_id_returns_none() {
    let repo = MemoryCapsuleRepository::new();
    let patch = UpdateCapsuleRequest::default().validate().unwrap();
    assert!(repo.update(uuid::Uuid::now_v7(), patch).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_then_fetch_is_gone() {
    let repo = MemoryCapsuleRepository::new();
    let created = repo
        .insert(create_request(0.0, 0.0, "Null Island").validate().unwrap())
        .await
        .unwrap();

    let removed = repo.delete(created.id).await.unwrap().expect("removed");
    assert_eq!(removed.id, created.id);
    assert!(repo.fetch(created.id).await.unwrap().is_none());
    assert!(repo.delete(created.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_geo_query_keeps_only_nearby_capsules() {
    let repo = MemoryCapsuleRepository::new();
    let kyiv = repo
        .insert(create_request(50.45, 30.52, "Kyiv").validate().unwrap())
        .await
        .unwrap();
    repo.insert(create_request(51.50, -0.12, "London").validate().unwrap())
        .await
        .unwrap();

    let query = CapsuleQuery {
        filter: CapsuleFilter {
            lat: Some(50.45),
            lon: Some(30.52),
            distance: Some(10.0),
            ..Default::default()
        },
        ..Default::default()
    };
    let plan = query.plan();
    let total = repo.count(&plan.count_pipeline()).await.unwrap();
    let page = repo.aggregate(&plan.page_pipeline()).await.unwrap();

    assert_eq!(total, 1);
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].capsule.id, kyiv.id);
    assert_eq!(page[0].distance, Some(0.0));
}

#[tokio::test]
async fn test_count_pipeline_rejected_by_aggregate() {
    let repo = MemoryCapsuleRepository::new();
    let plan = CapsuleQuery::default().plan();
    assert!(repo.aggregate(&plan.count_pipeline()).await.is_err());
    assert!(repo.count(&plan.page_pipeline()).await.is_err());
}

#[tokio::test]
async fn test_news_filters_and_pages() {
    let repo = MemoryNewsRepository::new();
    for i in 0..12 {
        repo.insert(NewNews {
            user_id: format!("user-{}", i % 3),
            news_type: if i % 2 == 0 { NewsType::Updates } else { NewsType::News },
            type_account: AccountType::FreeUser,
            topic: format!("Release {}", i),
            text: "notes".to_string(),
            files: vec![],
        })
        .await
        .unwrap();
    }

    let query = NewsQuery {
        filter: NewsFilter {
            news_type: Some(NewsType::Updates),
            ..Default::default()
        },
        page: 2,
        per_page: 4,
        ..Default::default()
    };
    assert_eq!(repo.count(&query).await.unwrap(), 6);
    let page = repo.find(&query).await.unwrap();
    assert_eq!(page.len(), 2);
    assert!(page.iter().all(|n| n.news_type == NewsType::Updates));
}

#[tokio::test]
async fn test_awards_have_set_semantics() {
    let repo = MemoryUserRepository::new();
    let user = repo
        .insert(NewUser {
            cognito_sub: "sub-1".to_string(),
            nickname: "ada@example.com".to_string(),
            name: None,
            avatar: None,
        })
        .await
        .unwrap();
    assert_eq!(user.name, "Noname");

    repo.add_award(user.id, "first-capsule").await.unwrap();
    let user = repo
        .add_award(user.id, "first-capsule")
        .await
        .unwrap()
        .expect("user exists");
    assert_eq!(user.awards, vec!["first-capsule".to_string()]);

    assert!(repo
        .add_award(uuid::Uuid::now_v7(), "x")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_duplicate_user_conflicts() {
    let repo = MemoryUserRepository::new();
    let new_user = NewUser {
        cognito_sub: "sub-1".to_string(),
        nickname: "ada@example.com".to_string(),
        name: Some("Ada".to_string()),
        avatar: None,
    };
    repo.insert(new_user.clone()).await.unwrap();
    let err = repo.insert(new_user).await.unwrap_err();
    assert!(matches!(err, chronocap_db::Error::Conflict(_)));
}

#[tokio::test]
async fn test_inclusive_date_bounds_through_repository() {
    let repo = MemoryCapsuleRepository::new();
    let created = repo
        .insert(create_request(10.0, 10.0, "Edge").validate().unwrap())
        .await
        .unwrap();
    let exact = created.time_to_open;

    let query = |after, before| CapsuleQuery {
        filter: CapsuleFilter {
            available_after: after,
            available_before: before,
            ..Default::default()
        },
        ..Default::default()
    };

    for q in [
        query(Some(exact), None),
        query(None, Some(exact)),
        query(Some(exact), Some(exact)),
    ] {
        assert_eq!(repo.count(&q.plan().count_pipeline()).await.unwrap(), 1);
    }
    let q = query(Some(exact + Duration::seconds(1)), None);
    assert_eq!(repo.count(&q.plan().count_pipeline()).await.unwrap(), 0);
}
