use modelkit_data::prelude::*;
use modelkit_data::{translate, StorageCode, StorageError};
use modelkit_test::{MemoryModel, Op};

fn tags() -> MemoryModel {
    MemoryModel::new("tag").unique(&["slug"])
}

fn rust_tag() -> FindUniqueOrCreateArgs {
    FindUniqueOrCreateArgs::new(
        WhereInput::new().eq("slug", "rust"),
        Data::new().set("slug", "rust").set("label", "Rust"),
    )
}

#[tokio::test]
async fn test_unique_creates_then_finds() {
    let model = tags();

    let first = model.find_unique_or_create(&rust_tag()).await.unwrap();
    assert!(first.was_created);
    assert_eq!(first.value["label"], Value::from("Rust"));

    let second = model.find_unique_or_create(&rust_tag()).await.unwrap();
    assert!(!second.was_created);
    assert_eq!(second.value["id"], first.value["id"]);
    assert_eq!(model.len(), 1);
    assert_eq!(
        model.calls(),
        vec![Op::FindUnique, Op::Create, Op::FindUnique]
    );
}

#[tokio::test]
async fn test_first_uses_ordering() {
    let model = MemoryModel::new("post");
    model.insert(Data::new().set("author", 1).set("rank", 2));
    model.insert(Data::new().set("author", 1).set("rank", 9));

    let mut args = FindFirstOrCreateArgs::new(
        WhereInput::new().eq("author", 1),
        Data::new().set("author", 1).set("rank", 0),
    );
    args.find.order_by = OrderBy::parse("rank:desc").unwrap();

    let found = model.find_first_or_create(&args).await.unwrap();
    assert!(!found.was_created);
    assert_eq!(found.value["rank"], Value::Int(9));

    let created = model
        .find_first_or_create(&FindFirstOrCreateArgs::new(
            WhereInput::new().eq("author", 2),
            Data::new().set("author", 2),
        ))
        .await
        .unwrap();
    assert!(created.was_created);
    assert_eq!(model.len(), 3);
}

#[tokio::test]
async fn test_concurrent_race_has_one_winner() {
    let model = tags();
    let args = rust_tag();

    let (a, b) = tokio::join!(
        model.find_unique_or_create(&args),
        model.find_unique_or_create(&args)
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert!(a.was_created ^ b.was_created);
    assert_eq!(a.value["id"], b.value["id"]);
    assert_eq!(model.len(), 1);
}

#[tokio::test]
async fn test_concurrent_race_first_variant_has_one_winner() {
    let model = tags();
    let args = FindFirstOrCreateArgs::new(
        WhereInput::new().eq("slug", "go"),
        Data::new().set("slug", "go"),
    );

    let (a, b) = tokio::join!(
        model.find_first_or_create(&args),
        model.find_first_or_create(&args)
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert!(a.was_created ^ b.was_created);
    assert_eq!(model.len(), 1);
}

#[tokio::test]
async fn test_conflict_without_row_surfaces_after_one_retry() {
    let model = tags();
    model.fail_next(
        Op::Create,
        StorageError::unique_violation(vec!["slug".into()], "duplicate key").into(),
    );

    let err = model.find_unique_or_create(&rust_tag()).await.unwrap_err();
    assert!(err.is_unique_violation());
    assert_eq!(
        model.calls(),
        vec![Op::FindUnique, Op::Create, Op::FindUnique]
    );

    let domain = translate(err, "tag").unwrap();
    assert_eq!(domain.kind(), ErrorKind::Conflict);
    assert_eq!(domain.message(), "tag data conflict on slug");
}

#[tokio::test]
async fn test_other_create_failures_are_not_retried() {
    let model = tags();
    model.fail_next(
        Op::Create,
        StorageError::new(StorageCode::NotNullViolation, "label is required").into(),
    );

    let err = model.find_unique_or_create(&rust_tag()).await.unwrap_err();
    assert_eq!(err.storage_code(), Some(&StorageCode::NotNullViolation));
    assert_eq!(model.calls(), vec![Op::FindUnique, Op::Create]);
}

#[tokio::test]
async fn test_exists() {
    let model = tags();
    let rust = WhereInput::new().eq("slug", "rust");
    assert!(!model.exists(Some(&rust)).await.unwrap());
    model.find_unique_or_create(&rust_tag()).await.unwrap();
    assert!(model.exists(Some(&rust)).await.unwrap());
    assert!(model.exists(None).await.unwrap());
}
