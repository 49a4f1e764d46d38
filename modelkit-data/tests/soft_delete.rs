use modelkit_data::prelude::*;
use modelkit_data::{translate, StorageCode};
use modelkit_test::{MemoryModel, Op};

fn seeded() -> MemoryModel {
    let model = MemoryModel::new("post");
    for slug in ["a", "b", "c"] {
        model.insert(Data::new().set("slug", slug).set("deleted", 0));
    }
    model
}

#[tokio::test]
async fn test_number_type_writes_one() {
    let model = seeded();
    let spec = SoftDeleteSpec::new("deleted", SoftDeleteColumnType::Number);
    let row = model
        .soft_delete(WhereInput::new().eq("slug", "a"), &spec)
        .await
        .unwrap();

    assert_eq!(row["deleted"], Value::Int(1));
    assert_eq!(model.len(), 3);
    assert_eq!(model.calls(), vec![Op::Update]);
}

#[tokio::test]
async fn test_explicit_value_wins_over_type() {
    let model = seeded();
    let spec = SoftDeleteSpec::new("deleted", SoftDeleteColumnType::Number).value(5);
    let row = model
        .soft_delete(WhereInput::new().eq("slug", "b"), &spec)
        .await
        .unwrap();
    assert_eq!(row["deleted"], Value::Int(5));
}

#[tokio::test]
async fn test_date_type_writes_timestamp() {
    let model = MemoryModel::new("post");
    model.insert(Data::new().set("slug", "a").set("deletedAt", Value::Null));
    let before = chrono::Utc::now();

    let row = model
        .soft_delete(WhereInput::new().eq("slug", "a"), &SoftDeleteSpec::default())
        .await
        .unwrap();

    match &row["deletedAt"] {
        Value::DateTime(at) => assert!(*at >= before),
        other => panic!("expected a timestamp, got {other:?}"),
    }
}

#[tokio::test]
async fn test_boolean_type_writes_false_and_live_filter_skips_row() {
    let model = MemoryModel::new("user");
    model.insert(Data::new().set("email", "a@x").set("active", true));
    model.insert(Data::new().set("email", "b@x").set("active", true));
    let spec = SoftDeleteSpec::new("active", SoftDeleteColumnType::Boolean);

    model
        .soft_delete(WhereInput::new().eq("email", "a@x"), &spec)
        .await
        .unwrap();

    assert_eq!(model.count(Some(&spec.live_filter())).await.unwrap(), 1);
}

#[tokio::test]
async fn test_live_filter_with_explicit_value_keeps_other_rows() {
    let model = MemoryModel::new("order");
    model.insert(Data::new().set("ref", "a").set("status", 0));
    model.insert(Data::new().set("ref", "b").set("status", 0));
    model.insert(Data::new().set("ref", "c").set("status", Value::Null));
    let spec = SoftDeleteSpec::new("status", SoftDeleteColumnType::Number).value(9);

    model
        .soft_delete(WhereInput::new().eq("ref", "a"), &spec)
        .await
        .unwrap();

    assert_eq!(model.count(Some(&spec.live_filter())).await.unwrap(), 2);
}

#[tokio::test]
async fn test_many_marks_every_match() {
    let model = seeded();
    let spec = SoftDeleteSpec::new("deleted", SoftDeleteColumnType::Number);
    let filter = WhereInput::new().field("slug", FieldFilter::one_of(["a", "c"]));

    let changed = model.soft_delete_many(filter, &spec).await.unwrap();

    assert_eq!(changed, 2);
    let marked = model.count(Some(&WhereInput::new().eq("deleted", 1))).await.unwrap();
    assert_eq!(marked, 2);
    assert_eq!(model.len(), 3);
}

#[tokio::test]
async fn test_missing_row_translates_to_not_found() {
    let model = seeded();
    let err = model
        .soft_delete(WhereInput::new().eq("slug", "zzz"), &SoftDeleteSpec::default())
        .await
        .unwrap_err();
    assert_eq!(err.storage_code(), Some(&StorageCode::RecordNotFound));

    let domain = translate(err, model.model_name()).unwrap();
    assert_eq!(domain.kind(), ErrorKind::NotFound);
    assert_eq!(domain.message(), "no such post");
}

#[tokio::test]
async fn test_unknown_type_fails_before_any_write() {
    let model = seeded();
    let err = SoftDeleteSpec::from_parts("deleted", "epoch").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert!(model.calls().is_empty());
}
