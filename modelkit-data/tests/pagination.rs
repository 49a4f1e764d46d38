use std::num::NonZeroU64;

use modelkit_data::prelude::*;
use modelkit_data::{StorageCode, StorageError};
use modelkit_test::{MemoryModel, Op};

fn posts(n: i64) -> MemoryModel {
    let model = MemoryModel::new("post");
    for i in 1..=n {
        model.insert(
            Data::new()
                .set("title", format!("post {i}"))
                .set("rank", i)
                .set("published", i % 2 == 0),
        );
    }
    model
}

fn request(page: u64, limit: u64) -> PaginationRequest {
    PaginationRequest::new(page, NonZeroU64::new(limit).unwrap())
}

#[tokio::test]
async fn test_middle_page() {
    let model = posts(25);
    let page = model
        .paginate(&request(2, 10).order_by(OrderBy::parse("rank").unwrap()))
        .await
        .unwrap();

    assert_eq!(page.total_count, 25);
    assert_eq!(page.total_page, 3);
    assert_eq!(page.current_page, 2);
    assert_eq!(page.current_page_count, 10);
    assert_eq!(page.result[0]["rank"], Value::Int(11));

    let args = model.last_find_many().unwrap();
    assert_eq!(args.skip, Some(10));
    assert_eq!(args.take, Some(10));
}

#[tokio::test]
async fn test_last_page_is_partial() {
    let model = posts(25);
    let page = model.paginate(&request(3, 10)).await.unwrap();
    assert_eq!(page.current_page_count, 5);
    assert_eq!(page.result.len(), 5);
    assert_eq!(page.total_page, 3);
}

#[tokio::test]
async fn test_page_past_the_end_is_empty() {
    let model = posts(5);
    let page = model.paginate(&request(4, 5)).await.unwrap();
    assert!(page.result.is_empty());
    assert_eq!(page.current_page_count, 0);
    assert_eq!(page.current_page, 4);
    assert_eq!(page.total_page, 1);
}

#[tokio::test]
async fn test_page_zero_returns_everything() {
    let model = posts(25);
    let page = model.paginate(&request(0, 10)).await.unwrap();

    assert_eq!(page.result.len(), 25);
    assert_eq!(page.current_page_count, 25);
    assert_eq!(page.current_page, 1);
    assert_eq!(page.total_page, 1);

    let args = model.last_find_many().unwrap();
    assert_eq!(args.skip, None);
    assert_eq!(args.take, None);
}

#[tokio::test]
async fn test_empty_table() {
    let model = posts(0);
    for p in [0, 1] {
        let page = model.paginate(&request(p, 10)).await.unwrap();
        assert_eq!(page.total_count, 0);
        assert_eq!(page.total_page, 0);
        assert_eq!(page.current_page, 1);
    }
}

#[tokio::test]
async fn test_filter_and_order_reach_both_calls() {
    let model = posts(10);
    let page = model
        .paginate(
            &request(1, 3)
                .filter(WhereInput::new().eq("published", true))
                .order_by(OrderBy::parse("rank:desc").unwrap()),
        )
        .await
        .unwrap();

    assert_eq!(page.total_count, 5);
    assert_eq!(page.total_page, 2);
    let ranks: Vec<_> = page.result.iter().map(|r| r["rank"].clone()).collect();
    assert_eq!(ranks, vec![Value::Int(10), Value::Int(8), Value::Int(6)]);
    assert_eq!(model.calls(), vec![Op::Count, Op::FindMany]);
}

#[tokio::test]
async fn test_count_failure_propagates_without_fetch() {
    let model = posts(3);
    model.fail_next(
        Op::Count,
        StorageError::new(StorageCode::Other("P1001".into()), "server unreachable").into(),
    );

    let err = model.paginate(&request(1, 10)).await.unwrap_err();
    assert_eq!(
        err.storage_code(),
        Some(&StorageCode::Other("P1001".into()))
    );
    assert_eq!(model.calls(), vec![Op::Count]);
}

#[tokio::test]
async fn test_query_string_to_resource_list() {
    let model = posts(12);
    let query = PaginationQuery {
        page: 2,
        limit: Some(5),
        order_by: Some("rank:asc".into()),
    };
    let page = model.paginate(&query.into_request(None).unwrap()).await.unwrap();
    let list = modelkit_data::ResourceList::from(page);

    assert_eq!(list.list.len(), 5);
    assert_eq!(list.meta.total_page, 3);
    assert_eq!(list.list[0]["rank"], Value::Int(6));
}
