//! Integration tests for the named bookstore requests
//!
//! Every builder is executed through the in-memory engine against a small
//! fixed catalogue.

use bookstore::prelude::*;
use serde_json::json;

fn catalogue() -> Vec<Book> {
    vec![
        Book::new("Dune", "Frank Herbert", "Science Fiction", 1965, 9.99, true),
        Book::new("Beloved", "Toni Morrison", "Fiction", 1987, 10.0, true),
        Book::new("Jazz", "Toni Morrison", "Fiction", 1992, 20.0, false),
        Book::new("Sapiens", "Yuval Noah Harari", "History", 2011, 18.5, true),
        Book::new("Emma", "Jane Austen", "Romance", 1815, 7.5, true),
        Book::new("Persuasion", "Jane Austen", "Romance", 1817, 6.0, false),
        Book::new("Neuromancer", "William Gibson", "Science Fiction", 1984, 12.0, true),
    ]
}

/// Engine seeded through the insert builder, the way a caller would load data
async fn setup_engine() -> MemoryEngine {
    let engine = MemoryEngine::new("books");
    let insert = crud::insert_books(&catalogue()).expect("catalogue serializes");
    let summary = engine.insert_many(&insert).await.expect("insert succeeds");
    assert_eq!(summary.inserted_ids.len(), 7);
    engine
}

fn titles(documents: &[Document]) -> Vec<String> {
    documents
        .iter()
        .map(|d| d.get_str(fields::TITLE).unwrap().to_string())
        .collect()
}

// ========================================
// CRUD
// ========================================

#[tokio::test]
async fn test_find_by_genre_and_author() {
    let engine = setup_engine().await;

    let fiction = engine.find(&crud::find_by_genre("Fiction")).await.unwrap();
    assert_eq!(titles(&fiction), vec!["Beloved", "Jazz"]);

    let austen = engine.find(&crud::find_by_author("Jane Austen")).await.unwrap();
    assert_eq!(titles(&austen), vec!["Emma", "Persuasion"]);

    let none = engine.find(&crud::find_by_genre("Poetry")).await.unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_find_by_year_is_strictly_greater() {
    let engine = setup_engine().await;

    let after_1992 = engine
        .find(&crud::find_by_year_greater_than(1992))
        .await
        .unwrap();
    assert_eq!(titles(&after_1992), vec!["Sapiens"]);

    let after_1991 = engine
        .find(&crud::find_by_year_greater_than(1991))
        .await
        .unwrap();
    assert_eq!(titles(&after_1991), vec!["Jazz", "Sapiens"]);
}

#[tokio::test]
async fn test_update_book_price_touches_one_record() {
    let engine = setup_engine().await;

    let summary = engine
        .update_one(&crud::update_book_price("Dune", 11.5))
        .await
        .unwrap();
    assert_eq!(summary.matched_count, 1);
    assert_eq!(summary.modified_count, 1);

    let dune = engine.find(&crud::find_by_author("Frank Herbert")).await.unwrap();
    assert_eq!(dune[0].get_f64(fields::PRICE).unwrap(), 11.5);

    let missing = engine
        .update_one(&crud::update_book_price("Missing", 1.0))
        .await
        .unwrap();
    assert_eq!(missing, UpdateSummary::default());
}

#[tokio::test]
async fn test_duplicate_titles_lose_only_the_first_match() {
    let engine = setup_engine().await;
    let reprint = Book::new("Dune", "Frank Herbert", "Science Fiction", 2005, 14.0, true);
    engine
        .insert_many(&crud::insert_books(&[reprint]).unwrap())
        .await
        .unwrap();

    let deleted = engine
        .delete_one(&crud::delete_book_by_title("Dune"))
        .await
        .unwrap();
    assert_eq!(deleted.deleted_count, 1);

    let remaining = engine
        .find(&crud::find_by_author("Frank Herbert"))
        .await
        .unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].get_i32(fields::PUBLISHED_YEAR).unwrap(), 2005);

    let gone = engine
        .delete_one(&crud::delete_book_by_title("Missing"))
        .await
        .unwrap();
    assert_eq!(gone.deleted_count, 0);
}

#[tokio::test]
async fn test_inserted_records_round_trip_as_books() {
    let engine = setup_engine().await;
    let found = engine.find(&crud::find_by_author("Yuval Noah Harari")).await.unwrap();
    let book: Book = mongodb::bson::from_document(found[0].clone()).unwrap();
    assert!(book.id.is_some());
    assert_eq!(book.title, "Sapiens");
    assert!(book.in_stock);
}

// ========================================
// Queries
// ========================================

#[tokio::test]
async fn test_in_stock_after_year() {
    let engine = setup_engine().await;
    let found = engine
        .find(&queries::find_in_stock_after_year(1980))
        .await
        .unwrap();
    assert_eq!(titles(&found), vec!["Beloved", "Sapiens", "Neuromancer"]);
}

#[tokio::test]
async fn test_projected_find_returns_only_requested_fields() {
    let engine = setup_engine().await;
    let found = engine
        .find(&queries::projected_find_by_genre("Romance"))
        .await
        .unwrap();
    assert_eq!(found.len(), 2);
    for doc in &found {
        let keys: Vec<&str> = doc.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["title", "author", "price"]);
    }
}

#[tokio::test]
async fn test_sort_by_price_directions() {
    let engine = setup_engine().await;

    let ascending = engine.find(&queries::sort_by_price(true)).await.unwrap();
    let descending = engine.find(&queries::sort_by_price(false)).await.unwrap();
    let default = engine.find(&queries::sort_by_price_default()).await.unwrap();

    assert_eq!(titles(&ascending).first().map(String::as_str), Some("Persuasion"));
    assert_eq!(titles(&descending).first().map(String::as_str), Some("Jazz"));
    assert_eq!(titles(&default), titles(&ascending));

    let mut reversed = titles(&descending);
    reversed.reverse();
    assert_eq!(reversed, titles(&ascending));
}

#[tokio::test]
async fn test_pagination_pages() {
    let engine = setup_engine().await;

    let first = engine.find(&queries::paginate(1)).await.unwrap();
    let second = engine.find(&queries::paginate(2)).await.unwrap();
    let third = engine.find(&queries::paginate(3)).await.unwrap();
    assert_eq!(first.len(), 5);
    assert_eq!(second.len(), 2);
    assert!(third.is_empty());
    assert_eq!(titles(&second), vec!["Persuasion", "Neuromancer"]);

    let sized = engine.find(&queries::paginate_sized(3, 3)).await.unwrap();
    assert_eq!(titles(&sized), vec!["Neuromancer"]);
}

#[tokio::test]
async fn test_page_zero_is_rejected_by_the_engine() {
    let engine = setup_engine().await;
    let descriptor = queries::paginate(0);
    assert_eq!(descriptor.skip, Some(-5));

    let result = engine.find(&descriptor).await;
    assert!(matches!(result, Err(QueryObjectError::MalformedDescriptor(_))));
}

// ========================================
// Aggregations
// ========================================

#[tokio::test]
async fn test_average_price_for_two_fiction_books() {
    let engine = MemoryEngine::with_documents(
        "books",
        vec![
            doc! { "title": "A", "genre": "Fiction", "price": 10 },
            doc! { "title": "B", "genre": "Fiction", "price": 20 },
        ],
    );
    let rows = engine
        .aggregate(&aggregations::average_price_by_genre())
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(
        Bson::Document(rows[0].clone()).into_relaxed_extjson(),
        json!({ "_id": "Fiction", "averagePrice": 15.0 })
    );
}

#[tokio::test]
async fn test_average_price_per_genre_over_catalogue() {
    let engine = setup_engine().await;
    let rows = engine
        .aggregate(&aggregations::average_price_by_genre())
        .await
        .unwrap();
    assert_eq!(rows.len(), 4);

    let romance = rows
        .iter()
        .find(|row| row.get_str("_id").unwrap() == "Romance")
        .unwrap();
    assert_eq!(romance.get_f64("averagePrice").unwrap(), 6.75);
}

#[tokio::test]
async fn test_author_with_most_books_breaks_ties_by_name() {
    let engine = setup_engine().await;
    let rows = engine
        .aggregate(&aggregations::author_with_most_books())
        .await
        .unwrap();
    assert_eq!(rows, vec![doc! { "_id": "Jane Austen", "bookCount": 2 }]);
}

#[tokio::test]
async fn test_books_by_decade() {
    let engine = setup_engine().await;
    let rows = engine
        .aggregate(&aggregations::books_by_decade())
        .await
        .unwrap();
    assert_eq!(
        rows,
        vec![
            doc! { "_id": 1810, "count": 2 },
            doc! { "_id": 1960, "count": 1 },
            doc! { "_id": 1980, "count": 2 },
            doc! { "_id": 1990, "count": 1 },
            doc! { "_id": 2010, "count": 1 },
        ]
    );
}

#[tokio::test]
async fn test_decade_boundaries() {
    let engine = MemoryEngine::with_books(
        "books",
        &[
            Book::new("Old", "X", "Fiction", 1987, 1.0, true),
            Book::new("New", "Y", "Fiction", 2000, 1.0, true),
        ],
    )
    .unwrap();
    let rows = engine
        .aggregate(&aggregations::books_by_decade())
        .await
        .unwrap();
    let decades: Vec<i32> = rows.iter().map(|r| r.get_i32("_id").unwrap()).collect();
    assert_eq!(decades, vec![1980, 2000]);
}

#[tokio::test]
async fn test_aggregations_over_empty_collection() {
    let engine = MemoryEngine::new("books");
    assert!(engine
        .aggregate(&aggregations::average_price_by_genre())
        .await
        .unwrap()
        .is_empty());
    assert!(engine
        .aggregate(&aggregations::author_with_most_books())
        .await
        .unwrap()
        .is_empty());
}

// ========================================
// Indexing
// ========================================

#[tokio::test]
async fn test_index_creation_is_idempotent() {
    let engine = setup_engine().await;

    let first = engine.create_index(&indexing::create_title_index()).await.unwrap();
    let again = engine.create_index(&indexing::create_title_index()).await.unwrap();
    assert_eq!(first.name, "title_1");
    assert_eq!(first, again);

    let compound = engine
        .create_index(&indexing::create_author_year_index())
        .await
        .unwrap();
    assert_eq!(compound.name, "author_1_published_year_1");
    assert_eq!(
        engine.index_names().unwrap(),
        vec!["_id_", "title_1", "author_1_published_year_1"]
    );
}

#[tokio::test]
async fn test_explain_by_title_uses_title_index() {
    let engine = setup_engine().await;

    let before = engine.explain(&indexing::explain_by_title("Emma")).await.unwrap();
    let stats = before.get_document("executionStats").unwrap();
    assert_eq!(stats.get_i64("nReturned").unwrap(), 1);
    assert_eq!(stats.get_i64("totalDocsExamined").unwrap(), 7);

    engine.create_index(&indexing::create_title_index()).await.unwrap();
    let after = engine.explain(&indexing::explain_by_title("Emma")).await.unwrap();
    let stats = after.get_document("executionStats").unwrap();
    assert_eq!(stats.get_i64("nReturned").unwrap(), 1);
    assert_eq!(stats.get_i64("totalDocsExamined").unwrap(), 1);
    assert!(stats.get_bool("executionSuccess").unwrap());
}

#[tokio::test]
async fn test_explain_by_author_year_uses_compound_index() {
    let engine = setup_engine().await;
    engine
        .create_index(&indexing::create_author_year_index())
        .await
        .unwrap();

    let report = engine
        .explain(&indexing::explain_by_author_year("Jane Austen", 1815))
        .await
        .unwrap();
    let input = report
        .get_document("queryPlanner")
        .unwrap()
        .get_document("winningPlan")
        .unwrap()
        .get_document("inputStage")
        .unwrap();
    assert_eq!(input.get_str("stage").unwrap(), "IXSCAN");
    assert_eq!(input.get_str("indexName").unwrap(), "author_1_published_year_1");

    let stats = report.get_document("executionStats").unwrap();
    assert_eq!(stats.get_i64("nReturned").unwrap(), 1);

    // Year alone cannot use an index led by author
    let by_year = ExplainDescriptor::new(crud::find_by_year_greater_than(1800));
    let report = engine.explain(&by_year).await.unwrap();
    let plan = report
        .get_document("queryPlanner")
        .unwrap()
        .get_document("winningPlan")
        .unwrap();
    assert_eq!(plan.get_str("stage").unwrap(), "COLLSCAN");
}
