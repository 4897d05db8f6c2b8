//! # Bookstore Demo
//!
//! Runs every named bookstore request in order:
//! - inserting a small catalogue
//! - the read queries, paging and sorting
//! - the aggregations
//! - index creation and explain reports
//! - the single-record update and delete
//!
//! With a `bookstore.toml` (or `BOOKSTORE_CONFIG`) present the requests go to
//! MongoDB. Without one they run against the in-memory engine.

use bookstore::prelude::*;

fn catalogue() -> Vec<Book> {
    vec![
        Book::new("Dune", "Frank Herbert", "Science Fiction", 1965, 9.99, true),
        Book::new("Beloved", "Toni Morrison", "Fiction", 1987, 10.0, true),
        Book::new("Jazz", "Toni Morrison", "Fiction", 1992, 20.0, false),
        Book::new("Sapiens", "Yuval Noah Harari", "History", 2011, 18.5, true),
        Book::new("Emma", "Jane Austen", "Romance", 1815, 7.5, true),
        Book::new("Neuromancer", "William Gibson", "Science Fiction", 1984, 12.0, true),
    ]
}

fn print_rows(label: &str, rows: &[Document]) {
    println!("\n{} ({} results)", label, rows.len());
    for row in rows {
        println!("   {}", row);
    }
}

async fn run<E: QueryEngine>(engine: &E) -> anyhow::Result<()> {
    println!("📚 Collection: {}", engine.collection_name());

    // 1. Load data
    let inserted = engine.insert_many(&crud::insert_books(&catalogue())?).await?;
    println!("\n✅ Inserted {} books", inserted.inserted_ids.len());

    // 2. Read queries
    print_rows("🔍 Fiction", &engine.find(&crud::find_by_genre("Fiction")).await?);
    print_rows(
        "🔍 Published after 1990",
        &engine.find(&crud::find_by_year_greater_than(1990)).await?,
    );
    print_rows(
        "🔍 By Toni Morrison",
        &engine.find(&crud::find_by_author("Toni Morrison")).await?,
    );
    print_rows(
        "🔍 In stock after 1980",
        &engine.find(&queries::find_in_stock_after_year(1980)).await?,
    );
    print_rows(
        "🔍 Science Fiction (title, author, price)",
        &engine.find(&queries::projected_find_by_genre("Science Fiction")).await?,
    );
    print_rows("💰 Cheapest first", &engine.find(&queries::sort_by_price_default()).await?);
    print_rows("💰 Dearest first", &engine.find(&queries::sort_by_price(false)).await?);
    print_rows("📄 Page 1", &engine.find(&queries::paginate(1)).await?);
    print_rows("📄 Page 2", &engine.find(&queries::paginate(2)).await?);

    // 3. Aggregations
    print_rows(
        "📊 Average price by genre",
        &engine.aggregate(&aggregations::average_price_by_genre()).await?,
    );
    print_rows(
        "📊 Most prolific author",
        &engine.aggregate(&aggregations::author_with_most_books()).await?,
    );
    print_rows(
        "📊 Books by decade",
        &engine.aggregate(&aggregations::books_by_decade()).await?,
    );

    // 4. Indexes
    let title_index = engine.create_index(&indexing::create_title_index()).await?;
    let compound_index = engine.create_index(&indexing::create_author_year_index()).await?;
    println!("\n🗂️  Indexes: {}, {}", title_index.name, compound_index.name);

    let report = engine.explain(&indexing::explain_by_title("Dune")).await?;
    println!("\n🧭 Explain by title:\n   {}", report);
    let report = engine
        .explain(&indexing::explain_by_author_year("Toni Morrison", 1987))
        .await?;
    println!("\n🧭 Explain by author and year:\n   {}", report);

    // 5. Single-record mutations
    let updated = engine.update_one(&crud::update_book_price("Dune", 11.5)).await?;
    println!(
        "\n✏️  Price update matched {}, modified {}",
        updated.matched_count, updated.modified_count
    );
    let deleted = engine.delete_one(&crud::delete_book_by_title("Jazz")).await?;
    println!("🗑️  Deleted {} book(s)", deleted.deleted_count);

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .init();

    println!("🚀 Bookstore Demo");
    println!("=================");

    match AppConfig::load() {
        Ok(config) => {
            println!("Using MongoDB at {}:{}", config.database.host, config.database.port);
            let bookstore = Bookstore::connect(&config.database).await?;
            bookstore.health_check().await?;
            run(&bookstore.books()).await?;
        }
        Err(err) => {
            println!("No database config ({}), using the in-memory engine", err);
            run(&MemoryEngine::new("books")).await?;
        }
    }

    println!("\n🎉 Demo complete");
    Ok(())
}
