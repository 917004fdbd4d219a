//! Shapes walkthrough
//!
//! Creates a `shapes` table in the SQLite file `shapes.db`, inserts a few
//! rows and prints them back.
//!
//! ```bash
//! RUST_LOG=tableio=debug cargo run --example shapes
//! ```

use tableio::{Record, Table};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Record)]
struct Shape {
    #[table(flags = "pk,auto")]
    id: i64,
    #[table(flags = "required")]
    name: String,
    width: i32,
    height: i32,
    color: String,
}

impl Shape {
    fn new(name: &str, width: i32, height: i32, color: &str) -> Self {
        Self {
            id: 0,
            name: name.to_string(),
            width,
            height,
            color: color.to_string(),
        }
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tableio=info")))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let mut shapes = Table::<Shape>::open("sqlite3", "shapes.db").await?;
    shapes.create_table_if_not_exists().await?;

    // Single insert
    shapes.insert(&Shape::new("banner", 110, 210, "yellow")).await?;

    // Multi insert
    shapes
        .insert_many(&[
            Shape::new("card", 110, 210, "yellow"),
            Shape::new("poster", 120, 220, "red"),
            Shape::new("tile", 130, 230, "blue"),
        ])
        .await?;

    for (i, shape) in shapes.all().await?.iter().enumerate() {
        println!(
            "{}. {} Color:{}, Height:{}, Width:{}",
            i, shape.name, shape.color, shape.height, shape.width
        );
    }

    shapes.close().await?;
    Ok(())
}
