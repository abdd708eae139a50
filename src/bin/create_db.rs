use player_service::persistence::{PLAYERS_TABLE_SQL, create_player_db_pool};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let players_db_path = std::env::var("PLAYER_DB").expect("PLAYER_DB env var not set");
    let path = std::path::Path::new(&players_db_path);
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).expect("Failed to create parent directory for players DB");
        println!(
            "Created parent directory for players DB at {}",
            parent.display()
        );
    }

    if path.exists() {
        std::fs::remove_file(path).expect("Failed to remove existing players DB");
        println!("Removed existing players DB at {}", players_db_path);
    }

    let pool = create_player_db_pool().await;
    sqlx::query(PLAYERS_TABLE_SQL)
        .execute(&pool)
        .await
        .expect("Failed to create players table");

    println!("Created new players DB at {}", players_db_path);
}
