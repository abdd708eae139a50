use sqlx::{
    Pool, Sqlite,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

pub mod players;

pub const PLAYERS_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS players (uuid TEXT PRIMARY KEY, username VARCHAR(16) NOT NULL, nickname VARCHAR(32), ip_address VARCHAR(45), first_login TEXT NOT NULL, last_login TEXT NOT NULL);";

pub async fn create_player_db_pool() -> Pool<Sqlite> {
    let db_path = std::env::var("PLAYER_DB").expect("PLAYER_DB env var not set");
    let connect_options = SqliteConnectOptions::new()
        .filename(&db_path)
        .create_if_missing(true);
    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(connect_options)
        .await
        .expect("Failed to create DB pool")
}
