use sqlx::{Pool, Row, Sqlite, sqlite::SqliteRow};
use uuid::Uuid;

use crate::{
    ServiceError, ServiceResult,
    persistence::create_player_db_pool,
    player::{Player, PlayerId, PlayerRepository},
};

pub struct SqlitePlayerRepository {
    pool: Pool<Sqlite>,
}

impl SqlitePlayerRepository {
    pub async fn new() -> Self {
        let pool = create_player_db_pool().await;
        Self { pool }
    }

    pub fn with_pool(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    fn player_from_row(row: &SqliteRow) -> sqlx::Result<Player> {
        let id: String = row.try_get("uuid")?;
        let id = Uuid::parse_str(&id).map_err(|e| sqlx::Error::ColumnDecode {
            index: "uuid".into(),
            source: Box::new(e),
        })?;
        Ok(Player {
            id,
            username: row.try_get("username")?,
            nickname: row.try_get("nickname")?,
            ip_address: row.try_get("ip_address")?,
            first_login: row.try_get("first_login")?,
            last_login: row.try_get("last_login")?,
        })
    }
}

fn map_db_error(e: sqlx::Error) -> ServiceError {
    match e {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed => ServiceError::Connection(e.to_string()),
        _ => ServiceError::Persistence(e.to_string()),
    }
}

#[async_trait::async_trait]
impl PlayerRepository for SqlitePlayerRepository {
    async fn get_player_by_id(&self, id: PlayerId) -> ServiceResult<Option<Player>> {
        let row = sqlx::query("SELECT * FROM players WHERE uuid = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;
        match row {
            Some(row) => Self::player_from_row(&row).map(Some).map_err(map_db_error),
            None => Ok(None),
        }
    }

    async fn get_player_by_name(&self, name: &str) -> ServiceResult<Option<Player>> {
        // NOCASE only folds ASCII, matching the cache-side comparison.
        let row = sqlx::query(
            "SELECT * FROM players WHERE username = ? COLLATE NOCASE ORDER BY uuid LIMIT 1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;
        match row {
            Some(row) => Self::player_from_row(&row).map(Some).map_err(map_db_error),
            None => Ok(None),
        }
    }

    async fn create_player(&self, player: &Player) -> ServiceResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;
        sqlx::query(
            "INSERT INTO players (uuid, username, nickname, ip_address, first_login, last_login) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(player.id.to_string())
        .bind(&player.username)
        .bind(player.nickname.as_deref())
        .bind(player.ip_address.as_deref())
        .bind(player.first_login)
        .bind(player.last_login)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;
        tx.commit().await.map_err(map_db_error)?;
        Ok(())
    }

    async fn update_player(&self, player: &Player) -> ServiceResult<Player> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;
        sqlx::query(
            "INSERT INTO players (uuid, username, nickname, ip_address, first_login, last_login) VALUES (?, ?, ?, ?, ?, ?) \
             ON CONFLICT(uuid) DO UPDATE SET username = excluded.username, nickname = excluded.nickname, \
             ip_address = excluded.ip_address, first_login = excluded.first_login, last_login = excluded.last_login",
        )
        .bind(player.id.to_string())
        .bind(&player.username)
        .bind(player.nickname.as_deref())
        .bind(player.ip_address.as_deref())
        .bind(player.first_login)
        .bind(player.last_login)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;
        tx.commit().await.map_err(map_db_error)?;
        Ok(player.clone())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;
    use crate::persistence::PLAYERS_TABLE_SQL;

    async fn test_repository() -> SqlitePlayerRepository {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory pool");
        sqlx::query(PLAYERS_TABLE_SQL)
            .execute(&pool)
            .await
            .expect("Failed to create players table");
        SqlitePlayerRepository::with_pool(pool)
    }

    fn test_player(id: PlayerId, username: &str) -> Player {
        let now = Utc::now();
        Player {
            id,
            username: username.to_string(),
            nickname: Some("nick".to_string()),
            ip_address: Some("127.0.0.1".to_string()),
            first_login: now,
            last_login: now,
        }
    }

    #[tokio::test]
    async fn test_create_and_fetch() {
        let repo = test_repository().await;
        let player = test_player(Uuid::new_v4(), "Alice");
        repo.create_player(&player)
            .await
            .expect("Failed to create player");

        let fetched = repo
            .get_player_by_id(player.id)
            .await
            .unwrap()
            .expect("Player not found");
        assert_eq!(fetched.id, player.id);
        assert_eq!(fetched.username, "Alice");
        assert_eq!(fetched.nickname.as_deref(), Some("nick"));
        assert_eq!(fetched.ip_address.as_deref(), Some("127.0.0.1"));

        assert_eq!(repo.get_player_by_id(Uuid::new_v4()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_name_lookup_ignores_case() {
        let repo = test_repository().await;
        let player = test_player(Uuid::new_v4(), "Alice");
        repo.create_player(&player).await.unwrap();

        for name in ["Alice", "alice", "ALICE"] {
            let fetched = repo.get_player_by_name(name).await.unwrap();
            assert_eq!(fetched.map(|p| p.id), Some(player.id));
        }
        assert_eq!(repo.get_player_by_name("Bob").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_update_merges_by_id() {
        let repo = test_repository().await;
        let mut player = test_player(Uuid::new_v4(), "Bob");
        repo.create_player(&player).await.unwrap();

        player.username = "Robert".to_string();
        player.nickname = None;
        repo.update_player(&player).await.unwrap();

        let fetched = repo.get_player_by_id(player.id).await.unwrap().unwrap();
        assert_eq!(fetched.username, "Robert");
        assert_eq!(fetched.nickname, None);
        assert_eq!(repo.get_player_by_name("Bob").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_update_inserts_missing_row() {
        let repo = test_repository().await;
        let player = test_player(Uuid::new_v4(), "Carol");
        repo.update_player(&player).await.unwrap();

        let fetched = repo.get_player_by_id(player.id).await.unwrap();
        assert_eq!(fetched.map(|p| p.username), Some("Carol".to_string()));
    }

    #[tokio::test]
    async fn test_duplicate_create_fails() {
        let repo = test_repository().await;
        let player = test_player(Uuid::new_v4(), "Dave");
        repo.create_player(&player).await.unwrap();
        assert!(matches!(
            repo.create_player(&player).await,
            Err(ServiceError::Persistence(..))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_usernames_ordered_by_uuid() {
        let repo = test_repository().await;
        let low = test_player(Uuid::from_u128(1), "Twin");
        let high = test_player(Uuid::from_u128(2), "Twin");
        repo.create_player(&high).await.unwrap();
        repo.create_player(&low).await.unwrap();

        let fetched = repo.get_player_by_name("twin").await.unwrap();
        assert_eq!(fetched.map(|p| p.id), Some(low.id));
    }
}
