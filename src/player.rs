use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use log::{debug, info};
use uuid::Uuid;

use crate::{ServiceError, ServiceResult};

pub type PlayerId = Uuid;
pub type PlayerUsername = String;

#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub username: PlayerUsername,
    pub nickname: Option<String>,
    pub ip_address: Option<String>,
    pub first_login: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
}

pub type ArcPlayerRepository = Arc<Box<dyn PlayerRepository + Send + Sync + 'static>>;

#[async_trait::async_trait]
pub trait PlayerRepository {
    async fn get_player_by_id(&self, id: PlayerId) -> ServiceResult<Option<Player>>;
    async fn get_player_by_name(&self, name: &str) -> ServiceResult<Option<Player>>;
    async fn create_player(&self, player: &Player) -> ServiceResult<()>;
    async fn update_player(&self, player: &Player) -> ServiceResult<Player>;
}

pub type ArcPlayerService = Arc<Box<dyn PlayerService + Send + Sync + 'static>>;

#[async_trait::async_trait]
pub trait PlayerService {
    async fn get_player(&self, id: PlayerId) -> ServiceResult<Option<Player>>;
    async fn get_player_by_name(&self, username: &str) -> ServiceResult<Option<Player>>;
    async fn create_player(&self, player: Player) -> ServiceResult<Player>;
    async fn update_player(&self, player: Player) -> ServiceResult<Player>;
}

/// Lookaside cache over a [`PlayerRepository`]. Reads fill the cache on a
/// miss, writes go to the repository first and only touch the cache once
/// the commit succeeded. Entries are never evicted.
pub struct PlayerServiceImpl {
    player_repository: ArcPlayerRepository,
    player_cache: Arc<DashMap<PlayerId, Player>>,
}

impl PlayerServiceImpl {
    pub fn new(player_repository: ArcPlayerRepository) -> Self {
        Self {
            player_repository,
            player_cache: Arc::new(DashMap::new()),
        }
    }

    fn cached_player_by_name(&self, username: &str) -> Option<Player> {
        // Duplicate usernames resolve to the smallest id, same as the
        // repository query order.
        let mut found: Option<Player> = None;
        for entry in self.player_cache.iter() {
            if entry.username.eq_ignore_ascii_case(username)
                && found.as_ref().is_none_or(|p| entry.id < p.id)
            {
                found = Some(entry.value().clone());
            }
        }
        found
    }
}

#[async_trait::async_trait]
impl PlayerService for PlayerServiceImpl {
    async fn get_player(&self, id: PlayerId) -> ServiceResult<Option<Player>> {
        if let Some(player) = self.player_cache.get(&id) {
            return Ok(Some(player.value().clone()));
        }
        let player = self.player_repository.get_player_by_id(id).await?;
        if let Some(player) = &player {
            debug!("Cached player {} after id lookup", player.id);
            self.player_cache.insert(player.id, player.clone());
        }
        Ok(player)
    }

    async fn get_player_by_name(&self, username: &str) -> ServiceResult<Option<Player>> {
        if let Some(player) = self.cached_player_by_name(username) {
            return Ok(Some(player));
        }
        let player = self.player_repository.get_player_by_name(username).await?;
        if let Some(player) = &player {
            debug!("Cached player {} after name lookup", player.id);
            self.player_cache.insert(player.id, player.clone());
        }
        Ok(player)
    }

    async fn create_player(&self, player: Player) -> ServiceResult<Player> {
        self.player_repository.create_player(&player).await?;
        self.player_cache.insert(player.id, player.clone());
        info!("Created player {} ({})", player.username, player.id);
        Ok(player)
    }

    async fn update_player(&self, player: Player) -> ServiceResult<Player> {
        let player = self.player_repository.update_player(&player).await?;
        self.player_cache.insert(player.id, player.clone());
        info!("Updated player {} ({})", player.username, player.id);
        Ok(player)
    }
}

#[derive(Default, Clone)]
pub struct MockPlayerRepository {
    store: Arc<DashMap<PlayerId, Player>>,
    query_count: Arc<AtomicUsize>,
    fail_writes: Arc<AtomicBool>,
}

impl MockPlayerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query_count(&self) -> usize {
        self.query_count.load(Ordering::SeqCst)
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn insert_directly(&self, player: Player) {
        self.store.insert(player.id, player);
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.store.contains_key(&id)
    }
}

#[async_trait::async_trait]
impl PlayerRepository for MockPlayerRepository {
    async fn get_player_by_id(&self, id: PlayerId) -> ServiceResult<Option<Player>> {
        self.query_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.store.get(&id).map(|entry| entry.value().clone()))
    }

    async fn get_player_by_name(&self, name: &str) -> ServiceResult<Option<Player>> {
        self.query_count.fetch_add(1, Ordering::SeqCst);
        let mut found: Option<Player> = None;
        for entry in self.store.iter() {
            if entry.username.eq_ignore_ascii_case(name)
                && found.as_ref().is_none_or(|p| entry.id < p.id)
            {
                found = Some(entry.value().clone());
            }
        }
        Ok(found)
    }

    async fn create_player(&self, player: &Player) -> ServiceResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return ServiceError::persistence("commit failed");
        }
        self.store.insert(player.id, player.clone());
        Ok(())
    }

    async fn update_player(&self, player: &Player) -> ServiceResult<Player> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return ServiceError::persistence("commit failed");
        }
        self.store.insert(player.id, player.clone());
        Ok(player.clone())
    }
}
