use std::sync::Arc;

use chrono::Utc;
use player_service::{
    persistence::players::SqlitePlayerRepository,
    player::{Player, PlayerService, PlayerServiceImpl},
};
use uuid::Uuid;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 2 && args.len() != 3 {
        eprintln!("Usage: add_player <username> [<nickname>]");
        std::process::exit(1);
    }

    let username = &args[1];
    let nickname = if args.len() == 3 {
        Some(args[2].clone())
    } else {
        None
    };

    let repository = SqlitePlayerRepository::new().await;
    let service = PlayerServiceImpl::new(Arc::new(Box::new(repository)));

    let existing = service
        .get_player_by_name(username)
        .await
        .expect("Failed to query players");
    if let Some(existing) = existing {
        eprintln!(
            "Player with name [{}] already exists: {}",
            username, existing.id
        );
        std::process::exit(1);
    }

    let now = Utc::now();
    let player = Player {
        id: Uuid::new_v4(),
        username: username.clone(),
        nickname,
        ip_address: None,
        first_login: now,
        last_login: now,
    };

    let player = service
        .create_player(player)
        .await
        .expect("Failed to create player");
    println!(
        "Created player [{}] with uuid [{}]",
        player.username, player.id
    );
}
