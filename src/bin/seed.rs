//! Seeds a Postgres database with an admin account, two hotels, and their rooms,
//! then prints a token for the admin. Re-running reuses the existing admin and
//! skips hotels whose name is already taken.

use std::{env, process::ExitCode};

use hotel_booking::{
    AppError,
    auth::{hash_password, issue_token},
    config::{AppConfig, StoreBackend},
    models::{CreateHotelRequest, CreateRoomRequest, CreateUserRequest, Hotel, Role, Room, RoomSize, User},
    store::{HotelFilter, Store, UserPatch},
};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hotel_booking=info,seed=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match seed().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "seeding failed");
            ExitCode::FAILURE
        }
    }
}

async fn seed() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    if config.store_backend != StoreBackend::Postgres {
        return Err("seeding needs STORE_BACKEND=postgres".into());
    }

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.db_url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    let store = Store::postgres(pool);

    let admin = seed_admin(&store, &config).await?;

    let seeded = seed_hotels(&store).await?;
    tracing::info!(seeded, "hotels seeded");

    let token = issue_token(admin.id, &config)?;
    println!("admin {} token: {token}", admin.email);
    Ok(())
}

/// Inserts the demo hotels and their rooms, skipping any hotel whose name is
/// already present. Returns how many hotels were inserted.
async fn seed_hotels(store: &Store) -> Result<usize, AppError> {
    let hotels = [
        ("Bellucia", "France", 3, vec![(RoomSize::Small, false, 89.0), (RoomSize::Normal, true, 129.0)]),
        ("The Cozy Hotel", "The Netherlands", 4, vec![(RoomSize::Normal, false, 99.0), (RoomSize::Kingsize, true, 249.0)]),
    ];
    let existing = store.hotels.get_hotels(&HotelFilter::default()).await?;

    let mut seeded = 0;
    for (name, location, rating, rooms) in hotels {
        if existing.iter().any(|hotel| hotel.name == name) {
            tracing::info!(hotel = name, "hotel already seeded");
            continue;
        }
        let hotel = store
            .hotels
            .insert_hotel(Hotel::new(CreateHotelRequest {
                name: name.to_string(),
                location: location.to_string(),
                rating,
            }))
            .await?;
        for (size, seaside, price) in rooms {
            store
                .insert_room(Room::new(CreateRoomRequest {
                    hotel_id: hotel.id,
                    size,
                    seaside,
                    price,
                }))
                .await?;
        }
        tracing::info!(hotel_id = %hotel.id, hotel = name, "hotel seeded");
        seeded += 1;
    }
    Ok(seeded)
}

async fn seed_admin(store: &Store, config: &AppConfig) -> Result<User, AppError> {
    let req = CreateUserRequest {
        first_name: "Admin".to_string(),
        last_name: "Admin".to_string(),
        email: env::var("SEED_ADMIN_EMAIL").unwrap_or_else(|_| "admin@hotel.local".to_string()),
        password: env::var("SEED_ADMIN_PASSWORD").unwrap_or_else(|_| "adminpassword".to_string()),
    };
    req.validate()?;

    let email = req.email.clone();
    let encrypted_password = hash_password(req.password.clone(), config.bcrypt_cost).await?;
    let admin = match store.users.insert_user(User::new(req, encrypted_password)).await {
        Ok(user) => user,
        Err(AppError::Conflict(_)) => {
            tracing::info!(%email, "admin already exists");
            store.users.get_user_by_email(&email).await?
        }
        Err(err) => return Err(err),
    };

    let patch = UserPatch {
        role: Some(Role::Admin),
        ..UserPatch::default()
    };
    store.users.update_user(admin.id, patch).await?;
    Ok(admin)
}
