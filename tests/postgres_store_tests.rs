//! Store tests against a live Postgres database. They run when `DATABASE_URL`
//! is set and are skipped otherwise.

use chrono::{NaiveDate, Utc};
use hotel_booking::{
    AppError,
    models::{BookingStatus, CreateHotelRequest, CreateRoomRequest, DateRange, Hotel, Role, Room, RoomSize, User},
    store::{BookingFilter, HotelFilter, HotelUpdate, RoomFilter, Store},
};
use serial_test::serial;
use sqlx::PgPool;
use tokio::task::JoinSet;
use uuid::Uuid;

// --- Test Context and Setup ---

struct DbTestContext {
    pool: PgPool,
}

impl DbTestContext {
    async fn setup() -> Option<Self> {
        dotenv::dotenv().ok();

        let Ok(db_url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set, skipping postgres store test");
            return None;
        };

        let pool = PgPool::connect(&db_url)
            .await
            .expect("Failed to connect to database for integration tests.");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run database migrations.");

        Some(DbTestContext { pool })
    }

    fn store(&self) -> Store {
        Store::postgres(self.pool.clone())
    }
}

// --- Test Data Helpers ---

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2030, 3, d).unwrap()
}

fn range(from: u32, till: u32) -> DateRange {
    DateRange::new(day(from), day(till)).unwrap()
}

fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@test.com", Uuid::new_v4().simple())
}

fn raw_user(email: &str) -> User {
    User {
        id: Uuid::new_v4(),
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: email.to_string(),
        encrypted_password: "$2b$04$hash".to_string(),
        role: Role::User,
        created_at: Utc::now(),
        deleted_at: None,
    }
}

async fn create_test_hotel(store: &Store) -> Hotel {
    store
        .hotels
        .insert_hotel(Hotel::new(CreateHotelRequest {
            name: format!("Hotel {}", Uuid::new_v4().simple()),
            location: "Lisbon".to_string(),
            rating: 4,
        }))
        .await
        .expect("Failed to create test hotel")
}

async fn create_test_room(store: &Store, hotel_id: Uuid) -> Room {
    store
        .insert_room(Room::new(CreateRoomRequest {
            hotel_id,
            size: RoomSize::Normal,
            seaside: false,
            price: 120.0,
        }))
        .await
        .expect("Failed to create test room")
}

/// A live user and a registered room, ready to be booked.
async fn booking_fixture(store: &Store) -> (User, Room) {
    let user = store
        .users
        .insert_user(raw_user(&unique_email("guest")))
        .await
        .expect("Failed to create test user");
    let hotel = create_test_hotel(store).await;
    let room = create_test_room(store, hotel.id).await;
    (user, room)
}

// --- Users ---

#[tokio::test]
#[serial]
async fn test_pg_soft_delete_frees_the_email() {
    let Some(ctx) = DbTestContext::setup().await else {
        return;
    };
    let store = ctx.store();
    let email = unique_email("ada");

    let user = store.users.insert_user(raw_user(&email)).await.unwrap();
    let duplicate = store.users.insert_user(raw_user(&email.to_uppercase())).await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    store.users.delete_user(user.id).await.unwrap();
    assert!(matches!(
        store.users.get_user_by_id(user.id).await,
        Err(AppError::NotFound("user"))
    ));

    let again = store.users.insert_user(raw_user(&email)).await.unwrap();
    let found = store.users.get_user_by_email(&email.to_uppercase()).await.unwrap();
    assert_eq!(found.id, again.id);
}

#[tokio::test]
#[serial]
async fn test_pg_primary_key_collision_is_not_an_email_conflict() {
    let Some(ctx) = DbTestContext::setup().await else {
        return;
    };
    let store = ctx.store();

    let first = store.users.insert_user(raw_user(&unique_email("first"))).await.unwrap();
    let mut clash = raw_user(&unique_email("second"));
    clash.id = first.id;

    let err = store.users.insert_user(clash).await.unwrap_err();
    assert!(matches!(err, AppError::Store { .. }), "got {err:?}");
}

// --- Hotels ---

#[tokio::test]
#[serial]
async fn test_pg_push_room_keeps_order_and_skips_duplicates() {
    let Some(ctx) = DbTestContext::setup().await else {
        return;
    };
    let store = ctx.store();
    let hotel = create_test_hotel(&store).await;
    let (first, second) = (Uuid::new_v4(), Uuid::new_v4());

    let filter = HotelFilter::by_id(hotel.id);
    for room_id in [first, second, first] {
        store
            .hotels
            .update_hotel(&filter, HotelUpdate::PushRoom(room_id))
            .await
            .unwrap();
    }

    let stored = store.hotels.get_hotel_by_id(hotel.id).await.unwrap();
    assert_eq!(stored.rooms, vec![first, second]);

    let missing = store
        .hotels
        .update_hotel(&HotelFilter::by_id(Uuid::new_v4()), HotelUpdate::PushRoom(first))
        .await;
    assert!(matches!(missing, Err(AppError::NotFound("hotel"))));
}

#[tokio::test]
#[serial]
async fn test_pg_rooms_of_hotel_follow_the_sequence() {
    let Some(ctx) = DbTestContext::setup().await else {
        return;
    };
    let store = ctx.store();
    let hotel = create_test_hotel(&store).await;
    let first = create_test_room(&store, hotel.id).await;
    let second = create_test_room(&store, hotel.id).await;

    let rooms = store.rooms_of_hotel(hotel.id).await.unwrap();
    let ids: Vec<Uuid> = rooms.iter().map(|room| room.id).collect();
    assert_eq!(ids, vec![first.id, second.id]);
}

// --- Bookings ---

#[tokio::test]
#[serial]
async fn test_pg_overlap_conflicts_and_availability_excludes_the_room() {
    let Some(ctx) = DbTestContext::setup().await else {
        return;
    };
    let store = ctx.store();
    let (user, room) = booking_fixture(&store).await;
    let free = create_test_room(&store, room.hotel_id).await;

    store.create_booking(user.id, room.id, range(1, 5), 2).await.unwrap();
    let err = store
        .create_booking(user.id, room.id, range(4, 8), 2)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    store.create_booking(user.id, room.id, range(5, 8), 2).await.unwrap();

    let filter = RoomFilter {
        hotel_id: Some(room.hotel_id),
        ..RoomFilter::default()
    };
    let available = store.available_rooms(&filter, Some(range(2, 3))).await.unwrap();
    let ids: Vec<Uuid> = available.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![free.id]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[serial]
async fn test_pg_racing_bookings_admit_exactly_one() {
    let Some(ctx) = DbTestContext::setup().await else {
        return;
    };
    let store = ctx.store();
    let (user, room) = booking_fixture(&store).await;
    let (user_id, room_id) = (user.id, room.id);

    let mut attempts = JoinSet::new();
    for _ in 0..6 {
        let store = store.clone();
        attempts.spawn(async move { store.create_booking(user_id, room_id, range(10, 14), 1).await });
    }

    let mut booked = 0;
    while let Some(outcome) = attempts.join_next().await {
        match outcome.unwrap() {
            Ok(_) => booked += 1,
            Err(AppError::Conflict(_)) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
    assert_eq!(booked, 1);

    let filter = BookingFilter {
        room_id: Some(room_id),
        ..BookingFilter::default()
    };
    assert_eq!(store.bookings.get_bookings(&filter).await.unwrap().len(), 1);
}

#[tokio::test]
#[serial]
async fn test_pg_cancel_distinguishes_missing_from_already_canceled() {
    let Some(ctx) = DbTestContext::setup().await else {
        return;
    };
    let store = ctx.store();
    let (user, room) = booking_fixture(&store).await;
    let booking = store.create_booking(user.id, room.id, range(1, 3), 1).await.unwrap();

    let canceled = store.bookings.cancel_booking(booking.id).await.unwrap();
    assert_eq!(canceled.status, BookingStatus::Canceled);
    assert!(matches!(
        store.bookings.cancel_booking(booking.id).await,
        Err(AppError::AlreadyCanceled)
    ));
    assert!(matches!(
        store.bookings.cancel_booking(Uuid::new_v4()).await,
        Err(AppError::NotFound("booking"))
    ));

    // The canceled range is bookable again.
    store.create_booking(user.id, room.id, range(1, 3), 1).await.unwrap();
}

#[tokio::test]
#[serial]
async fn test_pg_confirm_is_idempotent_but_refuses_canceled() {
    let Some(ctx) = DbTestContext::setup().await else {
        return;
    };
    let store = ctx.store();
    let (user, room) = booking_fixture(&store).await;
    let booking = store.create_booking(user.id, room.id, range(20, 22), 1).await.unwrap();
    assert_eq!(booking.status, BookingStatus::Pending);

    let confirmed = store.bookings.confirm_booking(booking.id).await.unwrap();
    assert_eq!(confirmed.status, BookingStatus::Confirmed);
    let again = store.bookings.confirm_booking(booking.id).await.unwrap();
    assert_eq!(again.status, BookingStatus::Confirmed);

    store.bookings.cancel_booking(booking.id).await.unwrap();
    assert!(matches!(
        store.bookings.confirm_booking(booking.id).await,
        Err(AppError::Conflict(_))
    ));
    assert!(matches!(
        store.bookings.confirm_booking(Uuid::new_v4()).await,
        Err(AppError::NotFound("booking"))
    ));
}
