//! End-to-end engine tests against a real SQLite database: conflict
//! detection, price snapshots, lifecycle transitions, the delete guard,
//! and revenue aggregation.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use fleetr::config::{SecurityConfig, UploadConfig};
use fleetr::db::{NewUser, Store};
use fleetr::domain::{BookingStatus, Identity, Role};
use fleetr::entities::bookings;
use fleetr::services::{
    BookingEngine, BookingError, BookingRequest, CancelOutcome, CarInput, InventoryError,
    InventoryService,
};
use sea_orm::{ActiveModelTrait, Set};

struct TestEnv {
    store: Store,
    engine: Arc<BookingEngine>,
    inventory: InventoryService,
}

async fn setup() -> TestEnv {
    let db_path =
        std::env::temp_dir().join(format!("fleetr-engine-test-{}.db", uuid::Uuid::new_v4()));
    let store = Store::new(&format!("sqlite:{}", db_path.display()))
        .await
        .expect("failed to open test database");

    let engine = Arc::new(BookingEngine::new(store.clone()));
    let inventory = InventoryService::new(store.clone(), engine.clone(), &UploadConfig::default());

    TestEnv {
        store,
        engine,
        inventory,
    }
}

/// Fast hashing params for tests.
fn test_security() -> SecurityConfig {
    SecurityConfig {
        argon2_memory_cost_kib: 1024,
        argon2_time_cost: 1,
        argon2_parallelism: 1,
    }
}

async fn seed_customer(store: &Store, email: &str) -> Identity {
    let user = store
        .create_user(
            NewUser {
                email: email.to_string(),
                full_name: "Test Customer".to_string(),
                phone: Some("012345678".to_string()),
                password: "secret123".to_string(),
            },
            &test_security(),
        )
        .await
        .expect("failed to seed customer");

    Identity {
        user_id: user.id,
        role: Role::Customer,
    }
}

fn car_input(price_per_day: f64, plate: &str) -> CarInput {
    CarInput {
        brand: "Toyota".to_string(),
        model: "Camry".to_string(),
        category: "Sedan".to_string(),
        seat_capacity: 5,
        price_per_day,
        fuel_type: "Petrol".to_string(),
        transmission: "Automatic".to_string(),
        year: 2022,
        license_plate: plate.to_string(),
        description: None,
        is_available: true,
    }
}

async fn seed_car(inventory: &InventoryService, price_per_day: f64, plate: &str) -> i32 {
    inventory
        .add_car(car_input(price_per_day, plate))
        .await
        .expect("failed to seed car")
        .id
}

fn day(offset: i64) -> NaiveDate {
    Utc::now().date_naive() + Duration::days(offset)
}

fn request(car_id: i32, start: NaiveDate, end: NaiveDate) -> BookingRequest {
    BookingRequest {
        car_id,
        start_date: start,
        end_date: end,
        notes: None,
    }
}

#[tokio::test]
async fn booking_snapshots_price_at_creation() {
    let env = setup().await;
    let customer = seed_customer(&env.store, "alice@test.local").await;
    let car_id = seed_car(&env.inventory, 100_000.0, "1AA-0001").await;

    let booking = env
        .engine
        .try_create(customer, request(car_id, day(10), day(12)))
        .await
        .expect("booking should succeed");

    assert_eq!(booking.total_days, 2);
    assert!((booking.total_price - 200_000.0).abs() < f64::EPSILON);
    assert_eq!(booking.status, "pending");

    // A later price edit must not touch the snapshot.
    env.inventory
        .update_car(car_id, car_input(999_999.0, "1AA-0001"))
        .await
        .expect("price edit should succeed");

    let stored = env
        .store
        .get_booking(booking.id)
        .await
        .unwrap()
        .expect("booking should still exist");
    assert!((stored.total_price - 200_000.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn overlapping_dates_are_rejected_inclusively() {
    let env = setup().await;
    let customer = seed_customer(&env.store, "alice@test.local").await;
    let car_id = seed_car(&env.inventory, 100_000.0, "1AA-0002").await;

    env.engine
        .try_create(customer, request(car_id, day(10), day(12)))
        .await
        .expect("first booking should succeed");

    // Straddles the existing interval.
    let err = env
        .engine
        .try_create(customer, request(car_id, day(11), day(13)))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Conflict(_)));

    // Starts on the existing end date: inclusive bounds, still a conflict.
    let err = env
        .engine
        .try_create(customer, request(car_id, day(12), day(14)))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Conflict(_)));

    // Starts the day after the existing end date: free.
    env.engine
        .try_create(customer, request(car_id, day(13), day(15)))
        .await
        .expect("abutting-next-day booking should succeed");
}

#[tokio::test]
async fn cancelled_booking_frees_its_dates() {
    let env = setup().await;
    let customer = seed_customer(&env.store, "alice@test.local").await;
    let car_id = seed_car(&env.inventory, 100_000.0, "1AA-0003").await;

    let booking = env
        .engine
        .try_create(customer, request(car_id, day(10), day(12)))
        .await
        .unwrap();

    assert_eq!(
        env.engine.cancel(customer, booking.id).await.unwrap(),
        CancelOutcome::Cancelled
    );

    env.engine
        .try_create(customer, request(car_id, day(10), day(12)))
        .await
        .expect("dates should be free after cancellation");
}

#[tokio::test]
async fn create_preconditions() {
    let env = setup().await;
    let customer = seed_customer(&env.store, "alice@test.local").await;
    let car_id = seed_car(&env.inventory, 100_000.0, "1AA-0004").await;

    // Admins cannot hold bookings.
    let admin = Identity {
        user_id: customer.user_id,
        role: Role::Admin,
    };
    assert!(matches!(
        env.engine
            .try_create(admin, request(car_id, day(10), day(12)))
            .await,
        Err(BookingError::Forbidden(_))
    ));

    // End must be after start.
    assert!(matches!(
        env.engine
            .try_create(customer, request(car_id, day(12), day(12)))
            .await,
        Err(BookingError::Validation(_))
    ));
    assert!(matches!(
        env.engine
            .try_create(customer, request(car_id, day(12), day(10)))
            .await,
        Err(BookingError::Validation(_))
    ));

    // Start cannot be in the past.
    assert!(matches!(
        env.engine
            .try_create(customer, request(car_id, day(-1), day(2)))
            .await,
        Err(BookingError::Validation(_))
    ));

    // Unknown car.
    assert!(matches!(
        env.engine
            .try_create(customer, request(9999, day(10), day(12)))
            .await,
        Err(BookingError::CarNotFound(9999))
    ));

    // Unavailable car.
    let mut unavailable = car_input(100_000.0, "1AA-0005");
    unavailable.is_available = false;
    let parked = env.inventory.add_car(unavailable).await.unwrap();
    assert!(matches!(
        env.engine
            .try_create(customer, request(parked.id, day(10), day(12)))
            .await,
        Err(BookingError::Conflict(_))
    ));
}

#[tokio::test]
async fn cancel_authorization_and_idempotence() {
    let env = setup().await;
    let owner = seed_customer(&env.store, "alice@test.local").await;
    let stranger = seed_customer(&env.store, "bob@test.local").await;
    let car_id = seed_car(&env.inventory, 100_000.0, "1AA-0006").await;

    let booking = env
        .engine
        .try_create(owner, request(car_id, day(10), day(12)))
        .await
        .unwrap();

    assert!(matches!(
        env.engine.cancel(stranger, booking.id).await,
        Err(BookingError::Forbidden(_))
    ));

    assert_eq!(
        env.engine.cancel(owner, booking.id).await.unwrap(),
        CancelOutcome::Cancelled
    );
    assert_eq!(
        env.engine.cancel(owner, booking.id).await.unwrap(),
        CancelOutcome::AlreadyCancelled
    );

    // Admins may cancel anyone's booking.
    let second = env
        .engine
        .try_create(owner, request(car_id, day(20), day(22)))
        .await
        .unwrap();
    let admin = Identity {
        user_id: stranger.user_id,
        role: Role::Admin,
    };
    assert_eq!(
        env.engine.cancel(admin, second.id).await.unwrap(),
        CancelOutcome::Cancelled
    );
}

#[tokio::test]
async fn started_rental_cannot_be_cancelled() {
    let env = setup().await;
    let customer = seed_customer(&env.store, "alice@test.local").await;
    let car_id = seed_car(&env.inventory, 100_000.0, "1AA-0007").await;

    // Insert a booking that already started, bypassing the engine's
    // start-date precondition.
    let started = bookings::ActiveModel {
        user_id: Set(customer.user_id),
        car_id: Set(car_id),
        start_date: Set(day(-2)),
        end_date: Set(day(2)),
        total_days: Set(4),
        total_price: Set(400_000.0),
        status: Set("approved".to_string()),
        created_at: Set(Utc::now().to_rfc3339()),
        notes: Set(None),
        ..Default::default()
    }
    .insert(&env.store.conn)
    .await
    .unwrap();

    assert!(matches!(
        env.engine.cancel(customer, started.id).await,
        Err(BookingError::InvalidState(_))
    ));
}

#[tokio::test]
async fn approve_is_valid_only_from_pending() {
    let env = setup().await;
    let customer = seed_customer(&env.store, "alice@test.local").await;
    let car_id = seed_car(&env.inventory, 100_000.0, "1AA-0008").await;

    let booking = env
        .engine
        .try_create(customer, request(car_id, day(10), day(12)))
        .await
        .unwrap();

    let approved = env.engine.approve(booking.id).await.unwrap();
    assert_eq!(approved.status, "approved");

    // Approving twice is an invalid-state error, not a silent no-op.
    assert!(matches!(
        env.engine.approve(booking.id).await,
        Err(BookingError::InvalidState(_))
    ));

    // A cancelled booking must never be resurrected.
    let second = env
        .engine
        .try_create(customer, request(car_id, day(20), day(22)))
        .await
        .unwrap();
    env.engine.cancel(customer, second.id).await.unwrap();
    assert!(matches!(
        env.engine.approve(second.id).await,
        Err(BookingError::InvalidState(_))
    ));

    assert!(matches!(
        env.engine.approve(9999).await,
        Err(BookingError::NotFound(9999))
    ));
}

#[tokio::test]
async fn delete_guard_blocks_cars_with_active_bookings() {
    let env = setup().await;
    let customer = seed_customer(&env.store, "alice@test.local").await;
    let car_id = seed_car(&env.inventory, 100_000.0, "1AA-0009").await;

    let booking = env
        .engine
        .try_create(customer, request(car_id, day(10), day(12)))
        .await
        .unwrap();

    assert!(matches!(
        env.inventory.delete_car(car_id).await,
        Err(InventoryError::Conflict(_))
    ));

    // Approved bookings still block deletion.
    env.engine.approve(booking.id).await.unwrap();
    assert!(matches!(
        env.inventory.delete_car(car_id).await,
        Err(InventoryError::Conflict(_))
    ));

    // A cancelled booking does not, and goes with the car via the cascade.
    env.engine.cancel(customer, booking.id).await.unwrap();
    env.inventory.delete_car(car_id).await.unwrap();

    assert!(env.store.get_car(car_id).await.unwrap().is_none());
    assert!(env.store.get_booking(booking.id).await.unwrap().is_none());
}

#[tokio::test]
async fn revenue_counts_only_approved_and_completed() {
    let env = setup().await;
    let customer = seed_customer(&env.store, "alice@test.local").await;

    // Empty history sums to zero.
    assert!((env.store.total_revenue().await.unwrap()).abs() < f64::EPSILON);

    let car_a = seed_car(&env.inventory, 100_000.0, "1AA-0010").await;
    let car_b = seed_car(&env.inventory, 100_000.0, "1AA-0011").await;
    let car_c = seed_car(&env.inventory, 25_000.0, "1AA-0012").await;

    // approved: 2 days x 100000 = 200000
    let approved = env
        .engine
        .try_create(customer, request(car_a, day(10), day(12)))
        .await
        .unwrap();
    env.engine.approve(approved.id).await.unwrap();

    // pending: 1 day x 100000 = 100000
    env.engine
        .try_create(customer, request(car_b, day(10), day(11)))
        .await
        .unwrap();

    // cancelled: 2 days x 25000 = 50000
    let cancelled = env
        .engine
        .try_create(customer, request(car_c, day(10), day(12)))
        .await
        .unwrap();
    env.engine.cancel(customer, cancelled.id).await.unwrap();

    let revenue = env.store.total_revenue().await.unwrap();
    assert!((revenue - 200_000.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn concurrent_attempts_on_same_dates_yield_one_booking() {
    let env = setup().await;
    let alice = seed_customer(&env.store, "alice@test.local").await;
    let bob = seed_customer(&env.store, "bob@test.local").await;
    let car_id = seed_car(&env.inventory, 100_000.0, "1AA-0013").await;

    let engine_a = env.engine.clone();
    let engine_b = env.engine.clone();

    let (a, b) = tokio::join!(
        engine_a.try_create(alice, request(car_id, day(10), day(12))),
        engine_b.try_create(bob, request(car_id, day(10), day(12))),
    );

    assert!(
        a.is_ok() != b.is_ok(),
        "exactly one of the two concurrent attempts must win"
    );

    let (rows, _) = env
        .store
        .list_bookings(Some(BookingStatus::Pending), 1, 50)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn reporting_summary_reflects_bookings() {
    use fleetr::services::ReportingService;

    let env = setup().await;
    let customer = seed_customer(&env.store, "alice@test.local").await;
    let car_a = seed_car(&env.inventory, 100_000.0, "1AA-0014").await;
    let car_b = seed_car(&env.inventory, 50_000.0, "1AA-0015").await;

    env.engine
        .try_create(customer, request(car_a, day(10), day(12)))
        .await
        .unwrap();
    env.engine
        .try_create(customer, request(car_a, day(20), day(22)))
        .await
        .unwrap();
    env.engine
        .try_create(customer, request(car_b, day(10), day(12)))
        .await
        .unwrap();

    let reporting = ReportingService::new(env.store.clone());

    let stats = reporting.dashboard().await.unwrap();
    assert_eq!(stats.total_cars, 2);
    assert_eq!(stats.total_customers, 1);
    assert_eq!(stats.total_bookings, 3);
    assert_eq!(stats.pending_bookings, 3);

    let summary = reporting.summary().await.unwrap();
    assert_eq!(summary.popular_cars.len(), 2);
    assert_eq!(summary.popular_cars[0].car_id, car_a);
    assert_eq!(summary.popular_cars[0].bookings, 2);

    // Today's three bookings show up in the trailing window.
    let today: i64 = summary.daily_activity.iter().map(|d| d.bookings).sum();
    assert_eq!(today, 3);

    // Nothing approved yet.
    assert!(summary.total_revenue.abs() < f64::EPSILON);
}
