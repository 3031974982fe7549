use axum::Router;
use chrono::{DateTime, TimeZone, Utc};
use migration::MigratorTrait;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::sync::Arc;
use taskboard_server::auth::{AuthState, encode_jwt};
use taskboard_server::clock::{Clock, ManualClock};
use taskboard_server::task::TaskState;
use taskboard_server::task::store::SeaOrmTaskStore;
use taskboard_server::verification::{LogCodeSender, VerificationCodeStore, VerificationState};

#[allow(dead_code)]
pub const JWT_SECRET: &str = "test_secret";

/// Wednesday 2024-06-05 12:00 UTC.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 5, 12, 0, 0).unwrap()
}

/// Connects to a fresh in-memory SQLite database with every migration applied.
pub async fn setup_db() -> anyhow::Result<DatabaseConnection> {
    // A single pooled connection keeps the in-memory database alive.
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1);
    let db = Database::connect(options).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[allow(dead_code)]
pub struct TestContext {
    pub db: DatabaseConnection,
    pub clock: Arc<ManualClock>,
    pub codes: Arc<VerificationCodeStore>,
    pub app: Router,
}

#[allow(dead_code)]
pub async fn setup() -> anyhow::Result<TestContext> {
    // Allow multiple calls to init for tests.
    let _ = tracing_subscriber::fmt().try_init();
    let db = setup_db().await?;
    let clock = Arc::new(ManualClock::new(fixed_now()));
    let shared_clock: Arc<dyn Clock> = clock.clone();

    let auth_state = Arc::new(AuthState {
        jwt_secret: JWT_SECRET.to_string(),
    });
    let task_state = TaskState {
        store: Arc::new(SeaOrmTaskStore::new(db.clone())),
        clock: shared_clock.clone(),
    };
    let codes = Arc::new(VerificationCodeStore::new(shared_clock));
    let verification_state = VerificationState {
        store: codes.clone(),
        sender: Arc::new(LogCodeSender),
    };
    let app = taskboard_server::web::create_app(auth_state, task_state, verification_state);

    Ok(TestContext {
        db,
        clock,
        codes,
        app,
    })
}

/// Authorization header value for `user_id`.
#[allow(dead_code)]
pub async fn bearer(user_id: &str) -> String {
    let token = encode_jwt(user_id.to_string(), JWT_SECRET)
        .await
        .expect("Failed to encode token");
    format!("Bearer {}", token)
}
