#![allow(dead_code, unused_macros)]

use item_announcer::{db, AppState};

pub const TEST_SECRET: &str = "integration-test-secret";
pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "admin123";

/// Fresh in-memory database with migrations applied and the default admin seeded.
pub async fn test_state() -> AppState {
    let pool = db::init_pool("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");
    db::migrate(&pool).await.expect("Failed to run migrations");
    db::seed_admin(&pool, ADMIN_USERNAME, ADMIN_PASSWORD)
        .await
        .expect("Failed to seed admin");
    AppState::new(pool, TEST_SECRET)
}

/// Bearer header value for the seeded admin.
pub async fn admin_bearer(state: &AppState) -> String {
    let admin = db::find_admin_by_username(&state.db_pool, ADMIN_USERNAME)
        .await
        .unwrap()
        .expect("seeded admin is missing");
    let token = state.tokens.issue(admin.id, &admin.username).unwrap();
    format!("Bearer {token}")
}

macro_rules! init_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($state))
                .configure(item_announcer::routes::configure)
                .default_service(actix_web::web::to(item_announcer::routes::default_handler)),
        )
        .await
    };
}
