//! End-to-end repository tests against a real Postgres instance.
//!
//! These exercise the quota guard and the weekly aggregation query for real,
//! so they need `DATABASE_URL` pointing at a scratch database. They are
//! ignored by default; run them with
//! `DATABASE_URL=postgres://... cargo test -p api -- --ignored`.

use api_lib::adapters::db::DbAdapter;
use chrono::{Duration, Utc};
use goals_core::ports::{GoalRepository, PortError};
use goals_core::week::WeekWindow;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

async fn fresh_adapter() -> (DbAdapter, PgPool) {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must point at a test database");
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("connect to test database");

    let adapter = DbAdapter::new(pool.clone());
    adapter.run_migrations().await.expect("run migrations");

    sqlx::query("TRUNCATE goal_completions, goals")
        .execute(&pool)
        .await
        .expect("truncate tables");

    (adapter, pool)
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn quota_rejects_the_fourth_completion_and_summary_reports_three() {
    let (adapter, _pool) = fresh_adapter().await;

    let goal = adapter.create_goal("Run", 3).await.unwrap();

    for _ in 0..3 {
        adapter.create_goal_completion(goal.id).await.unwrap();
    }

    let err = adapter.create_goal_completion(goal.id).await.unwrap_err();
    assert!(matches!(err, PortError::QuotaExceeded { goal_id } if goal_id == goal.id));

    let summary = adapter.week_summary().await.unwrap();
    assert_eq!(summary.completed, 3);
    assert_eq!(summary.total, 3);
    assert_eq!(summary.goals_per_day.len(), 1);
    let today = Utc::now().date_naive();
    let entries = summary.goals_per_day.get(&today).unwrap();
    assert_eq!(entries.len(), 3);
    assert!(entries.iter().all(|e| e.title == "Run"));

    // The rejected attempt must not have inserted anything.
    let again = adapter.week_summary().await.unwrap();
    assert_eq!(again.completed, 3);
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn zero_activity_yields_an_empty_summary() {
    let (adapter, _pool) = fresh_adapter().await;

    let summary = adapter.week_summary().await.unwrap();
    assert_eq!(summary.completed, 0);
    assert_eq!(summary.total, 0);
    assert!(summary.goals_per_day.is_empty());
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn completing_an_unknown_goal_is_not_found() {
    let (adapter, _pool) = fresh_adapter().await;

    let err = adapter
        .create_goal_completion(Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::NotFound(_)));
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn goals_created_after_the_week_ends_do_not_count_toward_total() {
    let (adapter, pool) = fresh_adapter().await;

    adapter.create_goal("Read", 2).await.unwrap();

    // A goal stamped past the current window's end belongs to a later week.
    let next_week = WeekWindow::containing(Utc::now()).last + Duration::hours(1);
    sqlx::query("INSERT INTO goals (id, title, desired_weekly_frequency, created_at) VALUES ($1, $2, $3, $4)")
        .bind(Uuid::new_v4())
        .bind("Future goal")
        .bind(5)
        .bind(next_week)
        .execute(&pool)
        .await
        .unwrap();

    let summary = adapter.week_summary().await.unwrap();
    assert_eq!(summary.total, 2);
    assert_eq!(summary.completed, 0);
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL)"]
async fn completions_at_the_window_bounds_are_counted() {
    let (adapter, pool) = fresh_adapter().await;

    let goal = adapter.create_goal("Stretch", 5).await.unwrap();
    let window = WeekWindow::containing(Utc::now());

    for stamp in [window.first, window.last] {
        sqlx::query("INSERT INTO goal_completions (id, goal_id, created_at) VALUES ($1, $2, $3)")
            .bind(Uuid::new_v4())
            .bind(goal.id)
            .bind(stamp)
            .execute(&pool)
            .await
            .unwrap();
    }

    let summary = adapter.week_summary().await.unwrap();
    assert_eq!(summary.completed, 2);

    let bucketed: usize = summary.goals_per_day.values().map(Vec::len).sum();
    assert_eq!(bucketed, 2);
}
