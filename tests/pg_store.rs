//! Postgres principal store tests.
//!
//! Need a live database: set `DATABASE_URL` and run
//! `cargo test --test pg_store -- --ignored`.

use campus_auth::principal::{Account, Instructor, Principal, Role, Student};
use campus_auth::store::{
    PgPrincipalStore, PrincipalFilter, PrincipalPatch, PrincipalStore, StoreError,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

async fn pg_pool() -> Option<PgPool> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("skipping postgres tests: set DATABASE_URL");
            return None;
        }
    };
    let pool = match PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(std::time::Duration::from_secs(2))
        .connect(&url)
        .await
    {
        Ok(pool) => pool,
        Err(err) => {
            eprintln!("skipping postgres tests: cannot connect: {}", err);
            return None;
        }
    };
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate the database");
    Some(pool)
}

fn student(hash: Option<&str>) -> Principal {
    let id = Uuid::new_v4().to_string();
    let mut account = Account::new(id.clone(), format!("{}@example.com", id), "Sam", "Student");
    account.refresh_token_hash = hash.map(str::to_string);
    Student {
        account,
        enrolled_courses: vec!["rust-101".to_string()],
    }
    .into()
}

#[tokio::test]
#[ignore]
async fn rotation_commits_only_against_the_expected_token() {
    let Some(pool) = pg_pool().await else { return };
    let store = PgPrincipalStore::new(pool, Role::Student);
    let principal = student(Some("A1"));
    let id = principal.id().to_string();
    store.insert(principal).await.unwrap();

    assert!(store.rotate_refresh_token(&id, "A1", "B2").await.unwrap());
    assert!(!store.rotate_refresh_token(&id, "A1", "C3").await.unwrap());

    let stored = store.find_by_id(&id).await.unwrap().unwrap();
    assert_eq!(stored.account().refresh_token_hash.as_deref(), Some("B2"));
}

#[tokio::test]
#[ignore]
async fn concurrent_rotations_have_one_winner() {
    let Some(pool) = pg_pool().await else { return };
    let store = PgPrincipalStore::new(pool, Role::Student);
    let principal = student(Some("A1"));
    let id = principal.id().to_string();
    store.insert(principal).await.unwrap();

    let (a, b) = tokio::join!(
        store.rotate_refresh_token(&id, "A1", "B2"),
        store.rotate_refresh_token(&id, "A1", "C3"),
    );
    let wins = [a.unwrap(), b.unwrap()].iter().filter(|won| **won).count();
    assert_eq!(wins, 1);
}

#[tokio::test]
#[ignore]
async fn find_one_needs_id_and_token() {
    let Some(pool) = pg_pool().await else { return };
    let store = PgPrincipalStore::new(pool, Role::Student);
    let owner = student(Some("owner-token"));
    let other = student(None);
    let owner_id = owner.id().to_string();
    let other_id = other.id().to_string();
    store.insert(owner).await.unwrap();
    store.insert(other).await.unwrap();

    let hit = store
        .find_one(&PrincipalFilter::by_session(&owner_id, "owner-token"))
        .await
        .unwrap();
    assert_eq!(hit.unwrap().id(), owner_id);

    let miss = store
        .find_one(&PrincipalFilter::by_session(&other_id, "owner-token"))
        .await
        .unwrap();
    assert!(miss.is_none());
}

#[tokio::test]
#[ignore]
async fn clear_and_update_by_id() {
    let Some(pool) = pg_pool().await else { return };
    let store = PgPrincipalStore::new(pool, Role::Student);
    let principal = student(Some("B2"));
    let id = principal.id().to_string();
    store.insert(principal).await.unwrap();

    assert!(!store.clear_refresh_token_if(&id, "A1").await.unwrap());
    assert!(store.clear_refresh_token_if(&id, "B2").await.unwrap());

    store
        .update_by_id(&id, PrincipalPatch::SetRefreshToken("D4".to_string()))
        .await
        .unwrap();
    let stored = store.find_by_id(&id).await.unwrap().unwrap();
    assert_eq!(stored.account().refresh_token_hash.as_deref(), Some("D4"));

    let missing = store
        .update_by_id("no-such-principal", PrincipalPatch::ClearRefreshToken)
        .await;
    assert!(matches!(missing, Err(StoreError::NotFound(_))));
}

#[tokio::test]
#[ignore]
async fn instructors_round_trip() {
    let Some(pool) = pg_pool().await else { return };
    let store = PgPrincipalStore::new(pool, Role::Instructor);
    let id = Uuid::new_v4().to_string();
    let instructor: Principal = Instructor {
        account: Account::new(id.clone(), format!("{}@example.com", id), "Ada", "Lovelace"),
        bio: Some("Analytical engines".to_string()),
        expertise: vec!["math".to_string()],
    }
    .into();
    store.insert(instructor).await.unwrap();

    let stored = store.find_by_id(&id).await.unwrap().unwrap();
    assert_eq!(stored.role(), Role::Instructor);
    match stored {
        Principal::Instructor(i) => {
            assert_eq!(i.bio.as_deref(), Some("Analytical engines"));
            assert_eq!(i.expertise, vec!["math".to_string()]);
        }
        Principal::Student(_) => panic!("instructor decoded as a student"),
    }
    assert!(store.insert(student(None)).await.is_err());
}
