mod common;

use argon2::Params;
use common::{scripted_engine, start_time, success_verdict, ScriptedGenerator};
use sidequest::game::storage::{self, USERS_KEY};
use sidequest::game::{AuthService, GameError, KeyValueStore, ManualClock, MemoryStore};

fn fast_auth(store: MemoryStore) -> AuthService<MemoryStore> {
    AuthService::with_params(store, Params::new(8, 1, 1, None).ok())
}

#[test]
fn register_login_logout_cycle() {
    let store = MemoryStore::new();
    let auth = fast_auth(store.clone());

    let profile = auth
        .register("Hero@Guild.io", "correct horse", "Hero", start_time())
        .unwrap();
    assert_eq!(profile.email.as_deref(), Some("hero@guild.io"));
    assert_eq!(profile.title, "Awakened Soul");
    assert_eq!(auth.get_session().unwrap().unwrap().id, profile.id);

    auth.logout().unwrap();
    assert!(auth.get_session().unwrap().is_none());

    let again = auth.login("hero@guild.io", "correct horse").unwrap();
    assert_eq!(again.id, profile.id);
    assert!(auth.get_session().unwrap().is_some());
}

#[test]
fn passwords_are_stored_as_digests() {
    let store = MemoryStore::new();
    let auth = fast_auth(store.clone());
    auth.register("a@b.co", "hunter2hunter2", "Abby", start_time())
        .unwrap();
    let blob = store.get(USERS_KEY).unwrap().unwrap();
    assert!(!blob.contains("hunter2hunter2"));
    assert!(blob.contains("$argon2id$"));
}

#[test]
fn auth_errors_carry_player_facing_messages() {
    let auth = fast_auth(MemoryStore::new());
    auth.register("a@b.co", "password123", "Abby", start_time())
        .unwrap();

    let dup = auth
        .register("a@b.co", "password123", "Abby", start_time())
        .unwrap_err();
    assert_eq!(dup.to_string(), "Account already exists with this email.");

    let missing = auth.login("nobody@b.co", "password123").unwrap_err();
    assert_eq!(missing.to_string(), "User not found.");

    let wrong = auth.login("a@b.co", "password124").unwrap_err();
    assert_eq!(wrong.to_string(), "Invalid password.");

    assert!(matches!(
        auth.register("not-an-email", "password123", "Abby", start_time()),
        Err(GameError::Auth(_))
    ));
    assert!(matches!(
        auth.register("c@b.co", "short", "Abby", start_time()),
        Err(GameError::Auth(_))
    ));
}

#[test]
fn progress_is_mirrored_into_the_account() {
    let store = MemoryStore::new();
    let auth = fast_auth(store.clone());
    let profile = auth
        .register("hero@guild.io", "correct horse", "Hero", start_time())
        .unwrap();
    storage::save_profile(&store, &profile).unwrap();

    let generator = ScriptedGenerator::default();
    let clock = ManualClock::new(start_time());
    tokio_test::block_on(async {
        let mut engine = scripted_engine(store.clone(), &generator, &clock, false).await;
        assert_eq!(engine.profile().id, profile.id);

        generator.queue_verdict(success_verdict(50, None));
        engine.accept_quest("q-solo").unwrap();
        engine.verify(b"jpg".to_vec(), "walk.jpg", "").await.unwrap();
    });

    let relogged = auth.login("hero@guild.io", "correct horse").unwrap();
    assert_eq!(relogged.current_xp, 50);
    assert!(relogged.has_achievement("first_blood"));
}
