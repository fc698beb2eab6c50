mod common;

use chrono::Duration;
use common::{memory_engine, scripted_engine, start_time, ScriptedGenerator};
use sidequest::game::{GameError, ManualClock, MemoryStore, QuestType, TaskKind, TickEvent};

#[tokio::test]
async fn timed_quest_runs_out_after_its_duration() {
    let generator = ScriptedGenerator::default();
    let (_store, clock, mut engine) = memory_engine(&generator).await;

    engine.accept_quest("q-timed").unwrap();
    assert_eq!(engine.countdown_remaining_ms(), Some(120_000));

    clock.advance(Duration::seconds(60));
    let events = engine.tick().await.unwrap();
    assert!(events.contains(&TickEvent::Countdown {
        quest_id: "q-timed".to_string(),
        remaining_ms: 60_000,
    }));

    clock.advance(Duration::seconds(61));
    let events = engine.tick().await.unwrap();
    assert!(events.contains(&TickEvent::QuestTimedOut {
        quest_id: "q-timed".to_string()
    }));

    let active = engine.active_quest().unwrap();
    assert!(active.is_failed());
    let result = active.result().unwrap();
    assert_eq!(result.xp_awarded, 0);
    assert_eq!(result.ai_comment, "Time ran out! You were too slow.");
    assert!(!engine.scheduler().is_armed(TaskKind::QuestCountdown));
    assert_eq!(engine.profile().current_xp, 0);
}

#[tokio::test]
async fn submitting_proof_stops_the_clock() {
    let generator = ScriptedGenerator::default();
    let (_store, clock, mut engine) = memory_engine(&generator).await;

    engine.accept_quest("q-timed").unwrap();
    let ticket = engine.begin_verification(b"jpg".to_vec(), "glass.jpg", "").unwrap();
    clock.advance(Duration::minutes(5));
    let events = engine.tick().await.unwrap();
    assert!(!events
        .iter()
        .any(|e| matches!(e, TickEvent::QuestTimedOut { .. })));

    generator.queue_verdict(common::success_verdict(100, None));
    let verdict = ticket.judge(engine.content()).await;
    let outcome = engine.finish_verification(ticket, verdict).unwrap();
    assert!(outcome.result.success);
    assert_eq!(engine.profile().attributes.strength, 12);
}

#[tokio::test]
async fn late_proof_with_the_quest_view_hidden_earns_nothing() {
    let generator = ScriptedGenerator::default();
    let (store, clock, mut engine) = memory_engine(&generator).await;

    engine.accept_quest("q-timed").unwrap();
    engine.leave_quest_view();
    clock.advance(Duration::minutes(10));
    for _ in 0..3 {
        engine.tick().await.unwrap();
    }

    generator.queue_verdict(common::success_verdict(100, None));
    assert!(matches!(
        engine.verify(b"jpg".to_vec(), "glass.jpg", "").await,
        Err(GameError::TimeRanOut)
    ));

    // The verifier never saw the proof.
    assert_eq!(generator.verdicts.lock().unwrap().len(), 1);
    let active = engine.active_quest().unwrap();
    assert!(active.is_failed());
    assert_eq!(active.result().unwrap().ai_comment, "Time ran out! You were too slow.");
    assert_eq!(engine.profile().current_xp, 0);
    assert_eq!(engine.profile().attributes.strength, 10);
    assert!(!engine.board().get("q-timed").unwrap().completed);
    assert!(engine.feed().is_empty());
    assert_eq!(
        sidequest::game::storage::load_profile(&store).unwrap().unwrap().current_xp,
        0
    );
}

#[tokio::test]
async fn proof_between_deadline_and_next_tick_is_too_late() {
    let generator = ScriptedGenerator::default();
    let (_store, clock, mut engine) = memory_engine(&generator).await;

    engine.accept_quest("q-timed").unwrap();
    clock.advance(Duration::seconds(125));

    generator.queue_verdict(common::success_verdict(100, None));
    let err = engine
        .begin_verification(b"jpg".to_vec(), "glass.jpg", "")
        .unwrap_err();
    assert!(matches!(err, GameError::TimeRanOut));
    assert_eq!(err.to_string(), "Time ran out! You were too slow.");
    assert!(engine.active_quest().unwrap().is_failed());
    assert!(!engine.scheduler().is_armed(TaskKind::QuestCountdown));

    // Resolved already; a second attempt is turned away as such.
    assert!(matches!(
        engine.verify(b"jpg".to_vec(), "glass.jpg", "").await,
        Err(GameError::QuestResolved)
    ));
    assert_eq!(engine.profile().current_xp, 0);
    assert_eq!(generator.verdicts.lock().unwrap().len(), 1);
}

fn live_events(engine: &common::TestEngine<MemoryStore>) -> usize {
    engine
        .board()
        .quests()
        .iter()
        .filter(|q| q.is_world_event() && !q.completed)
        .count()
}

#[tokio::test]
async fn at_most_one_world_event_is_live() {
    let generator = ScriptedGenerator::default();
    let clock = ManualClock::new(start_time());
    let mut engine = scripted_engine(MemoryStore::new(), &generator, &clock, true).await;

    clock.advance(Duration::seconds(180));
    let events = engine.tick().await.unwrap();
    let spawned = events
        .iter()
        .find_map(|e| match e {
            TickEvent::EventSpawned(q) => Some(q.clone()),
            _ => None,
        })
        .expect("event spawned");
    assert_eq!(spawned.quest_type, QuestType::WorldEvent);
    let expected_expiry = (start_time() + Duration::seconds(180) + Duration::minutes(15)).timestamp_millis();
    assert_eq!(spawned.expires_at, Some(expected_expiry));
    assert_eq!(live_events(&engine), 1);

    // Further spawn ticks are skipped without asking the generator.
    for _ in 0..3 {
        clock.advance(Duration::seconds(180));
        engine.tick().await.unwrap();
        assert_eq!(live_events(&engine), 1);
    }
    assert_eq!(generator.event_calls(), 1);
}

#[tokio::test]
async fn expired_events_are_swept_and_replaced() {
    let generator = ScriptedGenerator::default();
    let clock = ManualClock::new(start_time());
    let mut engine = scripted_engine(MemoryStore::new(), &generator, &clock, true).await;

    clock.advance(Duration::seconds(180));
    engine.tick().await.unwrap();
    assert!(engine.board().get("event-1").is_some());

    clock.advance(Duration::minutes(15) + Duration::seconds(1));
    let events = engine.tick().await.unwrap();
    assert!(events.contains(&TickEvent::EventsExpired(vec!["event-1".to_string()])));
    assert!(engine.board().get("event-1").is_none());
    assert!(engine.board().get("event-2").is_some());
    assert_eq!(live_events(&engine), 1);
}

#[tokio::test]
async fn losing_the_coin_flip_spawns_nothing() {
    let generator = ScriptedGenerator::default();
    let (_store, clock, mut engine) = memory_engine(&generator).await;
    clock.advance(Duration::seconds(180));
    let events = engine.tick().await.unwrap();
    assert!(events.is_empty());
    assert_eq!(generator.event_calls(), 0);
}

#[tokio::test]
async fn spawn_ticks_hand_generation_to_the_caller() {
    let generator = ScriptedGenerator::default();
    let clock = ManualClock::new(start_time());
    let mut engine = scripted_engine(MemoryStore::new(), &generator, &clock, true).await;

    clock.advance(Duration::seconds(180));
    let outcome = engine.poll_tick();
    let job = outcome.spawn.expect("spawn job");
    assert_eq!(generator.event_calls(), 0);

    // Nothing new is requested while that job is outstanding.
    clock.advance(Duration::seconds(180));
    assert!(engine.poll_tick().spawn.is_none());

    let event = job.run().await;
    assert_eq!(generator.event_calls(), 1);
    assert!(matches!(
        engine.offer_world_event(event),
        Some(TickEvent::EventSpawned(ref q)) if q.id == "event-1"
    ));
    assert_eq!(live_events(&engine), 1);
}

#[tokio::test]
async fn late_world_events_are_dropped_on_arrival() {
    let generator = ScriptedGenerator::default();
    let clock = ManualClock::new(start_time());
    let mut engine = scripted_engine(MemoryStore::new(), &generator, &clock, true).await;

    clock.advance(Duration::seconds(180));
    let job = engine.poll_tick().spawn.expect("spawn job");
    clock.advance(Duration::minutes(16));
    let event = job.run().await;
    assert!(engine.offer_world_event(event).is_none());
    assert_eq!(live_events(&engine), 0);

    // The in-flight guard is released, so the next spawn tick asks again.
    clock.advance(Duration::seconds(180));
    let job = engine.poll_tick().spawn.expect("second spawn job");
    let second = job.run().await;
    let duplicate = second.clone();
    assert!(engine.offer_world_event(second).is_some());
    assert!(engine.offer_world_event(duplicate).is_none());
    assert_eq!(live_events(&engine), 1);
}
