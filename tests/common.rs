//! Test utilities & fixtures.
//! A scripted content generator, a fixed start time and engine builders over
//! in-memory and temp-dir sled stores.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use sidequest::game::{
    Content, ContentGenerator, Difficulty, EngineSettings, FixedRandom, GeneratorError,
    KeyValueStore, LeaderboardEntry, LootDescriptor, LoreCategory, LoreEntry, ManualClock,
    MemoryStore, NpcMessage, ProgressionEngine, Quest, QuestType, Rarity, SledStore, SocialPost,
    UserProfile, VerificationResult,
};

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 1, 10, 0, 0).unwrap()
}

/// Board served by [`ScriptedGenerator`]: one quest per interesting type.
pub fn scripted_quests() -> Vec<Quest> {
    vec![
        Quest::new("q-solo", "Walk around the block", "Fresh air.", Difficulty::Easy, 50, QuestType::Solo),
        Quest::new("q-creative", "Sketch a mug", "Any mug.", Difficulty::Medium, 150, QuestType::Creative),
        Quest::new("q-timed", "Drink water", "Quickly.", Difficulty::Easy, 100, QuestType::Timed)
            .with_duration_minutes(2),
    ]
}

pub fn success_verdict(xp: u32, loot: Option<LootDescriptor>) -> VerificationResult {
    VerificationResult {
        success: true,
        xp_awarded: xp,
        ai_comment: "A worthy deed.".to_string(),
        confidence_score: 90,
        sentiment: "Impressed".to_string(),
        creativity_score: None,
        detected_objects: Some(vec!["shoe".to_string()]),
        loot,
    }
}

pub fn trinket() -> LootDescriptor {
    LootDescriptor {
        name: "Pebble of Persistence".to_string(),
        description: "It was on the path.".to_string(),
        rarity: Rarity::Rare,
    }
}

/// Generator whose answers are set by the test. Every verification returns the
/// queued verdict (or a failure if none is queued).
#[derive(Clone, Default)]
pub struct ScriptedGenerator {
    pub verdicts: Arc<Mutex<Vec<VerificationResult>>>,
    pub oracle_calls: Arc<Mutex<u32>>,
    pub event_calls: Arc<Mutex<u32>>,
}

impl ScriptedGenerator {
    pub fn queue_verdict(&self, verdict: VerificationResult) {
        self.verdicts.lock().unwrap().push(verdict);
    }

    pub fn event_calls(&self) -> u32 {
        *self.event_calls.lock().unwrap()
    }
}

#[async_trait]
impl ContentGenerator for ScriptedGenerator {
    async fn daily_quests(&self, _profile: &UserProfile) -> Result<Vec<Quest>, GeneratorError> {
        Ok(scripted_quests())
    }

    async fn oracle_quest(&self, context: &str) -> Result<Quest, GeneratorError> {
        *self.oracle_calls.lock().unwrap() += 1;
        Ok(Quest::new(
            "oracle-1",
            &format!("Answer to {}", context),
            "The Oracle has spoken.",
            Difficulty::Medium,
            120,
            QuestType::Exploration,
        ))
    }

    async fn world_event(&self) -> Result<Quest, GeneratorError> {
        let mut calls = self.event_calls.lock().unwrap();
        *calls += 1;
        Ok(Quest::new(
            &format!("event-{}", calls),
            "Dragon sighting",
            "Look up.",
            Difficulty::Hard,
            400,
            QuestType::Solo,
        ))
    }

    async fn social_feed(&self) -> Result<Vec<SocialPost>, GeneratorError> {
        Ok(Vec::new())
    }

    async fn leaderboard(&self, level: u32) -> Result<Vec<LeaderboardEntry>, GeneratorError> {
        Ok(vec![LeaderboardEntry {
            id: "rival-1".to_string(),
            name: "Lady Brisk".to_string(),
            avatar: "🧝".to_string(),
            level: level + 1,
            xp: 120,
            title: "Trailblazer".to_string(),
            is_user: false,
        }])
    }

    async fn daily_narrative(
        &self,
        profile: &UserProfile,
        _quests: &[Quest],
    ) -> Result<String, GeneratorError> {
        Ok(format!("{} wakes to a bright morning.", profile.name))
    }

    async fn lore_entry(&self, category: LoreCategory) -> Result<LoreEntry, GeneratorError> {
        Ok(LoreEntry {
            id: "lore-1".to_string(),
            category,
            title: "The Humble Kettle".to_string(),
            content: "It boils.".to_string(),
            subtitle: None,
            icon: None,
            tags: None,
            unlocked_at: start_time(),
        })
    }

    async fn verify_submission(
        &self,
        _quest: &Quest,
        _image: &[u8],
        _caption: &str,
    ) -> Result<VerificationResult, GeneratorError> {
        let mut queue = self.verdicts.lock().unwrap();
        if queue.is_empty() {
            Ok(VerificationResult::failure("I see only shadows.", "Skeptical"))
        } else {
            Ok(queue.remove(0))
        }
    }

    async fn chat_with_npc(
        &self,
        _npc_name: &str,
        message: &str,
        _history: &[NpcMessage],
    ) -> Result<String, GeneratorError> {
        Ok(format!("You said: {}", message))
    }
}

pub type TestEngine<S> = ProgressionEngine<S, ManualClock, FixedRandom>;

pub async fn scripted_engine<S>(
    store: S,
    generator: &ScriptedGenerator,
    clock: &ManualClock,
    spawn: bool,
) -> TestEngine<S>
where
    S: KeyValueStore + Clone,
{
    ProgressionEngine::bootstrap(
        store,
        Content::new(Arc::new(generator.clone())),
        clock.clone(),
        FixedRandom(spawn),
        EngineSettings::default(),
    )
    .await
    .unwrap()
}

pub async fn memory_engine(generator: &ScriptedGenerator) -> (MemoryStore, ManualClock, TestEngine<MemoryStore>) {
    let store = MemoryStore::new();
    let clock = ManualClock::new(start_time());
    let engine = scripted_engine(store.clone(), generator, &clock, false).await;
    (store, clock, engine)
}

/// Sled store in a fresh temp dir. Keep the `TempDir` alive for the test's duration.
pub fn temp_sled() -> (tempfile::TempDir, SledStore) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = SledStore::open(dir.path().join("db")).expect("open sled");
    (dir, store)
}
