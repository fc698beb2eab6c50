//! Content generation port and the fallback layer around it.
//!
//! [`ContentGenerator`] is the raw collaborator: every call may fail.
//! [`Content`] wraps a generator and turns each failure into the typed default
//! the engine relies on, so only the Oracle ever surfaces an error.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, warn};

use crate::game::errors::{GameError, GeneratorError};
use crate::game::quest::{fallback_daily_quests, fallback_world_event};
use crate::game::types::{
    Difficulty, DopamineCategory, LeaderboardEntry, LoreCategory, LoreEntry, NpcMessage, Quest,
    QuestLocation, QuestType, SocialPost, UserProfile, VerificationResult,
};
use crate::logutil::escape_log;

pub mod offline;
#[cfg(feature = "gemini")]
pub mod gemini;

pub use offline::OfflineGenerator;
#[cfg(feature = "gemini")]
pub use gemini::GeminiGenerator;

pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-3-flash-preview";

/// Number of past tavern messages handed to the NPC model.
pub const NPC_HISTORY_LIMIT: usize = 5;

pub const FALLBACK_NARRATIVE: &str = "The digital wind howls. It is time to begin.";
pub const FALLBACK_VERIFY_COMMENT: &str = "My vision is clouded. Try submitting again.";
pub const FALLBACK_NPC_LINE: &str = "I'm polishing a glass right now, come back later.";

/// External generative service. Implementations do not need to apply defaults;
/// [`Content`] normalizes whatever comes back.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn daily_quests(&self, profile: &UserProfile) -> Result<Vec<Quest>, GeneratorError>;

    async fn oracle_quest(&self, context: &str) -> Result<Quest, GeneratorError>;

    async fn world_event(&self) -> Result<Quest, GeneratorError>;

    async fn social_feed(&self) -> Result<Vec<SocialPost>, GeneratorError>;

    async fn leaderboard(&self, level: u32) -> Result<Vec<LeaderboardEntry>, GeneratorError>;

    async fn daily_narrative(
        &self,
        profile: &UserProfile,
        quests: &[Quest],
    ) -> Result<String, GeneratorError>;

    async fn lore_entry(&self, category: LoreCategory) -> Result<LoreEntry, GeneratorError>;

    async fn verify_submission(
        &self,
        quest: &Quest,
        image: &[u8],
        caption: &str,
    ) -> Result<VerificationResult, GeneratorError>;

    async fn chat_with_npc(
        &self,
        npc_name: &str,
        message: &str,
        history: &[NpcMessage],
    ) -> Result<String, GeneratorError>;
}

/// Generator plus fallbacks. Cheap to clone so background jobs can own one.
#[derive(Clone)]
pub struct Content {
    generator: Arc<dyn ContentGenerator>,
}

impl Content {
    pub fn new(generator: Arc<dyn ContentGenerator>) -> Self {
        Self { generator }
    }

    pub fn offline() -> Self {
        Self::new(Arc::new(OfflineGenerator))
    }

    /// Today's board. Never empty: failures and empty batches fall back to the built-in set.
    pub async fn daily_quests(&self, profile: &UserProfile) -> Vec<Quest> {
        match self.generator.daily_quests(profile).await {
            Ok(quests) if !quests.is_empty() => quests.into_iter().map(normalize_quest).collect(),
            Ok(_) => {
                warn!("quest generation returned an empty batch; using built-in quests");
                fallback_daily_quests()
            }
            Err(e) => {
                warn!("quest generation failed: {}; using built-in quests", e);
                fallback_daily_quests()
            }
        }
    }

    /// Ad-hoc quest from the Oracle. The only generator failure the player sees.
    pub async fn oracle_quest(&self, context: &str) -> Result<Quest, GameError> {
        match self.generator.oracle_quest(context).await {
            Ok(quest) => {
                let mut quest = normalize_quest(quest);
                if quest.dopamine_category.is_none() {
                    quest.dopamine_category = Some(DopamineCategory::Dessert);
                }
                Ok(quest)
            }
            Err(e) => {
                warn!("oracle request '{}' failed: {}", escape_log(context), e);
                Err(GameError::OracleConfused)
            }
        }
    }

    /// A world event expiring `lifetime_minutes` after `now`.
    pub async fn world_event(&self, now: DateTime<Utc>, lifetime_minutes: u32) -> Quest {
        let now_ms = now.timestamp_millis();
        match self.generator.world_event().await {
            Ok(mut event) => {
                event.quest_type = QuestType::WorldEvent;
                event.difficulty = Difficulty::Event;
                event.completed = false;
                event.location = Some(QuestLocation::Event);
                event.expires_at = Some(now_ms + i64::from(lifetime_minutes) * 60_000);
                if event.dopamine_category.is_none() {
                    event.dopamine_category = Some(DopamineCategory::Main);
                }
                event
            }
            Err(e) => {
                warn!("world event generation failed: {}; spawning built-in event", e);
                fallback_world_event(now_ms, lifetime_minutes)
            }
        }
    }

    pub async fn social_feed(&self) -> Vec<SocialPost> {
        self.generator.social_feed().await.unwrap_or_else(|e| {
            warn!("social feed unavailable: {}", e);
            Vec::new()
        })
    }

    pub async fn leaderboard(&self, level: u32) -> Vec<LeaderboardEntry> {
        self.generator.leaderboard(level).await.unwrap_or_else(|e| {
            warn!("leaderboard unavailable: {}", e);
            Vec::new()
        })
    }

    pub async fn daily_narrative(&self, profile: &UserProfile, quests: &[Quest]) -> String {
        match self.generator.daily_narrative(profile, quests).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => FALLBACK_NARRATIVE.to_string(),
            Err(e) => {
                warn!("narrative generation failed: {}", e);
                FALLBACK_NARRATIVE.to_string()
            }
        }
    }

    /// A lore entry for `category`. Failures still produce an entry so the
    /// research attempt leaves a trace in the archive.
    pub async fn lore_entry(&self, category: LoreCategory, now: DateTime<Utc>) -> LoreEntry {
        match self.generator.lore_entry(category).await {
            Ok(mut entry) => {
                entry.category = category;
                entry.unlocked_at = now;
                if entry.icon.is_none() {
                    entry.icon = Some("📜".to_string());
                }
                entry
            }
            Err(e) => {
                warn!("lore generation for {} failed: {}", category.as_str(), e);
                corrupted_lore(category, now)
            }
        }
    }

    pub async fn verify_submission(
        &self,
        quest: &Quest,
        image: &[u8],
        caption: &str,
    ) -> VerificationResult {
        match self.generator.verify_submission(quest, image, caption).await {
            Ok(mut result) => {
                result.confidence_score = result.confidence_score.min(100);
                if !result.success {
                    result.xp_awarded = 0;
                    result.loot = None;
                }
                debug!(
                    "verifier judged '{}': success={} confidence={}",
                    escape_log(&quest.title),
                    result.success,
                    result.confidence_score
                );
                result
            }
            Err(e) => {
                warn!("verification of '{}' failed: {}", escape_log(&quest.title), e);
                VerificationResult::failure(FALLBACK_VERIFY_COMMENT, "Error")
            }
        }
    }

    /// One reply from the tavern keeper. Only the last few messages are sent along.
    pub async fn chat_with_npc(&self, npc_name: &str, message: &str, history: &[NpcMessage]) -> String {
        let start = history.len().saturating_sub(NPC_HISTORY_LIMIT);
        match self
            .generator
            .chat_with_npc(npc_name, message, &history[start..])
            .await
        {
            Ok(reply) if !reply.trim().is_empty() => reply.trim().to_string(),
            Ok(_) => FALLBACK_NPC_LINE.to_string(),
            Err(e) => {
                warn!("{} is unavailable: {}", npc_name, e);
                FALLBACK_NPC_LINE.to_string()
            }
        }
    }
}

/// Placeholder archived when lore generation fails.
pub fn corrupted_lore(category: LoreCategory, now: DateTime<Utc>) -> LoreEntry {
    LoreEntry {
        id: format!("lore-fail-{}", now.timestamp_millis()),
        category,
        title: "Corrupted Data".to_string(),
        content: "The archives are fragmented...".to_string(),
        subtitle: None,
        icon: Some("🚫".to_string()),
        tags: None,
        unlocked_at: now,
    }
}

/// Fill in defaults a generated quest may leave out.
fn normalize_quest(mut quest: Quest) -> Quest {
    quest.completed = false;
    if quest.location.is_none() {
        quest.location = Some(QuestLocation::for_type(quest.quest_type));
    }
    if quest.dopamine_category.is_none() {
        quest.dopamine_category = Some(DopamineCategory::Side);
    }
    quest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::types::NpcSender;
    use chrono::TimeZone;
    use std::sync::Mutex;

    /// Records the history length it was handed and echoes the message.
    #[derive(Default)]
    struct EchoNpc {
        seen_history: Mutex<Option<usize>>,
    }

    #[async_trait]
    impl ContentGenerator for EchoNpc {
        async fn daily_quests(&self, _: &UserProfile) -> Result<Vec<Quest>, GeneratorError> {
            Ok(vec![Quest::new("q", "Walk", "Walk", Difficulty::Easy, 10, QuestType::Social)])
        }
        async fn oracle_quest(&self, _: &str) -> Result<Quest, GeneratorError> {
            Err(GeneratorError::Disabled)
        }
        async fn world_event(&self) -> Result<Quest, GeneratorError> {
            Ok(Quest::new("ev", "Rift", "Close", Difficulty::Hard, 300, QuestType::Solo))
        }
        async fn social_feed(&self) -> Result<Vec<SocialPost>, GeneratorError> {
            Err(GeneratorError::Timeout(5))
        }
        async fn leaderboard(&self, _: u32) -> Result<Vec<LeaderboardEntry>, GeneratorError> {
            Ok(Vec::new())
        }
        async fn daily_narrative(&self, _: &UserProfile, _: &[Quest]) -> Result<String, GeneratorError> {
            Ok("   ".to_string())
        }
        async fn lore_entry(&self, _: LoreCategory) -> Result<LoreEntry, GeneratorError> {
            Err(GeneratorError::RequestFailed("503".into()))
        }
        async fn verify_submission(
            &self,
            _: &Quest,
            _: &[u8],
            _: &str,
        ) -> Result<VerificationResult, GeneratorError> {
            let mut r = VerificationResult::failure("Nope", "Bored");
            r.xp_awarded = 40;
            Ok(r)
        }
        async fn chat_with_npc(
            &self,
            _: &str,
            message: &str,
            history: &[NpcMessage],
        ) -> Result<String, GeneratorError> {
            if let Ok(mut seen) = self.seen_history.lock() {
                *seen = Some(history.len());
            }
            Ok(format!("You said {message}"))
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 1, 9, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn offline_content_uses_every_fallback() {
        let content = Content::offline();
        let profile = UserProfile::new("u", "Tester", now());

        assert_eq!(content.daily_quests(&profile).await, fallback_daily_quests());
        assert!(matches!(
            content.oracle_quest("bored").await,
            Err(GameError::OracleConfused)
        ));
        assert_eq!(content.world_event(now(), 15).await.title, "Golden Slime Invasion");
        assert!(content.social_feed().await.is_empty());
        assert!(content.leaderboard(3).await.is_empty());
        assert_eq!(content.daily_narrative(&profile, &[]).await, FALLBACK_NARRATIVE);

        let lore = content.lore_entry(LoreCategory::Bestiary, now()).await;
        assert_eq!(lore.title, "Corrupted Data");
        assert_eq!(lore.category, LoreCategory::Bestiary);

        let quest = Quest::new("q", "Walk", "Walk", Difficulty::Easy, 10, QuestType::Solo);
        let verdict = content.verify_submission(&quest, b"img", "").await;
        assert!(!verdict.success);
        assert_eq!(verdict.xp_awarded, 0);
        assert_eq!(verdict.confidence_score, 0);
        assert_eq!(verdict.ai_comment, FALLBACK_VERIFY_COMMENT);

        assert_eq!(content.chat_with_npc("Garrick", "hi", &[]).await, FALLBACK_NPC_LINE);
    }

    #[tokio::test]
    async fn generated_content_is_normalized() {
        let content = Content::new(Arc::new(EchoNpc::default()));
        let profile = UserProfile::new("u", "Tester", now());

        let quests = content.daily_quests(&profile).await;
        assert_eq!(quests[0].location, Some(QuestLocation::City));
        assert_eq!(quests[0].dopamine_category, Some(DopamineCategory::Side));

        let event = content.world_event(now(), 15).await;
        assert_eq!(event.quest_type, QuestType::WorldEvent);
        assert_eq!(event.expires_at, Some(now().timestamp_millis() + 15 * 60_000));

        assert_eq!(content.daily_narrative(&profile, &quests).await, FALLBACK_NARRATIVE);

        let failed = content.verify_submission(&quests[0], b"img", "").await;
        assert_eq!(failed.xp_awarded, 0, "failed verdicts never award XP");
    }

    #[tokio::test]
    async fn npc_history_is_capped() {
        let npc = Arc::new(EchoNpc::default());
        let content = Content::new(npc.clone());
        let history: Vec<NpcMessage> = (0..8)
            .map(|i| NpcMessage::new(&i.to_string(), NpcSender::User, "hello"))
            .collect();
        let reply = content.chat_with_npc("Garrick", "ale?", &history).await;
        assert_eq!(reply, "You said ale?");
        assert_eq!(*npc.seen_history.lock().unwrap(), Some(NPC_HISTORY_LIMIT));
    }
}
