//! Sidequest game model: profile and quest types, sled-backed persistence,
//! progression rules, the quest board and the engine that ties them together.
//! The terminal front end lives in [`session`].

pub mod achievement;
pub mod auth;
pub mod clock;
pub mod engine;
pub mod errors;
pub mod generator;
pub mod progression;
pub mod quest;
pub mod scheduler;
pub mod session;
pub mod social;
pub mod storage;
pub mod types;

pub use achievement::{catalog_with_status, unlock_new, AchievementRule, ACHIEVEMENTS};
pub use auth::AuthService;
pub use clock::{Clock, FixedRandom, ManualClock, RandomSource, SystemClock, ThreadRandom};
pub use engine::{
    AbilityOutcome, EngineSettings, NarrativeDraft, NarrativeJob, ProfileEdit, ProgressionEngine,
    TickEvent, TickOutcome, VerificationOutcome, VerificationTicket, WorldEventJob,
};
pub use errors::{GameError, GeneratorError};
pub use generator::{Content, ContentGenerator, OfflineGenerator};
#[cfg(feature = "gemini")]
pub use generator::GeminiGenerator;
pub use progression::{apply_quest_reward, attribute_gain, AttributeGain, RewardSummary};
pub use quest::{fallback_daily_quests, fallback_world_event, ActiveQuest, QuestBoard, QuestPhase};
pub use scheduler::{Scheduler, SchedulerConfig, TaskKind};
pub use storage::{KeyValueStore, MemoryStore, SledStore};
pub use types::*;
