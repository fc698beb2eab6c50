//! Generator used when no service is configured. Every call fails, which makes
//! [`super::Content`] serve its built-in defaults.

use async_trait::async_trait;

use super::ContentGenerator;
use crate::game::errors::GeneratorError;
use crate::game::types::{
    LeaderboardEntry, LoreCategory, LoreEntry, NpcMessage, Quest, SocialPost, UserProfile,
    VerificationResult,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineGenerator;

#[async_trait]
impl ContentGenerator for OfflineGenerator {
    async fn daily_quests(&self, _profile: &UserProfile) -> Result<Vec<Quest>, GeneratorError> {
        Err(GeneratorError::Disabled)
    }

    async fn oracle_quest(&self, _context: &str) -> Result<Quest, GeneratorError> {
        Err(GeneratorError::Disabled)
    }

    async fn world_event(&self) -> Result<Quest, GeneratorError> {
        Err(GeneratorError::Disabled)
    }

    async fn social_feed(&self) -> Result<Vec<SocialPost>, GeneratorError> {
        Err(GeneratorError::Disabled)
    }

    async fn leaderboard(&self, _level: u32) -> Result<Vec<LeaderboardEntry>, GeneratorError> {
        Err(GeneratorError::Disabled)
    }

    async fn daily_narrative(
        &self,
        _profile: &UserProfile,
        _quests: &[Quest],
    ) -> Result<String, GeneratorError> {
        Err(GeneratorError::Disabled)
    }

    async fn lore_entry(&self, _category: LoreCategory) -> Result<LoreEntry, GeneratorError> {
        Err(GeneratorError::Disabled)
    }

    async fn verify_submission(
        &self,
        _quest: &Quest,
        _image: &[u8],
        _caption: &str,
    ) -> Result<VerificationResult, GeneratorError> {
        Err(GeneratorError::Disabled)
    }

    async fn chat_with_npc(
        &self,
        _npc_name: &str,
        _message: &str,
        _history: &[NpcMessage],
    ) -> Result<String, GeneratorError> {
        Err(GeneratorError::Disabled)
    }
}
