//! Gemini `generateContent` client.
//!
//! Every request asks for a JSON response; the reply text is stripped of any
//! markdown fence and decoded into a small wire struct, then mapped onto the
//! game types.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use chrono::{Local, Timelike, Utc};
use log::debug;
use rand::Rng;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::ContentGenerator;
use crate::game::errors::GeneratorError;
use crate::game::types::{
    Coordinates, Difficulty, DopamineCategory, LeaderboardEntry, LootDescriptor, LoreCategory,
    LoreEntry, NpcMessage, NpcSender, Quest, QuestType, Rarity, SocialPost, UserProfile,
    VerificationResult,
};
use crate::logutil::escape_log;

#[derive(Clone)]
pub struct GeminiGenerator {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
    timeout_secs: u64,
}

impl GeminiGenerator {
    pub fn new(endpoint: &str, model: &str, api_key: &str, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
            timeout_secs: timeout_secs.max(1),
        }
    }

    async fn generate_text(
        &self,
        parts: Vec<Value>,
        json_reply: bool,
        temperature: Option<f32>,
    ) -> Result<String, GeneratorError> {
        let mut generation_config = serde_json::Map::new();
        if json_reply {
            generation_config.insert("responseMimeType".into(), json!("application/json"));
        }
        if let Some(t) = temperature {
            generation_config.insert("temperature".into(), json!(t));
        }
        let body = GenerateRequest {
            contents: vec![RequestContent { parts }],
            generation_config: Value::Object(generation_config),
        };

        let url = format!("{}/models/{}:generateContent", self.endpoint, self.model);
        let send = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send();

        let response = tokio::time::timeout(Duration::from_secs(self.timeout_secs), send)
            .await
            .map_err(|_| GeneratorError::Timeout(self.timeout_secs))?
            .map_err(|e| GeneratorError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(GeneratorError::RequestFailed(format!(
                "{}: {}",
                status,
                escape_log(&error_text)
            )));
        }

        let reply: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GeneratorError::InvalidResponse(e.to_string()))?;
        let text = reply
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();
        debug!("gemini reply: {}", escape_log(&text));
        Ok(text)
    }

    async fn generate_json<T: DeserializeOwned>(
        &self,
        prompt: String,
        temperature: Option<f32>,
    ) -> Result<T, GeneratorError> {
        let text = self
            .generate_text(vec![json!({ "text": prompt })], true, temperature)
            .await?;
        Ok(serde_json::from_str(clean_json(&text))?)
    }
}

/// Strip a surrounding markdown code fence from a model reply.
pub fn clean_json(text: &str) -> &str {
    let mut cleaned = text.trim();
    for opener in ["```json", "```"] {
        if let Some(rest) = cleaned.strip_prefix(opener) {
            cleaned = rest.trim_start();
            break;
        }
    }
    if let Some(rest) = cleaned.strip_suffix("```") {
        cleaned = rest.trim_end();
    }
    cleaned
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<RequestContent>,
    generation_config: Value,
}

#[derive(Serialize)]
struct RequestContent {
    parts: Vec<Value>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuestWire {
    title: String,
    description: String,
    difficulty: Difficulty,
    xp_reward: u32,
    #[serde(rename = "type")]
    quest_type: QuestType,
    duration_minutes: Option<u32>,
    location_hint: Option<String>,
    dopamine_category: Option<DopamineCategory>,
}

impl QuestWire {
    fn into_quest(self, id: String) -> Quest {
        let mut quest = Quest::new(
            &id,
            &self.title,
            &self.description,
            self.difficulty,
            self.xp_reward,
            self.quest_type,
        );
        quest.duration_minutes = self.duration_minutes;
        quest.location_hint = self.location_hint;
        quest.dopamine_category = self.dopamine_category;
        quest
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorldEventWire {
    title: String,
    description: String,
    xp_reward: u32,
    x: i32,
    y: i32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostWire {
    author_name: String,
    #[serde(default)]
    author_avatar: String,
    #[serde(default)]
    author_title: String,
    quest_title: String,
    #[serde(default)]
    likes: u32,
}

#[derive(Deserialize)]
struct RivalWire {
    name: String,
    #[serde(default)]
    avatar: String,
    #[serde(default)]
    title: String,
    level: u32,
    xp: u32,
}

#[derive(Deserialize)]
struct LoreWire {
    title: String,
    content: String,
    subtitle: Option<String>,
    icon: Option<String>,
    tags: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct VerdictWire {
    #[serde(default)]
    success: bool,
    confidence_score: Option<u32>,
    sentiment: Option<String>,
    xp_awarded: Option<u32>,
    ai_comment: Option<String>,
    loot_name: Option<String>,
    loot_description: Option<String>,
    loot_rarity: Option<Rarity>,
}

impl VerdictWire {
    fn into_result(self) -> VerificationResult {
        let loot = self.success.then(|| LootDescriptor {
            name: self
                .loot_name
                .unwrap_or_else(|| "Unknown Artifact".to_string()),
            description: self
                .loot_description
                .unwrap_or_else(|| "An item shrouded in mystery.".to_string()),
            rarity: self.loot_rarity.unwrap_or_default(),
        });
        VerificationResult {
            success: self.success,
            xp_awarded: self.xp_awarded.unwrap_or(0),
            ai_comment: self
                .ai_comment
                .unwrap_or_else(|| "The mists of uncertainty cloud my vision...".to_string()),
            confidence_score: self.confidence_score.unwrap_or(50).min(100) as u8,
            sentiment: self.sentiment.unwrap_or_else(|| "Neutral".to_string()),
            creativity_score: None,
            detected_objects: None,
            loot,
        }
    }
}

fn time_of_day() -> &'static str {
    match Local::now().hour() {
        h if h < 12 => "Morning",
        h if h < 18 => "Afternoon",
        _ => "Evening",
    }
}

#[async_trait]
impl ContentGenerator for GeminiGenerator {
    async fn daily_quests(&self, profile: &UserProfile) -> Result<Vec<Quest>, GeneratorError> {
        let prompt = format!(
            "Generate 4 real-life RPG quests for a player with the class: {class}.\n\
             Context: It is currently {tod}. The player enjoys {pref} as rewards.\n\
             1. Easy quest (solo, quick, low anxiety).\n\
             2. Medium quest (creative).\n\
             3. Hard quest (social).\n\
             4. Special quest: one of \"timed\" (set durationMinutes to 1 or 2), \
             \"exploration\" (set locationHint) or \"collection\".\n\
             Quests must be physical real-world actions and must not require purchases.\n\
             Assign a dopamineCategory to each: Appetizer, Main, Side or Dessert.\n\
             Return a JSON array of objects with title, description, difficulty \
             (Easy|Medium|Hard), xpReward, type, durationMinutes, locationHint, dopamineCategory.",
            class = profile.player_class.as_str(),
            tod = time_of_day(),
            pref = profile.dopamine_preference,
        );
        let wires: Vec<QuestWire> = self.generate_json(prompt, Some(1.1)).await?;
        let stamp = Utc::now().timestamp_millis();
        Ok(wires
            .into_iter()
            .enumerate()
            .map(|(i, w)| w.into_quest(format!("quest-{}-{}", stamp, i)))
            .collect())
    }

    async fn oracle_quest(&self, context: &str) -> Result<Quest, GeneratorError> {
        let prompt = format!(
            "The user is asking the Oracle for a specific quest.\n\
             User context: \"{}\".\n\
             Generate 1 engaging, safe, real-world RPG quest that fits this context and can be \
             done immediately. Use type \"collection\" if it involves finding multiple items.\n\
             Return a JSON object with title, description, difficulty (Easy|Medium|Hard), \
             xpReward, type (solo|creative|social|collection) and dopamineCategory.",
            context
        );
        let wire: QuestWire = self.generate_json(prompt, Some(1.0)).await?;
        Ok(wire.into_quest(format!("oracle-{}", Utc::now().timestamp_millis())))
    }

    async fn world_event(&self) -> Result<Quest, GeneratorError> {
        let prompt = "Generate a \"World Event\" quest: a limited-time, high-stakes event for \
                      the game map. Themes: dimensional rifts, boss monsters, festivals, solar \
                      flares, glitches. The task is a fun but slightly absurd real-world action \
                      worth 300-500 XP. Return a JSON object with title, description, xpReward, \
                      x and y (map coordinates between 50 and 350)."
            .to_string();
        let wire: WorldEventWire = self.generate_json(prompt, Some(1.2)).await?;
        let mut quest = Quest::new(
            &format!("event-{}", Utc::now().timestamp_millis()),
            &wire.title,
            &wire.description,
            Difficulty::Event,
            wire.xp_reward,
            QuestType::WorldEvent,
        );
        quest.coordinates = Some(Coordinates {
            x: wire.x.clamp(50, 350),
            y: wire.y.clamp(50, 350),
        });
        Ok(quest)
    }

    async fn social_feed(&self) -> Result<Vec<SocialPost>, GeneratorError> {
        let prompt = "Generate 5 fictional social media posts for an RPG app where users \
                      complete quests like \"Clean the desk\", \"Walk 1 mile\", \"Drink water\". \
                      Use fantasy-themed names and titles. Return a JSON array of objects with \
                      authorName, authorAvatar (single emoji), authorTitle, questTitle, likes."
            .to_string();
        let wires: Vec<PostWire> = self.generate_json(prompt, None).await?;
        let stamp = Utc::now().timestamp_millis();
        let mut rng = rand::thread_rng();
        Ok(wires
            .into_iter()
            .enumerate()
            .map(|(i, w)| SocialPost {
                id: format!("post-gen-{}-{}", stamp, i),
                author_name: w.author_name,
                author_avatar: w.author_avatar,
                author_title: w.author_title,
                quest_title: w.quest_title,
                image: None,
                likes: w.likes,
                timestamp: format!("{}m ago", rng.gen_range(1..=50)),
                is_user: false,
            })
            .collect())
    }

    async fn leaderboard(&self, level: u32) -> Result<Vec<LeaderboardEntry>, GeneratorError> {
        let prompt = format!(
            "Generate 4 fictional leaderboard rivals whose levels are close to {} (some slightly \
             higher, some lower). Fantasy names. Return a JSON array of objects with name, \
             avatar (single emoji), title, level, xp.",
            level
        );
        let wires: Vec<RivalWire> = self.generate_json(prompt, None).await?;
        Ok(wires
            .into_iter()
            .enumerate()
            .map(|(i, w)| LeaderboardEntry {
                id: format!("rival-{}", i),
                name: w.name,
                avatar: w.avatar,
                level: w.level,
                xp: w.xp,
                title: w.title,
                is_user: false,
            })
            .collect())
    }

    async fn daily_narrative(
        &self,
        profile: &UserProfile,
        quests: &[Quest],
    ) -> Result<String, GeneratorError> {
        let list = quests
            .iter()
            .map(|q| format!("- {} ({})", q.title, q.quest_type.as_str()))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = format!(
            "The user is a level {} {} named {} in a modern-fantasy RPG.\n\
             They have just received these quests for the day:\n{}\n\
             Write a short, cinematic \"Main Character\" opening narration (max 60 words) \
             setting the scene for their day. Frame the mundane tasks as epic hero's work. \
             Use the second person. Style: {}.",
            profile.level,
            profile.player_class.as_str(),
            profile.name,
            list,
            profile.narrative_mode.as_str(),
        );
        self.generate_text(vec![json!({ "text": prompt })], false, None)
            .await
    }

    async fn lore_entry(&self, category: LoreCategory) -> Result<LoreEntry, GeneratorError> {
        let context = match category {
            LoreCategory::Bestiary => {
                "Generate a unique RPG monster living in a modern-fantasy setting (data ghouls, \
                 asphalt elementals, coffee shop mimics). Describe its appearance and behavior. \
                 The subtitle is its threat level."
            }
            LoreCategory::History => {
                "Generate a historical timeline event for a world where magic mysteriously \
                 returned to modern earth 50 years ago. The subtitle is the year or date."
            }
            LoreCategory::Library => {
                "Generate a short in-universe lore snippet, found document or myth from a \
                 character in this world. The subtitle is the author or source."
            }
        };
        let prompt = format!(
            "{}\nReturn a JSON object with title, content, subtitle, icon (single emoji), tags.",
            context
        );
        let wire: LoreWire = self.generate_json(prompt, Some(1.2)).await?;
        let now = Utc::now();
        Ok(LoreEntry {
            id: format!("lore-{}", now.timestamp_millis()),
            category,
            title: wire.title,
            content: wire.content,
            subtitle: wire.subtitle,
            icon: wire.icon,
            tags: Some(wire.tags.unwrap_or_default()),
            unlocked_at: now,
        })
    }

    async fn verify_submission(
        &self,
        quest: &Quest,
        image: &[u8],
        caption: &str,
    ) -> Result<VerificationResult, GeneratorError> {
        let specific = match quest.quest_type {
            QuestType::Exploration => quest
                .location_hint
                .as_deref()
                .map(|hint| {
                    format!(
                        "CRITICAL: The user MUST be at a location that matches: \"{}\". \
                         Look for background clues.",
                        hint
                    )
                })
                .unwrap_or_default(),
            QuestType::Timed => {
                "Note: This was a timed quest. Ensure the image proves the action was done."
                    .to_string()
            }
            QuestType::Collection => "Note: This is a collection quest. The image should show \
                                      multiple items matching the description."
                .to_string(),
            _ => String::new(),
        };
        let report = if caption.trim().is_empty() {
            "No report provided."
        } else {
            caption
        };
        let prompt = format!(
            "You are a Dungeon Master verifying a player's proof for the quest \"{}\".\n\
             Quest description: \"{}\". Quest type: {}.\n\
             User mission report: \"{}\"\n{}\n\
             1. Visual check: assign a confidence score (0-100).\n\
             2. Sentiment: one word describing the player's mood.\n\
             3. Verdict: if confidence < 60, fail the quest.\n\
             4. Commentary: a witty RPG response referencing the report and the image.\n\
             5. Loot: an item based on the image contents.\n\
             Return a JSON object with success, confidence_score, sentiment, xp_awarded, \
             ai_comment, loot_name, loot_description, loot_rarity (Common|Rare|Epic|Legendary).",
            quest.title,
            quest.description,
            quest.quest_type.as_str(),
            report,
            specific
        );
        let encoded = base64::engine::general_purpose::STANDARD.encode(image);
        let parts = vec![
            json!({ "inline_data": { "mime_type": "image/jpeg", "data": encoded } }),
            json!({ "text": prompt }),
        ];
        let text = self.generate_text(parts, true, None).await?;
        let wire: VerdictWire = serde_json::from_str(clean_json(&text))?;
        Ok(wire.into_result())
    }

    async fn chat_with_npc(
        &self,
        npc_name: &str,
        message: &str,
        history: &[NpcMessage],
    ) -> Result<String, GeneratorError> {
        let transcript = history
            .iter()
            .map(|m| {
                let who = match m.sender {
                    NpcSender::User => "user",
                    NpcSender::Npc => "npc",
                };
                format!("{}: {}", who, m.text)
            })
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = format!(
            "You are playing {name}, tavern keeper and guide in a real-life RPG app called \
             \"Sidequest\". Tone: friendly, rustic, encouraging, occasionally sarcastic; use \
             fantasy metaphors for real life.\n\
             Conversation so far:\n{transcript}\nUser: {message}\n\
             Respond as {name} in under 50 words.",
            name = npc_name,
            transcript = transcript,
            message = message,
        );
        self.generate_text(vec![json!({ "text": prompt })], false, None)
            .await
    }
}
