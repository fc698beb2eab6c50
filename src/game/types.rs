use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const PROFILE_SCHEMA_VERSION: u8 = 1;

/// XP threshold a fresh profile needs to reach level 2.
pub const STARTING_NEXT_LEVEL_XP: u32 = 500;

/// Baseline for every attribute before class bonuses.
pub const BASE_ATTRIBUTE: u32 = 10;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PlayerClass {
    Bard,
    Ranger,
    Rogue,
    Paladin,
}

impl PlayerClass {
    pub const ALL: [PlayerClass; 4] = [
        PlayerClass::Bard,
        PlayerClass::Ranger,
        PlayerClass::Rogue,
        PlayerClass::Paladin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerClass::Bard => "Bard",
            PlayerClass::Ranger => "Ranger",
            PlayerClass::Rogue => "Rogue",
            PlayerClass::Paladin => "Paladin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|class| class.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

/// Narration genre chosen during onboarding.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NarrativeMode {
    Cyberpunk,
    #[serde(rename = "High Fantasy")]
    HighFantasy,
    #[serde(rename = "Modern Thriller")]
    ModernThriller,
    #[serde(rename = "Cozy Solarpunk")]
    CozySolarpunk,
}

impl NarrativeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            NarrativeMode::Cyberpunk => "Cyberpunk",
            NarrativeMode::HighFantasy => "High Fantasy",
            NarrativeMode::ModernThriller => "Modern Thriller",
            NarrativeMode::CozySolarpunk => "Cozy Solarpunk",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let needle = s.trim().to_ascii_lowercase().replace(['-', '_'], " ");
        [
            NarrativeMode::Cyberpunk,
            NarrativeMode::HighFantasy,
            NarrativeMode::ModernThriller,
            NarrativeMode::CozySolarpunk,
        ]
        .into_iter()
        .find(|mode| mode.as_str().to_ascii_lowercase() == needle)
    }
}

impl Default for NarrativeMode {
    fn default() -> Self {
        NarrativeMode::Cyberpunk
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    #[serde(rename = "World Event")]
    Event,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum QuestType {
    Solo,
    Creative,
    Social,
    WorldEvent,
    Timed,
    Exploration,
    Collection,
}

impl QuestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestType::Solo => "solo",
            QuestType::Creative => "creative",
            QuestType::Social => "social",
            QuestType::WorldEvent => "world-event",
            QuestType::Timed => "timed",
            QuestType::Exploration => "exploration",
            QuestType::Collection => "collection",
        }
    }
}

/// Map region a quest is pinned to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QuestLocation {
    Wilds,
    City,
    Tower,
    Event,
}

impl QuestLocation {
    /// Default map region for quests the generator did not place.
    pub fn for_type(quest_type: QuestType) -> Self {
        match quest_type {
            QuestType::Social | QuestType::Exploration => QuestLocation::City,
            QuestType::Creative => QuestLocation::Tower,
            QuestType::WorldEvent => QuestLocation::Event,
            QuestType::Solo | QuestType::Timed | QuestType::Collection => QuestLocation::Wilds,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Coordinates {
    pub x: i32,
    pub y: i32,
}

/// Motivational framing used by the dopamine menu, independent of difficulty.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DopamineCategory {
    Appetizer,
    Main,
    Side,
    Dessert,
}

impl DopamineCategory {
    pub const MENU_ORDER: [DopamineCategory; 4] = [
        DopamineCategory::Appetizer,
        DopamineCategory::Main,
        DopamineCategory::Side,
        DopamineCategory::Dessert,
    ];

    pub fn heading(&self) -> &'static str {
        match self {
            DopamineCategory::Appetizer => "Appetizers - quick wins & low friction",
            DopamineCategory::Main => "Main Course - deep focus & big gains",
            DopamineCategory::Side => "Side Dishes - necessary maintenance",
            DopamineCategory::Dessert => "Dessert - treats & rewards",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Quest {
    pub id: String,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub xp_reward: u32,
    #[serde(rename = "type")]
    pub quest_type: QuestType,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<QuestLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    /// Epoch milliseconds. Deadline for world events, or end time of an accepted timed quest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dopamine_category: Option<DopamineCategory>,
}

impl Quest {
    pub fn new(
        id: &str,
        title: &str,
        description: &str,
        difficulty: Difficulty,
        xp_reward: u32,
        quest_type: QuestType,
    ) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            difficulty,
            xp_reward,
            quest_type,
            completed: false,
            location: None,
            coordinates: None,
            expires_at: None,
            duration_minutes: None,
            location_hint: None,
            dopamine_category: None,
        }
    }

    pub fn with_location(mut self, location: QuestLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_coordinates(mut self, x: i32, y: i32) -> Self {
        self.coordinates = Some(Coordinates { x, y });
        self
    }

    pub fn with_expires_at(mut self, expires_at_ms: i64) -> Self {
        self.expires_at = Some(expires_at_ms);
        self
    }

    pub fn with_duration_minutes(mut self, minutes: u32) -> Self {
        self.duration_minutes = Some(minutes);
        self
    }

    pub fn with_dopamine_category(mut self, category: DopamineCategory) -> Self {
        self.dopamine_category = Some(category);
        self
    }

    pub fn is_world_event(&self) -> bool {
        self.quest_type == QuestType::WorldEvent
    }

    /// True for an uncompleted world event whose deadline is behind `now_ms`.
    pub fn is_expired_event(&self, now_ms: i64) -> bool {
        self.is_world_event()
            && !self.completed
            && self.expires_at.map(|at| now_ms > at).unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl Default for Rarity {
    fn default() -> Self {
        Rarity::Common
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LootItem {
    pub id: String,
    pub name: String,
    pub description: String,
    pub rarity: Rarity,
    /// Reference to the proof photo the item was minted from.
    pub image: String,
    pub date_earned: DateTime<Utc>,
}

/// Loot metadata supplied by the verifier; id, image and date are filled in locally.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LootDescriptor {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub rarity: Rarity,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Attributes {
    pub strength: u32,
    pub intellect: u32,
    pub charisma: u32,
}

impl Attributes {
    pub fn baseline() -> Self {
        Self {
            strength: BASE_ATTRIBUTE,
            intellect: BASE_ATTRIBUTE,
            charisma: BASE_ATTRIBUTE,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LoreCategory {
    Bestiary,
    History,
    Library,
}

impl LoreCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoreCategory::Bestiary => "bestiary",
            LoreCategory::History => "history",
            LoreCategory::Library => "library",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bestiary" | "beasts" => Some(LoreCategory::Bestiary),
            "history" => Some(LoreCategory::History),
            "library" | "books" => Some(LoreCategory::Library),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoreEntry {
    pub id: String,
    pub category: LoreCategory,
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    pub unlocked_at: DateTime<Utc>,
}

/// The durable player state. One instance is active per session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub name: String,
    pub avatar: String,
    pub avatar_color: String,
    pub title: String,
    pub level: u32,
    #[serde(rename = "currentXP")]
    pub current_xp: u32,
    #[serde(rename = "nextLevelXP")]
    pub next_level_xp: u32,
    pub player_class: PlayerClass,
    pub streak: u32,
    pub last_login: DateTime<Utc>,
    pub completed_quests: u32,
    pub attributes: Attributes,
    #[serde(default)]
    pub inventory: Vec<LootItem>,
    #[serde(default)]
    pub achievements: Vec<String>,
    /// Epoch milliseconds after which the reroll ability is usable again.
    #[serde(default)]
    pub ability_cooldown: Option<i64>,
    #[serde(default)]
    pub lore_unlocked: Vec<LoreEntry>,
    #[serde(default)]
    pub daily_narrative: String,
    #[serde(default)]
    pub has_onboarded: bool,
    #[serde(default)]
    pub narrative_mode: NarrativeMode,
    #[serde(default = "default_dopamine_preference")]
    pub dopamine_preference: String,
    #[serde(default = "default_schema_version")]
    pub schema_version: u8,
}

fn default_dopamine_preference() -> String {
    "Gaming & Snacks".to_string()
}

fn default_schema_version() -> u8 {
    PROFILE_SCHEMA_VERSION
}

impl UserProfile {
    pub fn new(id: &str, name: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: id.to_string(),
            email: None,
            name: name.to_string(),
            avatar: "🧙".to_string(),
            avatar_color: "bg-indigo-600".to_string(),
            title: "Apprentice".to_string(),
            level: 1,
            current_xp: 0,
            next_level_xp: STARTING_NEXT_LEVEL_XP,
            player_class: PlayerClass::Rogue,
            streak: 1,
            last_login: now,
            completed_quests: 0,
            attributes: Attributes::baseline(),
            inventory: Vec::new(),
            achievements: Vec::new(),
            ability_cooldown: None,
            lore_unlocked: Vec::new(),
            daily_narrative: String::new(),
            has_onboarded: false,
            narrative_mode: NarrativeMode::default(),
            dopamine_preference: default_dopamine_preference(),
            schema_version: PROFILE_SCHEMA_VERSION,
        }
    }

    pub fn with_email(mut self, email: &str) -> Self {
        self.email = Some(email.to_string());
        self
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn has_achievement(&self, id: &str) -> bool {
        self.achievements.iter().any(|a| a == id)
    }

    pub fn lore_in(&self, category: LoreCategory) -> impl Iterator<Item = &LoreEntry> {
        self.lore_unlocked
            .iter()
            .filter(move |entry| entry.category == category)
    }
}

/// Outcome of an automated proof check. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub success: bool,
    pub xp_awarded: u32,
    pub ai_comment: String,
    /// 0-100 visual match score.
    pub confidence_score: u8,
    pub sentiment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creativity_score: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_objects: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loot: Option<LootDescriptor>,
}

impl VerificationResult {
    pub fn failure(comment: &str, sentiment: &str) -> Self {
        Self {
            success: false,
            xp_awarded: 0,
            ai_comment: comment.to_string(),
            confidence_score: 0,
            sentiment: sentiment.to_string(),
            creativity_score: None,
            detected_objects: None,
            loot: None,
        }
    }

    /// Result synthesized locally when a timed quest runs out of time.
    pub fn timed_out() -> Self {
        Self::failure("Time ran out! You were too slow.", "Failed")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SocialPost {
    pub id: String,
    pub author_name: String,
    pub author_avatar: String,
    pub author_title: String,
    pub quest_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub likes: u32,
    pub timestamp: String,
    #[serde(default)]
    pub is_user: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub id: String,
    pub name: String,
    pub avatar: String,
    pub level: u32,
    pub xp: u32,
    pub title: String,
    #[serde(default)]
    pub is_user: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NpcSender {
    User,
    Npc,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NpcMessage {
    pub id: String,
    pub sender: NpcSender,
    pub text: String,
}

impl NpcMessage {
    pub fn new(id: &str, sender: NpcSender, text: &str) -> Self {
        Self {
            id: id.to_string(),
            sender,
            text: text.to_string(),
        }
    }
}
