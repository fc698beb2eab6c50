/// Achievement catalog and unlock evaluation.
///
/// The catalog is a static rule table: each entry pairs an id with a pure
/// predicate over the profile. Unlocks are one-way; a rule is only ever
/// evaluated while its id is absent from the profile.
use crate::game::types::UserProfile;

pub struct AchievementRule {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub condition: fn(&UserProfile) -> bool,
}

impl std::fmt::Debug for AchievementRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AchievementRule").field("id", &self.id).finish()
    }
}

pub static ACHIEVEMENTS: &[AchievementRule] = &[
    AchievementRule {
        id: "first_blood",
        title: "First Steps",
        description: "Complete your first quest.",
        icon: "🦶",
        condition: |u| u.completed_quests >= 1,
    },
    AchievementRule {
        id: "streaker",
        title: "Consistent",
        description: "Reach a 3-day streak.",
        icon: "🔥",
        condition: |u| u.streak >= 3,
    },
    AchievementRule {
        id: "loot_goblin",
        title: "Loot Goblin",
        description: "Collect 5 items.",
        icon: "🎒",
        condition: |u| u.inventory.len() >= 5,
    },
    AchievementRule {
        id: "jacked",
        title: "Gym Rat",
        description: "Reach 20 Strength.",
        icon: "💪",
        condition: |u| u.attributes.strength >= 20,
    },
    AchievementRule {
        id: "bardic",
        title: "Social Butterfly",
        description: "Reach 20 Charisma.",
        icon: "🗣️",
        condition: |u| u.attributes.charisma >= 20,
    },
];

pub fn find_rule(id: &str) -> Option<&'static AchievementRule> {
    ACHIEVEMENTS.iter().find(|rule| rule.id == id)
}

/// Ids of rules that are satisfied but not yet unlocked, in catalog order.
pub fn pending_unlocks(profile: &UserProfile) -> Vec<&'static str> {
    ACHIEVEMENTS
        .iter()
        .filter(|rule| !profile.has_achievement(rule.id) && (rule.condition)(profile))
        .map(|rule| rule.id)
        .collect()
}

/// Append every newly satisfied achievement in one batch. Returns what was unlocked.
pub fn unlock_new(profile: &mut UserProfile) -> Vec<&'static str> {
    let fresh = pending_unlocks(profile);
    profile
        .achievements
        .extend(fresh.iter().map(|id| id.to_string()));
    fresh
}

/// Full catalog with unlock status, for the achievements view.
pub fn catalog_with_status(profile: &UserProfile) -> Vec<(&'static AchievementRule, bool)> {
    ACHIEVEMENTS
        .iter()
        .map(|rule| (rule, profile.has_achievement(rule.id)))
        .collect()
}
