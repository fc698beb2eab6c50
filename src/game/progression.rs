/// XP, leveling and attribute rules.
///
/// Every function here is a pure transformation of a `UserProfile`; the engine
/// decides when to call them and persists the result.
use chrono::{DateTime, Utc};

use crate::game::types::{
    Attributes, LootDescriptor, LootItem, PlayerClass, QuestType, UserProfile, BASE_ATTRIBUTE,
};

/// Attribute value granted by a class during onboarding.
pub const CLASS_ATTRIBUTE: u32 = 15;

/// Which attribute a quest type trains, and by how much.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeGain {
    Strength(u32),
    Intellect(u32),
    Charisma(u32),
    None,
}

pub fn attribute_gain(quest_type: QuestType) -> AttributeGain {
    match quest_type {
        QuestType::Solo => AttributeGain::Strength(1),
        QuestType::Creative => AttributeGain::Intellect(1),
        QuestType::Social => AttributeGain::Charisma(1),
        QuestType::Timed => AttributeGain::Strength(2),
        QuestType::Exploration | QuestType::Collection => AttributeGain::Intellect(2),
        QuestType::WorldEvent => AttributeGain::None,
    }
}

impl AttributeGain {
    pub fn apply(self, attributes: &mut Attributes) {
        match self {
            AttributeGain::Strength(n) => attributes.strength += n,
            AttributeGain::Intellect(n) => attributes.intellect += n,
            AttributeGain::Charisma(n) => attributes.charisma += n,
            AttributeGain::None => {}
        }
    }
}

/// Next threshold after a level-up: floor(current * 1.5).
pub fn next_threshold(current: u32) -> u32 {
    current.saturating_add(current / 2)
}

/// Summary of what a successful completion changed, for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardSummary {
    pub xp_gained: u32,
    pub leveled_up: bool,
    pub gain: AttributeGain,
    pub loot: Option<LootItem>,
}

/// Apply a verified completion to the profile as one update.
///
/// Leveling is single-step: an award that overshoots two thresholds still
/// advances only one level.
pub fn apply_quest_reward(
    profile: &mut UserProfile,
    quest_type: QuestType,
    xp_awarded: u32,
    loot: Option<&LootDescriptor>,
    proof_ref: &str,
    now: DateTime<Utc>,
) -> RewardSummary {
    let new_xp = profile.current_xp.saturating_add(xp_awarded);
    let leveled_up = new_xp >= profile.next_level_xp;
    if leveled_up {
        profile.level += 1;
        profile.next_level_xp = next_threshold(profile.next_level_xp);
    }
    profile.current_xp = new_xp;

    let gain = attribute_gain(quest_type);
    gain.apply(&mut profile.attributes);
    profile.completed_quests += 1;

    let loot = loot.map(|descriptor| LootItem {
        id: now.timestamp_millis().to_string(),
        name: descriptor.name.clone(),
        description: descriptor.description.clone(),
        rarity: descriptor.rarity,
        image: proof_ref.to_string(),
        date_earned: now,
    });
    if let Some(item) = &loot {
        profile.inventory.insert(0, item.clone());
    }

    RewardSummary {
        xp_gained: xp_awarded,
        leveled_up,
        gain,
        loot,
    }
}

/// Record a new calendar day. Returns true if `today` differs from the day of
/// the last login, in which case the streak grows by one and the cached
/// narrative is dropped. Missed days do not reset the streak.
pub fn apply_daily_rollover(
    profile: &mut UserProfile,
    last_login_day: chrono::NaiveDate,
    today: chrono::NaiveDate,
    now: DateTime<Utc>,
) -> bool {
    if last_login_day == today {
        return false;
    }
    profile.streak += 1;
    profile.last_login = now;
    profile.daily_narrative.clear();
    true
}

/// Flat XP bonus. Does not run the level-up check.
pub fn apply_daily_bonus(profile: &mut UserProfile, bonus_xp: u32) {
    profile.current_xp = profile.current_xp.saturating_add(bonus_xp);
}

/// Starting attributes for a freshly chosen class.
pub fn class_attributes(class: PlayerClass) -> Attributes {
    let pick = |favoured: PlayerClass| {
        if class == favoured {
            CLASS_ATTRIBUTE
        } else {
            BASE_ATTRIBUTE
        }
    };
    Attributes {
        strength: pick(PlayerClass::Paladin),
        intellect: pick(PlayerClass::Bard),
        charisma: pick(PlayerClass::Rogue),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::types::Rarity;
    use chrono::{NaiveDate, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 2, 10, 0, 0).unwrap()
    }

    fn fresh() -> UserProfile {
        UserProfile::new("user-1", "Tester", now())
    }

    #[test]
    fn level_up_scales_threshold() {
        let mut p = fresh();
        p.current_xp = 400;
        let summary = apply_quest_reward(&mut p, QuestType::Creative, 150, None, "proof", now());
        assert!(summary.leveled_up);
        assert_eq!(p.current_xp, 550);
        assert_eq!(p.level, 2);
        assert_eq!(p.next_level_xp, 750);
    }

    #[test]
    fn solo_fifty_xp_on_fresh_profile() {
        let mut p = fresh();
        let summary = apply_quest_reward(&mut p, QuestType::Solo, 50, None, "proof", now());
        assert!(!summary.leveled_up);
        assert_eq!(p.current_xp, 50);
        assert_eq!(p.attributes.strength, 11);
        assert_eq!(p.attributes.intellect, 10);
        assert_eq!(p.completed_quests, 1);
        assert_eq!(p.level, 1);
    }

    #[test]
    fn overshoot_only_advances_one_level() {
        let mut p = fresh();
        apply_quest_reward(&mut p, QuestType::Solo, 2_000, None, "proof", now());
        assert_eq!(p.level, 2);
        assert_eq!(p.next_level_xp, 750);
        assert_eq!(p.current_xp, 2_000);
    }

    #[test]
    fn odd_threshold_is_floored() {
        assert_eq!(next_threshold(750), 1125);
        assert_eq!(next_threshold(1125), 1687);
    }

    #[test]
    fn each_type_trains_one_attribute() {
        let cases = [
            (QuestType::Solo, (11, 10, 10)),
            (QuestType::Creative, (10, 11, 10)),
            (QuestType::Social, (10, 10, 11)),
            (QuestType::Timed, (12, 10, 10)),
            (QuestType::Exploration, (10, 12, 10)),
            (QuestType::Collection, (10, 12, 10)),
            (QuestType::WorldEvent, (10, 10, 10)),
        ];
        for (quest_type, (s, i, c)) in cases {
            let mut p = fresh();
            apply_quest_reward(&mut p, quest_type, 10, None, "proof", now());
            let a = p.attributes;
            assert_eq!((a.strength, a.intellect, a.charisma), (s, i, c), "{quest_type:?}");
            assert_eq!(p.completed_quests, 1);
        }
    }

    #[test]
    fn loot_is_prepended_with_proof_reference() {
        let mut p = fresh();
        let first = LootDescriptor {
            name: "Pebble".into(),
            description: "Smooth".into(),
            rarity: Rarity::Common,
        };
        apply_quest_reward(&mut p, QuestType::Solo, 10, Some(&first), "a.jpg", now());
        let later = now() + chrono::Duration::seconds(5);
        let second = LootDescriptor {
            name: "Crown".into(),
            description: "Shiny".into(),
            rarity: Rarity::Epic,
        };
        apply_quest_reward(&mut p, QuestType::Solo, 10, Some(&second), "b.jpg", later);

        assert_eq!(p.inventory.len(), 2);
        assert_eq!(p.inventory[0].name, "Crown");
        assert_eq!(p.inventory[0].image, "b.jpg");
        assert_eq!(p.inventory[0].id, later.timestamp_millis().to_string());
        assert_eq!(p.inventory[1].name, "Pebble");
    }

    #[test]
    fn rollover_only_on_new_day() {
        let mut p = fresh();
        p.daily_narrative = "Dawn breaks".into();
        let day = NaiveDate::from_ymd_opt(2025, 4, 2).unwrap();
        assert!(!apply_daily_rollover(&mut p, day, day, now()));
        assert_eq!(p.streak, 1);
        assert_eq!(p.daily_narrative, "Dawn breaks");

        let later = now() + chrono::Duration::days(3);
        let next = NaiveDate::from_ymd_opt(2025, 4, 5).unwrap();
        assert!(apply_daily_rollover(&mut p, day, next, later));
        assert_eq!(p.streak, 2);
        assert!(p.daily_narrative.is_empty());
        assert_eq!(p.last_login, later);
    }

    #[test]
    fn bonus_skips_level_check() {
        let mut p = fresh();
        p.current_xp = 480;
        apply_daily_bonus(&mut p, 50);
        assert_eq!(p.current_xp, 530);
        assert_eq!(p.level, 1);
        assert_eq!(p.next_level_xp, 500);
    }

    #[test]
    fn class_bonus_attributes() {
        assert_eq!(class_attributes(PlayerClass::Paladin).strength, 15);
        assert_eq!(class_attributes(PlayerClass::Bard).intellect, 15);
        assert_eq!(class_attributes(PlayerClass::Rogue).charisma, 15);
        assert_eq!(class_attributes(PlayerClass::Ranger), Attributes::baseline());
    }
}
