mod common;

use common::start_time;
use sidequest::game::{catalog_with_status, unlock_new, LootItem, Rarity, UserProfile, ACHIEVEMENTS};

fn item(n: usize) -> LootItem {
    LootItem {
        id: n.to_string(),
        name: format!("Trinket {n}"),
        description: "Shiny.".to_string(),
        rarity: Rarity::Common,
        image: String::new(),
        date_earned: start_time(),
    }
}

#[test]
fn unlocks_never_go_away() {
    let mut profile = UserProfile::new("user-1", "Player One", start_time());
    profile.attributes.strength = 20;
    profile.inventory = (0..5).map(item).collect();
    assert_eq!(unlock_new(&mut profile), vec!["loot_goblin", "jacked"]);

    // Dropping below the thresholds keeps what was earned.
    profile.attributes.strength = 10;
    profile.inventory.clear();
    assert!(unlock_new(&mut profile).is_empty());
    assert!(profile.has_achievement("jacked"));
    assert!(profile.has_achievement("loot_goblin"));
    assert_eq!(profile.achievements.len(), 2);
}

#[test]
fn batch_unlock_does_not_duplicate() {
    let mut profile = UserProfile::new("user-1", "Player One", start_time());
    profile.completed_quests = 1;
    profile.streak = 3;
    profile.attributes.charisma = 25;
    let first = unlock_new(&mut profile);
    assert_eq!(first, vec!["first_blood", "streaker", "bardic"]);
    let second = unlock_new(&mut profile);
    assert!(second.is_empty());
    assert_eq!(profile.achievements.len(), 3);
}

#[test]
fn catalog_lists_every_rule_with_status() {
    let mut profile = UserProfile::new("user-1", "Player One", start_time());
    profile.completed_quests = 1;
    unlock_new(&mut profile);
    let catalog = catalog_with_status(&profile);
    assert_eq!(catalog.len(), ACHIEVEMENTS.len());
    let unlocked: Vec<_> = catalog
        .iter()
        .filter(|(_, done)| *done)
        .map(|(rule, _)| rule.id)
        .collect();
    assert_eq!(unlocked, vec!["first_blood"]);
}
