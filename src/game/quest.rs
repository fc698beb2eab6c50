/// Quest board and active quest lifecycle.
///
/// The board holds offered quests plus at most one live world event. Accepting
/// a quest copies it into an [`ActiveQuest`]; the board entry is only touched
/// again when a verification succeeds and marks it completed.
use crate::game::types::{
    Difficulty, DopamineCategory, Quest, QuestLocation, QuestType, VerificationResult,
};

const MS_PER_MINUTE: i64 = 60_000;

/// Built-in board used whenever quest generation fails.
pub fn fallback_daily_quests() -> Vec<Quest> {
    vec![
        Quest::new(
            "fallback-1",
            "Touch Grass",
            "Go outside and touch a natural surface.",
            Difficulty::Easy,
            50,
            QuestType::Solo,
        )
        .with_location(QuestLocation::Wilds)
        .with_dopamine_category(DopamineCategory::Appetizer),
        Quest::new(
            "fallback-2",
            "Sky Gazer",
            "Take a photo of an interesting cloud formation.",
            Difficulty::Medium,
            100,
            QuestType::Creative,
        )
        .with_location(QuestLocation::Tower)
        .with_dopamine_category(DopamineCategory::Dessert),
        Quest::new(
            "fallback-3",
            "Speed Run: Water",
            "Drink a glass of water.",
            Difficulty::Medium,
            150,
            QuestType::Timed,
        )
        .with_duration_minutes(2)
        .with_location(QuestLocation::Wilds)
        .with_dopamine_category(DopamineCategory::Side),
    ]
}

/// Built-in world event used when event generation fails.
pub fn fallback_world_event(now_ms: i64, lifetime_minutes: u32) -> Quest {
    Quest::new(
        &format!("event-fallback-{}", now_ms),
        "Golden Slime Invasion",
        "Find something yellow and shiny. Quick!",
        Difficulty::Event,
        500,
        QuestType::WorldEvent,
    )
    .with_location(QuestLocation::Event)
    .with_coordinates(200, 200)
    .with_expires_at(now_ms + i64::from(lifetime_minutes) * MS_PER_MINUTE)
    .with_dopamine_category(DopamineCategory::Main)
}

#[derive(Debug, Clone, Default)]
pub struct QuestBoard {
    quests: Vec<Quest>,
}

impl QuestBoard {
    pub fn new(quests: Vec<Quest>) -> Self {
        Self { quests }
    }

    pub fn quests(&self) -> &[Quest] {
        &self.quests
    }

    pub fn get(&self, id: &str) -> Option<&Quest> {
        self.quests.iter().find(|q| q.id == id)
    }

    /// Discard the board and install a fresh batch.
    pub fn replace(&mut self, quests: Vec<Quest>) {
        self.quests = quests;
    }

    /// Put a quest at the top of the board (Oracle requests).
    pub fn prepend(&mut self, quest: Quest) {
        self.quests.insert(0, quest);
    }

    /// The uncompleted world event currently on the board, if any.
    pub fn live_world_event(&self) -> Option<&Quest> {
        self.quests
            .iter()
            .find(|q| q.is_world_event() && !q.completed)
    }

    /// Add a world event unless an uncompleted one is already present.
    pub fn try_add_world_event(&mut self, event: Quest) -> bool {
        if self.live_world_event().is_some() {
            return false;
        }
        self.quests.push(event);
        true
    }

    /// Drop uncompleted world events whose deadline has passed. Returns the removed quests.
    pub fn sweep_expired(&mut self, now_ms: i64) -> Vec<Quest> {
        let (expired, kept): (Vec<Quest>, Vec<Quest>) = std::mem::take(&mut self.quests)
            .into_iter()
            .partition(|q| q.is_expired_event(now_ms));
        self.quests = kept;
        expired
    }

    pub fn mark_completed(&mut self, id: &str) -> bool {
        match self.quests.iter_mut().find(|q| q.id == id) {
            Some(quest) => {
                quest.completed = true;
                true
            }
            None => false,
        }
    }

    /// Quests grouped by dopamine category in menu order. Uncategorized quests
    /// are listed as side dishes; empty sections are omitted.
    pub fn dopamine_menu(&self) -> Vec<(DopamineCategory, Vec<&Quest>)> {
        DopamineCategory::MENU_ORDER
            .iter()
            .filter_map(|category| {
                let section: Vec<&Quest> = self
                    .quests
                    .iter()
                    .filter(|q| {
                        q.dopamine_category.unwrap_or(DopamineCategory::Side) == *category
                    })
                    .collect();
                if section.is_empty() {
                    None
                } else {
                    Some((*category, section))
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QuestPhase {
    InProgress,
    /// Proof submitted; awaiting the verifier.
    Verifying,
    Resolved(VerificationResult),
}

/// The single quest the player is working on.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveQuest {
    pub quest: Quest,
    pub phase: QuestPhase,
}

impl ActiveQuest {
    /// Copy a board quest into the active slot. Timed quests get their deadline here.
    pub fn start(board_quest: &Quest, now_ms: i64) -> Self {
        let mut quest = board_quest.clone();
        if quest.quest_type == QuestType::Timed {
            if let Some(minutes) = quest.duration_minutes {
                quest.expires_at = Some(now_ms + i64::from(minutes) * MS_PER_MINUTE);
            }
        }
        Self {
            quest,
            phase: QuestPhase::InProgress,
        }
    }

    pub fn id(&self) -> &str {
        &self.quest.id
    }

    /// True while a timed quest with a deadline is waiting for proof.
    pub fn has_running_timer(&self) -> bool {
        self.quest.quest_type == QuestType::Timed
            && self.quest.expires_at.is_some()
            && self.phase == QuestPhase::InProgress
    }

    /// Milliseconds left on a timed quest (may be negative once overdue).
    pub fn remaining_ms(&self, now_ms: i64) -> Option<i64> {
        if self.quest.quest_type != QuestType::Timed {
            return None;
        }
        self.quest.expires_at.map(|at| at - now_ms)
    }

    pub fn result(&self) -> Option<&VerificationResult> {
        match &self.phase {
            QuestPhase::Resolved(result) => Some(result),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(&self.phase, QuestPhase::Resolved(r) if !r.success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: &str, expires_at: i64) -> Quest {
        Quest::new(id, "Rift", "Close it", Difficulty::Event, 300, QuestType::WorldEvent)
            .with_expires_at(expires_at)
    }

    #[test]
    fn fallback_board_spans_required_types() {
        let quests = fallback_daily_quests();
        assert!(quests.len() >= 3);
        for wanted in [QuestType::Solo, QuestType::Creative, QuestType::Timed] {
            assert!(quests.iter().any(|q| q.quest_type == wanted));
        }
        let timed = quests.iter().find(|q| q.quest_type == QuestType::Timed).unwrap();
        assert_eq!(timed.duration_minutes, Some(2));
    }

    #[test]
    fn fallback_event_has_deadline_and_coordinates() {
        let quest = fallback_world_event(1_000, 15);
        assert_eq!(quest.title, "Golden Slime Invasion");
        assert_eq!(quest.xp_reward, 500);
        assert_eq!(quest.expires_at, Some(1_000 + 15 * 60_000));
        assert_eq!(quest.coordinates.map(|c| (c.x, c.y)), Some((200, 200)));
    }

    #[test]
    fn only_one_live_world_event() {
        let mut board = QuestBoard::new(fallback_daily_quests());
        assert!(board.try_add_world_event(event("e1", 10_000)));
        assert!(!board.try_add_world_event(event("e2", 10_000)));
        assert_eq!(board.quests().iter().filter(|q| q.is_world_event()).count(), 1);

        board.mark_completed("e1");
        assert!(board.try_add_world_event(event("e3", 10_000)));
        assert_eq!(board.live_world_event().map(|q| q.id.as_str()), Some("e3"));
    }

    #[test]
    fn sweep_keeps_completed_and_unexpired_events() {
        let mut done = event("done", 100);
        done.completed = true;
        let mut board = QuestBoard::new(vec![event("old", 100), done, event("fresh", 10_000)]);
        let removed = board.sweep_expired(5_000);
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].id, "old");
        let ids: Vec<&str> = board.quests().iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["done", "fresh"]);
    }

    #[test]
    fn accepting_copies_and_stamps_deadline() {
        let board = QuestBoard::new(fallback_daily_quests());
        let source = board.get("fallback-3").unwrap();
        let active = ActiveQuest::start(source, 50_000);
        assert_eq!(active.quest.expires_at, Some(50_000 + 120_000));
        assert!(board.get("fallback-3").unwrap().expires_at.is_none());
        assert!(active.has_running_timer());
        assert_eq!(active.remaining_ms(170_000), Some(0));

        let solo = ActiveQuest::start(board.get("fallback-1").unwrap(), 50_000);
        assert!(solo.quest.expires_at.is_none());
        assert!(!solo.has_running_timer());
        assert_eq!(solo.remaining_ms(0), None);
    }

    #[test]
    fn dopamine_menu_puts_uncategorized_under_side() {
        let plain = Quest::new("p", "Plain", "No tag", Difficulty::Easy, 10, QuestType::Solo);
        let mut quests = fallback_daily_quests();
        quests.push(plain);
        let board = QuestBoard::new(quests);
        let menu = board.dopamine_menu();
        let categories: Vec<DopamineCategory> = menu.iter().map(|(c, _)| *c).collect();
        assert_eq!(
            categories,
            vec![
                DopamineCategory::Appetizer,
                DopamineCategory::Side,
                DopamineCategory::Dessert
            ]
        );
        let side = &menu[1].1;
        assert!(side.iter().any(|q| q.id == "p"));
        assert!(side.iter().any(|q| q.id == "fallback-3"));
    }
}
