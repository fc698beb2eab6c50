/// Social feed and leaderboard bookkeeping for the local player.
use chrono::{DateTime, Utc};

use crate::game::types::{LeaderboardEntry, SocialPost, UserProfile};

/// Leaderboard row representing the local player.
pub fn user_entry(profile: &UserProfile) -> LeaderboardEntry {
    LeaderboardEntry {
        id: profile.id.clone(),
        name: profile.name.clone(),
        avatar: profile.avatar.clone(),
        level: profile.level,
        xp: profile.current_xp,
        title: profile.title.clone(),
        is_user: true,
    }
}

fn sort_by_xp(board: &mut [LeaderboardEntry]) {
    // Stable sort; ties keep their existing order.
    board.sort_by(|a, b| b.xp.cmp(&a.xp));
}

/// Combine generated rivals with the local player, highest XP first.
pub fn merge_leaderboard(rivals: Vec<LeaderboardEntry>, profile: &UserProfile) -> Vec<LeaderboardEntry> {
    let mut board: Vec<LeaderboardEntry> = rivals.into_iter().filter(|e| !e.is_user).collect();
    board.push(user_entry(profile));
    sort_by_xp(&mut board);
    board
}

/// Refresh the local player's row (xp, level, title) and resort.
pub fn sync_leaderboard(board: &mut Vec<LeaderboardEntry>, profile: &UserProfile) {
    for entry in board.iter_mut().filter(|e| e.is_user) {
        entry.xp = profile.current_xp;
        entry.level = profile.level;
        entry.title = profile.title.clone();
        entry.name = profile.name.clone();
        entry.avatar = profile.avatar.clone();
    }
    sort_by_xp(board);
}

/// Feed post announcing a quest the player just completed.
pub fn completion_post(
    profile: &UserProfile,
    quest_title: &str,
    proof_ref: &str,
    now: DateTime<Utc>,
) -> SocialPost {
    SocialPost {
        id: format!("post-{}", now.timestamp_millis()),
        author_name: profile.name.clone(),
        author_avatar: profile.avatar.clone(),
        author_title: profile.title.clone(),
        quest_title: quest_title.to_string(),
        image: Some(proof_ref.to_string()),
        likes: 0,
        timestamp: "Just now".to_string(),
        is_user: true,
    }
}
