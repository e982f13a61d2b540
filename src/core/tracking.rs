use std::collections::HashSet;
use tracing::{debug, info};

use crate::models::{BotState, Tweet};

/// Brings `state.tracked_users` in line with the live follow list. New users
/// start with no high-water mark; existing marks are kept.
pub fn reconcile(state: &mut BotState, following: &HashSet<String>) {
    let before = state.tracked_users.len();
    state.tracked_users.retain(|user_id, _| following.contains(user_id));
    let removed = before - state.tracked_users.len();

    let mut added = 0;
    for user_id in following {
        if !state.tracked_users.contains_key(user_id) {
            state.tracked_users.insert(user_id.clone(), None);
            added += 1;
        }
    }

    if added > 0 || removed > 0 {
        info!("Tracked users updated: {} added, {} removed", added, removed);
    }
}

/// Flattens per-user retrievals (each newest-first) into one list and moves
/// each user's high-water mark to the newest tweet of their group.
///
/// The mark is taken before retweets are dropped, so a retweet at the head of
/// a group still advances it even though it is never learned.
pub fn process_retrievals(state: &mut BotState, retrievals: Vec<Vec<Tweet>>) -> Vec<Tweet> {
    let mut merged = Vec::new();

    for group in retrievals {
        if let Some(newest) = group.first() {
            debug!(
                "Advancing user {} to tweet {}",
                newest.user.id_str, newest.id_str
            );
            state
                .tracked_users
                .insert(newest.user.id_str.clone(), Some(newest.id_str.clone()));
        }

        merged.extend(group.into_iter().filter(|tweet| !tweet.is_retweet()));
    }

    merged
}
