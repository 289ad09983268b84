//! Keeps the admin cache in step with promotions and demotions.

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::ChatMemberUpdated;
use tracing::debug;
use warden_core::MembershipChange;

use crate::membership::{from_user_id, status_of};
use crate::state::BotState;

/// Translate a `chat_member` update into a membership change.
pub fn membership_change(upd: &ChatMemberUpdated) -> MembershipChange {
    MembershipChange {
        chat_id: upd.chat.id.0,
        user_id: from_user_id(upd.new_chat_member.user.id),
        old_status: status_of(&upd.old_chat_member.kind),
        new_status: status_of(&upd.new_chat_member.kind),
    }
}

pub async fn handle_chat_member(upd: ChatMemberUpdated, state: Arc<BotState>) -> ResponseResult<()> {
    let change = membership_change(&upd);
    debug!(
        chat_id = %change.chat_id,
        user_id = %change.user_id,
        old = ?change.old_status,
        new = ?change.new_status,
        "Member status changed"
    );
    state.resolver.on_membership_change(&change).await;
    Ok(())
}
