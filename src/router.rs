//! Per-user collection state machine.
//!
//! A user is either in [`Mode::Normal`], where every sticker sent is added to
//! their favourites, or in [`Mode::DeleteMode`], where the next sticker sent
//! is removed instead. `/delete` and `/quit` switch between the two.

use crate::error::StoreError;
use crate::models::{Mode, UserId};
use crate::store::StickerStore;

pub const DELETE_COMMAND: &str = "/delete";
pub const QUIT_COMMAND: &str = "/quit";

/// Text sent back to the user after handling a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Added,
    AlreadyFavourite,
    DeletePrompt,
    ExitedDeleteMode,
    NotInDeleteMode,
    Removed,
    NotFound,
}

impl Reply {
    pub const fn text(self) -> &'static str {
        match self {
            Self::Added => "Sticker added to your favourites.",
            Self::AlreadyFavourite => "Sticker is already in your favourites.",
            Self::DeletePrompt => {
                "Send me the sticker you want to remove from your favourites, or type /quit to cancel."
            }
            Self::ExitedDeleteMode => "Exited delete mode.",
            Self::NotInDeleteMode => "You are not in delete mode.",
            Self::Removed => "Sticker has been removed from your favourites, exiting delete mode.",
            Self::NotFound => {
                "Sticker is not in your favourites, please send another sticker to delete, or type /quit to cancel."
            }
        }
    }
}

/// Handles a text message. Returns `None` for text that is not a command.
pub fn handle_text(
    store: &mut StickerStore,
    user_id: UserId,
    text: &str,
) -> Result<Option<Reply>, StoreError> {
    if text.starts_with(DELETE_COMMAND) {
        store.enter_delete_mode(user_id)?;
        return Ok(Some(Reply::DeletePrompt));
    }

    if text.starts_with(QUIT_COMMAND) {
        let reply = if store.exit_delete_mode(user_id)? {
            Reply::ExitedDeleteMode
        } else {
            Reply::NotInDeleteMode
        };
        return Ok(Some(reply));
    }

    Ok(None)
}

/// Handles a received sticker according to the user's current mode.
pub fn handle_sticker(
    store: &mut StickerStore,
    user_id: UserId,
    stable_id: &str,
    transient_file_id: &str,
) -> Result<Reply, StoreError> {
    match store.mode(user_id) {
        Mode::Normal => {
            store.ensure_user(user_id)?;
            if store.add_sticker(user_id, stable_id, transient_file_id)? {
                Ok(Reply::Added)
            } else {
                Ok(Reply::AlreadyFavourite)
            }
        }
        Mode::DeleteMode => {
            if !store.has_collection(user_id) {
                return Ok(Reply::NotFound);
            }
            if store.remove_sticker(user_id, stable_id)? {
                store.exit_delete_mode(user_id)?;
                Ok(Reply::Removed)
            } else {
                Ok(Reply::NotFound)
            }
        }
    }
}
