use crate::bot::SharedStore;
use crate::config::Config;
use crate::telegram::results::PreparedAnswer;
use std::sync::Arc;
use sticker_favourites::error::{HandlerError, StoreError};
use sticker_favourites::inline::{self, InlineAnswer};
use sticker_favourites::models::UserId;
use sticker_favourites::router::{self, Reply};
use sticker_favourites::store::StickerStore;
use teloxide::prelude::*;

/// The parts of a message the router cares about.
pub enum Incoming<'a> {
    Sticker {
        stable_id: &'a str,
        transient_file_id: &'a str,
    },
    Text(&'a str),
    Other,
}

impl<'a> Incoming<'a> {
    fn from_message(msg: &'a Message) -> Self {
        if let Some(sticker) = msg.sticker() {
            Self::Sticker {
                stable_id: &sticker.file.unique_id.0,
                transient_file_id: &sticker.file.id.0,
            }
        } else if let Some(text) = msg.text() {
            Self::Text(text)
        } else {
            Self::Other
        }
    }
}

/// Gates a message on the allow-list and chat type, then runs it through the
/// router. Rejected messages never touch the store.
pub fn route(
    config: &Config,
    store: &mut StickerStore,
    sender: Option<UserId>,
    private_chat: bool,
    incoming: Incoming<'_>,
) -> Result<Option<Reply>, StoreError> {
    let Some(user_id) = config.accepts(sender, private_chat) else {
        return Ok(None);
    };

    match incoming {
        Incoming::Sticker {
            stable_id,
            transient_file_id,
        } => {
            tracing::info!(user_id, stable_id, "Sticker received");
            router::handle_sticker(store, user_id, stable_id, transient_file_id).map(Some)
        }
        Incoming::Text(text) => router::handle_text(store, user_id, text),
        Incoming::Other => Ok(None),
    }
}

pub async fn handle_message(
    bot: Bot,
    msg: Message,
    config: Arc<Config>,
    store: SharedStore,
) -> Result<(), HandlerError> {
    let sender = msg.from.as_ref().map(|user| user.id.0);
    let reply = {
        let mut store = store.lock().await;
        route(
            &config,
            &mut store,
            sender,
            msg.chat.is_private(),
            Incoming::from_message(&msg),
        )?
    };

    if let Some(reply) = reply {
        bot.send_message(msg.chat.id, reply.text()).await?;
    }

    Ok(())
}

pub async fn handle_inline_query(
    bot: Bot,
    query: InlineQuery,
    config: Arc<Config>,
    store: SharedStore,
) -> Result<(), HandlerError> {
    let user_id = query.from.id.0;

    if !config.is_allowed(user_id) {
        tracing::warn!(user_id, "Unauthorized inline query");
        let prepared = PreparedAnswer::from(&InlineAnswer::unauthorised());
        answer_inline_query(&bot, &query, prepared).await?;
        return Ok(());
    }

    let offset = inline::parse_offset(&query.offset);
    let prepared = {
        let store = store.lock().await;
        PreparedAnswer::from(&inline::page(store.get_stickers(user_id), offset))
    };
    tracing::debug!(
        user_id,
        offset,
        results = prepared.results.len(),
        "Answering inline query"
    );

    answer_inline_query(&bot, &query, prepared).await?;
    Ok(())
}

async fn answer_inline_query(
    bot: &Bot,
    query: &InlineQuery,
    prepared: PreparedAnswer,
) -> Result<(), teloxide::RequestError> {
    let mut request = bot
        .answer_inline_query(query.id.clone(), prepared.results)
        .cache_time(inline::CACHE_TIME_SECS)
        .is_personal(true);
    if let Some(next_offset) = prepared.next_offset {
        request = request.next_offset(next_offset);
    }
    if let Some(button) = prepared.button {
        request = request.button(button);
    }
    request.await?;
    Ok(())
}
