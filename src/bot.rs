use crate::config::Config;
use crate::telegram::handler;
use std::sync::Arc;
use sticker_favourites::store::StickerStore;
use teloxide::dispatching::UpdateFilterExt;
use teloxide::dptree;
use teloxide::prelude::*;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// The store is shared by all handlers; each update does its whole
/// read-modify-write under one lock acquisition.
pub type SharedStore = Arc<Mutex<StickerStore>>;

pub async fn run_bot(config: Config) -> anyhow::Result<()> {
    let store = StickerStore::open(&config.store_path)?;
    tracing::info!(
        allowed_users = config.allowed_user_ids.len(),
        stored_users = store.user_count(),
        "Loaded sticker store from {}",
        store.path().display()
    );

    let bot = Bot::new(&config.telegram_bot_token);
    let config = Arc::new(config);
    let store: SharedStore = Arc::new(Mutex::new(store));
    let cancel_token = CancellationToken::new();

    spawn_signal_handler(cancel_token.clone());

    let handler = {
        let inline_handler = Update::filter_inline_query().endpoint({
            let config = config.clone();
            let store = store.clone();
            move |bot: Bot, query: InlineQuery| {
                let config = config.clone();
                let store = store.clone();
                async move { handler::handle_inline_query(bot, query, config, store).await }
            }
        });

        let message_handler = Update::filter_message().endpoint({
            let config = config.clone();
            let store = store.clone();
            move |bot: Bot, msg: Message| {
                let config = config.clone();
                let store = store.clone();
                async move { handler::handle_message(bot, msg, config, store).await }
            }
        });

        dptree::entry()
            .branch(inline_handler)
            .branch(message_handler)
    };

    let dispatcher = async {
        Box::pin(
            Dispatcher::builder(bot.clone(), handler)
                .default_handler(|update| async move {
                    tracing::trace!(update_id = update.id.0, "Ignoring unhandled update");
                })
                .error_handler(LoggingErrorHandler::with_custom_text(
                    "Failed to handle update",
                ))
                .enable_ctrlc_handler()
                .build()
                .dispatch_with_listener(
                    teloxide::update_listeners::polling_default(bot.clone()).await,
                    LoggingErrorHandler::with_custom_text("Polling error"),
                ),
        )
        .await;
    };

    tracing::info!("Bot started. Listening for stickers...");

    tokio::select! {
        () = dispatcher => {
            tracing::info!("Telegram dispatcher stopped");
        }
        () = cancel_token.cancelled() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}

fn spawn_signal_handler(cancel_token: CancellationToken) {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            let mut sigterm =
                match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                    Ok(signal) => signal,
                    Err(e) => {
                        tracing::warn!("Failed to register SIGTERM handler: {e}");
                        return;
                    }
                };
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    if let Err(e) = result {
                        tracing::warn!("Failed to listen for SIGINT: {e}");
                        return;
                    }
                    tracing::info!("Received SIGINT, shutting down...");
                }
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, shutting down...");
                }
            }
        }
        #[cfg(not(unix))]
        {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("Failed to register Ctrl+C handler: {e}");
                return;
            }
            tracing::info!("Received Ctrl+C, shutting down...");
        }
        cancel_token.cancel();
    });
}
