use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Cannot read store at {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid store document in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize store document: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Cannot write store at {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),
}

/// Error returned by dispatcher endpoints. The dispatcher logs it and moves on
/// to the next update.
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("Telegram request failed: {0}")]
    Request(#[from] teloxide::RequestError),

    #[error("Sticker store update failed: {0}")]
    Store(#[from] StoreError),
}
