use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Numeric Telegram user id, as used for the allow-list and store keys.
pub type UserId = u64;

/// One saved sticker. Serialized as
/// `{ "id": ..., "sticker_file_id": ..., "type": "sticker" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StickerRecord {
    /// Telegram `file_unique_id`, stable across resends of the same sticker.
    #[serde(rename = "id")]
    pub stable_id: String,
    /// Telegram `file_id`, used to send the sticker back.
    #[serde(rename = "sticker_file_id")]
    pub transient_file_id: String,
    #[serde(rename = "type", default)]
    pub kind: StickerKind,
}

impl StickerRecord {
    pub fn new(stable_id: impl Into<String>, transient_file_id: impl Into<String>) -> Self {
        Self {
            stable_id: stable_id.into(),
            transient_file_id: transient_file_id.into(),
            kind: StickerKind::Sticker,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StickerKind {
    #[default]
    Sticker,
}

/// Per-user collection mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    /// The next sticker received is removed instead of added.
    DeleteMode,
}

/// In-memory form of the persisted JSON document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDocument", into = "RawDocument")]
pub struct StoreDocument {
    pub user_stickers: BTreeMap<UserId, Vec<StickerRecord>>,
    pub delete_mode: BTreeSet<UserId>,
}

/// On-disk layout: user ids are strings both as map keys and inside
/// `deleteMode`.
#[derive(Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDocument {
    #[serde(default)]
    user_stickers: BTreeMap<String, Vec<StickerRecord>>,
    #[serde(default)]
    delete_mode: Vec<String>,
}

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("invalid user id {0:?}")]
    InvalidUserId(String),

    #[error("user {0} has more than one sticker collection")]
    DuplicateUser(UserId),
}

fn parse_user_id(raw: String) -> Result<UserId, DocumentError> {
    raw.trim()
        .parse()
        .map_err(|_| DocumentError::InvalidUserId(raw))
}

impl TryFrom<RawDocument> for StoreDocument {
    type Error = DocumentError;

    fn try_from(raw: RawDocument) -> Result<Self, Self::Error> {
        let mut user_stickers = BTreeMap::new();
        for (key, stickers) in raw.user_stickers {
            let user_id = parse_user_id(key)?;
            // Keys like "42" and "042" name the same user; merging them
            // would pick one collection and lose the other on the next write.
            if user_stickers.insert(user_id, stickers).is_some() {
                return Err(DocumentError::DuplicateUser(user_id));
            }
        }
        let delete_mode = raw
            .delete_mode
            .into_iter()
            .map(parse_user_id)
            .collect::<Result<_, _>>()?;
        Ok(Self {
            user_stickers,
            delete_mode,
        })
    }
}

impl From<StoreDocument> for RawDocument {
    fn from(doc: StoreDocument) -> Self {
        Self {
            user_stickers: doc
                .user_stickers
                .into_iter()
                .map(|(id, stickers)| (id.to_string(), stickers))
                .collect(),
            delete_mode: doc.delete_mode.iter().map(ToString::to_string).collect(),
        }
    }
}
