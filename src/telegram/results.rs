use sticker_favourites::inline::InlineAnswer;
use sticker_favourites::models::StickerRecord;
use teloxide::types::{
    FileId, InlineQueryResult, InlineQueryResultCachedSticker, InlineQueryResultsButton,
    InlineQueryResultsButtonKind,
};

/// Fallback buttons open a private chat with the bot; the parameter itself is
/// not inspected.
const START_PARAMETER: &str = "_";

/// An inline answer converted to teloxide types, detached from the store so
/// the lock can be released before the request is sent.
pub struct PreparedAnswer {
    pub results: Vec<InlineQueryResult>,
    pub next_offset: Option<String>,
    pub button: Option<InlineQueryResultsButton>,
}

impl From<&InlineAnswer<'_>> for PreparedAnswer {
    fn from(answer: &InlineAnswer<'_>) -> Self {
        Self {
            results: answer.results.iter().map(sticker_result).collect(),
            next_offset: answer.next_offset.map(|offset| offset.to_string()),
            button: answer.fallback.map(fallback_button),
        }
    }
}

fn sticker_result(record: &StickerRecord) -> InlineQueryResult {
    InlineQueryResult::CachedSticker(InlineQueryResultCachedSticker::new(
        record.stable_id.clone(),
        FileId(record.transient_file_id.clone()),
    ))
}

fn fallback_button(text: &str) -> InlineQueryResultsButton {
    InlineQueryResultsButton {
        text: text.to_owned(),
        kind: InlineQueryResultsButtonKind::StartParameter(START_PARAMETER.to_owned()),
    }
}
