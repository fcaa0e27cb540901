use crate::models::StickerRecord;

/// Maximum number of results Telegram accepts per inline answer.
pub const PAGE_SIZE: usize = 50;
/// Seconds Telegram may cache an answer; kept short so adds and removes show
/// up on the next query.
pub const CACHE_TIME_SECS: u32 = 1;

pub const NO_STICKERS_TEXT: &str = "No stickers found!";
pub const UNAUTHORISED_TEXT: &str = "You are not an authorised user!";

/// What to answer an inline query with.
#[derive(Debug, PartialEq, Eq)]
pub struct InlineAnswer<'a> {
    pub results: &'a [StickerRecord],
    pub next_offset: Option<usize>,
    /// Prompt shown above the (empty) results, if any.
    pub fallback: Option<&'static str>,
}

impl InlineAnswer<'static> {
    pub const fn unauthorised() -> Self {
        Self {
            results: &[],
            next_offset: None,
            fallback: Some(UNAUTHORISED_TEXT),
        }
    }
}

/// Inline offsets are opaque strings we set ourselves; anything that is not a
/// plain number starts from the beginning.
pub fn parse_offset(raw: &str) -> usize {
    raw.trim().parse().unwrap_or(0)
}

/// Builds one page of the collection starting at `offset`.
pub fn page(stickers: &[StickerRecord], offset: usize) -> InlineAnswer<'_> {
    let start = offset.min(stickers.len());
    let end = offset.saturating_add(PAGE_SIZE).min(stickers.len());
    let next = offset.saturating_add(PAGE_SIZE);

    InlineAnswer {
        results: &stickers[start..end],
        next_offset: (next <= stickers.len()).then_some(next),
        fallback: stickers.is_empty().then_some(NO_STICKERS_TEXT),
    }
}
