//! Listing watch engine: page fetch, extraction, persistence and delivery.
mod decode;
mod extract;
mod fetch;
mod notify;
mod persist;
mod run;
mod types;

pub use decode::{decode_html, DecodedHtml};
pub use extract::{CardMarkers, ExtractError, ListingExtractor};
pub use fetch::{FetchSettings, PageFetcher, ReqwestFetcher};
pub use notify::{
    dispatch, Messenger, ParseMode, SendFailure, TelegramMessenger, TelegramSettings,
    TELEGRAM_API_BASE,
};
pub use persist::{AtomicFileWriter, JsonSeenStore, PersistError, SeenStore};
pub use run::Runner;
pub use types::{FailureKind, FetchError, FetchMetadata, FetchedPage};
