pub mod broadcast;
pub mod fetch;
pub mod filter;
pub mod orchestrator;

pub use broadcast::{Notifier, TelegramNotifier};
pub use fetch::{FetchStage, FinnhubFetchStage, NewsItem};
pub use filter::RelevanceFilter;
pub use orchestrator::{BroadcastPipeline, PipelineReport};
