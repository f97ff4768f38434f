pub mod finnhub;
pub mod telegram;

pub use finnhub::{FinnhubClient, FinnhubConfig};
pub use telegram::TelegramClient;
