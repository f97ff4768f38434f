// モジュールの公開と型の再エクスポート
pub mod dao_impl;
pub mod dao_trait;
pub mod types;

#[cfg(test)]
pub(crate) mod mock;

pub use dao_impl::BroadcastDaoImpl;
pub use dao_trait::BroadcastDao;
pub use types::{AddOutcome, RecordOutcome, RemoveOutcome};
