use std::collections::HashSet;

/// 特権コマンド用の静的許可リスト。
///
/// コマンド層だけが参照する。パイプライン本体は認可を一切知らない。
#[derive(Debug, Clone)]
pub struct AuthorizationPolicy {
    allowed: HashSet<String>,
}

impl AuthorizationPolicy {
    #[must_use]
    pub fn new(allowed: impl IntoIterator<Item = String>) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn is_authorized(&self, caller_id: &str) -> bool {
        self.allowed.contains(caller_id)
    }
}
