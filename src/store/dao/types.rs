/// 購読者セットと配信済み台帳の操作結果。
///
/// どの結果も呼び出し側にとってはエラーではない。重複追加・不在削除・重複記録は
/// 正常系として区別して報告される。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadyPresent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    NotPresent,
    /// The seeded broadcast channel cannot be removed through the public API.
    Protected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Recorded,
    AlreadyRecorded,
}
