/// 関連性フィルタ。見出しと要約をキーワード語彙に照合する純関数。

#[derive(Debug, Clone)]
pub struct RelevanceFilter {
    keywords: Vec<String>,
}

impl RelevanceFilter {
    /// Build a filter from the configured vocabulary. Keywords are lowercased
    /// and empty entries dropped.
    #[must_use]
    pub fn new(keywords: Vec<String>) -> Self {
        let keywords = keywords
            .into_iter()
            .map(|keyword| keyword.trim().to_lowercase())
            .filter(|keyword| !keyword.is_empty())
            .collect();
        Self { keywords }
    }

    /// True iff any keyword is a substring of the lowercased headline+summary.
    ///
    /// Plain substring match, no token boundaries: a short keyword like "us"
    /// also hits inside "business". The default vocabulary was tuned with this
    /// semantic; see DESIGN.md before changing it.
    #[must_use]
    pub fn is_relevant(&self, headline: &str, summary: &str) -> bool {
        let text = format!("{headline} {summary}").to_lowercase();
        self.keywords
            .iter()
            .any(|keyword| text.contains(keyword.as_str()))
    }
}
