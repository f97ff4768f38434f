/// コマンド面が理解するボットコマンド。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Subscribe,
    Unsubscribe,
    News,
}

impl Command {
    /// Parse the leading bot command from a message text.
    ///
    /// Accepts an optional `@BotName` suffix and trailing arguments; anything
    /// that is not a known command returns `None`.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let first = text.trim().split_whitespace().next()?;
        let command = first.strip_prefix('/')?;
        let command = command.split('@').next().unwrap_or(command);

        match command {
            "start" => Some(Self::Start),
            "help" => Some(Self::Help),
            "subscribe" => Some(Self::Subscribe),
            "unsubscribe" => Some(Self::Unsubscribe),
            "news" => Some(Self::News),
            _ => None,
        }
    }
}
