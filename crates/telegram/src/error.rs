use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Telegram(#[from] teloxide::RequestError),

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error("conversation id is not a telegram chat id: {conversation}")]
    InvalidChatId { conversation: String },
}

impl Error {
    #[must_use]
    pub fn invalid_chat_id(conversation: impl Into<String>) -> Self {
        Self::InvalidChatId {
            conversation: conversation.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
