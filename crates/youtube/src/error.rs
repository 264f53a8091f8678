use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{context}: {source}")]
    Request {
        context: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("youtube api returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("channel not found: {channel_id}")]
    ChannelNotFound { channel_id: String },

    #[error("uploads playlist {playlist_id} has no items")]
    EmptyPlaylist { playlist_id: String },
}

impl Error {
    /// The request URL is dropped from `source`: it carries the API key.
    #[must_use]
    pub fn request(context: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Request {
            context: context.into(),
            source: source.without_url(),
        }
    }

    #[must_use]
    pub fn channel_not_found(channel_id: impl Into<String>) -> Self {
        Self::ChannelNotFound {
            channel_id: channel_id.into(),
        }
    }

    #[must_use]
    pub fn empty_playlist(playlist_id: impl Into<String>) -> Self {
        Self::EmptyPlaylist {
            playlist_id: playlist_id.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
