use std::time::Duration;

use {
    async_trait::async_trait,
    reqwest::Client,
    secrecy::{ExposeSecret, Secret},
    serde::de::DeserializeOwned,
    tracing::debug,
};

use {
    tubewatch_config::YoutubeConfig,
    tubewatch_watcher::{ChannelId, ContentLookup, Item, LookupError},
};

use crate::{
    Error, Result,
    api::{self, Channel, ListResponse, PlaylistItem},
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// [`ContentLookup`] backed by the YouTube Data API.
pub struct YoutubeLookup {
    http: Client,
    api_key: Secret<String>,
    base_url: String,
    video_url_base: String,
}

impl YoutubeLookup {
    pub fn new(config: &YoutubeConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::request("failed to build http client", e))?;
        Ok(Self::with_client(http, config))
    }

    pub fn with_client(http: Client, config: &YoutubeConfig) -> Self {
        Self {
            http,
            api_key: config.api_key.clone(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            video_url_base: config.video_url_base.clone(),
        }
    }

    /// Id of the playlist that holds every upload of `channel_id`.
    pub async fn uploads_playlist(&self, channel_id: &str) -> Result<String> {
        let list: ListResponse<Channel> = self
            .get_json("channels", &[("part", "contentDetails"), ("id", channel_id)])
            .await?;
        list.items
            .into_iter()
            .next()
            .map(|c| c.content_details.related_playlists.uploads)
            .ok_or_else(|| Error::channel_not_found(channel_id))
    }

    /// Newest entry of an uploads playlist.
    pub async fn latest_upload(&self, playlist_id: &str) -> Result<Item> {
        let list: ListResponse<PlaylistItem> = self
            .get_json("playlistItems", &[
                ("part", "snippet"),
                ("playlistId", playlist_id),
                ("maxResults", "1"),
            ])
            .await?;
        let entry = list
            .items
            .into_iter()
            .next()
            .ok_or_else(|| Error::empty_playlist(playlist_id))?;

        let video_id = entry.snippet.resource_id.video_id;
        Ok(Item {
            url: format!("{}{video_id}", self.video_url_base),
            title: entry.snippet.title,
            id: video_id,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        resource: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let url = format!("{}/{resource}", self.base_url);
        debug!(%url, "youtube api request");

        let resp = self
            .http
            .get(&url)
            .query(query)
            .query(&[("key", self.api_key.expose_secret().as_str())])
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| Error::request(format!("failed to call {resource}"), e))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Status {
                status,
                message: api::error_message(&body),
            });
        }

        resp.json()
            .await
            .map_err(|e| Error::request(format!("malformed {resource} response"), e))
    }
}

#[async_trait]
impl ContentLookup for YoutubeLookup {
    async fn latest_item(&self, channel: &ChannelId) -> std::result::Result<Item, LookupError> {
        let playlist = self
            .uploads_playlist(channel.as_str())
            .await
            .map_err(|e| LookupError::new(channel.clone(), e))?;
        self.latest_upload(&playlist)
            .await
            .map_err(|e| LookupError::new(channel.clone(), e))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        mockito::{Matcher, Server},
        rstest::rstest,
    };

    fn lookup_for(server: &Server) -> YoutubeLookup {
        let config = YoutubeConfig {
            api_key: Secret::new("test-key".into()),
            api_base_url: server.url(),
            ..Default::default()
        };
        YoutubeLookup::with_client(Client::new(), &config)
    }

    fn channels_query(channel: &str) -> Matcher {
        Matcher::AllOf(vec![
            Matcher::UrlEncoded("part".into(), "contentDetails".into()),
            Matcher::UrlEncoded("id".into(), channel.into()),
            Matcher::UrlEncoded("key".into(), "test-key".into()),
        ])
    }

    fn playlist_query(playlist: &str) -> Matcher {
        Matcher::AllOf(vec![
            Matcher::UrlEncoded("part".into(), "snippet".into()),
            Matcher::UrlEncoded("playlistId".into(), playlist.into()),
            Matcher::UrlEncoded("maxResults".into(), "1".into()),
            Matcher::UrlEncoded("key".into(), "test-key".into()),
        ])
    }

    #[tokio::test]
    async fn resolves_latest_upload() {
        let mut server = Server::new_async().await;
        let channels = server
            .mock("GET", "/channels")
            .match_query(channels_query("UC1"))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                serde_json::json!({
                    "items": [{"contentDetails": {"relatedPlaylists": {"uploads": "UU1"}}}]
                })
                .to_string(),
            )
            .create_async()
            .await;
        let items = server
            .mock("GET", "/playlistItems")
            .match_query(playlist_query("UU1"))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                serde_json::json!({
                    "items": [{"snippet": {
                        "title": "Launch day",
                        "resourceId": {"kind": "youtube#video", "videoId": "dQw4w9WgXcQ"}
                    }}]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let lookup = lookup_for(&server);
        let item = lookup.latest_item(&ChannelId::new("UC1")).await.unwrap();

        assert_eq!(item, Item {
            id: "dQw4w9WgXcQ".into(),
            title: "Launch day".into(),
            url: "https://www.youtube.com/watch?v=dQw4w9WgXcQ".into(),
        });
        channels.assert_async().await;
        items.assert_async().await;
    }

    #[tokio::test]
    async fn unknown_channel_is_lookup_error() {
        let mut server = Server::new_async().await;
        let _channels = server
            .mock("GET", "/channels")
            .match_query(channels_query("nope"))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"kind": "youtube#channelListResponse", "items": []}"#)
            .create_async()
            .await;

        let err = lookup_for(&server)
            .latest_item(&ChannelId::new("nope"))
            .await
            .unwrap_err();

        assert_eq!(err.channel.as_str(), "nope");
        assert!(err.to_string().contains("channel not found"));
    }

    #[tokio::test]
    async fn empty_uploads_playlist_is_lookup_error() {
        let mut server = Server::new_async().await;
        let _channels = server
            .mock("GET", "/channels")
            .match_query(channels_query("UC1"))
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "items": [{"contentDetails": {"relatedPlaylists": {"uploads": "UU1"}}}]
                })
                .to_string(),
            )
            .create_async()
            .await;
        let _items = server
            .mock("GET", "/playlistItems")
            .match_query(playlist_query("UU1"))
            .with_status(200)
            .with_body(r#"{"items": []}"#)
            .create_async()
            .await;

        let err = lookup_for(&server)
            .latest_item(&ChannelId::new("UC1"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("UU1 has no items"));
    }

    #[rstest]
    #[case::quota(403, r#"{"error": {"code": 403, "message": "quotaExceeded"}}"#, "quotaExceeded")]
    #[case::server(500, "backend error", "backend error")]
    #[tokio::test]
    async fn http_errors_carry_status(
        #[case] status: usize,
        #[case] body: &str,
        #[case] expected: &str,
    ) {
        let mut server = Server::new_async().await;
        let _channels = server
            .mock("GET", "/channels")
            .match_query(Matcher::Any)
            .with_status(status)
            .with_body(body)
            .create_async()
            .await;

        let err = lookup_for(&server)
            .latest_item(&ChannelId::new("UC1"))
            .await
            .unwrap_err();
        let text = err.to_string();
        assert!(text.contains(&format!("HTTP {status}")), "{text}");
        assert!(text.contains(expected), "{text}");
    }

    #[tokio::test]
    async fn transport_error_does_not_expose_api_key() {
        let config = YoutubeConfig {
            api_key: Secret::new("SUPERSECRETKEY".into()),
            api_base_url: "http://127.0.0.1:1".into(),
            ..Default::default()
        };
        let lookup = YoutubeLookup::with_client(Client::new(), &config);

        let err = lookup
            .latest_item(&ChannelId::new("UC1"))
            .await
            .unwrap_err();

        let mut chain = vec![err.to_string()];
        let mut cause = std::error::Error::source(&err);
        while let Some(e) = cause {
            chain.push(e.to_string());
            chain.push(format!("{e:?}"));
            cause = std::error::Error::source(e);
        }
        let text = chain.join(" | ");
        assert!(text.contains("failed to call channels"), "{text}");
        assert!(!text.contains("SUPERSECRETKEY"), "{text}");
    }

    #[tokio::test]
    async fn malformed_payload_is_lookup_error() {
        let mut server = Server::new_async().await;
        let _channels = server
            .mock("GET", "/channels")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"items": [{"contentDetails": {}}]}"#)
            .create_async()
            .await;

        let err = lookup_for(&server)
            .latest_item(&ChannelId::new("UC1"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("malformed channels response"));
    }
}
