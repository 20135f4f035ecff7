#[cfg(feature = "client")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid url")]
    InvalidUrl(#[from] url::ParseError),
    #[error("url cannot be used as an API base: {0}")]
    CannotBeABase(url::Url),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Server error: {0}\n{1}")]
    ServerError(reqwest::StatusCode, String),
}

#[cfg(feature = "client")]
#[derive(Default, Debug, Clone)]
pub struct ClientConfig<'a> {
    pub url_base: Option<url::Url>,
    pub api_key: Option<&'a str>,
}

#[cfg(feature = "client")]
impl<'a> ClientConfig<'a> {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_url(mut self, url: impl AsRef<str>) -> Result<Self, Error> {
        let url = url::Url::parse(url.as_ref())?;
        if url.cannot_be_a_base() {
            return Err(Error::CannotBeABase(url));
        }
        self.url_base = Some(url);
        Ok(self)
    }

    pub fn with_api_key(mut self, api_key: &'a str) -> Self {
        self.api_key = Some(api_key);
        self
    }
}

pub mod routes {
    use url::Url;

    /// Appends `segment` to the path of `base`, whether or not `base` ends
    /// with a slash.
    fn join(base: &Url, segment: &str) -> Url {
        let mut url = base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(segment);
        }
        url
    }

    /// `GET games`: key-based search of the catalog.
    pub fn games_search(base: &Url, api_key: &str, search: &str, page_size: u32) -> Url {
        let mut url = join(base, "games");
        url.query_pairs_mut()
            .append_pair("key", api_key)
            .append_pair("search", search)
            .append_pair("page_size", &page_size.to_string());
        url
    }

}

#[cfg(feature = "client")]
pub mod v1 {
    use super::{ClientConfig, Error};
    use crate::rawg::{RawgGamesResponse, RAWG_API_BASE_URL};
    use reqwest::{Client, Url};
    use tracing::debug;

    /// A client for the RAWG catalog. Only the key-based game search is
    /// supported.
    pub struct RawgClient {
        base: Url,
        api_key: String,
        client: Client,
    }

    impl RawgClient {
        pub fn new(ClientConfig { url_base, api_key }: ClientConfig) -> Result<Self, Error> {
            let base = match url_base {
                Some(url) => url,
                None => Url::parse(RAWG_API_BASE_URL)?,
            };
            let client = Client::builder()
                .user_agent(concat!("gametracker/", env!("CARGO_PKG_VERSION")))
                .build()?;

            Ok(Self {
                base,
                api_key: api_key.unwrap_or_default().to_string(),
                client,
            })
        }

        pub async fn search_games(
            &self,
            search: &str,
            page_size: u32,
        ) -> Result<RawgGamesResponse, Error> {
            let url = super::routes::games_search(&self.base, &self.api_key, search, page_size);
            debug!(search, page_size, "Searching RAWG");

            let response = self.client.get(url).send().await?;

            if response.status().is_success() {
                Ok(response.json().await?)
            } else {
                let status = response.status();
                let body = response.text().await?;
                Err(Error::ServerError(status, body))
            }
        }
    }
}

#[cfg(feature = "client")]
pub use v1::RawgClient;
