//! Cover art lookup.
use async_trait::async_trait;
use gametracker_dto::client::{self, ClientConfig, RawgClient};
use gametracker_dto::GameDraft;
use tracing::{debug, info, warn};

/// Number of search results inspected for an image.
const SEARCH_PAGE_SIZE: u32 = 5;

/// Something that can find a cover image for a title.
#[async_trait]
pub trait CoverSource {
    /// Returns `(catalog id, image url)` for the best match, if any.
    async fn find_cover(&self, title: &str) -> Result<Option<(i64, String)>, client::Error>;
}

#[async_trait]
impl CoverSource for RawgClient {
    async fn find_cover(&self, title: &str) -> Result<Option<(i64, String)>, client::Error> {
        Ok(self.search_games(title, SEARCH_PAGE_SIZE).await?.first_cover())
    }
}

/// Builds a RAWG client, or `None` when no API key is configured.
pub fn rawg_client(config: &crate::config::Config) -> Result<Option<RawgClient>, client::Error> {
    let Some(api_key) = config.rawg_api_key.as_deref() else {
        return Ok(None);
    };
    let client = RawgClient::new(
        ClientConfig::new()
            .with_url(config.rawg_base_url.as_str())?
            .with_api_key(api_key),
    )?;
    Ok(Some(client))
}

/// Whether a lookup may set the cover of `draft`: it has none yet, or
/// `force` asks to replace it.
pub fn needs_cover(draft: &GameDraft, force: bool) -> bool {
    force || draft.cover_image_url.is_none()
}

/// Fills in the cover of `draft`. Games that already have a cover are left
/// alone unless `force` is set. Lookup failures are logged and reported as
/// `false`; they never fail the caller.
pub async fn fill_cover(source: &impl CoverSource, draft: &mut GameDraft, force: bool) -> bool {
    if !needs_cover(draft, force) {
        debug!(title = %draft.title, "Already has a cover");
        return false;
    }

    match source.find_cover(&draft.title).await {
        Ok(Some((rawg_id, url))) => {
            info!(title = %draft.title, rawg_id, %url, "Found cover");
            draft.rawg_id = Some(rawg_id);
            draft.cover_image_url = Some(url);
            true
        }
        Ok(None) => {
            warn!(title = %draft.title, "No cover found");
            false
        }
        Err(e) => {
            warn!(title = %draft.title, error = %e, "Cover lookup failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gametracker_dto::GameStatus;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeSource {
        covers: HashMap<&'static str, (i64, &'static str)>,
        lookups: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CoverSource for FakeSource {
        async fn find_cover(&self, title: &str) -> Result<Option<(i64, String)>, client::Error> {
            self.lookups.lock().unwrap().push(title.to_string());
            Ok(self
                .covers
                .get(title)
                .map(|(id, url)| (*id, url.to_string())))
        }
    }

    fn draft(title: &str) -> GameDraft {
        GameDraft::new(title, vec!["PC".into()], GameStatus::Finished)
    }

    fn source() -> FakeSource {
        FakeSource {
            covers: HashMap::from([("Hades", (274755, "https://media.rawg.io/media/crop/600/400/games/h.jpg"))]),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn fills_missing_cover() {
        let source = source();
        let mut d = draft("Hades");
        assert!(fill_cover(&source, &mut d, false).await);
        assert_eq!(d.rawg_id, Some(274755));
        assert_eq!(
            d.cover_image_url.as_deref(),
            Some("https://media.rawg.io/media/crop/600/400/games/h.jpg")
        );
    }

    #[tokio::test]
    async fn keeps_existing_cover_unless_forced() {
        let source = source();
        let mut d = draft("Hades");
        d.cover_image_url = Some("https://example.com/mine.png".into());

        assert!(!fill_cover(&source, &mut d, false).await);
        assert_eq!(d.cover_image_url.as_deref(), Some("https://example.com/mine.png"));
        assert!(source.lookups.lock().unwrap().is_empty());

        assert!(fill_cover(&source, &mut d, true).await);
        assert_eq!(d.rawg_id, Some(274755));
    }

    #[test]
    fn existing_cover_needs_force() {
        let mut d = draft("Hades");
        assert!(needs_cover(&d, false));

        d.cover_image_url = Some("https://example.com/mine.png".into());
        assert!(!needs_cover(&d, false));
        assert!(needs_cover(&d, true));
    }

    #[tokio::test]
    async fn unknown_title_leaves_draft_untouched() {
        let source = source();
        let mut d = draft("Nope");
        assert!(!fill_cover(&source, &mut d, false).await);
        assert_eq!(d, draft("Nope"));
    }
}
