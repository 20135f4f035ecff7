use serde::{Deserialize, Serialize};

pub const RAWG_API_BASE_URL: &str = "https://api.rawg.io/api/";

/// Width and height of the cropped cover art.
pub const COVER_CROP: (u32, u32) = (600, 400);

/// A single game in a RAWG search result. Only the fields used for cover
/// art are kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawgGameResult {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub background_image: Option<String>,
}

/// A page of RAWG search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawgGamesResponse {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<RawgGameResult>,
}

impl RawgGamesResponse {
    /// The first result that has an image, as `(rawg id, cropped image url)`.
    pub fn first_cover(&self) -> Option<(i64, String)> {
        self.results.iter().find_map(|r| {
            r.background_image
                .as_deref()
                .filter(|url| !url.is_empty())
                .map(|url| (r.id, crop_image_url(url)))
        })
    }
}

/// Rewrites a RAWG media URL to its cropped variant, e.g.
/// `https://media.rawg.io/media/games/x.jpg` becomes
/// `https://media.rawg.io/media/crop/600/400/games/x.jpg`. Other URLs, and
/// URLs that are already cropped, are returned unchanged.
pub fn crop_image_url(url: &str) -> String {
    const MEDIA: &str = "/media/";

    match url.split_once(MEDIA) {
        Some((_, rest)) if rest.starts_with("crop/") || rest.starts_with("resize/") => {
            url.to_string()
        }
        Some((head, rest)) => {
            let (w, h) = COVER_CROP;
            format!("{head}{MEDIA}crop/{w}/{h}/{rest}")
        }
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(
        "https://media.rawg.io/media/games/b45/b45575f34285f2c4479c9a5f719d972e.jpg",
        "https://media.rawg.io/media/crop/600/400/games/b45/b45575f34285f2c4479c9a5f719d972e.jpg"
    )]
    #[case(
        "https://media.rawg.io/media/crop/600/400/games/a.jpg",
        "https://media.rawg.io/media/crop/600/400/games/a.jpg"
    )]
    #[case("https://example.com/cover.png", "https://example.com/cover.png")]
    fn crops(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(crop_image_url(input), expected);
    }

    #[test]
    fn first_cover_skips_results_without_image() {
        let response: RawgGamesResponse = serde_json::from_value(serde_json::json!({
            "count": 2,
            "next": null,
            "previous": null,
            "results": [
                { "id": 1, "slug": "hades-demo", "name": "Hades Demo", "background_image": null, "rating": 3.1 },
                { "id": 2, "slug": "hades", "name": "Hades", "background_image": "https://media.rawg.io/media/games/h.jpg" },
            ],
        }))
        .unwrap();

        assert_eq!(
            response.first_cover(),
            Some((2, "https://media.rawg.io/media/crop/600/400/games/h.jpg".to_string()))
        );
    }
}
