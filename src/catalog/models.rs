//! Track model and lenient parsing of provider payloads.
//!
//! The provider returns two payload shapes: flat search results and the
//! attribute-heavy chart RSS feed. Both are parsed one entry at a time so a
//! single malformed entry is dropped without failing the batch, and any entry
//! without a playable preview URL is discarded before it reaches the feed.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default preview length for chart entries, which carry no duration field.
const CHART_PREVIEW_MILLIS: u64 = 30_000;

/// A single playable music item with preview audio and metadata.
///
/// Immutable once fetched. `id` is the provider-stable key used for global
/// feed deduplication and favorites identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: u64,
    pub title: String,
    pub artist: String,
    pub genre: String,
    pub preview_url: String,
    pub artwork_url: String,
    pub album_name: String,
    pub release_date: String,
    pub track_time_millis: u64,
}

impl Track {
    /// Release year extracted from the ISO-ish release date, for display.
    pub fn release_year(&self) -> Option<&str> {
        let year = self.release_date.get(0..4)?;
        year.chars().all(|c| c.is_ascii_digit()).then_some(year)
    }
}

/// Parse one item from a `/search` response.
///
/// Returns `None` for items missing a preview URL or any required field.
/// `genre_hint` overrides the provider genre when the query was genre-scoped.
pub fn search_result_track(genre_hint: Option<&str>, item: &Value) -> Option<Track> {
    let preview_url = item.get("previewUrl")?.as_str()?.to_string();
    let id = item.get("trackId")?.as_u64()?;
    let title = item.get("trackName")?.as_str()?.to_string();
    let artist = item.get("artistName")?.as_str()?.to_string();

    let genre = genre_hint
        .map(str::to_string)
        .or_else(|| str_field(item, "primaryGenreName"))
        .unwrap_or_default();

    let artwork_url = str_field(item, "artworkUrl100")
        .map(|url| upscale_artwork(&url, "100x100"))
        .unwrap_or_default();

    Some(Track {
        id,
        title: title.clone(),
        artist,
        genre,
        preview_url,
        artwork_url,
        album_name: str_field(item, "collectionName").unwrap_or(title),
        release_date: str_field(item, "releaseDate").unwrap_or_default(),
        track_time_millis: item
            .get("trackTimeMillis")
            .and_then(Value::as_u64)
            .unwrap_or(CHART_PREVIEW_MILLIS),
    })
}

/// Parse one entry from the top-songs chart RSS feed.
///
/// Chart entries only expose a preview through an `audio/x-m4a` link; entries
/// without one are dropped.
pub fn chart_entry_track(genre: &str, entry: &Value) -> Option<Track> {
    let preview_url = entry
        .get("link")?
        .as_array()?
        .iter()
        .find_map(|link| {
            let attrs = link.get("attributes")?;
            if attrs.get("type")?.as_str()? == "audio/x-m4a" {
                Some(attrs.get("href")?.as_str()?.to_string())
            } else {
                None
            }
        })?;

    let id = entry
        .pointer("/id/attributes/im:id")?
        .as_str()?
        .parse::<u64>()
        .ok()?;
    let title = entry.pointer("/im:name/label")?.as_str()?.to_string();
    let artist = entry.pointer("/im:artist/label")?.as_str()?.to_string();

    let artwork_url = entry
        .pointer("/im:image/2/label")
        .and_then(Value::as_str)
        .map(|url| upscale_artwork(url, "170x170"))
        .unwrap_or_default();

    let album_name = entry
        .pointer("/im:collection/im:name/label")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| title.clone());

    let release_date = entry
        .pointer("/im:releaseDate/attributes/label")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_default();

    Some(Track {
        id,
        title,
        artist,
        genre: genre.to_string(),
        preview_url,
        artwork_url,
        album_name,
        release_date,
        track_time_millis: CHART_PREVIEW_MILLIS,
    })
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key)?.as_str().map(str::to_string)
}

/// Swap the provider's small artwork variant for the 600x600 one.
fn upscale_artwork(url: &str, from: &str) -> String {
    url.replace(from, "600x600")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn search_item() -> Value {
        json!({
            "trackId": 123456,
            "trackName": "Test Song",
            "artistName": "Test Artist",
            "primaryGenreName": "Pop",
            "previewUrl": "https://audio.example/preview.m4a",
            "artworkUrl100": "https://img.example/cover/100x100bb.jpg",
            "collectionName": "Test Album",
            "releaseDate": "2024-03-01T00:00:00Z",
            "trackTimeMillis": 201_000
        })
    }

    #[test]
    fn test_search_result_parsed() {
        let track = search_result_track(None, &search_item()).unwrap();
        assert_eq!(track.id, 123456);
        assert_eq!(track.title, "Test Song");
        assert_eq!(track.genre, "Pop");
        assert_eq!(track.artwork_url, "https://img.example/cover/600x600bb.jpg");
        assert_eq!(track.track_time_millis, 201_000);
        assert_eq!(track.release_year(), Some("2024"));
    }

    #[test]
    fn test_search_result_genre_hint_wins() {
        let track = search_result_track(Some("Dance"), &search_item()).unwrap();
        assert_eq!(track.genre, "Dance");
    }

    #[test]
    fn test_search_result_without_preview_dropped() {
        let mut item = search_item();
        item.as_object_mut().unwrap().remove("previewUrl");
        assert!(search_result_track(None, &item).is_none());
    }

    #[test]
    fn test_search_result_malformed_dropped() {
        // Wrong type for the id must not panic or produce a track.
        let mut item = search_item();
        item["trackId"] = json!("not-a-number");
        assert!(search_result_track(None, &item).is_none());
    }

    fn chart_entry() -> Value {
        json!({
            "id": { "attributes": { "im:id": "987654" } },
            "im:name": { "label": "Chart Song" },
            "im:artist": { "label": "Chart Artist" },
            "im:image": [
                { "label": "https://img.example/55x55bb.jpg" },
                { "label": "https://img.example/60x60bb.jpg" },
                { "label": "https://img.example/170x170bb.jpg" }
            ],
            "im:collection": { "im:name": { "label": "Chart Album" } },
            "im:releaseDate": { "attributes": { "label": "June 6, 2025" } },
            "link": [
                { "attributes": { "type": "text/html", "href": "https://page.example" } },
                { "attributes": { "type": "audio/x-m4a", "href": "https://audio.example/chart.m4a" } }
            ]
        })
    }

    #[test]
    fn test_chart_entry_parsed() {
        let track = chart_entry_track("Electronic", &chart_entry()).unwrap();
        assert_eq!(track.id, 987654);
        assert_eq!(track.genre, "Electronic");
        assert_eq!(track.preview_url, "https://audio.example/chart.m4a");
        assert_eq!(track.artwork_url, "https://img.example/600x600bb.jpg");
        assert_eq!(track.track_time_millis, 30_000);
    }

    #[test]
    fn test_chart_entry_without_audio_link_dropped() {
        let mut entry = chart_entry();
        entry["link"] = json!([
            { "attributes": { "type": "text/html", "href": "https://page.example" } }
        ]);
        assert!(chart_entry_track("Pop", &entry).is_none());
    }

    #[test]
    fn test_chart_entry_album_falls_back_to_title() {
        let mut entry = chart_entry();
        entry.as_object_mut().unwrap().remove("im:collection");
        let track = chart_entry_track("Pop", &entry).unwrap();
        assert_eq!(track.album_name, "Chart Song");
    }
}
