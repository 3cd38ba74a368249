//! HTTP client for the track-search provider.
//!
//! Two query channels exist per genre: the top-songs chart feed (recency) and
//! term searches seeded from a per-genre pool of popular artists. Channel
//! methods never fail outward: any network error, non-success status, or
//! unexpected payload is logged and yields an empty batch, so an aggregation
//! round degrades to "fewer items" instead of halting navigation.

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use super::models::{self, Track};

const SEARCH_URL: &str = "https://itunes.apple.com/search";
const CHART_URL: &str = "https://itunes.apple.com/us/rss/topsongs";

/// Chart feed entries requested per query; the offset window rotates inside.
const CHART_FETCH_SIZE: usize = 100;

/// Results requested per artist search before the per-round window is taken.
const ARTIST_FETCH_SIZE: usize = 50;

/// Courtesy gap between consecutive artist searches within one channel.
const ARTIST_QUERY_GAP: Duration = Duration::from_millis(50);

/// Catalog client errors. Internal only; channel methods swallow these.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected response shape: missing {0}")]
    Shape(&'static str),
}

/// Client for the upstream catalog.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
}

impl CatalogClient {
    /// Create a client with a bounded per-request timeout.
    pub fn new(timeout: Duration) -> Result<Self, CatalogError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }

    async fn get_json(&self, url: &str) -> Result<Value, CatalogError> {
        let response = self.http.get(url).send().await?.error_for_status()?;
        Ok(response.json::<Value>().await?)
    }

    /// Chart channel: top songs for a genre, windowed by the round offset so
    /// repeated rounds surface different slices of the chart.
    pub async fn chart_tracks(&self, genre: &str, limit: usize, offset: u32) -> Vec<Track> {
        let Some(genre_id) = genre_id(genre) else {
            tracing::warn!(genre, "unknown genre, skipping chart channel");
            return Vec::new();
        };

        let url = format!("{CHART_URL}/limit={CHART_FETCH_SIZE}/genre={genre_id}/json");
        let payload = match self.get_json(&url).await {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(genre, error = %e, "chart channel failed");
                return Vec::new();
            }
        };

        let tracks: Vec<Track> = feed_entries(&payload)
            .iter()
            .filter_map(|entry| models::chart_entry_track(genre, entry))
            .collect();

        offset_window(&tracks, limit, offset as usize)
    }

    /// Popularity channel: searches seeded from the genre's artist pool,
    /// rotated by the round offset.
    pub async fn popular_tracks(&self, genre: &str, limit: usize, offset: u32) -> Vec<Track> {
        let pool = popular_artists(genre);
        if pool.is_empty() || limit == 0 {
            return Vec::new();
        }

        let num_artists = limit.div_ceil(3).min(pool.len());
        let per_artist = limit.div_ceil(num_artists);
        let start = (offset as usize * num_artists) % pool.len();

        let mut tracks = Vec::new();
        for i in 0..num_artists {
            let artist = pool[(start + i) % pool.len()];
            if i > 0 {
                tokio::time::sleep(ARTIST_QUERY_GAP).await;
            }

            let found = self.search_tracks(artist, ARTIST_FETCH_SIZE, Some(genre)).await;
            tracks.extend(offset_window(&found, per_artist, offset as usize));
        }

        tracks.truncate(limit);
        tracks
    }

    /// Free-term search. Items without a playable preview are dropped.
    pub async fn search_tracks(
        &self,
        term: &str,
        limit: usize,
        genre_hint: Option<&str>,
    ) -> Vec<Track> {
        let url = format!(
            "{SEARCH_URL}?term={}&media=music&entity=song&limit={limit}",
            urlencoding::encode(term)
        );

        let payload = match self.get_json(&url).await {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(term, error = %e, "search failed");
                return Vec::new();
            }
        };

        payload
            .get("results")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| models::search_result_track(genre_hint, item))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Extract chart feed entries, tolerating the provider's single-entry quirk
/// where `entry` is an object instead of a one-element array.
fn feed_entries(payload: &Value) -> Vec<Value> {
    match payload.pointer("/feed/entry") {
        Some(Value::Array(entries)) => entries.clone(),
        Some(entry @ Value::Object(_)) => vec![entry.clone()],
        _ => {
            tracing::debug!(error = %CatalogError::Shape("feed.entry"), "empty chart payload");
            Vec::new()
        }
    }
}

/// Take `limit` items starting at a rotating offset, wrapping around, so each
/// aggregation round sees a different slice of the same upstream page.
fn offset_window(items: &[Track], limit: usize, offset: usize) -> Vec<Track> {
    if items.len() <= limit {
        return items.to_vec();
    }
    let start = (offset * limit) % items.len();
    items
        .iter()
        .cycle()
        .skip(start)
        .take(limit)
        .cloned()
        .collect()
}

/// Provider genre ids for the genres the discovery feed understands.
pub fn genre_id(genre: &str) -> Option<u32> {
    let id = match genre {
        "Pop" => 14,
        "Hip-Hop/Rap" => 18,
        "Rock" => 21,
        "Electronic" => 7,
        "R&B/Soul" => 15,
        "Alternative" => 20,
        "Country" => 6,
        "Dance" => 17,
        "Indie" => 1122,
        "Latin" => 12,
        _ => return None,
    };
    Some(id)
}

/// Seed artists for the popularity channel, per genre.
fn popular_artists(genre: &str) -> &'static [&'static str] {
    match genre {
        "Pop" => &[
            "ariana grande",
            "billie eilish",
            "dua lipa",
            "the weeknd",
            "olivia rodrigo",
            "taylor swift",
            "sabrina carpenter",
            "charli xcx",
            "lana del rey",
        ],
        "Hip-Hop/Rap" => &[
            "drake",
            "travis scott",
            "playboi carti",
            "future",
            "21 savage",
            "metro boomin",
            "central cee",
            "baby keem",
            "lil tecca",
        ],
        "Electronic" => &[
            "calvin harris",
            "marshmello",
            "david guetta",
            "kygo",
            "zedd",
            "skrillex",
            "martin garrix",
            "illenium",
        ],
        "R&B/Soul" => &[
            "sza",
            "frank ocean",
            "summer walker",
            "brent faiyaz",
            "daniel caesar",
            "steve lacy",
            "kali uchis",
        ],
        "Alternative" => &[
            "arctic monkeys",
            "the 1975",
            "tame impala",
            "glass animals",
            "the neighbourhood",
            "phoebe bridgers",
            "cigarettes after sex",
        ],
        "Dance" => &[
            "disclosure",
            "fred again",
            "odesza",
            "rufus du sol",
            "kaytranada",
            "flume",
            "john summit",
            "fisher",
        ],
        "Rock" => &[
            "foo fighters",
            "the killers",
            "royal blood",
            "nothing but thieves",
            "greta van fleet",
        ],
        "Country" => &[
            "morgan wallen",
            "luke combs",
            "zach bryan",
            "jelly roll",
            "parker mccollum",
        ],
        "Latin" => &[
            "bad bunny",
            "peso pluma",
            "karol g",
            "feid",
            "rauw alejandro",
        ],
        "Indie" => &[
            "wet leg",
            "beabadoobee",
            "clairo",
            "rex orange county",
            "faye webster",
            "mitski",
            "conan gray",
        ],
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: u64) -> Track {
        Track {
            id,
            title: format!("t{id}"),
            artist: String::from("a"),
            genre: String::from("Pop"),
            preview_url: String::from("https://audio.example/p.m4a"),
            artwork_url: String::new(),
            album_name: String::new(),
            release_date: String::new(),
            track_time_millis: 30_000,
        }
    }

    #[test]
    fn test_offset_window_rotates_per_round() {
        let items: Vec<Track> = (0..10).map(track).collect();

        let round0: Vec<u64> = offset_window(&items, 4, 0).iter().map(|t| t.id).collect();
        let round1: Vec<u64> = offset_window(&items, 4, 1).iter().map(|t| t.id).collect();

        assert_eq!(round0, vec![0, 1, 2, 3]);
        assert_eq!(round1, vec![4, 5, 6, 7]);
    }

    #[test]
    fn test_offset_window_wraps_past_end() {
        let items: Vec<Track> = (0..5).map(track).collect();
        let ids: Vec<u64> = offset_window(&items, 3, 1).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![3, 4, 0]);
    }

    #[test]
    fn test_offset_window_short_input_returned_whole() {
        let items: Vec<Track> = (0..2).map(track).collect();
        assert_eq!(offset_window(&items, 10, 7).len(), 2);
    }

    #[test]
    fn test_known_genres_have_ids() {
        for genre in ["Pop", "Hip-Hop/Rap", "Indie", "Latin"] {
            assert!(genre_id(genre).is_some(), "missing id for {genre}");
        }
        assert!(genre_id("Vaporwave").is_none());
    }

    #[test]
    fn test_single_entry_feed_is_tolerated() {
        let payload = serde_json::json!({ "feed": { "entry": { "im:name": { "label": "x" } } } });
        assert_eq!(feed_entries(&payload).len(), 1);
        assert!(feed_entries(&serde_json::json!({ "feed": {} })).is_empty());
    }
}
