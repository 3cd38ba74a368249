//! Feed aggregator: grows the ordered track sequence one round at a time.
//!
//! A round is a coordinated multi-genre, multi-channel fetch. The feed itself
//! owns the invariants: no duplicate track ids across the whole session, at
//! most one round in flight, and stale completions (from before a reset) are
//! discarded via the session token.

use std::collections::HashSet;

use futures::future::join_all;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::catalog::{CatalogClient, Track};

/// Genres queried when the user has no preference of their own.
const TRENDING_POOL: &[&str] = &[
    "Pop",
    "Hip-Hop/Rap",
    "Electronic",
    "R&B/Soul",
    "Alternative",
    "Dance",
];

/// Genres sampled per aggregation round.
const GENRES_PER_ROUND: usize = 3;

/// One planned aggregation round, handed to a fetch task. Carries the session
/// token so a completion arriving after a reset can be recognized as stale.
#[derive(Debug, Clone)]
pub struct RoundPlan {
    pub session: u64,
    pub offset: u32,
    pub genres: Vec<String>,
}

/// The append-only, globally-deduplicated track sequence.
#[derive(Debug, Default)]
pub struct Feed {
    tracks: Vec<Track>,
    seen: HashSet<u64>,
    fetch_offset: u32,
    in_flight: bool,
    session: u64,
}

impl Feed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Clear everything and invalidate any round still in flight. The next
    /// `begin_round` starts over at offset 0.
    pub fn reset(&mut self) {
        self.tracks.clear();
        self.seen.clear();
        self.fetch_offset = 0;
        self.in_flight = false;
        self.session = self.session.wrapping_add(1);
    }

    /// Plan the next aggregation round, or `None` if one is already in
    /// flight. Genre selection is re-rolled every round: up to three of the
    /// user's preferred genres, falling back to the trending pool.
    pub fn begin_round<R: Rng>(&mut self, preferred: &[String], rng: &mut R) -> Option<RoundPlan> {
        if self.in_flight {
            return None;
        }

        let pool: Vec<String> = if preferred.is_empty() {
            TRENDING_POOL.iter().map(|g| g.to_string()).collect()
        } else {
            preferred.to_vec()
        };
        let genres: Vec<String> = pool
            .choose_multiple(rng, GENRES_PER_ROUND.min(pool.len()))
            .cloned()
            .collect();

        let plan = RoundPlan {
            session: self.session,
            offset: self.fetch_offset,
            genres,
        };

        self.in_flight = true;
        self.fetch_offset += 1;
        Some(plan)
    }

    /// Fold a completed round into the feed. Results from a stale session are
    /// dropped without touching the current round's in-flight guard. New
    /// tracks are deduplicated against the entire feed, shuffled, appended.
    pub fn complete_round<R: Rng>(&mut self, session: u64, tracks: Vec<Track>, rng: &mut R) {
        if session != self.session {
            tracing::debug!(session, current = self.session, "discarding stale round");
            return;
        }
        self.in_flight = false;

        let mut fresh: Vec<Track> = tracks
            .into_iter()
            .filter(|track| self.seen.insert(track.id))
            .collect();
        fresh.shuffle(rng);

        tracing::info!(added = fresh.len(), total = self.tracks.len() + fresh.len(), "round complete");
        self.tracks.extend(fresh);
    }
}

/// Execute one aggregation round: for every planned genre, run the chart and
/// popularity channels concurrently and merge their results. Individual
/// channel failures already degrade to empty batches inside the client, so
/// this always resolves.
pub async fn run_round(catalog: &CatalogClient, plan: &RoundPlan, per_genre: usize) -> Vec<Track> {
    let fetches = plan.genres.iter().map(|genre| async move {
        let (charts, popular) = tokio::join!(
            catalog.chart_tracks(genre, per_genre, plan.offset),
            catalog.popular_tracks(genre, per_genre, plan.offset),
        );
        charts.into_iter().chain(popular).collect::<Vec<Track>>()
    });

    join_all(fetches).await.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

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

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_dedup_within_and_across_rounds() {
        let mut feed = Feed::new();
        let mut rng = rng();

        let plan = feed.begin_round(&[], &mut rng).unwrap();
        feed.complete_round(plan.session, vec![track(1), track(2), track(2)], &mut rng);
        assert_eq!(feed.len(), 2);

        let plan = feed.begin_round(&[], &mut rng).unwrap();
        feed.complete_round(plan.session, vec![track(2), track(3)], &mut rng);

        assert_eq!(feed.len(), 3);
        let ids: HashSet<u64> = (0..feed.len()).map(|i| feed.get(i).unwrap().id).collect();
        assert_eq!(ids.len(), feed.len());
    }

    #[test]
    fn test_second_round_dropped_while_in_flight() {
        let mut feed = Feed::new();
        let mut rng = rng();

        let plan = feed.begin_round(&[], &mut rng).unwrap();
        assert!(feed.begin_round(&[], &mut rng).is_none());
        assert!(feed.begin_round(&[], &mut rng).is_none());

        feed.complete_round(plan.session, vec![track(1)], &mut rng);
        assert!(feed.begin_round(&[], &mut rng).is_some());
    }

    #[test]
    fn test_offset_increments_per_round() {
        let mut feed = Feed::new();
        let mut rng = rng();

        let first = feed.begin_round(&[], &mut rng).unwrap();
        feed.complete_round(first.session, Vec::new(), &mut rng);
        let second = feed.begin_round(&[], &mut rng).unwrap();

        assert_eq!(first.offset, 0);
        assert_eq!(second.offset, 1);
    }

    #[test]
    fn test_empty_round_leaves_feed_unchanged() {
        let mut feed = Feed::new();
        let mut rng = rng();

        let plan = feed.begin_round(&[], &mut rng).unwrap();
        feed.complete_round(plan.session, vec![track(1)], &mut rng);

        let plan = feed.begin_round(&[], &mut rng).unwrap();
        feed.complete_round(plan.session, Vec::new(), &mut rng);

        assert_eq!(feed.len(), 1);
        assert!(!feed.in_flight());
    }

    #[test]
    fn test_stale_round_discarded_after_reset() {
        let mut feed = Feed::new();
        let mut rng = rng();

        let stale = feed.begin_round(&[], &mut rng).unwrap();
        feed.reset();

        // A new round begins under the new session while the old response is
        // still on the wire.
        let fresh = feed.begin_round(&[], &mut rng).unwrap();
        assert_ne!(stale.session, fresh.session);

        feed.complete_round(stale.session, vec![track(1), track(2)], &mut rng);
        assert!(feed.is_empty());
        assert!(feed.in_flight(), "stale completion must not release the guard");

        feed.complete_round(fresh.session, vec![track(3)], &mut rng);
        assert_eq!(feed.len(), 1);
        assert!(!feed.in_flight());
    }

    #[test]
    fn test_reset_clears_offset_and_dedup() {
        let mut feed = Feed::new();
        let mut rng = rng();

        let plan = feed.begin_round(&[], &mut rng).unwrap();
        feed.complete_round(plan.session, vec![track(1)], &mut rng);
        feed.reset();

        let plan = feed.begin_round(&[], &mut rng).unwrap();
        assert_eq!(plan.offset, 0);

        // Previously-seen ids are eligible again after an explicit reset.
        feed.complete_round(plan.session, vec![track(1)], &mut rng);
        assert_eq!(feed.len(), 1);
    }

    #[test]
    fn test_no_preferred_genres_falls_back_to_trending() {
        let mut feed = Feed::new();
        let plan = feed.begin_round(&[], &mut rng()).unwrap();

        assert_eq!(plan.genres.len(), GENRES_PER_ROUND);
        for genre in &plan.genres {
            assert!(TRENDING_POOL.contains(&genre.as_str()));
        }
    }

    #[test]
    fn test_preferred_genres_sampled_to_three() {
        let preferred: Vec<String> = ["Pop", "Rock", "Dance", "Latin", "Indie"]
            .iter()
            .map(|g| g.to_string())
            .collect();

        let mut feed = Feed::new();
        let plan = feed.begin_round(&preferred, &mut rng()).unwrap();

        assert_eq!(plan.genres.len(), 3);
        for genre in &plan.genres {
            assert!(preferred.contains(genre));
        }
    }

    #[test]
    fn test_short_preference_list_used_whole() {
        let preferred = vec![String::from("Latin")];
        let mut feed = Feed::new();
        let plan = feed.begin_round(&preferred, &mut rng()).unwrap();
        assert_eq!(plan.genres, vec![String::from("Latin")]);
    }
}
