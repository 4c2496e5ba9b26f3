//! Player identification and per-player data storage.
//!
//! ## PlayerId
//!
//! Seat index of a player, 0-based. Seats also define the fixed turn
//! rotation: seat 0 goes first, then 1, and so on, wrapping around.
//!
//! ## PlayerMap
//!
//! Per-seat storage backed by `Vec` for O(1) access, indexable by `PlayerId`.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Player identifier (seat index) supporting 1-255 players.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u8);

impl PlayerId {
    /// Create a new player ID.
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    /// Get the raw seat index (0-based).
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// The seat that plays after this one in a game of `player_count` seats.
    ///
    /// ```
    /// use rust_ccg_server::core::PlayerId;
    ///
    /// assert_eq!(PlayerId::new(0).next(3), PlayerId::new(1));
    /// assert_eq!(PlayerId::new(2).next(3), PlayerId::new(0));
    /// ```
    #[must_use]
    pub fn next(self, player_count: usize) -> Self {
        Self(((self.index() + 1) % player_count.max(1)) as u8)
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Player {}", self.0)
    }
}

/// Per-player data storage with O(1) access.
///
/// ```
/// use rust_ccg_server::core::{PlayerId, PlayerMap};
///
/// let mut points = PlayerMap::from_vec(vec![0u32; 3]);
/// points[PlayerId::new(1)] += 4;
/// assert_eq!(points[PlayerId::new(1)], 4);
/// assert_eq!(points.get(PlayerId::new(3)), None);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerMap<T> {
    data: Vec<T>,
}

impl<T> PlayerMap<T> {
    /// Build a map from one value per seat, in seat order.
    pub fn from_vec(data: Vec<T>) -> Self {
        assert!(!data.is_empty(), "Must have at least 1 player");
        assert!(data.len() <= 255, "At most 255 players supported");
        Self { data }
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn get(&self, player: PlayerId) -> Option<&T> {
        self.data.get(player.index())
    }

    pub fn get_mut(&mut self, player: PlayerId) -> Option<&mut T> {
        self.data.get_mut(player.index())
    }

    /// Iterate over (PlayerId, &T) pairs in seat order.
    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, &T)> {
        self.data
            .iter()
            .enumerate()
            .map(|(i, v)| (PlayerId(i as u8), v))
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.data.iter()
    }

    pub fn player_ids(&self) -> impl Iterator<Item = PlayerId> {
        (0..self.data.len() as u8).map(PlayerId)
    }
}

impl<T> Index<PlayerId> for PlayerMap<T> {
    type Output = T;

    fn index(&self, player: PlayerId) -> &Self::Output {
        &self.data[player.index()]
    }
}

impl<T> IndexMut<PlayerId> for PlayerMap<T> {
    fn index_mut(&mut self, player: PlayerId) -> &mut Self::Output {
        &mut self.data[player.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_wraps() {
        let order: Vec<_> = std::iter::successors(Some(PlayerId::new(0)), |p| Some(p.next(3)))
            .take(5)
            .collect();
        assert_eq!(
            order,
            vec![
                PlayerId::new(0),
                PlayerId::new(1),
                PlayerId::new(2),
                PlayerId::new(0),
                PlayerId::new(1)
            ]
        );
    }

    #[test]
    fn test_player_map_from_vec() {
        let map = PlayerMap::from_vec(vec!["alice", "bob"]);
        let pairs: Vec<_> = map.iter().collect();
        assert_eq!(pairs, vec![(PlayerId::new(0), &"alice"), (PlayerId::new(1), &"bob")]);
    }

    #[test]
    fn test_player_map_mutation() {
        let mut map = PlayerMap::from_vec(vec![0u32, 0]);
        map[PlayerId::new(0)] = 10;
        if let Some(v) = map.get_mut(PlayerId::new(1)) {
            *v = 20;
        }
        assert_eq!(map.values().copied().collect::<Vec<_>>(), vec![10, 20]);
    }

    #[test]
    #[should_panic(expected = "Must have at least 1 player")]
    fn test_player_map_zero_players() {
        let _: PlayerMap<i32> = PlayerMap::from_vec(Vec::new());
    }
}
