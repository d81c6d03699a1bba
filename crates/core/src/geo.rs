use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::domain::supplier::Coordinate;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Round to two decimal places. Distances, prices, and emission figures all
/// follow the same presentation precision.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Great-circle distance between two points in kilometers (Haversine),
/// rounded to two decimals. Symmetric, and zero for identical points.
pub fn haversine_distance(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lon = (b.longitude - a.longitude).to_radians();

    let sin_dlat = (delta_lat / 2.0).sin();
    let sin_dlon = (delta_lon / 2.0).sin();
    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    round2(EARTH_RADIUS_KM * c)
}

// Memo key over the exact coordinate bit patterns; two calls memoize
// separately unless all four components are bit-identical.
type MemoKey = [u64; 4];

fn memo_key(a: Coordinate, b: Coordinate) -> MemoKey {
    [
        a.latitude.to_bits(),
        a.longitude.to_bits(),
        b.latitude.to_bits(),
        b.longitude.to_bits(),
    ]
}

#[derive(Debug, Default)]
struct MemoState {
    entries: HashMap<MemoKey, f64>,
    // Least-recently-used key sits at the front.
    order: VecDeque<MemoKey>,
}

impl MemoState {
    fn touch(&mut self, key: &MemoKey) {
        if let Some(position) = self.order.iter().position(|k| k == key) {
            self.order.remove(position);
            self.order.push_back(*key);
        }
    }

    fn insert(&mut self, key: MemoKey, distance_km: f64, capacity: usize) {
        if self.entries.len() >= capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.entries.remove(&evicted);
            }
        }
        self.entries.insert(key, distance_km);
        self.order.push_back(key);
    }
}

/// Memoizing distance calculator shared across engines.
///
/// An explicitly owned object rather than ambient state: the memo is bounded
/// (least-recently-used eviction) and mutex-guarded for concurrent requests.
#[derive(Debug)]
pub struct DistanceCalculator {
    capacity: usize,
    memo: Mutex<MemoState>,
}

impl DistanceCalculator {
    pub const DEFAULT_CAPACITY: usize = 128;

    pub fn new(capacity: usize) -> Self {
        Self { capacity: capacity.max(1), memo: Mutex::new(MemoState::default()) }
    }

    pub fn distance(&self, a: Coordinate, b: Coordinate) -> f64 {
        let key = memo_key(a, b);
        let mut memo = match self.memo.lock() {
            Ok(memo) => memo,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(&distance_km) = memo.entries.get(&key) {
            memo.touch(&key);
            return distance_km;
        }

        let distance_km = haversine_distance(a, b);
        memo.insert(key, distance_km, self.capacity);
        distance_km
    }

    pub fn memo_len(&self) -> usize {
        match self.memo.lock() {
            Ok(memo) => memo.entries.len(),
            Err(poisoned) => poisoned.into_inner().entries.len(),
        }
    }
}

impl Default for DistanceCalculator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
