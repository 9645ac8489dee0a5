//! Problem definition and data structures for trip planning.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use crate::config::PlannerConfig;
use crate::error::ConfigError;
use crate::solution::DailyCapacity;

/// Earth radius in metres.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    /// Create a new coordinate.
    pub fn new(lat: f64, lng: f64) -> Self {
        Coordinate { lat, lng }
    }

    /// Planar distance in degree space.
    ///
    /// Clustering and placement compare places with this metric; only the
    /// route sequencer asks the distance oracle.
    pub fn euclidean(&self, other: &Coordinate) -> f64 {
        let dlat = self.lat - other.lat;
        let dlng = self.lng - other.lng;
        (dlat * dlat + dlng * dlng).sqrt()
    }

    /// Great-circle distance in metres.
    pub fn haversine_m(&self, other: &Coordinate) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let delta_lat = (other.lat - self.lat).to_radians();
        let delta_lng = (other.lng - self.lng).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();

        EARTH_RADIUS_M * c
    }

    fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

/// Kind of destination; each has its own per-day capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Spot,
    Restaurant,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Spot => write!(f, "spot"),
            Category::Restaurant => write!(f, "restaurant"),
        }
    }
}

/// A named point such as the trip start or end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

impl Place {
    pub fn new(name: impl Into<String>, lat: f64, lng: f64) -> Self {
        Place {
            name: name.into(),
            lat,
            lng,
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }
}

/// A point of interest to be scheduled on some day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub category: Category,
}

impl Destination {
    /// Create a new destination.
    pub fn new(name: impl Into<String>, lat: f64, lng: f64, category: Category) -> Self {
        Destination {
            name: name.into(),
            lat,
            lng,
            category,
        }
    }

    /// Shorthand for a sightseeing spot.
    pub fn spot(name: impl Into<String>, lat: f64, lng: f64) -> Self {
        Destination::new(name, lat, lng, Category::Spot)
    }

    /// Shorthand for a restaurant.
    pub fn restaurant(name: impl Into<String>, lat: f64, lng: f64) -> Self {
        Destination::new(name, lat, lng, Category::Restaurant)
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }
}

/// Overnight stay at the end of a day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Accommodation {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    /// Start the day from here instead of from the previous night's stay
    #[serde(default)]
    pub drop_luggage: bool,
    /// Return here for a break in the middle of the day
    #[serde(default)]
    pub midday_rest: bool,
}

impl Accommodation {
    /// Create a new accommodation with both flags cleared.
    pub fn new(name: impl Into<String>, lat: f64, lng: f64) -> Self {
        Accommodation {
            name: name.into(),
            lat,
            lng,
            drop_luggage: false,
            midday_rest: false,
        }
    }

    pub fn with_drop_luggage(mut self, drop_luggage: bool) -> Self {
        self.drop_luggage = drop_luggage;
        self
    }

    pub fn with_midday_rest(mut self, midday_rest: bool) -> Self {
        self.midday_rest = midday_rest;
        self
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }
}

/// Ordinal day identifier, rendered as `Day1`, `Day2`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DayKey(usize);

impl DayKey {
    /// Key for a zero-based day index.
    pub fn from_index(index: usize) -> Self {
        DayKey(index + 1)
    }

    /// Zero-based index of this day.
    pub fn index(&self) -> usize {
        self.0 - 1
    }

    /// One-based day number.
    pub fn ordinal(&self) -> usize {
        self.0
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Day{}", self.0)
    }
}

impl FromStr for DayKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ordinal = s
            .strip_prefix("Day")
            .and_then(|n| n.parse::<usize>().ok())
            .filter(|&n| n >= 1)
            .ok_or_else(|| format!("invalid day key {s:?}, expected Day1, Day2, ..."))?;
        Ok(DayKey(ordinal))
    }
}

impl TryFrom<String> for DayKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DayKey> for String {
    fn from(key: DayKey) -> Self {
        key.to_string()
    }
}

/// Named travel intensity for a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Packed,
    Moderate,
    Relaxed,
    Rest,
}

impl Intensity {
    pub fn weight(self) -> u32 {
        match self {
            Intensity::Packed => 3,
            Intensity::Moderate => 2,
            Intensity::Relaxed => 1,
            Intensity::Rest => 0,
        }
    }
}

/// A day's share of the destinations, as a raw weight or an intensity label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DailyWeight {
    Weight(u32),
    Intensity(Intensity),
}

impl DailyWeight {
    pub fn value(self) -> u32 {
        match self {
            DailyWeight::Weight(w) => w,
            DailyWeight::Intensity(intensity) => intensity.weight(),
        }
    }
}

impl From<u32> for DailyWeight {
    fn from(weight: u32) -> Self {
        DailyWeight::Weight(weight)
    }
}

impl From<Intensity> for DailyWeight {
    fn from(intensity: Intensity) -> Self {
        DailyWeight::Intensity(intensity)
    }
}

fn default_spot_limit() -> usize {
    5
}

fn default_restaurant_limit() -> usize {
    3
}

fn default_true() -> bool {
    true
}

/// A trip as submitted by the caller, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRequest {
    pub start: Place,
    pub end: Place,
    /// Number of nights; the trip spans `days + 1` day keys
    pub days: usize,
    pub destinations: Vec<Destination>,
    /// One weight per day key
    pub daily_weights: Vec<DailyWeight>,
    #[serde(default)]
    pub accommodations: BTreeMap<DayKey, Accommodation>,
    #[serde(default = "default_spot_limit")]
    pub max_spots_per_day: usize,
    #[serde(default = "default_restaurant_limit")]
    pub max_restaurants_per_day: usize,
    /// Whether the arrival day may receive destinations
    #[serde(default = "default_true")]
    pub include_final_day: bool,
}

impl TripRequest {
    /// Create a request with default limits, no destinations and no accommodations.
    pub fn new(start: Place, end: Place, days: usize) -> Self {
        TripRequest {
            start,
            end,
            days,
            destinations: Vec::new(),
            daily_weights: vec![DailyWeight::Intensity(Intensity::Moderate); days + 1],
            accommodations: BTreeMap::new(),
            max_spots_per_day: default_spot_limit(),
            max_restaurants_per_day: default_restaurant_limit(),
            include_final_day: true,
        }
    }

    pub fn with_destinations(mut self, destinations: Vec<Destination>) -> Self {
        self.destinations = destinations;
        self
    }

    pub fn with_daily_weights<W: Into<DailyWeight>>(mut self, weights: Vec<W>) -> Self {
        self.daily_weights = weights.into_iter().map(Into::into).collect();
        self
    }

    /// Assign an accommodation to a one-based day number.
    pub fn with_accommodation(mut self, day: usize, accommodation: Accommodation) -> Self {
        self.accommodations
            .insert(DayKey::from_index(day.saturating_sub(1)), accommodation);
        self
    }

    pub fn with_capacity(mut self, spots: usize, restaurants: usize) -> Self {
        self.max_spots_per_day = spots;
        self.max_restaurants_per_day = restaurants;
        self
    }

    pub fn with_include_final_day(mut self, include: bool) -> Self {
        self.include_final_day = include;
        self
    }

    /// Every named place in the request with its coordinate.
    pub fn places(&self) -> Vec<(&str, Coordinate)> {
        let mut places = vec![
            (self.start.name.as_str(), self.start.coordinate()),
            (self.end.name.as_str(), self.end.coordinate()),
        ];
        places.extend(
            self.destinations
                .iter()
                .map(|d| (d.name.as_str(), d.coordinate())),
        );
        places.extend(
            self.accommodations
                .values()
                .map(|a| (a.name.as_str(), a.coordinate())),
        );
        places
    }

    /// Validate the request once and turn it into a [`TripProblem`].
    pub fn validate(self, config: &PlannerConfig) -> Result<TripProblem, ConfigError> {
        if self.days > config.max_nights {
            return Err(ConfigError::TooManyNights {
                nights: self.days,
                max: config.max_nights,
            });
        }

        let day_count = self.days + 1;
        if self.daily_weights.len() != day_count {
            return Err(ConfigError::WeightCount {
                expected: day_count,
                found: self.daily_weights.len(),
            });
        }
        let weights: Vec<u32> = self.daily_weights.iter().map(|w| w.value()).collect();
        if weights.iter().map(|&w| w as u64).sum::<u64>() == 0 {
            return Err(ConfigError::ZeroWeightSum);
        }

        check_capacity(
            "max_spots_per_day",
            self.max_spots_per_day,
            config.spot_limit_ceiling,
        )?;
        check_capacity(
            "max_restaurants_per_day",
            self.max_restaurants_per_day,
            config.restaurant_limit_ceiling,
        )?;

        if let Some(day) = self.accommodations.keys().find(|k| k.ordinal() > self.days) {
            return Err(ConfigError::AccommodationOutOfRange {
                day: *day,
                nights: self.days,
            });
        }

        let mut places: BTreeMap<String, Coordinate> = BTreeMap::new();
        for (name, coordinate) in self.places() {
            if !coordinate.is_finite() {
                return Err(ConfigError::InvalidCoordinate(name.to_string()));
            }
            match places.get(name) {
                Some(existing) if existing != &coordinate => {
                    return Err(ConfigError::ConflictingPlace(name.to_string()));
                }
                Some(_) => {}
                None => {
                    places.insert(name.to_string(), coordinate);
                }
            }
        }

        let mut seen = HashSet::new();
        let mut index = HashMap::new();
        for (i, destination) in self.destinations.iter().enumerate() {
            if destination.name == self.start.name || destination.name == self.end.name {
                return Err(ConfigError::ReservedName(destination.name.clone()));
            }
            if !seen.insert(destination.name.as_str()) {
                return Err(ConfigError::DuplicateDestination(destination.name.clone()));
            }
            index.insert(destination.name.clone(), i);
        }

        let accommodations = (0..day_count)
            .map(|day| self.accommodations.get(&DayKey::from_index(day)).cloned())
            .collect();

        Ok(TripProblem {
            start: self.start,
            end: self.end,
            nights: self.days,
            destinations: self.destinations,
            weights,
            accommodations,
            max_spots_per_day: self.max_spots_per_day,
            max_restaurants_per_day: self.max_restaurants_per_day,
            include_final_day: self.include_final_day,
            places,
            index,
        })
    }
}

fn check_capacity(field: &'static str, value: usize, max: usize) -> Result<(), ConfigError> {
    if value < 1 || value > max {
        return Err(ConfigError::CapacityOutOfRange { field, value, max });
    }
    Ok(())
}

/// A validated trip, ready for planning.
///
/// Days are addressed by zero-based index throughout the pipeline; the last
/// index is the arrival day.
#[derive(Debug, Clone)]
pub struct TripProblem {
    pub start: Place,
    pub end: Place,
    pub nights: usize,
    pub destinations: Vec<Destination>,
    pub weights: Vec<u32>,
    pub accommodations: Vec<Option<Accommodation>>,
    pub max_spots_per_day: usize,
    pub max_restaurants_per_day: usize,
    pub include_final_day: bool,
    places: BTreeMap<String, Coordinate>,
    index: HashMap<String, usize>,
}

impl TripProblem {
    /// Number of day keys, one more than the number of nights.
    pub fn day_count(&self) -> usize {
        self.nights + 1
    }

    /// Index of the arrival day.
    pub fn arrival_day(&self) -> usize {
        self.nights
    }

    pub fn is_arrival_day(&self, day: usize) -> bool {
        day == self.arrival_day()
    }

    /// A rest day has weight zero and receives no destinations.
    pub fn is_rest_day(&self, day: usize) -> bool {
        self.weights.get(day).map_or(false, |&w| w == 0)
    }

    pub fn accommodation(&self, day: usize) -> Option<&Accommodation> {
        self.accommodations.get(day).and_then(Option::as_ref)
    }

    /// The accommodation of the latest day strictly before `day`.
    pub fn previous_accommodation(&self, day: usize) -> Option<&Accommodation> {
        (0..day).rev().find_map(|d| self.accommodation(d))
    }

    pub fn destination(&self, name: &str) -> Option<&Destination> {
        self.index.get(name).map(|&i| &self.destinations[i])
    }

    pub fn destinations_of(&self, category: Category) -> Vec<&Destination> {
        self.destinations
            .iter()
            .filter(|d| d.category == category)
            .collect()
    }

    pub fn destination_names(&self) -> Vec<String> {
        self.destinations.iter().map(|d| d.name.clone()).collect()
    }

    /// Coordinate of any named place in the trip.
    pub fn coordinate(&self, name: &str) -> Option<Coordinate> {
        self.places.get(name).copied()
    }

    /// Every distinct named place with its coordinate.
    pub fn places(&self) -> impl Iterator<Item = (&str, Coordinate)> {
        self.places.iter().map(|(name, c)| (name.as_str(), *c))
    }

    /// Starting capacities for every day.
    ///
    /// Rest days and, when excluded, the arrival day get no capacity at all.
    pub fn capacities(&self) -> Vec<DailyCapacity> {
        (0..self.day_count())
            .map(|day| {
                let closed =
                    self.is_rest_day(day) || (self.is_arrival_day(day) && !self.include_final_day);
                if closed {
                    DailyCapacity::new(0, 0)
                } else {
                    DailyCapacity::new(self.max_spots_per_day, self.max_restaurants_per_day)
                }
            })
            .collect()
    }
}
