//! Plan state and itinerary representation.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::problem::{Category, DayKey};

/// Remaining room on one day, decremented as destinations are placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCapacity {
    pub spots_remaining: usize,
    pub restaurants_remaining: usize,
}

impl DailyCapacity {
    pub fn new(spots: usize, restaurants: usize) -> Self {
        DailyCapacity {
            spots_remaining: spots,
            restaurants_remaining: restaurants,
        }
    }

    /// A day with no room of either kind takes no part in placement.
    pub fn is_excluded(&self) -> bool {
        self.spots_remaining == 0 && self.restaurants_remaining == 0
    }

    pub fn remaining(&self, category: Category) -> usize {
        match category {
            Category::Spot => self.spots_remaining,
            Category::Restaurant => self.restaurants_remaining,
        }
    }

    pub fn has_room(&self, category: Category) -> bool {
        self.remaining(category) > 0
    }

    /// Use up `count` slots of `category`.
    pub fn take(&mut self, category: Category, count: usize) {
        let slot = match category {
            Category::Spot => &mut self.spots_remaining,
            Category::Restaurant => &mut self.restaurants_remaining,
        };
        *slot = slot.saturating_sub(count);
    }
}

/// Names placed on each day, in placement order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayPlan {
    days: Vec<Vec<String>>,
}

impl DayPlan {
    /// Create an empty plan for `day_count` days.
    pub fn new(day_count: usize) -> Self {
        DayPlan {
            days: vec![Vec::new(); day_count],
        }
    }

    pub fn day_count(&self) -> usize {
        self.days.len()
    }

    pub fn push(&mut self, day: usize, name: impl Into<String>) {
        self.days[day].push(name.into());
    }

    pub fn day(&self, day: usize) -> &[String] {
        &self.days[day]
    }

    pub fn is_day_empty(&self, day: usize) -> bool {
        self.days[day].is_empty()
    }

    /// Total number of placed names across all days.
    pub fn placed_count(&self) -> usize {
        self.days.iter().map(Vec::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &[String])> {
        self.days.iter().enumerate().map(|(i, d)| (i, d.as_slice()))
    }
}

/// Why a stop appears in a route, where it is more than an ordinary visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Origin,
    Destination,
    Accommodation,
}

/// A stop in a day's route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteStop {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl RouteStop {
    /// An ordinary interior stop.
    pub fn visit(name: impl Into<String>) -> Self {
        RouteStop {
            name: name.into(),
            role: None,
        }
    }

    pub fn with_role(name: impl Into<String>, role: Role) -> Self {
        RouteStop {
            name: name.into(),
            role: Some(role),
        }
    }
}

/// A finished, ordered route for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayRoute {
    pub day: DayKey,
    pub route: Vec<RouteStop>,
    /// Total route length in kilometres, penalties included
    pub distance_km: f64,
}

impl DayRoute {
    /// Names of the stops in visiting order.
    pub fn names(&self) -> Vec<&str> {
        self.route.iter().map(|s| s.name.as_str()).collect()
    }

    /// Stops that are neither anchors nor accommodation visits.
    pub fn visits(&self) -> impl Iterator<Item = &RouteStop> {
        self.route.iter().filter(|s| s.role.is_none())
    }
}

/// A non-binding day recommendation for a destination that was not scheduled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub name: String,
    pub category: Category,
    pub suggested_days: Vec<DayKey>,
}

/// The planner's answer: one route per day plus suggestions for leftovers.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Itinerary {
    pub days: Vec<DayRoute>,
    pub suggestions: Vec<Suggestion>,
}

impl Itinerary {
    /// Total distance over all days, in kilometres.
    pub fn total_distance_km(&self) -> f64 {
        self.days.iter().map(|d| d.distance_km).sum()
    }

    pub fn day(&self, key: DayKey) -> Option<&DayRoute> {
        self.days.iter().find(|d| d.day == key)
    }
}

impl fmt::Debug for Itinerary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Itinerary:")?;
        writeln!(f, "  Total distance: {:.2} km", self.total_distance_km())?;

        for day in &self.days {
            writeln!(
                f,
                "  {}: {:?} ({:.2} km)",
                day.day,
                day.names(),
                day.distance_km
            )?;
        }

        for suggestion in &self.suggestions {
            writeln!(
                f,
                "  Unplaced {} {:?}: suggested [{}]",
                suggestion.category,
                suggestion.name,
                suggestion.suggested_days.iter().join(", ")
            )?;
        }

        Ok(())
    }
}
