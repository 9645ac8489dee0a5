//! Capacity-aware placement of destinations onto days.
//!
//! Spots arrive already clustered and ordered; each cluster goes to its day
//! and is trimmed from the front (farthest from the centroid) until it fits.
//! Restaurants follow the spots they are closest to. Whatever does not fit
//! lands on the waiting list, which the rebalancer then tries to pour into
//! days the clustering left empty.

use itertools::Itertools;
use log::{debug, info};

use crate::problem::{Category, Coordinate, Destination, TripProblem};
use crate::solution::{DailyCapacity, DayPlan};
use crate::utils::mean_distance;

/// Mutable state threaded through the placement stages.
#[derive(Debug, Clone)]
pub struct PlacementState {
    pub plan: DayPlan,
    pub capacities: Vec<DailyCapacity>,
    /// Destinations not yet placed, oldest first
    pub waiting: Vec<Destination>,
}

impl PlacementState {
    pub fn new(capacities: Vec<DailyCapacity>) -> Self {
        PlacementState {
            plan: DayPlan::new(capacities.len()),
            capacities,
            waiting: Vec::new(),
        }
    }

    fn place(&mut self, day: usize, destination: &Destination) {
        self.plan.push(day, destination.name.clone());
        self.capacities[day].take(destination.category, 1);
    }
}

/// Places spots by cluster and restaurants by proximity.
pub struct Placer<'a> {
    problem: &'a TripProblem,
}

impl<'a> Placer<'a> {
    pub fn new(problem: &'a TripProblem) -> Self {
        Placer { problem }
    }

    /// Place ordered spot clusters; cluster `i` goes to `cluster_days[i]`.
    ///
    /// Clusters are expected farthest-first, so evicting from the front drops
    /// the outliers.
    pub fn place_spots(
        &self,
        state: &mut PlacementState,
        clusters: &[Vec<String>],
        cluster_days: &[usize],
    ) {
        for (i, cluster) in clusters.iter().enumerate() {
            let mut members: Vec<&Destination> = cluster
                .iter()
                .filter_map(|name| self.problem.destination(name))
                .collect();

            let day = match cluster_days.get(i) {
                Some(&day) => day,
                None => {
                    state.waiting.extend(members.into_iter().cloned());
                    continue;
                }
            };

            let capacity = state.capacities[day].spots_remaining;
            if capacity == 0 {
                debug!("day {} takes no spots, wait-listing {} spots", day + 1, members.len());
                state.waiting.extend(members.into_iter().cloned());
                continue;
            }

            while members.len() > capacity {
                let evicted = members.remove(0);
                debug!("day {} over capacity, evicting {:?}", day + 1, evicted.name);
                state.waiting.push(evicted.clone());
            }

            for member in members {
                state.place(day, member);
            }
        }
    }

    /// Place each restaurant on the day whose spots are closest on average.
    ///
    /// Days without spots are not candidates. With no spots placed anywhere,
    /// every restaurant is wait-listed.
    pub fn place_restaurants(&self, state: &mut PlacementState, restaurants: &[&Destination]) {
        let anchors: Vec<(usize, Vec<Coordinate>)> = state
            .plan
            .iter()
            .map(|(day, names)| {
                let spots = names
                    .iter()
                    .filter_map(|n| self.problem.destination(n))
                    .filter(|d| d.category == Category::Spot)
                    .map(|d| d.coordinate())
                    .collect::<Vec<_>>();
                (day, spots)
            })
            .filter(|(_, spots)| !spots.is_empty())
            .collect();

        if anchors.is_empty() {
            if !restaurants.is_empty() {
                info!(
                    "no spots placed, wait-listing all {} restaurants",
                    restaurants.len()
                );
            }
            state.waiting.extend(restaurants.iter().map(|&r| r.clone()));
            return;
        }

        for &restaurant in restaurants {
            let position = restaurant.coordinate();
            let target = anchors
                .iter()
                .filter_map(|(day, spots)| mean_distance(&position, spots).map(|d| (*day, d)))
                .sorted_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(day, _)| day)
                .find(|&day| state.capacities[day].has_room(Category::Restaurant));

            match target {
                Some(day) => state.place(day, restaurant),
                None => {
                    debug!("no restaurant room left for {:?}", restaurant.name);
                    state.waiting.push(restaurant.clone());
                }
            }
        }
    }
}

/// Moves waiting destinations into days that ended up empty.
pub struct Rebalancer;

impl Rebalancer {
    /// Empty, open days paired with the accommodation that anchors them.
    ///
    /// The anchor is the accommodation of the latest earlier day that has
    /// one; days without such an accommodation are not eligible.
    pub fn eligible_days(problem: &TripProblem, state: &PlacementState) -> Vec<(usize, Coordinate)> {
        (0..state.plan.day_count())
            .filter(|&day| state.plan.is_day_empty(day) && !state.capacities[day].is_excluded())
            .filter_map(|day| {
                problem
                    .previous_accommodation(day)
                    .map(|a| (day, a.coordinate()))
            })
            .collect()
    }

    /// Try to place every waiting destination, oldest first.
    ///
    /// Items that find no room stay on the waiting list in their original
    /// order.
    pub fn rebalance(problem: &TripProblem, state: &mut PlacementState) {
        let eligible = Self::eligible_days(problem, state);
        if eligible.is_empty() || state.waiting.is_empty() {
            return;
        }

        let waiting = std::mem::take(&mut state.waiting);

        for item in waiting {
            let position = item.coordinate();
            let target = eligible
                .iter()
                .map(|(day, anchor)| (*day, position.euclidean(anchor)))
                .sorted_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(day, _)| day)
                .find(|&day| state.capacities[day].has_room(item.category));

            match target {
                Some(day) => {
                    info!("rebalanced {:?} onto day {}", item.name, day + 1);
                    state.place(day, &item);
                }
                None => state.waiting.push(item),
            }
        }
    }
}
