//! Day suggestions for destinations that could not be scheduled.

use itertools::Itertools;

use crate::problem::{Coordinate, DayKey, Destination, TripProblem};
use crate::solution::{DayPlan, Suggestion};
use crate::utils::mean_distance;

/// Builds one non-binding suggestion per unplaced destination.
pub struct SuggestionGenerator;

impl SuggestionGenerator {
    /// Suggest the day whose placed items are closest on average.
    ///
    /// Only placed destinations count; trip anchors such as the end point
    /// never enter the average. A suggestion has no day at all when nothing
    /// has been placed anywhere.
    pub fn suggest(problem: &TripProblem, plan: &DayPlan, waiting: &[Destination]) -> Vec<Suggestion> {
        let placed: Vec<(usize, Vec<Coordinate>)> = plan
            .iter()
            .map(|(day, names)| {
                let coordinates = names
                    .iter()
                    .filter(|n| n.as_str() != problem.end.name)
                    .filter_map(|n| problem.coordinate(n))
                    .collect::<Vec<_>>();
                (day, coordinates)
            })
            .collect();

        waiting
            .iter()
            .map(|item| {
                let position = item.coordinate();
                let suggested_days = placed
                    .iter()
                    .filter_map(|(day, coords)| mean_distance(&position, coords).map(|d| (*day, d)))
                    .sorted_by(|a, b| a.1.total_cmp(&b.1))
                    .take(1)
                    .map(|(day, _)| DayKey::from_index(day))
                    .collect();

                Suggestion {
                    name: item.name.clone(),
                    category: item.category,
                    suggested_days,
                }
            })
            .collect()
    }
}
