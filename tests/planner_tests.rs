//! End-to-end tests of the planning pipeline.

mod common;

use std::collections::HashMap;
use std::thread;

use common::{create_line_request, create_tour_request, GridOracle};
use trip_planner::config::{PlannerConfig, MAX_INTERIOR_STOPS};
use trip_planner::error::{ConfigError, PlanError};
use trip_planner::problem::{
    Accommodation, Category, DayKey, Destination, Intensity, Place, TripRequest,
};
use trip_planner::solution::{Itinerary, Role};
use trip_planner::utils::{format_itinerary, save_itinerary};
use trip_planner::{plan_trip, TripPlanner};

fn plan(request: TripRequest) -> Result<Itinerary, PlanError> {
    let oracle = GridOracle::for_request(&request);
    plan_trip(request, PlannerConfig::new(), &oracle)
}

fn config_error(request: TripRequest) -> ConfigError {
    match plan(request) {
        Err(PlanError::Config(err)) => err,
        other => panic!("expected a configuration error, got {:?}", other),
    }
}

fn day_names(itinerary: &Itinerary, day: usize) -> Vec<&str> {
    itinerary.days[day].names()
}

#[test]
fn test_line_trip() {
    let itinerary = plan(create_line_request()).unwrap();

    assert_eq!(itinerary.days.len(), 2);
    assert_eq!(itinerary.days[0].day, DayKey::from_index(0));
    assert_eq!(day_names(&itinerary, 0), vec!["A", "S1", "S2", "H"]);
    assert_eq!(day_names(&itinerary, 1), vec!["H", "S3", "S4", "Z"]);
    assert!(itinerary.suggestions.is_empty());

    let expected = 5.0 * 2f64.sqrt();
    assert!((itinerary.days[0].distance_km - expected).abs() < 1e-9);
    assert!((itinerary.total_distance_km() - 2.0 * expected).abs() < 1e-9);
}

#[test]
fn test_pipeline_stages() {
    let request = create_line_request();
    let oracle = GridOracle::for_request(&request);
    let planner = TripPlanner::new(request, PlannerConfig::new(), &oracle).unwrap();

    let node_map = planner.resolve().unwrap();
    assert_eq!(node_map.len(), 7);

    let allocation = planner.allocate().unwrap();
    assert_eq!(allocation.targets, vec![2, 2]);

    let state = planner.place(&allocation).unwrap();
    assert_eq!(state.plan.day(0), ["S1", "S2"]);
    assert_eq!(state.plan.day(1), ["S3", "S4"]);
    assert!(planner.suggest(&state).is_empty());

    let days = planner.sequence(&state, &node_map).unwrap();
    assert_eq!(days, planner.run().unwrap().days);
}

#[test]
fn test_every_destination_is_placed_or_suggested_once() {
    for (spots, restaurants) in [(1, 1), (2, 1), (3, 2), (5, 3)] {
        let request = create_tour_request().with_capacity(spots, restaurants);
        let names: Vec<String> = request.destinations.iter().map(|d| d.name.clone()).collect();
        let categories: HashMap<String, Category> = request
            .destinations
            .iter()
            .map(|d| (d.name.clone(), d.category))
            .collect();

        let itinerary = plan(request).unwrap();

        let mut seen: HashMap<&str, usize> = HashMap::new();
        for day in &itinerary.days {
            let visits: Vec<&str> = day.visits().map(|s| s.name.as_str()).collect();
            let spot_count = visits
                .iter()
                .filter(|n| categories[**n] == Category::Spot)
                .count();
            assert!(spot_count <= spots);
            assert!(visits.len() - spot_count <= restaurants);

            for name in visits {
                *seen.entry(name).or_default() += 1;
            }
        }
        for suggestion in &itinerary.suggestions {
            *seen.entry(suggestion.name.as_str()).or_default() += 1;
        }

        assert_eq!(seen.len(), names.len());
        assert!(names.iter().all(|n| seen.get(n.as_str()) == Some(&1)));
    }
}

#[test]
fn test_start_and_end_anchor_the_trip() {
    let itinerary = plan(create_tour_request()).unwrap();
    let last = itinerary.days.last().unwrap();

    let first_stop = &itinerary.days[0].route[0];
    assert_eq!(first_stop.name, "Start");
    assert_eq!(first_stop.role, Some(Role::Origin));

    let last_stop = last.route.last().unwrap();
    assert_eq!(last_stop.name, "End");
    assert_eq!(last_stop.role, Some(Role::Destination));

    let end_count: usize = itinerary
        .days
        .iter()
        .map(|d| d.route.iter().filter(|s| s.name == "End").count())
        .sum();
    assert_eq!(end_count, 1);

    // every non-arrival day sleeps at its own accommodation
    for (day, inn) in ["Inn1", "Inn2", "Inn3"].iter().enumerate() {
        assert_eq!(itinerary.days[day].route.last().unwrap().name, *inn);
    }
}

#[test]
fn test_planning_is_deterministic() {
    let first = plan(create_tour_request()).unwrap();
    let second = plan(create_tour_request()).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_concurrent_requests_share_one_oracle() {
    let line = create_line_request();
    let tour = create_tour_request();

    let mut points: Vec<_> = line.places().into_iter().map(|(_, c)| c).collect();
    points.extend(tour.places().into_iter().map(|(_, c)| c));
    let oracle = GridOracle::new(points);

    let expected_line = plan_trip(line.clone(), PlannerConfig::new(), &oracle).unwrap();
    let expected_tour = plan_trip(tour.clone(), PlannerConfig::new(), &oracle).unwrap();

    thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let request = if i % 2 == 0 { line.clone() } else { tour.clone() };
                let oracle = &oracle;
                scope.spawn(move || plan_trip(request, PlannerConfig::new(), oracle).unwrap())
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let itinerary = handle.join().unwrap();
            if i % 2 == 0 {
                assert_eq!(itinerary, expected_line);
            } else {
                assert_eq!(itinerary, expected_tour);
            }
        }
    });
}

#[test]
fn test_unresolvable_place_is_named() {
    let request = create_line_request();
    let mut oracle = GridOracle::for_request(&request);
    oracle.refuse(request.destinations[2].coordinate());

    let err = plan_trip(request, PlannerConfig::new(), &oracle).unwrap_err();

    assert_eq!(err.missing_place(), Some("S3"));
    assert!(err.to_string().contains("S3"));
}

#[test]
fn test_invalid_requests() {
    assert_eq!(
        config_error(create_line_request().with_daily_weights(vec![1u32])),
        ConfigError::WeightCount {
            expected: 2,
            found: 1
        }
    );
    assert_eq!(
        config_error(create_line_request().with_daily_weights(vec![0u32, 0])),
        ConfigError::ZeroWeightSum
    );
    assert_eq!(
        config_error(TripRequest::new(
            Place::new("A", 0.0, 0.0),
            Place::new("Z", 1.0, 1.0),
            8
        )),
        ConfigError::TooManyNights { nights: 8, max: 7 }
    );
    assert_eq!(
        config_error(create_line_request().with_capacity(6, 3)),
        ConfigError::CapacityOutOfRange {
            field: "max_spots_per_day",
            value: 6,
            max: 5
        }
    );
    assert_eq!(
        config_error(create_line_request().with_capacity(5, 0)),
        ConfigError::CapacityOutOfRange {
            field: "max_restaurants_per_day",
            value: 0,
            max: 3
        }
    );
    assert_eq!(
        config_error(
            create_line_request().with_accommodation(2, Accommodation::new("Late", 9.0, 9.0))
        ),
        ConfigError::AccommodationOutOfRange {
            day: DayKey::from_index(1),
            nights: 1
        }
    );
}

#[test]
fn test_invalid_destinations() {
    let mut duplicate = create_line_request();
    duplicate.destinations.push(Destination::spot("S1", 2.0, 2.0));
    assert_eq!(
        config_error(duplicate),
        ConfigError::DuplicateDestination("S1".to_string())
    );

    let mut conflicting = create_line_request();
    conflicting.destinations.push(Destination::spot("S1", 4.0, 4.0));
    assert_eq!(
        config_error(conflicting),
        ConfigError::ConflictingPlace("S1".to_string())
    );

    let mut reserved = create_line_request();
    reserved.destinations.push(Destination::restaurant("Z", 10.0, 10.0));
    assert_eq!(config_error(reserved), ConfigError::ReservedName("Z".to_string()));

    let mut broken = create_line_request();
    broken.destinations.push(Destination::spot("Void", f64::NAN, 0.0));
    assert_eq!(
        config_error(broken),
        ConfigError::InvalidCoordinate("Void".to_string())
    );
}

#[test]
fn test_invalid_config() {
    let request = create_line_request();
    let oracle = GridOracle::for_request(&request);

    let err = plan_trip(request, PlannerConfig::new().with_kmeans_runs(0), &oracle).unwrap_err();

    assert!(matches!(err, PlanError::Config(ConfigError::InvalidSetting(_))));
}

#[test]
fn test_capacity_ceilings_bound_the_route_search() {
    assert!(PlannerConfig::new().validate().is_ok());
    assert!(PlannerConfig::new()
        .with_spot_limit_ceiling(MAX_INTERIOR_STOPS - 4)
        .with_restaurant_limit_ceiling(3)
        .validate()
        .is_ok());

    // one more spot leaves no room for the midday rest stop
    assert!(matches!(
        PlannerConfig::new()
            .with_spot_limit_ceiling(MAX_INTERIOR_STOPS - 3)
            .validate(),
        Err(ConfigError::InvalidSetting(_))
    ));

    let spots: Vec<Destination> = (0..14)
        .map(|i| Destination::spot(format!("S{}", i), 1.0 + i as f64 * 0.1, 1.0))
        .collect();
    let request = TripRequest::new(Place::new("A", 0.0, 0.0), Place::new("Z", 10.0, 10.0), 0)
        .with_destinations(spots)
        .with_capacity(14, 3);
    let oracle = GridOracle::for_request(&request);
    let config = PlannerConfig::new().with_spot_limit_ceiling(14);

    let err = TripPlanner::new(request, config, &oracle).err().unwrap();

    assert!(matches!(err, PlanError::Config(ConfigError::InvalidSetting(_))));
}

#[test]
fn test_rest_day_has_no_visits() {
    let request = TripRequest::new(Place::new("A", 0.0, 0.0), Place::new("Z", 10.0, 10.0), 2)
        .with_destinations(create_line_request().destinations)
        .with_daily_weights(vec![Intensity::Moderate, Intensity::Rest, Intensity::Moderate])
        .with_accommodation(1, Accommodation::new("H", 5.0, 5.0))
        .with_accommodation(2, Accommodation::new("H", 5.0, 5.0));

    let itinerary = plan(request).unwrap();

    assert_eq!(itinerary.days.len(), 3);
    assert_eq!(day_names(&itinerary, 0), vec!["A", "S1", "S2", "H"]);
    assert_eq!(day_names(&itinerary, 1), vec!["H", "H"]);
    assert_eq!(itinerary.days[1].visits().count(), 0);
    assert_eq!(day_names(&itinerary, 2), vec!["H", "S3", "S4", "Z"]);
    assert!(itinerary.suggestions.is_empty());
}

#[test]
fn test_rest_day_skips_midday_rest() {
    let request = TripRequest::new(Place::new("A", 0.0, 0.0), Place::new("Z", 10.0, 10.0), 2)
        .with_destinations(create_line_request().destinations)
        .with_daily_weights(vec![Intensity::Moderate, Intensity::Rest, Intensity::Moderate])
        .with_accommodation(1, Accommodation::new("H", 5.0, 5.0))
        .with_accommodation(2, Accommodation::new("H", 5.0, 5.0).with_midday_rest(true));

    let itinerary = plan(request).unwrap();

    assert_eq!(day_names(&itinerary, 1), vec!["H", "H"]);
    assert!((itinerary.days[1].distance_km).abs() < 1e-9);
}

#[test]
fn test_excluded_final_day_turns_into_suggestions() {
    let itinerary = plan(create_line_request().with_include_final_day(false)).unwrap();

    assert_eq!(day_names(&itinerary, 0), vec!["A", "S1", "S2", "H"]);
    assert_eq!(day_names(&itinerary, 1), vec!["H", "Z"]);

    let names: Vec<&str> = itinerary.suggestions.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["S3", "S4"]);
    for suggestion in &itinerary.suggestions {
        assert_eq!(suggestion.suggested_days, vec![DayKey::from_index(0)]);
    }
}

#[test]
fn test_midday_rest_visits_the_accommodation() {
    let request = create_line_request().with_accommodation(
        1,
        Accommodation::new("H", 5.0, 5.0).with_midday_rest(true),
    );

    let itinerary = plan(request).unwrap();
    let first = &itinerary.days[0];

    assert_eq!(first.route.len(), 5);
    let stays: Vec<_> = first.route.iter().filter(|s| s.name == "H").collect();
    assert_eq!(stays.len(), 2);
    assert!(stays.iter().all(|s| s.role == Some(Role::Accommodation)));
    assert_eq!(first.visits().count(), 2);

    // never on the arrival day
    assert_eq!(day_names(&itinerary, 1), vec!["H", "S3", "S4", "Z"]);
}

#[test]
fn test_request_from_json() {
    let json = r#"{
        "start": {"name": "A", "lat": 0.0, "lng": 0.0},
        "end": {"name": "Z", "lat": 10.0, "lng": 10.0},
        "days": 1,
        "destinations": [
            {"name": "S1", "lat": 2.0, "lng": 2.0, "category": "spot"},
            {"name": "S2", "lat": 3.0, "lng": 3.0, "category": "spot"},
            {"name": "S3", "lat": 7.0, "lng": 7.0, "category": "spot"},
            {"name": "S4", "lat": 8.0, "lng": 8.0, "category": "spot"}
        ],
        "daily_weights": ["relaxed", 1],
        "accommodations": {"Day1": {"name": "H", "lat": 5.0, "lng": 5.0}}
    }"#;

    let request: TripRequest = serde_json::from_str(json).unwrap();
    assert_eq!(request.max_spots_per_day, 5);
    assert_eq!(request.max_restaurants_per_day, 3);
    assert!(request.include_final_day);
    assert_eq!(request.accommodations[&DayKey::from_index(0)].name, "H");

    let itinerary = plan(request).unwrap();
    assert_eq!(itinerary, plan(create_line_request()).unwrap());

    let value = serde_json::to_value(&itinerary).unwrap();
    assert_eq!(value["days"][0]["day"], "Day1");
    assert_eq!(value["days"][0]["route"][0]["role"], "origin");
    assert!(value["days"][0]["route"][1].get("role").is_none());
    assert_eq!(value["days"][1]["route"][3]["role"], "destination");
}

#[test]
fn test_unknown_day_key_is_rejected() {
    let json = r#"{
        "start": {"name": "A", "lat": 0.0, "lng": 0.0},
        "end": {"name": "Z", "lat": 1.0, "lng": 1.0},
        "days": 1,
        "destinations": [],
        "daily_weights": [1, 1],
        "accommodations": {"Monday": {"name": "H", "lat": 0.5, "lng": 0.5}}
    }"#;

    assert!(serde_json::from_str::<TripRequest>(json).is_err());
}

#[test]
fn test_no_destinations() {
    let request = TripRequest::new(Place::new("A", 0.0, 0.0), Place::new("Z", 1.0, 1.0), 0);

    let itinerary = plan(request).unwrap();

    assert_eq!(itinerary.days.len(), 1);
    assert_eq!(day_names(&itinerary, 0), vec!["A", "Z"]);
    assert!(itinerary.suggestions.is_empty());
}

#[test]
fn test_summary_and_save() {
    let itinerary = plan(create_line_request()).unwrap();

    let summary = format_itinerary(&itinerary);
    assert!(summary.contains("Day1"));
    assert!(summary.contains("A [origin]"));
    assert!(summary.contains("Z [destination]"));
    assert!(format!("{:?}", itinerary).contains("Day2"));

    let path = std::env::temp_dir().join(format!("itinerary-{}.json", std::process::id()));
    save_itinerary(&itinerary, &path).unwrap();
    let loaded: Itinerary =
        serde_json::from_reader(std::fs::File::open(&path).unwrap()).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(loaded, itinerary);
}
