//! End-to-end runs: input files on disk through context loading, planning
//! and export.

mod fixtures;

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde_json::{Value, json};

use waste_route_planner::config::PlannerConfig;
use waste_route_planner::output::write_outputs;
use waste_route_planner::planner::{Stop, plan_day};
use waste_route_planner::PlanningContext;

use fixtures::{ALAADDINBEY, GORUKLE, YENIKENT};

// ============================================================================
// Test Infrastructure
// ============================================================================

fn write_dataset(root: &Path) {
    fs::create_dir_all(root.join("container")).unwrap();

    let mut containers = String::from("ID,Enlem,Boylam,Mahalle,Konteyner Tipi\n");
    let mut id = 0;
    for (location, count) in [(&ALAADDINBEY, 12), (&GORUKLE, 10), (&YENIKENT, 8)] {
        for i in 0..count {
            let kind = match i % 6 {
                0 => "Yeraltı",
                1 => "400 LT",
                _ => "770 LT",
            };
            containers.push_str(&format!(
                "{id},{:.5},{:.5},{} Mahallesi,{kind}\n",
                location.lat + i as f64 * 0.0007,
                location.lon - i as f64 * 0.0005,
                location.name
            ));
            id += 1;
        }
    }
    // Dropped: no coordinates.
    containers.push_str("999,,,Görükle,770 LT\n");
    fs::write(root.join("container/konteyner_tipli.csv"), containers).unwrap();

    fs::write(root.join("mahalle_nufus.csv"), "mahalle;nufus\nAlaaddinbey;42\nGörükle;27\nYenikent;8\n").unwrap();
    fs::write(
        root.join("neighbor_days_rotations.csv"),
        "MAHALLE ADI;COLLECTION FREQUENCY\nAlaaddinbey;NIGHT\nGörükle;MONDAY-WEDNESDAY-FRIDAY\nYenikent;TUESDAY\n",
    )
    .unwrap();
    fs::write(root.join("tonnages.csv"), "AY,YIL,Günlük Ortalama (ton)\nARALIK,2024,\"20,5\"\n").unwrap();
    fs::write(
        root.join("fleet.csv"),
        "vehicle_id,vehicle_name,vehicle_type,capacity_ton\n\
         1,Vinç 1,Crane Vehicle,3\n\
         2,Büyük 1,Large Garbage Truck,10\n\
         3,Küçük 1,Small Garbage Truck,4\n",
    )
    .unwrap();

    // Wide roads everywhere except a narrow one near GORUKLE.
    let mut features = Vec::new();
    for (location, width) in [(&ALAADDINBEY, 9.0), (&YENIKENT, 7.5), (&GORUKLE, 3.0)] {
        features.push(json!({
            "type": "Feature",
            "properties": { "Genişlik(m)": width, "İdari Mahalle Adı": location.name },
            "geometry": {
                "type": "LineString",
                "coordinates": [
                    [location.lon - 0.001, location.lat],
                    [location.lon, location.lat],
                    [location.lon + 0.001, location.lat]
                ]
            }
        }));
    }
    let roads = json!({ "type": "FeatureCollection", "features": features });
    fs::write(root.join("roads.geojson"), roads.to_string()).unwrap();
}

fn write_config(root: &Path) -> std::path::PathBuf {
    let path = root.join("planner.json");
    let config = json!({
        "data": { "data_dir": root },
        "simulation": { "avg_speed_kmh": 25.0 }
    });
    fs::write(&path, config.to_string()).unwrap();
    path
}

fn friday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 12, 19).unwrap()
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn test_full_pipeline_writes_routes() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(dir.path());
    let config = PlannerConfig::from_json_file(&write_config(dir.path())).unwrap();

    let context = PlanningContext::load(&config).unwrap();
    assert_eq!(context.points.len(), 30);
    assert_eq!(context.fleet.len(), 3);

    let result = plan_day(&context, friday(), &config.simulation);
    // December 2024 scaled by growth, December and Friday factors.
    assert!((result.target.adjusted_ton - 20.5 * 1.03 * 0.90).abs() < 1e-9);
    assert_eq!(result.summary.scheduled_neighborhoods, 2);
    assert_eq!(result.summary.day_points, 22);
    assert!(result.total_container_stops() > 0);

    let (json_path, csv_path) = write_outputs(dir.path(), &result).unwrap();
    let document: Value = serde_json::from_str(&fs::read_to_string(json_path).unwrap()).unwrap();
    assert_eq!(document["date"], "2025-12-19");
    assert_eq!(document["day"], "FRIDAY");
    assert_eq!(document["total_stops"], result.total_container_stops());

    for vehicle in document["vehicles"].as_array().unwrap() {
        let route = vehicle["route"].as_array().unwrap();
        assert_eq!(route[0]["container_idx"], -2);
        for stop in &route[1..] {
            // YENIKENT is only scheduled on Tuesdays.
            if stop["container_idx"].as_i64().unwrap() >= 0 {
                assert_ne!(stop["mahalle"], "YENIKENT");
            }
        }
    }

    let csv_rows = fs::read_to_string(csv_path).unwrap().lines().count();
    let stop_count: usize = result.routes.iter().map(|r| r.stops.len()).sum();
    assert_eq!(csv_rows, stop_count + 1);
}

#[test]
fn test_narrow_street_points_left_for_small_truck() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(dir.path());
    let config = PlannerConfig::from_json_file(&write_config(dir.path())).unwrap();
    let context = PlanningContext::load(&config).unwrap();

    let gorukle: Vec<&waste_route_planner::point::CollectionPoint> =
        context.points.iter().filter(|p| p.neighborhood == "GORUKLE").collect();
    assert!(gorukle.iter().all(|p| p.street_width == 3.0));

    let result = plan_day(&context, friday(), &config.simulation);
    for route in &result.routes {
        let served = route.stops.iter().filter(|s| s.is_container() && s.neighborhood == "GORUKLE").count();
        if served > 0 {
            assert_eq!(route.vehicle.id, 3, "only the small truck fits a 3 m street");
        }
    }
    // GORUKLE underground containers sit on narrow streets nobody can serve.
    assert!(result.summary.uncollected_underground >= 1);
}

#[test]
fn test_second_run_uses_caches_and_matches() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(dir.path());
    let config = PlannerConfig::from_json_file(&write_config(dir.path())).unwrap();

    let first = plan_day(&PlanningContext::load(&config).unwrap(), friday(), &config.simulation);
    for cache in ["street_width_cache.bin", "distance_matrix_cache.bin", "route_scorer_weights.bin"] {
        assert!(dir.path().join(cache).exists(), "{cache} not persisted");
    }

    // Geometry is no longer needed once its cache exists.
    fs::remove_file(dir.path().join("roads.geojson")).unwrap();
    let second = plan_day(&PlanningContext::load(&config).unwrap(), friday(), &config.simulation);

    let stops = |routes: &[waste_route_planner::planner::VehicleRoute]| -> Vec<Vec<Stop>> {
        routes.iter().map(|r| r.stops.clone()).collect()
    };
    assert_eq!(stops(&first.routes), stops(&second.routes));
}

#[test]
fn test_day_without_schedule_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(dir.path());
    fs::write(dir.path().join("neighbor_days_rotations.csv"), "MAHALLE ADI;frequency\nAlaaddinbey;SUNDAY\n").unwrap();
    let config = PlannerConfig::from_json_file(&write_config(dir.path())).unwrap();
    let context = PlanningContext::load(&config).unwrap();

    let result = plan_day(&context, friday(), &config.simulation);
    assert!(result.routes.is_empty());

    let (json_path, _) = write_outputs(dir.path(), &result).unwrap();
    let document: Value = serde_json::from_str(&fs::read_to_string(json_path).unwrap()).unwrap();
    assert_eq!(document["total_vehicles"], 0);
    assert_eq!(document["vehicles"], json!([]));
}

#[test]
fn test_start_positions_restrict_fleet() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(dir.path());
    fs::write(
        dir.path().join("vehicle_start_positions.json"),
        json!({
            "reference_date": "2025-12-19",
            "reference_time": "06:00",
            "vehicles": [
                { "vehicle_id": 3, "start_position": { "lat": YENIKENT.lat, "lon": YENIKENT.lon, "mahalle": "YENIKENT" } }
            ]
        })
        .to_string(),
    )
    .unwrap();
    let config = PlannerConfig::from_json_file(&write_config(dir.path())).unwrap();
    let context = PlanningContext::load(&config).unwrap();
    assert_eq!(context.fleet.len(), 1);

    let result = plan_day(&context, friday(), &config.simulation);
    let start = &result.routes[0].stops[0];
    assert!((start.lat - YENIKENT.lat).abs() < 1e-12);
    assert!((start.lon - YENIKENT.lon).abs() < 1e-12);
    assert_eq!(start.neighborhood, "YENIKENT");
}
