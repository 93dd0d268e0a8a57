//! Integration tests for the MapBuilder API
//!
//! These tests drive the whole pipeline through the public API.

use metromap::{
    CurveTemplate, CurveTemplates, LineColors, MapBuilder, MapInputs, MetroMapError,
    StationIdTable,
    config::{
        AppConfig, CurveConfig, EndpointConfig, GeometryConfig, SolverConfig, StationIdConfig,
        StationIdOverride,
    },
    geometry::Point,
};
use serde_json::Value;

const NETWORK: &str = r#"
# Two lines turning together
line red:
station "West" 0 0
station "Bank" 300 0
station "South" 500 300
edges "West, Bank, South"
curve "Bank, South" right,down
endpoint "West" vertical

line blue:
station "Park" 0 -50
station "Quay" 300 -50
station "River" 550 300
edges "Park, Quay, River"
horizontal "Park, Quay"
curve "Quay, River" right,down parallelto curve "red: Bank, South"

zindex red above blue
"#;

fn station_ids() -> StationIdTable {
    let mut ids = StationIdTable::new();
    for (line, station, id) in [
        ("red", "West", "R1"),
        ("red", "Bank", "R2"),
        ("red", "South", "R3"),
        ("blue", "Park", "B1"),
        ("blue", "Quay", "B2"),
        ("blue", "River", "B3"),
    ] {
        ids.insert(line, station, id);
    }
    ids
}

fn templates() -> CurveTemplates {
    CurveTemplates::new(
        CurveTemplate::new(
            [
                Point::new(-8.0, 0.0),
                Point::new(-3.5, 0.0),
                Point::new(0.0, 3.5),
                Point::new(0.0, 8.0),
            ],
            1.0,
        ),
        CurveTemplate::new(
            [
                Point::new(-6.0, 0.0),
                Point::new(-2.0, 0.0),
                Point::new(1.5, 1.5),
                Point::new(4.5, 4.5),
            ],
            1.0,
        ),
    )
}

fn inputs() -> MapInputs {
    let mut colors = LineColors::new();
    colors.insert("red", "#e1251b");
    colors.insert("blue", "#0098d4");
    MapInputs::new(station_ids(), templates(), colors)
}

fn render(builder: &MapBuilder) -> Value {
    let json = builder
        .render_json(NETWORK, &inputs())
        .expect("Failed to render map");
    serde_json::from_str(&json).expect("Output should be valid JSON")
}

fn line<'a>(document: &'a Value, name: &str) -> &'a Value {
    document["lines"]
        .as_array()
        .and_then(|lines| lines.iter().find(|line| line["name"] == name))
        .unwrap_or_else(|| panic!("line {name} missing from {document}"))
}

#[test]
fn test_builder_api_exists() {
    // Just verify the API compiles and can be constructed
    let _builder = MapBuilder::default();
}

#[test]
fn test_parse_simple_network() {
    let builder = MapBuilder::default();
    let result = builder.parse(NETWORK, &station_ids());
    assert!(
        result.is_ok(),
        "Should parse valid network: {:?}",
        result.err()
    );

    let network = result.unwrap();
    assert_eq!(network.line_count(), 2);
    assert_eq!(network.curve_count(), 2);
}

#[test]
fn test_render_simple_network() {
    let document = render(&MapBuilder::default());

    assert_eq!(document["lineWidth"], 50);
    assert_eq!(document["maxX"], 600);
    assert_eq!(document["maxY"], 400);

    let red = line(&document, "red");
    let blue = line(&document, "blue");
    assert!(red["zIndex"].as_u64() > blue["zIndex"].as_u64());
    assert_eq!(red["stations"][0]["id"], "R1");
    assert_eq!(red["endpointSegments"].as_array().map(Vec::len), Some(1));

    let curved = &blue["edges"][1];
    assert_eq!(curved["station1Id"], "B2");
    assert_eq!(curved["station2Id"], "B3");
    let segments = curved["segments"].as_array().expect("segments");
    assert_eq!(segments[0]["p0"]["x"], 300);
    assert_eq!(segments[0]["p0"]["y"], 0);
    assert!(segments.iter().any(|segment| segment["straight"] == false));
}

#[test]
fn test_builder_stages() {
    let builder = MapBuilder::default();
    let network = builder.parse(NETWORK, &station_ids()).expect("parse");
    let layout = builder.solve(&network).expect("solve");
    let paths = builder
        .synthesize(&network, &layout, &templates())
        .expect("synthesize");
    let document = builder
        .assemble(&network, &layout, &paths, inputs().colors())
        .expect("assemble");

    let curves: Vec<_> = network.curves().map(|(id, _)| id).collect();
    assert_eq!(curves.len(), 2);
    assert!(curves.iter().all(|curve| !paths.path(*curve).is_empty()));
    assert_eq!(document.lines.len(), 2);
}

#[test]
fn test_builder_with_config() {
    let config = AppConfig::new(
        GeometryConfig::new(5.0, 40),
        SolverConfig::default(),
        EndpointConfig::default(),
        CurveConfig::default(),
        StationIdConfig::new(vec![StationIdOverride::new("red", "West", "HQ")]),
    );

    let document = render(&MapBuilder::new(config));

    assert_eq!(document["lineWidth"], 40);
    assert_eq!(line(&document, "red")["stations"][0]["id"], "HQ");
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = AppConfig::new(
        GeometryConfig::new(5.0, 45),
        SolverConfig::default(),
        EndpointConfig::default(),
        CurveConfig::default(),
        StationIdConfig::default(),
    );

    let result = MapBuilder::new(config).render_json(NETWORK, &inputs());
    assert!(matches!(result, Err(MetroMapError::Config(_))));
}

#[test]
fn test_parse_invalid_syntax_returns_error() {
    let invalid_source = "this is not a valid network";

    let builder = MapBuilder::default();
    let result = builder.parse(invalid_source, &station_ids());
    assert!(
        matches!(result, Err(MetroMapError::Parse { .. })),
        "Should return a parse error for invalid syntax"
    );
}

#[test]
fn test_missing_color_returns_error() {
    let mut colors = LineColors::new();
    colors.insert("red", "#e1251b");
    let inputs = MapInputs::new(station_ids(), templates(), colors);

    let result = MapBuilder::default().render_json(NETWORK, &inputs);
    assert!(result.is_err(), "Should fail without a color for blue");
}

#[test]
fn test_builder_reusability() {
    let builder = MapBuilder::default();

    let first = builder
        .render_json(NETWORK, &inputs())
        .expect("Failed to render first map");
    let second = builder
        .render_json(NETWORK, &inputs())
        .expect("Failed to render second map");

    assert_eq!(first, second, "Rendering should be deterministic");
}
