use timetabler::data::{SchedulingInput, SessionKind};
use timetabler::solver::{SolverConfig, solve};

const SAMPLE_DOCUMENT: &str = r#"{
    "metadata": { "period": "Period 2", "year": "2024-2025", "weeks": 7 },
    "courses": [
        {
            "code": "BCS1220",
            "name": "Objects in Programming",
            "lectures": 1,
            "tutorials": 1,
            "labs": 2,
            "hours_per_session": 2,
            "theory_before_practical": true
        },
        {
            "code": "BCS1440",
            "name": "Computer Systems",
            "lectures": 2,
            "tutorials": 1,
            "labs": 0,
            "hours_per_session": 2
        }
    ],
    "teachers": {
        "Amara": { "courses": ["BCS1220"], "unavailable": ["Monday-08:30", "Friday-16:00"] },
        "Sousa": { "courses": ["BCS1440"], "unavailable": [] }
    },
    "programs": {
        "CS_Y1": { "size": 300, "courses": ["BCS1220", "BCS1440"] }
    }
}"#;

#[test]
fn sample_document_parses_and_solves() {
    let input: SchedulingInput = serde_json::from_str(SAMPLE_DOCUMENT).unwrap();
    assert_eq!(input.metadata.weeks, 7);
    assert_eq!(input.courses.len(), 2);
    assert!(!input.courses[1].theory_before_practical);
    assert_eq!(input.teachers["Amara"].unavailable.len(), 2);
    assert_eq!(input.programs["CS_Y1"].size, 300);

    let output = solve(&input, &SolverConfig::default()).unwrap();
    assert!(output.failures.is_empty(), "failures: {:?}", output.failures);
    // BCS1220: 1 + 4 + 8; BCS1440: 2 + 4.
    assert_eq!(output.placed.len(), 19);
}

#[test]
fn output_document_carries_the_flat_session_shape() {
    let input: SchedulingInput = serde_json::from_str(SAMPLE_DOCUMENT).unwrap();
    let output = solve(&input, &SolverConfig::default()).unwrap();

    let lecture = output
        .placed
        .iter()
        .find(|p| p.course == "BCS1220" && p.kind == SessionKind::Lecture)
        .unwrap();
    let json = serde_json::to_value(lecture).unwrap();
    assert_eq!(json["course"], "BCS1220");
    assert_eq!(json["kind"], "lecture");
    assert_eq!(json["teacher"], "Amara");
    assert!(json["week"].is_u64());
    assert!(json["weekday"].is_u64());
    assert!(json["slot"].is_u64());
    assert!(json["rooms"].is_array());
    assert!(json.get("overflow").is_none());
}

#[test]
fn inconsistent_document_is_rejected_before_scheduling() {
    let mut input: SchedulingInput = serde_json::from_str(SAMPLE_DOCUMENT).unwrap();
    input
        .programs
        .get_mut("CS_Y1")
        .unwrap()
        .courses
        .push("BCS9999".to_string());
    input.metadata.weeks = 0;

    let error = solve(&input, &SolverConfig::default()).unwrap_err();
    let fields: Vec<&str> = error.problems.iter().map(|p| p.field.as_str()).collect();
    assert!(fields.contains(&"metadata.weeks"));
    assert!(fields.contains(&"programs.CS_Y1.courses"));
}

#[test]
fn configuration_error_serializes_for_the_service_layer() {
    let mut input: SchedulingInput = serde_json::from_str(SAMPLE_DOCUMENT).unwrap();
    input.programs.get_mut("CS_Y1").unwrap().size = 0;

    let error = solve(&input, &SolverConfig::default()).unwrap_err();
    let json = serde_json::to_value(&error).unwrap();
    assert_eq!(json["problems"][0]["field"], "programs.CS_Y1.size");
    assert!(error.to_string().contains("programs.CS_Y1.size"));
}

#[test]
fn malformed_unavailability_is_a_field_problem() {
    let mut input: SchedulingInput = serde_json::from_str(SAMPLE_DOCUMENT).unwrap();
    input
        .teachers
        .get_mut("Amara")
        .unwrap()
        .unavailable
        .push("Monday at dawn".to_string());

    let error = solve(&input, &SolverConfig::default()).unwrap_err();
    assert_eq!(error.problems.len(), 1);
    assert_eq!(error.problems[0].field, "teachers.Amara.unavailable");
}
