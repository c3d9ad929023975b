use crate::grid::Point;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Period metadata for one scheduling run.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Metadata {
    pub period: String,
    pub year: String,
    pub weeks: u32,
}

/// A course definition with its required session counts.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CourseSpec {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub lectures: u32,
    #[serde(default)]
    pub tutorials: u32,
    #[serde(default)]
    pub labs: u32,
    pub hours_per_session: u32,
    #[serde(default)]
    pub theory_before_practical: bool,
}

/// A teacher with the courses they cover and their weekly unavailability,
/// given as `"Weekday-HH:MM"` slot start times.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TeacherSpec {
    pub courses: Vec<String>,
    #[serde(default)]
    pub unavailable: Vec<String>,
}

/// A student cohort with its headcount and required courses.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProgramSpec {
    pub size: u32,
    pub courses: Vec<String>,
}

/// The complete input document for one scheduling run. Teacher and program
/// maps are ordered so every derived sequence is deterministic.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SchedulingInput {
    pub metadata: Metadata,
    pub courses: Vec<CourseSpec>,
    pub teachers: BTreeMap<String, TeacherSpec>,
    pub programs: BTreeMap<String, ProgramSpec>,
}

/// The three kinds of instructional meetings. The derived `Ord` (lecture <
/// tutorial < lab) is the secondary session ordering key.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    Lecture,
    Tutorial,
    Lab,
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionKind::Lecture => "lecture",
            SessionKind::Tutorial => "tutorial",
            SessionKind::Lab => "lab",
        };
        write!(f, "{name}")
    }
}

/// The hard constraint dimensions a candidate placement can violate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    TeacherUnavailable,
    TeacherBusy,
    ProgramBusy,
    RoomTooSmall,
    RoomBusy,
    LargeHallRequired,
    PracticalTooEarly,
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ConstraintKind::TeacherUnavailable => "teacher unavailable",
            ConstraintKind::TeacherBusy => "teacher already booked",
            ConstraintKind::ProgramBusy => "program already booked",
            ConstraintKind::RoomTooSmall => "no room with sufficient capacity",
            ConstraintKind::RoomBusy => "room already booked",
            ConstraintKind::LargeHallRequired => "large hall required",
            ConstraintKind::PracticalTooEarly => "practical before lecture",
        };
        write!(f, "{text}")
    }
}

/// The second half of a dual-room tutorial that could not get both rooms at
/// one point and fell back to a separate point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverflowRoom {
    #[serde(flatten)]
    pub point: Point,
    pub room: String,
}

/// One committed session in the final schedule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedSession {
    pub course: String,
    pub kind: SessionKind,
    pub seq: u32,
    pub group: u32,
    pub programs: Vec<String>,
    pub teacher: String,
    #[serde(flatten)]
    pub point: Point,
    pub rooms: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overflow: Option<OverflowRoom>,
}

/// A session the engine could not place anywhere, with the constraint that
/// blocked the most attempted points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacementFailure {
    pub course: String,
    pub kind: SessionKind,
    pub seq: u32,
    pub group: u32,
    pub constraint: ConstraintKind,
    pub attempted_points: u32,
}

impl fmt::Display for PlacementFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}.{}: {} at all {} attempted points",
            self.course, self.kind, self.seq, self.group, self.constraint, self.attempted_points
        )
    }
}

/// The final output of the engine. `score` is the summed soft cost of the
/// committed placements, lower is better.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchedulingOutput {
    pub metadata: Metadata,
    pub placed: Vec<PlacedSession>,
    pub failures: Vec<PlacementFailure>,
    pub score: f64,
}

/// One field-level problem found while validating the input document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationProblem {
    pub field: String,
    pub message: String,
}

impl fmt::Display for ValidationProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Malformed or internally inconsistent input. Fatal; raised before any
/// scheduling attempt begins.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigurationError {
    pub problems: Vec<ValidationProblem>,
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid scheduling input ({} problems)", self.problems.len())?;
        for problem in &self.problems {
            write!(f, "\n  {problem}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigurationError {}
