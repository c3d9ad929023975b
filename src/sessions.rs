use crate::data::{SchedulingInput, SessionKind, ValidationProblem};
use crate::grid::{self, STANDARD_CAPACITY};
use crate::solver::SolverConfig;
use itertools::Itertools;
use log::debug;
use std::collections::{BTreeSet, HashMap};

/// Program ids carrying this suffix denote first-year cohorts; their lectures
/// must go to the large hall and are never split.
pub const FIRST_YEAR_SUFFIX: &str = "_Y1";

/// One concrete instructional meeting to be placed. Derived before any
/// placement; the engine only reads it.
#[derive(Debug, Clone)]
pub struct Session {
    /// Position of the course in the input catalog, the primary ordering key.
    pub course_idx: usize,
    pub course: String,
    pub kind: SessionKind,
    /// Occurrence number within the course's required count, 1-based.
    pub seq: u32,
    /// Group number for split cohorts, 1-based; 1 when unsplit.
    pub group: u32,
    pub programs: Vec<String>,
    pub attendees: u32,
    pub rooms_required: u32,
    pub teacher: String,
    pub theory_before_practical: bool,
    pub needs_large_hall: bool,
}

impl Session {
    pub fn label(&self) -> String {
        format!("{} {} {}.{}", self.course, self.kind, self.seq, self.group)
    }
}

/// Validates the input document, returning every field-level problem found.
/// An empty result means scheduling may begin.
pub fn validate(input: &SchedulingInput) -> Vec<ValidationProblem> {
    let mut problems = Vec::new();
    let mut push = |field: String, message: String| {
        problems.push(ValidationProblem { field, message });
    };

    if input.metadata.weeks == 0 {
        push(
            "metadata.weeks".to_string(),
            "week count must be positive".to_string(),
        );
    }

    let mut codes: BTreeSet<&str> = BTreeSet::new();
    for course in &input.courses {
        if !codes.insert(course.code.as_str()) {
            push(
                format!("courses.{}", course.code),
                "duplicate course code".to_string(),
            );
        }
        if course.hours_per_session == 0 {
            push(
                format!("courses.{}.hours_per_session", course.code),
                "must be positive".to_string(),
            );
        }
    }

    let mut taught: BTreeSet<&str> = BTreeSet::new();
    for (name, teacher) in &input.teachers {
        for code in &teacher.courses {
            if codes.contains(code.as_str()) {
                taught.insert(code.as_str());
            } else {
                push(
                    format!("teachers.{name}.courses"),
                    format!("unknown course {code}"),
                );
            }
        }
        for spec in &teacher.unavailable {
            if grid::parse_unavailable(spec).is_none() {
                push(
                    format!("teachers.{name}.unavailable"),
                    format!("unrecognized point {spec:?}, expected \"Weekday-HH:MM\""),
                );
            }
        }
    }

    for (name, program) in &input.programs {
        if program.size == 0 {
            push(
                format!("programs.{name}.size"),
                "headcount must be positive".to_string(),
            );
        }
        for code in &program.courses {
            if !codes.contains(code.as_str()) {
                push(
                    format!("programs.{name}.courses"),
                    format!("unknown course {code}"),
                );
            }
        }
    }

    for course in &input.courses {
        if !taught.contains(course.code.as_str()) {
            push(
                format!("courses.{}", course.code),
                "no teacher covers this course".to_string(),
            );
        }
    }

    problems
}

/// Expands the course and program catalogs into the ordered session list:
/// course input order first, lectures before tutorials before labs within a
/// course. Tutorials and labs are derived per requiring program and split
/// into ceil(size / standard capacity) groups with pro-rated headcount.
pub fn derive_sessions(input: &SchedulingInput, config: &SolverConfig) -> Vec<Session> {
    let course_programs: HashMap<&str, Vec<&str>> = input
        .programs
        .iter()
        .flat_map(|(name, program)| {
            program
                .courses
                .iter()
                .map(move |code| (code.as_str(), name.as_str()))
        })
        .into_group_map();

    let teacher_of: HashMap<&str, &str> = input
        .teachers
        .iter()
        .flat_map(|(name, teacher)| teacher.courses.iter().map(move |c| (c.as_str(), name.as_str())))
        .fold(HashMap::new(), |mut acc, (code, name)| {
            acc.entry(code).or_insert(name);
            acc
        });

    let mut sessions = Vec::new();

    for (course_idx, course) in input.courses.iter().enumerate() {
        let Some(programs) = course_programs.get(course.code.as_str()) else {
            debug!("course {} is required by no program, skipping", course.code);
            continue;
        };
        // Validation guarantees a teacher exists for every course.
        let Some(teacher) = teacher_of.get(course.code.as_str()) else {
            continue;
        };

        let attendees: u32 = programs
            .iter()
            .map(|p| input.programs[*p].size)
            .sum();
        let first_year = programs.iter().any(|p| p.ends_with(FIRST_YEAR_SUFFIX));
        // Precedence is only meaningful when the course has a lecture to wait for.
        let theory_first = course.theory_before_practical && course.lectures > 0;

        for seq in 1..=course.lectures {
            sessions.push(Session {
                course_idx,
                course: course.code.clone(),
                kind: SessionKind::Lecture,
                seq,
                group: 1,
                programs: programs.iter().map(|p| (*p).to_string()).collect(),
                attendees,
                rooms_required: 1,
                teacher: (*teacher).to_string(),
                theory_before_practical: theory_first,
                needs_large_hall: first_year,
            });
        }

        for (kind, count) in [
            (SessionKind::Tutorial, course.tutorials),
            (SessionKind::Lab, course.labs),
        ] {
            let rooms_required = if kind == SessionKind::Tutorial && config.dual_room_tutorials {
                2
            } else {
                1
            };
            for program in programs {
                let size = input.programs[*program].size;
                let group_count = size.div_ceil(STANDARD_CAPACITY).max(1);
                let per_group = size.div_ceil(group_count);
                for seq in 1..=count {
                    for group in 1..=group_count {
                        sessions.push(Session {
                            course_idx,
                            course: course.code.clone(),
                            kind,
                            seq,
                            group,
                            programs: vec![(*program).to_string()],
                            attendees: per_group,
                            rooms_required,
                            teacher: (*teacher).to_string(),
                            theory_before_practical: theory_first,
                            needs_large_hall: false,
                        });
                    }
                }
            }
        }
    }

    sessions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{CourseSpec, Metadata, ProgramSpec, TeacherSpec};
    use std::collections::BTreeMap;

    fn course(code: &str, lectures: u32, tutorials: u32, labs: u32) -> CourseSpec {
        CourseSpec {
            code: code.to_string(),
            name: format!("{code} (long form)"),
            lectures,
            tutorials,
            labs,
            hours_per_session: 2,
            theory_before_practical: false,
        }
    }

    fn input_with(
        courses: Vec<CourseSpec>,
        teachers: Vec<(&str, Vec<&str>)>,
        programs: Vec<(&str, u32, Vec<&str>)>,
    ) -> SchedulingInput {
        SchedulingInput {
            metadata: Metadata {
                period: "Period 2".to_string(),
                year: "2024-2025".to_string(),
                weeks: 1,
            },
            courses,
            teachers: teachers
                .into_iter()
                .map(|(name, codes)| {
                    (
                        name.to_string(),
                        TeacherSpec {
                            courses: codes.into_iter().map(str::to_string).collect(),
                            unavailable: Vec::new(),
                        },
                    )
                })
                .collect::<BTreeMap<_, _>>(),
            programs: programs
                .into_iter()
                .map(|(name, size, codes)| {
                    (
                        name.to_string(),
                        ProgramSpec {
                            size,
                            courses: codes.into_iter().map(str::to_string).collect(),
                        },
                    )
                })
                .collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn large_cohort_splits_tutorials_into_groups() {
        let input = input_with(
            vec![course("BCS1220", 1, 1, 2)],
            vec![("Amara", vec!["BCS1220"])],
            vec![("CS_Y1", 300, vec!["BCS1220"])],
        );
        let sessions = derive_sessions(&input, &SolverConfig::default());

        // 1 lecture + 1 tutorial x 4 groups + 2 labs x 4 groups
        assert_eq!(sessions.len(), 13);

        let lecture = &sessions[0];
        assert_eq!(lecture.kind, SessionKind::Lecture);
        assert_eq!(lecture.attendees, 300);
        assert!(lecture.needs_large_hall);

        let tutorials: Vec<&Session> = sessions
            .iter()
            .filter(|s| s.kind == SessionKind::Tutorial)
            .collect();
        assert_eq!(tutorials.len(), 4);
        assert!(tutorials.iter().all(|s| s.attendees == 75));
        assert_eq!(
            tutorials.iter().map(|s| s.group).collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );
    }

    #[test]
    fn small_cohort_stays_whole() {
        let input = input_with(
            vec![course("ALG", 2, 1, 0)],
            vec![("Okafor", vec!["ALG"])],
            vec![("SE_Y2", 60, vec!["ALG"])],
        );
        let sessions = derive_sessions(&input, &SolverConfig::default());
        assert_eq!(sessions.len(), 3);
        let tutorial = sessions.last().unwrap();
        assert_eq!(tutorial.kind, SessionKind::Tutorial);
        assert_eq!(tutorial.group, 1);
        assert_eq!(tutorial.attendees, 60);
        assert!(!tutorial.needs_large_hall);
    }

    #[test]
    fn uneven_split_pro_rates_headcount() {
        let input = input_with(
            vec![course("NET", 0, 1, 0)],
            vec![("Sousa", vec!["NET"])],
            vec![("AI_Y2", 80, vec!["NET"])],
        );
        let sessions = derive_sessions(&input, &SolverConfig::default());
        assert_eq!(sessions.len(), 2);
        assert!(sessions.iter().all(|s| s.attendees == 40));
    }

    #[test]
    fn lecture_cohort_spans_all_requiring_programs() {
        let input = input_with(
            vec![course("DB", 1, 0, 0)],
            vec![("Okafor", vec!["DB"])],
            vec![("AI_Y2", 30, vec!["DB"]), ("SE_Y2", 40, vec!["DB"])],
        );
        let sessions = derive_sessions(&input, &SolverConfig::default());
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].programs, vec!["AI_Y2", "SE_Y2"]);
        assert_eq!(sessions[0].attendees, 70);
    }

    #[test]
    fn unrequired_course_derives_nothing() {
        let input = input_with(
            vec![course("DB", 1, 0, 0), course("NET", 1, 0, 0)],
            vec![("Okafor", vec!["DB", "NET"])],
            vec![("SE_Y2", 40, vec!["DB"])],
        );
        let sessions = derive_sessions(&input, &SolverConfig::default());
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].course, "DB");
    }

    #[test]
    fn theory_flag_cleared_without_lectures() {
        let mut spec = course("LAB", 0, 0, 1);
        spec.theory_before_practical = true;
        let input = input_with(
            vec![spec],
            vec![("Sousa", vec!["LAB"])],
            vec![("SE_Y2", 40, vec!["LAB"])],
        );
        let sessions = derive_sessions(&input, &SolverConfig::default());
        assert_eq!(sessions.len(), 1);
        assert!(!sessions[0].theory_before_practical);
    }

    #[test]
    fn dual_room_variant_requests_two_rooms() {
        let config = SolverConfig {
            dual_room_tutorials: true,
            ..SolverConfig::default()
        };
        let input = input_with(
            vec![course("NET", 1, 1, 1)],
            vec![("Sousa", vec!["NET"])],
            vec![("SE_Y2", 40, vec!["NET"])],
        );
        let sessions = derive_sessions(&input, &config);
        let by_kind = |k: SessionKind| sessions.iter().find(|s| s.kind == k).unwrap();
        assert_eq!(by_kind(SessionKind::Tutorial).rooms_required, 2);
        assert_eq!(by_kind(SessionKind::Lecture).rooms_required, 1);
        assert_eq!(by_kind(SessionKind::Lab).rooms_required, 1);
    }

    #[test]
    fn validation_reports_every_problem() {
        let mut input = input_with(
            vec![course("DB", 1, 0, 0)],
            vec![("Okafor", vec!["DB", "GHOST"])],
            vec![("SE_Y2", 0, vec!["DB", "MISSING"])],
        );
        input.metadata.weeks = 0;
        input
            .teachers
            .get_mut("Okafor")
            .unwrap()
            .unavailable
            .push("Sunday-08:30".to_string());

        let problems = validate(&input);
        let fields: Vec<&str> = problems.iter().map(|p| p.field.as_str()).collect();
        assert!(fields.contains(&"metadata.weeks"));
        assert!(fields.contains(&"teachers.Okafor.courses"));
        assert!(fields.contains(&"teachers.Okafor.unavailable"));
        assert!(fields.contains(&"programs.SE_Y2.size"));
        assert!(fields.contains(&"programs.SE_Y2.courses"));
    }

    #[test]
    fn validation_accepts_well_formed_input() {
        let input = input_with(
            vec![course("DB", 1, 1, 0)],
            vec![("Okafor", vec!["DB"])],
            vec![("SE_Y2", 40, vec!["DB"])],
        );
        assert!(validate(&input).is_empty());
    }

    #[test]
    fn uncovered_course_is_rejected() {
        let input = input_with(
            vec![course("DB", 1, 0, 0)],
            vec![],
            vec![("SE_Y2", 40, vec!["DB"])],
        );
        let problems = validate(&input);
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].field, "courses.DB");
    }
}
