use crate::data::SessionKind;
use crate::grid::{Point, SLOTS_PER_DAY};
use crate::sessions::Session;
use std::collections::{HashMap, HashSet};

/// Occupancy state for one scheduling run: who and what is booked at each
/// point, plus the per-course state the precedence and consistency rules
/// read. Mutated exclusively by the assignment engine; the feasibility
/// checker and scorer only take it by shared reference.
#[derive(Debug, Default, Clone)]
pub struct OccupancyTracker {
    teacher_busy: HashMap<String, HashSet<u32>>,
    program_busy: HashMap<String, HashSet<u32>>,
    room_busy: HashMap<String, HashSet<u32>>,
    course_busy: HashMap<String, HashSet<u32>>,
    last_lecture: HashMap<String, Point>,
    last_room: HashMap<String, String>,
}

impl OccupancyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn teacher_at(&self, teacher: &str, point: u32) -> bool {
        self.teacher_busy
            .get(teacher)
            .is_some_and(|p| p.contains(&point))
    }

    pub fn program_at(&self, program: &str, point: u32) -> bool {
        self.program_busy
            .get(program)
            .is_some_and(|p| p.contains(&point))
    }

    pub fn room_at(&self, room: &str, point: u32) -> bool {
        self.room_busy.get(room).is_some_and(|p| p.contains(&point))
    }

    pub fn course_at(&self, course: &str, point: u32) -> bool {
        self.course_busy
            .get(course)
            .is_some_and(|p| p.contains(&point))
    }

    /// Point of the most recently committed lecture of the course.
    pub fn last_lecture(&self, course: &str) -> Option<Point> {
        self.last_lecture.get(course).copied()
    }

    /// Room most recently used for the course.
    pub fn last_room(&self, course: &str) -> Option<&str> {
        self.last_room.get(course).map(String::as_str)
    }

    /// Which of the day's slots the program already occupies, for the point's
    /// week and weekday.
    pub fn program_day_slots(&self, program: &str, point: Point) -> [bool; 4] {
        let base = point.index() - u32::from(point.slot);
        match self.program_busy.get(program) {
            Some(points) => {
                let mut slots = [false; 4];
                for (slot, occupied) in slots.iter_mut().enumerate() {
                    *occupied = points.contains(&(base + slot as u32));
                }
                slots
            }
            None => [false; SLOTS_PER_DAY as usize],
        }
    }

    /// Books the session into all three grids and records the per-course
    /// state.
    pub fn commit(&mut self, session: &Session, point: Point, rooms: &[String]) {
        let idx = point.index();
        self.teacher_busy
            .entry(session.teacher.clone())
            .or_default()
            .insert(idx);
        for program in &session.programs {
            self.program_busy
                .entry(program.clone())
                .or_default()
                .insert(idx);
        }
        for room in rooms {
            self.room_busy.entry(room.clone()).or_default().insert(idx);
            self.last_room.insert(session.course.clone(), room.clone());
        }
        self.course_busy
            .entry(session.course.clone())
            .or_default()
            .insert(idx);
        if session.kind == SessionKind::Lecture {
            self.last_lecture.insert(session.course.clone(), point);
        }
    }

    /// Undoes a `commit`. Only used when the second half of a split tutorial
    /// cannot be placed and its first half must be withdrawn.
    pub fn release(&mut self, session: &Session, point: Point, rooms: &[String]) {
        let idx = point.index();
        if let Some(points) = self.teacher_busy.get_mut(&session.teacher) {
            points.remove(&idx);
        }
        for program in &session.programs {
            if let Some(points) = self.program_busy.get_mut(program) {
                points.remove(&idx);
            }
        }
        for room in rooms {
            if let Some(points) = self.room_busy.get_mut(room) {
                points.remove(&idx);
            }
        }
        if let Some(points) = self.course_busy.get_mut(&session.course) {
            points.remove(&idx);
        }
    }

    /// Restores the course's last-used room after a `release`.
    pub fn restore_last_room(&mut self, course: &str, previous: Option<String>) {
        match previous {
            Some(room) => {
                self.last_room.insert(course.to_string(), room);
            }
            None => {
                self.last_room.remove(course);
            }
        }
    }
}
