use serde::{Deserialize, Serialize};

/// Teaching days, Monday first. Weekday indices everywhere refer to this table.
pub const WEEKDAYS: [&str; 5] = ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"];

/// Fixed slot start times per day. Slot indices everywhere refer to this table.
pub const SLOT_TIMES: [&str; 4] = ["08:30", "11:00", "13:30", "16:00"];

pub const SLOTS_PER_DAY: u32 = SLOT_TIMES.len() as u32;
pub const POINTS_PER_WEEK: u32 = WEEKDAYS.len() as u32 * SLOTS_PER_DAY;

/// Seating capacity of a standard room; cohorts above this are split into groups.
pub const STANDARD_CAPACITY: u32 = 75;

/// An atomic schedulable unit of time. The derived `Ord` is week-major,
/// weekday-minor, slot-minor, which is the chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Point {
    pub week: u32,
    pub weekday: u8,
    pub slot: u8,
}

impl Point {
    /// Flat index into the occupancy grids.
    pub fn index(&self) -> u32 {
        self.week * POINTS_PER_WEEK + u32::from(self.weekday) * SLOTS_PER_DAY + u32::from(self.slot)
    }
}

/// A physical room from the fixed catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Room {
    pub id: String,
    pub capacity: u32,
    pub large_hall: bool,
}

/// The fixed room catalog: one large hall and ten standard rooms, in
/// ascending id order so candidate enumeration breaks ties toward the
/// lowest room id.
pub fn room_catalog() -> Vec<Room> {
    let standard = [
        "B0.001", "B0.003", "C0.004", "C0.008", "C0.016", "C0.020", "C1.005", "C1.015", "C2.007",
        "C2.017",
    ];
    let mut rooms: Vec<Room> = standard
        .iter()
        .map(|id| Room {
            id: (*id).to_string(),
            capacity: STANDARD_CAPACITY,
            large_hall: false,
        })
        .collect();
    rooms.push(Room {
        id: "MSP".to_string(),
        capacity: 150,
        large_hall: true,
    });
    rooms
}

/// The enumerable universe of schedulable points for one period.
#[derive(Debug, Clone, Copy)]
pub struct TimeGrid {
    weeks: u32,
}

impl TimeGrid {
    pub fn new(weeks: u32) -> Self {
        TimeGrid { weeks }
    }

    pub fn point_count(&self) -> u32 {
        self.weeks * POINTS_PER_WEEK
    }

    /// All points in ascending (week, weekday, slot) order.
    pub fn points(&self) -> impl Iterator<Item = Point> {
        let weeks = self.weeks;
        (0..weeks).flat_map(|week| {
            (0..WEEKDAYS.len() as u8).flat_map(move |weekday| {
                (0..SLOT_TIMES.len() as u8).map(move |slot| Point {
                    week,
                    weekday,
                    slot,
                })
            })
        })
    }
}

/// Parses a `"Weekday-HH:MM"` unavailability entry into (weekday, slot)
/// indices. The pattern recurs every week of the period.
pub fn parse_unavailable(spec: &str) -> Option<(u8, u8)> {
    let (day, time) = spec.split_once('-')?;
    let weekday = WEEKDAYS.iter().position(|d| *d == day)? as u8;
    let slot = SLOT_TIMES.iter().position(|t| *t == time)? as u8;
    Some((weekday, slot))
}
