pub mod grid;
pub mod preference;
pub mod subject;
pub mod timetable;
