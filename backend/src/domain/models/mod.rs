pub mod attendance_record;
pub mod date_window;
pub mod grid;
