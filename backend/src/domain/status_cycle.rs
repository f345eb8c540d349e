use shared::AttendanceStatus;

/// The status cycle an operator steps through by clicking an anchor cell:
/// `Unrecorded → Present → Absent → Late → Unrecorded`
pub struct StatusCycleEngine;

impl StatusCycleEngine {
    pub const CYCLE: [AttendanceStatus; 4] = [
        AttendanceStatus::Unrecorded,
        AttendanceStatus::Present,
        AttendanceStatus::Absent,
        AttendanceStatus::Late,
    ];

    pub fn next(current: AttendanceStatus) -> AttendanceStatus {
        match current {
            AttendanceStatus::Unrecorded => AttendanceStatus::Present,
            AttendanceStatus::Present => AttendanceStatus::Absent,
            AttendanceStatus::Absent => AttendanceStatus::Late,
            AttendanceStatus::Late => AttendanceStatus::Unrecorded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_to_late_to_unrecorded() {
        let late = StatusCycleEngine::next(AttendanceStatus::Absent);
        assert_eq!(late, AttendanceStatus::Late);
        assert_eq!(StatusCycleEngine::next(late), AttendanceStatus::Unrecorded);
    }

    #[test]
    fn test_cycle_closes_after_four_steps() {
        for start in StatusCycleEngine::CYCLE {
            let mut status = start;
            for _ in 0..4 {
                status = StatusCycleEngine::next(status);
            }
            assert_eq!(status, start);
        }
    }

    #[test]
    fn test_next_follows_cycle_order() {
        for (i, status) in StatusCycleEngine::CYCLE.iter().enumerate() {
            let expected = StatusCycleEngine::CYCLE[(i + 1) % StatusCycleEngine::CYCLE.len()];
            assert_eq!(StatusCycleEngine::next(*status), expected);
        }
    }
}
