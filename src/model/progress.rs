/// Share of completed chapters as a whole percentage in `0..=100`.
///
/// Only published chapters count; a course without any reports 0.
pub fn progress_percentage(completed: i64, total: i64) -> i32 {
    if total <= 0 {
        return 0;
    }

    let completed = completed.clamp(0, total);
    ((completed as f64 / total as f64) * 100.0).round() as i32
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_course_is_zero() {
        assert_eq!(progress_percentage(0, 0), 0);
        assert_eq!(progress_percentage(3, 0), 0);
    }

    #[test]
    fn rounds_to_nearest() {
        assert_eq!(progress_percentage(1, 3), 33);
        assert_eq!(progress_percentage(2, 3), 67);
        assert_eq!(progress_percentage(1, 8), 13);
    }

    #[test]
    fn full_and_overflow() {
        assert_eq!(progress_percentage(4, 4), 100);
        // progress rows for chapters that were unpublished afterwards
        assert_eq!(progress_percentage(5, 4), 100);
    }
}
