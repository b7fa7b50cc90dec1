/// Pick a points-per-second density so short audio still fills `min_points`.
///
/// When `duration_seconds * min_points_per_second` falls short of
/// `min_points`, the density is raised to `min_points / duration_seconds`.
/// Unknown or non-positive durations keep `min_points_per_second`.
pub fn fit_points_per_second(
    duration_seconds: f64,
    min_points_per_second: f64,
    min_points: f64,
) -> f64 {
    if !duration_seconds.is_finite() || duration_seconds <= 0.0 {
        return min_points_per_second;
    }
    if duration_seconds * min_points_per_second < min_points {
        min_points / duration_seconds
    } else {
        min_points_per_second
    }
}
