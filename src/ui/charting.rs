/// Compute X (seconds) and Y (WPM) bounds for the results chart
pub fn compute_chart_params(wpm_coords: &[(f64, f64)], duration_secs: f64) -> (f64, f64) {
    let highest_wpm = wpm_coords
        .iter()
        .map(|&(_, wpm)| wpm)
        .fold(0.0_f64, f64::max);

    let overall_duration = wpm_coords
        .last()
        .map(|&(t, _)| t)
        .unwrap_or(duration_secs)
        .max(duration_secs)
        .max(1.0);

    (overall_duration, highest_wpm.round())
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_chart_params_empty() {
        let (x, y) = compute_chart_params(&[], 5.0);
        assert_eq!(x, 5.0);
        assert_eq!(y, 0.0);
    }

    #[test]
    fn test_compute_chart_params_short_session() {
        let (x, y) = compute_chart_params(&[(0.2, 31.6)], 0.4);
        assert_eq!(x, 1.0);
        assert_eq!(y, 32.0);
    }

    #[test]
    fn test_compute_chart_params_uses_peak() {
        let (x, y) = compute_chart_params(&[(1.0, 20.0), (2.0, 55.0), (3.0, 41.0)], 3.0);
        assert_eq!(x, 3.0);
        assert_eq!(y, 55.0);
    }

    #[test]
    fn test_format_label() {
        assert_eq!(format_label(1.0), "1");
        assert_eq!(format_label(1.2345), "1.23");
    }
}
