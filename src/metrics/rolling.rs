//! Trailing-window means.

/// Window lengths (rows) reported for every dataset.
pub const WINDOWS: [usize; 3] = [7, 30, 60];

/// Trailing mean over `window` values ending at each index.
///
/// The first `window - 1` entries are `None`: a partial window is never
/// averaged or zero-filled. A zero window yields all `None`.
pub fn trailing_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }

    let mut out = vec![None; values.len().min(window - 1)];
    out.extend(
        values
            .windows(window)
            .map(|w| Some(w.iter().sum::<f64>() / window as f64)),
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undefined_until_window_is_full() {
        let values: Vec<f64> = (1..=10).map(f64::from).collect();
        let avg = trailing_mean(&values, 3);
        assert_eq!(avg.len(), 10);
        assert_eq!(avg[0], None);
        assert_eq!(avg[1], None);
        assert!((avg[2].unwrap() - 2.0).abs() < 1e-12);
        assert!((avg[9].unwrap() - 9.0).abs() < 1e-12);
    }

    #[test]
    fn shorter_than_window_is_all_undefined() {
        let avg = trailing_mean(&[70.0, 75.0], 7);
        assert_eq!(avg, vec![None, None]);
    }

    #[test]
    fn constant_series_averages_to_itself() {
        let values = vec![71.3; 90];
        for window in WINDOWS {
            let avg = trailing_mean(&values, window);
            for (i, v) in avg.iter().enumerate() {
                if i + 1 < window {
                    assert!(v.is_none());
                } else {
                    assert!((v.unwrap() - 71.3).abs() < 1e-9);
                }
            }
        }
    }

    #[test]
    fn zero_window() {
        assert_eq!(trailing_mean(&[1.0, 2.0], 0), vec![None, None]);
        assert!(trailing_mean(&[], 7).is_empty());
    }
}
