use crate::models::Regime;

pub const STABLE_BELOW: f64 = -0.5;
pub const STRESSED_AT: f64 = 0.75;

/// Maps a stress index to its regime. Boundaries belong to the higher regime.
pub fn classify(stress_index: f64) -> Regime {
    if stress_index < STABLE_BELOW {
        Regime::Stable
    } else if stress_index < STRESSED_AT {
        Regime::Elevated
    } else {
        Regime::Stressed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_follow_expected_tiers() {
        assert_eq!(classify(-2.0), Regime::Stable);
        assert_eq!(classify(0.0), Regime::Elevated);
        assert_eq!(classify(3.0), Regime::Stressed);
    }

    #[test]
    fn boundaries_close_toward_higher_regime() {
        assert_eq!(classify(-0.5), Regime::Elevated);
        assert_eq!(classify(-0.500_001), Regime::Stable);
        assert_eq!(classify(0.75), Regime::Stressed);
        assert_eq!(classify(0.749_999), Regime::Elevated);
    }
}
