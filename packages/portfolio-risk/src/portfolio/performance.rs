//! Rate conversions between daily and annual periods.

/// Trading days used to convert between daily and annual rates.
pub const TRADING_DAYS_PER_YEAR: usize = 252;

/// Convert an annual rate to the equivalent daily compounding rate.
///
/// `(1 + annual)^(1 / periods_per_year) - 1`
pub fn annual_to_daily_rate(annual: f64, periods_per_year: usize) -> f64 {
    if periods_per_year == 0 {
        return annual;
    }
    (1.0 + annual).powf(1.0 / periods_per_year as f64) - 1.0
}

/// Convert a daily rate to the equivalent annual compounding rate.
///
/// `(1 + daily)^periods_per_year - 1`
pub fn daily_to_annual_rate(daily: f64, periods_per_year: usize) -> f64 {
    (1.0 + daily).powi(periods_per_year as i32) - 1.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_annual_to_daily_rate() {
        let daily = annual_to_daily_rate(0.05, TRADING_DAYS_PER_YEAR);

        // (1.05)^(1/252) - 1 ≈ 0.0001936
        assert_relative_eq!(daily, 0.000193630, epsilon = 1e-8);
    }

    #[test]
    fn test_rate_conversion_round_trip() {
        let daily = annual_to_daily_rate(0.04, TRADING_DAYS_PER_YEAR);
        let annual = daily_to_annual_rate(daily, TRADING_DAYS_PER_YEAR);
        assert_relative_eq!(annual, 0.04, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_rate() {
        assert_eq!(annual_to_daily_rate(0.0, TRADING_DAYS_PER_YEAR), 0.0);
        assert_eq!(daily_to_annual_rate(0.0, TRADING_DAYS_PER_YEAR), 0.0);
    }
}
