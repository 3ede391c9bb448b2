//! Display strings for factor values and changes. Presentation only; the
//! numeric value and direction carried alongside are authoritative.

use serde::Serialize;

use super::classify::ChangeDirection;

/// Defines how a factor value should be rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValueFormat {
    /// Dollar amount already in billions (e.g. 5821.33 -> "$5821.33B")
    UsdBillions,
    /// Dollar price (e.g. 71.2 -> "$71.20")
    Usd,
    /// Plain number with N decimals
    Decimal(usize),
    /// Decimal fraction rendered as percent with N decimals (0.0431 -> "4.31%")
    Percent(usize),
}

pub fn format_value(value: f64, format: ValueFormat) -> String {
    if !value.is_finite() {
        return "N/A".to_string();
    }
    match format {
        ValueFormat::UsdBillions => format!("${:.2}B", value),
        ValueFormat::Usd => format!("${:.2}", value),
        ValueFormat::Decimal(decimals) => format!("{:.*}", decimals, value),
        ValueFormat::Percent(decimals) => format!("{:.*}%", decimals, value * 100.0),
    }
}

/// Arrow-prefixed change string and its direction, e.g. ("↗ +5 bps", Up).
pub fn format_change(value: f64, previous: f64, bps: bool) -> (String, ChangeDirection) {
    if !value.is_finite() || !previous.is_finite() {
        return ("—".to_string(), ChangeDirection::Flat);
    }
    let diff = value - previous;
    let direction = ChangeDirection::between(value, previous);
    let arrow = match direction {
        ChangeDirection::Up => "↗",
        ChangeDirection::Down => "↘",
        ChangeDirection::Flat => "→",
    };
    let text = if bps {
        // Rates are decimals: 0.0001 == 1 bp
        format!("{} {:+.0} bps", arrow, diff * 10_000.0)
    } else {
        format!("{} {:+.2}%", arrow, diff)
    };
    (text, direction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(5821.333, ValueFormat::UsdBillions), "$5821.33B");
        assert_eq!(format_value(71.2, ValueFormat::Usd), "$71.20");
        assert_eq!(format_value(0.912345, ValueFormat::Decimal(4)), "0.9123");
        assert_eq!(format_value(0.0431, ValueFormat::Percent(2)), "4.31%");
        assert_eq!(format_value(f64::NAN, ValueFormat::Decimal(2)), "N/A");
    }

    #[test]
    fn test_format_change_bps() {
        let (text, dir) = format_change(0.0436, 0.0431, true);
        assert_eq!(text, "↗ +5 bps");
        assert_eq!(dir, ChangeDirection::Up);

        let (text, dir) = format_change(18.0, 18.0, false);
        assert_eq!(text, "→ +0.00%");
        assert_eq!(dir, ChangeDirection::Flat);
    }
}
