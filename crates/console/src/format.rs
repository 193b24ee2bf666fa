//! Number formatting for account screens

use rust_decimal::{Decimal, RoundingStrategy};

/// Two decimals with thousands separators: `-1,234.50`
pub fn amount(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let digits = format!("{:.2}", rounded.abs());
    let (int_part, frac) = match digits.split_once('.') {
        Some(parts) => parts,
        None => (digits.as_str(), "00"),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{}{}.{}", sign, grouped, frac)
}

pub fn money(value: Decimal) -> String {
    format!("${}", amount(value))
}

pub fn percent(value: Decimal) -> String {
    format!("{}%", amount(value))
}

/// Missing identifiers render as `N/A`
pub fn or_na(value: Option<&str>) -> &str {
    value.unwrap_or("N/A")
}
