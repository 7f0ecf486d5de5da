//! Integer-cent money helpers.
//!
//! Every currency amount is an `i64` count of cents so that sums over many
//! line items are exact. Floating point only appears at the edges: numeric
//! cells read from binary workbooks and fractional quantities.

/// Largest magnitude accepted for any single amount (90 trillion dollars).
pub const MAX_ABS_CENTS: i64 = 9_000_000_000_000_000;

const MAX_ABS_DOLLARS: f64 = (MAX_ABS_CENTS / 100) as f64;

/// Characters stripped before a financial number is parsed.
fn is_decoration(c: char) -> bool {
    matches!(c, '$' | '€' | '£' | ',' | '\u{a0}') || c.is_whitespace()
}

/// Split a financial number into sign and a cleaned digit string:
/// - Strip currency symbols, thousands separators, whitespace
/// - Handle `(123.45)` → negative
/// - Returns None if non-numeric characters remain after stripping
fn clean_financial(s: &str) -> Option<(bool, String)> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }

    let (paren_negative, inner) = match trimmed.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, trimmed),
    };

    let inner = inner
        .trim()
        .trim_start_matches("USD")
        .trim_end_matches("USD");

    let cleaned: String = inner.chars().filter(|c| !is_decoration(*c)).collect();
    if cleaned.is_empty() {
        return None;
    }

    let (sign_negative, digits) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest.to_string()),
        None => (false, cleaned.strip_prefix('+').unwrap_or(&cleaned).to_string()),
    };
    if paren_negative && sign_negative {
        return None;
    }

    let mut seen_dot = false;
    let mut seen_digit = false;
    for c in digits.chars() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => return None,
        }
    }
    if !seen_digit {
        return None;
    }

    Some((paren_negative || sign_negative, digits))
}

/// Parse a financial number string (`"$1,234.56"`, `"(500.00)"`, `" 12 "`) as f64.
pub fn parse_financial_number(s: &str) -> Option<f64> {
    let (negative, digits) = clean_financial(s)?;
    let value: f64 = digits.parse().ok()?;
    Some(if negative { -value } else { value })
}

/// Parse a financial number string straight into cents without going through
/// floating point. Digits past the second decimal round half away from zero.
/// `None` past `MAX_ABS_CENTS`.
pub fn parse_cents(s: &str) -> Option<i64> {
    let (negative, digits) = clean_financial(s)?;
    let (whole, frac) = match digits.split_once('.') {
        Some((w, f)) => (w, f),
        None => (digits.as_str(), ""),
    };

    let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let mut frac_digits = frac.chars().map(|c| c as i64 - '0' as i64);
    let tenths = frac_digits.next().unwrap_or(0);
    let hundredths = frac_digits.next().unwrap_or(0);
    let round_up = frac_digits.next().map(|d| d >= 5).unwrap_or(false);

    let cents = whole
        .checked_mul(100)?
        .checked_add(tenths * 10 + hundredths + i64::from(round_up))?;
    if cents > MAX_ABS_CENTS {
        return None;
    }
    Some(if negative { -cents } else { cents })
}

/// Convert a float amount (dollars) to cents, rounding half away from zero.
pub fn cents_from_f64(value: f64) -> Option<i64> {
    if !value.is_finite() || value.abs() > MAX_ABS_DOLLARS {
        return None;
    }
    Some((value * 100.0).round() as i64)
}

/// `quantity × unit_price` in cents, rounded to the nearest cent. `None` when
/// the product is past `MAX_ABS_CENTS`.
pub fn extend_price(quantity: f64, unit_price_cents: i64) -> Option<i64> {
    let cents = (quantity * unit_price_cents as f64).round();
    (cents.is_finite() && cents.abs() <= MAX_ABS_CENTS as f64).then_some(cents as i64)
}

/// Sum of amounts, `None` on overflow or past `MAX_ABS_CENTS`.
pub fn checked_sum(amounts: impl IntoIterator<Item = i64>) -> Option<i64> {
    let total = amounts.into_iter().try_fold(0i64, |acc, a| acc.checked_add(a))?;
    (total.abs() <= MAX_ABS_CENTS).then_some(total)
}

/// Format cents as a plain amount with thousands separators: `-1,234.56`.
pub fn format_cents(cents: i64) -> String {
    let negative = cents < 0;
    let abs = cents.unsigned_abs();
    let whole = (abs / 100).to_string();
    let frac = abs % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    format!("{}{}.{:02}", if negative { "-" } else { "" }, grouped, frac)
}
