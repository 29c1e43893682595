//! Lenient numeric parsing used by the [`Value`](super::Value) conversions.
//!
//! These follow the C library rules the store has always applied to string
//! slots: leading whitespace is skipped, the longest valid numeric prefix is
//! used, and a string with no digits at all yields `None` so the caller can
//! fall back to its default.

fn skip_space(s: &str) -> &str {
    s.trim_start_matches(|c: char| c.is_ascii_whitespace() || c == '\x0b')
}

/// Sign and (saturated) magnitude of the integer prefix of `s`.
///
/// The radix is detected like `strtoll(_, _, 0)`: `0x`/`0X` selects hex, a
/// leading `0` selects octal, anything else is decimal.
fn integer_prefix(s: &str) -> Option<(bool, u128)> {
    let bytes = skip_space(s).as_bytes();
    let mut pos = 0;
    let mut negative = false;

    if let Some(&sign @ (b'+' | b'-')) = bytes.first() {
        negative = sign == b'-';
        pos = 1;
    }

    let rest = &bytes[pos..];
    let (radix, start) = if rest.len() > 2
        && rest[0] == b'0'
        && (rest[1] == b'x' || rest[1] == b'X')
        && rest[2].is_ascii_hexdigit()
    {
        (16, pos + 2)
    } else if rest.first() == Some(&b'0') {
        (8, pos)
    } else {
        (10, pos)
    };

    let mut magnitude: u128 = 0;
    let mut end = start;
    while let Some(digit) = bytes.get(end).and_then(|&b| (b as char).to_digit(radix)) {
        magnitude = magnitude
            .saturating_mul(radix as u128)
            .saturating_add(digit as u128);
        end += 1;
    }

    (end > start).then_some((negative, magnitude))
}

/// `strtoll` with base detection; saturates on overflow.
pub(crate) fn parse_i64_prefix(s: &str) -> Option<i64> {
    let (negative, magnitude) = integer_prefix(s)?;
    Some(if negative {
        if magnitude > i64::MAX as u128 + 1 {
            i64::MIN
        } else {
            (-(magnitude as i128)) as i64
        }
    } else {
        magnitude.min(i64::MAX as u128) as i64
    })
}

/// `strtoull` with base detection; saturates on overflow and wraps a negated
/// magnitude the way the C function does.
pub(crate) fn parse_u64_prefix(s: &str) -> Option<u64> {
    let (negative, magnitude) = integer_prefix(s)?;
    if magnitude > u64::MAX as u128 {
        return Some(u64::MAX);
    }
    let value = magnitude as u64;
    Some(if negative { value.wrapping_neg() } else { value })
}

/// `atof`-style prefix parse: sign, digits, optional fraction and exponent,
/// or one of `inf`, `infinity`, `nan` (case-insensitive).
pub(crate) fn parse_f64_prefix(s: &str) -> Option<f64> {
    let text = skip_space(s);
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }

    let lower = text[end..].to_ascii_lowercase();
    for word in ["infinity", "inf", "nan"] {
        if lower.starts_with(word) {
            let value = if word == "nan" { f64::NAN } else { f64::INFINITY };
            return Some(if bytes.first() == Some(&b'-') { -value } else { value });
        }
    }

    let digits_from = |mut pos: usize| {
        while bytes.get(pos).is_some_and(u8::is_ascii_digit) {
            pos += 1;
        }
        pos
    };

    let int_end = digits_from(end);
    let mut mantissa_digits = int_end - end;
    end = int_end;

    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        mantissa_digits += frac_end - (end + 1);
        end = frac_end;
    }

    if mantissa_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }

    text[..end].parse::<f64>().ok()
}
