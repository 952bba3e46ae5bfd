//! CNPJ (Brazilian company tax ID) cleaning, validation and formatting.
//!
//! A CNPJ has 12 base digits followed by two check digits. Each check digit
//! is a weighted sum modulo 11 over the digits before it: a remainder below 2
//! gives 0, otherwise the digit is `11 - remainder`.

const FIRST_WEIGHTS: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
const SECOND_WEIGHTS: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

pub const TAX_ID_LEN: usize = 14;

/// Strip every non-digit character.
pub fn clean_tax_id(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

fn check_digit(digits: &[u8], weights: &[u32]) -> u8 {
    let sum: u32 = digits
        .iter()
        .zip(weights)
        .map(|(d, w)| u32::from(*d) * w)
        .sum();
    let remainder = sum % 11;
    if remainder < 2 {
        0
    } else {
        (11 - remainder) as u8
    }
}

/// Both check digits for a 12-digit base.
pub fn check_digits(base: &[u8; 12]) -> (u8, u8) {
    let first = check_digit(base, &FIRST_WEIGHTS);
    let mut extended = [0u8; 13];
    extended[..12].copy_from_slice(base);
    extended[12] = first;
    let second = check_digit(&extended, &SECOND_WEIGHTS);
    (first, second)
}

/// `true` when `value`, ignoring punctuation, is a well-formed CNPJ.
pub fn is_valid_tax_id(value: &str) -> bool {
    let cleaned = clean_tax_id(value);
    if cleaned.len() != TAX_ID_LEN {
        return false;
    }

    let digits: Vec<u8> = cleaned.bytes().map(|b| b - b'0').collect();
    if digits.iter().all(|d| *d == digits[0]) {
        return false;
    }

    let mut base = [0u8; 12];
    base.copy_from_slice(&digits[..12]);
    let (first, second) = check_digits(&base);
    digits[12] == first && digits[13] == second
}

/// Render 14 digits as `00.000.000/0000-00`. Returns `None` when the cleaned
/// input does not have exactly 14 digits; the check digits are not verified.
pub fn format_tax_id(value: &str) -> Option<String> {
    let d = clean_tax_id(value);
    if d.len() != TAX_ID_LEN {
        return None;
    }
    Some(format!(
        "{}.{}.{}/{}-{}",
        &d[0..2],
        &d[2..5],
        &d[5..8],
        &d[8..12],
        &d[12..14]
    ))
}
