//! IBAN handling
//!
//! Membership contracts are often scanned with the IBAN partially blacked
//! out. A redacted IBAN is still shown to the user, but it can never be
//! imported; the user has to type the full one, which is then checked
//! against ISO 13616 (structure + mod-97 checksum).

use crate::error::MemberError;

const MASK_CHARS: [char; 3] = ['*', '•', 'X'];

/// Strips whitespace and uppercases
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// True when the IBAN as printed has masked characters
pub fn is_redacted(raw: &str) -> bool {
    // Lowercase `x` masks are folded into `X` by `normalize`
    normalize(raw)
        .chars()
        .skip(2)
        .any(|c| MASK_CHARS.contains(&c))
}

/// Validates and returns the normalized IBAN
pub fn validate(raw: &str) -> Result<String, MemberError> {
    let iban = normalize(raw);

    if !(15..=34).contains(&iban.len()) {
        return Err(MemberError::InvalidIban(format!(
            "length {} is outside 15..=34",
            iban.len()
        )));
    }

    let bytes = iban.as_bytes();
    if !bytes[..2].iter().all(u8::is_ascii_uppercase) || !bytes[2..4].iter().all(u8::is_ascii_digit) {
        return Err(MemberError::InvalidIban(
            "must start with a country code and two check digits".to_string(),
        ));
    }

    if !bytes.iter().all(u8::is_ascii_alphanumeric) {
        return Err(MemberError::InvalidIban(
            "contains characters other than letters and digits".to_string(),
        ));
    }

    if checksum(&iban) != 1 {
        return Err(MemberError::InvalidIban("checksum mismatch".to_string()));
    }

    Ok(iban)
}

/// Masks all but the country code and the last four characters, for logs
pub fn mask(raw: &str) -> String {
    let iban = normalize(raw);
    if iban.len() <= 8 {
        return "*".repeat(iban.len());
    }
    let (head, rest) = iban.split_at(4);
    let tail = &rest[rest.len() - 4..];
    format!("{}{}{}", head, "*".repeat(rest.len() - 4), tail)
}

/// Validates a BIC (8 or 11 characters, letters for bank and country code)
pub fn validate_bic(raw: &str) -> Result<String, MemberError> {
    let bic = normalize(raw);
    let bytes = bic.as_bytes();
    let shape_ok = matches!(bytes.len(), 8 | 11)
        && bytes[..6].iter().all(u8::is_ascii_uppercase)
        && bytes[6..].iter().all(u8::is_ascii_alphanumeric);
    if !shape_ok {
        return Err(MemberError::InvalidBic(bic));
    }
    Ok(bic)
}

/// ISO 7064 mod 97-10 over the rearranged IBAN, computed digit by digit
fn checksum(iban: &str) -> u32 {
    let (head, tail) = iban.split_at(4);
    tail.chars()
        .chain(head.chars())
        .fold(0u32, |acc, c| match c.to_digit(36) {
            Some(value) if value >= 10 => (acc * 100 + value) % 97,
            Some(value) => (acc * 10 + value) % 97,
            None => acc,
        })
}
