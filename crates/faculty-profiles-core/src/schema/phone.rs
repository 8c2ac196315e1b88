//! Telephone number validation.
//!
//! Numbers without a `+` country prefix are read as North American (NANP)
//! numbers. International numbers must fit E.164: a non-zero country code and
//! at most 15 digits in total.

use std::borrow::Cow;

use validator::ValidationError;

const INVALID_PHONE: &str = "Invalid phone number format";

/// Separators people type between digit groups.
const SEPARATORS: &[char] = &[' ', '-', '.', '(', ')', '/'];

pub fn validate_telephone(value: &str) -> Result<(), ValidationError> {
  if is_valid_number(value) {
    Ok(())
  } else {
    Err(ValidationError::new("telephone").with_message(Cow::Borrowed(INVALID_PHONE)))
  }
}

pub fn is_valid_number(value: &str) -> bool {
  let compact: String = value.chars().filter(|c| !SEPARATORS.contains(c)).collect();

  let (international, digits) = match compact.strip_prefix('+') {
    Some(rest) => (true, rest),
    None => (false, compact.as_str()),
  };
  if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
    return false;
  }

  if international {
    match digits.strip_prefix('1') {
      Some(national) => is_nanp(national),
      None => (8..=15).contains(&digits.len()) && !digits.starts_with('0'),
    }
  } else if digits.len() == 11 {
    digits.strip_prefix('1').is_some_and(is_nanp)
  } else {
    is_nanp(digits)
  }
}

/// `NXX-NXX-XXXX`: ten digits, area code and exchange may not start with 0/1,
/// and the area code may not be an `N11` service code.
fn is_nanp(digits: &str) -> bool {
  let b = digits.as_bytes();
  b.len() == 10
    && (b'2'..=b'9').contains(&b[0])
    && !(b[1] == b'1' && b[2] == b'1')
    && (b'2'..=b'9').contains(&b[3])
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn national_numbers() {
    assert!(is_valid_number("(212) 555-0199"));
    assert!(is_valid_number("212.555.0199"));
    assert!(is_valid_number("1-212-555-0199"));
  }

  #[test]
  fn international_numbers() {
    assert!(is_valid_number("+1 212 555 0199"));
    assert!(is_valid_number("+44 20 7946 0958"));
    assert!(!is_valid_number("+0 12345678"));
    assert!(!is_valid_number("+44 1234567890123456"));
  }

  #[test]
  fn rejects_malformed() {
    assert!(!is_valid_number("12"));
    assert!(!is_valid_number(""));
    assert!(!is_valid_number("call me"));
    assert!(!is_valid_number("012-555-0199"));
    assert!(!is_valid_number("911-555-0199"));
    assert!(!is_valid_number("212-055-0199"));
  }

  #[test]
  fn error_carries_message() {
    let err = validate_telephone("12").unwrap_err();
    assert_eq!(err.message.as_deref(), Some(INVALID_PHONE));
  }
}
