//! Persistent identifier schemes accepted on profiles.
//!
//! Profiles carry two identifier sets: researcher identifiers (ORCID, ISNI,
//! GND, ROR) and social handlers (LinkedIn). When a submitted identifier has
//! no scheme, the first scheme in table order that accepts the value wins.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// An identifier and the scheme it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Identifier {
  pub identifier: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub scheme:     Option<String>,
}

/// A named identifier scheme with its validator.
pub struct Scheme {
  pub name:  &'static str,
  pub label: &'static str,
  validate:  fn(&str) -> bool,
  normalize: fn(&str) -> String,
}

impl Scheme {
  pub fn accepts(&self, value: &str) -> bool { (self.validate)(value) }
}

pub const IDENTIFIER_SCHEMES: &[Scheme] = &[
  Scheme { name: "orcid", label: "ORCID", validate: is_orcid, normalize: normalize_orcid },
  Scheme { name: "isni", label: "ISNI", validate: is_isni, normalize: str::to_owned },
  Scheme { name: "gnd", label: "GND", validate: is_gnd, normalize: str::to_owned },
  Scheme { name: "ror", label: "ROR", validate: is_ror, normalize: str::to_owned },
];

pub const HANDLER_SCHEMES: &[Scheme] = &[Scheme {
  name:      "linkedin",
  label:     "LinkedIn",
  validate:  |_| true,
  normalize: str::to_owned,
}];

/// Resolve the scheme of every identifier in `ids` against `schemes`.
///
/// At most one identifier per scheme is allowed. On failure every problem is
/// returned, one message each.
pub fn resolve_set(
  ids: Vec<Identifier>,
  schemes: &[Scheme],
) -> Result<Vec<Identifier>, Vec<String>> {
  let mut resolved: Vec<Identifier> = Vec::with_capacity(ids.len());
  let mut errors = Vec::new();

  for id in ids {
    match resolve(id, schemes) {
      Ok(id) => {
        if resolved.iter().any(|r| r.scheme == id.scheme) {
          errors.push("Only one identifier per scheme is allowed.".to_owned());
        } else {
          resolved.push(id);
        }
      }
      Err(message) => errors.push(message),
    }
  }

  if errors.is_empty() { Ok(resolved) } else { Err(errors) }
}

fn resolve(id: Identifier, schemes: &[Scheme]) -> Result<Identifier, String> {
  let value = id.identifier.trim();
  if value.is_empty() {
    return Err("Missing data for required field.".to_owned());
  }

  let scheme = match id.scheme.as_deref().map(str::trim) {
    Some(name) => {
      let name = name.to_lowercase();
      let scheme = schemes
        .iter()
        .find(|s| s.name == name)
        .ok_or_else(|| format!("Invalid scheme: {name}."))?;
      if !scheme.accepts(value) {
        return Err(format!("Invalid {} identifier.", scheme.label));
      }
      scheme
    }
    None => schemes
      .iter()
      .find(|s| s.accepts(value))
      .ok_or_else(|| "Missing or invalid scheme.".to_owned())?,
  };

  Ok(Identifier {
    identifier: (scheme.normalize)(value),
    scheme:     Some(scheme.name.to_owned()),
  })
}

// ─── ISNI / ORCID ────────────────────────────────────────────────────────────

const ORCID_URL_PREFIXES: &[&str] = &["https://orcid.org/", "http://orcid.org/"];

/// ORCID iDs are ISNIs drawn from these ranges (check digit excluded).
const ORCID_RANGES: &[(u64, u64)] =
  &[(15_000_000, 35_000_000), (900_000_000_000, 900_100_000_000)];

fn compact(value: &str) -> String {
  value.chars().filter(|c| *c != '-' && *c != ' ').collect::<String>().to_uppercase()
}

/// ISO 7064 MOD 11-2 check character over the first 15 digits.
fn mod_11_2_check(digits: &str) -> Option<char> {
  let mut total: u32 = 0;
  for c in digits.chars() {
    total = (total + c.to_digit(10)?) * 2;
  }
  match (12 - total % 11) % 11 {
    10 => Some('X'),
    n => char::from_digit(n, 10),
  }
}

pub fn is_isni(value: &str) -> bool {
  let value = compact(value);
  if value.len() != 16 || !value.is_ascii() {
    return false;
  }
  let (body, check) = value.split_at(15);
  mod_11_2_check(body).is_some_and(|c| check.starts_with(c))
}

fn strip_orcid_url(value: &str) -> &str {
  ORCID_URL_PREFIXES
    .iter()
    .find_map(|prefix| value.strip_prefix(prefix))
    .unwrap_or(value)
}

pub fn is_orcid(value: &str) -> bool {
  let value = strip_orcid_url(value);
  if !is_isni(value) {
    return false;
  }
  let compacted = compact(value);
  let Ok(number) = compacted[..15].parse::<u64>() else {
    return false;
  };
  ORCID_RANGES.iter().any(|(lo, hi)| (*lo..=*hi).contains(&number))
}

/// `https://orcid.org/0000000218250097` → `0000-0002-1825-0097`.
fn normalize_orcid(value: &str) -> String {
  let compacted = compact(strip_orcid_url(value));
  compacted
    .as_bytes()
    .chunks(4)
    .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
    .collect::<Vec<_>>()
    .join("-")
}

// ─── GND / ROR ───────────────────────────────────────────────────────────────

static GND_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(
    r"^(gnd:|GND:)?((1|10)\d{7}[0-9X]|[47]\d{6}-\d|[1-9]\d{0,7}-[0-9X]|3\d{7}[0-9X])$",
  )
  .expect("valid GND pattern")
});

static ROR_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^(?:https?://)?(?:ror\.org/)?(0\w{6}\d{2})$").expect("valid ROR pattern")
});

pub fn is_gnd(value: &str) -> bool { GND_RE.is_match(value) }

pub fn is_ror(value: &str) -> bool { ROR_RE.is_match(value) }

#[cfg(test)]
mod tests {
  use super::*;

  fn id(identifier: &str, scheme: Option<&str>) -> Identifier {
    Identifier { identifier: identifier.into(), scheme: scheme.map(Into::into) }
  }

  #[test]
  fn orcid_checksum_and_range() {
    assert!(is_orcid("0000-0002-1825-0097"));
    assert!(is_orcid("https://orcid.org/0000-0002-1825-0097"));
    assert!(is_orcid("0000-0001-5109-3700"));
    assert!(!is_orcid("0000-0002-1825-0098"));
    // Valid ISNI, outside the ORCID block.
    assert!(is_isni("0000-0000-8155-4566"));
    assert!(!is_orcid("0000-0000-8155-4566"));
  }

  #[test]
  fn isni_check_digit_x() {
    assert!(is_isni("0000-0002-1694-233X"));
    assert!(!is_isni("0000-0002-1694-2330"));
    assert!(!is_isni("short"));
  }

  #[test]
  fn gnd_and_ror_patterns() {
    assert!(is_gnd("gnd:4079154-3"));
    assert!(is_gnd("118540238"));
    assert!(!is_gnd("abc"));
    assert!(is_ror("https://ror.org/03yrm5c26"));
    assert!(is_ror("03yrm5c26"));
    assert!(!is_ror("13yrm5c26"));
  }

  #[test]
  fn scheme_detected_in_table_order() {
    let out = resolve_set(vec![id("0000-0002-1825-0097", None)], IDENTIFIER_SCHEMES).unwrap();
    assert_eq!(out[0].scheme.as_deref(), Some("orcid"));

    let out = resolve_set(vec![id("03yrm5c26", None)], IDENTIFIER_SCHEMES).unwrap();
    assert_eq!(out[0].scheme.as_deref(), Some("ror"));
  }

  #[test]
  fn orcid_url_is_normalised() {
    let out = resolve_set(
      vec![id("https://orcid.org/0000000218250097", Some("ORCID"))],
      IDENTIFIER_SCHEMES,
    )
    .unwrap();
    assert_eq!(out, vec![id("0000-0002-1825-0097", Some("orcid"))]);
  }

  #[test]
  fn explicit_scheme_must_validate() {
    let err = resolve_set(vec![id("not-an-orcid", Some("orcid"))], IDENTIFIER_SCHEMES)
      .unwrap_err();
    assert_eq!(err, vec!["Invalid ORCID identifier.".to_owned()]);
  }

  #[test]
  fn unknown_scheme_rejected() {
    let err = resolve_set(vec![id("x", Some("doi"))], IDENTIFIER_SCHEMES).unwrap_err();
    assert_eq!(err, vec!["Invalid scheme: doi.".to_owned()]);
  }

  #[test]
  fn undetectable_identifier_rejected() {
    let err = resolve_set(vec![id("hello", None)], IDENTIFIER_SCHEMES).unwrap_err();
    assert_eq!(err, vec!["Missing or invalid scheme.".to_owned()]);
  }

  #[test]
  fn one_identifier_per_scheme() {
    let err = resolve_set(
      vec![id("0000-0002-1825-0097", None), id("0000-0001-5109-3700", None)],
      IDENTIFIER_SCHEMES,
    )
    .unwrap_err();
    assert_eq!(err, vec!["Only one identifier per scheme is allowed.".to_owned()]);
  }

  #[test]
  fn handlers_accept_anything() {
    let out = resolve_set(vec![id("jane-doe-123", None)], HANDLER_SCHEMES).unwrap();
    assert_eq!(out[0].scheme.as_deref(), Some("linkedin"));
  }
}
