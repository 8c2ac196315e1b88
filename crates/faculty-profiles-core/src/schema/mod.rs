//! Profile metadata schema: (de)serialisation, sanitisation and validation.
//!
//! Submitted JSON goes through [`load`], which deserialises it, strips
//! control characters from every string, runs field validators and resolves
//! identifier schemes. Any failure is reported as [`ValidationErrors`] listing
//! every offending field.

pub mod identifiers;
pub mod phone;

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use validator::Validate;

pub use identifiers::{HANDLER_SCHEMES, IDENTIFIER_SCHEMES, Identifier, Scheme};

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Messages attached to one field path, e.g. `metadata.telephone`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
  pub field:    String,
  pub messages: Vec<String>,
}

/// Every validation failure found in a submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
  pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
    Self(vec![FieldError { field: field.into(), messages: vec![message.into()] }])
  }

  pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
    let field = field.into();
    match self.0.iter_mut().find(|e| e.field == field) {
      Some(existing) => existing.messages.push(message.into()),
      None => self.0.push(FieldError { field, messages: vec![message.into()] }),
    }
  }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  /// Messages recorded against `field`.
  pub fn messages(&self, field: &str) -> &[String] {
    self
      .0
      .iter()
      .find(|e| e.field == field)
      .map(|e| e.messages.as_slice())
      .unwrap_or_default()
  }

  fn extend_from_validator(&mut self, prefix: &str, errors: &validator::ValidationErrors) {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));
    for (field, errs) in fields {
      for err in errs {
        let message = err
          .message
          .clone()
          .unwrap_or_else(|| Cow::Owned(format!("Invalid value ({}).", err.code)));
        self.push(format!("{prefix}.{field}"), message.into_owned());
      }
    }
  }
}

// ─── Vocabulary references ───────────────────────────────────────────────────

/// A reference into an externally managed vocabulary, e.g. profile types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VocabularyRef {
  pub id: String,
}

/// A funder, either by vocabulary id or free-text name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FunderRef {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id:   Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
}

/// An award, either by vocabulary id or by number and title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AwardRef {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id:     Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub number: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub title:  Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Funding {
  pub funder: FunderRef,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub award:  Option<AwardRef>,
}

/// A subject keyword, by vocabulary id or free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeywordRef {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id:      Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub subject: Option<String>,
}

// ─── Metadata ────────────────────────────────────────────────────────────────

/// Biographical metadata of a profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct Metadata {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub preferred_pronouns:    Option<String>,
  pub family_name:           String,
  pub given_names:           String,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub identifiers:           Vec<Identifier>,
  #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
  pub kind:                  Option<VocabularyRef>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub handlers:              Vec<Identifier>,
  #[validate(url(message = "Not a valid URL."))]
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub website:               Option<String>,
  #[validate(custom(function = "phone::validate_telephone"))]
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub telephone:             Option<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub funding:               Vec<Funding>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub keywords:              Vec<KeywordRef>,
  #[validate(length(min = 3, message = "Shorter than minimum length 3."))]
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub biography:             Option<String>,
  #[validate(length(min = 3, message = "Shorter than minimum length 3."))]
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub interests:             Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub title_status:          Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub department:            Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub institution:           Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub education:             Option<String>,
  #[validate(email(message = "Not a valid email address."))]
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub email_address:         Option<String>,
  #[validate(email(message = "Not a valid email address."))]
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub contact_email_address: Option<String>,
  #[validate(length(min = 3, message = "Shorter than minimum length 3."))]
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub office_address:        Option<String>,
}

impl Metadata {
  /// `"{family}, {given}"` as creators are named in research records, or
  /// `None` when the family name is blank.
  pub fn creator_name(&self) -> Option<String> {
    let family = self.family_name.trim();
    if family.is_empty() {
      return None;
    }
    Some(format!("{family}, {}", self.given_names.trim()))
  }

  /// Remove control characters and surrounding whitespace from all free-text
  /// fields.
  pub fn sanitize(&mut self) {
    self.family_name = sanitize(&self.family_name);
    self.given_names = sanitize(&self.given_names);
    for field in [
      &mut self.preferred_pronouns,
      &mut self.website,
      &mut self.telephone,
      &mut self.biography,
      &mut self.interests,
      &mut self.title_status,
      &mut self.department,
      &mut self.institution,
      &mut self.education,
      &mut self.email_address,
      &mut self.contact_email_address,
      &mut self.office_address,
    ] {
      if let Some(value) = field.as_mut() {
        *value = sanitize(value);
      }
    }
    for id in self.identifiers.iter_mut().chain(self.handlers.iter_mut()) {
      id.identifier = sanitize(&id.identifier);
    }
  }

  /// Run all field validators and resolve identifier schemes in place.
  pub fn check(&mut self) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();

    if self.family_name.is_empty() {
      errors.push("metadata.family_name", "Field may not be blank.");
    }
    if self.given_names.is_empty() {
      errors.push("metadata.given_names", "Field may not be blank.");
    }
    if let Err(e) = self.validate() {
      errors.extend_from_validator("metadata", &e);
    }

    let identifiers = std::mem::take(&mut self.identifiers);
    match identifiers::resolve_set(identifiers, IDENTIFIER_SCHEMES) {
      Ok(resolved) => self.identifiers = resolved,
      Err(messages) => {
        for m in messages {
          errors.push("metadata.identifiers", m);
        }
      }
    }

    let handlers = std::mem::take(&mut self.handlers);
    match identifiers::resolve_set(handlers, HANDLER_SCHEMES) {
      Ok(resolved) => self.handlers = resolved,
      Err(messages) => {
        for m in messages {
          errors.push("metadata.handlers", m);
        }
      }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
  }
}

fn sanitize(value: &str) -> String {
  value
    .chars()
    .filter(|c| !c.is_control() || matches!(c, '\n' | '\t' | '\r'))
    .collect::<String>()
    .trim()
    .to_owned()
}

// ─── Submission ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilesInput {
  pub enabled: Option<bool>,
}

/// The body accepted by create and update. Unknown top-level keys (`id`,
/// `links`, `permissions`, ...) are ignored so a read result can be submitted
/// back unchanged.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileInput {
  pub metadata: Metadata,
  pub active:   Option<bool>,
  pub files:    Option<FilesInput>,
}

/// Deserialise, sanitise and validate a submitted profile.
pub fn load(data: serde_json::Value) -> Result<ProfileInput, ValidationErrors> {
  let mut input: ProfileInput = serde_json::from_value(data)
    .map_err(|e| ValidationErrors::single("metadata", e.to_string()))?;
  input.metadata.sanitize();
  input.metadata.check()?;
  Ok(input)
}
