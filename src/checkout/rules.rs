// src/checkout/rules.rs

//! Declarative per-field validation rules evaluated against a snapshot of
//! the whole value bag. Pure and deterministic; safe to re-run on every
//! keystroke or on blur for a single field.

use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use regex::Regex;

/// The form's value bag. Conditional rules read sibling fields from it.
pub type Values = HashMap<String, String>;

/// Custom validator escape hatch: an error message, or `None` when valid.
pub type CustomValidator = fn(&str, &Values) -> Option<String>;

/// Whether a field must be non-empty; `When` decides from sibling values.
#[derive(Clone)]
pub enum Requirement {
  Always,
  Never,
  When(fn(&Values) -> bool),
}

impl Requirement {
  fn applies(&self, values: &Values) -> bool {
    match self {
      Requirement::Always => true,
      Requirement::Never => false,
      Requirement::When(selector) => selector(values),
    }
  }
}

#[derive(Clone, Default)]
pub struct FieldRules {
  required: Option<(Requirement, String)>,
  min_length: Option<(usize, String)>,
  max_length: Option<(usize, String)>,
  pattern: Option<(Regex, String)>,
  custom: Option<CustomValidator>,
  email: bool,
  match_field: Option<(String, String)>,
}

impl FieldRules {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn required(mut self, message: &str) -> Self {
    self.required = Some((Requirement::Always, message.to_string()));
    self
  }

  pub fn required_when(mut self, selector: fn(&Values) -> bool, message: &str) -> Self {
    self.required = Some((Requirement::When(selector), message.to_string()));
    self
  }

  pub fn min_length(mut self, min: usize, message: &str) -> Self {
    self.min_length = Some((min, message.to_string()));
    self
  }

  pub fn max_length(mut self, max: usize, message: &str) -> Self {
    self.max_length = Some((max, message.to_string()));
    self
  }

  /// Panics on an invalid regex; rule sets are built from literals.
  pub fn pattern(mut self, pattern: &str, message: &str) -> Self {
    self.pattern = Some((Regex::new(pattern).expect("invalid field pattern"), message.to_string()));
    self
  }

  pub fn custom(mut self, validator: CustomValidator) -> Self {
    self.custom = Some(validator);
    self
  }

  pub fn email(mut self) -> Self {
    self.email = true;
    self
  }

  pub fn match_field(mut self, sibling: &str, message: &str) -> Self {
    self.match_field = Some((sibling.to_string(), message.to_string()));
    self
  }

  /// Evaluates this field against the value bag. First failing check wins:
  /// required, then (for non-empty values only) min/max length, pattern,
  /// custom, email, match. A field whose conditional requirement does not
  /// currently apply is skipped entirely, whatever its value holds.
  fn check(&self, name: &str, values: &Values) -> Option<String> {
    if let Some((Requirement::When(selector), _)) = &self.required {
      if !selector(values) {
        return None;
      }
    }

    let value = values.get(name).map(String::as_str).unwrap_or("");

    if value.trim().is_empty() {
      if let Some((requirement, message)) = &self.required {
        if requirement.applies(values) {
          return Some(message.clone());
        }
      }
      // Empty and not required: nothing further applies.
      return None;
    }

    if let Some((min, message)) = &self.min_length {
      if value.len() < *min {
        return Some(message.clone());
      }
    }
    if let Some((max, message)) = &self.max_length {
      if value.len() > *max {
        return Some(message.clone());
      }
    }
    if let Some((pattern, message)) = &self.pattern {
      if !pattern.is_match(value) {
        return Some(message.clone());
      }
    }
    if let Some(validator) = self.custom {
      if let Some(message) = validator(value, values) {
        return Some(message);
      }
    }
    if self.email && !email_pattern().is_match(value) {
      return Some("Please enter a valid email address".to_string());
    }
    if let Some((sibling, message)) = &self.match_field {
      let sibling_value = values.get(sibling).map(String::as_str).unwrap_or("");
      if value != sibling_value {
        return Some(message.clone());
      }
    }
    None
  }
}

fn email_pattern() -> &'static Regex {
  static EMAIL: OnceLock<Regex> = OnceLock::new();
  EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("invalid email pattern"))
}

/// An ordered collection of named field rules.
#[derive(Clone, Default)]
pub struct RuleSet {
  rules: Vec<(String, FieldRules)>,
}

impl RuleSet {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn field(mut self, name: &str, rules: FieldRules) -> Self {
    self.rules.push((name.to_string(), rules));
    self
  }

  /// Validates every ruled field; fields without rules are never validated.
  pub fn validate(&self, values: &Values) -> BTreeMap<String, String> {
    let mut errors = BTreeMap::new();
    for (name, rules) in &self.rules {
      if let Some(message) = rules.check(name, values) {
        errors.insert(name.clone(), message);
      }
    }
    errors
  }

  /// Revalidates a single field (the on-blur path).
  pub fn validate_field(&self, name: &str, values: &Values) -> Option<String> {
    self
      .rules
      .iter()
      .find(|(rule_name, _)| rule_name == name)
      .and_then(|(_, rules)| rules.check(name, values))
  }
}
