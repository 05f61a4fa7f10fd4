// src/checkout/form.rs

//! Value/error/touched triple backing one checkout screen.

use std::collections::{BTreeMap, BTreeSet};

use crate::checkout::rules::{RuleSet, Values};

#[derive(Clone, Default)]
pub struct FormState {
  values: Values,
  errors: BTreeMap<String, String>,
  touched: BTreeSet<String>,
}

impl FormState {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn value(&self, name: &str) -> &str {
    self.values.get(name).map(String::as_str).unwrap_or("")
  }

  pub fn values(&self) -> &Values {
    &self.values
  }

  pub fn errors(&self) -> &BTreeMap<String, String> {
    &self.errors
  }

  pub fn error(&self, name: &str) -> Option<&str> {
    self.errors.get(name).map(String::as_str)
  }

  pub fn is_touched(&self, name: &str) -> bool {
    self.touched.contains(name)
  }

  /// Updates one field and clears its stale error, matching the
  /// change-then-revalidate-on-blur interaction.
  pub fn set_value(&mut self, name: &str, value: &str) {
    self.values.insert(name.to_string(), value.to_string());
    self.errors.remove(name);
  }

  /// Marks the field touched and revalidates only that field.
  pub fn blur(&mut self, name: &str, rules: &RuleSet) {
    self.touched.insert(name.to_string());
    match rules.validate_field(name, &self.values) {
      Some(message) => {
        self.errors.insert(name.to_string(), message);
      }
      None => {
        self.errors.remove(name);
      }
    }
  }

  /// Validates every ruled field, records the error map, and marks all
  /// ruled fields touched. Returns true when the form is clean.
  pub fn validate_all(&mut self, rules: &RuleSet) -> bool {
    self.errors = rules.validate(&self.values);
    for name in self.errors.keys() {
      self.touched.insert(name.clone());
    }
    self.errors.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::checkout::rules::FieldRules;

  fn name_rules() -> RuleSet {
    RuleSet::new().field("name", FieldRules::new().required("Name is required"))
  }

  #[test]
  fn set_value_clears_stale_error() {
    let rules = name_rules();
    let mut form = FormState::new();
    assert!(!form.validate_all(&rules));
    assert!(form.error("name").is_some());

    form.set_value("name", "Ada");
    assert!(form.error("name").is_none());
    assert!(form.validate_all(&rules));
  }

  #[test]
  fn blur_revalidates_single_field() {
    let rules = name_rules();
    let mut form = FormState::new();
    form.blur("name", &rules);
    assert!(form.is_touched("name"));
    assert_eq!(form.error("name").unwrap(), "Name is required");

    form.set_value("name", "Ada");
    form.blur("name", &rules);
    assert!(form.error("name").is_none());
  }
}
