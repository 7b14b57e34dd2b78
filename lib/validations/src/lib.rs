//! # Input Validation Module
//!
//! This module provides validation functions for user inputs to prevent
//! invalid data from entering the system and improve security.

use std::sync::OnceLock;

use anyhow::{Context, anyhow};
use regex::Regex;

/// Options to validate input strings to have certain properties.
/// This ensures only valid data can enter the system.
///
/// ## Usage
///
/// ```
/// use validations::{StringValidator, StringValidatorMatches};
///
/// StringValidator::default()
///   .min_length(1)
///   .max_length(63)
///   .matches(StringValidatorMatches::ResourceName)
///   .validate("stack-one")?;
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Default)]
pub struct StringValidator {
  /// Specify the minimum length of string.
  /// Setting `0` will effectively skip this validation.
  pub min_length: usize,
  /// Specify max length of string, or None to allow arbitrary length.
  pub max_length: Option<usize>,
  /// Skip the control character check.
  /// Most values should not contain these by default.
  pub skip_control_check: bool,
  /// Specify a pattern to validate the string contents.
  pub matches: Option<StringValidatorMatches>,
}

impl StringValidator {
  /// Returns Ok if input passes validations, otherwise includes
  /// error with failure reason.
  pub fn validate(&self, input: &str) -> anyhow::Result<()> {
    let len = input.len();

    if len < self.min_length {
      return Err(anyhow!(
        "Input too short. Must be at least {} characters.",
        self.min_length
      ));
    }

    if let Some(max_length) = self.max_length
      && len > max_length
    {
      return Err(anyhow!(
        "Input too long. Must be at most {max_length} characters."
      ));
    }

    if !self.skip_control_check {
      validate_no_control_chars(input)?;
    }

    if let Some(matches) = &self.matches {
      matches.validate(input)?
    }

    Ok(())
  }

  pub fn min_length(mut self, min_length: usize) -> StringValidator {
    self.min_length = min_length;
    self
  }

  pub fn max_length(
    mut self,
    max_length: impl Into<Option<usize>>,
  ) -> StringValidator {
    self.max_length = max_length.into();
    self
  }

  pub fn skip_control_check(mut self) -> StringValidator {
    self.skip_control_check = true;
    self
  }

  pub fn matches(
    mut self,
    matches: impl Into<Option<StringValidatorMatches>>,
  ) -> StringValidator {
    self.matches = matches.into();
    self
  }
}

pub enum StringValidatorMatches {
  /// - alphanumeric characters, hyphens, underscores
  /// - first character must be alphanumeric
  ///
  /// Used for computed container/network/compose-project names.
  ResourceName,
  /// - alphanumeric characters
  /// - underscores
  /// - first character cannot be a digit
  VariableName,
}

impl StringValidatorMatches {
  /// Returns Ok if input passes validations, otherwise includes
  /// error with failure reason.
  fn validate(&self, input: &str) -> anyhow::Result<()> {
    let validate = || match self {
      StringValidatorMatches::ResourceName => {
        static RESOURCE_NAME_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = RESOURCE_NAME_REGEX.get_or_init(|| {
          Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9_-]*$")
            .expect("Failed to initialize resource name regex")
        });
        if regex.is_match(input) {
          Ok(())
        } else {
          Err(anyhow!(
            "Only alphanumeric characters, hyphens, and underscores are allowed, and the first character must be alphanumeric"
          ))
        }
      }

      StringValidatorMatches::VariableName => {
        static VARIABLE_NAME_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = VARIABLE_NAME_REGEX.get_or_init(|| {
          Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$")
            .expect("Failed to initialize variable name regex")
        });
        if regex.is_match(input) {
          Ok(())
        } else {
          Err(anyhow!(
            "Only alphanumeric characters and underscores are allowed"
          ))
        }
      }
    };
    validate().context("Invalid characters in input")
  }
}

fn validate_no_control_chars(input: &str) -> anyhow::Result<()> {
  for (index, char) in input.chars().enumerate() {
    if char.is_control() {
      return Err(anyhow!(
        "Control character at index {index}. Input: \"{input}\""
      ));
    }
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn resource_name_accepts_hyphen_and_underscore() {
    let validator = StringValidator::default()
      .max_length(127)
      .matches(StringValidatorMatches::ResourceName);
    assert!(validator.validate("stackyard-demo-1").is_ok());
    assert!(validator.validate("stackyard_demo_1").is_ok());
  }

  #[test]
  fn resource_name_rejects_leading_hyphen() {
    let validator = StringValidator::default()
      .matches(StringValidatorMatches::ResourceName);
    assert!(validator.validate("-demo").is_err());
  }

  #[test]
  fn resource_name_rejects_dots_and_slashes() {
    let validator = StringValidator::default()
      .matches(StringValidatorMatches::ResourceName);
    assert!(validator.validate("demo.stack").is_err());
    assert!(validator.validate("demo/stack").is_err());
  }

  #[test]
  fn max_length_is_enforced() {
    let validator = StringValidator::default()
      .max_length(4)
      .matches(StringValidatorMatches::ResourceName);
    assert!(validator.validate("abcde").is_err());
    assert!(validator.validate("abcd").is_ok());
  }

  #[test]
  fn control_chars_rejected_by_default() {
    let validator = StringValidator::default();
    assert!(validator.validate("abc\ndef").is_err());
  }
}
