//! SCC finding filter builder
//!
//! Notification configs select findings with a filter expression such as
//! `resource.project_display_name="my-project"`. Values are user
//! controlled (they come from the new project's id), so they are quoted
//! and escaped here instead of being spliced into the string.

use crate::error::ProvisionError;
use std::fmt::{self, Write as _};

/// `field="value"` over a finding field, exact and case-sensitive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    field: &'static str,
    value: String,
}

impl Filter {
    /// Exact match of `field` against a string literal
    ///
    /// Control characters cannot be expressed in a filter literal and are
    /// rejected.
    pub fn matching(field: &'static str, value: &str) -> Result<Self, ProvisionError> {
        if value.chars().any(char::is_control) {
            return Err(ProvisionError::InvalidFilterValue(value.to_string()));
        }
        Ok(Self {
            field,
            value: value.to_string(),
        })
    }

    /// Matches findings on the project with the given display name
    pub fn project_display_name(name: &str) -> Result<Self, ProvisionError> {
        Self::matching("resource.project_display_name", name)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}=", self.field)?;
        write_quoted(f, &self.value)
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    f.write_char('"')?;
    for c in value.chars() {
        if c == '"' || c == '\\' {
            f.write_char('\\')?;
        }
        f.write_char(c)?;
    }
    f.write_char('"')
}
