//! Deterministic stack naming.
//!
//! Names have the shape `namespace-type[-part...]`. The type segment comes from
//! [`StackType::slug`], and no slug extends another, so stacks of different
//! types never share a name inside one namespace.

use once_cell::sync::Lazy;
use regex::Regex;

use super::StackType;
use crate::errors::NamingError;

/// Longest name the stack provider accepts.
pub const MAX_STACK_NAME_LEN: usize = 128;

static COMPONENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9-]+$").expect("Valid regex pattern"));

fn check_component(label: &str, value: &str) -> Result<(), NamingError> {
    if value.is_empty() {
        return Err(NamingError::EmptyComponent {
            component: label.to_string(),
        });
    }
    if !COMPONENT_RE.is_match(value) {
        return Err(NamingError::InvalidCharacters {
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Builds the name of a stack.
///
/// # Errors
///
/// Returns a [`NamingError`] if the namespace or any part is empty, contains
/// characters outside `[A-Za-z0-9-]`, if the namespace does not start with a
/// letter, or if the result is longer than [`MAX_STACK_NAME_LEN`].
pub fn create_stack_name(
    namespace: &str,
    stack_type: StackType,
    parts: &[&str],
) -> Result<String, NamingError> {
    check_component("namespace", namespace)?;
    if !namespace.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return Err(NamingError::InvalidCharacters {
            value: namespace.to_string(),
        });
    }

    let mut name = format!("{namespace}-{}", stack_type.slug());
    for part in parts {
        check_component("part", part)?;
        name.push('-');
        name.push_str(part);
    }

    if name.len() > MAX_STACK_NAME_LEN {
        return Err(NamingError::TooLong {
            name,
            max: MAX_STACK_NAME_LEN,
        });
    }
    Ok(name)
}
