//! Typed views of string arguments for command bodies.
//!
//! Every helper takes the parameter name and reports
//! `Argument "<name>" is not the correct type` when the value does not parse.

use super::command::CommandError;

fn incorrect(parameter: &str) -> CommandError {
    CommandError::IncorrectArgumentType {
        thing: "Argument",
        name: parameter.to_string(),
    }
}

pub fn to_bool(parameter: &str, value: &str) -> Result<bool, CommandError> {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if trimmed.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(incorrect(parameter))
    }
}

pub fn to_int(parameter: &str, value: &str) -> Result<i64, CommandError> {
    value.trim().parse().map_err(|_| incorrect(parameter))
}

/// Accepts a trailing `f` and a comma as the decimal separator.
pub fn to_float(parameter: &str, value: &str) -> Result<f64, CommandError> {
    let trimmed = value.trim();
    let trimmed = trimmed
        .strip_suffix(['f', 'F'])
        .unwrap_or(trimmed)
        .replace(',', ".");
    match trimmed.parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => Ok(parsed),
        _ => Err(incorrect(parameter)),
    }
}

pub fn to_char(parameter: &str, value: &str) -> Result<char, CommandError> {
    let mut chars = value.trim().chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Ok(ch),
        _ => Err(incorrect(parameter)),
    }
}

pub fn to_vec2(parameter: &str, value: &str) -> Result<[f64; 2], CommandError> {
    match components(parameter, value)?.as_slice() {
        [x, y] => Ok([*x, *y]),
        _ => Err(incorrect(parameter)),
    }
}

pub fn to_vec3(parameter: &str, value: &str) -> Result<[f64; 3], CommandError> {
    match components(parameter, value)?.as_slice() {
        [x, y, z] => Ok([*x, *y, *z]),
        _ => Err(incorrect(parameter)),
    }
}

fn components(parameter: &str, value: &str) -> Result<Vec<f64>, CommandError> {
    let inner: String = value.chars().filter(|ch| *ch != '(' && *ch != ')').collect();
    inner
        .split(',')
        .map(|part| to_float(parameter, part))
        .collect()
}
