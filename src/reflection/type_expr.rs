// Copyright 2025 Cowboy AI, LLC.

//! Type-expression parsing: `T`, `?T`, `A|B|null`, `A&B`

use crate::errors::{DomainError, DomainResult};

/// Names that never refer to a registered type
pub const PRIMITIVES: &[&str] = &[
    "mixed", "null", "int", "integer", "float", "number", "string", "bool", "boolean", "true",
    "false", "array", "list", "map", "object", "iterable",
];

/// Whether `name` is a primitive type name
pub fn is_primitive(name: &str) -> bool {
    PRIMITIVES.contains(&name.to_ascii_lowercase().as_str())
}

/// Structure of a type expression before classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedType {
    /// Member names with `null` removed
    pub names: Vec<String>,
    /// Null accepted
    pub nullable: bool,
    /// More than one non-null member joined by `|`
    pub is_union: bool,
    /// Members joined by `&`
    pub is_intersection: bool,
}

fn invalid(expr: &str, reason: &str) -> DomainError {
    DomainError::configuration(format!("Invalid type expression `{expr}`: {reason}"))
}

/// Parse an optional type expression; `None` or blank means `mixed`
pub fn parse(expr: Option<&str>) -> DomainResult<ParsedType> {
    let raw = expr.map(str::trim).unwrap_or("");
    if raw.is_empty() {
        return Ok(ParsedType {
            names: vec!["mixed".to_string()],
            nullable: true,
            is_union: false,
            is_intersection: false,
        });
    }
    if raw.contains('(') || raw.contains(')') {
        return Err(invalid(raw, "grouped types are not supported"));
    }
    if raw.contains('|') && raw.contains('&') {
        return Err(invalid(raw, "mixing `|` and `&` requires grouping"));
    }

    if let Some(inner) = raw.strip_prefix('?') {
        let inner = inner.trim();
        if inner.is_empty() || inner.contains('|') || inner.contains('&') || inner.contains('?') {
            return Err(invalid(raw, "`?` applies to a single type"));
        }
        return Ok(ParsedType {
            names: vec![inner.to_string()],
            nullable: true,
            is_union: false,
            is_intersection: false,
        });
    }

    if raw.contains('&') {
        let names = split_members(raw, '&')?;
        if names.iter().any(|n| n.eq_ignore_ascii_case("null")) {
            return Err(invalid(raw, "intersections cannot contain null"));
        }
        return Ok(ParsedType {
            names,
            nullable: false,
            is_union: false,
            is_intersection: true,
        });
    }

    let members = split_members(raw, '|')?;
    let nullable_member = members.iter().any(|n| n.eq_ignore_ascii_case("null"));
    let mut names: Vec<String> = members
        .into_iter()
        .filter(|n| !n.eq_ignore_ascii_case("null"))
        .collect();
    if names.is_empty() {
        names.push("null".to_string());
    }
    let nullable = nullable_member || names.iter().any(|n| n.eq_ignore_ascii_case("mixed"));
    let is_union = names.len() > 1;

    Ok(ParsedType {
        names,
        nullable,
        is_union,
        is_intersection: false,
    })
}

fn split_members(raw: &str, separator: char) -> DomainResult<Vec<String>> {
    let mut names: Vec<String> = Vec::new();
    for member in raw.split(separator) {
        let member = member.trim();
        if member.is_empty() || member.contains('?') {
            return Err(invalid(raw, "empty or nullable member"));
        }
        if names.iter().any(|n| n == member) {
            return Err(invalid(raw, "duplicate member"));
        }
        names.push(member.to_string());
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(None, &["mixed"], true, false, false ; "missing type is mixed")]
    #[test_case(Some("int"), &["int"], false, false, false ; "single")]
    #[test_case(Some("?Status"), &["Status"], true, false, false ; "nullable shorthand")]
    #[test_case(Some("Status|null"), &["Status"], true, false, false ; "null member skipped")]
    #[test_case(Some("int | string | null"), &["int", "string"], true, true, false ; "union with null")]
    #[test_case(Some("Countable&Traversable"), &["Countable", "Traversable"], false, false, true ; "intersection")]
    fn test_parse(expr: Option<&str>, names: &[&str], nullable: bool, union: bool, intersection: bool) {
        let parsed = parse(expr).unwrap();
        assert_eq!(parsed.names, names);
        assert_eq!(parsed.nullable, nullable);
        assert_eq!(parsed.is_union, union);
        assert_eq!(parsed.is_intersection, intersection);
    }

    #[test_case("(A&B)|null" ; "grouped")]
    #[test_case("A|B&C" ; "mixed separators")]
    #[test_case("?A|B" ; "nullable union shorthand")]
    #[test_case("A||B" ; "empty member")]
    #[test_case("A&null" ; "null intersection")]
    fn test_rejected(expr: &str) {
        assert!(parse(Some(expr)).unwrap_err().is_configuration_error());
    }

    #[test]
    fn test_primitive_names() {
        assert!(is_primitive("string"));
        assert!(is_primitive("Bool"));
        assert!(!is_primitive("Status"));
    }
}
