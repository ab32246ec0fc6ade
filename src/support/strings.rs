// Copyright 2025 Cowboy AI, LLC.

//! Identifier case helpers

/// `firstName` → `first_name`. Every uppercase letter after the first
/// character starts a new word; whitespace is dropped.
pub fn snake_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 4);
    for (i, ch) in value.chars().filter(|c| !c.is_whitespace()).enumerate() {
        if ch.is_uppercase() {
            if i > 0 && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// `first_name` → `firstName`
pub fn camel_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut upper_next = false;
    for ch in value.chars() {
        if ch == '_' || ch == '-' || ch.is_whitespace() {
            upper_next = !out.is_empty();
            continue;
        }
        if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("firstName", "first_name")]
    #[test_case("id", "id")]
    #[test_case("userID", "user_i_d")]
    #[test_case("Already", "already")]
    #[test_case("already_snake", "already_snake")]
    fn test_snake_case(input: &str, expected: &str) {
        assert_eq!(snake_case(input), expected);
    }

    #[test_case("first_name", "firstName")]
    #[test_case("_leading", "leading")]
    #[test_case("kebab-case-name", "kebabCaseName")]
    fn test_camel_case(input: &str, expected: &str) {
        assert_eq!(camel_case(input), expected);
    }
}
