use subtle::ConstantTimeEq;

/// Compare a presented session token against a stored one without leaking,
/// through timing, how many leading bytes matched.
///
/// Length is not secret: every token is a hyphenated UUID.
pub fn constant_time_compare(stored: &str, presented: &str) -> bool {
    if stored.len() != presented.len() {
        return false;
    }
    stored.as_bytes().ct_eq(presented.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_tokens() {
        let token = "2f1c7a3e-9b4d-4e8a-a1f0-6c2d9e8b7a51";
        assert!(constant_time_compare(token, token));
    }

    #[test]
    fn test_tokens_differing_in_last_byte() {
        assert!(!constant_time_compare(
            "2f1c7a3e-9b4d-4e8a-a1f0-6c2d9e8b7a51",
            "2f1c7a3e-9b4d-4e8a-a1f0-6c2d9e8b7a52"
        ));
    }

    #[test]
    fn test_length_mismatch() {
        assert!(!constant_time_compare("2f1c7a3e", "2f1c7a3e-9b4d"));
        assert!(!constant_time_compare("", "2f1c7a3e"));
    }
}
