//! Token checks
//!
//! The wire format has no escaping, so a token holding a space or a line
//! break silently splits into several tokens or several requests.

use crate::error::{RbeError, Result};
use serde::{Deserialize, Serialize};

/// How tokens are checked before they are sent
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenPolicy {
    /// Reject tokens containing ' ', '\n' or '\r'
    Strict,
    /// Send tokens verbatim
    #[default]
    Unchecked,
}

impl TokenPolicy {
    /// Check every token, reporting the first offender
    pub fn check<S: AsRef<str>>(self, tokens: &[S]) -> Result<()> {
        if self == Self::Unchecked {
            return Ok(());
        }
        match tokens.iter().position(|t| breaks_framing(t.as_ref())) {
            Some(index) => Err(RbeError::InvalidToken {
                index,
                token: tokens[index].as_ref().to_string(),
            }),
            None => Ok(()),
        }
    }
}

fn breaks_framing(token: &str) -> bool {
    token.contains([' ', '\n', '\r'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(&["(", "4", "+", "2", ")"])]
    #[case(&[])]
    #[case(&[""])]
    #[case(&["\t"])]
    fn test_strict_accepts(#[case] tokens: &[&str]) {
        assert!(TokenPolicy::Strict.check(tokens).is_ok());
    }

    #[rstest]
    #[case(&["a", "b c"], 1)]
    #[case(&["x\n"], 0)]
    #[case(&["ok", "ok", "\r"], 2)]
    fn test_strict_rejects(#[case] tokens: &[&str], #[case] expected: usize) {
        match TokenPolicy::Strict.check(tokens) {
            Err(RbeError::InvalidToken { index, token }) => {
                assert_eq!(index, expected);
                assert_eq!(token, tokens[expected]);
            }
            other => panic!("expected InvalidToken, got {other:?}"),
        }
    }

    #[test]
    fn test_default_is_unchecked() {
        assert_eq!(TokenPolicy::default(), TokenPolicy::Unchecked);
    }

    #[test]
    fn test_unchecked_passes_anything() {
        assert!(TokenPolicy::Unchecked.check(&["a b", "c\nd"]).is_ok());
    }
}
