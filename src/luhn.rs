//! Luhn (mod 10) checksum validation.

/// Errors returned by [`is_valid`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LuhnError {
    #[error("Invalid input: card number is empty")]
    Empty,

    #[error("Invalid input: '{character}' at position {position} is not a decimal digit")]
    NonDigit { character: char, position: usize },
}

/// Checks a digit string with the Luhn algorithm.
///
/// Every second digit counted from the right is doubled, with 9
/// subtracted when the result exceeds 9. The number is valid when the
/// total is a multiple of 10.
pub fn is_valid(digits: &str) -> Result<bool, LuhnError> {
    if digits.is_empty() {
        return Err(LuhnError::Empty);
    }

    if let Some((position, character)) = digits
        .chars()
        .enumerate()
        .find(|(_, c)| !c.is_ascii_digit())
    {
        return Err(LuhnError::NonDigit {
            character,
            position,
        });
    }

    let mut sum = 0u32;
    for (i, character) in digits.bytes().rev().enumerate() {
        let mut digit = u32::from(character - b'0');
        if i % 2 == 1 {
            digit *= 2;
            if digit > 9 {
                digit -= 9;
            }
        }
        sum = (sum + digit) % 10;
    }

    Ok(sum == 0)
}
