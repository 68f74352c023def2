use crate::auth::{utils::OTP_LENGTH, AuthError};

/// Six single-digit fields and the index of the focused one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OtpInput {
    digits: [Option<char>; OTP_LENGTH],
    focus: usize,
}

impl OtpInput {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn focus(&self) -> usize {
        self.focus
    }

    #[must_use]
    pub fn digit(&self, index: usize) -> Option<char> {
        self.digits.get(index).copied().flatten()
    }

    /// Applies what was typed into field `index`. Non-digits are stripped;
    /// anything longer than one digit is ignored. An empty value clears the
    /// field. Returns whether the field changed.
    pub fn input(&mut self, index: usize, value: &str) -> bool {
        if index >= OTP_LENGTH {
            return false;
        }

        let digits: Vec<char> = value.chars().filter(char::is_ascii_digit).collect();
        let next = match digits.as_slice() {
            [] => None,
            [digit] => Some(*digit),
            _ => return false,
        };

        let changed = self.digits[index] != next;
        self.digits[index] = next;
        self.focus = if next.is_some() && index + 1 < OTP_LENGTH {
            index + 1
        } else {
            index
        };
        changed
    }

    /// Backspace in field `index`: clears a filled field, or moves focus back
    /// one when the field is already empty.
    pub fn backspace(&mut self, index: usize) {
        if index >= OTP_LENGTH {
            return;
        }
        if self.digits[index].is_some() {
            self.digits[index] = None;
            self.focus = index;
        } else if index > 0 {
            self.focus = index - 1;
        }
    }

    /// Digits entered so far, in field order, gaps skipped.
    #[must_use]
    pub fn code(&self) -> String {
        self.digits.iter().flatten().collect()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.digits.iter().all(Option::is_some)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// # Errors
    /// Returns a validation error unless all six fields hold a digit.
    pub fn validate(&self) -> Result<String, AuthError> {
        if self.is_complete() {
            Ok(self.code())
        } else {
            Err(AuthError::validation("Please enter all 6 digits"))
        }
    }
}
