use std::fmt;

///
/// ErrorTree
///
/// Accumulates validation messages so one pass reports every problem instead
/// of stopping at the first.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ErrorTree {
    messages: Vec<String>,
}

impl ErrorTree {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            messages: Vec::new(),
        }
    }

    pub fn add(&mut self, message: impl fmt::Display) {
        self.messages.push(message.to_string());
    }

    /// Append every message from another tree, prefixed by `route`.
    pub fn merge(&mut self, route: &str, other: Self) {
        for message in other.messages {
            self.messages.push(format!("{route}: {message}"));
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    #[must_use]
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ErrorTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, message) in self.messages.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "- {message}")?;
        }

        Ok(())
    }
}

/// Push a formatted message onto an [`ErrorTree`].
#[macro_export]
macro_rules! err {
    ($errs:expr, $($arg:tt)*) => {
        $errs.add(format!($($arg)*))
    };
}
