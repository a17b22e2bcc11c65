// src/context.rs
//! Context extension traits + macros for error handling.
//!
//! - `.context()` on any `Result` whose error converts into our `Error`, and
//!   on `Option`.
//! - `bail!` / `ensure!` for early returns.

use crate::error::{Error, Result};

/// Extension trait giving `.context()` on any `Result`.
pub trait Context<T, E> {
    /// Add static or owned context (eager, use only when cheap).
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Into<String>;
}

impl<T, E> Context<T, E> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    #[inline(always)]
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Into<String>,
    {
        match self {
            Ok(value) => Ok(value),
            Err(err) => Err(err.into().context(context)),
        }
    }
}

/// Extension trait for `Option<T>` → `Result<T, Error>`.
pub trait OptionContext<T> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Into<String>;

    /// Return a specific error instead of a custom message.
    fn or_fail(self, err: Error) -> Result<T>;
}

impl<T> OptionContext<T> for Option<T> {
    #[inline(always)]
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Into<String>,
    {
        self.ok_or_else(|| Error::custom(context))
    }

    #[inline(always)]
    fn or_fail(self, err: Error) -> Result<T> {
        self.ok_or(err)
    }
}

// ====================== CONVENIENCE MACROS ======================

/// Early return with an error: `bail!("msg")` or `bail!(err)`.
#[macro_export]
macro_rules! bail {
    ($msg:literal $(,)?) => {
        return Err($crate::error::Error::msg($msg))
    };
    ($err:expr $(,)?) => {
        return Err(Into::<$crate::error::Error>::into($err))
    };
}

/// Ensure a condition is true, else `bail!`.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr $(,)?) => {
        if !($cond) {
            $crate::bail!($err);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checked(value: u32) -> Result<u32> {
        crate::ensure!(value < 4, Error::ConflictingAlphaWrites);
        Ok(value)
    }

    #[test]
    fn ensure_returns_the_given_error() {
        assert_eq!(checked(3).unwrap(), 3);
        assert!(matches!(checked(9), Err(Error::ConflictingAlphaWrites)));
    }

    #[test]
    fn result_context_wraps_converted_error() {
        let parsed: std::result::Result<u8, serde_json::Error> = serde_json::from_str("{");
        let err = parsed.context("reading config").unwrap_err();
        assert!(err.to_string().starts_with("reading config: "));
        assert!(!err.is_fatal());
    }

    #[test]
    fn option_context_builds_custom_error() {
        let missing: Option<u8> = None;
        let err = missing.context("slot empty").unwrap_err();
        assert_eq!(err.to_string(), "slot empty");
        assert!(matches!(
            None::<u8>.or_fail(Error::MissingFlashlightState),
            Err(Error::MissingFlashlightState)
        ));
    }
}
