use crate::kernel::{ConfigError, ExecInvariantViolation};
use core::{error, fmt};

/// Errors raised whilst operating on vectors.
///
/// Every variant except [`Error::OutOfMemory`] is reported back to the
/// caller of the failing operation, which leaves the target vectors as they
/// were before the call.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// An index token was malformed or out of range.
    BadIndex {
        /// The offending token.
        token: String,
    },
    /// A vector-vector operation was attempted on unequal non-scalar lengths.
    LengthMismatch {
        /// Length of the left operand.
        left: usize,
        /// Length of the right operand.
        right: usize,
    },
    /// A function argument was outside of its valid domain.
    MathDomain {
        /// Name of the function or operator.
        func: String,
        /// The argument that was rejected.
        value: f64,
    },
    /// Division or modulo by exactly zero.
    DivideByZero,
    /// Storage for the requested number of elements could not be allocated.
    OutOfMemory {
        /// Number of elements requested.
        requested: usize,
    },
    /// Malformed expression or value syntax.
    Parse {
        /// Explaining what could not be parsed.
        reason: String,
    },
    /// A referenced vector does not exist.
    NotFound {
        /// The name (or handle) that was looked up.
        name: String,
    },
    /// Argument passed into an operation was invalid.
    InvalidArg {
        /// The invalid arg
        arg: String,
        /// Explaining why arg is invalid.
        reason: String,
    },
    /// A kernel precondition was violated.
    Kernel(ExecInvariantViolation),
}

impl Error {
    pub(crate) fn bad_index(token: impl Into<String>) -> Self {
        Error::BadIndex {
            token: token.into(),
        }
    }

    pub(crate) fn parse(reason: impl Into<String>) -> Self {
        Error::Parse {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_arg(arg: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidArg {
            arg: arg.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn domain(func: impl Into<String>, value: f64) -> Self {
        Error::MathDomain {
            func: func.into(),
            value,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BadIndex { token } => write!(f, "bad index \"{token}\""),
            Error::LengthMismatch { left, right } => {
                write!(f, "vectors are different lengths ({left} vs {right})")
            }
            Error::MathDomain { func, value } => {
                write!(f, "domain error: argument {value} not in valid range for \"{func}\"")
            }
            Error::DivideByZero => write!(f, "divide by zero"),
            Error::OutOfMemory { requested } => {
                write!(f, "can't allocate storage for {requested} elements")
            }
            Error::Parse { reason } => write!(f, "syntax error in expression: {reason}"),
            Error::NotFound { name } => write!(f, "can't find vector \"{name}\""),
            Error::InvalidArg { arg, reason } => {
                write!(f, "Invalid argument `{arg}`: {reason}")
            }
            Error::Kernel(err) => write!(f, "{err}"),
        }
    }
}

impl error::Error for Error {}

impl From<ExecInvariantViolation> for Error {
    fn from(value: ExecInvariantViolation) -> Self {
        Error::Kernel(value)
    }
}

impl From<ConfigError> for Error {
    fn from(value: ConfigError) -> Self {
        Error::Kernel(ExecInvariantViolation::Config(value))
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_the_offending_token() {
        let err = Error::bad_index("12x");
        assert_eq!(err.to_string(), "bad index \"12x\"");

        let err = Error::domain("sqrt", -4.0);
        assert!(err.to_string().contains("-4"));
        assert!(err.to_string().contains("sqrt"));
    }

    #[test]
    fn config_errors_convert_through_kernel_variant() {
        let err: Error = ConfigError::EmptyInput { arg: "keys" }.into();
        assert_eq!(err.to_string(), "Input `keys` was empty.");
    }
}
