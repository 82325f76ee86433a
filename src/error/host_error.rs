#[derive(Debug, Clone, PartialEq, Eq)]
/// Represents all errors a host operation can raise on its own.
pub enum HostError {
    /// Attempted division by zero.
    DivisionByZero,
    /// Arithmetic operation overflowed, or a value was too large to convert
    /// losslessly.
    Overflow,
    /// A value had an unexpected or incompatible type.
    TypeMismatch {
        /// Details about the type mismatch.
        details: String,
    },
    /// Tried to access an element outside the allowed bounds.
    IndexOutOfBounds {
        /// The largest valid index.
        max:   usize,
        /// The index that was actually requested.
        found: i64,
    },
    /// No overload of a method accepts the supplied argument count.
    NoMatchingOverload {
        /// The method name.
        name:     String,
        /// The number of arguments supplied.
        supplied: usize,
    },
    /// The value does not support index access.
    NotIndexable {
        /// The type name of the value.
        type_name: String,
    },
    /// The value has no member with the requested name.
    UnknownMember {
        /// The type name of the value.
        type_name: String,
        /// The requested member name.
        member:    String,
    },
    /// A constructor was found but rejected its arguments.
    ConstructorFailed {
        /// The type being constructed.
        type_name: String,
        /// Details about the failure.
        details:   String,
    },
    /// An argument was invalid or out of range.
    InvalidArgument {
        /// Details about why the argument is invalid.
        details: String,
    },
}

impl std::fmt::Display for HostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DivisionByZero => write!(f, "Division by zero."),
            Self::Overflow => {
                write!(f, "Integer overflow while trying to compute result.")
            },
            Self::TypeMismatch { details } => write!(f, "Type error: {details}."),
            Self::IndexOutOfBounds { max, found } => write!(f,
                                                            "Index out of bounds. Maximum is {max}, but found {found} instead."),
            Self::NoMatchingOverload { name, supplied } => write!(f,
                                                                  "No overload of '{name}' accepts {supplied} argument(s)."),
            Self::NotIndexable { type_name } => {
                write!(f, "Values of type '{type_name}' cannot be indexed.")
            },
            Self::UnknownMember { type_name, member } => {
                write!(f, "Type '{type_name}' has no member '{member}'.")
            },
            Self::ConstructorFailed { type_name, details } => {
                write!(f, "Cannot construct '{type_name}': {details}.")
            },
            Self::InvalidArgument { details } => {
                write!(f, "Invalid argument: {details}.")
            },
        }
    }
}

impl std::error::Error for HostError {}
