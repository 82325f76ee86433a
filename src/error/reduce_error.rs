use crate::error::HostError;

#[derive(Debug, Clone, PartialEq)]
/// Represents all errors that can occur while reducing an expression tree.
///
/// Every variant carries the byte offset and length of the narrowest node
/// responsible, located in the original source the tree was parsed from.
pub enum ReduceError {
    /// A name was promised for a later pass but is still missing in a final
    /// reduction.
    UnboundName {
        /// The missing name.
        name:   String,
        /// Offset of the offending node.
        offset: u32,
        /// Length of the offending node.
        length: u32,
    },
    /// A name is absent from the environment in a final reduction.
    UnknownName {
        /// The unresolved name.
        name:   String,
        /// Offset of the offending node.
        offset: u32,
        /// Length of the offending node.
        length: u32,
    },
    /// A generator bound did not reduce to a value in a final reduction.
    GeneratorArgUnresolved {
        /// Offset of the generator node.
        offset: u32,
        /// Length of the generator node.
        length: u32,
    },
    /// Generator bounds mixed numeric kinds or were not numeric at all.
    GeneratorTypeMismatch {
        /// Details about the offending bounds.
        details: String,
        /// Offset of the generator node.
        offset:  u32,
        /// Length of the generator node.
        length:  u32,
    },
    /// A generator was given a step of zero.
    GeneratorZeroStep {
        /// Offset of the generator node.
        offset: u32,
        /// Length of the generator node.
        length: u32,
    },
    /// The left side of a conjunction was not a boolean or null.
    AndLhsNotBool {
        /// Offset of the left operand.
        offset: u32,
        /// Length of the left operand.
        length: u32,
    },
    /// The right side of a conjunction was not a boolean or null.
    AndRhsNotBool {
        /// Offset of the right operand.
        offset: u32,
        /// Length of the right operand.
        length: u32,
    },
    /// The left side of a disjunction was not a boolean or null.
    OrLhsNotBool {
        /// Offset of the left operand.
        offset: u32,
        /// Length of the left operand.
        length: u32,
    },
    /// The right side of a disjunction was not a boolean or null.
    OrRhsNotBool {
        /// Offset of the right operand.
        offset: u32,
        /// Length of the right operand.
        length: u32,
    },
    /// A conditional's condition reduced to a value that is not a boolean.
    IfConditionNotBool {
        /// Offset of the condition.
        offset: u32,
        /// Length of the condition.
        length: u32,
    },
    /// Nested-collection access on a static name is not supported.
    StaticDepthUnsupported {
        /// The static name.
        name:   String,
        /// Offset of the offending node.
        offset: u32,
        /// Length of the offending node.
        length: u32,
    },
    /// Descending into a collection resolved properties on some elements and
    /// methods on others.
    MixedMemberKinds {
        /// The member name.
        name:   String,
        /// Offset of the offending node.
        offset: u32,
        /// Length of the offending node.
        length: u32,
    },
    /// A static member resolved in more than one configured namespace.
    AmbiguousStatic {
        /// The type name.
        type_name: String,
        /// The member name.
        member:    String,
        /// Offset of the offending node.
        offset:    u32,
        /// Length of the offending node.
        length:    u32,
    },
    /// An instance has no member with the requested name.
    MemberNotFound {
        /// The type name of the target value.
        type_name: String,
        /// The requested member name.
        member:    String,
        /// Offset of the member access.
        offset:    u32,
        /// Length of the member access.
        length:    u32,
    },
    /// No constructor for the named type exists in the configured
    /// namespaces.
    ConstructorNotFound {
        /// The type name.
        type_name: String,
        /// Offset of the offending node.
        offset:    u32,
        /// Length of the offending node.
        length:    u32,
    },
    /// A host call failed; wraps the host-side error with the span of the
    /// operand that triggered the call.
    HostCall {
        /// The underlying host failure.
        error:  HostError,
        /// Offset of the triggering operand.
        offset: u32,
        /// Length of the triggering operand.
        length: u32,
    },
    /// Reduction finished but the residual is not a value.
    UnexpectedResult {
        /// A rendering of the residual node(s).
        found:  String,
        /// Offset of the residual.
        offset: u32,
        /// Length of the residual.
        length: u32,
    },
    /// A final reduction hit the walker's terminal catch-all case.
    UnexpectedCase {
        /// A diagnostic dump of the residual context.
        trace:  String,
        /// Offset of the residual.
        offset: u32,
        /// Length of the residual.
        length: u32,
    },
}

impl ReduceError {
    /// Gets the source offset from `self`.
    ///
    /// ## Example
    /// ```
    /// use residua::error::ReduceError;
    ///
    /// let error = ReduceError::UnknownName { name:   "x".to_string(),
    ///                                        offset: 7,
    ///                                        length: 1, };
    ///
    /// assert_eq!(error.offset(), 7);
    /// assert_eq!(error.length(), 1);
    /// ```
    #[must_use]
    pub const fn offset(&self) -> u32 {
        match self {
            Self::UnboundName { offset, .. }
            | Self::UnknownName { offset, .. }
            | Self::GeneratorArgUnresolved { offset, .. }
            | Self::GeneratorTypeMismatch { offset, .. }
            | Self::GeneratorZeroStep { offset, .. }
            | Self::AndLhsNotBool { offset, .. }
            | Self::AndRhsNotBool { offset, .. }
            | Self::OrLhsNotBool { offset, .. }
            | Self::OrRhsNotBool { offset, .. }
            | Self::IfConditionNotBool { offset, .. }
            | Self::StaticDepthUnsupported { offset, .. }
            | Self::MixedMemberKinds { offset, .. }
            | Self::AmbiguousStatic { offset, .. }
            | Self::MemberNotFound { offset, .. }
            | Self::ConstructorNotFound { offset, .. }
            | Self::HostCall { offset, .. }
            | Self::UnexpectedResult { offset, .. }
            | Self::UnexpectedCase { offset, .. } => *offset,
        }
    }

    /// Gets the source length from `self`.
    #[must_use]
    pub const fn length(&self) -> u32 {
        match self {
            Self::UnboundName { length, .. }
            | Self::UnknownName { length, .. }
            | Self::GeneratorArgUnresolved { length, .. }
            | Self::GeneratorTypeMismatch { length, .. }
            | Self::GeneratorZeroStep { length, .. }
            | Self::AndLhsNotBool { length, .. }
            | Self::AndRhsNotBool { length, .. }
            | Self::OrLhsNotBool { length, .. }
            | Self::OrRhsNotBool { length, .. }
            | Self::IfConditionNotBool { length, .. }
            | Self::StaticDepthUnsupported { length, .. }
            | Self::MixedMemberKinds { length, .. }
            | Self::AmbiguousStatic { length, .. }
            | Self::MemberNotFound { length, .. }
            | Self::ConstructorNotFound { length, .. }
            | Self::HostCall { length, .. }
            | Self::UnexpectedResult { length, .. }
            | Self::UnexpectedCase { length, .. } => *length,
        }
    }
}

impl std::fmt::Display for ReduceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnboundName { name, offset, .. } => write!(f,
                                                             "Error at offset {offset}: Name '{name}' was promised but never supplied."),
            Self::UnknownName { name, offset, .. } => {
                write!(f, "Error at offset {offset}: Unknown name '{name}'.")
            },
            Self::GeneratorArgUnresolved { offset, .. } => write!(f,
                                                                  "Error at offset {offset}: Generator bounds did not reduce to values."),
            Self::GeneratorTypeMismatch { details, offset, .. } => {
                write!(f, "Error at offset {offset}: Bad generator bounds: {details}.")
            },
            Self::GeneratorZeroStep { offset, .. } => {
                write!(f, "Error at offset {offset}: Generator step must not be zero.")
            },
            Self::AndLhsNotBool { offset, .. } => write!(f,
                                                         "Error at offset {offset}: Left side of 'and' is not a boolean."),
            Self::AndRhsNotBool { offset, .. } => write!(f,
                                                         "Error at offset {offset}: Right side of 'and' is not a boolean."),
            Self::OrLhsNotBool { offset, .. } => write!(f,
                                                        "Error at offset {offset}: Left side of 'or' is not a boolean."),
            Self::OrRhsNotBool { offset, .. } => write!(f,
                                                        "Error at offset {offset}: Right side of 'or' is not a boolean."),
            Self::IfConditionNotBool { offset, .. } => write!(f,
                                                              "Error at offset {offset}: Condition is not a boolean."),
            Self::StaticDepthUnsupported { name, offset, .. } => write!(f,
                                                                        "Error at offset {offset}: Nested-collection access on static name '{name}' is not supported."),
            Self::MixedMemberKinds { name, offset, .. } => write!(f,
                                                                  "Error at offset {offset}: Member '{name}' resolved to properties on some elements and methods on others."),
            Self::AmbiguousStatic { type_name,
                                    member,
                                    offset,
                                    .. } => write!(f,
                                                   "Error at offset {offset}: '{type_name}.{member}' resolved in more than one namespace."),
            Self::MemberNotFound { type_name,
                                   member,
                                   offset,
                                   .. } => write!(f,
                                                  "Error at offset {offset}: Type '{type_name}' has no member '{member}'."),
            Self::ConstructorNotFound { type_name, offset, .. } => write!(f,
                                                                          "Error at offset {offset}: No constructor found for type '{type_name}'."),
            Self::HostCall { error, offset, .. } => {
                write!(f, "Error at offset {offset}: Host call failed: {error}")
            },
            Self::UnexpectedResult { found, offset, .. } => write!(f,
                                                                   "Error at offset {offset}: Reduction did not produce a value; residual: {found}."),
            Self::UnexpectedCase { trace, offset, .. } => write!(f,
                                                                 "Error at offset {offset}: Reduction hit an unexpected case; residual: {trace}."),
        }
    }
}

impl std::error::Error for ReduceError {}
