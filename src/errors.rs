use thiserror::Error;

pub type GenResult<T> = Result<T, GenError>;

/// Failures raised while tokenizing, resolving config or generating a component.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenError {
    #[error("line {line}: {message}")]
    LineParse { line: usize, message: String },

    #[error("{0}")]
    MissingConfig(String),

    #[error("could not resolve '{property}' property for {owner}")]
    MissingInfo { property: String, owner: String },

    #[error("'{property}' is not a property of {kind}")]
    NonExistentProperty {
        property: String,
        kind: &'static str,
    },

    #[error("invalid value for {owner}: {message}")]
    InvalidPropertyValue { owner: String, message: String },

    #[error("alias chain starting at '{0}' loops back on itself")]
    CyclicAlias(String),

    #[error("named resource '{0}' loops back on itself")]
    CyclicResource(String),

    #[error("{0}")]
    DialogueGen(String),
}

impl GenError {
    pub fn line_parse(line: usize, message: impl Into<String>) -> Self {
        Self::LineParse {
            line,
            message: message.into(),
        }
    }

    pub fn missing_info(property: &str, owner: Option<&str>) -> Self {
        Self::MissingInfo {
            property: property.to_owned(),
            owner: owner.unwrap_or("common").to_owned(),
        }
    }

    pub fn dialogue(message: impl Into<String>) -> Self {
        Self::DialogueGen(message.into())
    }

    /// Short machine-readable label, used in logs and the JSON error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            Self::LineParse { .. } => "LINE_PARSE",
            Self::MissingConfig(_) => "MISSING_CONFIG",
            Self::MissingInfo { .. } => "MISSING_INFO",
            Self::NonExistentProperty { .. } => "NONEXISTENT_PROPERTY",
            Self::InvalidPropertyValue { .. } => "INVALID_PROPERTY_VALUE",
            Self::CyclicAlias(_) => "CYCLIC_ALIAS",
            Self::CyclicResource(_) => "CYCLIC_RESOURCE",
            Self::DialogueGen(_) => "GENERATION",
        }
    }
}
