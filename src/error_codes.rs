use std::fmt;

use anyhow::Error;
use serde::Serialize;
use serde_json::Value;

use crate::errors::GenError;

pub const UNKNOWN_COMPONENT: &str = "UNKNOWN_COMPONENT";
pub const COMPONENT_CYCLE: &str = "COMPONENT_CYCLE";
pub const UNKNOWN_CHAPTER: &str = "UNKNOWN_CHAPTER";
pub const EMPTY_COMPOSITION: &str = "EMPTY_COMPOSITION";

/// A command-line usage error: bad component names, unknown chapters and the like.
#[derive(Debug, Clone)]
pub struct CliError {
    pub code: &'static str,
    pub message: String,
    pub details: Option<Value>,
}

impl CliError {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for CliError {}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope {
    pub ok: bool,
    pub error: ErrorEnvelopeBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelopeBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

pub fn find_cli_error(error: &Error) -> Option<&CliError> {
    error
        .chain()
        .find_map(|cause| cause.downcast_ref::<CliError>())
}

pub fn find_gen_error(error: &Error) -> Option<&GenError> {
    error
        .chain()
        .find_map(|cause| cause.downcast_ref::<GenError>())
}

/// Builds the `--json-errors` envelope for any error reaching the top of the CLI.
pub fn envelope_for(error: &Error) -> ErrorEnvelope {
    let (code, details) = if let Some(cli) = find_cli_error(error) {
        (cli.code.to_owned(), cli.details.clone())
    } else if let Some(gen) = find_gen_error(error) {
        (gen.code().to_owned(), None)
    } else {
        ("ERROR".to_owned(), None)
    };

    ErrorEnvelope {
        ok: false,
        error: ErrorEnvelopeBody {
            code,
            message: format!("{error:#}"),
            details,
        },
    }
}
