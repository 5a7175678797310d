//! Resolution errors.
//!
//! Every error is advisory: it is logged on the
//! [`ResolutionContext`](super::ResolutionContext) and the query carries on
//! with whatever results it has.

use smol_str::SmolStr;
use thiserror::Error;

use crate::syntax::NodeId;

use super::symbols::Symbol;
use super::values::TemplateArgument;

/// Stable codes for consumers that surface resolution errors.
pub mod codes {
    /// Name or expression not found.
    pub const NOTHING_FOUND: &str = "E0001";
    /// Several equally valid candidates.
    pub const AMBIGUITY: &str = "E0002";
    /// A template argument does not fit its parameter.
    pub const TEMPLATE_PARAMETER_DEDUCTION: &str = "E0020";
    /// Two overloads are equally specialized.
    pub const AMBIGUOUS_SPECIALIZATION: &str = "E0021";
}

fn suffix(detail: &Option<String>) -> String {
    detail.as_ref().map(|d| format!(": {d}")).unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolutionError {
    #[error("`{subject}` could not be resolved{}", suffix(.detail))]
    NothingFound {
        subject: SmolStr,
        origin: Option<NodeId>,
        detail: Option<String>,
    },

    #[error("`{subject}` is ambiguous between {} candidates", .candidates.len())]
    Ambiguity {
        subject: SmolStr,
        origin: Option<NodeId>,
        candidates: Vec<Symbol>,
    },

    #[error("cannot deduce template parameter `{parameter_name}`: {message}")]
    TemplateParameterDeduction {
        parameter: NodeId,
        parameter_name: SmolStr,
        argument: Option<TemplateArgument>,
        message: String,
    },

    #[error("could not distinguish a most specialized overload of `{subject}` among {} equally specialized overloads", .overloads.len())]
    AmbiguousSpecialization {
        subject: SmolStr,
        overloads: Vec<Symbol>,
    },
}

impl ResolutionError {
    pub fn nothing_found(subject: impl Into<SmolStr>, origin: Option<NodeId>) -> Self {
        Self::NothingFound {
            subject: subject.into(),
            origin,
            detail: None,
        }
    }

    pub fn nothing_found_because(
        subject: impl Into<SmolStr>,
        origin: Option<NodeId>,
        detail: impl Into<String>,
    ) -> Self {
        Self::NothingFound {
            subject: subject.into(),
            origin,
            detail: Some(detail.into()),
        }
    }

    pub fn ambiguity(subject: impl Into<SmolStr>, origin: Option<NodeId>, candidates: Vec<Symbol>) -> Self {
        Self::Ambiguity {
            subject: subject.into(),
            origin,
            candidates,
        }
    }

    pub fn deduction(
        parameter: NodeId,
        parameter_name: impl Into<SmolStr>,
        argument: Option<TemplateArgument>,
        message: impl Into<String>,
    ) -> Self {
        Self::TemplateParameterDeduction {
            parameter,
            parameter_name: parameter_name.into(),
            argument,
            message: message.into(),
        }
    }

    pub fn ambiguous_specialization(subject: impl Into<SmolStr>, overloads: Vec<Symbol>) -> Self {
        Self::AmbiguousSpecialization {
            subject: subject.into(),
            overloads,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::NothingFound { .. } => codes::NOTHING_FOUND,
            Self::Ambiguity { .. } => codes::AMBIGUITY,
            Self::TemplateParameterDeduction { .. } => codes::TEMPLATE_PARAMETER_DEDUCTION,
            Self::AmbiguousSpecialization { .. } => codes::AMBIGUOUS_SPECIALIZATION,
        }
    }
}
