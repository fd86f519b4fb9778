// Compile errors with deterministic, line-addressed messages

use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationCode {
    /// Member type is neither a primitive nor a declared struct. Covers both
    /// the type-resolution failure and the missing struct reference failure,
    /// since one resolver answers both questions.
    UnresolvedType,
    /// Struct expansion re-enters a struct already on the path
    Cycle,
    /// Resolved primitive size does not fit in a size-table byte
    SizeOverflow,
    /// More leaves or children than a u16 can address
    IndexOverflow,
    /// Nested struct with no members has no leaves to map
    EmptyStruct,
    /// Struct nesting exceeds `MAX_NESTING_DEPTH`
    TooDeep,
}

impl ValidationCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationCode::UnresolvedType => "E_UNRESOLVED_TYPE",
            ValidationCode::Cycle => "E_CYCLE",
            ValidationCode::SizeOverflow => "E_SIZE_OVERFLOW",
            ValidationCode::IndexOverflow => "E_INDEX_OVERFLOW",
            ValidationCode::EmptyStruct => "E_EMPTY_STRUCT",
            ValidationCode::TooDeep => "E_TOO_DEEP",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub code: ValidationCode,
    pub struct_name: String,
    pub member: String,
    pub type_name: String,
    pub line: usize,
    pub message: String,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}.{} : {}: {}",
            self.code.as_str(),
            self.struct_name,
            self.member,
            self.type_name,
            self.message
        )?;
        if self.line > 0 {
            write!(f, "\n  at line {}", self.line)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    NotFound {
        name: String,
        suggestion: Option<String>,
    },
    Validation(ValidationError),
}

impl CompileError {
    pub fn validation_code(&self) -> Option<ValidationCode> {
        match self {
            CompileError::Validation(e) => Some(e.code),
            CompileError::NotFound { .. } => None,
        }
    }
}

impl Display for CompileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CompileError::NotFound {
                name,
                suggestion: Some(suggestion),
            } => write!(
                f,
                "Failed to find the desired struct with the name {}! Did you mean {}?",
                name, suggestion
            ),
            CompileError::NotFound { name, suggestion: None } => {
                write!(f, "Failed to find the desired struct with the name {}!", name)
            }
            CompileError::Validation(e) => Display::fmt(e, f),
        }
    }
}

impl std::error::Error for CompileError {}

impl From<ValidationError> for CompileError {
    fn from(value: ValidationError) -> Self {
        CompileError::Validation(value)
    }
}
