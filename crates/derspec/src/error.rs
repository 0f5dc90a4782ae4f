//! Decode errors and the schema-path context engine.

use std::fmt;

/// Machine-safe classification of a decode failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    #[error("input truncated")]
    Truncated,
    #[error("invalid length")]
    InvalidLength,
    #[error("unexpected tag")]
    UnexpectedTag,
    #[error("integer too large")]
    IntegerTooLarge,
    #[error("invalid BOOLEAN value")]
    InvalidBoolean,
    #[error("invalid NULL value")]
    InvalidNull,
    #[error("invalid BIT STRING")]
    InvalidBitString,
    #[error("invalid OBJECT IDENTIFIER")]
    InvalidOid,
    #[error("OID component overflow")]
    OidComponentOverflow,
    #[error("invalid string")]
    InvalidString,
    #[error("invalid date-time")]
    InvalidDateTime,
    #[error("missing required field")]
    MissingField,
    #[error("duplicate SET element")]
    DuplicateSetElement,
    #[error("no matching CHOICE alternative")]
    NoMatchingAlternative,
    #[error("trailing bytes")]
    TrailingBytes,
    #[error("too few elements")]
    TooFewElements,
    #[error("too many elements")]
    TooManyElements,
    #[error("recursion depth exceeded")]
    RecursionDepthExceeded,
    #[error("value validation failed")]
    ValidationFailed,
}

/// How much of the schema path an error carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContextPolicy {
    /// Full path from the outermost schema to the failure site.
    #[default]
    Full,
    /// Only the entry of the immediately failing schema.
    Last,
    /// No path at all.
    None,
}

/// One step of the schema path: the user-assigned name (if any) and the
/// ASN.1 type name of the schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextEntry {
    pub name: Option<&'static str>,
    pub type_name: &'static str,
}

impl ContextEntry {
    /// The label used when rendering the path: the name if present,
    /// the type name otherwise.
    pub fn label(&self) -> &'static str {
        self.name.unwrap_or(self.type_name)
    }
}

/// A DER decode failure.
///
/// Carries a [`kind`](Self::kind), a static human-readable message, the
/// schema path from the outermost node down to the failure site (subject to
/// the configured [`ContextPolicy`]) and, for validator failures, the
/// user error as [`source`](std::error::Error::source).
#[derive(Debug)]
pub struct DecodeError {
    kind: ErrorKind,
    message: &'static str,
    context: Vec<ContextEntry>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
    policy: ContextPolicy,
    sealed: bool,
}

impl DecodeError {
    pub(crate) fn new(kind: ErrorKind, message: &'static str, policy: ContextPolicy) -> Self {
        Self {
            kind,
            message,
            context: Vec::new(),
            source: None,
            policy,
            sealed: false,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &'static str {
        self.message
    }

    /// The schema path, ordered from the outermost node to the failure site.
    pub fn context(&self) -> &[ContextEntry] {
        &self.context
    }

    /// The schema path rendered as `outer/inner/...` labels.
    pub fn path(&self) -> String {
        let labels: Vec<&str> = self.context.iter().map(|e| e.label()).collect();
        labels.join("/")
    }

    pub(crate) fn with_source(
        mut self,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        self.source = Some(source);
        self
    }

    /// Prepends a schema entry to the path as the error unwinds outward.
    pub(crate) fn with_context(mut self, entry: ContextEntry) -> Self {
        match self.policy {
            ContextPolicy::Full => {
                if !self.sealed {
                    self.context.insert(0, entry);
                }
            }
            ContextPolicy::Last => {
                if self.context.is_empty() {
                    self.context.push(entry);
                }
            }
            ContextPolicy::None => {}
        }
        self
    }

    /// Seals the path when unwinding through a recursive schema reference:
    /// entries accumulated below the recursion point are kept, everything
    /// above collapses to the root entry (re-added by the facade).
    pub(crate) fn sealed(mut self) -> Self {
        self.sealed = true;
        self
    }

    pub(crate) fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Re-attaches the root entry to a sealed path.
    pub(crate) fn with_root_context(mut self, entry: ContextEntry) -> Self {
        if matches!(self.policy, ContextPolicy::Full) {
            self.context.insert(0, entry);
        }
        self
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if !self.context.is_empty() {
            write!(f, " (at {})", self.path())?;
        }
        Ok(())
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}
