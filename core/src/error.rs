//! # Error Handling
//!
//! Every fallible entry point of the engine returns [`VoltageResult`]. Errors
//! are raised at the call that violates a precondition and never after state
//! has started to change, so a failed call always leaves the previous,
//! consistent tables in place.
//!
//! ## Error Categories
//!
//! | Category      | Raised by                  | Example                        |
//! |---------------|----------------------------|--------------------------------|
//! | Configuration | registration, `init`       | serialization lock missing     |
//! | Topology      | `init` (resolver)          | unmatched voltage under Reject |
//! | Input         | `apply`, write interface   | vector longer than the table   |
//! | State         | any call                   | `apply` before `init`          |

use core::fmt;

extern crate alloc;
use alloc::string::String;

// =============================================================================
// ERROR KIND
// =============================================================================

/// Classification of engine errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ErrorKind {
    // -------------------------------------------------------------------------
    // Configuration Errors (100-199)
    // -------------------------------------------------------------------------
    /// An outer or inner serialization lock was not registered
    MissingLock          = 100,

    /// A domain name or id does not exist
    UnknownDomain        = 101,

    /// A domain was declared twice
    DuplicateDomain      = 102,

    // -------------------------------------------------------------------------
    // Topology Errors (200-299)
    // -------------------------------------------------------------------------
    /// No level matches a voltage recorded at init
    UnmatchedVoltage     = 200,

    /// A domain has an empty voltage table
    EmptyTable           = 201,

    // -------------------------------------------------------------------------
    // Input Errors (300-399)
    // -------------------------------------------------------------------------
    /// More values than the domain has levels
    TooManyValues        = 300,

    /// A token on the write interface is not a decimal millivolt value
    MalformedInput       = 301,

    /// A level index is out of range
    LevelOutOfRange      = 302,

    // -------------------------------------------------------------------------
    // State Errors (400-499)
    // -------------------------------------------------------------------------
    /// Operation requires an initialized context
    NotInitialized       = 400,

    /// `init` was already run
    AlreadyInitialized   = 401,
}

impl ErrorKind {
    /// Get the error category name
    pub const fn category(&self) -> &'static str {
        match *self as u32 {
            100..=199 => "Configuration",
            200..=299 => "Topology",
            300..=399 => "Input",
            400..=499 => "State",
            _ => "Unknown",
        }
    }

    /// Numeric code for external reference
    pub const fn code(&self) -> u32 {
        *self as u32
    }

    /// Default message
    pub const fn message(&self) -> &'static str {
        match self {
            ErrorKind::MissingLock => "Serialization lock not registered",
            ErrorKind::UnknownDomain => "Unknown voltage domain",
            ErrorKind::DuplicateDomain => "Voltage domain declared twice",
            ErrorKind::UnmatchedVoltage => "No voltage level matches",
            ErrorKind::EmptyTable => "Voltage table is empty",
            ErrorKind::TooManyValues => "More values than voltage levels",
            ErrorKind::MalformedInput => "Malformed voltage input",
            ErrorKind::LevelOutOfRange => "Voltage level out of range",
            ErrorKind::NotInitialized => "Engine not initialized",
            ErrorKind::AlreadyInitialized => "Engine already initialized",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// =============================================================================
// VOLTAGE ERROR
// =============================================================================

/// Engine error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoltageError {
    kind: ErrorKind,
    message: &'static str,
    details: Option<String>,
    domain: Option<&'static str>,
}

/// Result alias used throughout the engine
pub type VoltageResult<T> = Result<T, VoltageError>;

impl VoltageError {
    /// Create new error with kind and message
    pub const fn new(kind: ErrorKind, message: &'static str) -> Self {
        Self {
            kind,
            message,
            details: None,
            domain: None,
        }
    }

    /// Create error from kind with default message
    pub const fn from_kind(kind: ErrorKind) -> Self {
        Self::new(kind, kind.message())
    }

    /// Add details to error
    pub fn with_details(mut self, details: String) -> Self {
        self.details = Some(details);
        self
    }

    /// Add the domain the error refers to
    pub fn with_domain(mut self, domain: &'static str) -> Self {
        self.domain = Some(domain);
        self
    }

    /// Get error kind
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Get message
    pub fn message(&self) -> &str {
        self.message
    }

    /// Get details
    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    /// Get domain
    pub fn domain(&self) -> Option<&'static str> {
        self.domain
    }
}

impl From<ErrorKind> for VoltageError {
    fn from(kind: ErrorKind) -> Self {
        Self::from_kind(kind)
    }
}

impl fmt::Display for VoltageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind.category(), self.message)?;

        if let Some(ref details) = self.details {
            write!(f, ": {}", details)?;
        }

        if let Some(domain) = self.domain {
            write!(f, " (domain: {})", domain)?;
        }

        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
