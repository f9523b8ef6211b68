//! Engine configuration.
//!
//! Two policies are left open by the hardware data and have to be chosen by
//! whoever wires the engine up: what to do when a voltage recorded at init
//! matches no level, and how forgiving the write interface is.

/// Resolution of a voltage that matches no level during init.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnmatchedPolicy {
    /// Bind to level 0 and record a diagnostic
    #[default]
    DegradeToLowest,
    /// Fail `init`
    Reject,
}

/// Token handling on the write interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// Skip tokens without leading digits, read the leading digits otherwise;
    /// one leading `+` is accepted
    Lenient,
    /// Reject the whole write on any token that is not entirely digits
    Strict,
}

impl Default for ParseMode {
    fn default() -> Self {
        if cfg!(feature = "strict-input") {
            ParseMode::Strict
        } else {
            ParseMode::Lenient
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineConfig {
    /// Unmatched-lookup policy of the dependency resolver
    pub unmatched: UnmatchedPolicy,
    /// Parse mode of the write interface
    pub parse: ParseMode,
}

impl EngineConfig {
    /// Set the unmatched-lookup policy
    pub fn with_unmatched(mut self, policy: UnmatchedPolicy) -> Self {
        self.unmatched = policy;
        self
    }

    /// Set the write-interface parse mode
    pub fn with_parse_mode(mut self, mode: ParseMode) -> Self {
        self.parse = mode;
        self
    }
}
