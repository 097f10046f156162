//! View state modules
//!
//! Each state struct owns its fields and the logic that mutates them. Methods
//! hand back [`StateEvent`]s instead of talking to the render layer directly.

mod gate;
mod library;
mod onboarding;

pub use gate::{AddGameGate, DIRECTORY_REQUIRED_BODY, DIRECTORY_REQUIRED_TITLE, GateOutcome};
pub use library::{LibraryState, SourceStatus};
pub use onboarding::{Effect, GateFlags, Onboarding, OnboardingEvent, OnboardingState, Transition};

/// Events returned from state updates.
#[derive(Debug, Clone, PartialEq)]
pub enum StateEvent {
    /// Categorized library content changed
    LibraryChanged,

    /// The onboarding modal changed
    OnboardingChanged {
        from: OnboardingState,
        to: OnboardingState,
    },

    /// Add-game request resolved
    AddGame(GateOutcome),

    /// Log an error message
    LogError(String),

    /// Log an info message
    LogInfo(String),
}
