//! Onboarding modal sequence.
//!
//! A linear state machine. The starting state comes from the host's one-shot
//! flags and every edge is driven by an explicit user event:
//!
//! ```text
//! DevWarning --acknowledge--> Welcome (first run) | Idle
//! Welcome --next--> ExtensionPrompt
//! ExtensionPrompt --skip|accept--> DependencyPrompt
//! DependencyPrompt --start exploring--> Idle
//! DependencyPrompt --install--> Installing --settled--> Idle
//! ```
//!
//! Events that have no edge from the current state are ignored.

use serde::Serialize;

/// The modal currently shown, or `Idle` when none is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OnboardingState {
    DevWarning,
    Welcome,
    ExtensionPrompt,
    DependencyPrompt,
    Installing,
    Idle,
}

impl OnboardingState {
    pub fn is_modal(&self) -> bool {
        !matches!(self, OnboardingState::Idle)
    }

    pub fn title(&self) -> &'static str {
        match self {
            OnboardingState::DevWarning => "Warning",
            OnboardingState::Welcome => "Welcome!",
            OnboardingState::ExtensionPrompt => "Browser Extension",
            OnboardingState::DependencyPrompt => "Game Dependencies",
            OnboardingState::Installing => "Installing Dependencies...",
            OnboardingState::Idle => "",
        }
    }

    pub fn body(&self) -> &'static str {
        match self {
            OnboardingState::DevWarning => {
                "This application is in heavy development. Expect incomplete or broken \
                 features, and please report any issues you run into."
            }
            OnboardingState::Welcome => {
                "Issues are expected while things are still being built. Remember to set \
                 your download directory in settings before installing or adding any games."
            }
            OnboardingState::ExtensionPrompt => {
                "The download helper extension makes it quick to copy direct download links. \
                 Would you like to get it now?"
            }
            OnboardingState::DependencyPrompt => {
                "Most games need these if they were never installed before: .NET Framework, \
                 DirectX, OpenAL, Visual C++ Redistributable, XNA Framework Redistributable. \
                 They can be installed automatically."
            }
            OnboardingState::Installing => {
                "The installers are being downloaded and run. Accept each elevated \
                 permissions prompt. This dialog closes when everything is done."
            }
            OnboardingState::Idle => "",
        }
    }
}

/// User acknowledgements that drive the sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnboardingEvent {
    /// Dismiss the development warning
    Acknowledge,
    /// Leave the welcome screen
    Next,
    SkipExtension,
    /// Open the extension page and move on
    AcceptExtension,
    StartExploring,
    InstallDependencies,
    /// The install command finished, whatever the outcome
    InstallationSettled,
}

/// Flags read from the host when the view activates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct GateFlags {
    pub directory_configured: bool,
    pub is_new: bool,
    pub dev_warning_acknowledged: bool,
}

/// Side effects the owner must carry out after a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    AcknowledgeDevWarning,
    AcknowledgeFirstRun,
    OpenExtensionPage,
    InstallDependencies,
}

/// A transition that fired
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: OnboardingState,
    pub to: OnboardingState,
    pub effects: Vec<Effect>,
}

#[derive(Debug, Clone)]
pub struct Onboarding {
    state: OnboardingState,
    flags: GateFlags,
    first_run_acknowledged: bool,
}

impl Onboarding {
    /// Pick the starting modal from the host flags
    pub fn resolve(flags: GateFlags) -> Self {
        let state = if !flags.dev_warning_acknowledged {
            OnboardingState::DevWarning
        } else if flags.is_new {
            OnboardingState::Welcome
        } else {
            OnboardingState::Idle
        };
        tracing::debug!("Onboarding starts at {:?} ({:?})", state, flags);

        Self {
            state,
            flags,
            first_run_acknowledged: false,
        }
    }

    pub fn state(&self) -> OnboardingState {
        self.state
    }

    pub fn flags(&self) -> GateFlags {
        self.flags
    }

    pub fn handle(&mut self, event: OnboardingEvent) -> Option<Transition> {
        use OnboardingEvent as E;
        use OnboardingState as S;

        let mut effects = Vec::new();
        let next = match (self.state, event) {
            (S::DevWarning, E::Acknowledge) => {
                effects.push(Effect::AcknowledgeDevWarning);
                if self.flags.is_new { S::Welcome } else { S::Idle }
            }
            (S::Welcome, E::Next) => S::ExtensionPrompt,
            (S::ExtensionPrompt, E::SkipExtension) => S::DependencyPrompt,
            (S::ExtensionPrompt, E::AcceptExtension) => {
                effects.push(Effect::OpenExtensionPage);
                S::DependencyPrompt
            }
            (S::DependencyPrompt, E::StartExploring) => S::Idle,
            (S::DependencyPrompt, E::InstallDependencies) => {
                effects.push(Effect::InstallDependencies);
                S::Installing
            }
            (S::Installing, E::InstallationSettled) => S::Idle,
            (state, event) => {
                tracing::debug!("Ignoring {:?} while onboarding is at {:?}", event, state);
                return None;
            }
        };

        if next == S::Idle && self.flags.is_new && !self.first_run_acknowledged {
            self.first_run_acknowledged = true;
            effects.push(Effect::AcknowledgeFirstRun);
        }

        let from = self.state;
        self.state = next;
        tracing::info!("Onboarding: {:?} -> {:?}", from, next);

        Some(Transition {
            from,
            to: next,
            effects,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use OnboardingEvent as E;
    use OnboardingState as S;

    fn flags(dev_warning_acknowledged: bool, is_new: bool) -> GateFlags {
        GateFlags {
            directory_configured: false,
            is_new,
            dev_warning_acknowledged,
        }
    }

    /// Feed events and collect every state visited, starting state included
    fn walk(onboarding: &mut Onboarding, events: &[OnboardingEvent]) -> Vec<OnboardingState> {
        let mut visited = vec![onboarding.state()];
        for event in events {
            if let Some(transition) = onboarding.handle(*event) {
                visited.push(transition.to);
            }
        }
        visited
    }

    #[test]
    fn test_initial_state() {
        assert_eq!(Onboarding::resolve(flags(false, true)).state(), S::DevWarning);
        assert_eq!(Onboarding::resolve(flags(false, false)).state(), S::DevWarning);
        assert_eq!(Onboarding::resolve(flags(true, true)).state(), S::Welcome);
        assert_eq!(Onboarding::resolve(flags(true, false)).state(), S::Idle);
    }

    #[test]
    fn test_full_sequence_with_install() {
        let mut onboarding = Onboarding::resolve(flags(false, true));
        let visited = walk(
            &mut onboarding,
            &[
                E::Acknowledge,
                E::Next,
                E::SkipExtension,
                E::InstallDependencies,
                E::InstallationSettled,
            ],
        );
        assert_eq!(
            visited,
            vec![
                S::DevWarning,
                S::Welcome,
                S::ExtensionPrompt,
                S::DependencyPrompt,
                S::Installing,
                S::Idle
            ]
        );
    }

    #[test]
    fn test_full_sequence_start_exploring() {
        let mut onboarding = Onboarding::resolve(flags(false, true));
        let visited = walk(
            &mut onboarding,
            &[E::Acknowledge, E::Next, E::AcceptExtension, E::StartExploring],
        );
        assert_eq!(
            visited,
            vec![
                S::DevWarning,
                S::Welcome,
                S::ExtensionPrompt,
                S::DependencyPrompt,
                S::Idle
            ]
        );
    }

    #[test]
    fn test_out_of_order_events_are_ignored() {
        let mut onboarding = Onboarding::resolve(flags(false, true));
        assert!(onboarding.handle(E::Next).is_none());
        assert!(onboarding.handle(E::InstallationSettled).is_none());
        assert_eq!(onboarding.state(), S::DevWarning);

        onboarding.handle(E::Acknowledge);
        // Acknowledging again is a no-op
        assert!(onboarding.handle(E::Acknowledge).is_none());
        assert_eq!(onboarding.state(), S::Welcome);
    }

    #[test]
    fn test_idle_is_terminal() {
        let mut onboarding = Onboarding::resolve(flags(true, false));
        for event in [
            E::Acknowledge,
            E::Next,
            E::SkipExtension,
            E::AcceptExtension,
            E::StartExploring,
            E::InstallDependencies,
            E::InstallationSettled,
        ] {
            assert!(onboarding.handle(event).is_none());
        }
        assert_eq!(onboarding.state(), S::Idle);
    }

    #[test]
    fn test_dev_warning_for_returning_user_goes_idle() {
        let mut onboarding = Onboarding::resolve(flags(false, false));
        let transition = onboarding.handle(E::Acknowledge).unwrap();
        assert_eq!(transition.to, S::Idle);
        // Not a first run, so only the warning is acknowledged
        assert_eq!(transition.effects, vec![Effect::AcknowledgeDevWarning]);
    }

    #[test]
    fn test_effects() {
        let mut onboarding = Onboarding::resolve(flags(true, true));
        assert!(onboarding.handle(E::Next).unwrap().effects.is_empty());
        assert_eq!(
            onboarding.handle(E::AcceptExtension).unwrap().effects,
            vec![Effect::OpenExtensionPage]
        );
        assert_eq!(
            onboarding.handle(E::InstallDependencies).unwrap().effects,
            vec![Effect::InstallDependencies]
        );
        assert_eq!(
            onboarding.handle(E::InstallationSettled).unwrap().effects,
            vec![Effect::AcknowledgeFirstRun]
        );
    }

    #[test]
    fn test_only_one_modal_at_a_time() {
        let states = [
            S::DevWarning,
            S::Welcome,
            S::ExtensionPrompt,
            S::DependencyPrompt,
            S::Installing,
        ];
        assert!(states.iter().all(OnboardingState::is_modal));
        assert!(!S::Idle.is_modal());
        assert!(S::Idle.title().is_empty());
    }
}
