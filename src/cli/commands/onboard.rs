//! Interactive onboarding walkthrough
//!
//! Shows each onboarding modal in turn and reads the choice from the prompt.

use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use serde::Serialize;

use crate::cli::Context;
use crate::cli::output::{OutputFormat, print_error, print_formatted, print_success};
use shelf::JsonDirBridge;
use shelf::LibraryView;
use shelf::state::{OnboardingEvent, OnboardingState, StateEvent};

/// Choices offered for a modal, in prompt order
fn choices(state: OnboardingState) -> &'static [(&'static str, OnboardingEvent)] {
    match state {
        OnboardingState::DevWarning => &[("I understand", OnboardingEvent::Acknowledge)],
        OnboardingState::Welcome => &[("Next", OnboardingEvent::Next)],
        OnboardingState::ExtensionPrompt => &[
            ("Get the extension", OnboardingEvent::AcceptExtension),
            ("Skip", OnboardingEvent::SkipExtension),
        ],
        OnboardingState::DependencyPrompt => &[
            ("Install dependencies", OnboardingEvent::InstallDependencies),
            ("Start exploring", OnboardingEvent::StartExploring),
        ],
        OnboardingState::Installing | OnboardingState::Idle => &[],
    }
}

#[derive(Serialize)]
struct OnboardResult {
    final_state: OnboardingState,
    completed: bool,
}

pub async fn run(ctx: &Context) -> Result<()> {
    let mut view = ctx.view()?;
    report(&view.activate().await, ctx.quiet);

    if !view.onboarding_state().is_modal() {
        print_success("Nothing to show, onboarding is already done", ctx.quiet);
    } else {
        walk(&mut view, ctx.quiet).await?;
    }

    view.flush_effects().await;
    view.deactivate();

    let final_state = view.onboarding_state();
    let result = OnboardResult {
        final_state,
        completed: !final_state.is_modal(),
    };
    if !ctx.quiet || ctx.format == OutputFormat::Json {
        print_formatted(&result, ctx.format, |r| {
            if r.completed {
                "Onboarding complete".to_string()
            } else {
                format!("Onboarding stopped at {:?}", r.final_state)
            }
        });
    }
    Ok(())
}

async fn walk(view: &mut LibraryView<JsonDirBridge>, quiet: bool) -> Result<()> {
    let mut rl = DefaultEditor::new()?;

    while view.onboarding_state().is_modal() {
        let state = view.onboarding_state();
        println!("\n== {} ==\n{}\n", state.title(), state.body());

        if state == OnboardingState::Installing {
            report(&view.settle_install().await, quiet);
            continue;
        }

        let options = choices(state);
        for (n, (label, _)) in options.iter().enumerate() {
            println!("  {}) {}", n + 1, label);
        }

        match rl.readline("choice> ") {
            Ok(line) => {
                let picked = line
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|i| options.get(i));
                match picked {
                    Some((_, event)) => {
                        report(&view.handle(*event), quiet);
                        view.flush_effects().await;
                    }
                    None => print_error(&format!("Pick 1-{}", options.len())),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}

fn report(events: &[StateEvent], quiet: bool) {
    for event in events {
        match event {
            StateEvent::LogError(msg) => print_error(msg),
            StateEvent::LogInfo(msg) => print_success(msg, quiet),
            _ => {}
        }
    }
}
