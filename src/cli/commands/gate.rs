//! Add-game request

use anyhow::Result;
use serde::Serialize;

use crate::cli::Context;
use crate::cli::output::{print_error, print_formatted};
use shelf::state::{DIRECTORY_REQUIRED_BODY, DIRECTORY_REQUIRED_TITLE, GateOutcome, StateEvent};

#[derive(Serialize)]
struct AddGameResult {
    outcome: GateOutcome,
    dialog_open: bool,
    directory_modal_open: bool,
}

pub async fn run(ctx: &Context) -> Result<()> {
    let mut view = ctx.view()?;

    let mut outcome = None;
    for event in view.request_add_game().await {
        match event {
            StateEvent::AddGame(o) => outcome = Some(o),
            StateEvent::LogError(msg) => print_error(&msg),
            _ => {}
        }
    }
    let Some(outcome) = outcome else {
        anyhow::bail!("Add-game request produced no outcome");
    };

    let result = AddGameResult {
        outcome,
        dialog_open: view.add_game_dialog_open(),
        directory_modal_open: view.directory_missing_modal_open(),
    };

    print_formatted(&result, ctx.format, |r| match r.outcome {
        GateOutcome::DirectoryRequired => {
            format!("{}\n{}", DIRECTORY_REQUIRED_TITLE, DIRECTORY_REQUIRED_BODY)
        }
        GateOutcome::DialogToggled { open: true } => "Add game dialog opened".to_string(),
        GateOutcome::DialogToggled { open: false } => "Add game dialog closed".to_string(),
    });

    Ok(())
}
