//! Add-game gate
//!
//! Opening the add-game dialog requires a download directory. Without one the
//! directory-missing modal is shown instead.

use serde::Serialize;

pub const DIRECTORY_REQUIRED_TITLE: &str = "You can't do that yet...";
pub const DIRECTORY_REQUIRED_BODY: &str = "A download directory is needed before games can be \
     added. Open settings and pick one under Download Directory.";

/// What an add-game request did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateOutcome {
    /// The dialog toggled; `open` is its new visibility
    DialogToggled { open: bool },
    /// No directory configured, the gating modal is shown
    DirectoryRequired,
}

/// Visibility of the add-game dialog and its gating modal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddGameGate {
    dialog_open: bool,
    directory_modal_open: bool,
}

impl AddGameGate {
    pub fn dialog_open(&self) -> bool {
        self.dialog_open
    }

    pub fn directory_modal_open(&self) -> bool {
        self.directory_modal_open
    }

    /// Handle a request to open the add-game flow
    pub fn request(&mut self, directory_configured: bool) -> GateOutcome {
        if !directory_configured {
            self.directory_modal_open = true;
            self.dialog_open = false;
            tracing::info!("Add game blocked: no download directory configured");
            return GateOutcome::DirectoryRequired;
        }

        self.dialog_open = !self.dialog_open;
        tracing::debug!("Add game dialog open: {}", self.dialog_open);
        GateOutcome::DialogToggled {
            open: self.dialog_open,
        }
    }

    /// Close the directory-missing modal. Returns whether it was open.
    pub fn dismiss_directory_modal(&mut self) -> bool {
        std::mem::replace(&mut self.directory_modal_open, false)
    }

    pub fn close_dialog(&mut self) {
        self.dialog_open = false;
    }
}
