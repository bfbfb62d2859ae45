//! Interactive prompt ports.
//!
//! The desktop shell owns the real dialogs. The core only describes what to
//! ask and waits for the answer, so prompts are async and may take as long as
//! the user needs.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::domain::WindowHandle;

/// What kind of selection a file prompt allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileSelection {
    /// Exactly one file that already exists on disk.
    #[default]
    SingleExistingFile,
}

/// Options for a file-selection prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePromptOptions {
    /// Message shown to the user.
    pub message: String,
    /// Directory the dialog opens in.
    pub default_path: PathBuf,
    pub selection: FileSelection,
}

impl FilePromptOptions {
    pub fn new(message: impl Into<String>, default_path: impl Into<PathBuf>) -> Self {
        Self {
            message: message.into(),
            default_path: default_path.into(),
            selection: FileSelection::SingleExistingFile,
        }
    }
}

/// Native file picker.
#[async_trait]
pub trait FilePrompt: Send + Sync {
    /// Ask the user for a file. `None` means the prompt was cancelled.
    async fn prompt_for_file(
        &self,
        window: &WindowHandle,
        options: &FilePromptOptions,
    ) -> Option<PathBuf>;
}

/// Modal dialog with a fixed set of buttons.
#[async_trait]
pub trait ChoicePrompt: Send + Sync {
    /// Show the dialog and return the index of the pressed button.
    async fn prompt_choice(&self, title: &str, message: &str, buttons: &[&str]) -> usize;
}
