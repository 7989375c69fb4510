use crate::domain::{DeletionPolicy, KeepPolicy};
use crate::ports::DecisionPort;
use anyhow::{Context, Result};
use console::{Term, style};
use dialoguer::{Confirm, Select, theme::ColorfulTheme};
use std::path::Path;

/// Answers supplied up front; `None` means "ask".
#[derive(Debug, Clone, Copy, Default)]
pub struct PresetAnswers {
    pub rescan: Option<bool>,
    pub save: Option<bool>,
    pub delete: Option<bool>,
    pub keep: Option<KeepPolicy>,
    pub ignore_extension_mismatch: Option<bool>,
    pub ignore_directory_mismatch: Option<bool>,
    pub blanket_confirm: Option<bool>,
}

/// Asks the operator through dialoguer unless a preset answer exists.
///
/// When non-interactive, unanswered questions fall back to their defaults and
/// individual deletions are declined.
pub struct PromptAdapter {
    preset: PresetAnswers,
    interactive: bool,
    term: Term,
}

impl PromptAdapter {
    pub fn new(preset: PresetAnswers) -> Self {
        Self {
            preset,
            interactive: true,
            term: Term::stderr(),
        }
    }

    pub fn non_interactive(preset: PresetAnswers) -> Self {
        Self {
            interactive: false,
            ..Self::new(preset)
        }
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    /// Restores the cursor and exits with 130 when a prompt is interrupted.
    pub fn install_interrupt_handler(&self) -> Result<()> {
        let term = self.term.clone();
        ctrlc::set_handler(move || {
            let _ = term.show_cursor();
            std::process::exit(130);
        })
        .context("Error setting Ctrl+C handler")
    }

    fn confirm(&self, preset: Option<bool>, prompt: &str, default: bool) -> Result<bool> {
        if let Some(answer) = preset {
            return Ok(answer);
        }
        if !self.interactive {
            return Ok(default);
        }

        let answer = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .default(default)
            .interact_on(&self.term)?;
        Ok(answer)
    }

    fn choose_keep(&self) -> Result<KeepPolicy> {
        if let Some(keep) = self.preset.keep {
            return Ok(keep);
        }
        if !self.interactive {
            return Ok(KeepPolicy::default());
        }

        let choices = ["Keep the oldest copy", "Keep the newest copy"];
        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("When deleting duplicates, which copy should be kept?")
            .items(&choices)
            .default(0)
            .interact_on(&self.term)?;
        Ok(if selection == 1 {
            KeepPolicy::Newest
        } else {
            KeepPolicy::Oldest
        })
    }

    fn choose_blanket_confirm(&self) -> Result<bool> {
        if let Some(answer) = self.preset.blanket_confirm {
            return Ok(answer);
        }
        if !self.interactive {
            return Ok(false);
        }

        let wanted = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Delete every redundant copy without asking per file?")
            .default(false)
            .interact_on(&self.term)?;
        if !wanted {
            return Ok(false);
        }

        self.term.write_line(&format!(
            "\n{}",
            style("WARNING! BULK DELETE CANNOT BE UNDONE!").bold().red()
        ))?;
        self.term
            .write_line("Every copy except the kept one will be permanently removed.")?;

        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Are you SURE?")
            .default(false)
            .interact_on(&self.term)?;
        Ok(confirmed)
    }
}

impl DecisionPort for PromptAdapter {
    fn rescan(&self, root: &Path) -> Result<bool> {
        self.confirm(
            self.preset.rescan,
            &format!("Search directory '{}' for new duplicates?", root.display()),
            false,
        )
    }

    fn save_results(&self, destination: &Path) -> Result<bool> {
        self.confirm(
            self.preset.save,
            &format!("Save results to '{}'?", destination.display()),
            true,
        )
    }

    fn start_deletion(&self) -> Result<bool> {
        self.confirm(self.preset.delete, "Delete redundant copies?", false)
    }

    fn deletion_policy(&self) -> Result<DeletionPolicy> {
        let keep = self.choose_keep()?;
        let ignore_extension = self.confirm(
            self.preset.ignore_extension_mismatch,
            "Treat copies with different extensions as interchangeable?",
            false,
        )?;
        let ignore_directory = self.confirm(
            self.preset.ignore_directory_mismatch,
            "Treat copies in different directories as interchangeable?",
            false,
        )?;
        let blanket = self.choose_blanket_confirm()?;

        Ok(DeletionPolicy::new(keep)
            .with_ignore_extension_mismatch(ignore_extension)
            .with_ignore_directory_mismatch(ignore_directory)
            .with_blanket_confirm(blanket))
    }

    fn confirm_delete(&self, path: &Path) -> Result<bool> {
        if !self.interactive {
            return Ok(false);
        }
        self.confirm(None, &format!("Delete file '{}'?", path.display()), true)
    }
}
