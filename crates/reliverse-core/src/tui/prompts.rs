//! Charm-style CLI prompts using cliclack

use crate::error::{Error, Result};
use crate::flow::{self, RunArgs};
use crate::product::ProductConfig;
use crate::prompt::{Prompter, SelectOption};
use anyhow::Context;
use std::io;

/// [`Prompter`] drawing inline prompts on the terminal
#[derive(Debug, Default)]
pub struct CliPrompter;

/// An interrupted prompt (Esc or Ctrl+C) is a cancellation
fn answered<T>(result: io::Result<T>) -> Result<T> {
    result.map_err(|e| match e.kind() {
        io::ErrorKind::Interrupted => Error::Cancelled,
        _ => Error::Io(e),
    })
}

fn ensure_options(prompt: &str, options: &[SelectOption]) -> Result<()> {
    if options.is_empty() {
        return Err(Error::Other(anyhow::anyhow!("No choices available for '{}'", prompt)));
    }
    Ok(())
}

impl Prompter for CliPrompter {
    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool> {
        answered(cliclack::confirm(prompt).initial_value(default).interact())
    }

    fn select(&mut self, prompt: &str, options: &[SelectOption]) -> Result<usize> {
        ensure_options(prompt, options)?;
        let mut select = cliclack::select(prompt);
        for (idx, option) in options.iter().enumerate() {
            select = select.item(idx, &option.label, &option.hint);
        }
        answered(select.interact())
    }

    fn multiselect(
        &mut self,
        prompt: &str,
        options: &[SelectOption],
        initial: &[usize],
    ) -> Result<Vec<usize>> {
        ensure_options(prompt, options)?;
        let mut multi = cliclack::multiselect(prompt);
        for (idx, option) in options.iter().enumerate() {
            multi = multi.item(idx, &option.label, &option.hint);
        }
        let mut chosen = answered(
            multi
                .initial_values(initial.to_vec())
                .required(false)
                .interact(),
        )?;
        chosen.sort_unstable();
        Ok(chosen)
    }

    fn input(&mut self, prompt: &str, default: &str) -> Result<String> {
        let mut input = cliclack::input(prompt).required(false);
        if !default.is_empty() {
            input = input.placeholder(default).default_input(default);
        }
        answered(input.interact())
    }

    fn secret(&mut self, prompt: &str, masked: bool) -> Result<String> {
        if masked {
            answered(cliclack::password(prompt).mask('▪').interact())
        } else {
            answered(cliclack::input(prompt).required(false).interact())
        }
    }

    fn info(&mut self, message: &str) {
        let _ = cliclack::log::info(message);
    }

    fn warn(&mut self, message: &str) {
        let _ = cliclack::log::warning(message);
    }

    fn error(&mut self, message: &str) {
        let _ = cliclack::log::error(message);
    }

    fn success(&mut self, message: &str) {
        let _ = cliclack::log::success(message);
    }
}

/// Run the CLI with interactive prompts
pub async fn run<C: ProductConfig>(config: &C, args: RunArgs, cli_version: &str) -> anyhow::Result<()> {
    cliclack::intro(config.display_name())?;

    let cwd = std::env::current_dir().context("Failed to resolve the working directory")?;
    let home = dirs::home_dir().context("Could not determine the home directory")?;
    let mut prompter = CliPrompter;

    match flow::run_with(config, args, cli_version, cwd, home, &mut prompter).await {
        Ok(()) => {
            cliclack::outro(format!("Thanks for using {}!", config.display_name()))?;
            Ok(())
        }
        Err(Error::Cancelled) => {
            cliclack::outro_cancel("Operation cancelled")?;
            Err(Error::Cancelled.into())
        }
        Err(e) => {
            cliclack::outro_cancel("Something went wrong")?;
            Err(e.into())
        }
    }
}
