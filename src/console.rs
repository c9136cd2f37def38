use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::{bail, Context as _};
use memorable_wordlist::kebab_case;

/// Whether a person is at the keyboard. Decided once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionMode {
    Interactive,
    Unattended,
}

impl InteractionMode {
    pub fn detect(non_interactive: bool) -> Self {
        let ci = std::env::var_os("CI").is_some_and(|v| !v.is_empty() && v != "false");
        if non_interactive || ci || !io::stdin().is_terminal() {
            InteractionMode::Unattended
        } else {
            InteractionMode::Interactive
        }
    }
}

async fn read_line(question: String) -> anyhow::Result<String> {
    tokio::task::spawn_blocking(move || -> anyhow::Result<String> {
        let mut stdout = io::stdout().lock();
        write!(stdout, "{question}")?;
        stdout.flush()?;

        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        Ok(answer.trim().to_string())
    })
    .await
    .context("console prompt task failed")?
}

/// Resolves the name of the category to create.
///
/// Unattended test runs without a name get a generated one.
pub async fn category_name(
    mode: InteractionMode,
    given: Option<String>,
    test_mode: bool,
) -> anyhow::Result<String> {
    if let Some(name) = given.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()) {
        return Ok(name);
    }

    match mode {
        InteractionMode::Interactive => {
            let name = read_line("Name for the new category: ".to_string()).await?;
            if name.is_empty() {
                bail!("the new category needs a name");
            }
            Ok(name)
        }
        InteractionMode::Unattended if test_mode => Ok(format!("test-{}", kebab_case(24))),
        InteractionMode::Unattended => {
            bail!("no category name given; pass --name when running non-interactively")
        }
    }
}

/// Asks a yes/no question, answering `default` on its own when unattended.
pub async fn confirm(mode: InteractionMode, question: &str, default: bool) -> anyhow::Result<bool> {
    if mode == InteractionMode::Unattended {
        return Ok(default);
    }

    let hint = if default { "[Y/n]" } else { "[y/N]" };
    let answer = read_line(format!("{question} {hint} ")).await?;
    Ok(match answer.to_lowercase().as_str() {
        "y" | "yes" => true,
        "n" | "no" => false,
        _ => default,
    })
}

pub async fn pause(mode: InteractionMode, message: &str) -> anyhow::Result<()> {
    if mode == InteractionMode::Interactive {
        read_line(format!("{message} ")).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_flag_is_unattended() {
        assert_eq!(InteractionMode::detect(true), InteractionMode::Unattended);
    }

    #[tokio::test]
    async fn given_name_wins() {
        let name = category_name(InteractionMode::Unattended, Some("  Launch Week ".into()), false)
            .await
            .unwrap();
        assert_eq!(name, "Launch Week");
    }

    #[tokio::test]
    async fn unattended_test_run_generates_a_name() {
        let name = category_name(InteractionMode::Unattended, None, true)
            .await
            .unwrap();
        assert!(name.starts_with("test-"));
        assert!(name.len() > "test-".len());
    }

    #[tokio::test]
    async fn unattended_run_without_name_fails() {
        assert!(category_name(InteractionMode::Unattended, Some(" ".into()), false)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn unattended_confirm_uses_default() {
        assert!(confirm(InteractionMode::Unattended, "Delete?", true).await.unwrap());
        assert!(!confirm(InteractionMode::Unattended, "Delete?", false).await.unwrap());
    }
}
