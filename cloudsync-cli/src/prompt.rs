//! 交互式存储引导
//!
//! Drives the session's onboarding workflow from line-based input. Each step
//! prints its current values and reads one answer; remote calls are awaited
//! between prompts.

use std::io::{IsTerminal, Write as _};

use anyhow::{Result, bail};
use cloudsync_client::{Credential, StoreKind};
use cloudsync_core::onboarding::{DuraCloudSelection, StoreDetails, StoreTarget};
use cloudsync_core::{ConsoleSession, CoreError, OnboardingEvent, OnboardingState, StoresView};
use dialoguer::{Password, theme::ColorfulTheme};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

const SELECT_HELP: &str =
    "Commands: provider <n>, space <n>, prefix [text], next, back, restart, cancel";
const REVIEW_HELP: &str = "Commands: name <text>, save, back, restart, cancel";

/// Line reader for interactive answers.
pub struct Prompter<R> {
    lines: Lines<R>,
    /// Read passwords from the terminal without echo
    masked: bool,
}

impl<R: AsyncBufRead + Unpin> Prompter<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            masked: false,
        }
    }

    /// Read passwords without echo when stdin is a terminal. Piped input
    /// keeps using the line reader.
    pub fn masking_on_terminal(mut self) -> Self {
        self.masked = std::io::stdin().is_terminal();
        self
    }

    /// One raw line, without its line ending. `None` at end of input.
    async fn ask(&mut self, label: &str) -> Result<Option<String>> {
        print!("{label}: ");
        std::io::stdout().flush()?;
        Ok(self.lines.next_line().await?)
    }

    async fn ask_password(&mut self, label: &str) -> Result<Option<String>> {
        if !self.masked {
            return self.ask(label).await;
        }
        let label = label.to_string();
        let password = tokio::task::spawn_blocking(move || {
            Password::with_theme(&ColorfulTheme::default())
                .with_prompt(label)
                .allow_empty_password(true)
                .interact()
        })
        .await??;
        Ok(Some(password))
    }

    /// Empty input keeps `current`.
    async fn ask_with_default(&mut self, label: &str, current: &str) -> Result<Option<String>> {
        let label = if current.is_empty() {
            label.to_string()
        } else {
            format!("{label} [{current}]")
        };
        Ok(self.ask(&label).await?.map(|answer| {
            let answer = answer.trim();
            if answer.is_empty() {
                current.to_string()
            } else {
                answer.to_string()
            }
        }))
    }
}

/// Run one onboarding flow to completion or cancellation.
///
/// Returns the refreshed store list when a store was created.
pub async fn onboard_store<R>(
    session: &mut ConsoleSession,
    kind: StoreKind,
    prompter: &mut Prompter<R>,
) -> Result<Option<StoresView>>
where
    R: AsyncBufRead + Unpin,
{
    session.onboard(OnboardingEvent::Start(kind)).await?;
    let mut refreshed = None;

    loop {
        let state = session.onboarding().state().clone();
        let event = match state {
            OnboardingState::Idle => {
                println!("Cancelled.");
                return Ok(None);
            }
            OnboardingState::Done { details } => {
                println!("Saved '{}'.", details.name.trim());
                return Ok(refreshed);
            }
            OnboardingState::ValidatingCredentials { .. }
            | OnboardingState::Committing { .. }
            | OnboardingState::SelectingProviderAndSpace {
                pending_spaces: Some(_),
                ..
            } => {
                match session.next_response().await {
                    Some(Ok(view)) => refreshed = view.or(refreshed),
                    Some(Err(e)) => return Err(e.into()),
                    None => bail!("Onboarding is waiting on a response that was never issued"),
                }
                continue;
            }
            OnboardingState::CollectingCredentials {
                kind,
                credential,
                error,
                ..
            } => {
                show_error(error.as_deref());
                println!("{} login", kind.display_name());
                ask_credential(prompter, &credential)
                    .await?
                    .map(OnboardingEvent::SubmitCredentials)
            }
            OnboardingState::SelectingProviderAndSpace {
                selection, error, ..
            } => {
                show_error(error.as_deref());
                print!("{}", describe_selection(&selection));
                println!("{SELECT_HELP}");
                match prompter.ask(">").await? {
                    Some(line) => match selection_command(&line, &selection) {
                        Some(event) => Some(event),
                        None => {
                            println!("Unrecognized command: {line}");
                            continue;
                        }
                    },
                    None => None,
                }
            }
            OnboardingState::ReviewingDetails { details, error, .. } => {
                show_error(error.as_deref());
                print!("{}", describe_details(&details));
                println!("{REVIEW_HELP}");
                match prompter.ask(">").await? {
                    Some(line) => match review_command(&line) {
                        Some(event) => Some(event),
                        None => {
                            println!("Unrecognized command: {line}");
                            continue;
                        }
                    },
                    None => None,
                }
            }
        };

        // 输入结束视为取消
        let event = event.unwrap_or(OnboardingEvent::Cancel);
        match session.onboard(event).await {
            Ok(view) => refreshed = view.or(refreshed),
            Err(CoreError::Onboarding(e)) => println!("{e}"),
            Err(e) => return Err(e.into()),
        }
    }
}

async fn ask_credential<R>(
    prompter: &mut Prompter<R>,
    current: &Credential,
) -> Result<Option<Credential>>
where
    R: AsyncBufRead + Unpin,
{
    let Some(url) = prompter.ask_with_default("URL", &current.url).await? else {
        return Ok(None);
    };
    let Some(username) = prompter
        .ask_with_default("Username", &current.username)
        .await?
    else {
        return Ok(None);
    };
    let password_label = if current.password.is_empty() {
        "Password"
    } else {
        "Password [unchanged]"
    };
    let Some(mut password) = prompter.ask_password(password_label).await? else {
        return Ok(None);
    };
    if password.is_empty() {
        password.clone_from(&current.password);
    }
    Ok(Some(Credential::new(url, username, password)))
}

fn show_error(error: Option<&str>) {
    if let Some(error) = error {
        println!("! {error}");
    }
}

fn describe_selection(selection: &DuraCloudSelection) -> String {
    let mut out = String::from("Storage providers:\n");
    for (n, account) in selection.accounts.iter().enumerate() {
        let marker = marker(selection.provider_id.as_deref() == Some(account.id.as_str()));
        out.push_str(&format!("  {marker} {}. {}\n", n + 1, account.provider_type));
    }
    out.push_str("Spaces:\n");
    if selection.spaces.is_empty() {
        out.push_str("  (none)\n");
    }
    for (n, space) in selection.spaces.iter().enumerate() {
        let marker = marker(selection.space.as_deref() == Some(space.id.as_str()));
        out.push_str(&format!("  {marker} {}. {}\n", n + 1, space.id));
    }
    out.push_str(&format!("Content Id Prefix: {}\n", selection.prefix));
    out
}

fn describe_details(details: &StoreDetails) -> String {
    let mut out = format!(
        "Name: {}\nURL: {}\nUsername: {}\n",
        details.name, details.credential.url, details.credential.username
    );
    if let StoreTarget::DuraCloud {
        provider_name,
        space,
        prefix,
        ..
    } = &details.target
    {
        out.push_str(&format!(
            "Storage Provider: {provider_name}\nSpace: {space}\nContent Id Prefix: {prefix}\n"
        ));
    }
    out
}

fn marker(selected: bool) -> char {
    if selected { '*' } else { ' ' }
}

fn common_command(line: &str) -> Option<OnboardingEvent> {
    match line {
        "back" => Some(OnboardingEvent::Back),
        "restart" => Some(OnboardingEvent::Restart),
        "cancel" => Some(OnboardingEvent::Cancel),
        _ => None,
    }
}

/// `<n>` is a 1-based position in the listing; anything else is taken as an id.
fn pick<'a>(arg: &'a str, ids: impl Iterator<Item = &'a str>) -> String {
    let ids: Vec<&str> = ids.collect();
    arg.parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| ids.get(i).copied())
        .unwrap_or(arg)
        .to_string()
}

/// Text after `keyword` and one separating space, kept as typed.
fn argument<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    match line.strip_prefix(keyword)? {
        "" => Some(""),
        rest => rest.strip_prefix(' '),
    }
}

fn selection_command(line: &str, selection: &DuraCloudSelection) -> Option<OnboardingEvent> {
    let line = line.trim_start();
    if let Some(event) = common_command(line.trim_end()) {
        return Some(event);
    }
    if let Some(prefix) = argument(line, "prefix") {
        return Some(OnboardingEvent::EditPrefix(prefix.to_string()));
    }
    let line = line.trim_end();
    let (command, arg) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(c, a)| (c, a.trim()));

    match (command, arg) {
        ("next", "") => Some(OnboardingEvent::ConfirmSelection),
        ("provider", arg) if !arg.is_empty() => Some(OnboardingEvent::SelectProvider(pick(
            arg,
            selection.accounts.iter().map(|a| a.id.as_str()),
        ))),
        ("space", arg) if !arg.is_empty() => Some(OnboardingEvent::SelectSpace(pick(
            arg,
            selection.spaces.iter().map(|s| s.id.as_str()),
        ))),
        _ => None,
    }
}

fn review_command(line: &str) -> Option<OnboardingEvent> {
    let line = line.trim_start();
    if let Some(event) = common_command(line.trim_end()) {
        return Some(event);
    }
    match line.trim_end() {
        "save" => Some(OnboardingEvent::Save),
        _ => argument(line, "name").map(|name| OnboardingEvent::EditName(name.to_string())),
    }
}
