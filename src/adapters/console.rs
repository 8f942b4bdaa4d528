//! Stdin operator console.
//!
//! Reads one command per line on a dedicated thread and forwards it to
//! the orchestrator through the command channel.  `quit` or end of input
//! signals stop.
//!
//! ```text
//! mode auto|manual    lamp|fan|pump on|off    all on|off
//! theme               help                    quit
//! ```

use std::io::{self, BufRead};
use std::thread::JoinHandle;

use futures_lite::future::block_on;
use log::{info, warn};

use crate::app::commands::OperatorCommand;
use crate::app::ports::PreferenceStore;
use crate::app::runner::{CommandChannel, StopSignal};
use crate::error::ParseError;
use crate::model::{ActuatorKey, Mode};

pub const HELP: &str = "commands: mode auto|manual, lamp|fan|pump on|off, all on|off, theme, help, quit";

/// One parsed console line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleInput {
    Command(OperatorCommand),
    ToggleTheme,
    Help,
    Quit,
}

fn switch(word: Option<&str>) -> Result<bool, ParseError> {
    match word {
        Some("on") => Ok(true),
        Some("off") => Ok(false),
        _ => Err(ParseError::BadSwitch),
    }
}

pub fn parse_line(line: &str) -> Result<ConsoleInput, ParseError> {
    let lower = line.trim().to_ascii_lowercase();
    let mut words = lower.split_whitespace();
    let Some(head) = words.next() else {
        return Err(ParseError::Empty);
    };
    let arg = words.next();
    if words.next().is_some() {
        return Err(ParseError::UnknownCommand);
    }

    let input = match head {
        "mode" => {
            let mode: Mode = arg.ok_or(ParseError::UnknownMode)?.parse()?;
            ConsoleInput::Command(OperatorCommand::SetMode(mode))
        }
        "all" => ConsoleInput::Command(OperatorCommand::SetAll(switch(arg)?)),
        "theme" => ConsoleInput::ToggleTheme,
        "help" | "?" => ConsoleInput::Help,
        "quit" | "exit" | "q" => ConsoleInput::Quit,
        other => match other.parse::<ActuatorKey>() {
            Ok(key) => ConsoleInput::Command(OperatorCommand::SetActuator(key, switch(arg)?)),
            Err(_) => return Err(ParseError::UnknownCommand),
        },
    };
    Ok(input)
}

/// Process lines until `quit` or end of input, then signal `stop`.
pub fn run<R: BufRead>(
    input: R,
    commands: &CommandChannel,
    stop: &StopSignal,
    prefs: &mut impl PreferenceStore,
) {
    let mut theme = prefs.load_theme();
    info!("Console ready (theme={}). {}", theme, HELP);

    for line in input.lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                warn!("Console: read failed: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(&line) {
            Ok(ConsoleInput::Command(cmd)) => block_on(commands.send(cmd)),
            Ok(ConsoleInput::ToggleTheme) => {
                theme = theme.toggled();
                match prefs.save_theme(theme) {
                    Ok(()) => info!("Theme: {}", theme),
                    Err(e) => warn!("Theme: {} (not saved: {})", theme, e),
                }
            }
            Ok(ConsoleInput::Help) => info!("{}", HELP),
            Ok(ConsoleInput::Quit) => break,
            Err(e) => warn!("Console: '{}': {}", line.trim(), e),
        }
    }

    stop.signal(());
}

/// Spawn [`run`] over stdin on its own thread.
pub fn spawn<P>(
    commands: &'static CommandChannel,
    stop: &'static StopSignal,
    mut prefs: P,
) -> io::Result<JoinHandle<()>>
where
    P: PreferenceStore + Send + 'static,
{
    std::thread::Builder::new()
        .name("console".into())
        .spawn(move || run(io::stdin().lock(), commands, stop, &mut prefs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Theme;
    use std::io::Cursor;

    #[derive(Default)]
    struct MemPrefs(Option<Theme>);

    impl PreferenceStore for MemPrefs {
        fn load_theme(&self) -> Theme {
            self.0.unwrap_or_default()
        }

        fn save_theme(&mut self, theme: Theme) -> io::Result<()> {
            self.0 = Some(theme);
            Ok(())
        }
    }

    #[test]
    fn parses_operator_commands() {
        assert_eq!(
            parse_line("mode manual").unwrap(),
            ConsoleInput::Command(OperatorCommand::SetMode(Mode::Manual))
        );
        assert_eq!(
            parse_line("  Pump ON ").unwrap(),
            ConsoleInput::Command(OperatorCommand::SetActuator(ActuatorKey::Pump, true))
        );
        assert_eq!(
            parse_line("all off").unwrap(),
            ConsoleInput::Command(OperatorCommand::SetAll(false))
        );
        assert_eq!(parse_line("theme").unwrap(), ConsoleInput::ToggleTheme);
        assert_eq!(parse_line("quit").unwrap(), ConsoleInput::Quit);
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(parse_line(""), Err(ParseError::Empty));
        assert_eq!(parse_line("lamp maybe"), Err(ParseError::BadSwitch));
        assert_eq!(parse_line("mode turbo"), Err(ParseError::UnknownMode));
        assert_eq!(parse_line("heater on"), Err(ParseError::UnknownCommand));
        assert_eq!(parse_line("fan on now"), Err(ParseError::UnknownCommand));
    }

    #[test]
    fn run_forwards_commands_and_signals_stop_on_eof() {
        let commands = CommandChannel::new();
        let stop = StopSignal::new();
        let mut prefs = MemPrefs::default();
        run(Cursor::new("mode manual\nbogus\nfan on\ntheme\n"), &commands, &stop, &mut prefs);
        assert_eq!(
            commands.try_receive().unwrap(),
            OperatorCommand::SetMode(Mode::Manual)
        );
        assert_eq!(
            commands.try_receive().unwrap(),
            OperatorCommand::SetActuator(ActuatorKey::Fan, true)
        );
        assert!(commands.try_receive().is_err());
        assert_eq!(prefs.0, Some(Theme::Light));
        assert!(stop.signaled());
    }

    #[test]
    fn quit_stops_before_remaining_lines() {
        let commands = CommandChannel::new();
        let stop = StopSignal::new();
        run(Cursor::new("quit\nall on\n"), &commands, &stop, &mut MemPrefs::default());
        assert!(commands.try_receive().is_err());
        assert!(stop.signaled());
    }
}
