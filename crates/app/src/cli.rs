use std::fmt;

use chrono::NaiveDate;

#[derive(Debug, PartialEq, Eq)]
pub enum ArgsError {
    MissingCommand,
    MissingValue { flag: &'static str },
    MissingArgument { command: &'static str, what: &'static str },
    UnknownCommand(String),
    UnknownArg(String),
    InvalidDate { flag: &'static str, raw: String },
    HelpRequested,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingCommand => write!(f, "a command is required"),
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArgument { command, what } => {
                write!(f, "{command} requires {what}")
            }
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown command: {cmd}"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDate { flag, raw } => {
                write!(f, "invalid {flag} value: {raw} (expected YYYY-MM-DD)")
            }
            ArgsError::HelpRequested => write!(f, "help requested"),
        }
    }
}

impl std::error::Error for ArgsError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Mark { label: String },
    List,
    Remote { url: Option<String> },
    Sync,
    Zakat { amount: String },
    Moon { date: Option<NaiveDate> },
    Ramadan {
        start: NaiveDate,
        end: NaiveDate,
        today: Option<NaiveDate>,
    },
    Remind { at: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub file: Option<String>,
    pub command: Command,
}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  companion [--file <progress.json>] <command>");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  mark <label>                 mark a surah as read");
    eprintln!("  list                         show recorded progress");
    eprintln!("  remote [--url <csv-url>]     show the remote sheet next to local progress");
    eprintln!("  sync                         run the configured sync direction");
    eprintln!("  zakat <amount>               zakat due on the given wealth (2.5%)");
    eprintln!("  moon [--date YYYY-MM-DD]     approximate moon phase");
    eprintln!("  ramadan --start D --end D [--today D]");
    eprintln!("  remind [--at HH:MM]          run the daily reminder until Ctrl-C");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  COMPANION_PROGRESS_FILE, COMPANION_MARK_POLICY, COMPANION_REMOTE_CSV_URL,");
    eprintln!("  COMPANION_SYNC_DIRECTION, COMPANION_SHEET_EDIT_URL, COMPANION_SHEETS_ID,");
    eprintln!("  COMPANION_SHEETS_RANGE, COMPANION_SHEETS_TOKEN, COMPANION_REMINDER_AT,");
    eprintln!("  COMPANION_NOTIFY_WEBHOOK, RUST_LOG");
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_date(raw: String, flag: &'static str) -> Result<NaiveDate, ArgsError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| ArgsError::InvalidDate { flag, raw })
}

impl Args {
    pub fn parse(argv: impl IntoIterator<Item = String>) -> Result<Self, ArgsError> {
        let mut args = argv.into_iter();
        let mut file = None;

        let command = loop {
            let Some(arg) = args.next() else {
                return Err(ArgsError::MissingCommand);
            };
            match arg.as_str() {
                "--file" => file = Some(require_value(&mut args, "--file")?),
                "--help" | "-h" => return Err(ArgsError::HelpRequested),
                other if other.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ => break arg,
            }
        };

        let command = match command.as_str() {
            "mark" => {
                // Multi-word labels may be passed unquoted.
                let words: Vec<String> = args.collect();
                if words.is_empty() {
                    return Err(ArgsError::MissingArgument {
                        command: "mark",
                        what: "a label",
                    });
                }
                Command::Mark {
                    label: words.join(" "),
                }
            }
            "list" => {
                reject_rest(&mut args)?;
                Command::List
            }
            "sync" => {
                reject_rest(&mut args)?;
                Command::Sync
            }
            "remote" => {
                let mut url = None;
                while let Some(arg) = args.next() {
                    match arg.as_str() {
                        "--url" => url = Some(require_value(&mut args, "--url")?),
                        _ => return Err(ArgsError::UnknownArg(arg)),
                    }
                }
                Command::Remote { url }
            }
            "zakat" => {
                let amount = args.next().ok_or(ArgsError::MissingArgument {
                    command: "zakat",
                    what: "an amount",
                })?;
                reject_rest(&mut args)?;
                Command::Zakat { amount }
            }
            "moon" => {
                let mut date = None;
                while let Some(arg) = args.next() {
                    match arg.as_str() {
                        "--date" => date = Some(parse_date(require_value(&mut args, "--date")?, "--date")?),
                        _ => return Err(ArgsError::UnknownArg(arg)),
                    }
                }
                Command::Moon { date }
            }
            "ramadan" => {
                let (mut start, mut end, mut today) = (None, None, None);
                while let Some(arg) = args.next() {
                    match arg.as_str() {
                        "--start" => start = Some(parse_date(require_value(&mut args, "--start")?, "--start")?),
                        "--end" => end = Some(parse_date(require_value(&mut args, "--end")?, "--end")?),
                        "--today" => today = Some(parse_date(require_value(&mut args, "--today")?, "--today")?),
                        _ => return Err(ArgsError::UnknownArg(arg)),
                    }
                }
                Command::Ramadan {
                    start: start.ok_or(ArgsError::MissingValue { flag: "--start" })?,
                    end: end.ok_or(ArgsError::MissingValue { flag: "--end" })?,
                    today,
                }
            }
            "remind" => {
                let mut at = None;
                while let Some(arg) = args.next() {
                    match arg.as_str() {
                        "--at" => at = Some(require_value(&mut args, "--at")?),
                        _ => return Err(ArgsError::UnknownArg(arg)),
                    }
                }
                Command::Remind { at }
            }
            _ => return Err(ArgsError::UnknownCommand(command)),
        };

        Ok(Self { file, command })
    }
}

fn reject_rest(args: &mut impl Iterator<Item = String>) -> Result<(), ArgsError> {
    match args.next() {
        Some(extra) => Err(ArgsError::UnknownArg(extra)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, ArgsError> {
        Args::parse(args.iter().map(|s| (*s).to_owned()))
    }

    #[test]
    fn mark_joins_words() {
        let args = parse(&["--file", "p.json", "mark", "Al", "Fatiha"]).unwrap();
        assert_eq!(args.file.as_deref(), Some("p.json"));
        assert_eq!(
            args.command,
            Command::Mark {
                label: "Al Fatiha".into()
            }
        );
    }

    #[test]
    fn mark_requires_label() {
        assert_eq!(
            parse(&["mark"]),
            Err(ArgsError::MissingArgument {
                command: "mark",
                what: "a label"
            })
        );
    }

    #[test]
    fn ramadan_needs_both_bounds() {
        assert_eq!(
            parse(&["ramadan", "--start", "2025-03-01"]),
            Err(ArgsError::MissingValue { flag: "--end" })
        );
        let args = parse(&["ramadan", "--start", "2025-03-01", "--end", "2025-03-30"]).unwrap();
        assert!(matches!(args.command, Command::Ramadan { today: None, .. }));
    }

    #[test]
    fn rejects_bad_dates_and_unknowns() {
        assert!(matches!(
            parse(&["moon", "--date", "March"]),
            Err(ArgsError::InvalidDate { flag: "--date", .. })
        ));
        assert_eq!(
            parse(&["dance"]),
            Err(ArgsError::UnknownCommand("dance".into()))
        );
        assert_eq!(
            parse(&["list", "extra"]),
            Err(ArgsError::UnknownArg("extra".into()))
        );
        assert_eq!(parse(&[]), Err(ArgsError::MissingCommand));
    }

    #[test]
    fn help_flag() {
        assert_eq!(parse(&["--help"]), Err(ArgsError::HelpRequested));
    }
}
