//! Headless script commands
//!
//! One command per line. Blank lines and lines starting with `#` are
//! skipped. Commands that act on a surface take an optional leading
//! `drawer` or `frame` argument and default to the drawer.
//!
//! ```text
//! screen-on | screen-off | lock | unlock
//! preview on|off
//! show | close | back | handle
//! scroll <dist> [initial] [left|right]
//! release
//! move [surface] <from> <to>
//! hold [surface] on|off
//! edit [surface] <position>
//! remove [surface] <id>
//! confirm yes|no
//! click [surface] [trigger]
//! add
//! set <key> <json>
//! tick <ms>
//! state | connect | disconnect | quit
//! ```

use std::str::FromStr;

use lsw_core::prelude::*;
use lsw_core::Gravity;
use serde::Serialize;
use serde_json::Value;

/// Longest single `tick`. Time is stepped frame by frame, so this bounds
/// the work one line can cause.
pub const MAX_TICK_MS: u64 = 60_000;

/// Surface a command acts on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    #[default]
    Drawer,
    Frame,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    ScreenOn,
    ScreenOff,
    /// Keyguard locked
    Lock,
    /// Keyguard dismissed
    Unlock,
    /// Keep the frame on screen whatever the keyguard says
    Preview {
        shown: bool,
    },
    Show,
    Close,
    Back,
    Handle,
    Scroll {
        dist: f32,
        initial: bool,
        from: Gravity,
    },
    Release,
    Move {
        target: Target,
        from: usize,
        to: usize,
    },
    Hold {
        target: Target,
        held: bool,
    },
    Edit {
        target: Target,
        position: usize,
    },
    Remove {
        target: Target,
        id: i32,
    },
    /// Answer the pending removal confirmation
    Confirm {
        remove: bool,
    },
    Click {
        target: Target,
        trigger: bool,
    },
    /// Start the add-widget flow from the drawer
    Add,
    Set {
        key: String,
        value: Value,
    },
    Tick {
        ms: u64,
    },
    State,
    Connect,
    Disconnect,
    Quit,
}

impl Command {
    /// Parse one script line. `Ok(None)` for blank and comment lines.
    pub fn parse(line_no: usize, line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };
        let mut args = Args::new(line_no, name, rest);

        let command = match name {
            "screen-on" => Self::ScreenOn,
            "screen-off" => Self::ScreenOff,
            "lock" => Self::Lock,
            "unlock" => Self::Unlock,
            "preview" => Self::Preview {
                shown: args.switch()?,
            },
            "show" => Self::Show,
            "close" => Self::Close,
            "back" => Self::Back,
            "handle" => Self::Handle,
            "scroll" => {
                let dist = args.number("distance")?;
                let mut initial = false;
                let mut from = Gravity::Left;
                while let Some(word) = args.next_word() {
                    match word {
                        "initial" => initial = true,
                        "left" => from = Gravity::Left,
                        "right" => from = Gravity::Right,
                        other => return Err(args.error(format!("unexpected '{}'", other))),
                    }
                }
                Self::Scroll {
                    dist,
                    initial,
                    from,
                }
            }
            "release" => Self::Release,
            "move" => Self::Move {
                target: args.target(),
                from: args.number("from")?,
                to: args.number("to")?,
            },
            "hold" => {
                let target = args.target();
                let held = args.switch()?;
                Self::Hold { target, held }
            }
            "edit" => Self::Edit {
                target: args.target(),
                position: args.number("position")?,
            },
            "remove" => Self::Remove {
                target: args.target(),
                id: args.number("id")?,
            },
            "confirm" => Self::Confirm {
                remove: args.switch()?,
            },
            "click" => {
                let target = args.target();
                let trigger = match args.next_word() {
                    None => false,
                    Some("trigger") => true,
                    Some(other) => return Err(args.error(format!("unexpected '{}'", other))),
                };
                Self::Click { target, trigger }
            }
            "add" => Self::Add,
            "set" => {
                let key = args
                    .next_word()
                    .ok_or_else(|| args.error("missing key"))?
                    .to_string();
                let raw = args.remainder();
                if raw.is_empty() {
                    return Err(args.error("missing value"));
                }
                // Bare words are taken as strings
                let value = serde_json::from_str(raw)
                    .unwrap_or_else(|_| Value::String(raw.to_string()));
                return Ok(Some(Self::Set { key, value }));
            }
            "tick" => {
                let ms = args.number("milliseconds")?;
                if ms > MAX_TICK_MS {
                    return Err(args.error(format!("at most {} ms per tick", MAX_TICK_MS)));
                }
                Self::Tick { ms }
            }
            "state" => Self::State,
            "connect" => Self::Connect,
            "disconnect" => Self::Disconnect,
            "quit" | "q" => Self::Quit,
            other => return Err(Error::command(line_no, format!("unknown command '{}'", other))),
        };

        args.finish()?;
        Ok(Some(command))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ScreenOn => "screen-on",
            Self::ScreenOff => "screen-off",
            Self::Lock => "lock",
            Self::Unlock => "unlock",
            Self::Preview { .. } => "preview",
            Self::Show => "show",
            Self::Close => "close",
            Self::Back => "back",
            Self::Handle => "handle",
            Self::Scroll { .. } => "scroll",
            Self::Release => "release",
            Self::Move { .. } => "move",
            Self::Hold { .. } => "hold",
            Self::Edit { .. } => "edit",
            Self::Remove { .. } => "remove",
            Self::Confirm { .. } => "confirm",
            Self::Click { .. } => "click",
            Self::Add => "add",
            Self::Set { .. } => "set",
            Self::Tick { .. } => "tick",
            Self::State => "state",
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
            Self::Quit => "quit",
        }
    }
}

/// Cursor over a command's arguments
struct Args<'a> {
    line_no: usize,
    command: &'a str,
    rest: &'a str,
}

impl<'a> Args<'a> {
    fn new(line_no: usize, command: &'a str, rest: &'a str) -> Self {
        Self {
            line_no,
            command,
            rest,
        }
    }

    fn error(&self, message: impl std::fmt::Display) -> Error {
        Error::command(self.line_no, format!("{}: {}", self.command, message))
    }

    fn peek_word(&self) -> Option<&'a str> {
        self.rest.split_whitespace().next()
    }

    fn next_word(&mut self) -> Option<&'a str> {
        let word = self.peek_word()?;
        self.rest = self.rest.trim_start()[word.len()..].trim_start();
        Some(word)
    }

    fn remainder(&self) -> &'a str {
        self.rest.trim()
    }

    fn target(&mut self) -> Target {
        match self.peek_word() {
            Some("frame") => {
                self.next_word();
                Target::Frame
            }
            Some("drawer") => {
                self.next_word();
                Target::Drawer
            }
            _ => Target::Drawer,
        }
    }

    fn number<T: FromStr>(&mut self, what: &str) -> Result<T> {
        let word = self
            .next_word()
            .ok_or_else(|| self.error(format!("missing {}", what)))?;
        word.parse()
            .map_err(|_| self.error(format!("invalid {} '{}'", what, word)))
    }

    fn switch(&mut self) -> Result<bool> {
        match self.next_word() {
            Some("on" | "yes" | "true") => Ok(true),
            Some("off" | "no" | "false") => Ok(false),
            Some(other) => Err(self.error(format!("expected yes/no, got '{}'", other))),
            None => Err(self.error("missing yes/no")),
        }
    }

    fn finish(&self) -> Result<()> {
        match self.peek_word() {
            Some(extra) => Err(self.error(format!("unexpected '{}'", extra))),
            None => Ok(()),
        }
    }
}
