//! Textual command dispatch.
//!
//! A [`CommandTable`] binds command names to handlers sharing one mutable
//! context. Commands arrive either as a pre-split argument vector, a single
//! line of text or a stream of lines.

use std::io::BufRead;

use log::{debug, trace};

use crate::error::{Error, Result};

/// Command handler, called with the parameters following the command name.
pub type Handler<C> = fn(&[&str], &mut C) -> Result<()>;

/// Named command handler.
pub struct Command<C> {
    pub name: &'static str,
    pub handler: Handler<C>,
}

impl<C> Command<C> {
    pub const fn new(name: &'static str, handler: Handler<C>) -> Self {
        Self { name, handler }
    }
}

/// State shared by all commands of a table.
pub trait Context {
    /// Release the resources held by the context.
    fn close(&mut self);
}

/// Command table for one device session.
///
/// Lookup is a linear scan in table order, so the first of multiple commands
/// with the same name shadows all later ones.
pub struct CommandTable<C> {
    context: C,
    commands: Vec<Command<C>>,
}

impl<C> CommandTable<C> {
    pub fn new(context: C, commands: Vec<Command<C>>) -> Self {
        Self { context, commands }
    }

    #[cfg(test)]
    pub fn context(&self) -> &C {
        &self.context
    }
}

/// Dispatch entry points of a command table.
pub trait Dispatch {
    /// Run the command named by the first argument with the remaining ones.
    fn dispatch_vector(&mut self, arguments: &[&str]) -> Result<()>;

    /// Names of all commands, in lookup order.
    fn command_names(&self) -> Vec<&'static str>;

    /// Release the device behind the table.
    fn close(&mut self);

    /// Run a whitespace separated command line.
    ///
    /// Blank lines are ignored.
    fn dispatch_line(&mut self, line: &str) -> Result<()> {
        let tokens = split_line(line)?;
        if tokens.is_empty() {
            return Ok(());
        }

        self.dispatch_vector(&tokens)
    }

    /// Run every line of the input, stopping at the first failing command.
    fn dispatch_stream(&mut self, input: &mut dyn BufRead) -> Result<()> {
        let mut line = String::new();

        loop {
            line.clear();
            if input.read_line(&mut line)? == 0 {
                return Ok(());
            }

            trace!("input line: {:?}", line.trim_end());

            self.dispatch_line(&line)?;
        }
    }
}

impl<C: Context> Dispatch for CommandTable<C> {
    fn dispatch_vector(&mut self, arguments: &[&str]) -> Result<()> {
        let (name, parameters) = match arguments.split_first() {
            Some(split) => split,
            None => return Err(Error::UnknownCommand(String::new())),
        };

        let handler = match self.commands.iter().find(|command| command.name == *name) {
            Some(command) => command.handler,
            None => return Err(Error::UnknownCommand(name.to_string())),
        };

        debug!("dispatching {} {:?}", name, parameters);

        handler(parameters, &mut self.context)
    }

    fn command_names(&self) -> Vec<&'static str> {
        self.commands.iter().map(|command| command.name).collect()
    }

    fn close(&mut self) {
        self.context.close();
    }
}

/// Split a line into whitespace separated tokens.
fn split_line(line: &str) -> Result<Vec<&str>> {
    let mut tokens = Vec::new();
    tokens.try_reserve(line.split_whitespace().count()).map_err(|_| Error::OutOfMemory)?;
    tokens.extend(line.split_whitespace());
    Ok(tokens)
}

/// Parse an integer leniently.
///
/// Leading whitespace and an optional sign are accepted, followed by the
/// longest run of decimal digits. Trailing garbage is ignored, text without
/// digits is `0` and out of range values saturate.
pub fn parse_int(text: &str) -> i32 {
    let trimmed = text.trim_start_matches(|c: char| c.is_ascii_whitespace());
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let mut value: i32 = 0;
    for digit in digits.bytes().take_while(u8::is_ascii_digit) {
        let digit = i32::from(digit - b'0');
        value = value.saturating_mul(10);
        value = if negative { value.saturating_sub(digit) } else { value.saturating_add(digit) };
    }

    if text.parse::<i32>().is_err() {
        debug!("parameter {:?} read as {}", text, value);
    }

    value
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[derive(Default)]
    struct Journal {
        calls: Vec<String>,
        closed: bool,
    }

    impl Context for Journal {
        fn close(&mut self) {
            self.closed = true;
        }
    }

    fn record(arguments: &[&str], journal: &mut Journal) -> Result<()> {
        journal.calls.push(arguments.join(","));
        Ok(())
    }

    fn shadowed(_: &[&str], journal: &mut Journal) -> Result<()> {
        journal.calls.push(String::from("shadowed"));
        Ok(())
    }

    fn fail(_: &[&str], _: &mut Journal) -> Result<()> {
        Err(Error::Transmission(String::from("broken pipe")))
    }

    fn table() -> CommandTable<Journal> {
        CommandTable::new(Journal::default(), vec![
            Command::new("record", record),
            Command::new("fail", fail),
            Command::new("record", shadowed),
        ])
    }

    #[test]
    fn vector_passes_parameters() {
        let mut table = table();
        table.dispatch_vector(&["record", "1", "two"]).unwrap();
        assert_eq!(table.context().calls, vec!["1,two"]);
    }

    #[test]
    fn first_match_wins() {
        let mut table = table();
        table.dispatch_vector(&["record"]).unwrap();
        assert_eq!(table.context().calls, vec![""]);
    }

    #[test]
    fn unknown_command() {
        let mut table = table();
        let err = table.dispatch_vector(&["nosuchcommand", "1"]).unwrap_err();
        assert!(matches!(err, Error::UnknownCommand(name) if name == "nosuchcommand"));

        let err = table.dispatch_line("nosuchcommand").unwrap_err();
        assert!(matches!(err, Error::UnknownCommand(_)));
    }

    #[test]
    fn empty_vector_is_unknown() {
        let mut table = table();
        assert!(matches!(table.dispatch_vector(&[]), Err(Error::UnknownCommand(_))));
    }

    #[test]
    fn names_are_exact() {
        let mut table = table();
        assert!(table.dispatch_vector(&["Record"]).is_err());
        assert!(table.dispatch_vector(&["rec"]).is_err());
        assert!(table.context().calls.is_empty());
    }

    #[test]
    fn blank_line_is_noop() {
        let mut table = table();
        table.dispatch_line("").unwrap();
        table.dispatch_line(" \t  \n").unwrap();
        assert!(table.context().calls.is_empty());
    }

    #[test]
    fn line_splits_on_whitespace_runs() {
        let mut table = table();
        table.dispatch_line("  record\t 1   2 \n").unwrap();
        assert_eq!(table.context().calls, vec!["1,2"]);
    }

    #[test]
    fn stream_runs_all_lines() {
        let mut table = table();
        let mut input = Cursor::new("record a\n\n   \nrecord b c\nrecord");
        table.dispatch_stream(&mut input).unwrap();
        assert_eq!(table.context().calls, vec!["a", "b,c", ""]);
    }

    #[test]
    fn stream_stops_at_first_failure() {
        let mut table = table();
        let mut input = Cursor::new("record first\nfail\nrecord third\n");
        let err = table.dispatch_stream(&mut input).unwrap_err();
        assert!(matches!(err, Error::Transmission(_)));
        assert_eq!(table.context().calls, vec!["first"]);
    }

    #[test]
    fn stream_reports_unreadable_input() {
        let mut table = table();
        let mut input = Cursor::new(&b"record ok\n\xff\xfe\nrecord never\n"[..]);
        let err = table.dispatch_stream(&mut input).unwrap_err();
        assert!(matches!(err, Error::Input(_)));
        assert_eq!(table.context().calls, vec!["ok"]);
    }

    #[test]
    fn empty_stream_succeeds() {
        let mut table = table();
        table.dispatch_stream(&mut Cursor::new("")).unwrap();
        assert!(table.context().calls.is_empty());
    }

    #[test]
    fn close_reaches_context() {
        let mut table = table();
        table.close();
        assert!(table.context().closed);
    }

    #[test]
    fn names_in_lookup_order() {
        let table = table();
        assert_eq!(table.command_names(), vec!["record", "fail", "record"]);
    }

    #[test]
    fn parse_int_is_lenient() {
        assert_eq!(parse_int("42"), 42);
        assert_eq!(parse_int("  7"), 7);
        assert_eq!(parse_int("+3"), 3);
        assert_eq!(parse_int("-12"), -12);
        assert_eq!(parse_int("10abc"), 10);
        assert_eq!(parse_int("abc"), 0);
        assert_eq!(parse_int(""), 0);
        assert_eq!(parse_int("-"), 0);
        assert_eq!(parse_int("0x10"), 0);
    }

    #[test]
    fn parse_int_saturates() {
        assert_eq!(parse_int("99999999999"), i32::MAX);
        assert_eq!(parse_int("-99999999999"), i32::MIN);
    }
}
