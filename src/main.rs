//! ITE 829x keyboard backlight CLI tool
//!
//! Commands are taken from the command line first, then read line by line
//! from STDIN (or a file) until the input ends or a command fails.

use std::fs::File;
use std::io::{self, BufReader};
use std::process;

use clap::builder::EnumValueParser;
use clap::{
    crate_description, crate_name, crate_version, Arg, ArgAction, ArgMatches, Command, ValueEnum,
};
use hidapi::{HidApi, HidDevice};
use log::{debug, info};

use crate::command::Dispatch;
use crate::controller::HidController;
use crate::error::{Error, Result};
use crate::ite_829x::Ite829x;

mod command;
mod controller;
mod error;
mod ite_829x;

/// Exit code when no supported keyboard could be opened.
const EXIT_NO_KEYBOARD: i32 = 2;

/// Exit code when the HID library is unusable.
const EXIT_HID_FAILURE: i32 = 4;

/// Supported keyboard controllers.
#[derive(ValueEnum, PartialEq, Eq, Debug, Copy, Clone)]
enum Keyboard {
    #[value(name = "ite829x")]
    Ite829x,
}

impl Keyboard {
    /// Get the controller for a keyboard.
    fn controller(&self) -> Box<dyn HidController> {
        match self {
            Self::Ite829x => Box::new(Ite829x),
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let matches = cli().get_matches();
    process::exit(run(&matches));
}

/// Open the keyboard, run all commands and close it again.
fn run(matches: &ArgMatches) -> i32 {
    let api = match HidApi::new() {
        Ok(api) => api,
        Err(err) => {
            eprintln!("\x1b[31mError:\x1b[0m unable to access HID: {err}");
            return EXIT_HID_FAILURE;
        },
    };

    let forced = matches.get_one::<Keyboard>("keyboard").copied();
    let (keyboard, device) = match open_keyboard(&api, forced) {
        Ok(opened) => opened,
        Err(err) => {
            eprintln!("\x1b[31mError:\x1b[0m {err}");
            return EXIT_NO_KEYBOARD;
        },
    };

    info!("opened {:?} keyboard", keyboard);

    let mut commands = keyboard.controller().command_table(device);
    let result = process_commands(commands.as_mut(), matches);
    commands.close();

    match result {
        Ok(()) => 0,
        Err(err) => {
            debug!("command failed with status {}", err.status());
            eprintln!("\x1b[31mError:\x1b[0m {err}");
            if let Error::UnknownCommand(_) = err {
                eprintln!("Available commands: {}", commands.command_names().join(", "));
            }
            err.exit_code()
        },
    }
}

/// Open the requested keyboard, or the first supported one present.
fn open_keyboard(
    api: &HidApi,
    forced: Option<Keyboard>,
) -> std::result::Result<(Keyboard, HidDevice), String> {
    let candidates = match forced {
        Some(keyboard) => vec![keyboard],
        None => Keyboard::value_variants().to_vec(),
    };

    for keyboard in &candidates {
        let controller = keyboard.controller();
        let (vid, pid) = (controller.vendor_id(), controller.product_id());

        let present = api
            .device_list()
            .any(|info| info.vendor_id() == vid && info.product_id() == pid);
        if !present && forced.is_none() {
            debug!("no {:?} keyboard [{:04x}:{:04x}]", keyboard, vid, pid);
            continue;
        }

        return match api.open(vid, pid) {
            Ok(device) => Ok((*keyboard, device)),
            Err(err) => Err(format!(
                "unable to open keyboard [{vid:04x}:{pid:04x}]: {err} (root permissions required)"
            )),
        };
    }

    Err(String::from("no supported keyboard found"))
}

/// Run the command line command, then every command from the input.
fn process_commands(commands: &mut dyn Dispatch, matches: &ArgMatches) -> Result<()> {
    let arguments: Vec<&str> = matches
        .get_many::<String>("command")
        .map(|values| values.map(String::as_str).collect())
        .unwrap_or_default();

    if !arguments.is_empty() {
        commands.dispatch_vector(&arguments)?;
    }

    if matches.get_flag("no-input") {
        return Ok(());
    }

    match matches.get_one::<String>("input").map(String::as_str) {
        None | Some("-") => commands.dispatch_stream(&mut io::stdin().lock()),
        Some(path) => {
            let file = File::open(path)?;
            commands.dispatch_stream(&mut BufReader::new(file))
        },
    }
}

/// Get clap CLI parameters.
fn cli() -> Command {
    Command::new(crate_name!())
        .version(crate_version!())
        .about(crate_description!())
        .arg(
            Arg::new("keyboard")
                .help("Keyboard controller, detected automatically by default")
                .long("keyboard")
                .short('k')
                .ignore_case(true)
                .value_parser(EnumValueParser::<Keyboard>::new()),
        )
        .arg(
            Arg::new("input")
                .help("Read further commands from a file ['-' for STDIN]")
                .long("input")
                .short('i')
                .value_name("FILE")
                .conflicts_with("no-input"),
        )
        .arg(
            Arg::new("no-input")
                .help("Only run the command given on the command line")
                .long("no-input")
                .short('n')
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("command")
                .help("Command and its parameters, e.g. `brightness 10` or `led 5 255 0 128`")
                .num_args(1..)
                .trailing_var_arg(true)
                .allow_hyphen_values(true),
        )
}
