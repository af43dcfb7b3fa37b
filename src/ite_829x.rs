//! ITE Device(829x) keyboard backlight control.
//!
//! The protocol was captured from the Clevo Control Center. Every command is
//! a single seven byte feature report starting with the report ID `0xcc`:
//!
//! ```text
//! brightness+speed   cc 09 rr ss 00 00 7f
//! effect             cc e1 e2 00 00 00 ll
//! reset              cc 00 0c 00 00 00 7f
//! led color          cc 01 ii rr gg bb 7f
//! ```

use bytes::{BufMut, Bytes, BytesMut};
use hidapi::HidDevice;
use log::debug;

use crate::command::{parse_int, Command, CommandTable, Context, Dispatch};
use crate::controller::{FeatureReportSink, HidController};
use crate::error::{Error, Result};

/// Length of every report.
const REPORT_LEN: usize = 7;

/// Report ID.
const REPORT_ID: u8 = 0xcc;

/// Brightness is a scale from 1 to 10 with 0 being off.
///
/// Values above 10 have the same effect as 10 on the device.
const MAX_BRIGHTNESS: i32 = 0x0a;

/// Effect animation speed.
const MAX_SPEED: i32 = 0x02;

pub struct Ite829x;

impl HidController for Ite829x {
    fn vendor_id(&self) -> u16 {
        0x048d
    }

    fn product_id(&self) -> u16 {
        0x8910
    }

    fn command_table(&self, device: HidDevice) -> Box<dyn Dispatch> {
        Box::new(command_table(device))
    }
}

/// Keyboard effects.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Effect {
    Wave,
    Breathe,
    Scan,
    Blink,
    Random,
    Ripple,
    Snake,
}

impl Effect {
    /// Look up an effect by its command line ID.
    pub fn from_id(id: i32) -> Option<Self> {
        match id {
            0 => Some(Self::Wave),
            1 => Some(Self::Breathe),
            2 => Some(Self::Scan),
            3 => Some(Self::Blink),
            4 => Some(Self::Random),
            5 => Some(Self::Ripple),
            6 => Some(Self::Snake),
            _ => None,
        }
    }

    /// Effect selector bytes and the trailing report byte.
    ///
    /// There is no apparent pattern to these values.
    fn bytes(self) -> (u8, u8, u8) {
        match self {
            Self::Wave => (0x00, 0x04, 0x7f),
            Self::Breathe => (0x0a, 0x00, 0x7f),
            Self::Scan => (0x00, 0x0a, 0x7f),
            Self::Blink => (0x0b, 0x00, 0x7f),
            Self::Random => (0x00, 0x09, 0x00),
            Self::Ripple => (0x07, 0x00, 0x00),
            Self::Snake => (0x00, 0x0b, 0x53),
        }
    }
}

/// LED color.
#[derive(Default, Debug, Copy, Clone)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Backlight state of an opened keyboard.
pub struct Backlight<T> {
    keyboard: Option<T>,
    brightness: i32,
    speed: i32,
}

impl<T> Backlight<T> {
    pub fn new(keyboard: T) -> Self {
        Self { keyboard: Some(keyboard), brightness: 0, speed: 0 }
    }

    /// Last brightness requested.
    pub fn brightness(&self) -> i32 {
        self.brightness
    }

    /// Last effect speed requested.
    pub fn speed(&self) -> i32 {
        self.speed
    }
}

impl<T: FeatureReportSink> Backlight<T> {
    fn ensure_open(&self) -> Result<()> {
        match self.keyboard {
            Some(_) => Ok(()),
            None => Err(Error::NoDevice),
        }
    }

    /// Send the stored brightness and speed in one report.
    pub fn send_brightness_and_speed(&mut self) -> Result<()> {
        self.ensure_open()?;

        self.brightness = self.brightness.clamp(0, MAX_BRIGHTNESS);
        self.speed = self.speed.clamp(0, MAX_SPEED);

        let report = brightness_and_speed_report(self.brightness as u8, self.speed as u8);
        self.send(&report)
    }

    fn send(&mut self, report: &[u8]) -> Result<()> {
        let keyboard = self.keyboard.as_mut().ok_or(Error::NoDevice)?;

        debug!("sending feature report {:02x?}", report);

        keyboard.send_feature_report(report)
    }
}

impl<T> Context for Backlight<T> {
    fn close(&mut self) {
        if self.keyboard.take().is_some() {
            debug!("keyboard closed at brightness {}, speed {}", self.brightness(), self.speed());
        }
    }
}

/// Bind all keyboard commands to a device.
pub fn command_table<T: FeatureReportSink>(keyboard: T) -> CommandTable<Backlight<T>> {
    CommandTable::new(Backlight::new(keyboard), vec![
        Command::new("brightness+speed", set_brightness_and_speed),
        Command::new("brightness", set_brightness),
        Command::new("speed", set_speed),
        Command::new("effects", set_effects),
        Command::new("reset", reset),
        Command::new("led", set_led_color),
    ])
}

/// Ensure a command received enough parameters.
fn require(command: &'static str, arguments: &[&str], expected: usize) -> Result<()> {
    if arguments.len() < expected {
        return Err(Error::ArgumentCount { command, expected, actual: arguments.len() });
    }

    Ok(())
}

fn set_brightness_and_speed<T>(arguments: &[&str], backlight: &mut Backlight<T>) -> Result<()>
where
    T: FeatureReportSink,
{
    backlight.ensure_open()?;
    require("brightness+speed", arguments, 2)?;

    backlight.brightness = parse_int(arguments[0]);
    backlight.speed = parse_int(arguments[1]);

    backlight.send_brightness_and_speed()
}

/// Change brightness, keeping the last effect speed.
fn set_brightness<T>(arguments: &[&str], backlight: &mut Backlight<T>) -> Result<()>
where
    T: FeatureReportSink,
{
    backlight.ensure_open()?;
    require("brightness", arguments, 1)?;

    backlight.brightness = parse_int(arguments[0]);

    backlight.send_brightness_and_speed()
}

/// Change effect speed, keeping the last brightness.
fn set_speed<T>(arguments: &[&str], backlight: &mut Backlight<T>) -> Result<()>
where
    T: FeatureReportSink,
{
    backlight.ensure_open()?;
    require("speed", arguments, 1)?;

    backlight.speed = parse_int(arguments[0]);

    backlight.send_brightness_and_speed()
}

fn set_effects<T>(arguments: &[&str], backlight: &mut Backlight<T>) -> Result<()>
where
    T: FeatureReportSink,
{
    backlight.ensure_open()?;
    require("effects", arguments, 1)?;

    let id = parse_int(arguments[0]);
    let effect = Effect::from_id(id).ok_or(Error::UnknownValue { kind: "effect", value: id })?;

    debug!("selecting effect {:?}", effect);

    backlight.send(&effect_report(effect))
}

/// Turn off all LEDs, clear their colors and stop any effect.
///
/// After a reset every key must be reconfigured.
fn reset<T>(_arguments: &[&str], backlight: &mut Backlight<T>) -> Result<()>
where
    T: FeatureReportSink,
{
    backlight.ensure_open()?;
    backlight.send(&reset_report())
}

/// Set the color of a single LED.
///
/// Parameters are truncated to a byte without any range check. Some keys are
/// lit by more than one LED, e.g. Escape through PageDown are 0..=19.
fn set_led_color<T>(arguments: &[&str], backlight: &mut Backlight<T>) -> Result<()>
where
    T: FeatureReportSink,
{
    backlight.ensure_open()?;
    require("led", arguments, 4)?;

    let led = parse_int(arguments[0]) as u8;
    let color = Rgb {
        r: parse_int(arguments[1]) as u8,
        g: parse_int(arguments[2]) as u8,
        b: parse_int(arguments[3]) as u8,
    };

    backlight.send(&led_report(led, color))
}

/// Convert brightness and speed to a report.
fn brightness_and_speed_report(brightness: u8, speed: u8) -> Bytes {
    let mut buf = BytesMut::with_capacity(REPORT_LEN);

    buf.put_slice(&[REPORT_ID, 0x09]);
    buf.put_u8(brightness);
    buf.put_u8(speed);
    buf.put_slice(&[0x00, 0x00, 0x7f]);

    buf.freeze()
}

/// Convert an effect to a report.
fn effect_report(effect: Effect) -> Bytes {
    let (effect1, effect2, last) = effect.bytes();

    let mut buf = BytesMut::with_capacity(REPORT_LEN);

    buf.put_u8(REPORT_ID);
    buf.put_u8(effect1);
    buf.put_u8(effect2);

    // Padding.
    buf.put_slice(&[0x00; 3]);

    buf.put_u8(last);

    buf.freeze()
}

fn reset_report() -> Bytes {
    Bytes::from_static(&[REPORT_ID, 0x00, 0x0c, 0x00, 0x00, 0x00, 0x7f])
}

/// Convert an LED color to a report.
fn led_report(led: u8, color: Rgb) -> Bytes {
    let mut buf = BytesMut::with_capacity(REPORT_LEN);

    buf.put_slice(&[REPORT_ID, 0x01]);
    buf.put_u8(led);
    buf.put_u8(color.r);
    buf.put_u8(color.g);
    buf.put_u8(color.b);
    buf.put_u8(0x7f);

    buf.freeze()
}
