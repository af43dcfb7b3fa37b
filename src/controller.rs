//! Keyboard controller abstraction.

use hidapi::HidDevice;

use crate::command::Dispatch;
use crate::error::{Error, Result};

/// Channel to an opened device, accepting HID feature reports.
pub trait FeatureReportSink {
    /// Transmit a single feature report.
    fn send_feature_report(&mut self, report: &[u8]) -> Result<()>;
}

impl FeatureReportSink for HidDevice {
    fn send_feature_report(&mut self, report: &[u8]) -> Result<()> {
        HidDevice::send_feature_report(self, report)
            .map_err(|err| Error::Transmission(err.to_string()))
    }
}

/// HID keyboard lighting controller.
pub(crate) trait HidController {
    /// HID vendor ID.
    fn vendor_id(&self) -> u16;

    /// HID product ID.
    fn product_id(&self) -> u16;

    /// Bind the controller's commands to an opened device.
    fn command_table(&self, device: HidDevice) -> Box<dyn Dispatch>;
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    /// Sink storing every report it is asked to send.
    #[derive(Clone, Default)]
    pub struct RecordingSink {
        reports: Rc<RefCell<Vec<Vec<u8>>>>,
    }

    impl RecordingSink {
        pub fn reports(&self) -> Vec<Vec<u8>> {
            self.reports.borrow().clone()
        }
    }

    impl FeatureReportSink for RecordingSink {
        fn send_feature_report(&mut self, report: &[u8]) -> Result<()> {
            self.reports.borrow_mut().push(report.to_vec());
            Ok(())
        }
    }

    /// Sink rejecting every report.
    pub struct FailingSink;

    impl FeatureReportSink for FailingSink {
        fn send_feature_report(&mut self, _report: &[u8]) -> Result<()> {
            Err(Error::Transmission(String::from("device disconnected")))
        }
    }
}
