//! Driver error types.

use core::fmt;

/// Errors that can occur during generic driver operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverError {
    /// The hardware device was not found or did not respond.
    DeviceNotFound,
    /// Driver initialization failed.
    InitFailed,
    /// A hardware operation timed out.
    Timeout,
    /// The requested operation is not supported by this driver.
    Unsupported,
    /// The driver is not in a valid state for this operation.
    InvalidState,
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeviceNotFound => f.write_str("device not found"),
            Self::InitFailed => f.write_str("driver initialization failed"),
            Self::Timeout => f.write_str("hardware operation timed out"),
            Self::Unsupported => f.write_str("operation not supported"),
            Self::InvalidState => f.write_str("invalid driver state"),
        }
    }
}

/// Bring-up failures of the virtio pointer device.
///
/// Every variant demotes the pointer subsystem to the HAL fallback; none of
/// them is retried or surfaced to pointer consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerError {
    /// No slot carries an absolute pointer device.
    DeviceNotFound,
    /// The device's event queue is smaller than the driver needs.
    QueueTooSmall {
        /// Largest queue the device supports.
        max: u32,
    },
    /// The device cleared `FEATURES_OK` after feature negotiation.
    FeaturesRejected {
        /// Status register read back after negotiation.
        status: u32,
    },
    /// The device reported a failure after activation.
    DeviceFailure {
        /// Status register read back after `DRIVER_OK`.
        status: u32,
    },
    /// The device did not finish its reset within the spin budget.
    DeviceTimeout,
    /// The static queue memory has already been handed to another driver.
    ArenaUnavailable,
}

impl fmt::Display for PointerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeviceNotFound => f.write_str("no absolute pointer device found"),
            Self::QueueTooSmall { max } => write!(f, "event queue too small (device max {max})"),
            Self::FeaturesRejected { status } => {
                write!(f, "device rejected features (status {status:#x})")
            }
            Self::DeviceFailure { status } => {
                write!(f, "device reported failure (status {status:#x})")
            }
            Self::DeviceTimeout => f.write_str("device reset timed out"),
            Self::ArenaUnavailable => f.write_str("queue memory already in use"),
        }
    }
}

impl From<PointerError> for DriverError {
    fn from(err: PointerError) -> Self {
        match err {
            PointerError::DeviceNotFound => Self::DeviceNotFound,
            PointerError::QueueTooSmall { .. } => Self::Unsupported,
            PointerError::FeaturesRejected { .. } | PointerError::DeviceFailure { .. } => {
                Self::InitFailed
            }
            PointerError::DeviceTimeout => Self::Timeout,
            PointerError::ArenaUnavailable => Self::InvalidState,
        }
    }
}
