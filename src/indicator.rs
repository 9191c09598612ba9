//! Status indicator outputs.
//!
//! Three independent on/off signals show where a run is:
//!
//! - **Ready**: solid while calibrating, blinking while waiting for the light, solid
//!   again once onset is detected
//! - **Running**: toggles on every recorded sample
//! - **Complete**: switched on when the run finishes
//!
//! On a Raspberry Pi bench rig these are GPIO LEDs (BCM 17, 27, 22), driven by
//! [`PinIndicator`] over any `embedded-hal` output pin. [`VirtualIndicator`]
//! keeps the state in memory and logs every change.

use embedded_hal::digital::v2::OutputPin;
use std::fmt::{self, Debug};
use tracing::debug;

use crate::error::{AppResult, DaqError};

/// Role of a status output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorRole {
    /// Ready for / waiting on the light source
    Ready,
    /// Recording heartbeat
    Running,
    /// Run finished
    Complete,
}

impl IndicatorRole {
    /// All roles, in display order.
    pub const ALL: [IndicatorRole; 3] = [
        IndicatorRole::Ready,
        IndicatorRole::Running,
        IndicatorRole::Complete,
    ];

    fn index(self) -> usize {
        match self {
            IndicatorRole::Ready => 0,
            IndicatorRole::Running => 1,
            IndicatorRole::Complete => 2,
        }
    }
}

impl fmt::Display for IndicatorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorRole::Ready => write!(f, "ready"),
            IndicatorRole::Running => write!(f, "running"),
            IndicatorRole::Complete => write!(f, "complete"),
        }
    }
}

/// Capability for a bank of three status outputs.
pub trait Indicator: Send {
    /// Drive one output.
    fn set(&mut self, role: IndicatorRole, on: bool) -> AppResult<()>;

    /// Current state of one output.
    fn is_on(&self, role: IndicatorRole) -> bool;

    /// Flip one output based on its current state.
    fn toggle(&mut self, role: IndicatorRole) -> AppResult<()> {
        let current = self.is_on(role);
        self.set(role, !current)
    }
}

/// In-memory indicator bank.
#[derive(Debug, Default, Clone)]
pub struct VirtualIndicator {
    states: [bool; 3],
}

impl VirtualIndicator {
    /// All outputs off.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Indicator for VirtualIndicator {
    fn set(&mut self, role: IndicatorRole, on: bool) -> AppResult<()> {
        let slot = &mut self.states[role.index()];
        if *slot != on {
            debug!(indicator = %role, on, "Indicator changed");
        }
        *slot = on;
        Ok(())
    }

    fn is_on(&self, role: IndicatorRole) -> bool {
        self.states[role.index()]
    }
}

/// Three LEDs on `embedded-hal` output pins.
///
/// Pin state is tracked here since plain output pins cannot be read back.
pub struct PinIndicator<P> {
    pins: [P; 3],
    states: [bool; 3],
}

impl<P> PinIndicator<P>
where
    P: OutputPin,
    P::Error: Debug,
{
    /// Take the pins and switch all three LEDs off.
    pub fn new(ready: P, running: P, complete: P) -> AppResult<Self> {
        let mut indicator = Self {
            pins: [ready, running, complete],
            states: [false; 3],
        };
        for role in IndicatorRole::ALL {
            indicator.drive(role, false)?;
        }
        Ok(indicator)
    }

    /// Release the pins.
    pub fn destroy(self) -> [P; 3] {
        self.pins
    }

    fn drive(&mut self, role: IndicatorRole, on: bool) -> AppResult<()> {
        let pin = &mut self.pins[role.index()];
        let result = if on { pin.set_high() } else { pin.set_low() };
        result.map_err(|e| {
            DaqError::Indicator(format!("Failed to switch {} LED: {:?}", role, e))
        })?;
        self.states[role.index()] = on;
        Ok(())
    }
}

impl<P> Indicator for PinIndicator<P>
where
    P: OutputPin + Send,
    P::Error: Debug,
{
    fn set(&mut self, role: IndicatorRole, on: bool) -> AppResult<()> {
        if self.states[role.index()] == on {
            return Ok(());
        }
        self.drive(role, on)?;
        debug!(indicator = %role, on, "LED switched");
        Ok(())
    }

    fn is_on(&self, role: IndicatorRole) -> bool {
        self.states[role.index()]
    }
}

#[cfg(feature = "instrument_linux")]
mod gpio_enabled {
    use super::*;
    use linux_embedded_hal::sysfs_gpio::Direction;
    use linux_embedded_hal::SysfsPin;

    fn export(number: u64) -> AppResult<SysfsPin> {
        let pin = SysfsPin::new(number);
        pin.export()
            .and_then(|_| pin.set_direction(Direction::Low))
            .map_err(|e| DaqError::Indicator(format!("Failed to set up GPIO {number}: {e}")))?;
        Ok(pin)
    }

    /// Export the ready, running and complete GPIO lines as outputs.
    pub fn open_gpio(pins: [u64; 3]) -> AppResult<PinIndicator<SysfsPin>> {
        let [ready, running, complete] = pins;
        let indicator = PinIndicator::new(export(ready)?, export(running)?, export(complete)?)?;
        debug!(ready, running, complete, "GPIO indicators ready");
        Ok(indicator)
    }
}

#[cfg(not(feature = "instrument_linux"))]
mod gpio_disabled {
    use super::*;

    /// Always fails: GPIO support is not part of this build.
    pub fn open_gpio(_pins: [u64; 3]) -> AppResult<VirtualIndicator> {
        Err(DaqError::FeatureNotEnabled("instrument_linux".to_string()))
    }
}

#[cfg(feature = "instrument_linux")]
pub use gpio_enabled::open_gpio;

#[cfg(not(feature = "instrument_linux"))]
pub use gpio_disabled::open_gpio;
