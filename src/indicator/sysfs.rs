use super::{Line, OutputLines};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const DEFAULT_GPIO_ROOT: &str = "/sys/class/gpio";

/// GPIO output lines driven through the sysfs interface.
///
/// `pins` holds BCM line numbers in [`Line::ALL`] order.
pub struct SysfsLines {
    values: [PathBuf; 5],
}

impl SysfsLines {
    /// Export every pin (if not yet exported) and configure it as an output.
    pub fn open<P: AsRef<Path>>(root: P, pins: [u32; 5]) -> io::Result<Self> {
        let root = root.as_ref();
        let values = pins.map(|pin| root.join(format!("gpio{pin}")).join("value"));

        for (line, pin) in Line::ALL.iter().zip(pins) {
            let dir = root.join(format!("gpio{pin}"));
            if !dir.exists() {
                debug!("Exporting GPIO {} for {} line", pin, line.name());
                fs::write(root.join("export"), pin.to_string())?;
            }
            fs::write(dir.join("direction"), "out")?;
        }

        Ok(Self { values })
    }
}

impl OutputLines for SysfsLines {
    fn set_line(&mut self, line: Line, high: bool) {
        let path = &self.values[line.index()];
        if let Err(e) = fs::write(path, if high { "1" } else { "0" }) {
            warn!("Failed to drive {} line ({}): {}", line.name(), path.display(), e);
        }
    }
}
