use super::{Line, OutputLines};
use std::sync::{Arc, Mutex};

/// Output lines held in memory.
///
/// Clones share the same levels, so a clone kept outside the controller can
/// observe what the controller drives. Used when no GPIO is available and in
/// tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryLines {
    levels: Arc<Mutex<[bool; 5]>>,
}

impl MemoryLines {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current level of every line, indexed by [`Line::index`].
    pub fn levels(&self) -> [bool; 5] {
        *self.levels.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Lines currently high, in [`Line::ALL`] order.
    pub fn high_lines(&self) -> Vec<Line> {
        let levels = self.levels();
        Line::ALL
            .into_iter()
            .filter(|line| levels[line.index()])
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn force_all_high(&self) {
        *self.levels.lock().unwrap() = [true; 5];
    }
}

impl OutputLines for MemoryLines {
    fn set_line(&mut self, line: Line, high: bool) {
        let mut levels = self.levels.lock().unwrap_or_else(|e| e.into_inner());
        levels[line.index()] = high;
    }
}
