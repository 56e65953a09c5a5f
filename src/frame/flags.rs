use crate::path::ZoneWindow;

/// Bit set on zones inside the current window.
pub const ACTIVE_NOW: u8 = 0b01;
/// Bit set on zones inside the previous window.
pub const ACTIVE_BEFORE: u8 = 0b10;

/// Zones to act on after comparing two consecutive windows.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ZoneDiff {
    /// Zones that just entered the window.
    pub assign: Vec<usize>,
    /// Every zone inside the current window.
    pub update: Vec<usize>,
    /// Zones that just left the window.
    pub remove: Vec<usize>,
}

impl ZoneDiff {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assign.is_empty() && self.update.is_empty() && self.remove.is_empty()
    }
}

/// Scratch flag array, one byte per zone index, reused by every reference
/// frame in every pass.
///
/// Each [`diff`](Self::diff) marks the two windows, reads the flags back into
/// a [`ZoneDiff`], and clears every flag it touched. The array is therefore
/// all zero between diffs; a diff that finds leftover flags would mix zones of
/// two frames together.
#[derive(Debug, Default)]
pub struct ZoneFlags {
    flags: Vec<u8>,
}

impl ZoneFlags {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether no zone carries a flag.
    #[must_use]
    pub fn is_clear(&self) -> bool {
        self.flags.iter().all(|&f| f == 0)
    }

    /// Number of zone slots allocated so far.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.flags.len()
    }

    fn mark(&mut self, window: Option<ZoneWindow>, bit: u8) {
        let Some(window) = window else {
            return;
        };
        if self.flags.len() <= window.finish {
            self.flags.resize(window.finish + 1, 0);
        }
        for flag in &mut self.flags[window.zones()] {
            *flag |= bit;
        }
    }

    /// Compares two windows of one reference frame.
    pub fn diff(&mut self, previous: Option<ZoneWindow>, current: Option<ZoneWindow>) -> ZoneDiff {
        debug_assert!(self.is_clear(), "zone flags left over from an earlier diff");

        self.mark(previous, ACTIVE_BEFORE);
        self.mark(current, ACTIVE_NOW);

        let span = match (previous, current) {
            (Some(p), Some(c)) => p.union(c),
            (Some(w), None) | (None, Some(w)) => w,
            (None, None) => return ZoneDiff::default(),
        };

        let mut diff = ZoneDiff::default();
        for zone in span.zones() {
            let flag = self.flags[zone];
            if flag == ACTIVE_NOW {
                diff.assign.push(zone);
            }
            if flag & ACTIVE_NOW != 0 {
                diff.update.push(zone);
            }
            if flag == ACTIVE_BEFORE {
                diff.remove.push(zone);
            }
            self.flags[zone] = 0;
        }
        diff
    }
}
