//! Last-issued-wins arbitration for asynchronous loads.
//!
//! Every load is issued with a [`Tag`] from a per-entity [`Sequencer`]. A
//! response is committed only while its tag is still the latest issued one;
//! anything older is dropped on arrival.

/// Monotonic request tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag(u64);

impl Tag {
    pub fn value(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct Sequencer {
    issued: u64,
}

impl Sequencer {
    pub fn issue(&mut self) -> Tag {
        self.issued += 1;
        Tag(self.issued)
    }

    pub fn is_current(&self, tag: Tag) -> bool {
        tag.0 == self.issued
    }
}

/// What happened to a response handed back to its owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Applied {
    Committed,
    /// A newer request was issued after this one; the response was ignored.
    Superseded,
}

impl Applied {
    pub fn is_committed(self) -> bool {
        self == Self::Committed
    }
}

/// `idle -> loading -> {ready, failed}`, shared by every load-driven view.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_latest_tag_is_current() {
        let mut seq = Sequencer::default();
        let first = seq.issue();
        assert!(seq.is_current(first));
        let second = seq.issue();
        assert!(!seq.is_current(first));
        assert!(seq.is_current(second));
        assert!(first < second);
    }
}
