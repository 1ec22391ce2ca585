use bytes::Bytes;
use std::fmt;

/// Position identifies a point in a database's committed history.
///
/// `sequence` is the gap-free commit counter and defines the order of frames. `generation` is
/// the lease generation that committed the frame. Two positions with the same sequence but a
/// different generation belong to diverged histories, which is why positions are intentionally
/// not `Ord`: compare sequences explicitly and check generations where divergence matters.
#[derive(Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct Position {
    pub generation: u64,
    pub sequence: u64,
}

impl Position {
    /// The position of a database nobody ever wrote to.
    pub const ZERO: Position = Position {
        generation: 0,
        sequence: 0,
    };

    pub fn new(generation: u64, sequence: u64) -> Self {
        Position { generation, sequence }
    }

    /// The position the next commit under `generation` will get.
    pub(crate) fn next(&self, generation: u64) -> Position {
        Position {
            generation,
            sequence: self.sequence + 1,
        }
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.generation, self.sequence)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Frame is one committed unit of change. The payload is opaque to this crate.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Frame {
    pub position: Position,
    pub data: Bytes,
}

impl Frame {
    pub fn new(position: Position, data: Bytes) -> Self {
        Frame { position, data }
    }
}
