use crate::database::{Frame, Position};
use std::collections::VecDeque;
use tokio::time::Instant;

/// FrameLog holds the committed frames of one database since its retention boundary.
///
/// The boundary is the position of the newest frame that was pruned (or restored from a
/// snapshot). Frames are kept in memory; the database file itself is owned by the filesystem
/// layer, so losing this history on restart only costs replicas a resync.
pub(crate) struct FrameLog {
    entries: VecDeque<LogEntry>,
    boundary: Position,
}

pub(crate) struct LogEntry {
    pub(crate) frame: Frame,
    pub(crate) committed_at: Instant,
}

impl FrameLog {
    pub(crate) fn new() -> Self {
        Self::with_boundary(Position::ZERO)
    }

    pub(crate) fn with_boundary(boundary: Position) -> Self {
        FrameLog {
            entries: VecDeque::new(),
            boundary,
        }
    }

    /// Appends a frame. Callers guarantee the frame directly follows `last_position()`.
    pub(crate) fn append(&mut self, frame: Frame, committed_at: Instant) {
        debug_assert_eq!(frame.position.sequence, self.last_position().sequence + 1);
        self.entries.push_back(LogEntry { frame, committed_at });
    }

    pub(crate) fn boundary(&self) -> Position {
        self.boundary
    }

    pub(crate) fn last_position(&self) -> Position {
        self.entries
            .back()
            .map(|entry| entry.frame.position)
            .unwrap_or(self.boundary)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Position recorded at `sequence`, if that sequence is the boundary or still retained.
    pub(crate) fn position_at(&self, sequence: u64) -> Option<Position> {
        if sequence == self.boundary.sequence {
            return Some(self.boundary);
        }
        self.entry_index(sequence)
            .and_then(|i| self.entries.get(i))
            .map(|entry| entry.frame.position)
    }

    /// Reads up to `limit` frames strictly after `sequence`. Returns `None` when frames right
    /// after `sequence` were already pruned.
    pub(crate) fn read_after(&self, sequence: u64, limit: usize) -> Option<Vec<Frame>> {
        if sequence < self.boundary.sequence {
            return None;
        }
        let start = (sequence - self.boundary.sequence) as usize;
        let frames = self
            .entries
            .iter()
            .skip(start)
            .take(limit)
            .map(|entry| entry.frame.clone())
            .collect();

        Some(frames)
    }

    pub(crate) fn front(&self) -> Option<&LogEntry> {
        self.entries.front()
    }

    /// Drops the oldest frame, moving the boundary onto it.
    pub(crate) fn pop_front(&mut self) -> Option<Position> {
        let entry = self.entries.pop_front()?;
        self.boundary = entry.frame.position;
        Some(self.boundary)
    }

    /// Forgets every frame. The new history starts right after `boundary`.
    pub(crate) fn reset(&mut self, boundary: Position) {
        self.entries.clear();
        self.boundary = boundary;
    }

    fn entry_index(&self, sequence: u64) -> Option<usize> {
        if sequence <= self.boundary.sequence {
            return None;
        }
        Some((sequence - self.boundary.sequence - 1) as usize)
    }
}
