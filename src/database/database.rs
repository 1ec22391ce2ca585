use crate::database::frame_log::FrameLog;
use crate::database::{Frame, Position};
use bytes::Bytes;
use std::collections::HashMap;
use std::io;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::watch;
use tokio::time::{Duration, Instant};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub(crate) struct SessionId(u64);

#[derive(Clone, Debug)]
pub(crate) struct RetentionPolicy {
    /// Frames younger than this are kept.
    pub(crate) duration: Duration,
    /// When set, at most this many of the newest frames are kept, regardless of age.
    pub(crate) max_frames: Option<usize>,
}

#[derive(Debug, Default, Eq, PartialEq)]
pub(crate) struct PruneReport {
    pub(crate) pruned_frames: usize,
    pub(crate) forgotten_sessions: usize,
}

#[derive(Debug, Eq, PartialEq)]
pub(crate) enum ApplyOutcome {
    Applied,
    Duplicate,
}

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub(crate) enum ApplyError {
    #[error("Frame {received:?} does not directly follow applied position {applied:?}")]
    Desync { applied: Position, received: Position },
}

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub(crate) enum ResumeError {
    #[error("Position {requested:?} is older than the retained boundary {boundary:?}")]
    PositionTooOld { requested: Position, boundary: Position },
    #[error("Position {requested:?} does not match local history {local:?}")]
    Desync { requested: Position, local: Position },
}

/// Database tracks the committed history of one replicated database, plus the serving
/// sessions that read from it.
///
/// Position, frame log and session table share one mutex, so registering a session and
/// pruning history can never interleave.
pub(crate) struct Database {
    name: String,
    state: Mutex<DatabaseState>,
    position_tx: watch::Sender<Position>,
    // Keeps `position_tx.send()` from failing while nobody is subscribed.
    _position_rx: watch::Receiver<Position>,
}

struct DatabaseState {
    log: FrameLog,
    sessions: HashMap<SessionId, SessionRecord>,
    next_session_id: u64,
}

struct SessionRecord {
    client: String,
    sent_through: Position,
    /// Newest position the replica reported as applied. Retention never prunes past it.
    acked: Position,
    disconnected_at: Option<Instant>,
}

impl Database {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        let (position_tx, position_rx) = watch::channel(Position::ZERO);

        Database {
            name: name.into(),
            state: Mutex::new(DatabaseState {
                log: FrameLog::new(),
                sessions: HashMap::new(),
                next_session_id: 1,
            }),
            position_tx,
            _position_rx: position_rx,
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn position(&self) -> Position {
        self.lock().log.last_position()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Position> {
        self.position_tx.subscribe()
    }

    /// Primary write path: records `data` as the next frame under `generation`.
    pub(crate) fn append(&self, generation: u64, data: Bytes, now: Instant) -> Position {
        let mut state = self.lock();
        let position = state.log.last_position().next(generation);
        state.log.append(Frame::new(position, data), now);
        self.publish(position);

        position
    }

    /// Replica write path. Frames at or below the applied position are duplicates from an
    /// at-least-once stream and are skipped; anything else must directly follow.
    pub(crate) fn apply(&self, frame: Frame, now: Instant) -> Result<ApplyOutcome, ApplyError> {
        let mut state = self.lock();
        let applied = state.log.last_position();

        if frame.position.sequence <= applied.sequence {
            return Ok(ApplyOutcome::Duplicate);
        }
        if frame.position.sequence != applied.sequence + 1 || frame.position.generation < applied.generation {
            return Err(ApplyError::Desync {
                applied,
                received: frame.position,
            });
        }

        let position = frame.position;
        state.log.append(frame, now);
        self.publish(position);

        Ok(ApplyOutcome::Applied)
    }

    /// Replaces all history with a restored snapshot taken at `position`.
    pub(crate) fn reset(&self, position: Position) {
        let mut state = self.lock();
        state.log.reset(position);
        self.publish(position);
    }

    /// Validates a resume position and registers a serving session reading after it.
    pub(crate) fn register_session(&self, resume: Position, client: &str) -> Result<SessionId, ResumeError> {
        let mut state = self.lock();
        let boundary = state.log.boundary();
        let local = state.log.last_position();

        if resume.sequence > local.sequence {
            return Err(ResumeError::Desync {
                requested: resume,
                local,
            });
        }
        if resume.sequence < boundary.sequence {
            return Err(ResumeError::PositionTooOld {
                requested: resume,
                boundary,
            });
        }
        match state.log.position_at(resume.sequence) {
            Some(retained) if retained == resume => {}
            Some(retained) => {
                return Err(ResumeError::Desync {
                    requested: resume,
                    local: retained,
                })
            }
            None => {
                return Err(ResumeError::PositionTooOld {
                    requested: resume,
                    boundary,
                })
            }
        }

        Ok(state.insert_session(client, resume))
    }

    /// Registers a session that starts from a full image of the database. The image and its
    /// position are taken under the database lock, so no commit can slip in between.
    pub(crate) fn register_snapshot_session<F>(&self, client: &str, take_snapshot: F) -> io::Result<(SessionId, Position, Bytes)>
    where
        F: FnOnce(&str) -> io::Result<Bytes>,
    {
        let mut state = self.lock();
        let image = take_snapshot(&self.name)?;
        let position = state.log.last_position();
        let session_id = state.insert_session(client, position);

        Ok((session_id, position, image))
    }

    /// Reads the next frames for a session and advances its cursor past them.
    pub(crate) fn read_for_session(&self, session_id: SessionId, limit: usize) -> Result<Vec<Frame>, ResumeError> {
        let mut state = self.lock();
        let boundary = state.log.boundary();
        let sent_through = match state.sessions.get(&session_id) {
            Some(session) => session.sent_through,
            None => {
                return Err(ResumeError::PositionTooOld {
                    requested: Position::ZERO,
                    boundary,
                })
            }
        };

        let frames = state
            .log
            .read_after(sent_through.sequence, limit)
            .ok_or(ResumeError::PositionTooOld {
                requested: sent_through,
                boundary,
            })?;

        if let Some(last) = frames.last() {
            if let Some(session) = state.sessions.get_mut(&session_id) {
                session.sent_through = last.position;
            }
        }

        Ok(frames)
    }

    /// Records that `client` applied everything through `applied`. Positions beyond what was
    /// sent to it are ignored, as are acknowledgements that would move backwards.
    pub(crate) fn acknowledge(&self, client: &str, applied: Position) {
        let mut state = self.lock();
        for session in state.sessions.values_mut().filter(|session| session.client == client) {
            if applied.sequence > session.acked.sequence && applied.sequence <= session.sent_through.sequence {
                session.acked = applied;
            }
        }
    }

    /// Marks a session as gone. Its history stays protected for the retention duration so the
    /// replica can come back and resume.
    pub(crate) fn disconnect_session(&self, session_id: SessionId, now: Instant) {
        if let Some(session) = self.lock().sessions.get_mut(&session_id) {
            session.disconnected_at = Some(now);
        }
    }

    pub(crate) fn live_sessions(&self) -> Vec<String> {
        self.lock()
            .sessions
            .values()
            .filter(|session| session.disconnected_at.is_none())
            .map(|session| session.client.clone())
            .collect()
    }

    /// Prunes frames outside the retention horizon that no session still needs.
    pub(crate) fn enforce_retention(&self, now: Instant, policy: &RetentionPolicy) -> PruneReport {
        let mut state = self.lock();

        let sessions_before = state.sessions.len();
        state.sessions.retain(|_, session| match session.disconnected_at {
            Some(at) => now.saturating_duration_since(at) < policy.duration,
            None => true,
        });
        let forgotten_sessions = sessions_before - state.sessions.len();

        // Frames after the floor may still be unapplied on some replica.
        let floor = state.sessions.values().map(|session| session.acked.sequence).min();

        let mut pruned_frames = 0;
        loop {
            let (sequence, age) = match state.log.front() {
                Some(entry) => (
                    entry.frame.position.sequence,
                    now.saturating_duration_since(entry.committed_at),
                ),
                None => break,
            };
            if let Some(floor) = floor {
                if sequence > floor {
                    break;
                }
            }

            let expired = age >= policy.duration;
            let over_limit = policy.max_frames.map_or(false, |max| state.log.len() > max);
            if !expired && !over_limit {
                break;
            }

            state.log.pop_front();
            pruned_frames += 1;
        }

        PruneReport {
            pruned_frames,
            forgotten_sessions,
        }
    }

    pub(crate) fn boundary(&self) -> Position {
        self.lock().log.boundary()
    }

    fn publish(&self, position: Position) {
        let _ = self.position_tx.send(position);
    }

    fn lock(&self) -> MutexGuard<'_, DatabaseState> {
        self.state.lock().expect("Database mutex guard poison")
    }
}

impl DatabaseState {
    fn insert_session(&mut self, client: &str, sent_through: Position) -> SessionId {
        let session_id = SessionId(self.next_session_id);
        self.next_session_id += 1;
        self.sessions.insert(
            session_id,
            SessionRecord {
                client: client.to_string(),
                sent_through,
                acked: sent_through,
                disconnected_at: None,
            },
        );

        session_id
    }
}
