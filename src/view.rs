//! Per-session room view.
//!
//! A view walks LoadingRoom -> LoadingSubmissions -> AwaitingSubmissions ->
//! AllSubmitted -> Revealed, driven only by [`ViewEvent`]s. Nothing here is
//! persisted: reloading a view starts it over from LoadingRoom, which drops a
//! previous reveal.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::protocol::{ListCard, ViewSnapshot};
use crate::state::compute_remaining;
use crate::types::*;

/// Things that can happen to a view
#[derive(Debug, Clone)]
pub enum ViewEvent {
    RoomLoaded(Room),
    SubmissionsLoaded(Vec<Submission>),
    SubmitSucceeded,
    RevealRequested,
}

impl ViewEvent {
    fn action(&self) -> &'static str {
        match self {
            ViewEvent::RoomLoaded(_) => "load the room",
            ViewEvent::SubmissionsLoaded(_) => "load submissions",
            ViewEvent::SubmitSucceeded => "accept a submission",
            ViewEvent::RevealRequested => "reveal authors",
        }
    }
}

/// In-progress form input, kept until a submit succeeds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmitDraft {
    pub name: String,
    pub games: String,
}

#[derive(Debug, Clone)]
enum Stage {
    LoadingRoom,
    LoadingSubmissions {
        room: Room,
    },
    AwaitingSubmissions {
        room: Room,
        submissions: Vec<Submission>,
        remaining: Vec<String>,
    },
    /// `lists` is in display order, shuffled once on entry
    AllSubmitted {
        room: Room,
        lists: Vec<Submission>,
    },
    Revealed {
        room: Room,
        lists: Vec<Submission>,
    },
}

#[derive(Debug, Clone)]
pub struct RoomView {
    code: RoomCode,
    stage: Stage,
    draft: SubmitDraft,
}

impl RoomView {
    pub fn new(code: RoomCode) -> Self {
        Self {
            code,
            stage: Stage::LoadingRoom,
            draft: SubmitDraft::default(),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn phase(&self) -> ViewPhase {
        match self.stage {
            Stage::LoadingRoom => ViewPhase::LoadingRoom,
            Stage::LoadingSubmissions { .. } => ViewPhase::LoadingSubmissions,
            Stage::AwaitingSubmissions { .. } => ViewPhase::AwaitingSubmissions,
            Stage::AllSubmitted { .. } => ViewPhase::AllSubmitted,
            Stage::Revealed { .. } => ViewPhase::Revealed,
        }
    }

    pub fn room(&self) -> Option<&Room> {
        match &self.stage {
            Stage::LoadingRoom => None,
            Stage::LoadingSubmissions { room }
            | Stage::AwaitingSubmissions { room, .. }
            | Stage::AllSubmitted { room, .. }
            | Stage::Revealed { room, .. } => Some(room),
        }
    }

    /// Roster names still missing a list
    pub fn remaining(&self) -> &[String] {
        match &self.stage {
            Stage::AwaitingSubmissions { remaining, .. } => remaining,
            _ => &[],
        }
    }

    /// Submissions in display order (empty until everyone has submitted)
    pub fn lists(&self) -> &[Submission] {
        match &self.stage {
            Stage::AllSubmitted { lists, .. } | Stage::Revealed { lists, .. } => lists,
            _ => &[],
        }
    }

    /// How many roster entries have a stored list
    pub fn submitted_count(&self) -> usize {
        match &self.stage {
            Stage::AwaitingSubmissions { submissions, .. } => submissions.len(),
            Stage::AllSubmitted { lists, .. } | Stage::Revealed { lists, .. } => lists.len(),
            _ => 0,
        }
    }

    pub fn draft(&self) -> &SubmitDraft {
        &self.draft
    }

    /// Record what the user has typed so far
    pub fn set_draft(&mut self, name: String, games: String) {
        self.draft = SubmitDraft { name, games };
    }

    /// Forget everything loaded in this session and start over
    pub fn reload(&mut self) {
        self.stage = Stage::LoadingRoom;
        self.draft = SubmitDraft::default();
    }

    pub fn reveal_authors(&mut self) -> Result<(), AppError> {
        self.apply(ViewEvent::RevealRequested)
    }

    pub fn apply(&mut self, event: ViewEvent) -> Result<(), AppError> {
        self.apply_with_rng(event, &mut rand::rng())
    }

    pub fn apply_with_rng<R: Rng + ?Sized>(
        &mut self,
        event: ViewEvent,
        rng: &mut R,
    ) -> Result<(), AppError> {
        let action = event.action();
        let stage = std::mem::replace(&mut self.stage, Stage::LoadingRoom);

        let next = match (stage, event) {
            (Stage::LoadingRoom, ViewEvent::RoomLoaded(room)) => {
                Ok(Stage::LoadingSubmissions { room })
            }

            (stage, ViewEvent::SubmissionsLoaded(submissions)) => match stage {
                Stage::LoadingRoom => Err(Stage::LoadingRoom),
                Stage::LoadingSubmissions { room } | Stage::AwaitingSubmissions { room, .. } => {
                    Ok(Self::collect(room, submissions, rng))
                }
                Stage::AllSubmitted { room, lists } => {
                    Ok(Self::refresh(room, lists, submissions, false, rng))
                }
                Stage::Revealed { room, lists } => {
                    Ok(Self::refresh(room, lists, submissions, true, rng))
                }
            },

            (Stage::AwaitingSubmissions { room, .. }, ViewEvent::SubmitSucceeded) => {
                self.draft = SubmitDraft::default();
                Ok(Stage::LoadingSubmissions { room })
            }

            (Stage::AllSubmitted { room, lists }, ViewEvent::RevealRequested)
            | (Stage::Revealed { room, lists }, ViewEvent::RevealRequested) => {
                Ok(Stage::Revealed { room, lists })
            }

            (stage, _) => Err(stage),
        };

        match next {
            Ok(stage) => {
                self.stage = stage;
                Ok(())
            }
            Err(stage) => {
                self.stage = stage;
                Err(AppError::InvalidTransition {
                    action,
                    phase: self.phase(),
                })
            }
        }
    }

    /// Fresh submissions for a room that was not complete before
    fn collect<R: Rng + ?Sized>(room: Room, submissions: Vec<Submission>, rng: &mut R) -> Stage {
        let remaining = compute_remaining(&room.names, &submissions);
        if remaining.is_empty() {
            let mut lists = submissions;
            lists.shuffle(rng);
            tracing::info!("Room {} complete, {} lists in play", room.code, lists.len());
            Stage::AllSubmitted { room, lists }
        } else {
            Stage::AwaitingSubmissions {
                room,
                submissions,
                remaining,
            }
        }
    }

    /// Fresh submissions for a complete room: keep the display order already
    /// shown, update contents, and append anything new at the end
    fn refresh<R: Rng + ?Sized>(
        room: Room,
        shown: Vec<Submission>,
        mut submissions: Vec<Submission>,
        revealed: bool,
        rng: &mut R,
    ) -> Stage {
        let remaining = compute_remaining(&room.names, &submissions);
        if !remaining.is_empty() {
            tracing::warn!(
                "Room {} lost submissions from {:?} since it was complete",
                room.code,
                remaining
            );
            // Revealed never goes back within a session
            if !revealed {
                return Self::collect(room, submissions, rng);
            }
        }

        let mut lists = Vec::with_capacity(submissions.len());
        for old in &shown {
            if let Some(pos) = submissions.iter().position(|s| s.id == old.id) {
                lists.push(submissions.swap_remove(pos));
            }
        }
        submissions.sort_by_key(|s| s.id);
        lists.extend(submissions);

        if revealed {
            Stage::Revealed { room, lists }
        } else {
            Stage::AllSubmitted { room, lists }
        }
    }

    /// Serializable picture of the view; authors only once revealed
    pub fn snapshot(&self, view_id: &str) -> ViewSnapshot {
        let revealed = self.phase() == ViewPhase::Revealed;
        let lists = self
            .lists()
            .iter()
            .enumerate()
            .map(|(i, s)| ListCard {
                label: format!("List {}", i + 1),
                games: s.games.clone(),
                author: revealed.then(|| s.name.clone()),
            })
            .collect();

        ViewSnapshot {
            view_id: view_id.to_string(),
            code: self.code.clone(),
            phase: self.phase(),
            roster: self.room().map(|r| r.names.clone()).unwrap_or_default(),
            remaining: self.remaining().to_vec(),
            submitted_count: self.submitted_count(),
            lists,
            draft: self.draft.clone(),
        }
    }
}
