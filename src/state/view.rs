use super::AppState;
use crate::error::AppError;
use crate::protocol::ViewSnapshot;
use crate::types::*;
use crate::view::{RoomView, ViewEvent};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// A client's open view of one room
#[derive(Debug)]
pub struct ViewSession {
    pub view: RoomView,
    pub last_seen: Instant,
}

impl AppState {
    /// Open a new view of a room, loading the room and its submissions
    pub async fn open_view(&self, code: &str) -> Result<ViewSnapshot, AppError> {
        let mut view = RoomView::new(code.to_string());
        self.load_view(&mut view).await?;

        let view_id = ulid::Ulid::new().to_string();
        let snapshot = view.snapshot(&view_id);
        let session = ViewSession {
            view,
            last_seen: Instant::now(),
        };

        self.views
            .write()
            .await
            .insert(view_id.clone(), Arc::new(Mutex::new(session)));
        tracing::info!("Opened view {} for room {}", view_id, code);
        Ok(snapshot)
    }

    /// Re-fetch submissions into an open view
    pub async fn refresh_view(&self, view_id: &str) -> Result<ViewSnapshot, AppError> {
        let session = self.session(view_id).await?;
        let mut session = session.lock().await;
        session.last_seen = Instant::now();

        self.load_view(&mut session.view).await?;
        Ok(session.view.snapshot(view_id))
    }

    /// Submit a list through a view. The typed input stays in the view until
    /// the store accepts it.
    pub async fn submit_in_view(
        &self,
        view_id: &str,
        name: String,
        games: String,
    ) -> Result<ViewSnapshot, AppError> {
        let session = self.session(view_id).await?;
        let mut session = session.lock().await;
        session.last_seen = Instant::now();
        session.view.set_draft(name.clone(), games.clone());

        let room = match (session.view.phase(), session.view.room()) {
            (ViewPhase::AwaitingSubmissions, Some(room)) => room.clone(),
            (phase, _) => {
                return Err(AppError::InvalidTransition {
                    action: "submit a list",
                    phase,
                })
            }
        };

        self.submit_to_room(&room, &name, &games).await?;
        session.view.apply(ViewEvent::SubmitSucceeded)?;

        // The list is stored; a failed re-fetch leaves the view loading until the next refresh
        if let Err(e) = self.load_view(&mut session.view).await {
            tracing::warn!("View {} stored a list but could not reload: {}", view_id, e);
        }
        Ok(session.view.snapshot(view_id))
    }

    /// Show who wrote which list
    pub async fn reveal_view(&self, view_id: &str) -> Result<ViewSnapshot, AppError> {
        let session = self.session(view_id).await?;
        let mut session = session.lock().await;
        session.last_seen = Instant::now();

        session.view.reveal_authors()?;
        tracing::info!("View {} revealed authors for room {}", view_id, session.view.code());
        Ok(session.view.snapshot(view_id))
    }

    /// Throw away everything the view has loaded and fetch it again
    pub async fn reload_view(&self, view_id: &str) -> Result<ViewSnapshot, AppError> {
        let session = self.session(view_id).await?;
        let mut session = session.lock().await;
        session.last_seen = Instant::now();

        session.view.reload();
        self.load_view(&mut session.view).await?;
        Ok(session.view.snapshot(view_id))
    }

    /// Current snapshot without touching the store
    pub async fn view_snapshot(&self, view_id: &str) -> Result<ViewSnapshot, AppError> {
        let session = self.session(view_id).await?;
        let session = session.lock().await;
        Ok(session.view.snapshot(view_id))
    }

    /// Drop views idle for longer than `ttl`. Returns how many were removed.
    pub async fn prune_views(&self, ttl: Duration) -> usize {
        let now = Instant::now();
        let mut views = self.views.write().await;
        let before = views.len();

        // A session that is locked is in use right now
        views.retain(|_, session| match session.try_lock() {
            Ok(s) => now.duration_since(s.last_seen) < ttl,
            Err(_) => true,
        });

        before - views.len()
    }

    async fn session(&self, view_id: &str) -> Result<Arc<Mutex<ViewSession>>, AppError> {
        self.views
            .read()
            .await
            .get(view_id)
            .cloned()
            .ok_or_else(|| AppError::UnknownView(view_id.to_string()))
    }

    /// Bring the view up to date with the store, starting from wherever it is
    async fn load_view(&self, view: &mut RoomView) -> Result<(), AppError> {
        let room_id = match view.room() {
            Some(room) => room.id,
            None => {
                let room = self.get_room(view.code()).await?;
                let room_id = room.id;
                view.apply(ViewEvent::RoomLoaded(room))?;
                room_id
            }
        };

        let submissions = self.list_submissions(room_id).await?;
        view.apply(ViewEvent::SubmissionsLoaded(submissions))
    }
}
