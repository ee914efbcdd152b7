use crate::state::AppState;
use std::sync::Arc;
use std::time::Duration;

/// Spawn a background task that drops view sessions idle for longer than `ttl`
pub fn spawn_view_reaper(state: Arc<AppState>, ttl: Duration) {
    // Check a few times per TTL, but not more than once a second
    let interval = (ttl / 4).max(Duration::from_secs(1));

    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;

            let removed = state.prune_views(ttl).await;
            if removed > 0 {
                tracing::debug!("Dropped {} idle views", removed);
            }
        }
    });
}
