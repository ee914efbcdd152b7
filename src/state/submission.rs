use super::{parse_lines, AppState};
use crate::error::AppError;
use crate::protocol::RoomStatus;
use crate::types::*;

/// Roster names with no submission yet, in roster order
pub fn compute_remaining(roster: &[String], submissions: &[Submission]) -> Vec<String> {
    roster
        .iter()
        .filter(|name| !submissions.iter().any(|s| &s.name == *name))
        .cloned()
        .collect()
}

impl AppState {
    /// Get submissions for a room
    pub async fn list_submissions(&self, room_id: RoomId) -> Result<Vec<Submission>, AppError> {
        Ok(self.store.list_submissions(room_id).await?)
    }

    /// Store a ranked list, replacing an earlier one under the same name
    pub async fn submit(
        &self,
        room_id: RoomId,
        name: &str,
        games_text: &str,
    ) -> Result<Submission, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Select your name".to_string()));
        }

        let games = parse_lines(games_text);
        if games.len() < self.min_list_items {
            return Err(AppError::Validation(format!(
                "Enter at least {} games, one per line (got {})",
                self.min_list_items,
                games.len()
            )));
        }

        let submission = self
            .store
            .upsert_submission(NewSubmission {
                room_id,
                name: name.to_string(),
                games,
            })
            .await?;

        tracing::info!(
            "Stored list of {} games from {} in room {}",
            submission.games.len(),
            submission.name,
            room_id
        );
        Ok(submission)
    }

    /// Submit on behalf of a roster member of `room`
    pub async fn submit_to_room(
        &self,
        room: &Room,
        name: &str,
        games_text: &str,
    ) -> Result<Submission, AppError> {
        let trimmed = name.trim();
        if !trimmed.is_empty() && !room.has_participant(trimmed) {
            return Err(AppError::Validation(format!(
                "{} is not on the roster of room {}",
                trimmed, room.code
            )));
        }
        self.submit(room.id, trimmed, games_text).await
    }

    /// Who still owes a list, without exposing any list contents
    pub async fn room_status(&self, code: &str) -> Result<RoomStatus, AppError> {
        let room = self.get_room(code).await?;
        let submissions = self.list_submissions(room.id).await?;
        let remaining = compute_remaining(&room.names, &submissions);

        Ok(RoomStatus {
            code: room.code,
            all_submitted: remaining.is_empty(),
            roster: room.names,
            remaining,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ten_games(prefix: &str) -> String {
        (1..=10)
            .map(|i| format!("{} {}", prefix, i))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|n| n.to_string()).collect()
    }

    fn submission(name: &str) -> Submission {
        Submission {
            id: 1,
            room_id: 1,
            name: name.to_string(),
            games: vec![],
        }
    }

    #[test]
    fn test_compute_remaining_preserves_roster_order() {
        let roster = names(&["D", "A", "C", "B"]);
        let subs = vec![submission("C"), submission("D")];
        assert_eq!(compute_remaining(&roster, &subs), names(&["A", "B"]));
    }

    #[test]
    fn test_compute_remaining_empty_iff_everyone_submitted() {
        let roster = names(&["A", "B"]);
        assert_eq!(compute_remaining(&roster, &[]), roster);
        assert!(compute_remaining(&roster, &[submission("B"), submission("A")]).is_empty());
    }

    #[test]
    fn test_compute_remaining_ignores_strangers() {
        let roster = names(&["A"]);
        let subs = vec![submission("Z")];
        assert_eq!(compute_remaining(&roster, &subs), names(&["A"]));
    }

    #[tokio::test]
    async fn test_scenario_one_of_two_submitted() {
        let state = AppState::in_memory();
        let code = state.create_room("A\nB").await.unwrap();
        let room = state.get_room(&code).await.unwrap();

        state.submit(room.id, "A", &ten_games("a")).await.unwrap();

        let status = state.room_status(&code).await.unwrap();
        assert_eq!(status.remaining, names(&["B"]));
        assert!(!status.all_submitted);
    }

    #[tokio::test]
    async fn test_short_list_never_persists() {
        let state = AppState::in_memory();
        let code = state.create_room("A").await.unwrap();
        let room = state.get_room(&code).await.unwrap();

        let nine = "1\n2\n3\n4\n5\n6\n7\n8\n9\n   \n\n";
        let result = state.submit(room.id, "A", nine).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(state.list_submissions(room.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_name_never_persists() {
        let state = AppState::in_memory();
        let code = state.create_room("A").await.unwrap();
        let room = state.get_room(&code).await.unwrap();

        let result = state.submit(room.id, "  ", &ten_games("a")).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(state.list_submissions(room.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_resubmit_keeps_one_row_with_latest_games() {
        let state = AppState::in_memory();
        let code = state.create_room("A\nB").await.unwrap();
        let room = state.get_room(&code).await.unwrap();

        state.submit(room.id, "A", &ten_games("first")).await.unwrap();
        state.submit(room.id, "A", &ten_games("second")).await.unwrap();

        let stored = state.list_submissions(room.id).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].games[0], "second 1");
        assert_eq!(stored[0].games.len(), 10);
    }

    #[tokio::test]
    async fn test_submit_to_room_rejects_unknown_name() {
        let state = AppState::in_memory();
        let code = state.create_room("A\nB").await.unwrap();
        let room = state.get_room(&code).await.unwrap();

        let result = state.submit_to_room(&room, "Mallory", &ten_games("m")).await;
        assert!(matches!(result, Err(AppError::Validation(msg)) if msg.contains("roster")));
        assert!(state.list_submissions(room.id).await.unwrap().is_empty());

        state.submit_to_room(&room, " B ", &ten_games("b")).await.unwrap();
        let stored = state.list_submissions(room.id).await.unwrap();
        assert_eq!(stored[0].name, "B");
    }

    #[tokio::test]
    async fn test_min_list_items_is_configurable() {
        let mut state = AppState::in_memory();
        state.min_list_items = 3;
        let code = state.create_room("A").await.unwrap();
        let room = state.get_room(&code).await.unwrap();

        assert!(state.submit(room.id, "A", "x\ny").await.is_err());
        assert!(state.submit(room.id, "A", "x\ny\nz").await.is_ok());
    }
}
