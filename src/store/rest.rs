use super::*;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Client for a PostgREST-style table API (`{base_url}/rooms`, `{base_url}/submissions`)
pub struct RestStore {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
    timeout: Duration,
}

/// Row shape of the `rooms` table as returned by the store
#[derive(Debug, Deserialize)]
struct RoomRow {
    id: RoomId,
    code: Option<String>,
    names: Option<Vec<String>>,
}

impl TryFrom<RoomRow> for Room {
    type Error = StoreError;

    fn try_from(row: RoomRow) -> Result<Self, Self::Error> {
        let code = row
            .code
            .filter(|c| !c.is_empty())
            .ok_or_else(|| invalid("rooms", format!("row {} has no code", row.id)))?;
        let names = row
            .names
            .ok_or_else(|| invalid("rooms", format!("row {} has no names", row.id)))?;

        Ok(Room {
            id: row.id,
            code,
            names,
        })
    }
}

/// Row shape of the `submissions` table as returned by the store
#[derive(Debug, Deserialize)]
struct SubmissionRow {
    id: SubmissionId,
    room_id: Option<RoomId>,
    name: Option<String>,
    games: Option<Vec<String>>,
}

impl TryFrom<SubmissionRow> for Submission {
    type Error = StoreError;

    fn try_from(row: SubmissionRow) -> Result<Self, Self::Error> {
        let room_id = row
            .room_id
            .ok_or_else(|| invalid("submissions", format!("row {} has no room_id", row.id)))?;
        let name = row
            .name
            .ok_or_else(|| invalid("submissions", format!("row {} has no name", row.id)))?;
        let games = row
            .games
            .ok_or_else(|| invalid("submissions", format!("row {} has no games", row.id)))?;

        Ok(Submission {
            id: row.id,
            room_id,
            name,
            games,
        })
    }
}

fn invalid(table: &'static str, reason: String) -> StoreError {
    StoreError::InvalidRecord { table, reason }
}

/// Exactly one row, or an error naming how many came back
fn single<T>(table: &'static str, mut rows: Vec<T>) -> StoreResult<T> {
    match rows.len() {
        1 => Ok(rows.remove(0)),
        count => Err(StoreError::Ambiguous { table, count }),
    }
}

impl RestStore {
    /// Create a new REST store client
    pub fn new(base_url: String, api_key: Option<String>, timeout: Duration) -> StoreResult<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(StoreError::Config("store URL is empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            api_key,
            client,
            timeout,
        })
    }

    fn table(&self, method: reqwest::Method, table: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}/{}", self.base_url, table));
        match &self.api_key {
            Some(key) => builder.header("apikey", key).bearer_auth(key),
            None => builder,
        }
    }

    /// Send a request and parse the body as a list of rows
    async fn rows<R, T>(&self, table: &'static str, request: RequestBuilder) -> StoreResult<Vec<T>>
    where
        R: DeserializeOwned,
        T: TryFrom<R, Error = StoreError>,
    {
        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(e))?;

        if status == StatusCode::CONFLICT {
            return Err(StoreError::Conflict(body));
        }
        if !status.is_success() {
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let rows: Vec<R> = serde_json::from_str(&body).map_err(|e| invalid(table, e.to_string()))?;
        rows.into_iter().map(T::try_from).collect()
    }

    fn transport_error(&self, e: reqwest::Error) -> StoreError {
        if e.is_timeout() {
            StoreError::Timeout(self.timeout)
        } else {
            StoreError::Request(e.to_string())
        }
    }
}

#[async_trait]
impl Store for RestStore {
    async fn insert_room(&self, room: NewRoom) -> StoreResult<Room> {
        let request = self
            .table(reqwest::Method::POST, "rooms")
            .header("Prefer", "return=representation")
            .json(&room);
        let rows = self.rows::<RoomRow, Room>("rooms", request).await?;
        single("rooms", rows)
    }

    async fn find_room_by_code(&self, code: &str) -> StoreResult<Option<Room>> {
        let request = self
            .table(reqwest::Method::GET, "rooms")
            .query(&[("select", "*".to_string()), ("code", format!("eq.{}", code))]);
        let rows = self.rows::<RoomRow, Room>("rooms", request).await?;
        match rows.len() {
            0 => Ok(None),
            _ => single("rooms", rows).map(Some),
        }
    }

    async fn list_submissions(&self, room_id: RoomId) -> StoreResult<Vec<Submission>> {
        let request = self.table(reqwest::Method::GET, "submissions").query(&[
            ("select", "*".to_string()),
            ("room_id", format!("eq.{}", room_id)),
            ("order", "id.asc".to_string()),
        ]);
        self.rows::<SubmissionRow, Submission>("submissions", request)
            .await
    }

    async fn upsert_submission(&self, submission: NewSubmission) -> StoreResult<Submission> {
        let request = self
            .table(reqwest::Method::POST, "submissions")
            .query(&[("on_conflict", "room_id,name")])
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(&submission);
        let rows = self
            .rows::<SubmissionRow, Submission>("submissions", request)
            .await?;
        single("submissions", rows)
    }

    fn name(&self) -> &str {
        "rest"
    }
}
