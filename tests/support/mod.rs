//! In-process fake of the SugarSync REST API.
//!
//! Serves the endpoints the mirror uses from an in-memory folder tree and
//! records every listing and data request so tests can assert on them.

#![allow(dead_code)]

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use parking_lot::Mutex;
use serde::Deserialize;
use std::sync::Arc;

use sugarsync_dl::sugarsync::{ClientConfig, Credentials, SugarSyncClient, PAGE_SIZE};

pub const USERNAME: &str = "jsmith@example.com";
pub const PASSWORD: &str = "correct-horse";
pub const APP_ID: &str = "/sc/app/1";
pub const PUBLIC_KEY: &str = "PUBLIC-KEY";
pub const PRIVATE_KEY: &str = "PRIVATE-KEY";
pub const USER_ID: &str = "566494";

#[derive(Debug, Clone)]
pub struct FakeFile {
    pub name: String,
    pub body: Vec<u8>,
    pub present: bool,
    pub last_modified: String,
    /// Serve the data endpoint with a 500
    pub fail: bool,
}

impl FakeFile {
    pub fn new(name: &str, body: &[u8], last_modified: &str) -> Self {
        Self {
            name: name.to_string(),
            body: body.to_vec(),
            present: true,
            last_modified: last_modified.to_string(),
            fail: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeFolder {
    pub name: String,
    pub files: Vec<usize>,
    pub folders: Vec<usize>,
    /// Serve the contents endpoint with a 500
    pub fail_listing: bool,
}

#[derive(Debug, Default)]
pub struct FakeState {
    pub base_url: String,
    pub folders: Vec<FakeFolder>,
    pub files: Vec<FakeFile>,
    pub sync_roots: Vec<usize>,
    /// Answer access token requests without a user reference
    pub omit_user_reference: bool,
    /// Reject access token requests once this many have been granted
    pub max_access_tokens: Option<usize>,
    pub refresh_token: Option<String>,
    pub current_token: Option<String>,
    pub refresh_token_requests: usize,
    pub access_token_requests: usize,
    /// (folder id, start offset) per listing request
    pub listing_requests: Vec<(usize, usize)>,
    /// File ids per data request
    pub data_requests: Vec<usize>,
}

impl FakeState {
    fn is_authorized(&self, headers: &HeaderMap) -> bool {
        let presented = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        presented.is_some() && presented == self.current_token.as_deref()
    }

    fn folder_xml(&self, id: usize) -> String {
        format!(
            r#"<collection type="folder"><displayName>{}</displayName><ref>{base}/folder/{id}</ref><contents>{base}/folder/{id}/contents</contents></collection>"#,
            escape(&self.folders[id].name),
            base = self.base_url,
            id = id
        )
    }

    fn file_xml(&self, id: usize) -> String {
        let file = &self.files[id];
        format!(
            r#"<file><displayName>{}</displayName><ref>{base}/file/{id}</ref><size>{}</size><lastModified>{}</lastModified><mediaType>application/octet-stream</mediaType><presentOnServer>{}</presentOnServer><fileData>{base}/file/{id}/data</fileData></file>"#,
            escape(&file.name),
            file.body.len(),
            file.last_modified,
            file.present,
            base = self.base_url,
            id = id
        )
    }
}

/// Handle to a running fake server.
pub struct FakeSugarSync {
    pub state: Arc<Mutex<FakeState>>,
    pub base_url: String,
}

impl FakeSugarSync {
    /// Bind to an ephemeral local port and serve in the background.
    pub async fn start() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake server");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let state = Arc::new(Mutex::new(FakeState {
            base_url: base_url.clone(),
            ..Default::default()
        }));

        let app = create_router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { state, base_url }
    }

    pub fn add_sync_folder(&self, name: &str) -> usize {
        let mut state = self.state.lock();
        state.folders.push(FakeFolder {
            name: name.to_string(),
            ..Default::default()
        });
        let id = state.folders.len() - 1;
        state.sync_roots.push(id);
        id
    }

    pub fn add_folder(&self, parent: usize, name: &str) -> usize {
        let mut state = self.state.lock();
        state.folders.push(FakeFolder {
            name: name.to_string(),
            ..Default::default()
        });
        let id = state.folders.len() - 1;
        state.folders[parent].folders.push(id);
        id
    }

    pub fn add_file(&self, folder: usize, file: FakeFile) -> usize {
        let mut state = self.state.lock();
        state.files.push(file);
        let id = state.files.len() - 1;
        state.folders[folder].files.push(id);
        id
    }

    pub fn fail_listing(&self, folder: usize) {
        self.state.lock().folders[folder].fail_listing = true;
    }

    pub fn limit_access_tokens(&self, max: usize) {
        self.state.lock().max_access_tokens = Some(max);
    }

    pub fn listing_requests(&self) -> Vec<(usize, usize)> {
        self.state.lock().listing_requests.clone()
    }

    pub fn data_requests(&self) -> Vec<usize> {
        self.state.lock().data_requests.clone()
    }

    pub fn access_token_requests(&self) -> usize {
        self.state.lock().access_token_requests
    }

    pub fn credentials(&self, password: &str) -> Credentials {
        Credentials {
            username: USERNAME.to_string(),
            password: password.to_string(),
            app_id: APP_ID.to_string(),
            public_key: PUBLIC_KEY.to_string(),
            private_key: PRIVATE_KEY.to_string(),
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: format!("{}/", self.base_url),
            ..Default::default()
        }
    }

    pub fn client(&self) -> SugarSyncClient {
        SugarSyncClient::new(self.client_config(), self.credentials(PASSWORD))
            .expect("Failed to create client")
    }
}

fn create_router(state: Arc<Mutex<FakeState>>) -> Router {
    Router::new()
        .route("/app-authorization", post(create_refresh_token))
        .route("/authorization", post(create_access_token))
        .route("/user/:id", get(user_info))
        .route("/user/:id/folders/contents", get(sync_folders))
        .route("/folder/:id/contents", get(folder_contents))
        .route("/file/:id/data", get(file_data))
        .with_state(state)
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn xml_response(body: String) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/xml; charset=UTF-8")],
        body,
    )
        .into_response()
}

// ============================================================================
// Authentication
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppAuthorizationBody {
    username: String,
    password: String,
    application: String,
    access_key_id: String,
    private_access_key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenAuthBody {
    access_key_id: String,
    private_access_key: String,
    refresh_token: String,
}

/// POST /app-authorization
async fn create_refresh_token(
    State(state): State<Arc<Mutex<FakeState>>>,
    body: String,
) -> Response {
    let Ok(request) = quick_xml::de::from_str::<AppAuthorizationBody>(&body) else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    let mut state = state.lock();
    state.refresh_token_requests += 1;

    let valid = request.username == USERNAME
        && request.password == PASSWORD
        && request.application == APP_ID
        && request.access_key_id == PUBLIC_KEY
        && request.private_access_key == PRIVATE_KEY;
    if !valid {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let refresh_token = format!("{}/app-authorization/refresh-{}", state.base_url, USER_ID);
    state.refresh_token = Some(refresh_token.clone());

    (StatusCode::CREATED, [(header::LOCATION, refresh_token)]).into_response()
}

/// POST /authorization
async fn create_access_token(
    State(state): State<Arc<Mutex<FakeState>>>,
    body: String,
) -> Response {
    let Ok(request) = quick_xml::de::from_str::<TokenAuthBody>(&body) else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    let mut state = state.lock();
    let valid = request.access_key_id == PUBLIC_KEY
        && request.private_access_key == PRIVATE_KEY
        && Some(&request.refresh_token) == state.refresh_token.as_ref();
    if !valid {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if let Some(max) = state.max_access_tokens {
        if state.access_token_requests >= max {
            return StatusCode::UNAUTHORIZED.into_response();
        }
    }

    state.access_token_requests += 1;
    let token = format!("access-token-{}", state.access_token_requests);
    state.current_token = Some(token.clone());

    let user = if state.omit_user_reference {
        String::new()
    } else {
        format!("<user>{}/user/{}</user>", state.base_url, USER_ID)
    };
    let body = format!(
        "<authorization><expiration>2010-04-23T14:11:19.789-07:00</expiration>{}</authorization>",
        user
    );

    (
        StatusCode::CREATED,
        [(header::LOCATION, token)],
        body,
    )
        .into_response()
}

// ============================================================================
// Account
// ============================================================================

/// GET /user/{id}
async fn user_info(
    State(state): State<Arc<Mutex<FakeState>>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let state = state.lock();
    if !state.is_authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if id != USER_ID {
        return StatusCode::NOT_FOUND.into_response();
    }

    xml_response(format!(
        "<user><username>{}</username><nickname>jsmith</nickname><quota><limit>5368709120</limit><usage>1073741824</usage></quota><syncfolders>{}/user/{}/folders/contents</syncfolders></user>",
        USERNAME, state.base_url, USER_ID
    ))
}

/// GET /user/{id}/folders/contents
async fn sync_folders(
    State(state): State<Arc<Mutex<FakeState>>>,
    headers: HeaderMap,
) -> Response {
    let state = state.lock();
    if !state.is_authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let collections: String = state
        .sync_roots
        .iter()
        .map(|&id| state.folder_xml(id).replace("type=\"folder\"", "type=\"syncFolder\""))
        .collect();

    xml_response(format!(
        r#"<collectionContents start="0" hasMore="false" end="{}">{}</collectionContents>"#,
        state.sync_roots.len(),
        collections
    ))
}

// ============================================================================
// Folders and Files
// ============================================================================

#[derive(Debug, Deserialize)]
struct ListingQuery {
    #[serde(default)]
    start: Option<usize>,
}

enum Item {
    Folder(usize),
    File(usize),
}

/// GET /folder/{id}/contents?start=N
async fn folder_contents(
    State(state): State<Arc<Mutex<FakeState>>>,
    Path(id): Path<usize>,
    Query(query): Query<ListingQuery>,
    headers: HeaderMap,
) -> Response {
    let mut state = state.lock();
    if !state.is_authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let Some(folder) = state.folders.get(id).cloned() else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let start = query.start.unwrap_or(0);
    state.listing_requests.push((id, start));

    if folder.fail_listing {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    let items: Vec<Item> = folder
        .folders
        .iter()
        .map(|&f| Item::Folder(f))
        .chain(folder.files.iter().map(|&f| Item::File(f)))
        .skip(start)
        .take(PAGE_SIZE)
        .collect();

    let body: String = items
        .iter()
        .map(|item| match *item {
            Item::Folder(f) => state.folder_xml(f),
            Item::File(f) => state.file_xml(f),
        })
        .collect();

    let total = folder.folders.len() + folder.files.len();
    xml_response(format!(
        r#"<collectionContents start="{}" hasMore="{}" end="{}">{}</collectionContents>"#,
        start,
        start + items.len() < total,
        start + items.len(),
        body
    ))
}

/// GET /file/{id}/data
async fn file_data(
    State(state): State<Arc<Mutex<FakeState>>>,
    Path(id): Path<usize>,
    headers: HeaderMap,
) -> Response {
    let mut state = state.lock();
    if !state.is_authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let Some(file) = state.files.get(id).cloned() else {
        return StatusCode::NOT_FOUND.into_response();
    };

    state.data_requests.push(id);

    if file.fail {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/octet-stream")],
        Body::from(file.body),
    )
        .into_response()
}
