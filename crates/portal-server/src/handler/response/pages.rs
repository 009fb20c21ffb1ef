use portal_origin::User;
use serde::Serialize;
use serde_json::Value;

/// Data of the landing page. Every section may be empty.
#[must_use]
#[derive(Debug, Clone, Default, Serialize)]
pub struct HomePage {
    pub user: Option<User>,
    pub trending: Vec<Value>,
    pub top_rated: Vec<Value>,
    pub airing: Vec<Value>,
    pub continue_watching: Vec<Value>,
}

/// Filters echoed back to the search page.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchFilters {
    pub genres: String,
    pub status: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub sort: String,
}

/// Data of the search page.
#[must_use]
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchPage {
    pub user: Option<User>,
    pub results: Vec<Value>,
    pub total: u64,
    pub query: String,
    pub filters: SearchFilters,
    pub page: u32,
}

/// Data of an anime detail page.
///
/// `anime` is `null` and `error` set when the title could not be loaded.
#[must_use]
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnimePage {
    pub user: Option<User>,
    pub anime: Option<Value>,
    pub episodes: Vec<Value>,
    pub ratings: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

/// Data of the player page. `sources` is `null` when the origin had none.
#[must_use]
#[derive(Debug, Clone, Serialize)]
pub struct WatchPage {
    pub user: Option<User>,
    pub episode_id: String,
    pub sources: Option<Value>,
}

/// Data of the profile page.
#[must_use]
#[derive(Debug, Clone, Serialize)]
pub struct ProfilePage {
    pub user: Option<User>,
    pub continue_watching: Vec<Value>,
}

/// Data of the login and registration pages.
#[must_use]
#[derive(Debug, Clone, Serialize)]
pub struct AuthPage {
    pub user: Option<User>,
    pub return_to: String,
}
