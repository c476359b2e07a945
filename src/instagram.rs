// instagram.rs - Public Instagram profile retrieval
// Uses the same web-profile endpoint the instagram.com web client calls.

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

use crate::error::OsintError;

const PROFILE_ENDPOINT: &str = "https://i.instagram.com/api/v1/users/web_profile_info/";
const WEB_APP_ID: &str = "936619743392459";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct InstagramClient {
    client: Client,
    endpoint: String,
}

impl InstagramClient {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            endpoint: PROFILE_ENDPOINT.to_string(),
        }
    }

    /// Point at another endpoint (tests, proxies)
    pub fn with_endpoint(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub async fn profile(&self, username: &str) -> Result<Value, OsintError> {
        let username = username.trim().trim_start_matches('@');

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("username", username)])
            .header("x-ig-app-id", WEB_APP_ID)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .map_err(|e| OsintError::Transport(format!("Instagram request failed: {}", e)))?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                return Err(OsintError::Lookup(format!("Profile {} does not exist.", username)));
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
                return Err(OsintError::Lookup(format!(
                    "Instagram refused the request (HTTP {}). Try again later.",
                    response.status().as_u16()
                )));
            }
            status if !status.is_success() => {
                return Err(OsintError::Transport(format!(
                    "Instagram returned HTTP {}",
                    status.as_u16()
                )));
            }
            _ => {}
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| OsintError::Lookup(format!("Malformed profile response: {}", e)))?;

        normalize_profile(username, &body)
    }
}

/// Reduce the web-profile payload to the fields the dashboard shows
pub fn normalize_profile(username: &str, body: &Value) -> Result<Value, OsintError> {
    let user = &body["data"]["user"];
    if !user.is_object() {
        return Err(OsintError::Lookup(format!("Profile {} does not exist.", username)));
    }

    let count = |v: &Value| v["count"].as_u64().unwrap_or(0);

    let recent_posts: Vec<Value> = user["edge_owner_to_timeline_media"]["edges"]
        .as_array()
        .map(|edges| {
            edges
                .iter()
                .map(|edge| &edge["node"])
                .filter(|node| !node["is_ad"].as_bool().unwrap_or(false))
                .map(|node| {
                    let caption = node["edge_media_to_caption"]["edges"]
                        .get(0)
                        .and_then(|c| c["node"]["text"].as_str())
                        .unwrap_or("");
                    json!({
                        "url": node["display_url"].as_str().unwrap_or(""),
                        "shortcode": node["shortcode"].as_str().unwrap_or(""),
                        "likes": count(&node["edge_liked_by"]),
                        "comments": count(&node["edge_media_to_comment"]),
                        "caption": caption,
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(json!({
        "username": user["username"].as_str().unwrap_or(username),
        "full_name": user["full_name"].as_str().unwrap_or(""),
        "biography": user["biography"].as_str().unwrap_or(""),
        "followers": count(&user["edge_followed_by"]),
        "following": count(&user["edge_follow"]),
        "posts": count(&user["edge_owner_to_timeline_media"]),
        "is_private": user["is_private"].as_bool().unwrap_or(false),
        "is_verified": user["is_verified"].as_bool().unwrap_or(false),
        "profile_pic_url": user["profile_pic_url_hd"]
            .as_str()
            .or_else(|| user["profile_pic_url"].as_str())
            .unwrap_or(""),
        "recent_posts": recent_posts,
    }))
}
