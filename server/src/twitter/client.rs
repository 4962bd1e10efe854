//! Twitter REST API v1.1 backend over HTTP.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::TwitterConfig;
use crate::model::{ListId, User, UserId};

use super::backend::{Cursor, Page, TwitterBackend};
use super::error::{TwitterError, TwitterResult};
use super::oauth::OAuthSigner;
use super::types::{ApiErrorBody, ApiList, ApiUser, CursoredUsers, ListDefinition};

/// Signed HTTP calls against the Twitter API.
#[derive(Debug)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    signer: OAuthSigner,
    configured: bool,
}

impl HttpBackend {
    pub fn new(config: &TwitterConfig) -> TwitterResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(format!("twilikt/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            signer: OAuthSigner::new(&config.credentials),
            configured: config.credentials.is_complete(),
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: Vec<(String, String)>,
    ) -> TwitterResult<T> {
        self.request(Method::GET, path, params).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        params: Vec<(String, String)>,
    ) -> TwitterResult<T> {
        self.request(Method::POST, path, params).await
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: Vec<(String, String)>,
    ) -> TwitterResult<T> {
        if !self.configured {
            return Err(TwitterError::Authentication(
                "Twitter credentials are not configured".into(),
            ));
        }

        let url = format!("{}/1.1/{}.json", self.base_url, path);
        let auth_header = self.signer.sign(method.as_str(), &url, &params)?;
        debug!(%method, path, "Twitter API request");

        let req = self
            .client
            .request(method.clone(), &url)
            .header(reqwest::header::AUTHORIZATION, auth_header);
        let req = if method == Method::GET {
            req.query(&params)
        } else {
            req.form(&params)
        };

        handle_response(req.send().await?).await
    }
}

async fn handle_response<T: DeserializeOwned>(response: Response) -> TwitterResult<T> {
    let status = response.status();
    if status.is_success() {
        let bytes = response.bytes().await?;
        return Ok(serde_json::from_slice(&bytes)?);
    }

    let retry_after = retry_after_secs(response.headers());
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .ok()
        .and_then(|b| b.message())
        .unwrap_or(body);

    Err(match status {
        StatusCode::UNAUTHORIZED => TwitterError::Authentication(message),
        StatusCode::TOO_MANY_REQUESTS => TwitterError::RateLimited {
            retry_after: retry_after.unwrap_or(60),
        },
        _ => TwitterError::RemoteFetch {
            status: Some(status.as_u16()),
            message,
        },
    })
}

/// Seconds until `x-rate-limit-reset` (a unix timestamp), if present.
fn retry_after_secs(headers: &HeaderMap) -> Option<u64> {
    let reset: u64 = headers
        .get("x-rate-limit-reset")?
        .to_str()
        .ok()?
        .parse()
        .ok()?;
    let now = SystemTime::now().duration_since(UNIX_EPOCH).ok()?.as_secs();
    Some(reset.saturating_sub(now))
}

fn param(key: &str, value: impl ToString) -> (String, String) {
    (key.to_string(), value.to_string())
}

fn id_list(ids: &[UserId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn into_page(page: CursoredUsers) -> Page<User> {
    Page {
        items: page.users.into_iter().map(User::from).collect(),
        next: (page.next_cursor != 0).then_some(Cursor(page.next_cursor)),
    }
}

#[async_trait]
impl TwitterBackend for HttpBackend {
    async fn verify_credentials(&self) -> TwitterResult<UserId> {
        let me: ApiUser = self
            .get(
                "account/verify_credentials",
                vec![param("skip_status", true), param("include_entities", false)],
            )
            .await?;
        Ok(UserId(me.id))
    }

    async fn show_user(&self, id: UserId) -> TwitterResult<User> {
        let user: ApiUser = self
            .get(
                "users/show",
                vec![param("user_id", id), param("include_entities", false)],
            )
            .await?;
        Ok(user.into())
    }

    async fn friends_page(
        &self,
        user: UserId,
        cursor: Cursor,
        count: u32,
    ) -> TwitterResult<Page<User>> {
        let page: CursoredUsers = self
            .get(
                "friends/list",
                vec![
                    param("user_id", user),
                    param("cursor", cursor.0),
                    param("count", count),
                    param("skip_status", true),
                    param("include_user_entities", false),
                ],
            )
            .await?;
        Ok(into_page(page))
    }

    async fn user_lists(&self, user: UserId) -> TwitterResult<Vec<ListDefinition>> {
        let lists: Vec<ApiList> = self
            .get("lists/list", vec![param("user_id", user)])
            .await?;
        Ok(lists.into_iter().map(ListDefinition::from).collect())
    }

    async fn list_members_page(
        &self,
        list: ListId,
        cursor: Cursor,
        count: u32,
    ) -> TwitterResult<Page<User>> {
        let page: CursoredUsers = self
            .get(
                "lists/members",
                vec![
                    param("list_id", list),
                    param("cursor", cursor.0),
                    param("count", count),
                    param("skip_status", true),
                    param("include_entities", false),
                ],
            )
            .await?;
        Ok(into_page(page))
    }

    async fn add_list_members(&self, list: ListId, users: &[UserId]) -> TwitterResult<()> {
        let _: ApiList = self
            .post(
                "lists/members/create_all",
                vec![param("list_id", list), param("user_id", id_list(users))],
            )
            .await?;
        Ok(())
    }

    async fn remove_list_members(&self, list: ListId, users: &[UserId]) -> TwitterResult<()> {
        let _: ApiList = self
            .post(
                "lists/members/destroy_all",
                vec![param("list_id", list), param("user_id", id_list(users))],
            )
            .await?;
        Ok(())
    }
}
