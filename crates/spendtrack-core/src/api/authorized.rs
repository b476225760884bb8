//! Authenticated requests with a single refresh-and-retry on 401.

use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::auth::SessionManager;
use crate::models::ExpenseRecord;

use super::client::{ApiClient, ApiRequest, EXPENSES_PATH};
use super::ApiError;

/// Issues requests on behalf of the session.
///
/// A 401 on an authenticated call triggers at most one refresh and at most
/// one retry; whatever the retry returns is final.
#[derive(Clone)]
pub struct AuthorizedClient {
    api: ApiClient,
    session: SessionManager,
}

impl AuthorizedClient {
    pub fn new(session: SessionManager) -> Self {
        Self {
            api: session.api().clone(),
            session,
        }
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Send `request` and decode its JSON body
    pub async fn request<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T, ApiError> {
        let response = self.send(request).await?;
        ApiClient::parse_json(response).await
    }

    async fn send(&self, request: &ApiRequest) -> Result<reqwest::Response, ApiError> {
        if !request.requires_auth {
            return self.api.execute(request, None).await;
        }

        let token = self.session.access_token().ok_or(ApiError::NotAuthenticated)?;
        match self.api.execute(request, Some(&token)).await {
            Err(ApiError::Unauthorized) => {
                info!(url = %request.url, "Request rejected, refreshing session");
                if !self.session.refresh_after_rejection(&token).await {
                    warn!(url = %request.url, "Session refresh failed");
                    return Err(ApiError::Unauthorized);
                }

                let retry_token = self.session.access_token().ok_or(ApiError::NotAuthenticated)?;
                debug!(url = %request.url, "Retrying with refreshed token");
                self.api.execute(request, Some(&retry_token)).await
            }
            other => other,
        }
    }

    // ===== Data Fetching Methods =====

    /// Fetch all expenses recorded for `user_id`
    pub async fn fetch_expenses(&self, user_id: &str) -> Result<Vec<ExpenseRecord>, ApiError> {
        let request = ApiRequest::get(self.api.expense_url(EXPENSES_PATH))
            .query("user_id", user_id)
            .authenticated();
        let expenses: Vec<ExpenseRecord> = self.request(&request).await?;
        debug!(count = expenses.len(), "Expenses fetched");
        Ok(expenses)
    }
}
