use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::{GitHubError, Result};

const API_ENDPOINT: &str = "https://api.github.com/graphql";
const USER_AGENT: &str = concat!("ghi/", env!("CARGO_PKG_VERSION"));

pub struct GitHubClient {
    http: Client,
    endpoint: String,
    token: String,
}

#[derive(Serialize)]
struct GraphQLRequest<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    variables: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLError>>,
}

#[derive(Deserialize, Debug)]
struct GraphQLError {
    message: String,
}

impl GitHubClient {
    pub fn new(token: String) -> Self {
        Self::with_endpoint(API_ENDPOINT.to_string(), token)
    }

    /// Point the client at a different GraphQL endpoint (used by tests).
    pub fn with_endpoint(endpoint: String, token: String) -> Self {
        Self {
            http: Client::new(),
            endpoint,
            token,
        }
    }

    pub async fn query<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Option<serde_json::Value>,
    ) -> Result<T> {
        let request = GraphQLRequest { query, variables };

        let response = self
            .http
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("User-Agent", USER_AGENT)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GitHubError::ApiError {
                status: response.status().as_u16(),
                message: response
                    .text()
                    .await
                    .unwrap_or_else(|_| "<failed to read response body>".to_string()),
            });
        }

        let gql_response: GraphQLResponse<T> = response.json().await?;

        // Partial data alongside errors is still an error condition.
        if let Some(errors) = gql_response.errors {
            return Err(GitHubError::GraphQL {
                messages: errors.into_iter().map(|e| e.message).collect(),
            });
        }

        gql_response.data.ok_or(GitHubError::EmptyResponse)
    }
}
