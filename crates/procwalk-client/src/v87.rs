//! API version 8.7: Operate v1 for reads and deletes, Camunda v2 for cancellation

use crate::http::{self, HttpCore};
use crate::provider::{ClientError, ClientResult, ResourceClient};
use async_trait::async_trait;
use procwalk_core::{
    ApiConfig, ApiVersion, CallContext, ChangeStatus, ProcessInstance, ProcessInstances,
    ResourceKey, SearchFilter, State, StateFilter,
};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

/// Operate's 400 message for deleting an instance that is still running.
const WRONG_STATE_MESSAGE: &str = "needs to be in one of the states [COMPLETED, CANCELED]";

pub struct V87Client {
    http: HttpCore,
    operate: Url,
    camunda: Url,
    tenant: Option<String>,
}

impl V87Client {
    pub fn new(http: HttpCore, api: &ApiConfig) -> ClientResult<Self> {
        Ok(Self {
            http,
            operate: http::parse_base(&api.operate_base_url)?,
            camunda: http::parse_base(&api.camunda_base_url)?,
            tenant: api.tenant.clone(),
        })
    }
}

#[async_trait]
impl ResourceClient for V87Client {
    fn api_version(&self) -> ApiVersion {
        ApiVersion::V87
    }

    async fn fetch_by_key(&self, ctx: &CallContext, key: ResourceKey) -> ClientResult<ProcessInstance> {
        let url = http::endpoint(&self.operate, &format!("/v1/process-instances/{key}"))?;
        let response = self.http.send(ctx, self.http.request(Method::GET, url)).await?;
        match response.status() {
            StatusCode::OK => http::json::<OperateProcessInstance>(ctx, response)
                .await?
                .into_instance(),
            StatusCode::NOT_FOUND => Err(ClientError::NotFound { key }),
            _ => Err(http::unexpected(ctx, response).await),
        }
    }

    async fn search(
        &self,
        ctx: &CallContext,
        filter: &SearchFilter,
        size: i32,
    ) -> ClientResult<ProcessInstances> {
        let url = http::endpoint(&self.operate, "/v1/process-instances/search")?;
        let body = OperateSearchRequest {
            filter: OperateFilter::from_search(filter, self.tenant.clone()),
            size,
        };
        let response = self
            .http
            .send(ctx, self.http.request(Method::POST, url).json(&body))
            .await?;
        if response.status() != StatusCode::OK {
            return Err(http::unexpected(ctx, response).await);
        }
        let results: OperateResults = http::json(ctx, response).await?;
        let items = results
            .items
            .unwrap_or_default()
            .into_iter()
            .map(OperateProcessInstance::into_instance)
            .collect::<ClientResult<Vec<_>>>()?;
        Ok(ProcessInstances {
            total: results.total.unwrap_or(items.len() as i64),
            items,
        })
    }

    async fn cancel(&self, ctx: &CallContext, key: ResourceKey) -> ClientResult<()> {
        debug!("trying to cancel process instance with key {key}...");
        let url = http::endpoint(&self.camunda, &format!("/v2/process-instances/{key}/cancellation"))?;
        let request = self
            .http
            .request(Method::POST, url)
            .json(&serde_json::json!({}));
        let response = self.http.send(ctx, request).await?;
        match response.status() {
            StatusCode::NO_CONTENT => {
                info!("process instance with key {key} was successfully cancelled");
                Ok(())
            }
            StatusCode::NOT_FOUND => Err(ClientError::NotFound { key }),
            _ => Err(http::unexpected(ctx, response).await),
        }
    }

    async fn delete(&self, ctx: &CallContext, key: ResourceKey) -> ClientResult<ChangeStatus> {
        debug!("trying to delete process instance with key {key}...");
        let url = http::endpoint(&self.operate, &format!("/v1/process-instances/{key}"))?;
        let response = self.http.send(ctx, self.http.request(Method::DELETE, url)).await?;
        match response.status() {
            StatusCode::OK => {
                let status: OperateChangeStatus = http::json(ctx, response).await?;
                info!("process instance with key {key} was successfully deleted");
                Ok(ChangeStatus {
                    deleted: status.deleted.unwrap_or_default(),
                    message: status.message.unwrap_or_default(),
                })
            }
            StatusCode::NOT_FOUND => Err(ClientError::NotFound { key }),
            StatusCode::BAD_REQUEST => {
                let body = http::error_body(ctx, response).await;
                let message = serde_json::from_str::<ProblemDetail>(&body)
                    .ok()
                    .and_then(|p| p.message)
                    .unwrap_or_else(|| body.clone());
                if message.contains(WRONG_STATE_MESSAGE) {
                    Err(ClientError::WrongState { key, message })
                } else {
                    Err(ClientError::UnexpectedStatus { status: 400, body })
                }
            }
            _ => Err(http::unexpected(ctx, response).await),
        }
    }
}

// ============================================================
// Wire types
// ============================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperateProcessInstance {
    key: Option<i64>,
    process_version: Option<i32>,
    process_version_tag: Option<String>,
    bpmn_process_id: Option<String>,
    parent_key: Option<i64>,
    parent_flow_node_instance_key: Option<i64>,
    start_date: Option<String>,
    end_date: Option<String>,
    state: Option<String>,
    incident: Option<bool>,
    process_definition_key: Option<i64>,
    tenant_id: Option<String>,
}

impl OperateProcessInstance {
    fn into_instance(self) -> ClientResult<ProcessInstance> {
        let key = self
            .key
            .ok_or_else(|| ClientError::InvalidResponse("process instance without key".into()))?;
        Ok(ProcessInstance {
            key: ResourceKey::new(key),
            parent_key: self.parent_key.map(ResourceKey::new),
            parent_flow_node_instance_key: self.parent_flow_node_instance_key.map(ResourceKey::new),
            process_definition_key: self.process_definition_key.map(ResourceKey::new),
            state: self.state.map(State::from).unwrap_or(State::Other(String::new())),
            bpmn_process_id: self.bpmn_process_id.unwrap_or_default(),
            process_version: self.process_version.unwrap_or_default(),
            process_version_tag: self.process_version_tag.filter(|t| !t.is_empty()),
            tenant_id: self.tenant_id.unwrap_or_default(),
            start_date: self.start_date,
            end_date: self.end_date,
            incident: self.incident.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct OperateFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tenant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bpmn_process_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    process_version: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    process_version_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_key: Option<i64>,
}

impl OperateFilter {
    fn from_search(filter: &SearchFilter, tenant: Option<String>) -> Self {
        Self {
            key: filter.key.map(ResourceKey::get),
            tenant_id: tenant,
            bpmn_process_id: filter.bpmn_process_id.clone(),
            process_version: filter.process_version,
            process_version_tag: filter.process_version_tag.clone(),
            state: match &filter.state {
                StateFilter::All => None,
                StateFilter::Only(state) => Some(state.as_str().to_ascii_uppercase()),
            },
            parent_key: filter.parent_key.map(ResourceKey::get),
        }
    }
}

#[derive(Debug, Serialize)]
struct OperateSearchRequest {
    filter: OperateFilter,
    size: i32,
}

#[derive(Debug, Deserialize)]
struct OperateResults {
    items: Option<Vec<OperateProcessInstance>>,
    total: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct OperateChangeStatus {
    deleted: Option<i64>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProblemDetail {
    message: Option<String>,
}
