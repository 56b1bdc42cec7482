//! API version 8.8: the unified Camunda v2 API

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

pub struct V88Client {
    http: HttpCore,
    camunda: Url,
    tenant: Option<String>,
}

impl V88Client {
    pub fn new(http: HttpCore, api: &ApiConfig) -> ClientResult<Self> {
        Ok(Self {
            http,
            camunda: http::parse_base(&api.camunda_base_url)?,
            tenant: api.tenant.clone(),
        })
    }
}

#[async_trait]
impl ResourceClient for V88Client {
    fn api_version(&self) -> ApiVersion {
        ApiVersion::V88
    }

    async fn fetch_by_key(&self, ctx: &CallContext, key: ResourceKey) -> ClientResult<ProcessInstance> {
        let url = http::endpoint(&self.camunda, &format!("/v2/process-instances/{key}"))?;
        let response = self.http.send(ctx, self.http.request(Method::GET, url)).await?;
        match response.status() {
            StatusCode::OK => http::json::<V2ProcessInstance>(ctx, response)
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
        let url = http::endpoint(&self.camunda, "/v2/process-instances/search")?;
        let body = V2SearchRequest {
            filter: V2Filter::from_search(filter, self.tenant.clone()),
            page: V2Page { limit: size },
        };
        let response = self
            .http
            .send(ctx, self.http.request(Method::POST, url).json(&body))
            .await?;
        if response.status() != StatusCode::OK {
            return Err(http::unexpected(ctx, response).await);
        }
        let results: V2Results = http::json(ctx, response).await?;
        let items = results
            .items
            .into_iter()
            .map(V2ProcessInstance::into_instance)
            .collect::<ClientResult<Vec<_>>>()?;
        let total = results
            .page
            .and_then(|p| p.total_items)
            .unwrap_or(items.len() as i64);
        Ok(ProcessInstances { total, items })
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

    async fn delete(&self, _ctx: &CallContext, _key: ResourceKey) -> ClientResult<ChangeStatus> {
        Err(ClientError::NotSupported {
            operation: "delete",
            version: ApiVersion::V88,
        })
    }
}

// ============================================================
// Wire types
// ============================================================

/// v2 keys are strings on the wire; older gateways still send numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireKey {
    Number(i64),
    Text(String),
}

impl WireKey {
    fn parse(self, field: &str) -> ClientResult<ResourceKey> {
        match self {
            Self::Number(n) => Ok(ResourceKey::new(n)),
            Self::Text(s) => s
                .parse()
                .map_err(|_| ClientError::InvalidResponse(format!("{field} {s:?} is not a key"))),
        }
    }
}

fn optional_key(key: Option<WireKey>, field: &str) -> ClientResult<Option<ResourceKey>> {
    key.map(|k| k.parse(field)).transpose()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct V2ProcessInstance {
    process_instance_key: Option<WireKey>,
    process_definition_id: Option<String>,
    process_definition_version: Option<i32>,
    process_definition_version_tag: Option<String>,
    process_definition_key: Option<WireKey>,
    parent_process_instance_key: Option<WireKey>,
    parent_element_instance_key: Option<WireKey>,
    start_date: Option<String>,
    end_date: Option<String>,
    state: Option<String>,
    has_incident: Option<bool>,
    tenant_id: Option<String>,
}

impl V2ProcessInstance {
    fn into_instance(self) -> ClientResult<ProcessInstance> {
        let key = self
            .process_instance_key
            .ok_or_else(|| ClientError::InvalidResponse("process instance without key".into()))?
            .parse("processInstanceKey")?;
        Ok(ProcessInstance {
            key,
            parent_key: optional_key(self.parent_process_instance_key, "parentProcessInstanceKey")?,
            parent_flow_node_instance_key: optional_key(
                self.parent_element_instance_key,
                "parentElementInstanceKey",
            )?,
            process_definition_key: optional_key(self.process_definition_key, "processDefinitionKey")?,
            state: self.state.map(State::from).unwrap_or(State::Other(String::new())),
            bpmn_process_id: self.process_definition_id.unwrap_or_default(),
            process_version: self.process_definition_version.unwrap_or_default(),
            process_version_tag: self.process_definition_version_tag.filter(|t| !t.is_empty()),
            tenant_id: self.tenant_id.unwrap_or_default(),
            start_date: self.start_date,
            end_date: self.end_date,
            incident: self.has_incident.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct V2Filter {
    #[serde(skip_serializing_if = "Option::is_none")]
    process_instance_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tenant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    process_definition_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    process_definition_version: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    process_definition_version_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_process_instance_key: Option<String>,
}

impl V2Filter {
    fn from_search(filter: &SearchFilter, tenant: Option<String>) -> Self {
        Self {
            process_instance_key: filter.key.map(|k| k.to_string()),
            tenant_id: tenant,
            process_definition_id: filter.bpmn_process_id.clone(),
            process_definition_version: filter.process_version,
            process_definition_version_tag: filter.process_version_tag.clone(),
            state: match &filter.state {
                StateFilter::All => None,
                // 8.8 calls a canceled instance TERMINATED
                StateFilter::Only(State::Canceled) => Some("TERMINATED".into()),
                StateFilter::Only(state) => Some(state.as_str().to_ascii_uppercase()),
            },
            parent_process_instance_key: filter.parent_key.map(|k| k.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct V2SearchRequest {
    filter: V2Filter,
    page: V2Page,
}

#[derive(Debug, Serialize)]
struct V2Page {
    limit: i32,
}

#[derive(Debug, Deserialize)]
struct V2Results {
    #[serde(default)]
    items: Vec<V2ProcessInstance>,
    page: Option<V2PageInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct V2PageInfo {
    total_items: Option<i64>,
}
