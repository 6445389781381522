use axum::{
    extract::{rejection::PathRejection, Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::str::FromStr;

use crate::handlers::{ErrorResponse, SuccessResponse};
use crate::state::AppState;
use common::dq::{ParamsOptions, RulePageRequest};
use common::errors::DqRuleError;
use common::models::{DqRule, PageInfo};

/// Query parameters for the paged rule listing.
///
/// Numeric parameters arrive as raw text and are parsed by `TryFrom`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RulePageQuery {
    pub search_val: Option<String>,
    /// Rule type code; absent or -1 lists every type
    pub rule_type: Option<String>,
    /// `yyyy-MM-dd HH:mm:ss`
    pub start_date: Option<String>,
    /// `yyyy-MM-dd HH:mm:ss`
    pub end_date: Option<String>,
    pub page_no: Option<String>,
    pub page_size: Option<String>,
}

impl TryFrom<RulePageQuery> for RulePageRequest {
    type Error = DqRuleError;

    fn try_from(query: RulePageQuery) -> Result<Self, Self::Error> {
        Ok(Self {
            rule_type: parse_number(query.rule_type.as_deref(), "ruleType")?,
            page_no: required_number(query.page_no.as_deref(), "pageNo")?,
            page_size: required_number(query.page_size.as_deref(), "pageSize")?,
            search_val: query.search_val,
            start_time: query.start_date,
            end_time: query.end_date,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasourceOptionsQuery {
    pub datasource_type: Option<String>,
}

/// Blank or absent is `None`; anything else must parse
fn parse_number<T: FromStr>(raw: Option<&str>, name: &str) -> Result<Option<T>, DqRuleError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(|_| DqRuleError::invalid_params(name)),
    }
}

fn required_number<T: FromStr>(raw: Option<&str>, name: &str) -> Result<T, DqRuleError> {
    parse_number(raw, name)?.ok_or_else(|| DqRuleError::invalid_params(name))
}

/// Form descriptors for creating a task from a rule.
///
/// `data` is the descriptor array as a JSON string, or null when it could
/// not be encoded.
#[tracing::instrument(skip(state))]
pub async fn get_rule_form(
    State(state): State<AppState>,
    rule_id: Result<Path<i32>, PathRejection>,
) -> Result<Json<SuccessResponse<Option<String>>>, ErrorResponse> {
    let Path(rule_id) = rule_id.map_err(|_| DqRuleError::invalid_params("ruleId"))?;
    let form = state.dq_rules.build_form_descriptor(rule_id).await?;
    Ok(Json(SuccessResponse::new(form)))
}

#[tracing::instrument(skip(state))]
pub async fn list_all_rules(
    State(state): State<AppState>,
) -> Result<Json<SuccessResponse<Vec<DqRule>>>, ErrorResponse> {
    let rules = state.dq_rules.list_all_rules().await?;
    Ok(Json(SuccessResponse::new(rules)))
}

#[tracing::instrument(skip(state))]
pub async fn list_rules_paged(
    State(state): State<AppState>,
    Query(query): Query<RulePageQuery>,
) -> Result<Json<SuccessResponse<PageInfo<DqRule>>>, ErrorResponse> {
    let page = state.dq_rules.list_rules_paged(query.try_into()?).await?;
    Ok(Json(SuccessResponse::new(page)))
}

#[tracing::instrument(skip(state))]
pub async fn datasource_options(
    State(state): State<AppState>,
    Query(query): Query<DatasourceOptionsQuery>,
) -> Result<Json<SuccessResponse<Vec<ParamsOptions>>>, ErrorResponse> {
    let datasource_type =
        required_number(query.datasource_type.as_deref(), "datasourceType")?;
    let options = state
        .dq_rules
        .list_datasource_options(datasource_type)
        .await?;
    Ok(Json(SuccessResponse::new(options)))
}
