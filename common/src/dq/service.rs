// Data-quality rule query and form-descriptor service

use super::form::{
    parse_json_list, GroupParam, InputParam, JsonEncoding, ParamBase, ParamsOptions, PluginParams,
    SelectParam,
};
use super::normalize::transform_input_entries;
use super::store::{
    ComparisonTypeStore, DataSourceStore, RuleExecuteSqlStore, RuleInputEntryStore, RuleQuery,
    RuleStore,
};
use crate::config::DataQualityConfig;
use crate::errors::{DqOperation, DqRuleError};
use crate::models::{
    DbType, DqRule, DqRuleInputEntry, FormType, OptionSourceType, PageInfo, RuleDefinition,
    RuleTypeFilter, DATE_TIME_FORMAT,
};
use crate::telemetry;
use chrono::NaiveDateTime;
use futures::{stream, StreamExt, TryStreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

/// Immutable service settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DqServiceOptions {
    /// Encoding of form descriptor arrays
    pub form_encoding: JsonEncoding,
    /// Encoding of the `ruleJson` attached to paged rules
    pub rule_json_encoding: JsonEncoding,
    pub enrichment_concurrency: usize,
    pub max_page_size: u32,
}

impl Default for DqServiceOptions {
    fn default() -> Self {
        Self::from(&DataQualityConfig::default())
    }
}

impl From<&DataQualityConfig> for DqServiceOptions {
    fn from(config: &DataQualityConfig) -> Self {
        Self {
            form_encoding: JsonEncoding {
                omit_null_fields: config.omit_null_fields,
            },
            rule_json_encoding: JsonEncoding::default(),
            enrichment_concurrency: config.enrichment_concurrency.max(1),
            max_page_size: config.max_page_size,
        }
    }
}

/// Raw paging request as received from the API layer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RulePageRequest {
    pub search_val: Option<String>,
    pub rule_type: Option<i32>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub page_no: i64,
    pub page_size: i64,
}

/// Loads rule metadata and renders rule input forms
#[derive(Clone)]
pub struct DqRuleService {
    rules: Arc<dyn RuleStore>,
    input_entries: Arc<dyn RuleInputEntryStore>,
    execute_sqls: Arc<dyn RuleExecuteSqlStore>,
    data_sources: Arc<dyn DataSourceStore>,
    comparison_types: Arc<dyn ComparisonTypeStore>,
    options: DqServiceOptions,
}

impl DqRuleService {
    pub fn new(
        rules: Arc<dyn RuleStore>,
        input_entries: Arc<dyn RuleInputEntryStore>,
        execute_sqls: Arc<dyn RuleExecuteSqlStore>,
        data_sources: Arc<dyn DataSourceStore>,
        comparison_types: Arc<dyn ComparisonTypeStore>,
        options: DqServiceOptions,
    ) -> Self {
        Self {
            rules,
            input_entries,
            execute_sqls,
            data_sources,
            comparison_types,
            options,
        }
    }

    /// Build the service from one store that serves every entity
    pub fn from_store<S>(store: Arc<S>, options: DqServiceOptions) -> Self
    where
        S: RuleStore
            + RuleInputEntryStore
            + RuleExecuteSqlStore
            + DataSourceStore
            + ComparisonTypeStore
            + 'static,
    {
        Self::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store,
            options,
        )
    }

    /// Render the create form of a rule as a JSON array of descriptors.
    ///
    /// Returns `Ok(None)` when the assembled descriptors cannot be encoded.
    #[instrument(skip(self))]
    pub async fn build_form_descriptor(&self, rule_id: i32) -> Result<Option<String>, DqRuleError> {
        let result = self.render_form(rule_id).await;
        record_outcome(DqOperation::BuildFormDescriptor, &result);
        result
    }

    async fn render_form(&self, rule_id: i32) -> Result<Option<String>, DqRuleError> {
        let entries = self
            .input_entries
            .list_by_rule_id(rule_id)
            .await
            .map_err(|e| DqRuleError::database(DqOperation::BuildFormDescriptor, e))?;

        if entries.is_empty() {
            telemetry::record_form_descriptor("not_found");
            return Err(DqRuleError::InputEntriesNotFound { rule_id });
        }

        let params = self
            .build_descriptors(transform_input_entries(entries))
            .await?;
        telemetry::record_descriptor_count(params.len());

        match self.options.form_encoding.encode(&params) {
            Ok(json) => {
                telemetry::record_form_descriptor("ok");
                tracing::debug!(rule_id, descriptors = params.len(), "Rule form built");
                Ok(Some(json))
            }
            Err(e) => {
                telemetry::record_form_descriptor("encode_failed");
                tracing::error!(rule_id, error = %e, "Failed to encode rule form descriptors");
                Ok(None)
            }
        }
    }

    /// One descriptor per visible entry with a supported form type, in entry order
    pub async fn build_descriptors(
        &self,
        entries: Vec<DqRuleInputEntry>,
    ) -> Result<Vec<PluginParams>, DqRuleError> {
        let mut params = Vec::with_capacity(entries.len());

        for entry in entries.into_iter().filter(|e| e.is_show) {
            let base = ParamBase {
                field: entry.field.clone(),
                title: entry.title.clone(),
                required: entry.is_validate,
                emit: entry.is_emit,
            };

            let param = match &entry.form_type {
                FormType::Input => PluginParams::Input(InputParam::text(
                    &base,
                    !entry.can_edit,
                    entry.data.clone(),
                    entry.placeholder.clone(),
                )),
                FormType::Textarea => PluginParams::Input(InputParam::textarea(
                    &base,
                    !entry.can_edit,
                    entry.data.clone(),
                    entry.placeholder.clone(),
                )),
                FormType::Select => PluginParams::Select(SelectParam::new(
                    &base,
                    self.resolve_options(&entry).await?,
                    entry.data.clone(),
                    entry.placeholder.clone(),
                )),
                FormType::Group => PluginParams::Group(GroupParam::new(
                    &base,
                    parse_json_list(entry.options.as_deref(), "group rules"),
                )),
                FormType::Unsupported(raw) => {
                    tracing::debug!(field = %entry.field, form_type = %raw, "Skipping unsupported form type");
                    continue;
                }
            };
            params.push(param);
        }

        Ok(params)
    }

    async fn resolve_options(
        &self,
        entry: &DqRuleInputEntry,
    ) -> Result<Option<Vec<ParamsOptions>>, DqRuleError> {
        let options = match OptionSourceType::from_code(entry.option_source_type) {
            Some(OptionSourceType::Default) => entry
                .options
                .as_deref()
                .filter(|raw| !raw.trim().is_empty())
                .map(|raw| parse_json_list(Some(raw), "select options")),
            Some(OptionSourceType::DatasourceType) => Some(
                DbType::ALL
                    .iter()
                    .map(|db_type| ParamsOptions::new(db_type.name(), db_type.code(), false))
                    .collect(),
            ),
            Some(OptionSourceType::ComparisonType) => {
                let types = self
                    .comparison_types
                    .list_ordered_by_id_asc()
                    .await
                    .map_err(|e| DqRuleError::database(DqOperation::BuildFormDescriptor, e))?;
                Some(
                    types
                        .into_iter()
                        .map(|t| ParamsOptions::new(t.type_name, t.id, false))
                        .collect(),
                )
            }
            Some(OptionSourceType::DatasourceId) | None => None,
        };

        Ok(options)
    }

    /// Datasources of one type as selectable options, in query order
    #[instrument(skip(self))]
    pub async fn list_datasource_options(
        &self,
        datasource_type: i32,
    ) -> Result<Vec<ParamsOptions>, DqRuleError> {
        let result = self
            .data_sources
            .list_by_type(datasource_type)
            .await
            .map(|data_sources| {
                data_sources
                    .into_iter()
                    .map(|ds| ParamsOptions::new(ds.name, ds.id, false))
                    .collect()
            })
            .map_err(|e| DqRuleError::database(DqOperation::ListDatasourceOptions, e));

        record_outcome(DqOperation::ListDatasourceOptions, &result);
        result
    }

    #[instrument(skip(self))]
    pub async fn list_all_rules(&self) -> Result<Vec<DqRule>, DqRuleError> {
        let result = self
            .rules
            .list_all()
            .await
            .map_err(|e| DqRuleError::database(DqOperation::ListAllRules, e));

        record_outcome(DqOperation::ListAllRules, &result);
        result
    }

    /// Filtered page of rules, each row carrying its serialized rule definition
    #[instrument(skip(self))]
    pub async fn list_rules_paged(
        &self,
        request: RulePageRequest,
    ) -> Result<PageInfo<DqRule>, DqRuleError> {
        let started = Instant::now();
        let result = self.load_rule_page(&request).await;

        telemetry::record_rule_page_duration(started.elapsed().as_secs_f64());
        record_outcome(DqOperation::ListRulesPaged, &result);
        result
    }

    async fn load_rule_page(
        &self,
        request: &RulePageRequest,
    ) -> Result<PageInfo<DqRule>, DqRuleError> {
        let query = self.rule_query(request)?;

        let page = self
            .rules
            .query_paged(&query)
            .await
            .map_err(|e| DqRuleError::database(DqOperation::ListRulesPaged, e))?;

        let Some(page) = page else {
            return Ok(PageInfo::empty(query.page_number, query.page_size));
        };

        let records = stream::iter(page.records.into_iter().map(|rule| self.attach_rule_json(rule)))
            .buffered(self.options.enrichment_concurrency.max(1))
            .try_collect::<Vec<_>>()
            .await?;

        tracing::debug!(
            total = page.total,
            returned = records.len(),
            "Rule page loaded"
        );

        Ok(PageInfo::new(
            records,
            page.total,
            query.page_number,
            query.page_size,
        ))
    }

    fn rule_query(&self, request: &RulePageRequest) -> Result<RuleQuery, DqRuleError> {
        let page_number = u32::try_from(request.page_no)
            .ok()
            .filter(|n| *n >= 1)
            .ok_or_else(|| DqRuleError::invalid_params("pageNo"))?;
        let page_size = u32::try_from(request.page_size)
            .ok()
            .filter(|n| *n >= 1 && *n <= self.options.max_page_size)
            .ok_or_else(|| DqRuleError::invalid_params("pageSize"))?;

        let (start, end) = parse_time(request.start_time.as_deref())
            .and_then(|start| Ok((start, parse_time(request.end_time.as_deref())?)))
            .map_err(|e| {
                tracing::debug!(error = %e, "Invalid rule page time window");
                DqRuleError::invalid_params("startTime,endTime")
            })?;

        let rule_type = RuleTypeFilter::from_code(request.rule_type)
            .map_err(|_| DqRuleError::invalid_params("ruleType"))?;

        Ok(RuleQuery {
            search_text: request.search_val.clone(),
            rule_type,
            start,
            end,
            page_number,
            page_size,
        })
    }

    async fn attach_rule_json(&self, mut rule: DqRule) -> Result<DqRule, DqRuleError> {
        let paging_error = |e| DqRuleError::database(DqOperation::ListRulesPaged, e);

        let entries = self
            .input_entries
            .list_by_rule_id(rule.id)
            .await
            .map_err(paging_error)?;
        let execute_sqls = self
            .execute_sqls
            .list_by_rule_id(rule.id)
            .await
            .map_err(paging_error)?;

        let definition = RuleDefinition {
            rule_input_entry_list: transform_input_entries(entries),
            execute_sql_list: execute_sqls,
        };

        rule.rule_json = match self.options.rule_json_encoding.encode(&definition) {
            Ok(json) => Some(json),
            Err(e) => {
                tracing::error!(rule_id = rule.id, error = %e, "Failed to encode rule definition");
                None
            }
        };
        Ok(rule)
    }
}

fn record_outcome<T>(operation: DqOperation, result: &Result<T, DqRuleError>) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(e) if e.is_validation() => "invalid",
        Err(_) => "error",
    };
    telemetry::record_operation(operation.as_str(), outcome);
}

/// Parse an optional wire timestamp; absent or empty means unbounded
fn parse_time(raw: Option<&str>) -> Result<Option<NaiveDateTime>, chrono::ParseError> {
    match raw {
        None | Some("") => Ok(None),
        Some(s) => NaiveDateTime::parse_from_str(s, DATE_TIME_FORMAT).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dq::store::{
        MockComparisonTypeStore, MockDataSourceStore, MockRuleExecuteSqlStore,
        MockRuleInputEntryStore, MockRuleStore, Page,
    };
    use crate::errors::{DatabaseError, Status};
    use crate::models::RuleType;

    fn input_entry(id: i32, field: &str, form_type: FormType) -> DqRuleInputEntry {
        DqRuleInputEntry {
            id,
            field: field.to_string(),
            form_type,
            title: format!("$t({})", field),
            data: None,
            options: None,
            placeholder: None,
            option_source_type: 0,
            value_type: 0,
            input_type: 0,
            is_show: true,
            can_edit: true,
            is_emit: false,
            is_validate: true,
            values_map: None,
            index: id,
            create_time: None,
            update_time: None,
        }
    }

    fn rule(id: i32) -> DqRule {
        DqRule {
            id,
            name: format!("rule-{}", id),
            rule_type: RuleType::SingleTable,
            user_id: None,
            user_name: None,
            create_time: None,
            update_time: None,
            rule_json: None,
        }
    }

    struct Mocks {
        rules: MockRuleStore,
        entries: MockRuleInputEntryStore,
        sqls: MockRuleExecuteSqlStore,
        data_sources: MockDataSourceStore,
        comparison_types: MockComparisonTypeStore,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                rules: MockRuleStore::new(),
                entries: MockRuleInputEntryStore::new(),
                sqls: MockRuleExecuteSqlStore::new(),
                data_sources: MockDataSourceStore::new(),
                comparison_types: MockComparisonTypeStore::new(),
            }
        }

        fn into_service(self) -> DqRuleService {
            DqRuleService::new(
                Arc::new(self.rules),
                Arc::new(self.entries),
                Arc::new(self.sqls),
                Arc::new(self.data_sources),
                Arc::new(self.comparison_types),
                DqServiceOptions::default(),
            )
        }
    }

    #[tokio::test]
    async fn test_empty_input_entries_is_not_found() {
        let mut mocks = Mocks::new();
        mocks
            .entries
            .expect_list_by_rule_id()
            .returning(|_| Ok(vec![]));

        let err = mocks.into_service().build_form_descriptor(9).await.unwrap_err();
        assert_eq!(err.status(), Status::QUERY_RULE_INPUT_ENTRY_LIST_ERROR);
    }

    #[tokio::test]
    async fn test_static_select_never_touches_comparison_types() {
        let mut mocks = Mocks::new();
        let mut select = input_entry(1, "operator", FormType::Select);
        select.options = Some(r#"[{"label":"=","value":"="}]"#.to_string());
        mocks
            .entries
            .expect_list_by_rule_id()
            .returning(move |_| Ok(vec![select.clone()]));
        mocks.comparison_types.expect_list_ordered_by_id_asc().times(0);

        let json = mocks
            .into_service()
            .build_form_descriptor(1)
            .await
            .unwrap()
            .unwrap();
        assert!(json.contains(r#""label":"=""#));
    }

    #[tokio::test]
    async fn test_group_passes_through_unfamiliar_nested_rules() {
        let mut group = input_entry(1, "comparison", FormType::Group);
        group.options = Some(
            r#"[{"type":"radio","field":"mode","props":{"button":true}},
                {"type":"input","field":"value","props":{"clearable":true}}]"#
                .to_string(),
        );

        let params = Mocks::new()
            .into_service()
            .build_descriptors(vec![group])
            .await
            .unwrap();
        let PluginParams::Group(group) = &params[0] else {
            panic!("expected a group descriptor");
        };
        let rules = &group.props.as_ref().unwrap().rules;

        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0]["type"], "radio");
        assert_eq!(rules[0]["props"]["button"], true);
        assert_eq!(rules[1]["props"]["clearable"], true);
        assert!(rules[1].get("name").is_none());
    }

    #[tokio::test]
    async fn test_comparison_lookup_failure_is_a_form_error() {
        let mut mocks = Mocks::new();
        let mut select = input_entry(1, "comparison_type", FormType::Select);
        select.option_source_type = OptionSourceType::ComparisonType.code();
        mocks
            .entries
            .expect_list_by_rule_id()
            .returning(move |_| Ok(vec![select.clone()]));
        mocks
            .comparison_types
            .expect_list_ordered_by_id_asc()
            .times(1)
            .returning(|| Err(DatabaseError::QueryFailed("down".into())));

        let err = mocks.into_service().build_form_descriptor(1).await.unwrap_err();
        assert_eq!(err.status(), Status::GET_RULE_FORM_CREATE_JSON_ERROR);
    }

    #[tokio::test]
    async fn test_enrichment_only_touches_page_rows() {
        let mut mocks = Mocks::new();
        mocks.rules.expect_query_paged().times(1).returning(|query| {
            assert_eq!(query.rule_type, RuleTypeFilter::Any);
            Ok(Some(Page {
                records: vec![rule(1), rule(2)],
                total: 50,
            }))
        });
        mocks
            .entries
            .expect_list_by_rule_id()
            .times(2)
            .returning(|id| Ok(vec![input_entry(id, "src_table", FormType::Input)]));
        mocks
            .sqls
            .expect_list_by_rule_id()
            .times(2)
            .returning(|_| Ok(vec![]));

        let page = mocks
            .into_service()
            .list_rules_paged(RulePageRequest {
                page_no: 1,
                page_size: 2,
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(page.total_count, 50);
        assert_eq!(page.total_pages, 25);
        assert_eq!(
            page.items.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![1, 2]
        );
        let definition: serde_json::Value =
            serde_json::from_str(page.items[0].rule_json.as_deref().unwrap()).unwrap();
        assert_eq!(definition["ruleInputEntryList"][0]["field"], "src_table");
        assert!(definition["executeSqlList"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_page_is_empty_result() {
        let mut mocks = Mocks::new();
        mocks.rules.expect_query_paged().returning(|_| Ok(None));
        mocks.entries.expect_list_by_rule_id().times(0);

        let page = mocks
            .into_service()
            .list_rules_paged(RulePageRequest {
                page_no: 2,
                page_size: 10,
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(page.items.is_empty());
        assert_eq!(page.total_count, 0);
        assert_eq!(page.page_number, 2);
    }

    #[tokio::test]
    async fn test_invalid_time_never_reaches_store() {
        let mut mocks = Mocks::new();
        mocks.rules.expect_query_paged().times(0);

        let err = mocks
            .into_service()
            .list_rules_paged(RulePageRequest {
                start_time: Some("2024-01-01 00:00:00".into()),
                end_time: Some("2024/01/31".into()),
                page_no: 1,
                page_size: 10,
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "request parameter startTime,endTime is not valid");
    }

    #[tokio::test]
    async fn test_page_parameters_are_validated() {
        let service = Mocks::new().into_service();

        let err = service
            .list_rules_paged(RulePageRequest {
                page_no: 0,
                page_size: 10,
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(err.user_message().contains("pageNo"));

        let err = service
            .list_rules_paged(RulePageRequest {
                page_no: 1,
                page_size: 100_000,
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(err.user_message().contains("pageSize"));
    }

    #[tokio::test]
    async fn test_unknown_rule_type_code_is_rejected() {
        let err = Mocks::new()
            .into_service()
            .list_rules_paged(RulePageRequest {
                rule_type: Some(99),
                page_no: 1,
                page_size: 10,
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(err.user_message().contains("ruleType"));
    }

    #[tokio::test]
    async fn test_list_all_rules_maps_database_errors() {
        let mut mocks = Mocks::new();
        mocks
            .rules
            .expect_list_all()
            .returning(|| Err(DatabaseError::ConnectionFailed("refused".into())));

        let err = mocks.into_service().list_all_rules().await.unwrap_err();
        assert_eq!(err.status(), Status::QUERY_RULE_LIST_ERROR);
    }

    #[test]
    fn test_every_operation_records_its_outcome() {
        use crate::dq::InMemoryDqStore;
        use metrics_exporter_prometheus::PrometheusBuilder;

        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let service =
            DqRuleService::from_store(Arc::new(InMemoryDqStore::new()), DqServiceOptions::default());

        metrics::with_local_recorder(&recorder, || {
            futures::executor::block_on(async {
                service.list_all_rules().await.unwrap();
                service.list_datasource_options(1).await.unwrap();
                service
                    .list_rules_paged(RulePageRequest {
                        page_no: 1,
                        page_size: 10,
                        ..Default::default()
                    })
                    .await
                    .unwrap();
                service.build_form_descriptor(3).await.unwrap_err();
            })
        });

        let rendered = handle.render();
        let counted = |operation: &str, outcome: &str| {
            rendered.lines().any(|line| {
                line.starts_with("dq_operation_total{")
                    && line.contains(&format!("operation=\"{}\"", operation))
                    && line.contains(&format!("outcome=\"{}\"", outcome))
                    && line.ends_with(" 1")
            })
        };
        assert!(counted("list_all_rules", "ok"));
        assert!(counted("list_datasource_options", "ok"));
        assert!(counted("list_rules_paged", "ok"));
        assert!(counted("build_form_descriptor", "error"));
        assert!(rendered.contains("dq_rule_page_duration_seconds_count 1"));
    }

    #[test]
    fn test_parse_time_accepts_only_wire_format() {
        assert_eq!(parse_time(None).unwrap(), None);
        assert_eq!(parse_time(Some("")).unwrap(), None);
        assert!(parse_time(Some("2024-02-03 04:05:06")).unwrap().is_some());
        assert!(parse_time(Some("2024-02-03T04:05:06")).is_err());
        assert!(parse_time(Some("not-a-date")).is_err());
    }
}
