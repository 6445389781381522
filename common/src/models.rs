use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// Wire and storage format for every timestamp in the data-quality API
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Serde helpers for `yyyy-MM-dd HH:mm:ss` timestamps
pub mod date_time_format {
    use super::DATE_TIME_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_str(&dt.format(DATE_TIME_FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        raw.map(|s| NaiveDateTime::parse_from_str(&s, DATE_TIME_FORMAT))
            .transpose()
            .map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Rule Models
// ============================================================================

/// Classification of a data-quality rule.
///
/// Stored codes outside the known set decode as `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum RuleType {
    SingleTable,
    SingleTableCustomSql,
    MultiTableAccuracy,
    MultiTableComparison,
    Unknown(i32),
}

impl RuleType {
    /// Every known rule type, in code order
    pub const ALL: [RuleType; 4] = [
        RuleType::SingleTable,
        RuleType::SingleTableCustomSql,
        RuleType::MultiTableAccuracy,
        RuleType::MultiTableComparison,
    ];

    pub fn code(self) -> i32 {
        match self {
            RuleType::SingleTable => 0,
            RuleType::SingleTableCustomSql => 1,
            RuleType::MultiTableAccuracy => 2,
            RuleType::MultiTableComparison => 3,
            RuleType::Unknown(code) => code,
        }
    }

    /// Look up a known rule type; `None` for any other code
    pub fn known(code: i32) -> Option<RuleType> {
        RuleType::ALL.into_iter().find(|t| t.code() == code)
    }
}

impl From<i32> for RuleType {
    fn from(code: i32) -> Self {
        RuleType::known(code).unwrap_or(RuleType::Unknown(code))
    }
}

impl From<RuleType> for i32 {
    fn from(rule_type: RuleType) -> Self {
        rule_type.code()
    }
}

/// Rule-type restriction for paged rule queries.
///
/// `Any` is its own variant so that "no filter" can never be mistaken for a
/// real rule type, whatever integer the wire format uses for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuleTypeFilter {
    #[default]
    Any,
    Only(RuleType),
}

impl RuleTypeFilter {
    /// Legacy wire value meaning "all rule types"
    pub const ANY_CODE: i32 = -1;

    /// Normalize an optional wire code. Absence and `-1` both mean `Any`.
    pub fn from_code(code: Option<i32>) -> Result<Self, String> {
        match code {
            None | Some(Self::ANY_CODE) => Ok(RuleTypeFilter::Any),
            Some(code) => RuleType::known(code)
                .map(RuleTypeFilter::Only)
                .ok_or_else(|| format!("unknown rule type code: {}", code)),
        }
    }

    pub fn matches(&self, rule_type: RuleType) -> bool {
        match self {
            RuleTypeFilter::Any => true,
            RuleTypeFilter::Only(wanted) => *wanted == rule_type,
        }
    }

    /// Code bound into SQL; `None` disables the predicate
    pub fn as_code(&self) -> Option<i32> {
        match self {
            RuleTypeFilter::Any => None,
            RuleTypeFilter::Only(rule_type) => Some(rule_type.code()),
        }
    }
}

/// A data-quality rule record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DqRule {
    pub id: i32,
    pub name: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type", try_from = "i32")]
    pub rule_type: RuleType,
    pub user_id: Option<i32>,
    pub user_name: Option<String>,
    #[serde(with = "date_time_format", default)]
    pub create_time: Option<NaiveDateTime>,
    #[serde(with = "date_time_format", default)]
    pub update_time: Option<NaiveDateTime>,
    /// Serialized `RuleDefinition`, attached only by paged listings
    #[sqlx(skip)]
    pub rule_json: Option<String>,
}

/// Form-element type of an input entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FormType {
    Input,
    Select,
    Textarea,
    Group,
    /// Any stored type without a descriptor; such entries are skipped
    Unsupported(String),
}

impl FormType {
    pub fn as_str(&self) -> &str {
        match self {
            FormType::Input => "input",
            FormType::Select => "select",
            FormType::Textarea => "textarea",
            FormType::Group => "group",
            FormType::Unsupported(raw) => raw,
        }
    }
}

impl From<String> for FormType {
    fn from(raw: String) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "input" => FormType::Input,
            "select" => FormType::Select,
            "textarea" => FormType::Textarea,
            "group" => FormType::Group,
            _ => FormType::Unsupported(raw),
        }
    }
}

impl From<FormType> for String {
    fn from(form_type: FormType) -> Self {
        form_type.as_str().to_string()
    }
}

impl fmt::Display for FormType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strategy used to populate a select entry's options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionSourceType {
    Default,
    DatasourceId,
    DatasourceType,
    ComparisonType,
}

impl OptionSourceType {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(OptionSourceType::Default),
            1 => Some(OptionSourceType::DatasourceId),
            2 => Some(OptionSourceType::DatasourceType),
            3 => Some(OptionSourceType::ComparisonType),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            OptionSourceType::Default => 0,
            OptionSourceType::DatasourceId => 1,
            OptionSourceType::DatasourceType => 2,
            OptionSourceType::ComparisonType => 3,
        }
    }
}

/// One configurable form field of a rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DqRuleInputEntry {
    pub id: i32,
    pub field: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type", try_from = "String")]
    pub form_type: FormType,
    pub title: String,
    pub data: Option<String>,
    pub options: Option<String>,
    pub placeholder: Option<String>,
    pub option_source_type: i32,
    pub value_type: i32,
    pub input_type: i32,
    pub is_show: bool,
    pub can_edit: bool,
    pub is_emit: bool,
    pub is_validate: bool,
    /// Per-rule overrides as a raw JSON object
    pub values_map: Option<String>,
    pub index: i32,
    #[serde(with = "date_time_format", default)]
    pub create_time: Option<NaiveDateTime>,
    #[serde(with = "date_time_format", default)]
    pub update_time: Option<NaiveDateTime>,
}

/// One SQL fragment executed by a rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DqRuleExecuteSql {
    pub id: i32,
    pub index: i32,
    pub sql: String,
    pub table_alias: Option<String>,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub sql_type: i32,
    pub is_error_output_sql: bool,
    #[serde(with = "date_time_format", default)]
    pub create_time: Option<NaiveDateTime>,
    #[serde(with = "date_time_format", default)]
    pub update_time: Option<NaiveDateTime>,
}

/// Input entries and execute SQL of a rule, serialized into `DqRule::rule_json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleDefinition {
    pub rule_input_entry_list: Vec<DqRuleInputEntry>,
    pub execute_sql_list: Vec<DqRuleExecuteSql>,
}

// ============================================================================
// Datasource Models
// ============================================================================

/// Registered datasource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DataSource {
    pub id: i32,
    pub name: String,
    pub note: Option<String>,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub db_type: i32,
    pub user_id: Option<i32>,
    #[serde(with = "date_time_format", default)]
    pub create_time: Option<NaiveDateTime>,
    #[serde(with = "date_time_format", default)]
    pub update_time: Option<NaiveDateTime>,
}

/// Every datasource kind known to the platform, in code order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DbType {
    Mysql,
    Postgresql,
    Hive,
    Spark,
    Clickhouse,
    Oracle,
    Sqlserver,
    Db2,
    Presto,
    H2,
    Redshift,
    Athena,
    Trino,
    Starrocks,
    Azuresql,
    Dameng,
    Oceanbase,
    Ssh,
    Kyuubi,
    Databend,
    Snowflake,
    Vertica,
    Hana,
    Doris,
}

impl DbType {
    pub const ALL: [DbType; 24] = [
        DbType::Mysql,
        DbType::Postgresql,
        DbType::Hive,
        DbType::Spark,
        DbType::Clickhouse,
        DbType::Oracle,
        DbType::Sqlserver,
        DbType::Db2,
        DbType::Presto,
        DbType::H2,
        DbType::Redshift,
        DbType::Athena,
        DbType::Trino,
        DbType::Starrocks,
        DbType::Azuresql,
        DbType::Dameng,
        DbType::Oceanbase,
        DbType::Ssh,
        DbType::Kyuubi,
        DbType::Databend,
        DbType::Snowflake,
        DbType::Vertica,
        DbType::Hana,
        DbType::Doris,
    ];

    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn name(self) -> &'static str {
        match self {
            DbType::Mysql => "MYSQL",
            DbType::Postgresql => "POSTGRESQL",
            DbType::Hive => "HIVE",
            DbType::Spark => "SPARK",
            DbType::Clickhouse => "CLICKHOUSE",
            DbType::Oracle => "ORACLE",
            DbType::Sqlserver => "SQLSERVER",
            DbType::Db2 => "DB2",
            DbType::Presto => "PRESTO",
            DbType::H2 => "H2",
            DbType::Redshift => "REDSHIFT",
            DbType::Athena => "ATHENA",
            DbType::Trino => "TRINO",
            DbType::Starrocks => "STARROCKS",
            DbType::Azuresql => "AZURESQL",
            DbType::Dameng => "DAMENG",
            DbType::Oceanbase => "OCEANBASE",
            DbType::Ssh => "SSH",
            DbType::Kyuubi => "KYUUBI",
            DbType::Databend => "DATABEND",
            DbType::Snowflake => "SNOWFLAKE",
            DbType::Vertica => "VERTICA",
            DbType::Hana => "HANA",
            DbType::Doris => "DORIS",
        }
    }
}

/// Comparison-type lookup row used by comparison select fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DqComparisonType {
    pub id: i32,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub type_name: String,
    pub execute_sql: Option<String>,
    pub output_table: Option<String>,
    pub name: Option<String>,
    pub is_inner_source: bool,
    #[serde(with = "date_time_format", default)]
    pub create_time: Option<NaiveDateTime>,
    #[serde(with = "date_time_format", default)]
    pub update_time: Option<NaiveDateTime>,
}

// ============================================================================
// Paging
// ============================================================================

/// One page of results returned to API callers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo<T> {
    pub items: Vec<T>,
    pub total_count: i64,
    pub total_pages: i64,
    pub page_number: u32,
    pub page_size: u32,
}

impl<T> PageInfo<T> {
    /// An empty page with zero total
    pub fn empty(page_number: u32, page_size: u32) -> Self {
        Self::new(Vec::new(), 0, page_number, page_size)
    }

    pub fn new(items: Vec<T>, total_count: i64, page_number: u32, page_size: u32) -> Self {
        let size = i64::from(page_size.max(1));
        Self {
            items,
            total_count,
            total_pages: (total_count + size - 1) / size,
            page_number,
            page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_type_filter_normalization() {
        assert_eq!(RuleTypeFilter::from_code(None).unwrap(), RuleTypeFilter::Any);
        assert_eq!(RuleTypeFilter::from_code(Some(-1)).unwrap(), RuleTypeFilter::Any);
        assert_eq!(
            RuleTypeFilter::from_code(Some(2)).unwrap(),
            RuleTypeFilter::Only(RuleType::MultiTableAccuracy)
        );
        assert!(RuleTypeFilter::from_code(Some(42)).is_err());
    }

    #[test]
    fn test_any_filter_has_no_sql_code() {
        assert_eq!(RuleTypeFilter::Any.as_code(), None);
        assert_eq!(
            RuleTypeFilter::Only(RuleType::SingleTable).as_code(),
            Some(0)
        );
    }

    #[test]
    fn test_form_type_parsing_is_lenient() {
        assert_eq!(FormType::from("SELECT".to_string()), FormType::Select);
        assert_eq!(
            FormType::from("radio".to_string()),
            FormType::Unsupported("radio".to_string())
        );
        assert_eq!(String::from(FormType::Unsupported("radio".into())), "radio");
    }

    #[test]
    fn test_unrecognized_stored_rule_type_is_kept() {
        assert_eq!(RuleType::from(1), RuleType::SingleTableCustomSql);
        assert_eq!(RuleType::from(7), RuleType::Unknown(7));
        assert_eq!(RuleType::Unknown(7).code(), 7);

        let rule: DqRule =
            serde_json::from_str(r#"{"id":3,"name":"legacy","type":7}"#).unwrap();
        assert_eq!(rule.rule_type, RuleType::Unknown(7));
        assert_eq!(serde_json::to_value(&rule).unwrap()["type"], 7);
        assert!(!RuleTypeFilter::Only(RuleType::SingleTable).matches(rule.rule_type));
        assert!(RuleTypeFilter::Any.matches(rule.rule_type));
    }

    #[test]
    fn test_db_type_codes_follow_declaration_order() {
        for (i, db_type) in DbType::ALL.iter().enumerate() {
            assert_eq!(db_type.code(), i as i32);
        }
    }

    #[test]
    fn test_page_info_total_pages() {
        let page: PageInfo<()> = PageInfo::new(vec![], 21, 1, 10);
        assert_eq!(page.total_pages, 3);
        let empty: PageInfo<()> = PageInfo::empty(1, 10);
        assert_eq!(empty.total_pages, 0);
        assert_eq!(empty.total_count, 0);
    }

    #[test]
    fn test_rule_serializes_timestamps_in_wire_format() {
        let rule = DqRule {
            id: 1,
            name: "null_check".into(),
            rule_type: RuleType::SingleTable,
            user_id: None,
            user_name: None,
            create_time: NaiveDateTime::parse_from_str("2024-01-02 03:04:05", DATE_TIME_FORMAT)
                .ok(),
            update_time: None,
            rule_json: None,
        };
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json["createTime"], "2024-01-02 03:04:05");
        assert_eq!(json["type"], 0);
    }
}
