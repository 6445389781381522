// SQL query constants for repositories

/// SQL query fragments for t_ds_dq_rule
pub mod rule_queries {
    /// Rule columns joined with the owning user's name
    pub const SELECT_WITH_USER: &str = r#"SELECT a.id, a.name, a.type, a.user_id, b.user_name,
        a.create_time, a.update_time
        FROM t_ds_dq_rule a
        LEFT JOIN t_ds_user b ON a.user_id = b.id"#;

    /// Shared predicate for paged listing and its count.
    /// $1 search pattern, $2 rule type code, $3 start, $4 end; NULL disables each.
    pub const PAGE_FILTER: &str = r#"WHERE ($1::text IS NULL OR a.name ILIKE $1 ESCAPE '\')
        AND ($2::int IS NULL OR a.type = $2)
        AND ($3::timestamp IS NULL OR a.update_time > $3)
        AND ($4::timestamp IS NULL OR a.update_time <= $4)"#;
}

/// SQL query fragments for rule input entries
pub mod input_entry_queries {
    /// Entry columns with the per-rule overrides and order from the relation table
    pub const SELECT_BY_RULE: &str = r#"SELECT a.id, a.field, a.type, a.title, a.data,
        a.options, a.placeholder, a.option_source_type, a.value_type, a.input_type,
        a.is_show, a.can_edit, a.is_emit, a.is_validate,
        b.values_map, b."index", a.create_time, a.update_time
        FROM t_ds_dq_rule_input_entry a
        JOIN t_ds_relation_rule_input_entry b ON a.id = b.rule_input_entry_id
        WHERE b.rule_id = $1
        ORDER BY b.id"#;
}

/// SQL query fragments for rule execute SQL
pub mod execute_sql_queries {
    pub const SELECT_BY_RULE: &str = r#"SELECT a.id, a."index", a.sql, a.table_alias, a.type,
        a.is_error_output_sql, a.create_time, a.update_time
        FROM t_ds_dq_rule_execute_sql a
        JOIN t_ds_relation_rule_execute_sql b ON a.id = b.execute_sql_id
        WHERE b.rule_id = $1
        ORDER BY b.id"#;
}
