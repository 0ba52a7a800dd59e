//! Integration tests driving the full render path: mapping + intent in,
//! SQL text and bindings out.

use crate::{
    DbType, DeleteMarker, Entity, FieldMeta, Param, ParamStyle, SqlError, SqlProvider,
    StatementIntent, TableMapping,
};

fn simple_mapping() -> TableMapping {
    TableMapping::new(
        "t_user",
        vec![
            FieldMeta::new("id", "id").primary().auto_increment(),
            FieldMeta::new("userName", "user_name"),
            FieldMeta::new("gmtCreated", "gmt_created"),
        ],
    )
    .unwrap()
}

fn versioned_mapping() -> TableMapping {
    TableMapping::new(
        "t_user",
        vec![
            FieldMeta::new("id", "id").primary().auto_increment(),
            FieldMeta::new("userName", "user_name"),
            FieldMeta::new("gmtModified", "gmt_modified").update_default("now()"),
            FieldMeta::new("version", "version")
                .version()
                .update_default("version + 1"),
            FieldMeta::new("isDeleted", "is_deleted").logic_delete(DeleteMarker::Flag),
        ],
    )
    .unwrap()
}

fn audit_mapping() -> TableMapping {
    TableMapping::new(
        "t_audit",
        vec![
            FieldMeta::new("id", "id").primary(),
            FieldMeta::new("message", "message"),
            FieldMeta::new("deleteTime", "delete_time").logic_delete(DeleteMarker::Timestamp),
        ],
    )
    .unwrap()
}

struct User {
    id: Option<i64>,
    user_name: String,
    gmt_created: String,
    shard: Option<String>,
}

impl User {
    fn named(user_name: &str) -> Self {
        Self {
            id: None,
            user_name: user_name.to_string(),
            gmt_created: "2024-01-01 00:00:00".to_string(),
            shard: None,
        }
    }
}

impl Entity for User {
    fn primary_is_set(&self) -> bool {
        self.id.is_some()
    }

    fn table_override(&self) -> Option<String> {
        self.shard.clone()
    }

    fn value(&self, property: &str) -> Option<Param> {
        match property {
            "id" => self.id.map(Param::new),
            "userName" => Some(Param::new(self.user_name.clone())),
            "gmtCreated" => Some(Param::new(self.gmt_created.clone())),
            _ => None,
        }
    }
}

fn fixed_clock() -> i64 {
    1_700_000_000_000
}

// ==================== INSERT ====================

#[test]
fn test_insert_named_style() {
    let mapping = simple_mapping();
    let provider = SqlProvider::new(&mapping, DbType::Mysql);
    let rendered = provider.insert(&User::named("alice")).unwrap();
    assert_eq!(
        rendered.sql,
        "INSERT INTO t_user (user_name, gmt_created) \
         VALUES (#{entity.userName}, #{entity.gmtCreated})"
    );
    assert_eq!(rendered.bindings[0].path, "entity.userName");
    assert_eq!(rendered.bindings[1].path, "entity.gmtCreated");
}

#[test]
fn test_insert_positional_style() {
    let mapping = simple_mapping();
    let provider = SqlProvider::new(&mapping, DbType::Mysql).param_style(ParamStyle::Positional);
    let rendered = provider.insert(&User::named("alice")).unwrap();
    assert_eq!(
        rendered.sql,
        "INSERT INTO t_user (user_name, gmt_created) VALUES (?, ?)"
    );
    assert_eq!(rendered.values().len(), 2);
}

#[test]
fn test_insert_rejects_preset_primary_key() {
    let mapping = simple_mapping();
    let provider = SqlProvider::new(&mapping, DbType::Mysql);
    let mut user = User::named("alice");
    user.id = Some(7);
    let err = provider.insert(&user).unwrap_err();
    assert!(matches!(err, SqlError::PrimaryKeyPolicy(_)));
}

#[test]
fn test_insert_with_pk_requires_primary_key() {
    let mapping = simple_mapping();
    let provider = SqlProvider::new(&mapping, DbType::Mysql);
    let err = provider.insert_with_pk(&User::named("alice")).unwrap_err();
    assert!(matches!(err, SqlError::PrimaryKeyPolicy(_)));

    let mut user = User::named("alice");
    user.id = Some(7);
    let rendered = provider.insert_with_pk(&user).unwrap();
    assert_eq!(
        rendered.sql,
        "INSERT INTO t_user (id, user_name, gmt_created) \
         VALUES (#{entity.id}, #{entity.userName}, #{entity.gmtCreated})"
    );
}

#[test]
fn test_insert_uses_entity_table_override() {
    let mapping = simple_mapping();
    let provider = SqlProvider::new(&mapping, DbType::Mysql);
    let mut user = User::named("alice");
    user.shard = Some("t_user_3".to_string());
    let rendered = provider.insert(&user).unwrap();
    assert!(rendered.sql.starts_with("INSERT INTO t_user_3 "));
}

#[test]
fn test_insert_batch_shares_column_list() {
    let mapping = simple_mapping();
    let provider = SqlProvider::new(&mapping, DbType::Mysql);
    let a = User::named("alice");
    let b = User::named("bob");
    let rendered = provider.insert_batch(&[&a as &dyn Entity, &b], false).unwrap();
    assert_eq!(
        rendered.sql,
        "INSERT INTO t_user (user_name, gmt_created) \
         VALUES (#{list[0].userName}, #{list[0].gmtCreated}), \
         (#{list[1].userName}, #{list[1].gmtCreated})"
    );
}

#[test]
fn test_insert_batch_rejects_empty() {
    let mapping = simple_mapping();
    let provider = SqlProvider::new(&mapping, DbType::Mysql);
    let err = provider.insert_batch(&[], false).unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn test_insert_select() {
    let mapping = simple_mapping();
    let provider = SqlProvider::new(&mapping, DbType::Mysql);
    let query = StatementIntent::new()
        .table("t_user_archive")
        .eq("gmt_created", "2023-12-31");
    let rendered = provider.insert_select(&["user_name"], &query).unwrap();
    assert_eq!(
        rendered.sql,
        "INSERT INTO t_user_archive (user_name) SELECT user_name FROM t_user_archive \
         WHERE gmt_created = #{ew.parameters.p1}"
    );
}

// ==================== SELECT ====================

#[test]
fn test_find_by_id() {
    let mapping = simple_mapping();
    let provider = SqlProvider::new(&mapping, DbType::Mysql);
    let rendered = provider.find_by_id(Param::new(1i64)).unwrap();
    assert_eq!(
        rendered.sql,
        "SELECT id, user_name, gmt_created FROM t_user WHERE id = #{value}"
    );
    assert_eq!(rendered.bindings[0].path, "value");
}

#[test]
fn test_list_by_ids_single_renders_equality() {
    let mapping = simple_mapping();
    let provider = SqlProvider::new(&mapping, DbType::Mysql);
    let rendered = provider.list_by_ids(&[Param::new(1i64)]).unwrap();
    assert_eq!(
        rendered.sql,
        "SELECT id, user_name, gmt_created FROM t_user WHERE id = #{list[0]}"
    );
}

#[test]
fn test_list_by_ids_many_renders_in_list() {
    let mapping = simple_mapping();
    let provider = SqlProvider::new(&mapping, DbType::Mysql);
    let ids = [Param::new(1i64), Param::new(2i64), Param::new(3i64)];
    let rendered = provider.list_by_ids(&ids).unwrap();
    assert_eq!(
        rendered.sql,
        "SELECT id, user_name, gmt_created FROM t_user \
         WHERE id IN (#{list[0]}, #{list[1]}, #{list[2]})"
    );
}

#[test]
fn test_list_by_ids_rejects_empty() {
    let mapping = simple_mapping();
    let provider = SqlProvider::new(&mapping, DbType::Mysql);
    assert!(provider.list_by_ids(&[]).unwrap_err().is_validation());
}

#[test]
fn test_list_by_map_preserves_caller_order() {
    let mapping = simple_mapping();
    let provider = SqlProvider::new(&mapping, DbType::Mysql);
    let rendered = provider
        .list_by_map(&[("user_name", Param::new("alice")), ("id", Param::new(1i64))])
        .unwrap();
    assert_eq!(
        rendered.sql,
        "SELECT id, user_name, gmt_created FROM t_user \
         WHERE user_name = #{cm.user_name} AND id = #{cm.id}"
    );
}

#[test]
fn test_list_with_group_order_and_page() {
    let mapping = simple_mapping();
    let provider = SqlProvider::new(&mapping, DbType::Mysql);
    let intent = StatementIntent::new()
        .gt("id", 100i64)
        .group_by("user_name")
        .order_by("gmt_created DESC")
        .paged(20, 10);
    let rendered = provider.list(&intent).unwrap();
    assert_eq!(
        rendered.sql,
        "SELECT id, user_name, gmt_created FROM t_user WHERE id > #{ew.parameters.p1} \
         GROUP BY user_name ORDER BY gmt_created DESC LIMIT 20, 10"
    );
}

#[test]
fn test_list_pagination_follows_dialect() {
    let mapping = simple_mapping();
    let intent = StatementIntent::new().gt("id", 0i64).paged(20, 10);
    let mysql = SqlProvider::new(&mapping, DbType::Mysql)
        .list(&intent)
        .unwrap();
    assert!(mysql.sql.ends_with("LIMIT 20, 10"));
    let pg = SqlProvider::new(&mapping, DbType::Postgres)
        .list(&intent)
        .unwrap();
    assert!(pg.sql.ends_with("LIMIT 10 OFFSET 20"));
}

#[test]
fn test_count_honors_page_window() {
    let mapping = simple_mapping();
    let provider = SqlProvider::new(&mapping, DbType::Mysql);
    let intent = StatementIntent::new().gt("id", 0i64).limit(10);
    let rendered = provider.count(&intent).unwrap();
    assert_eq!(
        rendered.sql,
        "SELECT COUNT(*) FROM t_user WHERE id > #{ew.parameters.p1} LIMIT 10"
    );
}

#[test]
fn test_count_no_limit_drops_order_and_page() {
    let mapping = simple_mapping();
    let provider = SqlProvider::new(&mapping, DbType::Mysql);
    let intent = StatementIntent::new()
        .eq("user_name", "alice")
        .group_by("user_name")
        .order_by("gmt_created DESC")
        .paged(20, 10);
    let rendered = provider.count_no_limit(&intent).unwrap();
    assert_eq!(
        rendered.sql,
        "SELECT COUNT(*) FROM t_user WHERE user_name = #{ew.parameters.p1} GROUP BY user_name"
    );
}

#[test]
fn test_customized_sql_short_circuits() {
    let mapping = simple_mapping();
    let provider = SqlProvider::new(&mapping, DbType::Mysql);
    let intent = StatementIntent::new().customized_sql("SELECT 1 FROM dual");
    for rendered in [
        provider.list(&intent).unwrap(),
        provider.count(&intent).unwrap(),
        provider.delete(&intent).unwrap(),
        provider.update(&intent).unwrap(),
    ] {
        assert_eq!(rendered.sql, "SELECT 1 FROM dual");
        assert!(rendered.bindings.is_empty());
    }
}

// ==================== DELETE ====================

#[test]
fn test_delete_requires_a_predicate() {
    let mapping = simple_mapping();
    let provider = SqlProvider::new(&mapping, DbType::Mysql);
    let err = provider.delete(&StatementIntent::new()).unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn test_delete_by_intent() {
    let mapping = simple_mapping();
    let provider = SqlProvider::new(&mapping, DbType::Mysql);
    let intent = StatementIntent::new().eq("user_name", "alice");
    let rendered = provider.delete(&intent).unwrap();
    assert_eq!(
        rendered.sql,
        "DELETE FROM t_user WHERE user_name = #{ew.parameters.p1}"
    );
}

#[test]
fn test_delete_by_ids() {
    let mapping = simple_mapping();
    let provider = SqlProvider::new(&mapping, DbType::Mysql);
    let one = provider.delete_by_ids(&[Param::new(1i64)]).unwrap();
    assert_eq!(one.sql, "DELETE FROM t_user WHERE id = #{list[0]}");
    let many = provider
        .delete_by_ids(&[Param::new(1i64), Param::new(2i64)])
        .unwrap();
    assert_eq!(
        many.sql,
        "DELETE FROM t_user WHERE id IN (#{list[0]}, #{list[1]})"
    );
}

#[test]
fn test_delete_by_map_positional() {
    let mapping = simple_mapping();
    let provider = SqlProvider::new(&mapping, DbType::Mysql).param_style(ParamStyle::Positional);
    let rendered = provider
        .delete_by_map(&[("user_name", Param::new("alice")), ("id", Param::new(1i64))])
        .unwrap();
    assert_eq!(rendered.sql, "DELETE FROM t_user WHERE user_name = ? AND id = ?");
    assert_eq!(rendered.values().len(), 2);
}

#[test]
fn test_delete_by_map_rejects_empty() {
    let mapping = simple_mapping();
    let provider = SqlProvider::new(&mapping, DbType::Mysql);
    assert!(provider.delete_by_map(&[]).unwrap_err().is_validation());
}

#[test]
fn test_logic_delete_flag_marker() {
    let mapping = versioned_mapping();
    let provider = SqlProvider::new(&mapping, DbType::Mysql);
    let rendered = provider.logic_delete_by_ids(&[Param::new(1i64)]).unwrap();
    assert_eq!(
        rendered.sql,
        "UPDATE t_user SET is_deleted = true WHERE id = #{list[0]}"
    );
}

#[test]
fn test_logic_delete_timestamp_marker_uses_clock() {
    let mapping = audit_mapping();
    let provider = SqlProvider::new(&mapping, DbType::Mysql).with_clock(fixed_clock);
    let rendered = provider.logic_delete_by_ids(&[Param::new(1i64)]).unwrap();
    assert_eq!(
        rendered.sql,
        "UPDATE t_audit SET delete_time = 1700000000000 WHERE id = #{list[0]}"
    );
}

#[test]
fn test_logic_delete_without_marker_field_is_configuration_error() {
    let mapping = simple_mapping();
    let provider = SqlProvider::new(&mapping, DbType::Mysql);
    let intent = StatementIntent::new().eq("id", 1i64);
    let err = provider.logic_delete(&intent).unwrap_err();
    assert!(matches!(err, SqlError::Configuration(_)));
}

#[test]
fn test_logic_delete_by_map() {
    let mapping = versioned_mapping();
    let provider = SqlProvider::new(&mapping, DbType::Mysql);
    let rendered = provider
        .logic_delete_by_map(&[("user_name", Param::new("alice"))])
        .unwrap();
    assert_eq!(
        rendered.sql,
        "UPDATE t_user SET is_deleted = true WHERE user_name = #{cm.user_name}"
    );
}

// ==================== UPDATE ====================

#[test]
fn test_update_fills_defaults_and_enforces_version() {
    let mapping = versioned_mapping();
    let provider = SqlProvider::new(&mapping, DbType::Mysql);
    let intent = StatementIntent::new()
        .set("user_name", "alice")
        .eq("version", 3i32)
        .eq("id", 1i64);
    let rendered = provider.update(&intent).unwrap();
    assert_eq!(
        rendered.sql,
        "UPDATE t_user SET gmt_modified = now(), version = version + 1, \
         user_name = #{ew.parameters.p1} \
         WHERE version = #{ew.parameters.p2} AND id = #{ew.parameters.p3}"
    );
}

#[test]
fn test_update_missing_version_condition_is_guarded() {
    let mapping = versioned_mapping();
    let provider = SqlProvider::new(&mapping, DbType::Mysql);
    let intent = StatementIntent::new().set("user_name", "alice").eq("id", 1i64);
    let err = provider.update(&intent).unwrap_err();
    assert!(err.is_lock_guard());
}

#[test]
fn test_update_ignore_lock_version_drops_version_default() {
    let mapping = versioned_mapping();
    let provider = SqlProvider::new(&mapping, DbType::Mysql);
    let intent = StatementIntent::new()
        .set("user_name", "alice")
        .eq("id", 1i64)
        .ignore_lock_version(true);
    let rendered = provider.update(&intent).unwrap();
    assert_eq!(
        rendered.sql,
        "UPDATE t_user SET gmt_modified = now(), user_name = #{ew.parameters.p1} \
         WHERE id = #{ew.parameters.p2}"
    );
}

#[test]
fn test_update_explicit_assignment_beats_default() {
    let mapping = versioned_mapping();
    let provider = SqlProvider::new(&mapping, DbType::Mysql);
    let intent = StatementIntent::new()
        .set_raw("gmt_modified", "'2024-06-01'")
        .eq("version", 3i32)
        .eq("id", 1i64);
    let rendered = provider.update(&intent).unwrap();
    assert_eq!(
        rendered.sql,
        "UPDATE t_user SET version = version + 1, gmt_modified = '2024-06-01' \
         WHERE version = #{ew.parameters.p1} AND id = #{ew.parameters.p2}"
    );
}

#[test]
fn test_update_without_assignments_is_rejected() {
    let mapping = simple_mapping();
    let provider = SqlProvider::new(&mapping, DbType::Mysql);
    let intent = StatementIntent::new().eq("id", 1i64);
    assert!(provider.update(&intent).unwrap_err().is_validation());
}

#[test]
fn test_update_limit_only_on_supporting_dialects() {
    let mapping = simple_mapping();
    let intent = StatementIntent::new()
        .set("user_name", "alice")
        .eq("id", 1i64)
        .limit(1);
    let mysql = SqlProvider::new(&mapping, DbType::Mysql)
        .update(&intent)
        .unwrap();
    assert!(mysql.sql.ends_with("LIMIT 1"));
    let pg = SqlProvider::new(&mapping, DbType::Postgres)
        .update(&intent)
        .unwrap();
    assert!(!pg.sql.contains("LIMIT"));
}

#[test]
fn test_update_batch_renumbers_parameter_roots() {
    let mapping = simple_mapping();
    let provider = SqlProvider::new(&mapping, DbType::Mysql);
    let intents = vec![
        StatementIntent::new().set("user_name", "alice").eq("id", 1i64),
        StatementIntent::new().set("user_name", "bob").eq("id", 2i64),
    ];
    let rendered = provider.update_batch(&intents).unwrap();
    assert_eq!(
        rendered.sql,
        "UPDATE t_user SET user_name = #{ew[0].parameters.p1} WHERE id = #{ew[0].parameters.p2};\n\
         UPDATE t_user SET user_name = #{ew[1].parameters.p1} WHERE id = #{ew[1].parameters.p2}"
    );
    let paths: Vec<_> = rendered.bindings.iter().map(|b| b.path.as_str()).collect();
    assert_eq!(
        paths,
        [
            "ew[0].parameters.p1",
            "ew[0].parameters.p2",
            "ew[1].parameters.p1",
            "ew[1].parameters.p2",
        ]
    );
}

#[test]
fn test_update_batch_rejects_empty() {
    let mapping = simple_mapping();
    let provider = SqlProvider::new(&mapping, DbType::Mysql);
    assert!(provider.update_batch(&[]).unwrap_err().is_validation());
}

#[test]
fn test_intent_table_override() {
    let mapping = simple_mapping();
    let provider = SqlProvider::new(&mapping, DbType::Mysql);
    let intent = StatementIntent::new().table("t_user_7").eq("id", 1i64);
    let rendered = provider.list(&intent).unwrap();
    assert_eq!(
        rendered.sql,
        "SELECT id, user_name, gmt_created FROM t_user_7 WHERE id = #{ew.parameters.p1}"
    );
}
