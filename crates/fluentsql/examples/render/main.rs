//! Example walking through fluentsql's statement rendering.
//!
//! Run with:
//!   cargo run --example render -p fluentsql
//!
//! Everything here is pure rendering: no database connection is opened; the
//! output is the SQL text and the parameter paths the execution layer would
//! resolve.

use fluentsql::{
    DbType, DeleteMarker, Entity, FieldMeta, Param, ParamStyle, SqlProvider, SqlResult,
    StatementIntent, TableMapping,
};

#[derive(Debug)]
struct User {
    id: Option<i64>,
    user_name: String,
    age: i32,
}

impl Entity for User {
    fn primary_is_set(&self) -> bool {
        self.id.is_some()
    }

    fn value(&self, property: &str) -> Option<Param> {
        match property {
            "id" => self.id.map(Param::new),
            "userName" => Some(Param::new(self.user_name.clone())),
            "age" => Some(Param::new(self.age)),
            _ => None,
        }
    }
}

fn user_mapping() -> SqlResult<TableMapping> {
    TableMapping::new(
        "t_user",
        vec![
            FieldMeta::new("id", "id").primary().auto_increment(),
            FieldMeta::new("userName", "user_name"),
            FieldMeta::new("age", "age"),
            FieldMeta::new("gmtModified", "gmt_modified").update_default("now()"),
            FieldMeta::new("version", "version")
                .version()
                .update_default("version + 1"),
            FieldMeta::new("isDeleted", "is_deleted").logic_delete(DeleteMarker::Flag),
        ],
    )
}

fn show(label: &str, rendered: &fluentsql::Rendered) {
    println!("-- {label}");
    println!("{}", rendered.sql);
    for binding in &rendered.bindings {
        println!("    binding: {}", binding.path);
    }
    println!();
}

fn main() -> SqlResult<()> {
    let mapping = user_mapping()?;
    let provider = SqlProvider::new(&mapping, DbType::Mysql);

    let alice = User {
        id: None,
        user_name: "alice".to_string(),
        age: 30,
    };
    show("insert", &provider.insert(&alice)?);

    let bob = User {
        id: None,
        user_name: "bob".to_string(),
        age: 25,
    };
    show(
        "insert batch",
        &provider.insert_batch(&[&alice as &dyn Entity, &bob], false)?,
    );

    show("find by id", &provider.find_by_id(Param::new(1i64))?);

    let listing = StatementIntent::new()
        .like("user_name", "a%")
        .gt("age", 18i32)
        .order_by("gmt_modified DESC")
        .paged(20, 10);
    show("paged list", &provider.list(&listing)?);
    show("count without page", &provider.count_no_limit(&listing)?);

    let update = StatementIntent::new()
        .set("age", 31i32)
        .eq("id", 1i64)
        .eq("version", 3i32);
    show("versioned update", &provider.update(&update)?);

    // Omitting the version predicate trips the optimistic-lock guard.
    let unguarded = StatementIntent::new().set("age", 31i32).eq("id", 1i64);
    match provider.update(&unguarded) {
        Err(err) => println!("-- unguarded update refused\n{err}\n"),
        Ok(_) => unreachable!(),
    }

    show(
        "logical delete",
        &provider.logic_delete_by_ids(&[Param::new(1i64), Param::new(2i64)])?,
    );

    let batch = vec![
        StatementIntent::new()
            .set("age", 31i32)
            .eq("id", 1i64)
            .eq("version", 3i32),
        StatementIntent::new()
            .set("age", 26i32)
            .eq("id", 2i64)
            .eq("version", 1i32),
    ];
    show("batch update", &provider.update_batch(&batch)?);

    // Positional placeholders carry the values alongside the text.
    let positional = SqlProvider::new(&mapping, DbType::Postgres).param_style(ParamStyle::Positional);
    let rendered = positional.delete_by_map(&[("user_name", Param::new("alice"))])?;
    show("positional delete", &rendered);
    println!("positional values carried: {}", rendered.values().len());

    Ok(())
}
