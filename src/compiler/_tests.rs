#[cfg(test)]
pub mod fixtures {
    use serde_json::{Map, Value};

    use crate::{
        column::{Column, Template},
        compiler::{Compiler, PostgresAdapter},
        expr::Fragment,
        view::View,
    };

    pub fn users() -> View {
        View::table("users", |t| Template::map([("id", t.column("id").into()), ("name", t.column("name").into())]))
    }

    pub fn orders() -> View {
        View::table("orders", |t| {
            Template::map([
                ("id", t.column("id").into()),
                ("user_id", t.column("user_id").into()),
                ("amount", t.nullable("amount").into()),
            ])
        })
    }

    pub fn order_counts(orders: &View) -> View {
        orders
            .group_by(
                |o| o["user_id"].clone(),
                |_| Template::map([("count", Column::expr(false, "count(*)").into())]),
            )
            .unwrap()
    }

    pub fn name_like(users: &View, pattern: &str) -> View {
        users
            .and_where(|u| Fragment::sql(|e| format!("{} like {}", e.emit(&u["name"]), e.param(pattern))))
            .unwrap()
    }

    pub fn same_id(base: &Template, extra: &Template) -> Fragment {
        Fragment::sql(|e| format!("{} = {}", e.emit(&base["id"]), e.emit(&extra["keys"])))
    }

    pub fn owner_is(base: &Template, extra: &Template) -> Fragment {
        Fragment::sql(|e| format!("{} = {}", e.emit(&base["id"]), e.emit(&extra["user_id"])))
    }

    pub fn pg() -> Compiler<PostgresAdapter> {
        Compiler::new(PostgresAdapter)
    }

    pub fn row(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde::Deserialize;
    use serde_json::json;

    use super::fixtures::*;
    use crate::{
        body::Direction,
        column::{Column, DecodeError, Formats, Template},
        compiler::{Compiler, CompilerConfig, SqliteAdapter},
        expr::Fragment,
        view::JoinMode,
    };

    #[test]
    fn unreferenced_lazy_join_is_left_out() {
        let users = users();
        let counts = order_counts(&orders());
        let view = name_like(&users, "%x%")
            .join(&counts, JoinMode::Lazy, true, same_id)
            .unwrap()
            .order(Direction::Desc, |r| Fragment::from(&r["base"]["id"]))
            .unwrap()
            .take(10)
            .map_to(|r| r["base"].clone())
            .unwrap();

        let q = pg().compile(&view);
        assert_eq!(
            q.sql,
            r#"select "t0"."id" as "value_0", "t0"."name" as "value_1" from users as "t0" where "t0"."name" like $1 order by "t0"."id" desc limit 10"#
        );
        assert_eq!(q.params, vec![json!("%x%")]);
        assert!(!q.sql.contains("join"));
    }

    #[test]
    fn referenced_lazy_join_brackets_the_aggregate() {
        let users = users();
        let counts = order_counts(&orders());
        let view = name_like(&users, "%x%")
            .join(&counts, JoinMode::Lazy, true, same_id)
            .unwrap()
            .order(Direction::Desc, |r| Fragment::from(&r["base"]["id"]))
            .unwrap()
            .take(10)
            .map_to(|r| Template::map([("id", r["base"]["id"].clone()), ("count", r["extra"]["content"]["count"].clone())]))
            .unwrap();

        let q = pg().compile(&view);
        assert_eq!(
            q.sql,
            concat!(
                r#"select "t0"."id" as "value_0", "t1"."value_1" as "value_1" from users as "t0" "#,
                r#"left join (select "t2"."user_id" as "value_0", count(*) as "value_1" from orders as "t2" group by "t2"."user_id") as "t1" "#,
                r#"on "t0"."id" = "t1"."value_0" where "t0"."name" like $1 order by "t0"."id" desc limit 10"#
            )
        );
    }

    #[test]
    fn lazy_join_with_filter_on_extra_is_kept() {
        let view = users()
            .join(&orders(), JoinMode::Lazy, true, owner_is)
            .unwrap()
            .and_where(|r| Fragment::sql(|e| format!("{} > 5", e.emit(&r["extra"]["amount"]))))
            .unwrap()
            .map_to(|r| r["base"].clone())
            .unwrap();
        let q = pg().compile(&view);
        assert!(q.sql.contains(r#"left join orders as "t1" on "t0"."id" = "t1"."user_id""#), "{}", q.sql);
        assert!(q.sql.ends_with(r#"where "t1"."amount" > 5"#), "{}", q.sql);
    }

    #[test]
    fn lazy_join_keeps_only_the_extra_side_when_base_is_unread() {
        let accounts = crate::view::View::table("accounts", |t| Template::map([("id", t.column("id").into())]));
        let lookups = users()
            .join(&orders(), JoinMode::Lazy, false, owner_is)
            .unwrap()
            .map_to(|r| r["extra"].clone())
            .unwrap();
        let view = accounts.join(&lookups, JoinMode::Left, true, owner_is).unwrap();

        let q = pg().compile(&view);
        assert_eq!(
            q.sql,
            concat!(
                r#"select "t0"."id" as "value_0", "t1"."id" as "value_1", "t1"."user_id" as "value_2", "t1"."amount" as "value_3" "#,
                r#"from accounts as "t0" left join orders as "t1" on "t0"."id" = "t1"."user_id""#
            )
        );
    }

    #[test]
    fn paginated_base_is_bracketed_before_joining() {
        let view = users().take(5).join(&orders(), JoinMode::Left, true, owner_is).unwrap();
        let q = pg().compile(&view);
        assert_eq!(
            q.sql,
            concat!(
                r#"select "t0"."value_0" as "value_0", "t0"."value_1" as "value_1", "t1"."id" as "value_2", "t1"."user_id" as "value_3", "t1"."amount" as "value_4" "#,
                r#"from (select "t2"."id" as "value_0", "t2"."name" as "value_1" from users as "t2" limit 5) as "t0" "#,
                r#"left join orders as "t1" on "t0"."value_0" = "t1"."user_id""#
            )
        );
    }

    #[test]
    fn ordered_base_keeps_its_order_on_the_joined_body() {
        let view = users()
            .order(Direction::Desc, |u| Fragment::from(&u["id"]))
            .unwrap()
            .join(&orders(), JoinMode::Left, true, owner_is)
            .unwrap()
            .map_to(|r| Template::map([("id", r["base"]["id"].clone()), ("amount", r["extra"]["amount"].clone())]))
            .unwrap();
        let q = pg().compile(&view);
        assert_eq!(
            q.sql,
            r#"select "t0"."id" as "value_0", "t1"."amount" as "value_1" from users as "t0" left join orders as "t1" on "t0"."id" = "t1"."user_id" order by "t0"."id" desc"#
        );
    }

    #[test]
    fn joined_aggregates_keep_their_own_columns() {
        let per_user = users()
            .group_by(|u| u["id"].clone(), |_| Template::map([("n", Column::expr(false, "count(*)").into())]))
            .unwrap();
        let per_owner = orders()
            .group_by(|o| o["user_id"].clone(), |_| Template::map([("n", Column::expr(false, "count(*)").into())]))
            .unwrap();
        let view = per_user
            .join(&per_owner, JoinMode::Left, true, |b, x| {
                Fragment::sql(|e| format!("{} = {}", e.emit(&b["keys"]), e.emit(&x["keys"])))
            })
            .unwrap();

        let q = pg().compile(&view);
        assert_eq!(
            q.sql,
            concat!(
                r#"select "t0"."value_0" as "value_0", "t0"."value_1" as "value_1", "t1"."value_0" as "value_2", "t1"."value_1" as "value_3" "#,
                r#"from (select "t2"."id" as "value_0", count(*) as "value_1" from users as "t2" group by "t2"."id") as "t0" "#,
                r#"left join (select "t3"."user_id" as "value_0", count(*) as "value_1" from orders as "t3" group by "t3"."user_id") as "t1" "#,
                r#"on "t0"."value_0" = "t1"."value_0""#
            )
        );
    }

    #[test]
    fn take_skip_take_is_one_window() {
        let users = users();
        let composed = pg().compile(&users.take(10).skip(5).take(20));
        let direct = pg().compile(&users.take(10).skip(5));
        assert_eq!(composed.sql, direct.sql);
        assert_eq!(
            composed.sql,
            r#"select "t0"."id" as "value_0", "t0"."name" as "value_1" from users as "t0" limit 5 offset 5"#
        );
    }

    #[test]
    fn group_by_after_order_nests_once() {
        let view = users()
            .order(Direction::Asc, |u| Fragment::from(&u["id"]))
            .unwrap()
            .group_by(|u| u["name"].clone(), |_| Template::map([("n", Column::expr(false, "count(*)").into())]))
            .unwrap();
        let q = pg().compile(&view);
        assert_eq!(
            q.sql,
            concat!(
                r#"select "t0"."value_0" as "value_0", count(*) as "value_1" "#,
                r#"from (select "t1"."name" as "value_0" from users as "t1" order by "t1"."id" asc) as "t0" "#,
                r#"group by "t0"."value_0""#
            )
        );
    }

    #[test]
    fn group_by_after_pagination_nests_once() {
        let count = |_: &Template| Template::map([("n", Column::expr(false, "count(*)").into())]);
        for view in [users().take(5), users().skip(5), users().skip(1).take(5)] {
            let grouped = view.group_by(|u| u["name"].clone(), count).unwrap();
            let q = pg().compile(&grouped);
            assert_eq!(q.sql.matches("(select").count(), 1, "{}", q.sql);
        }
    }

    #[test]
    fn filter_on_aggregate_goes_to_having() {
        let view = orders()
            .group_by(
                |o| o["user_id"].clone(),
                |o| Template::map([("total", Column::sql(true, |e| format!("sum({})", e.emit(&o["amount"]))).into())]),
            )
            .unwrap()
            .and_where(|g| Fragment::sql(|e| format!("{} > {}", e.emit(&g["content"]["total"]), e.param(100))))
            .unwrap();
        let q = pg().compile(&view);
        assert_eq!(
            q.sql,
            r#"select "t0"."user_id" as "value_0", sum("t0"."amount") as "value_1" from orders as "t0" group by "t0"."user_id" having sum("t0"."amount") > $1"#
        );
        assert_eq!(q.params, vec![json!(100)]);
    }

    #[test]
    fn filter_after_take_brackets() {
        let view = users()
            .take(3)
            .and_where(|u| Fragment::sql(|e| format!("{} > {}", e.emit(&u["id"]), e.param(1))))
            .unwrap();
        let q = pg().compile(&view);
        assert_eq!(
            q.sql,
            concat!(
                r#"select "t0"."value_0" as "value_0", "t0"."value_1" as "value_1" "#,
                r#"from (select "t1"."id" as "value_0", "t1"."name" as "value_1" from users as "t1" limit 3) as "t0" "#,
                r#"where "t0"."value_0" > $1"#
            )
        );
    }

    #[test]
    fn order_after_take_brackets_and_newest_order_wins() {
        let users = users();
        let twice = users
            .order(Direction::Asc, |u| Fragment::from(&u["id"]))
            .unwrap()
            .order(Direction::Desc, |u| Fragment::from(&u["name"]))
            .unwrap();
        let q = pg().compile(&twice);
        assert!(q.sql.ends_with(r#"order by "t0"."name" desc, "t0"."id" asc"#), "{}", q.sql);

        let after_take = users.take(2).order(Direction::Desc, |u| Fragment::from(&u["id"])).unwrap();
        assert_eq!(pg().compile(&after_take).sql.matches("(select").count(), 1);
    }

    #[test]
    fn always_false_bracket_is_a_no_op() {
        let filtered = name_like(&users(), "%a%");
        let plain = pg().compile(&filtered);
        let guarded = pg().compile(&filtered.bracket_if(|_| false));
        assert_eq!(plain.sql, guarded.sql);
        assert_eq!(plain.params, guarded.params);

        let forced = pg().compile(&filtered.bracket());
        assert_eq!(forced.sql.matches("(select").count(), 1);
    }

    #[test]
    fn duplicated_column_is_selected_once() {
        let view = users()
            .map_to(|u| Template::map([("a", u["id"].clone()), ("b", u["id"].clone()), ("n", u["name"].clone())]))
            .unwrap();
        let q = pg().compile(&view);
        assert_eq!(q.sql, r#"select "t0"."id" as "value_0", "t0"."name" as "value_1" from users as "t0""#);
    }

    #[test]
    fn inner_join_policy_decides_extra_bracketing() {
        let users = users();
        let big = orders()
            .and_where(|o| Fragment::sql(|e| format!("{} > {}", e.emit(&o["amount"]), e.param(10))))
            .unwrap();
        let view = users
            .join(&big, JoinMode::Inner, false, owner_is)
            .unwrap()
            .map_to(|r| Template::map([("name", r["base"]["name"].clone()), ("amount", r["extra"]["amount"].clone())]))
            .unwrap();

        let strict = pg().compile(&view);
        assert_eq!(
            strict.sql,
            concat!(
                r#"select "t0"."name" as "value_0", "t1"."value_1" as "value_1" from users as "t0" "#,
                r#"inner join (select "t2"."user_id" as "value_0", "t2"."amount" as "value_1" from orders as "t2" where "t2"."amount" > $1) as "t1" "#,
                r#"on "t0"."id" = "t1"."value_0""#
            )
        );

        let relaxed = Compiler::with_config(crate::compiler::PostgresAdapter, CompilerConfig::relaxed()).compile(&view);
        assert_eq!(
            relaxed.sql,
            r#"select "t0"."name" as "value_0", "t1"."amount" as "value_1" from users as "t0" inner join orders as "t1" on "t0"."id" = "t1"."user_id" where "t1"."amount" > $1"#
        );
    }

    #[test]
    fn total_counts_the_window_without_selecting_columns() {
        let view = name_like(&users(), "%x%")
            .order(Direction::Desc, |u| Fragment::from(&u["id"]))
            .unwrap()
            .take(5);
        let q = pg().compile_total(&view);
        assert_eq!(
            q.sql,
            r#"select count(*) as "value_0" from (select 1 from users as "t0" where "t0"."name" like $1 order by "t0"."id" desc limit 5) as "t1""#
        );
    }

    #[test]
    fn total_drops_order_and_lazy_joins() {
        let view = users()
            .join(&order_counts(&orders()), JoinMode::Lazy, true, same_id)
            .unwrap()
            .order(Direction::Asc, |r| Fragment::from(&r["base"]["id"]))
            .unwrap();
        let q = pg().compile_total(&view);
        assert_eq!(q.sql, r#"select count(*) as "value_0" from users as "t0""#);
    }

    #[test]
    fn sqlite_dialect() {
        let view = name_like(&users(), "%x%").skip(3);
        let q = Compiler::new(SqliteAdapter).compile(&view);
        assert_eq!(
            q.sql,
            r#"select "t0"."id" as "value_0", "t0"."name" as "value_1" from users as "t0" where "t0"."name" like ? limit -1 offset 3"#
        );
    }

    #[tokio::test]
    async fn decodes_rows_into_the_template_shape() {
        let view = users()
            .map_to(|u| Template::map([("a", u["id"].clone()), ("b", u["id"].clone()), ("n", u["name"].clone())]))
            .unwrap();
        let q = pg().compile(&view);
        let out = q.decode_row(&row(json!({ "value_0": 1, "value_1": "x" }))).await.unwrap();
        assert_eq!(out, json!({ "a": 1, "b": 1, "n": "x" }));
    }

    #[tokio::test]
    async fn nullable_join_side_decodes_null() {
        let view = users()
            .join(&order_counts(&orders()), JoinMode::Left, true, same_id)
            .unwrap()
            .map_to(|r| Template::map([("id", r["base"]["id"].clone()), ("count", r["extra"]["content"]["count"].clone())]))
            .unwrap();
        let q = pg().compile(&view);
        let rows = vec![row(json!({ "value_0": 1, "value_1": 4 })), row(json!({ "value_0": 2, "value_1": null }))];
        let out = q.decode_rows(&rows).await.unwrap();
        assert_eq!(out, vec![json!({ "id": 1, "count": 4 }), json!({ "id": 2, "count": null })]);
    }

    #[tokio::test]
    async fn first_failing_row_fails_the_batch() {
        let q = pg().compile(&users());
        let rows = vec![row(json!({ "value_0": 1, "value_1": "a" })), row(json!({ "value_0": 2, "value_1": null }))];
        assert_eq!(
            q.decode_rows(&rows).await,
            Err(DecodeError::UnexpectedNull { column: "value_1".into() })
        );
        let missing = vec![row(json!({ "value_0": 1 }))];
        assert_eq!(q.decode_rows(&missing).await, Err(DecodeError::MissingColumn { column: "value_1".into() }));
    }

    #[tokio::test]
    async fn async_formats_run_per_column() {
        let view = users()
            .map_to(|u| {
                let slow = u["id"].as_column().map(|c| {
                    c.format_async(|v| async move {
                        tokio::time::sleep(Duration::from_millis(5)).await;
                        Ok(json!(v.as_i64().unwrap_or(0) * 2))
                    })
                });
                Template::list([slow.map(Template::from).unwrap_or_else(|| u["id"].clone()), u["name"].clone()])
            })
            .unwrap();
        let q = pg().compile(&view);
        let rows: Vec<_> = (1..=3).map(|i| row(json!({ "value_0": i, "value_1": format!("u{i}") }))).collect();
        let out = q.decode_rows(&rows).await.unwrap();
        assert_eq!(out, vec![json!([2, "u1"]), json!([4, "u2"]), json!([6, "u3"])]);
    }

    #[tokio::test]
    async fn typed_rows_and_totals() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct User {
            id: i64,
            name: String,
        }

        let users = users();
        let q = pg().compile(&users);
        let typed: Vec<User> = q.decode_rows_as(&[row(json!({ "value_0": 7, "value_1": "Ana" }))]).await.unwrap();
        assert_eq!(typed, vec![User { id: 7, name: "Ana".into() }]);

        let total = pg().compile_total(&users);
        let n: i64 = total.decode_one_as(&[row(json!({ "value_0": "12" }))]).await.unwrap();
        assert_eq!(n, 12);
        assert_eq!(total.decode_one(&[]).await, Err(DecodeError::EmptyAggregate));
    }

    #[tokio::test]
    async fn tagged_columns_survive_decoding() {
        let view = users()
            .map_to(|u| {
                let id = u["id"].as_column().cloned().unwrap_or_else(|| Column::expr(false, "0"));
                let checked = id.format(Formats::text).with_tag("checked");
                match checked.assert_tag("checked", "published") {
                    Ok(c) => Template::from(c),
                    Err(_) => u["id"].clone(),
                }
            })
            .unwrap();
        assert_eq!(view.template().as_column().and_then(|c| c.tag()), Some("published"));
        let q = pg().compile(&view);
        assert_eq!(q.decode_row(&row(json!({ "value_0": 9 }))).await, Ok(json!("9")));
    }
}
