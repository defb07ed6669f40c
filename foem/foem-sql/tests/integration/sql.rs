//! Simple tests for "this PostgreSQL creates this Databricks SQL" go here.
use foem_sql::{Dialect, Error, Reason};
use insta::assert_snapshot;
use rstest::rstest;

pub(crate) fn transpile(sql: &str) -> Result<String, Error> {
    foem_sql::transpile(sql, Dialect::Postgres, Dialect::Databricks)
}

/// The query as the renderer prints it, without any rewriting.
fn rendered(sql: &str) -> String {
    foem_sql::transpile(sql, Dialect::Postgres, Dialect::Postgres).unwrap()
}

#[test]
fn test_concrete_scenario() {
    assert_snapshot!(transpile(
        "SELECT person_id FROM observation_period \
         WHERE CAST(EXTRACT(epoch FROM CAST(a AS TIMESTAMP) - CAST(b AS TIMESTAMP)) / 86400 AS BIGINT) >= 30"
    ).unwrap(),
        @"SELECT person_id FROM observation_period WHERE DATEDIFF(a, b) >= 30"
    );
}

#[rstest]
fn test_idiom_coverage(
    #[values(
        ("CAST(EXTRACT(EPOCH FROM (x - y)) / 86400 AS BIGINT)", "DATEDIFF(x, y)"),
        ("(EXTRACT(EPOCH FROM x::timestamp - y::timestamp) / 86400)::bigint", "DATEDIFF(x, y)"),
        ("ABS(x - y)", "ABS(DATEDIFF(x, y))"),
        ("ABS((x - y))", "ABS(DATEDIFF(x, y))"),
        ("(x - y)", "DATEDIFF(x, y)"),
        ("x - y", "DATEDIFF(x, y)")
    )]
    idiom: (&str, &str),
    #[values(">=", "<", "=", "<>")] op: &str,
    #[values("30", "CAST(30 AS INT)", "$1", ":days")] days: &str,
) {
    let (lhs, expected) = idiom;

    assert_eq!(
        transpile(&format!("SELECT * FROM t WHERE {lhs} {op} {days}")).unwrap(),
        format!("SELECT * FROM t WHERE {expected} {op} {days}")
    );
}

#[test]
fn test_pyformat_parameters() {
    assert_snapshot!(transpile(
        "SELECT d.person_id FROM death AS d JOIN person AS p ON p.person_id = d.person_id \
         WHERE ABS(d.death_date - p.birth_datetime::timestamp) <= %(max_days)s"
    ).unwrap(),
        @"SELECT d.person_id FROM death AS d JOIN person AS p ON p.person_id = d.person_id WHERE ABS(DATEDIFF(d.death_date, p.birth_datetime)) <= :max_days"
    );
}

#[rstest]
#[case::half_day_divisor(
    "SELECT * FROM t WHERE CAST(EXTRACT(EPOCH FROM (x - y)) / 43200 AS BIGINT) >= 30"
)]
#[case::column_bound("SELECT * FROM t WHERE (x - y) > z")]
#[case::abs_column_bound("SELECT * FROM t WHERE ABS(x - y) <= t.max_days")]
#[case::epoch_column_bound(
    "SELECT * FROM t WHERE CAST(EXTRACT(EPOCH FROM (x - y)) / 86400 AS BIGINT) >= t.max_days"
)]
#[case::string_bound("SELECT * FROM t WHERE (x - y) = '30'")]
fn test_guard(#[case] sql: &str) {
    assert_eq!(transpile(sql).unwrap(), rendered(sql));
}

#[test]
fn test_operand_fidelity() {
    assert_snapshot!(transpile(
        "SELECT * FROM cohort \
         WHERE CAST(EXTRACT(EPOCH FROM CAST(GREATEST(a, b, c, d) AS TIMESTAMP) - CAST(LEAST(a, b, c, d) AS TIMESTAMP)) / 86400 AS BIGINT) > 0"
    ).unwrap(),
        @"SELECT * FROM cohort WHERE DATEDIFF(GREATEST(a, b, c, d), LEAST(a, b, c, d)) > 0"
    );

    // Casts to anything but a plain `TIMESTAMP` are part of the operand.
    assert_snapshot!(transpile(
        "SELECT * FROM cohort WHERE (CAST(a AS DATE) - b::timestamp) >= 1"
    ).unwrap(),
        @"SELECT * FROM cohort WHERE DATEDIFF(CAST(a AS DATE), b) >= 1"
    );
}

#[test]
fn test_non_interference() {
    let sql = r#"
    WITH outer_cte AS (
        WITH middle_cte AS (
            WITH inner_cte AS (
                SELECT person_id, status FROM visit_occurrence
                WHERE (visit_end_date - visit_start_date) >= 7
            )
            SELECT person_id, status FROM inner_cte WHERE status = 'A'
        )
        SELECT person_id FROM middle_cte WHERE person_id <> 0 AND status IN ('A', 'B')
    )
    SELECT COUNT(*) FROM outer_cte WHERE person_id > 100
    "#;

    let expected = rendered(sql).replace(
        "(visit_end_date - visit_start_date) >= 7",
        "DATEDIFF(visit_end_date, visit_start_date) >= 7",
    );
    assert_ne!(expected, rendered(sql));
    assert_eq!(transpile(sql).unwrap(), expected);
}

#[rstest]
#[case::postgres(Dialect::Postgres)]
#[case::databricks(Dialect::Databricks)]
#[case::generic(Dialect::Generic)]
fn test_same_dialect(#[case] dialect: Dialect) {
    let sql = "SELECT person_id, COUNT(*) AS visits FROM visit_occurrence \
               WHERE (visit_end_date - visit_start_date) > 30 GROUP BY person_id HAVING COUNT(*) > 1";

    assert_eq!(foem_sql::transpile(sql, dialect, dialect).unwrap(), sql);
}

#[test]
fn test_databricks_surface() {
    assert_snapshot!(transpile(
        r#"SELECT "p"."person_id", v.visit_start_date::date FROM "person" AS "p" JOIN visit_occurrence AS v ON v.person_id = "p"."person_id" WHERE (v.visit_end_date - v.visit_start_date) > 1"#
    ).unwrap(),
        @"SELECT `p`.`person_id`, CAST(v.visit_start_date AS DATE) FROM `person` AS `p` JOIN visit_occurrence AS v ON v.person_id = `p`.`person_id` WHERE DATEDIFF(v.visit_end_date, v.visit_start_date) > 1"
    );
}

#[test]
fn test_errors() {
    let error = transpile("SELECT * FROM person WHERE").unwrap_err();
    assert_eq!(
        error.reason,
        Reason::Parse {
            dialect: Dialect::Postgres
        }
    );
    assert!(std::error::Error::source(&error).is_some());

    let error = transpile("SELECT DISTINCT ON (person_id) person_id FROM visit_occurrence").unwrap_err();
    assert_snapshot!(error.to_string(), @"Error transpiling query: `DISTINCT ON` cannot be expressed in databricks");
    assert!(std::error::Error::source(&error).is_none());

    let error = transpile("-- nothing to see here").unwrap_err();
    assert_eq!(error.reason, Reason::Empty);
}

#[test]
fn test_format() {
    let options = foem_sql::Options::default().with_format(true);

    assert_snapshot!(foem_sql::transpile_with(
        "SELECT person_id FROM visit WHERE ABS(end_date - start_date) < 3",
        &options
    ).unwrap(), @r"
    SELECT
      person_id
    FROM
      visit
    WHERE
      ABS(DATEDIFF(end_date, start_date)) < 3
    ");
}
