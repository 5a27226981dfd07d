use keel_sql::{split_statements, StatementParser, TokenizingStatementParser};

#[test]
fn splits_plpgsql_do_block_as_single_statement() {
    let sql = r#"
DO $$
BEGIN
    RAISE NOTICE 'hello; world';
END $$;
"#;
    let parser = TokenizingStatementParser::new();
    let stmts = parser.parse_statements(sql, Some("test.sql")).unwrap();
    assert_eq!(stmts.len(), 1);
    assert_eq!(stmts[0].kind(), "DO");
    assert!(stmts[0].sql.contains("RAISE NOTICE 'hello; world';"));
}

#[test]
fn keeps_semicolons_inside_literals_and_comments() {
    let sql = "INSERT INTO notes (body) VALUES ('a;b');\n/* c; d */ SELECT 2;\n";
    let out = split_statements(sql, Some("test.sql")).unwrap();
    assert_eq!(out.len(), 2);
    assert!(out[0].sql.contains("'a;b'"));
    assert_eq!(out[1].kind(), "SELECT");
    assert_eq!(out[1].ordinal, 2);
}

#[test]
fn last_statement_without_semicolon_is_kept() {
    let sql = "\n  SELECT 1;\n\n  SELECT 2\n";
    let out = split_statements(sql, Some("test.sql")).unwrap();
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].sql, "SELECT 1");
    assert_eq!(out[1].sql, "SELECT 2");
}

#[test]
fn function_body_with_inner_statements_stays_whole() {
    let sql = r#"
CREATE OR REPLACE FUNCTION touch() RETURNS trigger AS $body$
BEGIN
    NEW.updated_at = now();
    RETURN NEW;
END;
$body$ LANGUAGE plpgsql;

CREATE TABLE audit (id bigint);
"#;
    let out = split_statements(sql, None).unwrap();
    assert_eq!(out.len(), 2);
    assert!(out[0].sql.contains("RETURN NEW;"));
    assert_eq!(out[1].leading_words[..2], ["CREATE", "TABLE"]);
}

#[test]
fn statement_text_is_sent_exactly_as_written() {
    let statements = [
        r"INSERT INTO paths (p) VALUES (E'C:\\temp\\new')",
        r"INSERT INTO quotes (q) VALUES (E'it\'s; fine')",
        r"SELECT U&'\005C' AS backslash",
        "-- leading note; with semicolon\nSELECT /* inline; comment */ 'ünïcödé'",
        "CREATE FUNCTION bump() RETURNS trigger AS $fn$\nBEGIN\n\tNEW.n := NEW.n + 1;\n\tRETURN NEW;\nEND;\n$fn$ LANGUAGE plpgsql",
    ];
    let sql = format!("{}\n", statements.join(";\n\n"));

    let out = split_statements(&sql, Some("V1__escapes.sql")).unwrap();
    let texts: Vec<&str> = out.iter().map(|s| s.sql.as_str()).collect();
    assert_eq!(texts, statements);
}
