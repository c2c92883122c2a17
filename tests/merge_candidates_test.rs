/// マージ候補選択のテスト
///
/// 設定ファイルから組み立てたカタログと、追跡中のテーブルを組み合わせて
/// 変更されたテーブルだけが候補として解決されることを確認します。
use std::fs;
use std::path::Path;
use tablemerge::adapters::catalog_factory::create_catalog;
use tablemerge::core::config::Config;
use tablemerge::core::data_table::{DataRow, DataTable};
use tablemerge::core::dirty_tracking::MutationObserver;
use tablemerge::services::merge_candidates::{MergeCandidateService, MergeStatus};
use tablemerge::services::row_validator::RowValidator;
use tempfile::TempDir;

#[cfg(test)]
mod merge_candidates_tests {
    use super::*;

    const CONFIG_YAML: &str = r#"
version: "1.0"
sources:
  project:
    type: package
    path: project
  production:
    type: package
    path: production
    case_insensitive: true
  missing:
    type: package
    path: does-not-exist
"#;

    const USERS_YAML: &str = r#"
version: "1.0"
tables:
  users:
    name: users
    columns:
      - name: id
        type:
          kind: INTEGER
        nullable: false
      - name: name
        type:
          kind: VARCHAR
          length: 20
        nullable: false
    constraints:
      - type: PRIMARY_KEY
        columns: [id]
  orders:
    name: orders
    columns:
      - name: id
        type:
          kind: INTEGER
        nullable: false
"#;

    const PRODUCTION_YAML: &str = r#"
version: "1.0"
tables:
  USERS:
    name: USERS
    columns:
      - name: id
        type:
          kind: INTEGER
        nullable: false
"#;

    fn setup(dir: &Path) -> Config {
        fs::create_dir(dir.join("project")).unwrap();
        fs::create_dir(dir.join("production")).unwrap();
        fs::write(dir.join("project/schema.yaml"), USERS_YAML).unwrap();
        fs::write(dir.join("production/schema.yaml"), PRODUCTION_YAML).unwrap();
        fs::write(dir.join(".tablemerge.yaml"), CONFIG_YAML).unwrap();
        Config::from_file(&dir.join(".tablemerge.yaml")).unwrap()
    }

    fn table(name: &str, dirty: bool) -> DataTable {
        let mut table = DataTable::with_column_names(name, &["id", "name"]);
        table
            .load(vec![DataRow::new().with("id", 1).with("name", "x")])
            .unwrap();
        MutationObserver::attach(&mut table);
        if dirty {
            table.set_value(0, "name", "y").unwrap();
        }
        table
    }

    #[tokio::test]
    async fn test_select_from_configured_sources() {
        let temp_dir = TempDir::new().unwrap();
        let config = setup(temp_dir.path());

        let source =
            create_catalog("project", config.source("project").unwrap(), temp_dir.path()).unwrap();
        let destination = create_catalog(
            "production",
            config.source("production").unwrap(),
            temp_dir.path(),
        )
        .unwrap();

        let tables = vec![table("users", true), table("orders", true), table("audit", false)];
        let candidates = MergeCandidateService::new()
            .select(&tables, source.as_ref(), destination.as_ref())
            .await;

        assert_eq!(candidates.len(), 2);
        match &candidates[0].status {
            MergeStatus::Ready {
                source,
                destination,
            } => {
                assert_eq!(source.name, "users");
                assert_eq!(destination.name, "USERS");
            }
            other => panic!("Expected Ready, got {:?}", other),
        }
        assert!(matches!(
            candidates[1].status,
            MergeStatus::MissingInDestination
        ));
    }

    #[tokio::test]
    async fn test_missing_package_reports_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        let config = setup(temp_dir.path());

        let source =
            create_catalog("missing", config.source("missing").unwrap(), temp_dir.path()).unwrap();
        let destination =
            create_catalog("project", config.source("project").unwrap(), temp_dir.path()).unwrap();

        let candidates = MergeCandidateService::new()
            .select(&[table("users", true)], source.as_ref(), destination.as_ref())
            .await;

        assert!(matches!(
            candidates[0].status,
            MergeStatus::SourceUnavailable(_)
        ));
    }

    #[tokio::test]
    async fn test_validate_ready_candidate_rows() {
        let temp_dir = TempDir::new().unwrap();
        let config = setup(temp_dir.path());
        let catalog =
            create_catalog("project", config.source("project").unwrap(), temp_dir.path()).unwrap();

        let mut users = table("users", true);
        users.set_value(0, "name", "a name that is far too long").unwrap();
        let descriptor = catalog.require_table("users").await.unwrap();

        let result = RowValidator::new().validate(&users, &descriptor);
        assert_eq!(result.error_count(), 1);
        assert!(result.errors[0].is_type_mismatch());
    }
}
