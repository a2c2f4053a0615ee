use std::collections::BTreeSet;

use report::ReportError;
use report::files::resolve_files;
use report::models::{FileSpec, LinkedFile};
use report::store::{DataStore, StoreError};
use report::validation::ValidationError;
use serde_json::{Value, json};

use crate::common::{BLOB_URL, TestEnv, WORKSPACE, ctx};

fn blob_id_of(link: &LinkedFile) -> &str {
    link.url
        .rsplit('/')
        .next()
        .expect("URL has no blob id segment")
}

fn keys(link: &LinkedFile) -> BTreeSet<String> {
    match serde_json::to_value(link).unwrap() {
        Value::Object(map) => map.keys().cloned().collect(),
        other => panic!("LinkedFile serialized to {other}"),
    }
}

fn assert_linked(link: &LinkedFile, name: &str) {
    assert_eq!(link.name, name);
    assert!(!link.handle.is_empty());
    assert!(link.url.starts_with(&format!("{BLOB_URL}/node/")));
}

mod file_links {
    use super::*;

    #[tokio::test]
    async fn local_paths_are_uploaded_in_order() {
        let env = TestEnv::spawn().await;

        let result = env
            .service
            .create_extended(
                &ctx(),
                &json!({
                    "workspace_name": WORKSPACE,
                    "report_object_name": "my_report",
                    "file_links": [
                        {"name": "a", "description": "a", "path": env.scratch_path("a.txt")},
                        {"name": "b", "description": "b", "path": env.scratch_path("b.txt")}
                    ]
                }),
            )
            .await
            .unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "my_report");
        let record = env.saved_report(&result[0].reference).await;
        assert_eq!(record.file_links.len(), 2);
        assert_linked(&record.file_links[0], "a");
        assert_linked(&record.file_links[1], "b");
        assert!(record.html_links.is_empty());

        // Plain files are stored as-is.
        let bytes = env
            .store
            .blob_bytes(blob_id_of(&record.file_links[0]))
            .await
            .unwrap();
        assert_eq!(bytes, b"alpha\n");
    }

    #[tokio::test]
    async fn relative_paths_are_read_from_scratch() {
        let env = TestEnv::spawn().await;

        let info = env
            .service
            .create_extended(
                &ctx(),
                &json!({
                    "workspace_id": env.workspace_id,
                    "file_links": [{"name": "b", "path": "b.txt", "label": "second"}]
                }),
            )
            .await
            .unwrap()
            .remove(0);

        let record = env.saved_report(&info.reference).await;
        assert_eq!(record.file_links[0].label, "second");
        let bytes = env
            .store
            .blob_bytes(blob_id_of(&record.file_links[0]))
            .await
            .unwrap();
        assert_eq!(bytes, b"beta\n");
    }

    #[tokio::test]
    async fn uploaded_blobs_link_like_local_paths() {
        let env = TestEnv::spawn().await;
        let a_blob = env.upload("a.txt").await;
        let b_blob = env.upload("b.txt").await;

        let by_path = env
            .service
            .create_extended(
                &ctx(),
                &json!({
                    "workspace_name": WORKSPACE,
                    "file_links": [
                        {"name": "a", "description": "a", "path": "a.txt"},
                        {"name": "b", "description": "b", "path": "b.txt"}
                    ]
                }),
            )
            .await
            .unwrap()
            .remove(0);
        let by_blob = env
            .service
            .create_extended(
                &ctx(),
                &json!({
                    "workspace_name": WORKSPACE,
                    "file_links": [
                        {"name": "a", "description": "a", "blob_id": a_blob},
                        {"name": "b", "description": "b", "shock_id": b_blob}
                    ]
                }),
            )
            .await
            .unwrap()
            .remove(0);

        let by_path = env.saved_report(&by_path.reference).await.file_links;
        let by_blob = env.saved_report(&by_blob.reference).await.file_links;
        assert_eq!(by_blob.len(), 2);
        for (path_link, blob_link) in by_path.iter().zip(&by_blob) {
            assert_eq!(keys(path_link), keys(blob_link));
            assert_eq!(path_link.name, blob_link.name);
            assert_eq!(path_link.description, blob_link.description);
            assert_eq!(path_link.label, blob_link.label);
        }
        assert_linked(&by_blob[0], "a");
        assert_linked(&by_blob[1], "b");
        assert_eq!(blob_id_of(&by_blob[0]), a_blob);
        assert_eq!(blob_id_of(&by_blob[1]), b_blob);
    }

    #[tokio::test]
    async fn directories_are_zipped_even_as_file_links() {
        let env = TestEnv::spawn().await;

        let info = env
            .service
            .create_extended(
                &ctx(),
                &json!({
                    "workspace_name": WORKSPACE,
                    "file_links": [{"name": "site", "path": "a_html"}]
                }),
            )
            .await
            .unwrap()
            .remove(0);

        let record = env.saved_report(&info.reference).await;
        let bytes = env
            .store
            .blob_bytes(blob_id_of(&record.file_links[0]))
            .await
            .unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }
}

mod html_links {
    use super::*;

    #[tokio::test]
    async fn html_directories_are_zipped_in_order() {
        let env = TestEnv::spawn().await;

        let info = env
            .service
            .create_extended(
                &ctx(),
                &json!({
                    "workspace_name": WORKSPACE,
                    "report_object_name": "my_report",
                    "direct_html_link_index": 0,
                    "html_links": [
                        {"name": "a", "description": "a", "path": "a_html"},
                        {"name": "b", "description": "b", "path": "b_html"}
                    ]
                }),
            )
            .await
            .unwrap()
            .remove(0);

        let record = env.saved_report(&info.reference).await;
        assert_eq!(record.html_links.len(), 2);
        assert_linked(&record.html_links[0], "a");
        assert_linked(&record.html_links[1], "b");
        for link in &record.html_links {
            let bytes = env.store.blob_bytes(blob_id_of(link)).await.unwrap();
            assert_eq!(&bytes[..2], b"PK");
        }
    }

    #[tokio::test]
    async fn html_files_are_zipped_too() {
        let env = TestEnv::spawn().await;

        let info = env
            .service
            .create_extended(
                &ctx(),
                &json!({
                    "workspace_name": WORKSPACE,
                    "html_links": [{"name": "a", "path": "a.txt"}]
                }),
            )
            .await
            .unwrap()
            .remove(0);

        let record = env.saved_report(&info.reference).await;
        let bytes = env
            .store
            .blob_bytes(blob_id_of(&record.html_links[0]))
            .await
            .unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[tokio::test]
    async fn uploaded_html_blobs_are_claimed() {
        let env = TestEnv::spawn().await;
        let a_blob = env.upload("a.txt").await;
        let b_blob = env.upload("b.txt").await;
        let (service, recorder) = env.recording(None);

        let info = service
            .create_extended(
                &ctx(),
                &json!({
                    "workspace_name": WORKSPACE,
                    "html_links": [
                        {"name": "a", "blob_id": a_blob},
                        {"name": "b", "blob_id": b_blob}
                    ]
                }),
            )
            .await
            .unwrap()
            .remove(0);

        let record = env.saved_report(&info.reference).await;
        assert_linked(&record.html_links[0], "a");
        assert_linked(&record.html_links[1], "b");
        assert_eq!(
            recorder.calls()[..3],
            [
                format!("claim {a_blob}"),
                format!("claim {b_blob}"),
                format!("resolve {WORKSPACE}"),
            ]
        );
    }
}

mod report_fields {
    use super::*;

    #[tokio::test]
    async fn generated_name_when_none_given() {
        let env = TestEnv::spawn().await;
        let info = env
            .service
            .create_extended(&ctx(), &json!({"workspace_name": WORKSPACE}))
            .await
            .unwrap()
            .remove(0);
        assert!(info.name.starts_with("report_"));
    }

    #[tokio::test]
    async fn message_and_window_heights_are_saved() {
        let env = TestEnv::spawn().await;
        let info = env
            .service
            .create_extended(
                &ctx(),
                &json!({
                    "workspace_name": WORKSPACE,
                    "message": "extended summary",
                    "warnings": ["careful"],
                    "objects_created": [{"ref": "7/8/9"}],
                    "direct_html": "<h1>Done</h1>",
                    "html_window_height": 600,
                    "summary_window_height": 250.5
                }),
            )
            .await
            .unwrap()
            .remove(0);

        let record = env.saved_report(&info.reference).await;
        assert_eq!(record.text_message, "extended summary");
        assert_eq!(record.warnings, vec!["careful"]);
        assert_eq!(record.objects_created[0].reference, "7/8/9");
        assert_eq!(record.direct_html, "<h1>Done</h1>");
        assert_eq!(record.direct_html_link_index, 0);
        assert_eq!(record.html_window_height, Some(600.0));
        assert_eq!(record.summary_window_height, Some(250.5));

        let stored = env.store.get_object(&info.reference).await.unwrap();
        assert_eq!(stored.info.meta["Warnings"], "1");
        assert_eq!(stored.info.meta["Objects Created"], "1");
    }

    #[tokio::test]
    async fn saving_the_same_name_twice_bumps_version() {
        let env = TestEnv::spawn().await;
        let params = json!({"workspace_name": WORKSPACE, "report_object_name": "my_report"});

        let first = env.service.create_extended(&ctx(), &params).await.unwrap().remove(0);
        let second = env.service.create_extended(&ctx(), &params).await.unwrap().remove(0);

        let (first_prefix, first_version) = first.reference.rsplit_once('/').unwrap();
        let (second_prefix, second_version) = second.reference.rsplit_once('/').unwrap();
        assert_eq!(first_prefix, second_prefix);
        assert_eq!(first_version, "1");
        assert_eq!(second_version, "2");
    }
}

mod resolver {
    use super::*;

    #[tokio::test]
    async fn claiming_twice_keeps_the_retrieval_url() {
        let env = TestEnv::spawn().await;
        let blob_id = env.upload("a.txt").await;
        let spec = [FileSpec::stored(blob_id).with_name("a")];
        let store: &dyn DataStore = env.store.as_ref();

        let first = resolve_files(store, "file_links", &spec, false).await.unwrap();
        let second = resolve_files(store, "file_links", &spec, false).await.unwrap();

        assert_eq!(first[0].url, second[0].url);
        assert_ne!(first[0].handle, second[0].handle);
    }

    #[tokio::test]
    async fn output_matches_input_order() {
        let env = TestEnv::spawn().await;
        let b_blob = env.upload("b.txt").await;
        let specs = vec![
            FileSpec::local(env.scratch_path("a.txt")).with_name("first"),
            FileSpec::stored(b_blob).with_name("second"),
            FileSpec::local(env.scratch_path("b_html")).with_name("third"),
        ];

        let linked = resolve_files(env.store.as_ref(), "html_links", &specs, true)
            .await
            .unwrap();

        let names: Vec<_> = linked.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["first", "second", "third"]);
    }
}

mod extended_errors {
    use super::*;

    #[tokio::test]
    async fn file_without_selector_makes_no_store_calls() {
        let env = TestEnv::spawn().await;
        let (service, recorder) = env.recording(None);

        let err = service
            .create_extended(
                &ctx(),
                &json!({
                    "workspace_name": WORKSPACE,
                    "file_links": [
                        {"name": "a", "path": "a.txt"},
                        {"name": "b", "description": "no selector"}
                    ]
                }),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ReportError::Validation(ValidationError::MissingFileSource { ref field, .. })
                if field == "file_links[1]"
        ));
        assert!(recorder.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_path_is_echoed_and_nothing_uploaded() {
        let env = TestEnv::spawn().await;
        let (service, recorder) = env.recording(None);
        let missing = env.scratch_path("does/not/exist.txt").display().to_string();

        let err = service
            .create_extended(
                &ctx(),
                &json!({
                    "workspace_name": WORKSPACE,
                    "html_links": [
                        {"name": "a", "path": "a_html"},
                        {"name": "gone", "path": missing}
                    ]
                }),
            )
            .await
            .unwrap_err();

        assert!(err.to_string().contains(&missing), "{err}");
        assert!(matches!(
            err,
            ReportError::Validation(ValidationError::PathNotFound { ref field, .. })
                if field == "html_links[1].path"
        ));
        assert!(recorder.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_workspace_is_reported() {
        let env = TestEnv::spawn().await;
        let err = env
            .service
            .create_extended(&ctx(), &json!({"message": "no workspace"}))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ReportError::Validation(ValidationError::MissingWorkspace)
        ));
    }

    #[tokio::test]
    async fn upload_failure_names_entry_and_skips_persist() {
        let env = TestEnv::spawn().await;
        let (service, recorder) = env.recording(Some("b.txt"));

        let err = service
            .create_extended(
                &ctx(),
                &json!({
                    "workspace_name": WORKSPACE,
                    "file_links": [
                        {"name": "a", "path": "a.txt"},
                        {"name": "b", "path": "b.txt"}
                    ]
                }),
            )
            .await
            .unwrap_err();

        match err {
            ReportError::Resolution {
                list,
                index,
                ref target,
                source: StoreError::Unavailable(_),
            } => {
                assert_eq!(list, "file_links");
                assert_eq!(index, 1);
                assert!(target.ends_with("b.txt"));
            }
            other => panic!("expected a resolution error, got {other:?}"),
        }
        assert!(!recorder.calls().iter().any(|c| c.starts_with("persist")));
    }

    #[tokio::test]
    async fn unknown_blob_id_is_a_resolution_error() {
        let env = TestEnv::spawn().await;
        let err = env
            .service
            .create_extended(
                &ctx(),
                &json!({
                    "workspace_name": WORKSPACE,
                    "html_links": [{"name": "ghost", "blob_id": "no-such-blob"}]
                }),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ReportError::Resolution {
                list: "html_links",
                index: 0,
                source: StoreError::BlobNotFound(_),
                ..
            }
        ));
    }
}
