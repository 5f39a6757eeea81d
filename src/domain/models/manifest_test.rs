use super::FileSpec;
use super::GeneratedFile;
use super::Manifest;
use super::ManifestError;

#[test]
fn it_parses_manifests_in_order() {
    let manifest = Manifest::parse(
        r#"[
            {"filepath": "src/b.py", "description": "second"},
            {"filepath": "a.py", "description": "first"}
        ]"#,
    )
    .unwrap();

    assert_eq!(manifest.len(), 2);
    assert_eq!(
        manifest.files,
        vec![
            FileSpec {
                filepath: "src/b.py".to_string(),
                description: "second".to_string(),
            },
            FileSpec {
                filepath: "a.py".to_string(),
                description: "first".to_string(),
            },
        ]
    );
}

#[test]
fn it_ignores_extra_fields() {
    let manifest =
        Manifest::parse(r#"[{"filepath": "a.py", "description": "d", "language": "python"}]"#)
            .unwrap();
    assert_eq!(manifest.files[0].filepath, "a.py");
}

#[test]
fn it_accepts_empty_manifests() {
    let manifest = Manifest::parse("[]").unwrap();
    assert!(manifest.is_empty());
}

#[test]
fn it_rejects_text_around_the_json() {
    let res = Manifest::parse("Here you go:\n[{\"filepath\": \"a.py\", \"description\": \"d\"}]");
    assert!(matches!(res, Err(ManifestError::InvalidJson(_))));
}

#[test]
fn it_rejects_objects() {
    let res = Manifest::parse(r#"{"filepath": "a.py", "description": "d"}"#);
    assert!(matches!(res, Err(ManifestError::NotAnArray)));
}

#[test]
fn it_rejects_entries_missing_fields() {
    let res = Manifest::parse(
        r#"[{"filepath": "a.py", "description": "d"}, {"filepath": "b.py"}]"#,
    );
    match res {
        Err(ManifestError::MissingField { index, field }) => {
            assert_eq!(index, 1);
            assert_eq!(field, "description");
        }
        _ => panic!("expected a missing field error"),
    }
}

#[test]
fn it_rejects_non_string_fields() {
    let res = Manifest::parse(r#"[{"filepath": 12, "description": "d"}]"#);
    assert!(matches!(
        res,
        Err(ManifestError::MissingField {
            index: 0,
            field: "filepath"
        })
    ));
}

#[test]
fn it_rejects_duplicate_paths() {
    let res = Manifest::parse(
        r#"[{"filepath": "a.py", "description": "one"}, {"filepath": "a.py", "description": "two"}]"#,
    );
    let err = res.unwrap_err();
    assert_eq!(err.to_string(), "manifest lists 'a.py' more than once");

    for (first, second) in [("a.py", "./a.py"), ("src/a/b.py", "src//a/./b.py")] {
        let text = serde_json::json!([
            {"filepath": first, "description": "one"},
            {"filepath": second, "description": "two"},
        ])
        .to_string();
        let res = Manifest::parse(&text);
        assert!(
            matches!(&res, Err(ManifestError::DuplicatePath(path)) if path == second),
            "{second} should clash with {first}"
        );
    }
}

#[test]
fn it_rejects_paths_leaving_the_output_directory() {
    for filepath in ["../a.py", "src/../../a.py", "/etc/passwd", " "] {
        let text = serde_json::json!([{"filepath": filepath, "description": "d"}]).to_string();
        let res = Manifest::parse(&text);
        assert!(
            matches!(&res, Err(ManifestError::UnsafePath(path)) if path == filepath),
            "{filepath} should be rejected"
        );
    }

    assert!(Manifest::parse(r#"[{"filepath": "./src/a.py", "description": "d"}]"#).is_ok());
}

#[test]
fn it_builds_generated_files_from_specs() {
    let spec = FileSpec {
        filepath: "a.py".to_string(),
        description: "entrypoint".to_string(),
    };
    let file = GeneratedFile::new(&spec, "print('hi')\n");

    assert_eq!(file.filepath, "a.py");
    assert_eq!(file.description, "entrypoint");
    assert_eq!(file.content, "print('hi')\n");
}
