use super::*;

fn unique_temp_dir(name: &str) -> PathBuf {
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("valid clock")
        .as_nanos();
    std::env::temp_dir().join(format!(
        "crystal-analyzer-project-{name}-{}-{nonce}",
        std::process::id(),
    ))
}

#[test]
fn finds_shard_yml_walking_up_from_the_document() {
    let root = unique_temp_dir("walk-up");
    let nested = root.join("src/services");
    std::fs::create_dir_all(&nested).expect("temp tree");
    std::fs::write(root.join("shard.yml"), "name: sample\n").expect("write manifest");
    let document = nested.join("worker.cr");
    std::fs::write(&document, "# worker\n").expect("write document");

    let found = find_shard_yml(&document);
    assert_eq!(found, Some(root.join("shard.yml")));

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn shard_target_main_resolves_relative_to_the_manifest() {
    let root = unique_temp_dir("target-main");
    std::fs::create_dir_all(&root).expect("temp dir");
    std::fs::write(
        root.join("shard.yml"),
        "name: sample\ntargets:\n  sample:\n    main: src/sample.cr\n",
    )
    .expect("write manifest");

    let main = main_file_from_shard(&root.join("shard.yml"));
    assert_eq!(main, Some(root.join("src/sample.cr")));

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn first_target_by_name_wins_for_multi_target_shards() {
    let root = unique_temp_dir("multi-target");
    std::fs::create_dir_all(&root).expect("temp dir");
    std::fs::write(
        root.join("shard.yml"),
        concat!(
            "name: sample\n",
            "targets:\n",
            "  zeta:\n",
            "    main: src/zeta.cr\n",
            "  alpha:\n",
            "    main: src/alpha.cr\n",
        ),
    )
    .expect("write manifest");

    let main = main_file_from_shard(&root.join("shard.yml"));
    assert_eq!(main, Some(root.join("src/alpha.cr")));

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn document_is_its_own_scope_without_a_manifest() {
    let root = unique_temp_dir("no-manifest");
    std::fs::create_dir_all(&root).expect("temp dir");
    let document = root.join("script.cr");
    std::fs::write(&document, "puts 1\n").expect("write document");

    let resolved = resolve_main_file(&document, None, None);
    assert_eq!(resolved, document);

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn main_file_setting_overrides_the_manifest() {
    let root = unique_temp_dir("override");
    std::fs::create_dir_all(&root).expect("temp dir");
    std::fs::write(
        root.join("shard.yml"),
        "targets:\n  sample:\n    main: src/sample.cr\n",
    )
    .expect("write manifest");
    let document = root.join("script.cr");
    std::fs::write(&document, "puts 1\n").expect("write document");

    let resolved = resolve_main_file(
        &document,
        Some(&root),
        Some("${workspaceRoot}/src/entry.cr"),
    );
    assert_eq!(resolved, PathBuf::from(format!("{}/src/entry.cr", root.display())));

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn workspace_root_expansion_is_a_noop_without_a_root() {
    assert_eq!(
        expand_workspace_root("${workspaceRoot}/src/entry.cr", None),
        "${workspaceRoot}/src/entry.cr"
    );
}

#[test]
fn working_dir_prefers_the_workspace_root() {
    let document = Path::new("/proj/src/app.cr");
    assert_eq!(
        working_dir(document, Some(Path::new("/proj"))),
        Some(PathBuf::from("/proj"))
    );
    assert_eq!(working_dir(document, None), Some(PathBuf::from("/proj/src")));
}
