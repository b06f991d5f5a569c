// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use anyhow::{bail, Result};
use rpcdl::*;

fn schema_path(name: &str) -> String {
    format!("{}/tests/engine/schemas/{name}", env!("CARGO_MANIFEST_DIR"))
}

#[test]
fn check_file_from_disk() -> Result<()> {
    let engine = Engine::default();
    let combined = engine.check_file(&schema_path("main.rpcdl"))?;

    assert_eq!(
        combined.types.keys().collect::<Vec<_>>(),
        vec!["Role", "User"]
    );
    assert!(combined.rules.contains_key("unique"));
    assert!(combined.procs.contains_key("GetUser"));
    assert!(combined.streams.contains_key("UserEvents"));

    let doc = combined.types["User"].docstring.as_ref().map(|d| d.value.trim());
    assert_eq!(doc, Some("A registered user of the service."));

    // Both schemas and the external docstring.
    assert_eq!(combined.files.len(), 3);
    let main = std::fs::read_to_string(schema_path("main.rpcdl"))?;
    assert_eq!(combined.files.get(&schema_path("main.rpcdl")), Some(&hash_content(&main)));
    Ok(())
}

#[test]
fn check_reports_every_problem() -> Result<()> {
    let engine = Engine::default();
    let resolved = engine.check(&schema_path("broken.rpcdl"));

    let messages: Vec<String> = resolved.diagnostics.iter().map(|d| d.message.clone()).collect();
    assert_eq!(
        messages,
        vec![
            "rule \"minLen\" expects an int parameter",
            "circular type dependency detected: Team -> Member -> Team",
        ]
    );

    match engine.check_file(&schema_path("broken.rpcdl")) {
        Ok(_) => bail!("expected an error"),
        Err(e) => assert!(e.to_string().contains("expects an int parameter")),
    }
    Ok(())
}

#[test]
fn missing_file() {
    let engine = Engine::default();
    let resolved = engine.check(&schema_path("nowhere.rpcdl"));
    assert_eq!(resolved.diagnostics.len(), 1);
    assert!(resolved.diagnostics[0].message.contains("not found"));
}

#[test]
fn in_memory_provider() -> Result<()> {
    let provider = MemoryFileProvider::new()
        .with_file("/app/main.rpcdl", "import \"./lib.rpcdl\"\ntype Order { item: Item }")
        .with_file("/app/lib.rpcdl", "type Item { sku: string @regex(\"^[A-Z]+$\") }");
    let engine = Engine::new(&provider);

    let combined = engine.check_file("/app/main.rpcdl")?;
    assert_eq!(combined.types.len(), 2);

    provider.remove("/app/lib.rpcdl");
    let resolved = engine.check("/app/main.rpcdl");
    let rendered: Vec<String> = resolved.diagnostics.iter().map(|d| d.to_string()).collect();
    assert_eq!(
        rendered,
        vec![
            "/app/main.rpcdl:1:1: file \"/app/lib.rpcdl\" not found",
            "/app/main.rpcdl:2:20: type \"Item\" is not declared",
        ]
    );
    Ok(())
}

#[test]
fn casing_can_be_disabled() -> Result<()> {
    let provider = MemoryFileProvider::new().with_file("/s.rpcdl", "type lower {}");

    assert!(Engine::new(&provider).check_file("/s.rpcdl").is_err());

    let config = Config::from_yaml_str("check_casing: false")?;
    let engine = Engine::with_config(&provider, config);
    assert!(!engine.config().check_casing);
    engine.check_file("/s.rpcdl")?;
    Ok(())
}

#[test]
fn parse_schema_leaves_imports() -> Result<()> {
    let engine = Engine::default();
    let schema = engine.parse_schema(
        "inline.rpcdl".to_string(),
        "import \"./other.rpcdl\"\ntype A {}".to_string(),
    )?;
    assert_eq!(schema.children.len(), 2);

    let err = engine
        .parse_schema("inline.rpcdl".to_string(), "type {}".to_string())
        .err();
    match err {
        Some(e) => assert!(e.to_string().contains("expecting identifier as type name")),
        None => bail!("expected a parse error"),
    }
    Ok(())
}
