use std::sync::Arc;

use oci_discovery::{
    Context, Error, Flow, LocalConfigEngine, MemoryTransport, Resolver, WellKnownEngine,
    INDEX_MEDIA_TYPE, REF_ENGINES_MEDIA_TYPE,
};
use serde_json::json;
use tempfile::TempDir;

use crate::fixture::{
    example_com, index_template_engines, registry, two_entry_index, INDEX, WELL_KNOWN,
};

#[tokio::test]
async fn test_resolve_tagged_name_via_well_known() {
    let transport = Arc::new(example_com());
    let ctx = Context::new(transport.clone());
    let resolver = Resolver::new(registry()).with_engine(WellKnownEngine::default());

    let roots = resolver.resolve_all(&ctx, "example.com/a#1.0").await.unwrap();

    assert_eq!(roots.len(), 1);
    assert_eq!(
        serde_json::to_value(&roots[0]).unwrap(),
        json!({
            "mediaType": "application/vnd.oci.descriptor.v1+json",
            "root": {"size": 2, "annotations": {"org.opencontainers.image.ref.name": "1.0"}},
            "uri": "https://example.com/index.json",
        })
    );

    let requests = transport.requests();
    assert_eq!(requests[0].uri.as_str(), WELL_KNOWN);
    assert_eq!(requests[0].accept, REF_ENGINES_MEDIA_TYPE);
    assert_eq!(requests[1].uri.as_str(), INDEX);
    assert_eq!(requests[1].accept, INDEX_MEDIA_TYPE);
}

#[tokio::test]
async fn test_untagged_name_returns_every_entry() {
    let ctx = Context::new(Arc::new(example_com()));
    let resolver = Resolver::new(registry()).with_engine(WellKnownEngine::default());

    let roots = resolver.resolve_all(&ctx, "example.com/a").await.unwrap();
    let sizes: Vec<_> = roots.iter().map(|r| r.root.root["size"].clone()).collect();
    assert_eq!(sizes, vec![json!(1), json!(2)]);
}

#[tokio::test]
async fn test_relative_index_sits_beside_well_known_document() {
    let sibling = "https://example.com/.well-known/index.json";
    let transport = MemoryTransport::new()
        .with_json(WELL_KNOWN, REF_ENGINES_MEDIA_TYPE, &index_template_engines("index.json"))
        .unwrap()
        .with_json(sibling, INDEX_MEDIA_TYPE, &two_entry_index())
        .unwrap()
        .with_json(INDEX, INDEX_MEDIA_TYPE, &json!({"manifests": [{"size": 99}]}))
        .unwrap();
    let transport = Arc::new(transport);
    let ctx = Context::new(transport.clone());
    let resolver = Resolver::new(registry()).with_engine(WellKnownEngine::default());

    let roots = resolver.resolve_all(&ctx, "example.com/a#1.0").await.unwrap();

    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].root.root["size"], json!(2));
    assert_eq!(roots[0].root.source_uri.as_ref().map(|u| u.as_str()), Some(sibling));
    assert!(!transport.requested_uris().contains(&INDEX.to_string()));
}

#[tokio::test]
async fn test_unknown_host_resolves_to_nothing() {
    let transport = Arc::new(example_com());
    let ctx = Context::new(transport.clone());
    let resolver = Resolver::new(registry()).with_engine(WellKnownEngine::default());

    let roots = resolver.resolve_all(&ctx, "other.example.org/a").await.unwrap();
    assert!(roots.is_empty());
    assert_eq!(
        transport.requested_uris(),
        vec![
            "https://other.example.org/.well-known/oci-host-ref-engines",
            "http://other.example.org/.well-known/oci-host-ref-engines",
        ]
    );
}

#[tokio::test]
async fn test_local_override_stops_before_network() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("ref-engine-discovery.json");
    std::fs::write(
        &config,
        json!({
            "^example\\.com/": {
                "refEngines": [{"protocol": "_dummy", "response": [{"root": "local"}]}],
            },
        })
        .to_string(),
    )
    .unwrap();

    let transport = Arc::new(example_com());
    let ctx = Context::new(transport.clone());
    let resolver = Resolver::new(registry())
        .with_engine(LocalConfigEngine::from_file(&config))
        .with_engine(WellKnownEngine::default());

    let mut seen = Vec::new();
    resolver
        .resolve(&ctx, "example.com/a#1.0", |resolved| {
            seen.push(resolved.root.root);
            Ok(Flow::Stop)
        })
        .await
        .unwrap();

    assert_eq!(seen, vec![json!("local")]);
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_local_results_come_first() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("ref-engine-discovery.json");
    std::fs::write(
        &config,
        json!({"example": {"refEngines": [{"protocol": "_dummy", "response": [{"root": "local"}]}]}})
            .to_string(),
    )
    .unwrap();

    let ctx = Context::new(Arc::new(example_com()));
    let resolver = Resolver::new(registry())
        .with_engine(LocalConfigEngine::from_file(&config))
        .with_engine(WellKnownEngine::default());

    let roots = resolver.resolve_all(&ctx, "example.com/a#1.0").await.unwrap();
    let values: Vec<_> = roots.iter().map(|r| r.root.root.clone()).collect();
    assert_eq!(values[0], json!("local"));
    assert_eq!(values.len(), 2);
    assert_eq!(values[1]["size"], json!(2));
}

#[tokio::test]
async fn test_batch_continues_past_invalid_names() {
    let ctx = Context::new(Arc::new(example_com()));
    let resolver = Resolver::new(registry()).with_engine(WellKnownEngine::default());

    let mut outcomes = Vec::new();
    for name in ["example.com", "example.com/a#1.0"] {
        outcomes.push(resolver.resolve_all(&ctx, name).await);
    }

    assert!(matches!(outcomes[0], Err(Error::InvalidName(_))));
    assert_eq!(outcomes[1].as_ref().unwrap().len(), 1);
}

#[tokio::test]
async fn test_cancellation_aborts_resolution() {
    let ctx = Context::new(Arc::new(MemoryTransport::new()));
    let resolver = Resolver::new(registry()).with_engine(WellKnownEngine::default());
    ctx.cancel();

    let err = resolver.resolve_all(&ctx, "example.com/a").await.unwrap_err();
    assert!(err.is_cancelled());
}
