use std::sync::Arc;

use oci_discovery::{
    Context, MemoryTransport, Resolver, ResolverOptions, INDEX_MEDIA_TYPE,
};
use serde_json::json;
use tempfile::TempDir;
use url::Url;

use crate::fixture::{registry, two_entry_index};

#[tokio::test]
async fn test_relative_template_resolves_against_config_file() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("ref-engine-discovery.json");
    std::fs::write(
        &config,
        json!({
            "^example\\.com/": {
                "refEngines": [{"protocol": "oci-index-template-v1", "uri": "index.json"}],
                "casEngines": [{"protocol": "oci-cas-template-v1", "uri": "blobs/{algorithm}/{encoded}"}],
            },
        })
        .to_string(),
    )
    .unwrap();

    let config_uri = Url::from_file_path(&config).unwrap();
    let index_uri = config_uri.join("index.json").unwrap();
    let transport = MemoryTransport::new()
        .with_json(index_uri.as_str(), INDEX_MEDIA_TYPE, &two_entry_index())
        .unwrap();
    let transport = Arc::new(transport);
    let ctx = Context::new(transport.clone());

    let options = ResolverOptions {
        well_known: false,
        config_paths: vec![config.clone()],
        ..ResolverOptions::default()
    };
    let resolver = Resolver::from_options(registry(), &options);

    let roots = resolver.resolve_all(&ctx, "example.com/a#1.0").await.unwrap();

    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].root.source_uri.as_ref(), Some(&index_uri));
    assert_eq!(roots[0].cas_engines.len(), 1);
    assert_eq!(roots[0].cas_engines[0].source_uri, config_uri);
    assert_eq!(transport.requested_uris(), vec![index_uri.to_string()]);
}

#[tokio::test]
async fn test_discover_lists_local_references() {
    let dir = TempDir::new().unwrap();
    let user = dir.path().join("user.json");
    let system = dir.path().join("system.json");
    std::fs::write(
        &user,
        json!({"example\\.com": {"refEngines": [{"protocol": "_dummy", "response": []}]}}).to_string(),
    )
    .unwrap();
    std::fs::write(
        &system,
        json!({
            "example\\.com": {"refEngines": [{"protocol": "shadowed"}]},
            ".*": {"refEngines": [{"protocol": "catch-all"}]},
        })
        .to_string(),
    )
    .unwrap();

    let options = ResolverOptions {
        well_known: false,
        config_paths: vec![user, system],
        ..ResolverOptions::default()
    };
    let resolver = Resolver::from_options(registry(), &options);
    let ctx = Context::new(Arc::new(MemoryTransport::new()));

    let references = resolver.discover(&ctx, "example.com/a").await.unwrap();
    let protocols: Vec<_> = references.iter().map(|r| r.engine.protocol()).collect();
    assert_eq!(protocols, vec!["_dummy", "catch-all"]);
}
