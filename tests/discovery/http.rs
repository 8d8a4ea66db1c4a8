use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use oci_discovery::{
    Context, HttpTransport, Resolver, WellKnownEngine, INDEX_MEDIA_TYPE, REF_ENGINES_MEDIA_TYPE,
};
use serde_json::json;

use crate::fixture::{index_template_engines, registry, two_entry_index, HttpFixture, Route};

#[tokio::test]
async fn test_resolve_over_http() {
    let routes = HashMap::from([
        (
            "/.well-known/oci-host-ref-engines",
            Route {
                content_type: REF_ENGINES_MEDIA_TYPE,
                body: index_template_engines("/index.json").to_string(),
            },
        ),
        (
            "/index.json",
            Route {
                content_type: "application/vnd.oci.image.index.v1+json; charset=utf-8",
                body: two_entry_index().to_string(),
            },
        ),
    ]);
    let server = HttpFixture::serve(routes).await;

    let transport = HttpTransport::with_timeout(Some(Duration::from_secs(10)));
    let ctx = Context::new(Arc::new(transport));
    let resolver = Resolver::new(registry()).with_engine(
        WellKnownEngine::new(vec!["http".into()]).with_port(Some(server.addr.port())),
    );

    let roots = resolver.resolve_all(&ctx, "127.0.0.1/a#1.0").await.unwrap();

    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].root.root["size"], json!(2));
    assert_eq!(
        roots[0].root.source_uri.as_ref().map(|u| u.to_string()),
        Some(format!("http://127.0.0.1:{}/index.json", server.addr.port()))
    );
    assert_eq!(
        server.requests(),
        vec![
            (
                "/.well-known/oci-host-ref-engines".to_string(),
                REF_ENGINES_MEDIA_TYPE.to_string()
            ),
            ("/index.json".to_string(), INDEX_MEDIA_TYPE.to_string()),
        ]
    );
}

#[tokio::test]
async fn test_wrong_media_type_contributes_nothing() {
    let routes = HashMap::from([(
        "/.well-known/oci-host-ref-engines",
        Route {
            content_type: "text/plain",
            body: index_template_engines("/index.json").to_string(),
        },
    )]);
    let server = HttpFixture::serve(routes).await;

    let ctx = Context::new(Arc::new(HttpTransport::with_timeout(Some(Duration::from_secs(10)))));
    let resolver = Resolver::new(registry()).with_engine(
        WellKnownEngine::new(vec!["http".into()]).with_port(Some(server.addr.port())),
    );

    let roots = resolver.resolve_all(&ctx, "127.0.0.1/a").await.unwrap();
    assert!(roots.is_empty());
    assert_eq!(server.requests().len(), 1);
}

#[tokio::test]
async fn test_missing_document_contributes_nothing() {
    let server = HttpFixture::serve(HashMap::new()).await;

    let ctx = Context::new(Arc::new(HttpTransport::new()));
    let resolver = Resolver::new(registry()).with_engine(
        WellKnownEngine::new(vec!["http".into()]).with_port(Some(server.addr.port())),
    );

    let roots = resolver.resolve_all(&ctx, "127.0.0.1/a").await.unwrap();
    assert!(roots.is_empty());
}
