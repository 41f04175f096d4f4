use axum::Json;
use axum::Router;
use axum::http::StatusCode;
use axum::routing::post;
use blockwrap_build::validate::{ManifestValidator, ValidationError};
use blockwrap_core::{ManifestDocument, PackagingConfig, ValidationSettings};
use serde_json::{Value, json};

const CONFIG: &str = r#"
docker:
  input:
    base_image: myimg:1.0
    exposed_port: 8080
    type: objectDetectionAOI
    routes: {process: /process, healthcheck: /health}
    resolution: 0.5
  output:
    tag: myimg-up42:1.0
manifest:
  name: my-block
  display_name: My Block
  type: processing
  machine: small
"#;

fn manifest() -> ManifestDocument {
    let config = PackagingConfig::from_yaml(CONFIG).unwrap();
    ManifestDocument::build(&config.manifest).unwrap()
}

/// Serve `app` on an ephemeral port and return validator settings pointing at it.
async fn serve(app: Router) -> ValidationSettings {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    ValidationSettings {
        endpoint: format!("http://{addr}/validate-schema/block"),
        timeout_secs: 5,
    }
}

#[tokio::test]
async fn accepted_manifest_passes() {
    let app = Router::new().route(
        "/validate-schema/block",
        post(|Json(body): Json<Value>| async move {
            let valid = body["name"] == "my-block" && body["machine"]["type"] == "small";
            Json(json!({"data": {"valid": valid, "errors": []}}))
        }),
    );
    let settings = serve(app).await;

    let validator = ManifestValidator::new(&settings).unwrap();
    validator.validate(&manifest()).await.unwrap();
}

#[tokio::test]
async fn rejected_manifest_lists_errors() {
    let app = Router::new().route(
        "/validate-schema/block",
        post(|| async {
            Json(json!({
                "data": {
                    "valid": false,
                    "errors": ["'tags' is a required property", {"path": "machine"}]
                }
            }))
        }),
    );
    let settings = serve(app).await;

    let err = ManifestValidator::new(&settings)
        .unwrap()
        .validate(&manifest())
        .await
        .unwrap_err();

    match &err {
        ValidationError::Rejected { errors } => {
            assert_eq!(errors[0], "'tags' is a required property");
            assert_eq!(errors[1], r#"{"path":"machine"}"#);
        }
        other => panic!("expected rejection, got {other:?}"),
    }
    assert!(err.to_string().contains("- 'tags' is a required property"));
}

#[tokio::test]
async fn http_error_status_is_request_failure() {
    let app = Router::new().route(
        "/validate-schema/block",
        post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
    );
    let settings = serve(app).await;

    let err = ManifestValidator::new(&settings)
        .unwrap()
        .validate(&manifest())
        .await
        .unwrap_err();

    assert!(matches!(err, ValidationError::Request { .. }));
}

#[tokio::test]
async fn unreachable_endpoint_is_request_failure() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let settings = ValidationSettings {
        endpoint: format!("http://{addr}/validate-schema/block"),
        timeout_secs: 2,
    };
    let err = ManifestValidator::new(&settings)
        .unwrap()
        .validate(&manifest())
        .await
        .unwrap_err();

    assert!(matches!(err, ValidationError::Request { ref endpoint, .. } if endpoint.contains(&addr.to_string())));
}
