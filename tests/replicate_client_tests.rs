//! HTTP tests for the Replicate client against a local mock server.

use futures_util::StreamExt;
use mockito::Matcher;
use serde_json::json;

use medwise::{
    CompletionClient, CompletionRequest, Credential, DomainError, GenerationParameters,
    ModelChoice, ReplicateClient,
};

const TOKEN: &str = "r8_0123456789abcdefghijklmnopqrstuvwxyz0";

fn credential() -> Credential {
    Credential::parse(TOKEN).expect("valid token")
}

fn request(model: ModelChoice) -> CompletionRequest {
    let params = GenerationParameters::default().with_model(model);
    CompletionRequest::new("SYS\n\nUser: hi\n\nAssistant:", "SYS", &params)
}

fn prediction_body(server_url: &str) -> String {
    json!({
        "id": "abc",
        "status": "starting",
        "urls": { "stream": format!("{server_url}/stream/abc") }
    })
    .to_string()
}

async fn collect(client: &ReplicateClient, model: ModelChoice) -> Vec<Result<String, DomainError>> {
    let stream = client
        .complete(&credential(), &request(model))
        .await
        .expect("prediction created");
    stream.collect().await
}

#[tokio::test]
async fn test_streams_output_events_until_done() {
    let mut server = mockito::Server::new_async().await;
    let url = server.url();

    let create = server
        .mock("POST", "/v1/models/meta/meta-llama-3-8b-instruct/predictions")
        .match_header("authorization", format!("Bearer {TOKEN}").as_str())
        .match_body(Matcher::PartialJson(json!({
            "stream": true,
            "input": { "system_prompt": "SYS", "temperature": 0.1, "top_p": 0.9 }
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(prediction_body(&url))
        .create_async()
        .await;

    let stream = server
        .mock("GET", "/stream/abc")
        .match_header("accept", "text/event-stream")
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(
            "event: output\nid: 1\ndata: Drink\n\n\
             event: output\nid: 2\ndata:  water.\n\n\
             event: done\ndata: {}\n\n\
             event: output\ndata: ignored\n\n",
        )
        .create_async()
        .await;

    let client = ReplicateClient::new(&url);
    let items = collect(&client, ModelChoice::Llama3Instruct8b).await;
    let fragments: Vec<String> = items.into_iter().map(|r| r.unwrap()).collect();

    assert_eq!(fragments, vec!["Drink", " water."]);
    create.assert_async().await;
    stream.assert_async().await;
}

#[tokio::test]
async fn test_versioned_model_posts_to_predictions_endpoint() {
    let mut server = mockito::Server::new_async().await;
    let url = server.url();

    let create = server
        .mock("POST", "/v1/predictions")
        .match_body(Matcher::PartialJson(json!({
            "version": "df7690f1994d94e96ad9d568eac121aecf50684a0b0963b25a41cc40061269e5"
        })))
        .with_status(201)
        .with_body(prediction_body(&url))
        .create_async()
        .await;

    let _stream = server
        .mock("GET", "/stream/abc")
        .with_status(200)
        .with_body("event: output\ndata: ok\n\nevent: done\ndata: {}\n\n")
        .create_async()
        .await;

    let client = ReplicateClient::new(&url);
    let items = collect(&client, ModelChoice::Llama2Chat13b).await;

    assert_eq!(items.len(), 1);
    create.assert_async().await;
}

#[tokio::test]
async fn test_error_event_ends_stream_with_provider_error() {
    let mut server = mockito::Server::new_async().await;
    let url = server.url();

    let _create = server
        .mock("POST", "/v1/models/meta/meta-llama-3-8b-instruct/predictions")
        .with_status(201)
        .with_body(prediction_body(&url))
        .create_async()
        .await;

    let _stream = server
        .mock("GET", "/stream/abc")
        .with_status(200)
        .with_body(
            "event: output\ndata: Part\n\n\
             event: error\ndata: {\"detail\":\"CUDA out of memory\"}\n\n",
        )
        .create_async()
        .await;

    let client = ReplicateClient::new(&url);
    let items = collect(&client, ModelChoice::Llama3Instruct8b).await;

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_deref().unwrap(), "Part");
    let err = items[1].as_ref().unwrap_err();
    assert!(err.is_provider_error());
    assert!(err.to_string().contains("CUDA out of memory"));
}

#[tokio::test]
async fn test_rejected_token_is_provider_error() {
    let mut server = mockito::Server::new_async().await;

    let _create = server
        .mock("POST", "/v1/models/meta/meta-llama-3-8b-instruct/predictions")
        .with_status(401)
        .with_body(r#"{"detail":"Invalid token."}"#)
        .create_async()
        .await;

    let client = ReplicateClient::new(server.url());
    let result = client
        .complete(&credential(), &request(ModelChoice::Llama3Instruct8b))
        .await;

    match result {
        Err(e) => {
            assert!(e.is_provider_error());
            assert!(e.to_string().contains("401"));
        }
        Ok(_) => panic!("expected an error for a 401 response"),
    }
}

#[tokio::test]
async fn test_missing_stream_url_is_provider_error() {
    let mut server = mockito::Server::new_async().await;

    let _create = server
        .mock("POST", "/v1/models/meta/meta-llama-3-8b-instruct/predictions")
        .with_status(201)
        .with_body(r#"{"id":"abc","status":"starting","urls":{}}"#)
        .create_async()
        .await;

    let client = ReplicateClient::new(server.url());
    let result = client
        .complete(&credential(), &request(ModelChoice::Llama3Instruct8b))
        .await;

    assert!(matches!(result, Err(DomainError::Provider(_))));
}
