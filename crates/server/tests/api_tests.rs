use reqwest::Client;
use shardvec_core::index::VectorIndex;
use shardvec_core::record::Vector;
use shardvec_core::storage::ShardedStorage;
use shardvec_server::api::create_router;
use shardvec_server::api::handlers::AppState;
use std::sync::Arc;
use tempfile::TempDir;

async fn spawn_app(shards: usize) -> (String, TempDir) {
    let tmp_dir = TempDir::new().expect("Failed to create temp dir");

    let node_names: Vec<String> = (0..shards).map(|i| i.to_string()).collect();
    let storage =
        Arc::new(ShardedStorage::open(tmp_dir.path(), &node_names).expect("Failed to open storage"));
    let index = Arc::new(VectorIndex::new(Arc::clone(&storage)).expect("Failed to build index"));

    let app = create_router(AppState { storage, index });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://{}", addr);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (base_url, tmp_dir)
}

fn client() -> Client {
    Client::new()
}

fn sample_vector(id: &str, embedding: Vec<f64>, name: &str, text: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "embedding": embedding,
        "metadata": { "name": name, "category": "sample" },
        "text": text,
    })
}

#[tokio::test]
async fn vector_lifecycle_end_to_end() {
    let (base_url, _tmp) = spawn_app(4).await;

    let entries = [
        sample_vector("vector1", vec![0.1, 0.2, 0.3], "Vector 1", "text for vector1"),
        sample_vector("vector2", vec![0.4, 0.5, 0.6], "Vector 2", "text for vector2"),
        sample_vector("vector3", vec![0.7, 0.8, 0.9], "Vector 3", "text for vector3"),
    ];
    for entry in &entries {
        let resp = client()
            .post(format!("{base_url}/vectors"))
            .json(entry)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
    }

    // Retrieval returns the record field-for-field.
    let resp = client()
        .get(format!("{base_url}/vectors/vector2"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let vector2: Vector = resp.json().await.unwrap();
    assert_eq!(vector2.embedding, vec![0.4, 0.5, 0.6]);
    assert_eq!(vector2.metadata["name"], "Vector 2");
    assert_eq!(vector2.text, "text for vector2");

    // Search returns exactly k records from the inserted set.
    let resp = client()
        .post(format!("{base_url}/search"))
        .json(&serde_json::json!({
            "vector": { "id": "query_vector", "embedding": [0.5, 0.6, 0.7] },
            "k": 2
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let results: Vec<Vector> = resp.json().await.unwrap();
    assert_eq!(results.len(), 2);
    for result in &results {
        assert!(["vector1", "vector2", "vector3"].contains(&result.id.as_str()));
    }

    // Text projection.
    let resp = client()
        .get(format!("{base_url}/query/vector2"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["text"], "text for vector2");

    // Delete, then verify it is gone from storage and search alike.
    let resp = client()
        .delete(format!("{base_url}/vectors/vector1"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);

    let resp = client()
        .get(format!("{base_url}/vectors/vector1"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = client()
        .post(format!("{base_url}/search"))
        .json(&serde_json::json!({
            "vector": { "id": "q", "embedding": [0.1, 0.2, 0.3] },
            "k": 10
        }))
        .send()
        .await
        .unwrap();
    let results: Vec<Vector> = resp.json().await.unwrap();
    assert!(results.iter().all(|r| r.id != "vector1"));
}

#[tokio::test]
async fn metadata_patch_merges_and_404s() {
    let (base_url, _tmp) = spawn_app(4).await;

    let resp = client()
        .post(format!("{base_url}/vectors"))
        .json(&sample_vector("vector2", vec![0.4, 0.5, 0.6], "Vector 2", ""))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    let patch = serde_json::json!({ "metadata": { "name": "Updated Vector 2" } });
    let resp = client()
        .patch(format!("{base_url}/vectors/vector2/metadata"))
        .json(&patch)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let vector: Vector = client()
        .get(format!("{base_url}/vectors/vector2"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(vector.metadata["name"], "Updated Vector 2");
    // Unmentioned keys survive the merge.
    assert_eq!(vector.metadata["category"], "sample");

    let resp = client()
        .patch(format!("{base_url}/vectors/nonexistent_vector/metadata"))
        .json(&patch)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn search_rejects_invalid_k() {
    let (base_url, _tmp) = spawn_app(2).await;

    for k in [0, -3] {
        let resp = client()
            .post(format!("{base_url}/search"))
            .json(&serde_json::json!({
                "vector": { "id": "q", "embedding": [0.1] },
                "k": k
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
    }
}

#[tokio::test]
async fn insert_rejects_malformed_payloads() {
    let (base_url, _tmp) = spawn_app(2).await;

    // NaN is not representable in JSON; a null component fails decoding.
    let resp = client()
        .post(format!("{base_url}/vectors"))
        .json(&serde_json::json!({ "id": "bad", "embedding": [0.1, null] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 422);

    // A coherent body with an incoherent compression flag is a 400.
    let resp = client()
        .post(format!("{base_url}/vectors"))
        .json(&serde_json::json!({ "id": "bad", "embedding": [0.1], "compressed": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn reranker_prefers_text_matches() {
    let (base_url, _tmp) = spawn_app(4).await;

    let entries = [
        sample_vector("near", vec![0.5, 0.6, 0.7], "Near", "unrelated words"),
        sample_vector("hit", vec![0.5, 0.6, 0.1], "Hit", "alpha beta gamma"),
    ];
    for entry in &entries {
        client()
            .post(format!("{base_url}/vectors"))
            .json(entry)
            .send()
            .await
            .unwrap();
    }

    let resp = client()
        .post(format!("{base_url}/search"))
        .json(&serde_json::json!({
            "vector": { "id": "q", "embedding": [0.5, 0.6, 0.7], "text": "beta" },
            "k": 3
        }))
        .send()
        .await
        .unwrap();
    let results: Vec<Vector> = resp.json().await.unwrap();
    assert_eq!(results[0].id, "hit");
}

#[tokio::test]
async fn object_lifecycle_with_multipart_upload() {
    let (base_url, _tmp) = spawn_app(4).await;
    let object_id = "0539f0ac-6771-47c6-8f5e-2cdf272a6de0";

    // Upload: JSON descriptor in 'data', payload bytes in 'object'.
    let descriptor = serde_json::json!({
        "id": object_id,
        "metadata": { "name": "Oxford", "category": "Images" }
    });
    let form = reqwest::multipart::Form::new()
        .text("data", descriptor.to_string())
        .part(
            "object",
            reqwest::multipart::Part::bytes(b"jpeg-bytes".to_vec()).file_name("oxford.jpg"),
        );
    let resp = client()
        .post(format!("{base_url}/objects"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    let resp = client()
        .get(format!("{base_url}/objects/{object_id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["metadata"]["name"], "Oxford");

    // Metadata patch.
    let resp = client()
        .patch(format!("{base_url}/objects/{object_id}/metadata"))
        .json(&serde_json::json!({ "metadata": { "name": "Oxford High Street" } }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // Content replace keeps id and metadata.
    let form = reqwest::multipart::Form::new().part(
        "object",
        reqwest::multipart::Part::bytes(b"webp-bytes".to_vec())
            .file_name("oxford_high_street.webp"),
    );
    let resp = client()
        .patch(format!("{base_url}/objects/{object_id}/content"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = client()
        .get(format!("{base_url}/objects/{object_id}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["metadata"]["name"], "Oxford High Street");
    // Payload travels base64-encoded.
    assert_eq!(body["object"], "d2VicC1ieXRlcw==");

    // Delete, then 404.
    let resp = client()
        .delete(format!("{base_url}/objects/{object_id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);
    let resp = client()
        .get(format!("{base_url}/objects/{object_id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn restart_rebuilds_index_from_storage() {
    let tmp_dir = TempDir::new().unwrap();
    let node_names: Vec<String> = (0..4).map(|i| i.to_string()).collect();

    {
        let storage =
            Arc::new(ShardedStorage::open(tmp_dir.path(), &node_names).expect("open storage"));
        let index = VectorIndex::new(Arc::clone(&storage)).expect("build index");
        index
            .insert(Vector::new("persisted", vec![0.4, 0.5, 0.6]))
            .unwrap();
    }

    // Same data directory, fresh process state.
    let storage =
        Arc::new(ShardedStorage::open(tmp_dir.path(), &node_names).expect("reopen storage"));
    let index = Arc::new(VectorIndex::new(Arc::clone(&storage)).expect("rebuild index"));
    let app = create_router(AppState { storage, index });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let resp = client()
        .post(format!("{base_url}/search"))
        .json(&serde_json::json!({
            "vector": { "id": "q", "embedding": [0.4, 0.5, 0.6] },
            "k": 1
        }))
        .send()
        .await
        .unwrap();
    let results: Vec<Vector> = resp.json().await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, "persisted");
}
