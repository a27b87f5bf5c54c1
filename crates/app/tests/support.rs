//! Shared helpers for `leadflow-app` integration tests.

#![allow(dead_code)]

use std::path::PathBuf;

use leadflow_domain::{Config, StorageBackend};
use leadflow_lib::AppContext;
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const PRODUCT_ID: &str = "65a1";
pub const BATCH_ID: &str = "a1b2c3d4";

/// Config pointed at `server`, with a static token and an in-memory registry.
pub fn test_config(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.api.base_url = server.uri();
    config.api.token = Some("test-token".into());
    config.api.timeout_secs = 5;
    config.storage.backend = StorageBackend::Memory;
    config
}

pub fn context(server: &MockServer) -> AppContext {
    AppContext::new(test_config(server)).expect("context should build")
}

/// A spreadsheet on disk plus the directory keeping it alive.
pub struct Workbook {
    pub dir: TempDir,
    pub path: PathBuf,
}

pub fn workbook(name: &str) -> Workbook {
    let dir = TempDir::new().expect("temp dir should be created");
    let path = dir.path().join(name);
    std::fs::write(&path, b"PK-fake-workbook").expect("workbook should be written");
    Workbook { dir, path }
}

pub fn product_json() -> Value {
    json!({
        "id": PRODUCT_ID,
        "nome": "Pos Graduacao",
        "tipo": "pos",
        "ativo": true,
        "filtro_inscrito_por": {"valores_permitidos": ["6111 DIGITAL"], "modo": "whitelist"},
        "filtro_status": {"remover": ["PAGO"]},
        "consultores_ids": ["c1"]
    })
}

pub async fn mount_products(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/produtos/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([product_json()])))
        .mount(server)
        .await;
}

pub async fn mount_upload(server: &MockServer, total: u64) {
    Mock::given(method("POST"))
        .and(path(format!("/leads/upload/{PRODUCT_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Arquivo processado com sucesso!",
            "lote_id": BATCH_ID,
            "arquivo": "leads.xlsx",
            "total_registros": total,
            "preview": []
        })))
        .mount(server)
        .await;
}

pub async fn mount_process(server: &MockServer, valid: u64) {
    Mock::given(method("POST"))
        .and(path(format!("/leads/processar/{BATCH_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Processamento concluído!",
            "lote_id": BATCH_ID,
            "total_processados": 42,
            "validos": valid,
            "duplicados": 8,
            "filtrados": 42 - 8 - valid,
            "detalhes": {}
        })))
        .mount(server)
        .await;
}

pub fn send_ok() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "message": "Envio concluído!",
        "disparo_id": "d-77",
        "total": 30,
        "enviados_sucesso": 30,
        "enviados_erro": 0,
        "consultores_utilizados": ["Ana"]
    }))
}
