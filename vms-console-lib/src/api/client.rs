use async_trait::async_trait;
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::VmsApi;
use crate::config::ConsoleConfig;
use crate::error::ConsoleError;
use crate::locale::{LocaleTable, MessageKey};
use crate::types::{
    Camera, ChannelIdUpdate, FieldAnalysis, MappingRuleSet, Rows, Transformation, VmsConfig,
    VmsConfigUpdate, VmsType,
};

/// Translates a non-2xx response body into the message shown to the user.
///
/// `{ "message": ... }` bodies yield the server's message; other JSON bodies yield the
/// generic "API call failed" text with the status reason; unparseable bodies yield the
/// unknown-error text.
pub fn error_message(status: StatusCode, body: &str, locale: &LocaleTable) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => match value.get("message").and_then(Value::as_str) {
            Some(message) if !message.is_empty() => message.to_string(),
            _ => {
                let reason = status
                    .canonical_reason()
                    .map(str::to_string)
                    .unwrap_or_else(|| status.as_u16().to_string());
                locale.format(MessageKey::ApiCallFailed, &[("status", reason.as_str())])
            }
        },
        Err(_) => locale.text(MessageKey::UnknownError).to_string(),
    }
}

fn segment(vms: &VmsType) -> String {
    urlencoding::encode(vms.as_str()).into_owned()
}

pub struct ApiClient {
    http: Client,
    base_url: String,
    locale: LocaleTable,
}

impl ApiClient {
    pub fn new(config: &ConsoleConfig) -> Result<Self, ConsoleError> {
        let http = Client::builder().timeout(config.timeout()).build()?;
        Self::with_http_client(http, config)
    }

    pub fn with_http_client(http: Client, config: &ConsoleConfig) -> Result<Self, ConsoleError> {
        config.validate()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            locale: config.locale(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check(&self, response: Response) -> Result<Response, ConsoleError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = error_message(status, &body, &self.locale);
        tracing::error!("API call failed with status {}: {}", status, message);
        Err(ConsoleError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn get<T>(&self, path: &str) -> Result<T, ConsoleError>
    where
        T: DeserializeOwned + Default,
    {
        let url = self.url(path);
        tracing::debug!("GET {}", url);
        let response = self.http.get(&url).send().await?;
        let body = self.check(response).await?.text().await?;
        if body.trim().is_empty() {
            return Ok(T::default());
        }
        let rows: Rows<T> = serde_json::from_str(&body)?;
        Ok(rows.into_inner())
    }

    /// Sends a request whose response body is ignored.
    async fn send<B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<(), ConsoleError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url(path);
        tracing::debug!("{} {}", method, url);
        let mut request = self.http.request(method, &url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        self.check(response).await?;
        Ok(())
    }

    async fn post(&self, path: &str) -> Result<(), ConsoleError> {
        self.send::<Value>(Method::POST, path, None).await
    }
}

#[async_trait]
impl VmsApi for ApiClient {
    async fn list_vms_types(&self) -> Result<Vec<VmsType>, ConsoleError> {
        self.get("/v2/vms/types").await
    }

    async fn list_vms_configs(&self) -> Result<Vec<VmsConfig>, ConsoleError> {
        self.get("/v2/vms/configs").await
    }

    async fn get_vms_config(&self, vms: &VmsType) -> Result<VmsConfig, ConsoleError> {
        self.get(&format!("/v2/vms/config/{}", segment(vms))).await
    }

    async fn update_vms_config(
        &self,
        vms: &VmsType,
        update: &VmsConfigUpdate,
    ) -> Result<(), ConsoleError> {
        self.send(
            Method::POST,
            &format!("/v2/vms/config/{}", segment(vms)),
            Some(update),
        )
        .await
    }

    async fn set_vms_active(&self, vms: &VmsType, active: bool) -> Result<(), ConsoleError> {
        self.send::<Value>(
            Method::PUT,
            &format!("/v2/vms/config/{}/active?active={}", segment(vms), active),
            None,
        )
        .await
    }

    async fn sync_vms(&self, vms: &VmsType) -> Result<(), ConsoleError> {
        self.post(&format!("/v2/vms/sync/{}", segment(vms))).await
    }

    async fn sync_all_vms(&self) -> Result<(), ConsoleError> {
        self.post("/v2/vms/sync").await
    }

    async fn list_cameras(&self) -> Result<Vec<Camera>, ConsoleError> {
        self.get("/v2/vms/unified/cameras").await
    }

    async fn list_cameras_by_type(&self, vms: &VmsType) -> Result<Vec<Camera>, ConsoleError> {
        self.get(&format!("/v2/vms/unified/cameras/type/{}", segment(vms)))
            .await
    }

    async fn sync_cameras(&self, vms: &VmsType) -> Result<(), ConsoleError> {
        self.post(&format!("/v2/vms/unified/cameras/sync/{}", segment(vms)))
            .await
    }

    async fn list_raw_cameras_by_type(&self, vms: &VmsType) -> Result<Vec<Value>, ConsoleError> {
        self.get(&format!("/v2/vms/cameras/type/{}", segment(vms)))
            .await
    }

    async fn list_raw_json_by_type(&self, vms: &VmsType) -> Result<Vec<Value>, ConsoleError> {
        self.get(&format!("/v2/vms/cameras/raw/type/{}", segment(vms)))
            .await
    }

    async fn get_mapping_rules(&self, vms: &VmsType) -> Result<MappingRuleSet, ConsoleError> {
        self.get(&format!("/v2/vms/mappings/{}", segment(vms))).await
    }

    async fn add_transformation(
        &self,
        vms: &VmsType,
        transformation: &Transformation,
    ) -> Result<(), ConsoleError> {
        self.send(
            Method::POST,
            &format!("/v2/vms/mappings/{}/transformation", segment(vms)),
            Some(transformation),
        )
        .await
    }

    async fn update_channel_id_transformation(
        &self,
        vms: &VmsType,
        source_field: &str,
    ) -> Result<(), ConsoleError> {
        let body = ChannelIdUpdate {
            source_field: source_field.to_string(),
        };
        self.send(
            Method::POST,
            &format!("/v2/vms/mappings/{}/id-transformation", segment(vms)),
            Some(&body),
        )
        .await
    }

    async fn remove_transformation(
        &self,
        vms: &VmsType,
        index: usize,
    ) -> Result<(), ConsoleError> {
        self.send::<Value>(
            Method::DELETE,
            &format!("/v2/vms/mappings/{}/transformation/{}", segment(vms), index),
            None,
        )
        .await
    }

    async fn reset_mapping_rules(&self, vms: &VmsType) -> Result<(), ConsoleError> {
        self.post(&format!("/v2/vms/mappings/{}/reset", segment(vms)))
            .await
    }

    async fn analyze_field_structure(&self, vms: &VmsType) -> Result<FieldAnalysis, ConsoleError> {
        self.get(&format!("/v2/vms/mappings/analyze/{}", segment(vms)))
            .await
    }

    async fn analyze_unified_structure(&self) -> Result<FieldAnalysis, ConsoleError> {
        self.get("/v2/vms/mappings/analyze").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransformationType;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_client(base_url: &str) -> ApiClient {
        let config = ConsoleConfig::default().with_base_url(base_url);
        let http = Client::builder()
            .no_proxy()
            .build()
            .expect("Failed to create HTTP client");
        ApiClient::with_http_client(http, &config).unwrap()
    }

    #[test]
    fn test_error_message_variants() {
        let locale = LocaleTable::new();
        assert_eq!(
            error_message(
                StatusCode::BAD_REQUEST,
                r#"{"message": "잘못된 필드입니다."}"#,
                &locale
            ),
            "잘못된 필드입니다."
        );
        assert_eq!(
            error_message(StatusCode::INTERNAL_SERVER_ERROR, "{}", &locale),
            "API 호출 실패: Internal Server Error"
        );
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>", &locale),
            "알 수 없는 오류가 발생했습니다."
        );
        assert_eq!(
            error_message(StatusCode::NOT_FOUND, "", &locale),
            "알 수 없는 오류가 발생했습니다."
        );
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = create_test_client("http://localhost:8080/api/");
        assert_eq!(client.base_url(), "http://localhost:8080/api");
        assert_eq!(
            client.url("/v2/vms/types"),
            "http://localhost:8080/api/v2/vms/types"
        );
    }

    #[tokio::test]
    async fn test_list_vms_types() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/vms/types"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"rows": ["emstone", "dahua"]})),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        let types = client.list_vms_types().await.unwrap();
        assert_eq!(types, vec![VmsType::from("emstone"), VmsType::from("dahua")]);
    }

    #[tokio::test]
    async fn test_missing_rows_is_empty() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/vms/mappings/naiz"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        let rules = client.get_mapping_rules(&"naiz".into()).await.unwrap();
        assert!(rules.is_empty());
    }

    #[tokio::test]
    async fn test_add_transformation_posts_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/vms/mappings/dahua/transformation"))
            .and(body_json(json!({
                "sourceField": "channel.id",
                "targetField": "channel_ID",
                "transformationType": "DEFAULT_CONVERSION",
                "parameters": {}
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        let rule = Transformation::new(
            "channel.id",
            "channel_ID",
            TransformationType::DefaultConversion,
        );
        client
            .add_transformation(&"dahua".into(), &rule)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_set_active_uses_query() {
        let mock_server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/v2/vms/config/emstone/active"))
            .and(query_param("active", "false"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        client
            .set_vms_active(&"emstone".into(), false)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_remove_transformation_by_index() {
        let mock_server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v2/vms/mappings/naiz/transformation/2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": "ok"})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        client
            .remove_transformation(&"naiz".into(), 2)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_api_error_carries_server_message() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/vms/unified/cameras/sync/dahua"))
            .respond_with(
                ResponseTemplate::new(503)
                    .set_body_json(json!({"message": "동기화가 이미 진행 중입니다."})),
            )
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        let err = client.sync_cameras(&"dahua".into()).await.unwrap_err();
        match err {
            ConsoleError::Api { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "동기화가 이미 진행 중입니다.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_analyze_unified_structure() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/vms/mappings/analyze"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "rows": { "fields": { "name": "", "location": { "floor": 1 } } }
            })))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        let analysis = client.analyze_unified_structure().await.unwrap();
        assert_eq!(analysis.fields["location"]["floor"], 1);
    }

    #[tokio::test]
    async fn test_network_error() {
        let client = create_test_client("http://127.0.0.1:9");
        let err = client.sync_all_vms().await.unwrap_err();
        assert!(matches!(err, ConsoleError::Network(_)));
    }
}
