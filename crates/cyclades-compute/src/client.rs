//! Asynchronous Cyclades compute client implementation.

use crate::models::{CreateServerRequest, RebootRequest, RebootType, ServerCreateOptions};
use crate::Result;
use async_trait::async_trait;
use cyclades_core::client::{HttpConfig, ServiceClient, ServiceClientBuilder};
use cyclades_core::config::CycladesConfig;
use cyclades_core::ids::{FlavorId, ImageId, ServerId};
use reqwest::Method;
use secrecy::ExposeSecret;
use serde_json::Value;
use validator::Validate;

const USER_AGENT: &str = concat!("cyclades-compute/", env!("CARGO_PKG_VERSION"));

/// Builder for [`CycladesClient`].
#[derive(Debug, Clone)]
pub struct CycladesClientBuilder {
    inner: ServiceClientBuilder,
}

impl CycladesClientBuilder {
    /// Create a builder for the given endpoint and token.
    #[must_use]
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        let builder = ServiceClientBuilder::new(endpoint, token).with_user_agent(USER_AGENT);
        Self { inner: builder }
    }

    /// Override the HTTP client configuration.
    #[must_use]
    pub fn with_http_config(mut self, config: HttpConfig) -> Self {
        self.inner = self.inner.with_http_config(config);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](cyclades_core::Error::Config) if the token cannot be sent as
    /// a header value or the HTTP client cannot be constructed.
    pub fn build(self) -> Result<CycladesClient> {
        let inner = self.inner.build()?;
        Ok(CycladesClient { inner })
    }
}

/// Asynchronous Cyclades compute client.
///
/// Every operation issues exactly one request and resolves to the parsed JSON body.
#[derive(Debug, Clone)]
pub struct CycladesClient {
    inner: ServiceClient,
}

impl CycladesClient {
    /// Construct a client from the API endpoint and token. Both are used verbatim.
    ///
    /// # Errors
    ///
    /// See [`CycladesClientBuilder::build`].
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        CycladesClientBuilder::new(endpoint, token).build()
    }

    /// Construct a client from a loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](cyclades_core::Error::Config) if the configuration fails
    /// validation, or any error from [`CycladesClientBuilder::build`].
    pub fn from_config(config: &CycladesConfig) -> Result<Self> {
        config.validate()?;
        CycladesClientBuilder::new(config.endpoint.as_str(), config.token.expose_secret())
            .with_http_config(config.http_config())
            .build()
    }

    /// Return the endpoint exactly as configured.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        self.inner.endpoint()
    }

    /// List servers owned by the user.
    pub async fn server_list(&self) -> Result<Value> {
        self.get("servers").await
    }

    /// List servers with all available details.
    pub async fn server_list_detail(&self) -> Result<Value> {
        self.get("servers/detail").await
    }

    /// Create a server.
    pub async fn server_create(
        &self,
        name: impl Into<String>,
        image_id: impl Into<ImageId>,
        flavor_id: impl Into<FlavorId>,
        options: ServerCreateOptions,
    ) -> Result<Value> {
        let request = CreateServerRequest::new(name, image_id, flavor_id, options);
        self.inner
            .call(Method::POST, "servers", Some(&request))
            .await
    }

    /// Fetch a single server.
    pub async fn server_get(&self, id: impl Into<ServerId>) -> Result<Value> {
        let path = format!("servers/{}", id.into());
        self.get(&path).await
    }

    /// Soft-reboot a server.
    pub async fn server_reboot(&self, id: impl Into<ServerId>) -> Result<Value> {
        self.server_reboot_with(id, RebootType::Soft).await
    }

    /// Reboot a server with the given reboot type.
    pub async fn server_reboot_with(
        &self,
        id: impl Into<ServerId>,
        reboot_type: RebootType,
    ) -> Result<Value> {
        let path = format!("servers/{}/action", id.into());
        let request = RebootRequest::new(reboot_type);
        self.inner.call(Method::POST, &path, Some(&request)).await
    }

    /// Delete a server along with its attachments.
    pub async fn server_delete(&self, id: impl Into<ServerId>) -> Result<Value> {
        let path = format!("servers/{}", id.into());
        self.inner.call::<()>(Method::DELETE, &path, None).await
    }

    /// List images available to the user.
    pub async fn image_list(&self) -> Result<Value> {
        self.get("images").await
    }

    /// List images with all available details.
    pub async fn image_list_detail(&self) -> Result<Value> {
        self.get("images/detail").await
    }

    /// Fetch a single image.
    pub async fn image_get(&self, id: impl Into<ImageId>) -> Result<Value> {
        let path = format!("images/{}", id.into());
        self.get(&path).await
    }

    /// List flavors.
    pub async fn flavor_list(&self) -> Result<Value> {
        self.get("flavors").await
    }

    /// List flavors with all available details.
    pub async fn flavor_list_detail(&self) -> Result<Value> {
        self.get("flavors/detail").await
    }

    /// Fetch a single flavor.
    pub async fn flavor_get(&self, id: impl Into<FlavorId>) -> Result<Value> {
        let path = format!("flavors/{}", id.into());
        self.get(&path).await
    }

    async fn get(&self, path: &str) -> Result<Value> {
        self.inner.call::<()>(Method::GET, path, None).await
    }
}

/// Compute operations, for callers that want to swap in a fake.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ComputeApi: Send + Sync {
    /// See [`CycladesClient::server_list`].
    async fn server_list(&self) -> Result<Value>;

    /// See [`CycladesClient::server_list_detail`].
    async fn server_list_detail(&self) -> Result<Value>;

    /// See [`CycladesClient::server_create`].
    async fn server_create(
        &self,
        name: &str,
        image_id: &ImageId,
        flavor_id: &FlavorId,
        options: &ServerCreateOptions,
    ) -> Result<Value>;

    /// See [`CycladesClient::server_get`].
    async fn server_get(&self, id: &ServerId) -> Result<Value>;

    /// See [`CycladesClient::server_reboot`].
    async fn server_reboot(&self, id: &ServerId) -> Result<Value>;

    /// See [`CycladesClient::server_reboot_with`].
    async fn server_reboot_with(&self, id: &ServerId, reboot_type: RebootType) -> Result<Value>;

    /// See [`CycladesClient::server_delete`].
    async fn server_delete(&self, id: &ServerId) -> Result<Value>;

    /// See [`CycladesClient::image_list`].
    async fn image_list(&self) -> Result<Value>;

    /// See [`CycladesClient::image_list_detail`].
    async fn image_list_detail(&self) -> Result<Value>;

    /// See [`CycladesClient::image_get`].
    async fn image_get(&self, id: &ImageId) -> Result<Value>;

    /// See [`CycladesClient::flavor_list`].
    async fn flavor_list(&self) -> Result<Value>;

    /// See [`CycladesClient::flavor_list_detail`].
    async fn flavor_list_detail(&self) -> Result<Value>;

    /// See [`CycladesClient::flavor_get`].
    async fn flavor_get(&self, id: &FlavorId) -> Result<Value>;
}

#[async_trait]
impl ComputeApi for CycladesClient {
    async fn server_list(&self) -> Result<Value> {
        CycladesClient::server_list(self).await
    }

    async fn server_list_detail(&self) -> Result<Value> {
        CycladesClient::server_list_detail(self).await
    }

    async fn server_create(
        &self,
        name: &str,
        image_id: &ImageId,
        flavor_id: &FlavorId,
        options: &ServerCreateOptions,
    ) -> Result<Value> {
        CycladesClient::server_create(self, name, image_id, flavor_id, options.clone()).await
    }

    async fn server_get(&self, id: &ServerId) -> Result<Value> {
        CycladesClient::server_get(self, id).await
    }

    async fn server_reboot(&self, id: &ServerId) -> Result<Value> {
        CycladesClient::server_reboot(self, id).await
    }

    async fn server_reboot_with(&self, id: &ServerId, reboot_type: RebootType) -> Result<Value> {
        CycladesClient::server_reboot_with(self, id, reboot_type).await
    }

    async fn server_delete(&self, id: &ServerId) -> Result<Value> {
        CycladesClient::server_delete(self, id).await
    }

    async fn image_list(&self) -> Result<Value> {
        CycladesClient::image_list(self).await
    }

    async fn image_list_detail(&self) -> Result<Value> {
        CycladesClient::image_list_detail(self).await
    }

    async fn image_get(&self, id: &ImageId) -> Result<Value> {
        CycladesClient::image_get(self, id).await
    }

    async fn flavor_list(&self) -> Result<Value> {
        CycladesClient::flavor_list(self).await
    }

    async fn flavor_list_detail(&self) -> Result<Value> {
        CycladesClient::flavor_list_detail(self).await
    }

    async fn flavor_get(&self, id: &FlavorId) -> Result<Value> {
        CycladesClient::flavor_get(self, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NetworkAttachment, Personality};
    use cyclades_core::Error;
    use serde_json::json;
    use uuid::Uuid;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TOKEN: &str = "test-token";

    fn test_client(server: &MockServer) -> CycladesClient {
        CycladesClient::new(server.uri(), TOKEN).unwrap()
    }

    async fn expect_get(server: &MockServer, route: &str, reply: Value) {
        Mock::given(method("GET"))
            .and(path(route))
            .and(header("x-auth-token", TOKEN))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply))
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn server_list_success() {
        let server = MockServer::start().await;
        expect_get(&server, "/servers", json!({"servers": [{"id": 1, "name": "a"}]})).await;

        let body = test_client(&server).server_list().await.unwrap();
        assert_eq!(body["servers"][0]["name"], "a");
    }

    #[tokio::test]
    async fn server_list_detail_success() {
        let server = MockServer::start().await;
        expect_get(&server, "/servers/detail", json!({"servers": []})).await;

        let body = test_client(&server).server_list_detail().await.unwrap();
        assert_eq!(body, json!({"servers": []}));
    }

    #[tokio::test]
    async fn server_get_returns_body() {
        let server = MockServer::start().await;
        expect_get(&server, "/servers/42", json!({"id": 42})).await;

        let body = test_client(&server).server_get(42u64).await.unwrap();
        assert_eq!(body, json!({"id": 42}));
    }

    #[tokio::test]
    async fn server_get_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/servers/404"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = test_client(&server).server_get("404").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(
            err.body(),
            Some(&json!({"statusCode": 404, "statusMessage": "Not Found"}))
        );
    }

    #[tokio::test]
    async fn server_create_posts_metadata() {
        let server = MockServer::start().await;
        let image = Uuid::new_v4();

        Mock::given(method("POST"))
            .and(path("/servers"))
            .and(header("x-auth-token", TOKEN))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({
                "server": {
                    "name": "web-1",
                    "imageRef": image.to_string(),
                    "flavorRef": 3,
                    "metadata": {"a": "b"}
                }
            })))
            .respond_with(ResponseTemplate::new(202).set_body_json(json!({
                "server": {"id": 7, "name": "web-1", "status": "BUILD", "adminPass": "pw"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let body = test_client(&server)
            .server_create(
                "web-1",
                image,
                3u64,
                ServerCreateOptions::new().with_metadata("a", "b"),
            )
            .await
            .unwrap();
        assert_eq!(body["server"]["status"], "BUILD");
    }

    #[tokio::test]
    async fn server_create_sends_all_options() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/servers"))
            .and(body_json(json!({
                "server": {
                    "name": "db",
                    "imageRef": "img-1",
                    "flavorRef": "2",
                    "personality": [{
                        "path": "/root/.ssh/authorized_keys",
                        "contents": "c3NoLXJzYSBBQUFB",
                        "owner": "root",
                        "mode": 384
                    }],
                    "networks": [{"uuid": "net-1"}, {"port": "port-1"}],
                    "project": "proj-1"
                }
            })))
            .respond_with(ResponseTemplate::new(202).set_body_json(json!({"server": {"id": 8}})))
            .expect(1)
            .mount(&server)
            .await;

        let options = ServerCreateOptions::new()
            .with_personality(
                Personality::from_bytes("/root/.ssh/authorized_keys", "ssh-rsa AAAA")
                    .with_owner("root")
                    .with_mode(0o600),
            )
            .with_network(NetworkAttachment::network("net-1"))
            .with_network(NetworkAttachment::port("port-1"))
            .with_project("proj-1");

        let body = test_client(&server)
            .server_create("db", "img-1", "2", options)
            .await
            .unwrap();
        assert_eq!(body["server"]["id"], 8);
    }

    #[tokio::test]
    async fn server_create_surfaces_provider_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/servers"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "badRequest": {"code": 400, "message": "Invalid flavor"}
            })))
            .mount(&server)
            .await;

        let err = test_client(&server)
            .server_create("", "img", 999u64, ServerCreateOptions::new())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), Some(400));
        assert_eq!(err.body().unwrap()["badRequest"]["message"], "Invalid flavor");
    }

    #[tokio::test]
    async fn server_reboot_posts_soft_action() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/servers/5/action"))
            .and(header("x-auth-token", TOKEN))
            .and(body_json(json!({"reboot": {"type": "SOFT"}})))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let body = test_client(&server).server_reboot(5u64).await.unwrap();
        assert_eq!(body, json!({"statusCode": 202, "statusMessage": "Accepted"}));
    }

    #[tokio::test]
    async fn server_reboot_with_hard() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/servers/5/action"))
            .and(body_json(json!({"reboot": {"type": "HARD"}})))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        test_client(&server)
            .server_reboot_with(5u64, RebootType::Hard)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn server_delete_handles_no_content() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/servers/9"))
            .and(header("x-auth-token", TOKEN))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let body = test_client(&server).server_delete(9u64).await.unwrap();
        assert_eq!(body["statusCode"], 204);
    }

    #[tokio::test]
    async fn image_endpoints() {
        let server = MockServer::start().await;
        let image = Uuid::new_v4();
        expect_get(&server, "/images", json!({"images": []})).await;
        expect_get(&server, "/images/detail", json!({"images": [{"id": image}]})).await;
        expect_get(
            &server,
            &format!("/images/{image}"),
            json!({"image": {"id": image}}),
        )
        .await;

        let client = test_client(&server);
        assert_eq!(client.image_list().await.unwrap(), json!({"images": []}));
        assert_eq!(
            client.image_list_detail().await.unwrap()["images"][0]["id"],
            json!(image)
        );
        assert_eq!(
            client.image_get(image).await.unwrap()["image"]["id"],
            json!(image)
        );
    }

    #[tokio::test]
    async fn flavor_endpoints() {
        let server = MockServer::start().await;
        expect_get(&server, "/flavors", json!({"flavors": [{"id": 1}]})).await;
        expect_get(&server, "/flavors/detail", json!({"flavors": [{"id": 1, "ram": 1024}]}))
            .await;
        expect_get(&server, "/flavors/1", json!({"flavor": {"id": 1, "vcpus": 2}})).await;

        let client = test_client(&server);
        assert_eq!(client.flavor_list().await.unwrap()["flavors"][0]["id"], 1);
        assert_eq!(
            client.flavor_list_detail().await.unwrap()["flavors"][0]["ram"],
            1024
        );
        assert_eq!(client.flavor_get(1u64).await.unwrap()["flavor"]["vcpus"], 2);
    }

    #[tokio::test]
    async fn concurrent_calls_keep_their_own_bodies() {
        let server = MockServer::start().await;
        expect_get(&server, "/servers/1", json!({"server": {"id": 1}})).await;
        expect_get(&server, "/flavors/2", json!({"flavor": {"id": 2}})).await;

        let client = test_client(&server);
        let other = client.clone();
        let (server_body, flavor_body) =
            tokio::join!(client.server_get(1u64), other.flavor_get(2u64));

        assert_eq!(server_body.unwrap(), json!({"server": {"id": 1}}));
        assert_eq!(flavor_body.unwrap(), json!({"flavor": {"id": 2}}));
    }

    #[tokio::test]
    async fn from_config_uses_config_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flavors"))
            .and(header("x-auth-token", "from-config"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"flavors": []})))
            .expect(1)
            .mount(&server)
            .await;

        let config = CycladesConfig::new(server.uri(), "from-config")
            .unwrap()
            .with_timeout(5);
        let client = CycladesClient::from_config(&config).unwrap();
        assert_eq!(client.endpoint(), server.uri());
        client.flavor_list().await.unwrap();
    }

    #[test]
    fn from_config_rejects_invalid_deserialized_config() {
        let config: CycladesConfig = serde_json::from_value(json!({
            "endpoint": "not a url",
            "token": "t",
            "request_timeout_secs": 0
        }))
        .unwrap();

        let result = CycladesClient::from_config(&config);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn trait_object_dispatches_to_client() {
        let server = MockServer::start().await;
        expect_get(&server, "/images/abc", json!({"image": {"id": "abc"}})).await;

        let api: Box<dyn ComputeApi> = Box::new(test_client(&server));
        let body = api.image_get(&ImageId::from("abc")).await.unwrap();
        assert_eq!(body["image"]["id"], "abc");
    }

    #[tokio::test]
    async fn trait_object_hard_reboot() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/servers/12/action"))
            .and(header("x-auth-token", TOKEN))
            .and(body_json(json!({"reboot": {"type": "HARD"}})))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let api: Box<dyn ComputeApi> = Box::new(test_client(&server));
        let body = api
            .server_reboot_with(&ServerId::from(12u64), RebootType::Hard)
            .await
            .unwrap();
        assert_eq!(body["statusCode"], 202);
    }

    #[tokio::test]
    async fn mock_compute_api_stubs_hard_reboot() {
        let mut api = MockComputeApi::new();
        api.expect_server_reboot_with()
            .withf(|id, reboot_type| {
                *id == ServerId::from(3u64) && *reboot_type == RebootType::Hard
            })
            .times(1)
            .returning(|_, _| Ok(json!({"statusCode": 202, "statusMessage": "Accepted"})));

        let api: &dyn ComputeApi = &api;
        let body = api
            .server_reboot_with(&ServerId::from(3u64), RebootType::Hard)
            .await
            .unwrap();
        assert_eq!(body["statusMessage"], "Accepted");
    }

    async fn first_server_name(api: &dyn ComputeApi) -> Option<String> {
        let body = api.server_list().await.ok()?;
        body["servers"][0]["name"].as_str().map(str::to_string)
    }

    #[tokio::test]
    async fn mock_compute_api_can_stand_in() {
        let mut api = MockComputeApi::new();
        api.expect_server_list()
            .times(1)
            .returning(|| Ok(json!({"servers": [{"id": 1, "name": "mocked"}]})));

        assert_eq!(first_server_name(&api).await.as_deref(), Some("mocked"));
    }

    #[tokio::test]
    async fn mock_compute_api_propagates_errors() {
        let mut api = MockComputeApi::new();
        api.expect_server_list().returning(|| {
            Err(Error::Status {
                status_code: 401,
                status_message: "Unauthorized".to_string(),
                body: json!({"statusCode": 401, "statusMessage": "Unauthorized"}),
            })
        });

        assert_eq!(first_server_name(&api).await, None);
    }
}
