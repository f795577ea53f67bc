use crate::{
    Result,
    app::TokenService,
};
use actix_cors::Cors;
use actix_web::{
    App,
    HttpRequest,
    HttpResponse,
    HttpServer,
    dev::ServerHandle,
    http::{
        StatusCode,
        header::{
            self,
            ContentType,
        },
    },
    web,
};
use anyhow::Context;
use pasanaku_view::{
    LookupError,
    reads::{
        ContractReader,
        TokenReader,
    },
};
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    net::{
        IpAddr,
        Ipv4Addr,
        Ipv6Addr,
        SocketAddr,
        TcpListener,
    },
    thread::JoinHandle,
};

const CACHE_CONTROL: &str = "public, max-age=60, s-maxage=60";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct ErrorDto {
    error: String,
}

pub struct ActixTokenApi {
    local_addr: SocketAddr,
    base_url: String,
    server_handle: ServerHandle,
    server_thread: Option<JoinHandle<()>>,
}

impl ActixTokenApi {
    /// Binds `host:port`, an ephemeral port when `port` is `None`.
    pub fn new<R>(host: IpAddr, port: Option<u16>, service: TokenService<R>) -> Result<Self>
    where
        R: ContractReader + TokenReader + Send + Sync + 'static,
    {
        let listener = TcpListener::bind((host, port.unwrap_or(0))).with_context(|| {
            format!("failed to bind HTTP listener for token API on {host}")
        })?;
        let local_addr = listener
            .local_addr()
            .context("failed to read listener address")?;
        let base_url = format!("http://{}", reachable(local_addr));

        tracing::info!("token API listening on {}", base_url);

        let service = web::Data::new(service);
        let server = HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allowed_methods(vec!["GET"])
                .max_age(3600);
            App::new()
                .wrap(cors)
                .app_data(service.clone())
                .route(
                    "/api/v1/token/{id:[^/]*}",
                    web::get().to(handle_metadata::<R>),
                )
                .route(
                    "/api/v1/token/{id:[^/]*}/image",
                    web::get().to(handle_image::<R>),
                )
        })
        .listen(listener)
        .context("failed to start Actix server")?
        .run();

        let server_handle = server.handle();
        let server_thread = std::thread::spawn(move || {
            let sys = actix_web::rt::System::new();
            let _ = sys.block_on(server);
        });

        Ok(Self {
            local_addr,
            base_url,
            server_handle,
            server_thread: Some(server_thread),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Loopback URL of the listener, usable even when bound to a wildcard.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn reachable(address: SocketAddr) -> SocketAddr {
    match address.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => {
            SocketAddr::new(Ipv4Addr::LOCALHOST.into(), address.port())
        }
        IpAddr::V6(ip) if ip.is_unspecified() => {
            SocketAddr::new(Ipv6Addr::LOCALHOST.into(), address.port())
        }
        _ => address,
    }
}

impl Drop for ActixTokenApi {
    fn drop(&mut self) {
        let _ = self.server_handle.stop(true);
        if let Some(thread) = self.server_thread.take() {
            let _ = thread.join();
        }
    }
}

fn request_origin(req: &HttpRequest) -> String {
    let info = req.connection_info();
    format!("{}://{}", info.scheme(), info.host())
}

fn status_of(error: &LookupError) -> StatusCode {
    StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Upstream detail goes to the log only; callers get a fixed message.
fn log_lookup_error(route: &str, raw_id: &str, error: &LookupError) {
    match error {
        LookupError::Upstream(e) => {
            tracing::error!("{route} for token '{raw_id}' failed: {e:#}")
        }
        other => tracing::debug!("{route} for token '{raw_id}' rejected: {other}"),
    }
}

fn json_error(status: StatusCode, message: &str) -> HttpResponse {
    HttpResponse::build(status).json(ErrorDto {
        error: message.to_string(),
    })
}

fn text_error(status: StatusCode, message: &str) -> HttpResponse {
    HttpResponse::build(status)
        .content_type(ContentType::plaintext())
        .body(message.to_string())
}

async fn handle_metadata<R: ContractReader + TokenReader + 'static>(
    service: web::Data<TokenService<R>>,
    id: web::Path<String>,
    req: HttpRequest,
) -> HttpResponse {
    let raw_id = id.into_inner();
    tracing::info!("received metadata request for token '{raw_id}'");
    let origin = request_origin(&req);
    let metadata = match service.metadata(&raw_id, &origin).await {
        Ok(metadata) => metadata,
        Err(e) => {
            log_lookup_error("metadata", &raw_id, &e);
            let message = match e {
                LookupError::InvalidTokenId(_) => "Invalid or missing token id",
                LookupError::NotFound => "Game not found",
                LookupError::Upstream(_) => "Failed to load metadata",
            };
            return json_error(status_of(&e), message);
        }
    };
    match metadata.to_json() {
        Ok(body) => HttpResponse::Ok()
            .content_type(ContentType::json())
            .insert_header((header::CACHE_CONTROL, CACHE_CONTROL))
            .body(body),
        Err(e) => {
            tracing::error!("failed to serialize metadata for token '{raw_id}': {e}");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load metadata")
        }
    }
}

async fn handle_image<R: ContractReader + TokenReader + 'static>(
    service: web::Data<TokenService<R>>,
    id: web::Path<String>,
) -> HttpResponse {
    let raw_id = id.into_inner();
    tracing::info!("received image request for token '{raw_id}'");
    let summary = match service.summary(&raw_id).await {
        Ok(summary) => summary,
        Err(e) => {
            log_lookup_error("image", &raw_id, &e);
            let message = match e {
                LookupError::InvalidTokenId(_) => "Invalid or missing id",
                LookupError::NotFound => "Game not found",
                LookupError::Upstream(_) => "Failed to generate the image",
            };
            return text_error(status_of(&e), message);
        }
    };

    let renderer = service.renderer().clone();
    let rendered = web::block(move || renderer.render_png(&summary)).await;
    match rendered {
        Ok(Ok(png)) => HttpResponse::Ok()
            .content_type("image/png")
            .insert_header((header::CACHE_CONTROL, CACHE_CONTROL))
            .body(png),
        Ok(Err(e)) => {
            tracing::error!("failed to render image for token '{raw_id}': {e:#}");
            text_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to generate the image",
            )
        }
        Err(e) => {
            tracing::error!("image render task for token '{raw_id}' failed: {e}");
            text_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to generate the image",
            )
        }
    }
}

#[allow(non_snake_case)]
#[cfg(test)]
mod tests {
    use super::*;
    use pasanaku_view::{
        Address,
        ViewContext,
        assets::{
            AssetRegistry,
            AssetTable,
        },
        game::{
            PlayersTuple,
            RawGame,
        },
        presentation::{
            image::ImageRenderer,
            metadata::TokenMetadata,
        },
        test_helpers::FakeContract,
    };
    use std::sync::Arc;

    const NOW: u64 = 1_800_000_000;

    fn account(byte: u8) -> Address {
        Address::new([byte; 20])
    }

    fn four_player_game() -> RawGame {
        let players: Vec<Address> = (1..=4).map(account).collect();
        RawGame::Players(PlayersTuple {
            player_count: 4,
            players,
            asset: account(0xaa),
            amount: 100_000000,
            current_player_index: 1,
            creator: account(0xcc),
            total_deposited: 200_000000,
            token_id: 5,
            ended: false,
            created_at: 1_736_035_200,
            last_updated_at: NOW - 10,
        })
    }

    fn contract() -> FakeContract {
        FakeContract::new()
            .with_game(four_player_game())
            .with_token(account(0xaa), "USDC", 6)
    }

    fn api(contract: FakeContract, public_url: Option<&str>) -> ActixTokenApi {
        let views = ViewContext::new(contract, AssetRegistry::new(AssetTable::empty()))
            .with_clock(Arc::new(|| NOW));
        let service = TokenService::new(views, ImageRenderer::new())
            .with_public_url(public_url.map(str::to_string));
        ActixTokenApi::new(Ipv4Addr::LOCALHOST.into(), None, service).unwrap()
    }

    #[tokio::test]
    async fn new__wildcard_host__serves_on_loopback() {
        // given
        let views = ViewContext::new(contract(), AssetRegistry::new(AssetTable::empty()))
            .with_clock(Arc::new(|| NOW));
        let service = TokenService::new(views, ImageRenderer::new());

        // when
        let api = ActixTokenApi::new(Ipv4Addr::UNSPECIFIED.into(), None, service).unwrap();

        // then
        assert!(api.local_addr().ip().is_unspecified());
        assert!(api.base_url().starts_with("http://127.0.0.1:"), "{}", api.base_url());
        let response = reqwest::get(format!("{}/api/v1/token/5", api.base_url()))
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }

    #[tokio::test]
    async fn metadata__existing_game__returns_document_with_cache_header() {
        // given
        let api = api(contract(), None);
        let url = format!("{}/api/v1/token/5", api.base_url());

        // when
        let response = reqwest::get(url).await.unwrap();

        // then
        assert_eq!(response.status(), 200);
        assert_eq!(
            response.headers()["cache-control"],
            "public, max-age=60, s-maxage=60"
        );
        let metadata: TokenMetadata = response.json().await.unwrap();
        assert_eq!(metadata.name, "Pasanaku #5");
        assert_eq!(
            metadata.description,
            "Rotating savings game. 100 USDC per round. 4 players, round 2 of 4. \
             Pot: 200 USDC. Status: Active."
        );
        assert_eq!(
            metadata.image,
            format!("{}/api/v1/token/5/image", api.base_url())
        );
    }

    #[tokio::test]
    async fn metadata__public_url_configured__links_image_to_it() {
        let api = api(contract(), Some("https://pasanaku.example/"));
        let url = format!("{}/api/v1/token/5", api.base_url());

        let metadata: TokenMetadata = reqwest::get(url).await.unwrap().json().await.unwrap();

        assert_eq!(
            metadata.image,
            "https://pasanaku.example/api/v1/token/5/image"
        );
    }

    #[tokio::test]
    async fn image__existing_game__returns_png() {
        // given
        let api = api(contract(), None);
        let url = format!("{}/api/v1/token/5/image", api.base_url());

        // when
        let response = reqwest::get(url).await.unwrap();

        // then
        assert_eq!(response.status(), 200);
        assert_eq!(response.headers()["content-type"], "image/png");
        assert!(response.headers().contains_key("cache-control"));
        let body = response.bytes().await.unwrap();
        assert_eq!(&body[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[tokio::test]
    async fn empty_game__is_not_found_on_both_routes() {
        // given
        let api = api(contract(), None);

        // when
        let metadata = reqwest::get(format!("{}/api/v1/token/0", api.base_url()))
            .await
            .unwrap();
        let image = reqwest::get(format!("{}/api/v1/token/0/image", api.base_url()))
            .await
            .unwrap();

        // then
        assert_eq!(metadata.status(), 404);
        let body: ErrorDto = metadata.json().await.unwrap();
        assert_eq!(body.error, "Game not found");
        assert_eq!(image.status(), 404);
        assert_eq!(image.text().await.unwrap(), "Game not found");
    }

    #[tokio::test]
    async fn malformed_id__is_rejected_without_contract_reads() {
        // given
        let contract = contract();
        let api = api(contract.clone(), None);

        for raw in ["-1", "abc", ""] {
            // when
            let metadata = reqwest::get(format!("{}/api/v1/token/{raw}", api.base_url()))
                .await
                .unwrap();
            let image = reqwest::get(format!("{}/api/v1/token/{raw}/image", api.base_url()))
                .await
                .unwrap();

            // then
            assert_eq!(metadata.status(), 400, "metadata for {raw:?}");
            let body: ErrorDto = metadata.json().await.unwrap();
            assert_eq!(body.error, "Invalid or missing token id");
            assert_eq!(image.status(), 400, "image for {raw:?}");
            assert_eq!(image.text().await.unwrap(), "Invalid or missing id");
        }
        assert_eq!(contract.read_count(), 0);
    }

    #[tokio::test]
    async fn upstream_failure__returns_generic_message() {
        // given
        let api = api(contract().with_failing_game(9), None);

        // when
        let metadata = reqwest::get(format!("{}/api/v1/token/9", api.base_url()))
            .await
            .unwrap();
        let image = reqwest::get(format!("{}/api/v1/token/9/image", api.base_url()))
            .await
            .unwrap();

        // then
        assert_eq!(metadata.status(), 500);
        let body = metadata.text().await.unwrap();
        assert_eq!(body, r#"{"error":"Failed to load metadata"}"#);
        assert_eq!(image.status(), 500);
        assert_eq!(image.text().await.unwrap(), "Failed to generate the image");
    }

    #[tokio::test]
    async fn metadata__cross_origin_get__is_allowed() {
        let api = api(contract(), None);
        let response = reqwest::Client::new()
            .get(format!("{}/api/v1/token/5", api.base_url()))
            .header("Origin", "https://marketplace.example")
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        assert!(
            response
                .headers()
                .contains_key("access-control-allow-origin")
        );
    }
}
