use pasanaku_view::{
    GameSummary,
    LookupError,
    ViewContext,
    presentation::{
        image::ImageRenderer,
        metadata::TokenMetadata,
    },
    reads::{
        ContractReader,
        TokenReader,
    },
};
use tracing_subscriber::EnvFilter;

pub mod actix_token_api;

/// Everything the token routes need, built once in `main`.
pub struct TokenService<R> {
    views: ViewContext<R>,
    renderer: ImageRenderer,
    public_url: Option<String>,
}

impl<R> TokenService<R> {
    pub fn new(views: ViewContext<R>, renderer: ImageRenderer) -> Self {
        Self {
            views,
            renderer,
            public_url: None,
        }
    }

    /// Origin used in the `image` link instead of the one the request came in on.
    pub fn with_public_url(mut self, public_url: Option<String>) -> Self {
        self.public_url =
            public_url.map(|url| url.trim_end_matches('/').to_string());
        self
    }

    pub fn views(&self) -> &ViewContext<R> {
        &self.views
    }

    pub fn renderer(&self) -> &ImageRenderer {
        &self.renderer
    }

    pub fn origin<'a>(&'a self, request_origin: &'a str) -> &'a str {
        self.public_url.as_deref().unwrap_or(request_origin)
    }
}

impl<R: ContractReader + TokenReader> TokenService<R> {
    pub async fn summary(&self, raw_id: &str) -> Result<GameSummary, LookupError> {
        self.views.load_summary(raw_id).await
    }

    pub async fn metadata(
        &self,
        raw_id: &str,
        request_origin: &str,
    ) -> Result<TokenMetadata, LookupError> {
        let summary = self.summary(raw_id).await?;
        Ok(TokenMetadata::from_summary(
            &summary,
            self.origin(request_origin),
        ))
    }
}

pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
