use std::{collections::HashSet, num::NonZeroU32, time::Duration};

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use reqwest::{Client, Url, header};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use shared_utils::env::get_env_var;
use snafu::{ResultExt, ensure};
use tracing::debug;

use crate::{
    models::{
        date_range::DateRange,
        draw::{DrawId, DrawMap, DrawResult},
        statistics::OfficialStatistics,
    },
    providers::{
        ApiSnafu, ClientBuildSnafu, InvalidApiKeySnafu, InvalidBaseUrlSnafu, MissingEnvVarSnafu,
        ProviderError, ProviderInitError, ReqwestSnafu, ResultSource, UnexpectedDrawSnafu,
        ValidationSnafu,
        lottery_rest::{
            params::construct_range_params,
            response::{DrawPageResponse, DrawResponse, StatisticsResponse},
        },
    },
};

/// Placeholder endpoint; deployments point `base_url` at their operator's API.
pub const DEFAULT_BASE_URL: &str = "https://api.lottery.example/v1/";

const API_KEY_HEADER: &str = "x-api-key";

/// Connection settings for [`LotteryRestSource`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LotteryRestConfig {
    /// Root of the API. Endpoint paths are resolved relative to it.
    pub base_url: String,

    /// Name of the environment variable holding the API key, if the API needs one.
    pub api_key_env: Option<String>,

    /// Client-side request ceiling. `None` disables throttling.
    pub requests_per_second: Option<NonZeroU32>,

    /// Per-request timeout.
    pub timeout_secs: u64,
}

impl Default for LotteryRestConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key_env: None,
            requests_per_second: Some(nonzero!(5u32)),
            timeout_secs: 30,
        }
    }
}

pub struct LotteryRestSource {
    client: Client,
    base_url: Url,
    limiter: Option<DefaultDirectRateLimiter>,
    _api_key: Option<SecretString>,
}

impl LotteryRestSource {
    /// Creates a new source from its configuration.
    ///
    /// When `api_key_env` is set, the key is read from that environment variable
    /// and sent with every request.
    pub fn new(config: &LotteryRestConfig) -> Result<Self, ProviderInitError> {
        let base_url = parse_base_url(&config.base_url)?;

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let api_key = match &config.api_key_env {
            Some(var) => {
                let key = SecretString::new(get_env_var(var).context(MissingEnvVarSnafu)?.into());
                let mut value = header::HeaderValue::from_str(key.expose_secret())
                    .context(InvalidApiKeySnafu)?;
                value.set_sensitive(true);
                headers.insert(API_KEY_HEADER, value);
                Some(key)
            }
            None => None,
        };

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context(ClientBuildSnafu)?;

        let limiter = config
            .requests_per_second
            .map(|rps| RateLimiter::direct(Quota::per_second(rps)));

        Ok(Self {
            client,
            base_url,
            limiter,
            _api_key: api_key,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ProviderError> {
        self.base_url.join(path).map_err(|e| {
            ValidationSnafu {
                message: format!("cannot build URL for {path:?}: {e}"),
            }
            .build()
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(String, String)],
    ) -> Result<T, ProviderError> {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }

        debug!(%url, "GET");
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .context(ReqwestSnafu)?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown API error".to_string());
            return ApiSnafu {
                status: status.as_u16(),
                message,
            }
            .fail();
        }

        response.json::<T>().await.context(ReqwestSnafu)
    }
}

/// Endpoint paths are joined onto the base, so it must end with `/`.
fn parse_base_url(raw: &str) -> Result<Url, ProviderInitError> {
    let mut normalized = raw.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }

    let url = Url::parse(&normalized).map_err(|e| {
        InvalidBaseUrlSnafu {
            base_url: raw,
            message: e.to_string(),
        }
        .build()
    })?;

    ensure!(
        matches!(url.scheme(), "http" | "https"),
        InvalidBaseUrlSnafu {
            base_url: raw,
            message: format!("unsupported scheme {:?}", url.scheme()),
        }
    );
    Ok(url)
}

/// Accepts the token for the next page, refusing one the API already handed out.
fn next_page(
    seen: &mut HashSet<String>,
    token: Option<String>,
) -> Result<Option<String>, ProviderError> {
    let Some(token) = token else {
        return Ok(None);
    };
    ensure!(
        seen.insert(token.clone()),
        ValidationSnafu {
            message: format!("page token {token:?} repeated; pagination would not end"),
        }
    );
    Ok(Some(token))
}

#[async_trait]
impl ResultSource for LotteryRestSource {
    async fn fetch_by_date_range(&self, range: DateRange) -> Result<DrawMap, ProviderError> {
        let url = self.endpoint("draws")?;

        let mut draws = DrawMap::new();
        let mut next_page_token: Option<String> = None;
        let mut seen_tokens = HashSet::new();

        loop {
            let query = construct_range_params(&range, next_page_token.as_deref());
            let page: DrawPageResponse = self.get_json(url.clone(), &query).await?;

            for draw in page.draws {
                let draw = DrawResult::from(draw);
                draws.insert(draw.game_id, draw);
            }

            // Follow the token until the API stops handing one out.
            next_page_token = next_page(&mut seen_tokens, page.next_page_token)?;
            if next_page_token.is_none() {
                break;
            }
        }

        Ok(draws)
    }

    async fn fetch_by_id(&self, id: DrawId) -> Result<DrawResult, ProviderError> {
        let url = self.endpoint(&format!("draws/{id}"))?;
        let draw: DrawResponse = self.get_json(url, &[]).await?;

        ensure!(
            draw.game_id == id,
            UnexpectedDrawSnafu {
                requested: id,
                returned: draw.game_id,
            }
        );
        Ok(draw.into())
    }

    async fn fetch_active_draw(&self) -> Result<DrawResult, ProviderError> {
        let url = self.endpoint("draws/active")?;
        let draw: DrawResponse = self.get_json(url, &[]).await?;
        Ok(draw.into())
    }

    async fn fetch_official_statistics(&self) -> Result<OfficialStatistics, ProviderError> {
        let url = self.endpoint("statistics")?;
        let stats: StatisticsResponse = self.get_json(url, &[]).await?;
        Ok(stats.into())
    }
}
