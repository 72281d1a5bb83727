// ============================================================
// Layer 6 - Cloud Storage IAM Client
// ============================================================
// Minimal blocking client for the two Cloud Storage JSON API
// calls the bucket helper needs:
//
//   GET  {base}/storage/v1/b/{bucket}/iam?optionsRequestedPolicyVersion=3
//   PUT  {base}/storage/v1/b/{bucket}/iam        body: IamPolicy
//
// Credentials, in order:
//   1. GOOGLE_OAUTH_ACCESS_TOKEN (e.g. `gcloud auth print-access-token`)
//   2. the GCE metadata server's default service account
//
// STORAGE_EMULATOR_HOST replaces the base URL; emulators accept
// requests without a token. The bucket name is percent-encoded as
// a single path segment.

use std::env;

use anyhow::{anyhow, Context, Result};
use reqwest::{
    blocking::Client,
    header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT},
    Url,
};
use serde::Deserialize;

use crate::domain::{iam::IamPolicy, traits::IamPolicyStore};

pub const DEFAULT_BASE_URL: &str = "https://storage.googleapis.com";

const TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";
const EMULATOR_ENV: &str = "STORAGE_EMULATOR_HOST";
const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

#[derive(Deserialize)]
struct MetadataToken {
    access_token: String,
}

pub struct StorageClient {
    client:   Client,
    base_url: Url,
}

impl StorageClient {
    /// Client for `base_url`, authenticating with `token` when given.
    pub fn new(base_url: &str, token: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("cnn-mnist-public-bucket"));
        if let Some(token) = token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {token}"))
                    .context("Access token is not a valid header value")?,
            );
        }

        // Emulator hosts are often given as bare host:port
        let with_scheme = if base_url.contains("://") {
            base_url.to_string()
        } else {
            format!("http://{base_url}")
        };
        let base_url = Url::parse(&with_scheme)
            .with_context(|| format!("Invalid storage endpoint '{base_url}'"))?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("Invalid storage endpoint '{base_url}'"));
        }

        Ok(Self {
            client: Client::builder().default_headers(headers).build()?,
            base_url,
        })
    }

    /// Resolve endpoint and credentials from the environment.
    pub fn from_env() -> Result<Self> {
        if let Ok(host) = env::var(EMULATOR_ENV) {
            tracing::info!("Using storage emulator at {}", host);
            let token = env::var(TOKEN_ENV).ok();
            return Self::new(&host, token.as_deref());
        }

        let token = match env::var(TOKEN_ENV) {
            Ok(token) => token,
            Err(_) => {
                tracing::debug!("{} not set, asking the metadata server", TOKEN_ENV);
                metadata_token()?
            }
        };
        Self::new(DEFAULT_BASE_URL, Some(&token))
    }

    fn iam_url(&self, bucket: &str) -> Url {
        let mut url = self.base_url.clone();
        // Checked in new(): the base URL can carry path segments
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["storage", "v1", "b", bucket, "iam"]);
        }
        url
    }
}

impl IamPolicyStore for StorageClient {
    fn get_iam_policy(&self, bucket: &str, requested_policy_version: u32) -> Result<IamPolicy> {
        let url = self.iam_url(bucket);
        let policy = self
            .client
            .get(url.clone())
            .query(&[("optionsRequestedPolicyVersion", requested_policy_version)])
            .send()
            .with_context(|| format!("Cannot reach '{url}'"))?
            .error_for_status()
            .with_context(|| format!("Cannot read IAM policy of bucket '{bucket}'"))?
            .json()
            .context("Malformed IAM policy response")?;
        Ok(policy)
    }

    fn set_iam_policy(&self, bucket: &str, policy: &IamPolicy) -> Result<IamPolicy> {
        let url = self.iam_url(bucket);
        let stored = self
            .client
            .put(url.clone())
            .json(policy)
            .send()
            .with_context(|| format!("Cannot reach '{url}'"))?
            .error_for_status()
            .with_context(|| format!("Cannot write IAM policy of bucket '{bucket}'"))?
            .json()
            .context("Malformed IAM policy response")?;
        Ok(stored)
    }
}

fn metadata_token() -> Result<String> {
    let token: MetadataToken = Client::new()
        .get(METADATA_TOKEN_URL)
        .header("Metadata-Flavor", "Google")
        .send()
        .context("No access token: set GOOGLE_OAUTH_ACCESS_TOKEN or run on GCE")?
        .error_for_status()?
        .json()?;
    Ok(token.access_token)
}
