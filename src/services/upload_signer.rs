use chrono::Utc;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use uuid::Uuid;

use crate::config::Config;
use crate::models::internal::UploadAuthParams;

type HmacSha1 = Hmac<Sha1>;

/// Default lifetime of upload credentials, in seconds.
pub const DEFAULT_EXPIRE_SECS: i64 = 30 * 60;

/// Issues short-lived signed parameters for direct browser uploads to the
/// image CDN.
pub struct UploadSigner {
    private_key: String,
    public_key: Option<String>,
    url_endpoint: Option<String>,
    expire_secs: i64,
}

impl UploadSigner {
    pub fn new(private_key: impl Into<String>) -> Self {
        Self {
            private_key: private_key.into(),
            public_key: None,
            url_endpoint: None,
            expire_secs: DEFAULT_EXPIRE_SECS,
        }
    }

    /// Client-side settings handed back alongside each signature.
    pub fn with_client_settings(
        mut self,
        public_key: Option<String>,
        url_endpoint: Option<String>,
    ) -> Self {
        self.public_key = public_key;
        self.url_endpoint = url_endpoint;
        self
    }

    pub fn from_config(config: &Config) -> Option<Self> {
        if !config.uploads_enabled() {
            return None;
        }
        let private_key = config.imagekit_private_key.as_deref()?;
        Some(Self::new(private_key).with_client_settings(
            config.imagekit_public_key.clone(),
            config.imagekit_url_endpoint.clone(),
        ))
    }

    pub fn authentication_parameters(&self) -> UploadAuthParams {
        let token = Uuid::new_v4().to_string();
        let expire = Utc::now().timestamp() + self.expire_secs;
        let signature = self.sign(&token, expire);
        UploadAuthParams {
            token,
            expire,
            signature,
            public_key: self.public_key.clone(),
            url_endpoint: self.url_endpoint.clone(),
        }
    }

    /// Lowercase hex HMAC-SHA1 of `token` followed by `expire`.
    pub fn sign(&self, token: &str, expire: i64) -> String {
        let mut mac = HmacSha1::new_from_slice(self.private_key.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(token.as_bytes());
        mac.update(expire.to_string().as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}
