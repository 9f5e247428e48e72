//! Shipping rendered documents: inline bytes or a stored object behind a
//! signed, time-limited link.

use crate::error::DeliveryError;
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use slidegen_pptx::{RenderedDocument, PPTX_EXTENSION, PPTX_MIME_TYPE};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

type HmacSha256 = Hmac<Sha256>;

/// Shortest link lifetime accepted.
pub const MIN_LINK_TTL: Duration = Duration::from_secs(60);

/// Longest link lifetime accepted.
pub const MAX_LINK_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Fresh keys tried before a stored delivery gives up on collisions.
pub const MAX_KEY_ATTEMPTS: usize = 3;

/// Name for a new stored document: `presentation_<8 hex>.pptx`.
pub fn generate_key() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("presentation_{}.{}", &id[..8], PPTX_EXTENSION)
}

/// A retrieval link and the instant it stops working.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedUrl {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

/// Durable storage for rendered documents.
#[cfg_attr(any(test, feature = "test-export-mocks"), mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under a new `key`. An existing object is never
    /// replaced; that case is [`DeliveryError::KeyExists`].
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), DeliveryError>;

    /// A link that retrieves `key` until `ttl` has passed.
    fn signed_url(&self, key: &str, ttl: Duration) -> Result<SignedUrl, DeliveryError>;
}

/// How a rendered document reaches the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// The bytes themselves.
    Inline {
        filename: String,
        content_type: String,
        bytes: Vec<u8>,
    },
    /// A stored object and its retrieval link.
    Stored {
        key: String,
        url: String,
        expires_at: DateTime<Utc>,
    },
}

impl Delivery {
    /// File name the caller should save the document as.
    pub fn filename(&self) -> &str {
        match self {
            Delivery::Inline { filename, .. } => filename,
            Delivery::Stored { key, .. } => key,
        }
    }

    /// Retrieval link, when stored.
    pub fn url(&self) -> Option<&str> {
        match self {
            Delivery::Inline { .. } => None,
            Delivery::Stored { url, .. } => Some(url),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    Inline,
    Stored,
}

/// Deployment policy for delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryPolicy {
    pub mode: DeliveryMode,
    link_ttl: Duration,
}

impl Default for DeliveryPolicy {
    fn default() -> Self {
        Self::inline()
    }
}

impl DeliveryPolicy {
    pub fn inline() -> Self {
        Self {
            mode: DeliveryMode::Inline,
            link_ttl: Duration::from_secs(crate::config::DEFAULT_LINK_TTL_SECS),
        }
    }

    /// Store documents and hand out links valid for `link_ttl`, clamped to
    /// [`MIN_LINK_TTL`]..=[`MAX_LINK_TTL`].
    pub fn stored(link_ttl: Duration) -> Self {
        Self {
            mode: DeliveryMode::Stored,
            link_ttl: link_ttl.clamp(MIN_LINK_TTL, MAX_LINK_TTL),
        }
    }

    pub fn link_ttl(&self) -> Duration {
        self.link_ttl
    }
}

/// Ship `document` according to `policy`.
pub async fn deliver(
    document: RenderedDocument,
    policy: &DeliveryPolicy,
    store: Option<&dyn ObjectStore>,
) -> Result<Delivery, DeliveryError> {
    match policy.mode {
        DeliveryMode::Inline => Ok(Delivery::Inline {
            filename: generate_key(),
            content_type: PPTX_MIME_TYPE.to_string(),
            bytes: document.into_bytes(),
        }),
        DeliveryMode::Stored => {
            let store = store.ok_or(DeliveryError::NoStore)?;
            let key = put_new(store, document.bytes()).await?;
            let signed = store.signed_url(&key, policy.link_ttl())?;
            log::info!("Stored {} ({} bytes), link expires {}", key, document.size(), signed.expires_at);
            Ok(Delivery::Stored {
                key,
                url: signed.url,
                expires_at: signed.expires_at,
            })
        }
    }
}

/// Store `bytes` under a freshly generated key, retrying on collisions.
async fn put_new(store: &dyn ObjectStore, bytes: &[u8]) -> Result<String, DeliveryError> {
    let mut attempt = 1;
    loop {
        let key = generate_key();
        match store.put(&key, bytes).await {
            Ok(()) => return Ok(key),
            Err(DeliveryError::KeyExists(_)) if attempt < MAX_KEY_ATTEMPTS => {
                log::warn!("Key {} already taken, retrying", key);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Object store on the local filesystem, served under a public base URL.
///
/// Links carry `expires` (unix seconds) and a hex HMAC-SHA256 of
/// `key\nexpires`; whoever serves the directory checks them with
/// [`FsObjectStore::verify`].
pub struct FsObjectStore {
    root: PathBuf,
    public_base: String,
    signing_key: Vec<u8>,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>, public_base: impl Into<String>, signing_key: impl AsRef<[u8]>) -> Self {
        Self {
            root: root.into(),
            public_base: public_base.into().trim_end_matches('/').to_string(),
            signing_key: signing_key.as_ref().to_vec(),
        }
    }

    /// Path an object is stored at.
    pub fn object_path(&self, key: &str) -> Result<PathBuf, DeliveryError> {
        check_key(key)?;
        Ok(self.root.join(key))
    }

    /// Sign a link as of `now`.
    pub fn signed_url_at(&self, key: &str, ttl: Duration, now: DateTime<Utc>) -> Result<SignedUrl, DeliveryError> {
        check_key(key)?;
        let ttl = ChronoDuration::from_std(ttl).map_err(|e| DeliveryError::Signing(e.to_string()))?;
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| DeliveryError::Signing("link expiry out of range".to_string()))?;
        let expires = expires_at.timestamp();
        let signature = hex::encode(self.mac(key, expires)?.finalize().into_bytes());

        Ok(SignedUrl {
            url: format!(
                "{}/{}?expires={}&signature={}",
                self.public_base, key, expires, signature
            ),
            expires_at,
        })
    }

    /// Check a link's signature and that it has not expired at `now`.
    pub fn verify(&self, key: &str, expires: i64, signature: &str, now: DateTime<Utc>) -> bool {
        if now.timestamp() > expires {
            return false;
        }
        let Ok(expected) = hex::decode(signature) else {
            return false;
        };
        match self.mac(key, expires) {
            Ok(mac) => mac.verify_slice(&expected).is_ok(),
            Err(_) => false,
        }
    }

    fn mac(&self, key: &str, expires: i64) -> Result<HmacSha256, DeliveryError> {
        let mut mac = HmacSha256::new_from_slice(&self.signing_key)
            .map_err(|e| DeliveryError::Signing(e.to_string()))?;
        mac.update(key.as_bytes());
        mac.update(b"\n");
        mac.update(expires.to_string().as_bytes());
        Ok(mac)
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), DeliveryError> {
        let path = self.object_path(key)?;
        tokio::fs::create_dir_all(&self.root).await?;
        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(DeliveryError::KeyExists(key.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(bytes).await?;
        file.flush().await?;
        log::debug!("Wrote {}", path.display());
        Ok(())
    }

    fn signed_url(&self, key: &str, ttl: Duration) -> Result<SignedUrl, DeliveryError> {
        self.signed_url_at(key, ttl, Utc::now())
    }
}

/// Keys are plain file names.
fn check_key(key: &str) -> Result<(), DeliveryError> {
    if key.is_empty() || key == "." || key == ".." || key.contains(['/', '\\']) {
        return Err(DeliveryError::InvalidKey(key.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::path::Path;
    use slidegen_core::{Outline, Slide};
    use slidegen_pptx::PptxRenderer;

    fn document() -> RenderedDocument {
        let outline = Outline {
            slides: vec![Slide::new("Deck", ["Overview"])],
        };
        PptxRenderer::new().render(&outline).unwrap()
    }

    fn store(dir: &Path) -> FsObjectStore {
        FsObjectStore::new(dir, "https://files.example.com/decks/", "secret")
    }

    #[test]
    fn test_generate_key_shape() {
        let key = generate_key();
        assert!(key.starts_with("presentation_"));
        assert!(key.ends_with(".pptx"));
        let hex_part = &key["presentation_".len()..key.len() - ".pptx".len()];
        assert_eq!(hex_part.len(), 8);
        assert!(hex_part.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(generate_key(), key);
    }

    #[test]
    fn test_policy_clamps_ttl() {
        assert_eq!(DeliveryPolicy::stored(Duration::from_secs(1)).link_ttl(), MIN_LINK_TTL);
        assert_eq!(
            DeliveryPolicy::stored(Duration::from_secs(30 * 24 * 3600)).link_ttl(),
            MAX_LINK_TTL
        );
        assert_eq!(
            DeliveryPolicy::stored(Duration::from_secs(86_400)).link_ttl(),
            Duration::from_secs(86_400)
        );
    }

    #[tokio::test]
    async fn test_inline_delivery() {
        let document = document();
        let bytes = document.bytes().to_vec();
        let delivery = deliver(document, &DeliveryPolicy::inline(), None).await.unwrap();

        match delivery {
            Delivery::Inline {
                filename,
                content_type,
                bytes: delivered,
            } => {
                assert!(filename.starts_with("presentation_"));
                assert_eq!(content_type, PPTX_MIME_TYPE);
                assert_eq!(delivered, bytes);
            }
            other => panic!("expected inline delivery, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stored_delivery_without_store() {
        let err = deliver(document(), &DeliveryPolicy::stored(MIN_LINK_TTL), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::NoStore));
    }

    #[tokio::test]
    async fn test_stored_delivery_uses_store() {
        let mut store = MockObjectStore::new();
        store.expect_put().times(1).returning(|_, _| Ok(()));
        store.expect_signed_url().times(1).returning(|key, ttl| {
            assert_eq!(ttl, Duration::from_secs(3600));
            Ok(SignedUrl {
                url: format!("https://files.example.com/{}", key),
                expires_at: Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
            })
        });

        let delivery = deliver(
            document(),
            &DeliveryPolicy::stored(Duration::from_secs(3600)),
            Some(&store as &dyn ObjectStore),
        )
        .await
        .unwrap();

        assert!(delivery.url().unwrap().ends_with(delivery.filename()));
    }

    #[tokio::test]
    async fn test_store_failure_is_a_delivery_error() {
        let mut store = MockObjectStore::new();
        store
            .expect_put()
            .returning(|_, _| Err(DeliveryError::Io(std::io::Error::other("disk full"))));
        store.expect_signed_url().never();

        let err = deliver(document(), &DeliveryPolicy::stored(MIN_LINK_TTL), Some(&store as &dyn ObjectStore))
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::Io(_)));
    }

    #[tokio::test]
    async fn test_fs_store_writes_object() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir.path().join("nested"));
        store.put("presentation_abcd1234.pptx", b"PK").await.unwrap();

        let written = std::fs::read(dir.path().join("nested/presentation_abcd1234.pptx")).unwrap();
        assert_eq!(written, b"PK");
    }

    #[tokio::test]
    async fn test_fs_store_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        store.put("presentation_aaaaaaaa.pptx", b"ALICE").await.unwrap();

        let err = store.put("presentation_aaaaaaaa.pptx", b"BOB").await.unwrap_err();
        assert!(matches!(err, DeliveryError::KeyExists(ref key) if key == "presentation_aaaaaaaa.pptx"));
        let kept = std::fs::read(dir.path().join("presentation_aaaaaaaa.pptx")).unwrap();
        assert_eq!(kept, b"ALICE");
    }

    #[tokio::test]
    async fn test_stored_delivery_retries_taken_key() {
        let mut store = MockObjectStore::new();
        let mut seq = mockall::Sequence::new();
        store
            .expect_put()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|key, _| Err(DeliveryError::KeyExists(key.to_string())));
        store
            .expect_put()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        store.expect_signed_url().times(1).returning(|key, _| {
            Ok(SignedUrl {
                url: format!("https://files.example.com/{}", key),
                expires_at: Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
            })
        });

        let delivery = deliver(
            document(),
            &DeliveryPolicy::stored(MIN_LINK_TTL),
            Some(&store as &dyn ObjectStore),
        )
        .await
        .unwrap();
        assert!(delivery.filename().starts_with("presentation_"));
    }

    #[tokio::test]
    async fn test_stored_delivery_gives_up_after_repeated_collisions() {
        let mut store = MockObjectStore::new();
        store
            .expect_put()
            .times(MAX_KEY_ATTEMPTS)
            .returning(|key, _| Err(DeliveryError::KeyExists(key.to_string())));
        store.expect_signed_url().never();

        let err = deliver(
            document(),
            &DeliveryPolicy::stored(MIN_LINK_TTL),
            Some(&store as &dyn ObjectStore),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DeliveryError::KeyExists(_)));
    }

    #[test]
    fn test_signing_rejects_out_of_range_expiry() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let err = store
            .signed_url("presentation_abcd1234.pptx", Duration::from_secs(u64::MAX / 4))
            .unwrap_err();
        assert!(matches!(err, DeliveryError::Signing(_)));

        let now = Utc.with_ymd_and_hms(2025, 10, 3, 12, 0, 0).unwrap();
        let err = store
            .signed_url_at("presentation_abcd1234.pptx", Duration::from_secs(400_000 * 365 * 86_400), now)
            .unwrap_err();
        assert!(matches!(err, DeliveryError::Signing(_)));
    }

    #[tokio::test]
    async fn test_fs_store_rejects_path_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        for key in ["", "..", "../escape.pptx", "a/b.pptx", "a\\b.pptx"] {
            let err = store.put(key, b"PK").await.unwrap_err();
            assert!(matches!(err, DeliveryError::InvalidKey(_)), "key {:?}", key);
        }
    }

    #[test]
    fn test_signed_url_verifies_until_expiry() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let now = Utc.with_ymd_and_hms(2025, 10, 3, 12, 0, 0).unwrap();
        let signed = store
            .signed_url_at("presentation_abcd1234.pptx", Duration::from_secs(86_400), now)
            .unwrap();

        let expires = signed.expires_at.timestamp();
        assert_eq!(expires, now.timestamp() + 86_400);
        assert!(signed
            .url
            .starts_with("https://files.example.com/decks/presentation_abcd1234.pptx?expires="));

        let signature = signed.url.split("signature=").nth(1).unwrap();
        assert_eq!(signature.len(), 64);
        assert!(store.verify("presentation_abcd1234.pptx", expires, signature, now));
        assert!(store.verify("presentation_abcd1234.pptx", expires, signature, signed.expires_at));

        let later = signed.expires_at + ChronoDuration::seconds(1);
        assert!(!store.verify("presentation_abcd1234.pptx", expires, signature, later));
        assert!(!store.verify("presentation_other.pptx", expires, signature, now));
        assert!(!store.verify("presentation_abcd1234.pptx", expires + 10, signature, now));
        assert!(!store.verify("presentation_abcd1234.pptx", expires, "zz", now));
    }

    #[test]
    fn test_different_keys_sign_differently() {
        let dir = tempfile::tempdir().unwrap();
        let now = Utc.with_ymd_and_hms(2025, 10, 3, 12, 0, 0).unwrap();
        let a = FsObjectStore::new(dir.path(), "https://x", "one")
            .signed_url_at("k.pptx", MIN_LINK_TTL, now)
            .unwrap();
        let b = FsObjectStore::new(dir.path(), "https://x", "two")
            .signed_url_at("k.pptx", MIN_LINK_TTL, now)
            .unwrap();
        assert_ne!(a.url, b.url);
    }
}
