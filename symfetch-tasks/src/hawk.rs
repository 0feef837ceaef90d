//! Hawk request signing for the task queue.
//!
//! Only the header scheme without payload hashing is implemented, which is
//! what the queue requires. Temporary credentials carry a certificate that
//! travels in the `ext` field as base64-encoded JSON.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::Sha256;
use url::Url;
use uuid::Uuid;

use symfetch_http::Method;

use crate::error::{io_err, TaskError};

type HmacSha256 = Hmac<Sha256>;

/// Client credentials as stored in `taskcluster-auth.json`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub client_id: String,
    pub access_token: String,
    /// Either the certificate object or its JSON-encoded string.
    #[serde(default)]
    pub certificate: Option<Value>,
}

impl Credentials {
    pub fn load(path: &Path) -> Result<Self, TaskError> {
        let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        let creds: Self = serde_json::from_str(&contents).map_err(|source| TaskError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        if creds.client_id.is_empty() || creds.access_token.is_empty() {
            return Err(TaskError::Credentials {
                path: path.to_path_buf(),
                reason: "clientId and accessToken must be non-empty".into(),
            });
        }
        Ok(creds)
    }

    /// The `ext` value: empty for permanent credentials.
    fn ext(&self) -> Result<String, TaskError> {
        let certificate = match &self.certificate {
            None | Some(Value::Null) => return Ok(String::new()),
            Some(Value::String(s)) => {
                serde_json::from_str(s).map_err(|e| TaskError::Signing(e.to_string()))?
            }
            Some(other) => other.clone(),
        };
        let ext = json!({ "certificate": certificate }).to_string();
        Ok(STANDARD.encode(ext))
    }
}

/// The pieces of a URL that enter the MAC.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Target {
    host: String,
    port: u16,
    resource: String,
}

fn split_url(raw: &str) -> Result<Target, TaskError> {
    let url = Url::parse(raw).map_err(|e| TaskError::Signing(format!("bad URL {raw}: {e}")))?;
    let host = url
        .host_str()
        .ok_or_else(|| TaskError::Signing(format!("no host in {raw}")))?
        .to_string();
    let port = url
        .port_or_known_default()
        .ok_or_else(|| TaskError::Signing(format!("unsupported scheme {}", url.scheme())))?;
    let resource = match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_string(),
    };
    Ok(Target {
        host,
        port,
        resource,
    })
}

fn normalized_string(
    ts: i64,
    nonce: &str,
    method: Method,
    target: &Target,
    ext: &str,
) -> String {
    format!(
        "hawk.1.header\n{ts}\n{nonce}\n{}\n{}\n{}\n{}\n\n{ext}\n",
        method.as_str(),
        target.resource,
        target.host.to_lowercase(),
        target.port,
    )
}

/// `Authorization` header value for `method url` at unix time `ts`.
pub fn authorization(
    creds: &Credentials,
    method: Method,
    url: &str,
    ts: i64,
    nonce: &str,
) -> Result<String, TaskError> {
    let target = split_url(url)?;
    let ext = creds.ext()?;
    let normalized = normalized_string(ts, nonce, method, &target, &ext);

    let mut mac = HmacSha256::new_from_slice(creds.access_token.as_bytes())
        .map_err(|e| TaskError::Signing(e.to_string()))?;
    mac.update(normalized.as_bytes());
    let digest = STANDARD.encode(mac.finalize().into_bytes());

    let mut header = format!(
        "Hawk id=\"{}\", ts=\"{ts}\", nonce=\"{nonce}\"",
        creds.client_id
    );
    if !ext.is_empty() {
        header.push_str(&format!(", ext=\"{ext}\""));
    }
    header.push_str(&format!(", mac=\"{digest}\""));
    Ok(header)
}

/// A short random nonce.
pub fn nonce() -> String {
    Uuid::new_v4().simple().to_string().chars().take(8).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    fn creds() -> Credentials {
        Credentials {
            client_id: "dh37fgj492je".into(),
            access_token: "werxhqb98rpaxn39848xrunpaw3489ruxnpa98w4rxn".into(),
            certificate: None,
        }
    }

    #[rstest]
    #[case("https://queue.test/v1/task/abc", "queue.test", 443, "/v1/task/abc")]
    #[case("http://taskcluster/queue/v1/task/x?a=1", "taskcluster", 80, "/queue/v1/task/x?a=1")]
    #[case("http://example.com:8000", "example.com", 8000, "/")]
    #[case("http://[::1]/queue/v1/task/x", "[::1]", 80, "/queue/v1/task/x")]
    #[case("https://user@queue.test/v1/task/x", "queue.test", 443, "/v1/task/x")]
    #[case("HTTPS://Queue.Test/v1/task/x", "queue.test", 443, "/v1/task/x")]
    fn url_parts(
        #[case] url: &str,
        #[case] host: &str,
        #[case] port: u16,
        #[case] resource: &str,
    ) {
        let target = split_url(url).unwrap();
        assert_eq!(target.host, host);
        assert_eq!(target.port, port);
        assert_eq!(target.resource, resource);
    }

    #[rstest]
    #[case("/v1/task")]
    #[case("mailto:queue@example.com")]
    #[case("ftp2://queue.test/v1")]
    fn rejects_unsignable_url(#[case] url: &str) {
        assert!(matches!(split_url(url), Err(TaskError::Signing(_))));
    }

    #[test]
    fn normalized_string_layout() {
        let target = split_url("http://example.com:8000/resource/1?b=1&a=2").unwrap();
        let s = normalized_string(1353832234, "j4h3g2", Method::Get, &target, "some-app-ext-data");
        assert_eq!(
            s,
            "hawk.1.header\n1353832234\nj4h3g2\nGET\n/resource/1?b=1&a=2\nexample.com\n8000\n\nsome-app-ext-data\n"
        );
    }

    #[test]
    fn matches_reference_mac() {
        // Published Hawk example: GET http://example.com:8000/resource/1?b=1&a=2
        // with ext "some-app-ext-data" (no payload hash).
        let target = split_url("http://example.com:8000/resource/1?b=1&a=2").unwrap();
        let normalized =
            normalized_string(1353832234, "j4h3g2", Method::Get, &target, "some-app-ext-data");
        let mut mac = HmacSha256::new_from_slice(creds().access_token.as_bytes()).unwrap();
        mac.update(normalized.as_bytes());
        let digest = STANDARD.encode(mac.finalize().into_bytes());
        assert_eq!(digest, "6R4rV5iE+NPoym+WwjeHzjAGXUtLNIxmo1vpMofpLAE=");
    }

    #[test]
    fn header_without_certificate() {
        let header = authorization(
            &creds(),
            Method::Put,
            "https://queue.test/v1/task/abc",
            1353832234,
            "j4h3g2",
        )
        .unwrap();
        assert!(header.starts_with("Hawk id=\"dh37fgj492je\", ts=\"1353832234\", nonce=\"j4h3g2\", mac=\""));
        assert!(!header.contains("ext="));
    }

    #[test]
    fn certificate_goes_into_ext() {
        let mut creds = creds();
        creds.certificate = Some(Value::String(r#"{"version":1,"seed":"s"}"#.into()));
        let header =
            authorization(&creds, Method::Put, "https://queue.test/v1/task/abc", 1, "n").unwrap();

        let ext = header
            .split("ext=\"")
            .nth(1)
            .and_then(|rest| rest.split('"').next())
            .unwrap();
        let decoded: Value = serde_json::from_slice(&STANDARD.decode(ext).unwrap()).unwrap();
        assert_eq!(decoded, json!({ "certificate": { "version": 1, "seed": "s" } }));
    }

    #[test]
    fn load_requires_both_fields() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("taskcluster-auth.json");
        std::fs::write(&path, r#"{"clientId": "me", "accessToken": ""}"#).unwrap();
        assert!(matches!(
            Credentials::load(&path).unwrap_err(),
            TaskError::Credentials { .. }
        ));

        std::fs::write(&path, r#"{"clientId": "me", "accessToken": "tok"}"#).unwrap();
        let creds = Credentials::load(&path).unwrap();
        assert_eq!(creds.client_id, "me");
        assert!(creds.certificate.is_none());
    }

    #[test]
    fn nonce_is_short_and_random() {
        let a = nonce();
        assert_eq!(a.len(), 8);
        assert_ne!(a, nonce());
    }
}
