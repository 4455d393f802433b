//! Cookie based authentication from an exported Netscape `cookies.txt` file.
//!
//! The interactive bank login runs in a browser; once the browser holds a
//! valid session its cookies are exported to a file and this module turns
//! them into an authenticated HTTP client.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info, warn};
use reqwest::cookie::Jar;
use url::Url;

use crate::errors::{Error, Result};
use crate::session::{AuthenticatedClient, Authenticator, SessionConfig};

const OPEN_FAILED: &str = "Could not open cookies file, either file does not exist or no read access.";
const LOAD_FAILED: &str = "Could not properly load cookie text file.";

/// Marker curl and browsers put in front of HttpOnly cookie lines.
const HTTP_ONLY_PREFIX: &str = "#HttpOnly_";

/// Models a cookie.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cookie {
    pub domain: String,
    /// Whether the cookie applies to subdomains as well.
    pub include_subdomains: bool,
    pub path: String,
    pub secure: bool,
    /// Expiry as epoch seconds, `0` for session cookies.
    pub expiry: i64,
    pub name: String,
    pub value: String,
    pub http_only: bool,
}

impl Cookie {
    /// Parses one line of a cookie file, `None` for comments and malformed lines.
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.trim();
        let (line, http_only) = match line.strip_prefix(HTTP_ONLY_PREFIX) {
            Some(rest) => (rest, true),
            None => (line, false),
        };
        if line.is_empty() || line.starts_with('#') {
            return None;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        let [domain, flag, path, secure, expiry, name, value] = fields.as_slice() else {
            debug!("[Cookies] Skipping line with {} fields", fields.len());
            return None;
        };
        // The jar takes `Set-Cookie` text, where these would end the pair early.
        if name.contains(['=', ';']) || value.contains(';') {
            warn!("[Cookies] Skipping cookie {} with a separator in it", name);
            return None;
        }

        Some(Self {
            domain: domain.to_string(),
            include_subdomains: flag.eq_ignore_ascii_case("TRUE"),
            path: path.to_string(),
            secure: secure.eq_ignore_ascii_case("TRUE"),
            expiry: expiry.parse().ok()?,
            name: name.to_string(),
            value: value.to_string(),
            http_only,
        })
    }

    /// Host the cookie belongs to, without the leading dot.
    pub fn host(&self) -> &str {
        self.domain.trim_start_matches('.')
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expiry > 0 && self.expiry < now
    }

    /// URL the cookie is registered against in the jar.
    pub fn origin(&self) -> Result<Url> {
        let scheme = if self.secure { "https" } else { "http" };
        Url::parse(&format!("{}://{}{}", scheme, self.host(), self.path))
            .map_err(|_| Error::InvalidCookies(format!("Invalid cookie domain {}", self.domain)))
    }

    /// The cookie rendered as a `Set-Cookie` header value.
    pub fn to_set_cookie(&self) -> String {
        let mut header = format!("{}={}; Path={}", self.name, self.value, self.path);
        if self.domain.starts_with('.') || self.include_subdomains {
            header.push_str(&format!("; Domain={}", self.host()));
        }
        if self.secure {
            header.push_str("; Secure");
        }
        if self.http_only {
            header.push_str("; HttpOnly");
        }
        header
    }
}

/// Parses the text of a cookie file.
pub fn parse_cookie_text(text: &str) -> Vec<Cookie> {
    text.lines().filter_map(Cookie::parse_line).collect()
}

/// Loads the cookies of a file, dropping the ones that already expired.
pub fn load_cookie_file(path: &Path) -> Result<Vec<Cookie>> {
    let bytes = std::fs::read(path).map_err(|e| {
        warn!("[Cookies] Failed to read {}: {}", path.display(), e);
        Error::InvalidCookies(OPEN_FAILED.to_string())
    })?;
    let text = String::from_utf8(bytes).map_err(|_| Error::InvalidCookies(LOAD_FAILED.to_string()))?;

    let now = Utc::now().timestamp();
    let cookies: Vec<Cookie> = parse_cookie_text(&text)
        .into_iter()
        .filter(|cookie| {
            let expired = cookie.is_expired_at(now);
            if expired {
                warn!("[Cookies] Skipping expired cookie {}", cookie.name);
            }
            !expired
        })
        .collect();

    if cookies.is_empty() {
        return Err(Error::InvalidCookies(LOAD_FAILED.to_string()));
    }
    debug!("[Cookies] Loaded {} cookies from {}", cookies.len(), path.display());
    Ok(cookies)
}

/// Builds a cookie jar holding `cookies`.
pub fn cookie_jar(cookies: &[Cookie]) -> Result<Arc<Jar>> {
    let jar = Jar::default();
    for cookie in cookies {
        jar.add_cookie_str(&cookie.to_set_cookie(), &cookie.origin()?);
    }
    Ok(Arc::new(jar))
}

/// Models the authenticator with a provided cookie file.
///
/// The file is read again on every authentication, so re-exporting the
/// cookies from the browser revives an expired session.
#[derive(Clone, Debug)]
pub struct CookieAuthenticator {
    cookie_file: PathBuf,
}

impl CookieAuthenticator {
    pub fn new(cookie_file: impl Into<PathBuf>) -> Self {
        Self {
            cookie_file: cookie_file.into(),
        }
    }

    pub fn cookie_file(&self) -> &Path {
        &self.cookie_file
    }
}

#[async_trait]
impl Authenticator for CookieAuthenticator {
    fn name(&self) -> &'static str {
        "AbnAmro"
    }

    async fn authenticate(&self, config: &SessionConfig) -> Result<AuthenticatedClient> {
        let cookies = load_cookie_file(&self.cookie_file)?;
        info!(
            "[Cookies] Transferring {} cookies to an http session",
            cookies.len()
        );
        let jar = cookie_jar(&cookies)?;
        let client = config
            .client_builder()
            .cookie_provider(jar)
            .build()
            .map_err(|e| Error::Config(format!("Failed to initialize HTTP client: {}", e)))?;
        Ok(AuthenticatedClient::new(client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::cookie::CookieStore;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const COOKIE_FILE: &str = "# Netscape HTTP Cookie File\n\
        # This is a generated file!  Do not edit.\n\
        \n\
        .abnamro.nl\tTRUE\t/\tTRUE\t0\tSMSession\tsession-token\n\
        #HttpOnly_www.abnamro.nl\tFALSE\t/\tTRUE\t0\tJSESSIONID\tabc123\n\
        www.abnamro.nl\tFALSE\t/\tTRUE\n\
        www.abnamro.nl\tFALSE\t/\tTRUE\t1\tstale\told\n";

    fn write_file(contents: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents).unwrap();
        file
    }

    #[test]
    fn test_parse_line_fields() {
        let cookie = Cookie::parse_line(".abnamro.nl\tTRUE\t/\tTRUE\t1893456000\tSMSession\ttoken").unwrap();
        assert_eq!(cookie.domain, ".abnamro.nl");
        assert!(cookie.include_subdomains);
        assert_eq!(cookie.path, "/");
        assert!(cookie.secure);
        assert_eq!(cookie.expiry, 1_893_456_000);
        assert_eq!(cookie.name, "SMSession");
        assert_eq!(cookie.value, "token");
        assert!(!cookie.http_only);
    }

    #[test]
    fn test_comments_and_short_lines_are_ignored() {
        let cookies = parse_cookie_text(COOKIE_FILE);
        let names: Vec<&str> = cookies.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["SMSession", "JSESSIONID", "stale"]);
        assert!(cookies[1].http_only);
    }

    #[test]
    fn test_load_skips_expired_cookies() {
        let file = write_file(COOKIE_FILE.as_bytes());
        let cookies = load_cookie_file(file.path()).unwrap();
        assert_eq!(cookies.len(), 2);
        assert!(cookies.iter().all(|c| c.name != "stale"));
    }

    #[test]
    fn test_missing_file() {
        let error = load_cookie_file(Path::new("/nonexistent/cookies.txt")).unwrap_err();
        match error {
            Error::InvalidCookies(message) => assert_eq!(message, OPEN_FAILED),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_file_without_cookies() {
        let file = write_file(b"# Netscape HTTP Cookie File\n\n");
        let error = load_cookie_file(file.path()).unwrap_err();
        match error {
            Error::InvalidCookies(message) => assert_eq!(message, LOAD_FAILED),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_binary_file() {
        let file = write_file(&[0xff, 0xfe, 0x00, 0x81]);
        assert!(matches!(load_cookie_file(file.path()), Err(Error::InvalidCookies(_))));
    }

    #[test]
    fn test_jar_sends_cookies_to_matching_host() {
        let cookies = parse_cookie_text(COOKIE_FILE);
        let jar = cookie_jar(&cookies[..2]).unwrap();

        let url = Url::parse("https://www.abnamro.nl/contracts").unwrap();
        let header = jar.cookies(&url).unwrap();
        let header = header.to_str().unwrap();
        assert!(header.contains("SMSession=session-token"));
        assert!(header.contains("JSESSIONID=abc123"));

        let other = Url::parse("https://www.icscards.nl/").unwrap();
        assert!(jar.cookies(&other).is_none());
    }

    #[test]
    fn test_values_with_separators_are_rejected() {
        assert!(Cookie::parse_line("www.abnamro.nl\tFALSE\t/\tTRUE\t0\tSMSession\ttok;en").is_none());
        assert!(Cookie::parse_line("www.abnamro.nl\tFALSE\t/\tTRUE\t0\tSM=Session\ttoken").is_none());

        let cookie = Cookie::parse_line("www.abnamro.nl\tFALSE\t/\tTRUE\t0\tSMSession\ta=b").unwrap();
        let jar = cookie_jar(&[cookie]).unwrap();
        let url = Url::parse("https://www.abnamro.nl/").unwrap();
        assert_eq!(jar.cookies(&url).unwrap().to_str().unwrap(), "SMSession=a=b");
    }

    #[test]
    fn test_set_cookie_rendering() {
        let cookie = Cookie::parse_line("#HttpOnly_.abnamro.nl\tTRUE\t/nl\tTRUE\t0\ta\tb").unwrap();
        assert_eq!(
            cookie.to_set_cookie(),
            "a=b; Path=/nl; Domain=abnamro.nl; Secure; HttpOnly"
        );
    }
}
