use actix_web::cookie::{time::Duration as CookieDuration, Cookie, CookieJar, Key, SameSite};
use sha2::{Digest, Sha512};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "sessionid";

/// Signs and verifies the `sessionid` cookie.
#[derive(Clone)]
pub struct CookieSigner {
    key: Key,
}

impl CookieSigner {
    /// Any secret length is accepted; the signing key is its SHA-512 digest.
    pub fn new(secret: &str) -> Self {
        let digest = Sha512::digest(secret.as_bytes());
        Self {
            key: Key::from(digest.as_slice()),
        }
    }

    pub fn session_cookie(&self, id: &Uuid) -> Cookie<'static> {
        let cookie = Cookie::build(SESSION_COOKIE, id.to_string())
            .path("/")
            .secure(true)
            .http_only(true)
            .same_site(SameSite::None)
            .finish();

        let mut jar = CookieJar::new();
        jar.signed_mut(&self.key).add(cookie);
        jar.get(SESSION_COOKIE)
            .cloned()
            .unwrap_or_else(|| Cookie::new(SESSION_COOKIE, ""))
    }

    /// A cookie that tells the browser to drop the session.
    pub fn removal_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build(SESSION_COOKIE, "")
            .path("/")
            .secure(true)
            .http_only(true)
            .same_site(SameSite::None)
            .finish();
        cookie.make_removal();
        cookie.set_max_age(CookieDuration::ZERO);
        cookie
    }

    /// Returns the session id carried by a correctly signed cookie.
    pub fn verify(&self, cookie: Cookie<'static>) -> Option<String> {
        let mut jar = CookieJar::new();
        jar.add_original(cookie);
        jar.signed(&self.key)
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify() {
        let signer = CookieSigner::new("secret");
        let id = Uuid::new_v4();

        let cookie = signer.session_cookie(&id);
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_ne!(cookie.value(), id.to_string());
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.http_only(), Some(true));

        assert_eq!(signer.verify(cookie), Some(id.to_string()));
    }

    #[test]
    fn test_unsigned_cookie_is_rejected() {
        let signer = CookieSigner::new("secret");
        let cookie = Cookie::new(SESSION_COOKIE, Uuid::new_v4().to_string());
        assert_eq!(signer.verify(cookie), None);
    }

    #[test]
    fn test_cookie_signed_with_other_secret_is_rejected() {
        let signer = CookieSigner::new("secret");
        let other = CookieSigner::new("another secret");
        let cookie = other.session_cookie(&Uuid::new_v4());
        assert_eq!(signer.verify(cookie), None);
    }

    #[test]
    fn test_removal_cookie_expires() {
        let cookie = CookieSigner::new("secret").removal_cookie();
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(CookieDuration::ZERO));
    }
}
