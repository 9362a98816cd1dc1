//! Waitlist referral funnel
//!
//! Public signups get a short referral code; signing up through someone
//! else's code bumps that signup's successful_referrals counter with a
//! single $inc. The signup insert and the counter bump are two separate
//! writes: a crash in between loses the credit, which is accepted for
//! this funnel (the signup itself is never lost).

use async_trait::async_trait;
use bson::doc;
use rand::Rng;
use tracing::{info, warn};

use crate::db::mongo::MongoCollection;
use crate::db::schemas::{Metadata, WaitlistSignupDoc};
use crate::types::WilbeError;

/// Unambiguous alphabet for referral codes (no 0/O, 1/I/L)
const CODE_ALPHABET: &[u8] = b"23456789ABCDEFGHJKMNPQRSTUVWXYZ";
const CODE_LEN: usize = 8;
const CODE_RETRIES: usize = 5;

/// Generate a random referral code
pub fn new_referral_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Client-submitted waitlist signup
#[derive(Debug, Clone, serde::Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub referred_by: Option<String>,
    #[serde(default)]
    pub utm_source: Option<String>,
    #[serde(default)]
    pub utm_medium: Option<String>,
}

impl SignupRequest {
    pub fn validate(&self) -> Result<(), WilbeError> {
        if self.name.trim().is_empty() {
            return Err(WilbeError::Validation("name is required".into()));
        }
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') || email.len() > 320 {
            return Err(WilbeError::Validation("a valid email is required".into()));
        }
        Ok(())
    }
}

/// Outcome of a signup, shaped for the response body
#[derive(Debug, Clone, serde::Serialize)]
pub struct SignupOutcome {
    pub referral_code: String,
    pub referral_link: String,
    pub already_signed_up: bool,
}

/// Store operations the signup flow needs. The Mongo collection is the
/// production implementation; tests substitute an in-memory one.
#[async_trait]
pub trait SignupStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<WaitlistSignupDoc>, WilbeError>;
    async fn find_by_code(&self, code: &str) -> Result<Option<WaitlistSignupDoc>, WilbeError>;
    async fn insert(&self, signup: WaitlistSignupDoc) -> Result<(), WilbeError>;
    /// $inc the referrer's counter and return the post-update row
    async fn credit_referrer(&self, code: &str)
        -> Result<Option<WaitlistSignupDoc>, WilbeError>;
}

#[async_trait]
impl SignupStore for MongoCollection<WaitlistSignupDoc> {
    async fn find_by_email(&self, email: &str) -> Result<Option<WaitlistSignupDoc>, WilbeError> {
        self.find_one(doc! { "email": email }).await
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<WaitlistSignupDoc>, WilbeError> {
        self.find_one(doc! { "referral_code": code }).await
    }

    async fn insert(&self, signup: WaitlistSignupDoc) -> Result<(), WilbeError> {
        self.insert_one(signup).await.map(|_| ())
    }

    async fn credit_referrer(
        &self,
        code: &str,
    ) -> Result<Option<WaitlistSignupDoc>, WilbeError> {
        self.find_one_and_update(
            doc! { "referral_code": code },
            doc! {
                "$inc": { "successful_referrals": 1 },
                "$set": { "metadata.updated_at": bson::DateTime::now() },
            },
        )
        .await
    }
}

/// Register a waitlist signup and credit the referrer.
///
/// Re-signing up with a known email is not an error: the existing code is
/// returned so the share link survives page reloads. Referral credit is
/// only granted on first signup.
pub async fn register_signup(
    store: &impl SignupStore,
    request: &SignupRequest,
    link_builder: impl Fn(&str) -> String,
) -> Result<SignupOutcome, WilbeError> {
    request.validate()?;
    let email = request.email.trim().to_lowercase();

    if let Some(existing) = store.find_by_email(&email).await? {
        return Ok(SignupOutcome {
            referral_link: link_builder(&existing.referral_code),
            referral_code: existing.referral_code,
            already_signed_up: true,
        });
    }

    // Resolve the referrer before inserting so bogus codes are dropped
    // rather than stored.
    let referred_by = match &request.referred_by {
        Some(code) => {
            let code = code.trim().to_uppercase();
            match store.find_by_code(&code).await? {
                Some(_) => Some(code),
                None => {
                    warn!(code = %code, "Ignoring unknown referral code on signup");
                    None
                }
            }
        }
        None => None,
    };

    let mut code = new_referral_code();
    let mut attempt = 0;
    loop {
        let signup = WaitlistSignupDoc {
            _id: None,
            metadata: Metadata::new(),
            name: request.name.trim().to_string(),
            email: email.clone(),
            referral_code: code.clone(),
            referred_by: referred_by.clone(),
            successful_referrals: 0,
            utm_source: request.utm_source.clone(),
            utm_medium: request.utm_medium.clone(),
        };

        match store.insert(signup).await {
            Ok(()) => break,
            Err(e) if e.is_duplicate_key() && attempt < CODE_RETRIES => {
                // Either a code collision or a concurrent signup with the
                // same email; re-check the email before retrying the code.
                if let Some(existing) = store.find_by_email(&email).await? {
                    return Ok(SignupOutcome {
                        referral_link: link_builder(&existing.referral_code),
                        referral_code: existing.referral_code,
                        already_signed_up: true,
                    });
                }
                attempt += 1;
                code = new_referral_code();
            }
            Err(e) => return Err(e),
        }
    }
    info!(email = %email, code = %code, "Waitlist signup recorded");

    // Counter bump is best-effort: a failure here must not fail the signup.
    if let Some(referrer_code) = &referred_by {
        match store.credit_referrer(referrer_code).await {
            Ok(Some(referrer)) => {
                info!(
                    code = %referrer_code,
                    total = referrer.successful_referrals,
                    "Referral credited"
                );
            }
            Ok(None) => warn!(code = %referrer_code, "Referrer vanished before credit"),
            Err(e) => warn!(code = %referrer_code, "Failed to credit referral: {}", e),
        }
    }

    Ok(SignupOutcome {
        referral_link: link_builder(&code),
        referral_code: code,
        already_signed_up: false,
    })
}

/// Referral standing for one signup, shaped for the response body
#[derive(Debug, Clone, serde::Serialize)]
pub struct ReferralStatus {
    pub name: String,
    pub referral_code: String,
    pub referral_link: String,
    pub successful_referrals: i64,
}

/// Look up the referral standing behind a code
pub async fn referral_status(
    store: &impl SignupStore,
    code: &str,
    link_builder: impl Fn(&str) -> String,
) -> Result<Option<ReferralStatus>, WilbeError> {
    let code = code.trim().to_uppercase();
    let Some(signup) = store.find_by_code(&code).await? else {
        return Ok(None);
    };

    Ok(Some(ReferralStatus {
        name: signup.name,
        referral_link: link_builder(&signup.referral_code),
        referral_code: signup.referral_code,
        successful_referrals: signup.successful_referrals,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// In-memory SignupStore mirroring the unique email/code indexes
    #[derive(Default)]
    struct MemStore {
        rows: Mutex<Vec<WaitlistSignupDoc>>,
        credited: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SignupStore for MemStore {
        async fn find_by_email(
            &self,
            email: &str,
        ) -> Result<Option<WaitlistSignupDoc>, WilbeError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.email == email)
                .cloned())
        }

        async fn find_by_code(
            &self,
            code: &str,
        ) -> Result<Option<WaitlistSignupDoc>, WilbeError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.referral_code == code)
                .cloned())
        }

        async fn insert(&self, signup: WaitlistSignupDoc) -> Result<(), WilbeError> {
            let mut rows = self.rows.lock().unwrap();
            if rows
                .iter()
                .any(|r| r.email == signup.email || r.referral_code == signup.referral_code)
            {
                return Err(WilbeError::Database("E11000 duplicate key error".into()));
            }
            rows.push(signup);
            Ok(())
        }

        async fn credit_referrer(
            &self,
            code: &str,
        ) -> Result<Option<WaitlistSignupDoc>, WilbeError> {
            self.credited.lock().unwrap().push(code.to_string());
            let mut rows = self.rows.lock().unwrap();
            match rows.iter_mut().find(|r| r.referral_code == code) {
                Some(row) => {
                    row.successful_referrals += 1;
                    Ok(Some(row.clone()))
                }
                None => Ok(None),
            }
        }
    }

    fn seeded(code: &str, email: &str, referrals: i64) -> WaitlistSignupDoc {
        WaitlistSignupDoc {
            name: "Grace".to_string(),
            email: email.to_string(),
            referral_code: code.to_string(),
            successful_referrals: referrals,
            ..Default::default()
        }
    }

    fn request(email: &str, referred_by: Option<&str>) -> SignupRequest {
        SignupRequest {
            name: "Ada".to_string(),
            email: email.to_string(),
            referred_by: referred_by.map(String::from),
            utm_source: None,
            utm_medium: None,
        }
    }

    fn link(code: &str) -> String {
        format!("https://wilbe.test/waitlist?ref={}", code)
    }

    #[tokio::test]
    async fn test_signup_without_code_skips_referral_credit() {
        let store = MemStore::default();

        let outcome = register_signup(&store, &request("a@x.com", None), link)
            .await
            .unwrap();

        assert!(!outcome.already_signed_up);
        let rows = store.rows.lock().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].email, "a@x.com");
        assert!(rows[0].referred_by.is_none());
        assert!(store.credited.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_signup_with_valid_code_credits_referrer() {
        let store = MemStore::default();
        store
            .rows
            .lock()
            .unwrap()
            .push(seeded("GRACE234", "grace@lab.org", 2));

        let outcome = register_signup(&store, &request("a@x.com", Some("grace234")), link)
            .await
            .unwrap();

        assert!(!outcome.already_signed_up);
        // One credit, against the right code, case-normalized
        assert_eq!(*store.credited.lock().unwrap(), vec!["GRACE234".to_string()]);
        let rows = store.rows.lock().unwrap();
        let referrer = rows.iter().find(|r| r.referral_code == "GRACE234").unwrap();
        assert_eq!(referrer.successful_referrals, 3);
        let new = rows.iter().find(|r| r.email == "a@x.com").unwrap();
        assert_eq!(new.referred_by.as_deref(), Some("GRACE234"));
    }

    #[tokio::test]
    async fn test_unknown_code_is_dropped_without_credit() {
        let store = MemStore::default();

        register_signup(&store, &request("a@x.com", Some("NOPE2345")), link)
            .await
            .unwrap();

        let rows = store.rows.lock().unwrap();
        assert!(rows[0].referred_by.is_none());
        assert!(store.credited.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_repeat_email_returns_existing_code() {
        let store = MemStore::default();

        let first = register_signup(&store, &request("a@x.com", None), link)
            .await
            .unwrap();
        let second = register_signup(&store, &request("a@x.com", None), link)
            .await
            .unwrap();

        assert!(second.already_signed_up);
        assert_eq!(second.referral_code, first.referral_code);
        assert_eq!(store.rows.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_referral_status_reports_counter() {
        let store = MemStore::default();
        store
            .rows
            .lock()
            .unwrap()
            .push(seeded("GRACE234", "grace@lab.org", 5));

        let status = referral_status(&store, "grace234", link).await.unwrap();
        let status = status.unwrap();
        assert_eq!(status.successful_referrals, 5);
        assert_eq!(status.referral_code, "GRACE234");

        assert!(referral_status(&store, "MISSING2", link)
            .await
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_referral_code_shape() {
        let code = new_referral_code();
        assert_eq!(code.len(), CODE_LEN);
        for c in code.bytes() {
            assert!(CODE_ALPHABET.contains(&c), "unexpected char {}", c as char);
        }
    }

    #[test]
    fn test_referral_codes_avoid_ambiguous_chars() {
        for banned in [b'0', b'O', b'1', b'I', b'L'] {
            assert!(!CODE_ALPHABET.contains(&banned));
        }
    }

    #[test]
    fn test_signup_request_validation() {
        let ok = SignupRequest {
            name: "Ada".into(),
            email: "ada@lab.org".into(),
            referred_by: None,
            utm_source: None,
            utm_medium: None,
        };
        assert!(ok.validate().is_ok());

        let mut bad = ok.clone();
        bad.name = "  ".into();
        assert!(bad.validate().is_err());

        let mut bad = ok.clone();
        bad.email = "not-an-email".into();
        assert!(bad.validate().is_err());
    }
}
