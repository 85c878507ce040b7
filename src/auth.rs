//! Email/password sign-in.

use serde::{Deserialize, Serialize};
use std::future::Future;
use tracing::{info, warn};

use crate::notify::{Alert, Notifier};

const SIGN_IN_URL: &str = "https://identitytoolkit.googleapis.com/v1/accounts:signInWithPassword";

/// Outcome of a login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginResponse {
  pub success: bool,
  pub message: String,
  /// Bearer token for store requests, on success
  pub id_token: Option<String>,
}

impl LoginResponse {
  fn failed(message: impl Into<String>) -> Self {
    Self {
      success: false,
      message: message.into(),
      id_token: None,
    }
  }
}

pub trait Authenticator: Send + Sync {
  fn login(&self, email: &str, password: &str) -> impl Future<Output = LoginResponse> + Send;
}

/// Validate the fields, log in, and alert on anything that went wrong.
///
/// Returns the ID token on success.
pub async fn sign_in<A, N>(auth: &A, notifier: &N, email: &str, password: &str) -> Option<String>
where
  A: Authenticator,
  N: Notifier,
{
  if email.is_empty() || password.is_empty() {
    notifier.notify(Alert::new("Sign In", "Please fill all the fields"));
    return None;
  }

  let response = auth.login(email, password).await;
  if response.success {
    info!(email, "signed in");
    response.id_token
  } else {
    warn!(email, message = %response.message, "sign in failed");
    notifier.notify(Alert::new("Sign In", response.message));
    None
  }
}

/// Password sign-in against the identity toolkit REST API.
#[derive(Clone)]
pub struct PasswordAuth {
  http: reqwest::Client,
  api_key: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInRequest<'a> {
  email: &'a str,
  password: &'a str,
  return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
  id_token: String,
}

#[derive(Deserialize)]
struct SignInError {
  error: SignInErrorBody,
}

#[derive(Deserialize)]
struct SignInErrorBody {
  message: String,
}

impl PasswordAuth {
  pub fn new(api_key: impl Into<String>) -> Self {
    Self {
      http: reqwest::Client::new(),
      api_key: api_key.into(),
    }
  }
}

impl Authenticator for PasswordAuth {
  async fn login(&self, email: &str, password: &str) -> LoginResponse {
    let request = SignInRequest {
      email,
      password,
      return_secure_token: true,
    };

    let response = match self
      .http
      .post(SIGN_IN_URL)
      .query(&[("key", self.api_key.as_str())])
      .json(&request)
      .send()
      .await
    {
      Ok(r) => r,
      Err(e) => return LoginResponse::failed(format!("Could not reach sign-in service: {}", e)),
    };

    if response.status().is_success() {
      match response.json::<SignInResponse>().await {
        Ok(body) => LoginResponse {
          success: true,
          message: String::new(),
          id_token: Some(body.id_token),
        },
        Err(e) => LoginResponse::failed(format!("Unexpected sign-in response: {}", e)),
      }
    } else {
      match response.json::<SignInError>().await {
        Ok(body) => LoginResponse::failed(describe_error(&body.error.message)),
        Err(_) => LoginResponse::failed("Sign in failed"),
      }
    }
  }
}

/// Human-readable text for the service's error codes.
fn describe_error(code: &str) -> String {
  // Codes may carry a suffix, e.g. "TOO_MANY_ATTEMPTS_TRY_LATER : ..."
  let code = code.split(':').next().unwrap_or(code).trim();
  match code {
    "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
      "Invalid email or password".to_string()
    }
    "INVALID_EMAIL" => "Invalid email".to_string(),
    "USER_DISABLED" => "This account has been disabled".to_string(),
    "TOO_MANY_ATTEMPTS_TRY_LATER" => "Too many attempts, try again later".to_string(),
    other => other.to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use tokio::sync::mpsc;

  struct FakeAuth {
    accept: bool,
    calls: AtomicUsize,
  }

  impl FakeAuth {
    fn new(accept: bool) -> Self {
      Self {
        accept,
        calls: AtomicUsize::new(0),
      }
    }
  }

  impl Authenticator for FakeAuth {
    async fn login(&self, _email: &str, _password: &str) -> LoginResponse {
      self.calls.fetch_add(1, Ordering::SeqCst);
      if self.accept {
        LoginResponse {
          success: true,
          message: String::new(),
          id_token: Some("tok".to_string()),
        }
      } else {
        LoginResponse::failed("Invalid email or password")
      }
    }
  }

  #[tokio::test]
  async fn test_empty_fields_skip_login() {
    let auth = FakeAuth::new(true);
    let (tx, mut rx) = mpsc::unbounded_channel::<Alert>();

    assert_eq!(sign_in(&auth, &tx, "", "secret").await, None);
    assert_eq!(auth.calls.load(Ordering::SeqCst), 0);
    assert_eq!(
      rx.try_recv().unwrap(),
      Alert::new("Sign In", "Please fill all the fields")
    );
  }

  #[tokio::test]
  async fn test_successful_sign_in_returns_token() {
    let auth = FakeAuth::new(true);
    let (tx, mut rx) = mpsc::unbounded_channel::<Alert>();

    let token = sign_in(&auth, &tx, "reader@example.com", "secret").await;
    assert_eq!(token.as_deref(), Some("tok"));
    assert!(rx.try_recv().is_err());
  }

  #[tokio::test]
  async fn test_failed_sign_in_alerts_message() {
    let auth = FakeAuth::new(false);
    let (tx, mut rx) = mpsc::unbounded_channel::<Alert>();

    assert_eq!(sign_in(&auth, &tx, "reader@example.com", "nope").await, None);
    assert_eq!(
      rx.try_recv().unwrap(),
      Alert::new("Sign In", "Invalid email or password")
    );
  }

  #[test]
  fn test_describe_error() {
    assert_eq!(describe_error("INVALID_PASSWORD"), "Invalid email or password");
    assert_eq!(
      describe_error("TOO_MANY_ATTEMPTS_TRY_LATER : Access disabled"),
      "Too many attempts, try again later"
    );
    assert_eq!(describe_error("SOMETHING_NEW"), "SOMETHING_NEW");
  }
}
