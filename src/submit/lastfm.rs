//! Last.fm client over the 2.0 web API
//!
//! Authenticates once with `auth.getMobileSession` and then submits plays with
//! `track.scrobble`. Every call is signed: parameters sorted by name, concatenated as
//! `name value` pairs without separators, the shared secret appended, MD5 hex-encoded.

use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::remote::{Scrobble, Scrobbler, SubmitError};
use crate::utils::Credentials;

const API_ROOT: &str = "https://ws.audioscrobbler.com/2.0/";
const USER_AGENT: &str = concat!("scrobble-history/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

type Params = Vec<(String, String)>;

/// Authenticated Last.fm session
pub struct LastFmClient {
    http: Client,
    api_root: String,
    api_key: String,
    api_secret: String,
    session_key: String,
}

impl LastFmClient {
    /// Authenticate against the public Last.fm endpoint
    pub fn connect(credentials: &Credentials) -> Result<Self, SubmitError> {
        Self::connect_to(API_ROOT, credentials)
    }

    pub fn connect_to(api_root: &str, credentials: &Credentials) -> Result<Self, SubmitError> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SubmitError::Network(e.to_string()))?;

        let params = vec![
            ("username".to_string(), credentials.username.clone()),
            ("password".to_string(), credentials.password.clone()),
        ];
        let body = send(
            &http,
            api_root,
            "auth.getMobileSession",
            params,
            &credentials.api_key,
            &credentials.api_secret,
            None,
        )?;

        let session_key = body
            .pointer("/session/key")
            .and_then(Value::as_str)
            .ok_or_else(|| SubmitError::Parse("session key missing from response".to_string()))?
            .to_string();

        info!("Connected to Last.fm as {}", credentials.username);

        Ok(Self {
            http,
            api_root: api_root.to_string(),
            api_key: credentials.api_key.clone(),
            api_secret: credentials.api_secret.clone(),
            session_key,
        })
    }

    fn call(&self, method: &str, params: Params) -> Result<Value, SubmitError> {
        send(
            &self.http,
            &self.api_root,
            method,
            params,
            &self.api_key,
            &self.api_secret,
            Some(&self.session_key),
        )
    }

    fn submit(&self, scrobbles: &[Scrobble]) -> Result<(), SubmitError> {
        let body = self.call("track.scrobble", scrobble_params(scrobbles))?;
        let ignored = ignored_count(&body);
        if ignored > 0 {
            warn!("Last.fm ignored {} of {} scrobbles", ignored, scrobbles.len());
        }
        Ok(())
    }
}

impl Scrobbler for LastFmClient {
    fn scrobble_many(&mut self, scrobbles: &[Scrobble]) -> Result<(), SubmitError> {
        debug!(count = scrobbles.len(), "track.scrobble batch");
        self.submit(scrobbles)
    }

    fn scrobble(&mut self, scrobble: &Scrobble) -> Result<(), SubmitError> {
        self.submit(std::slice::from_ref(scrobble))
    }
}

/// MD5 request signature over every parameter except `format` and `callback`
pub fn api_signature(params: &[(String, String)], secret: &str) -> String {
    let mut signed: Vec<&(String, String)> =
        params.iter().filter(|(name, _)| name != "format" && name != "callback").collect();
    signed.sort_by(|a, b| a.0.cmp(&b.0));

    let mut base = String::new();
    for (name, value) in signed {
        base.push_str(name);
        base.push_str(value);
    }
    base.push_str(secret);

    format!("{:x}", md5::compute(base.as_bytes()))
}

fn scrobble_params(scrobbles: &[Scrobble]) -> Params {
    let mut params = Vec::with_capacity(scrobbles.len() * 3);
    for (i, scrobble) in scrobbles.iter().enumerate() {
        params.push((format!("artist[{i}]"), scrobble.artist.clone()));
        params.push((format!("track[{i}]"), scrobble.title.clone()));
        params.push((format!("timestamp[{i}]"), scrobble.timestamp.to_string()));
    }
    params
}

fn send(
    http: &Client,
    api_root: &str,
    method: &str,
    mut params: Params,
    api_key: &str,
    api_secret: &str,
    session_key: Option<&str>,
) -> Result<Value, SubmitError> {
    params.push(("method".to_string(), method.to_string()));
    params.push(("api_key".to_string(), api_key.to_string()));
    if let Some(sk) = session_key {
        params.push(("sk".to_string(), sk.to_string()));
    }
    let signature = api_signature(&params, api_secret);
    params.push(("api_sig".to_string(), signature));
    params.push(("format".to_string(), "json".to_string()));

    let response = http
        .post(api_root)
        .form(&params)
        .send()
        .map_err(|e| SubmitError::Network(e.to_string()))?;

    let status = response.status();
    let body: Value = response
        .json()
        .map_err(|e| SubmitError::Parse(format!("HTTP {}: {}", status.as_u16(), e)))?;

    check_response(body)
}

/// Turn an `{"error": n, "message": ...}` body into [`SubmitError::Api`]
fn check_response(body: Value) -> Result<Value, SubmitError> {
    if let Some(code) = body.get("error").and_then(Value::as_i64) {
        let message = body.get("message").and_then(Value::as_str).unwrap_or("unknown error");
        return Err(SubmitError::api(code, message));
    }
    Ok(body)
}

// Counts come back as numbers or numeric strings depending on the endpoint version
fn ignored_count(body: &Value) -> u64 {
    match body.pointer("/scrobbles/@attr/ignored") {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}
