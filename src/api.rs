//! Gateway to the studyhub module REST api.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::AUTHORIZATION;
use reqwest::Method;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::module::{AddTimeRequest, Module, ModuleSelectEntry, NewModuleForm};
use crate::tracker::TimerRequest;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api/modul/v1";

/// Modules keyed by semester level.
pub type SemesterBuckets = BTreeMap<u32, Vec<Module>>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend answered {status} for {path}")]
    Status { status: u16, path: String },
}

/// Builds the `Authorization` header value attached to every request.
pub trait HeaderProvider: Send + Sync {
    fn authorization(&self) -> Option<String>;
}

#[derive(Debug, Clone)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl HeaderProvider for BearerToken {
    fn authorization(&self) -> Option<String> {
        if self.0.is_empty() {
            None
        } else {
            Some(format!("Bearer {}", self.0))
        }
    }
}

/// No credentials, for unauthenticated development backends.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl HeaderProvider for Anonymous {
    fn authorization(&self) -> Option<String> {
        None
    }
}

pub trait ModuleApi: Send + Sync {
    /// Active modules grouped by semester level.
    fn modules_by_semester(&self) -> Result<SemesterBuckets, ApiError>;
    /// Every module of the user, active or not.
    fn all_modules(&self) -> Result<Vec<Module>, ApiError>;
    fn seconds_for_module(&self, module_id: &str) -> Result<u64, ApiError>;
    fn add_seconds(&self, request: &TimerRequest) -> Result<(), ApiError>;
    /// Add a manually entered `HH:MM` duration.
    fn add_time(&self, request: &AddTimeRequest) -> Result<(), ApiError>;
    fn create_module(&self, form: &NewModuleForm) -> Result<(), ApiError>;
    fn reset_timer(&self, module_id: &str) -> Result<(), ApiError>;
    fn toggle_active(&self, module_id: &str) -> Result<(), ApiError>;
    fn delete_module(&self, module_id: &str) -> Result<(), ApiError>;
    fn module_select_data(&self) -> Result<Vec<ModuleSelectEntry>, ApiError>;
    fn has_module(&self) -> Result<bool, ApiError>;
}

/// Blocking HTTP implementation of [`ModuleApi`].
pub struct HttpModuleApi {
    client: Client,
    base_url: String,
    headers: Arc<dyn HeaderProvider>,
}

impl HttpModuleApi {
    pub fn builder(base_url: impl Into<String>) -> HttpModuleApiBuilder {
        HttpModuleApiBuilder {
            base_url: base_url.into(),
            timeout: Duration::from_secs(10),
            user_agent: concat!("studytrack/", env!("CARGO_PKG_VERSION")).to_string(),
            headers: Arc::new(Anonymous),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        match self.headers.authorization() {
            Some(value) => builder.header(AUTHORIZATION, value),
            None => builder,
        }
    }

    fn send(&self, path: &str, builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder.send()?;
        let status = response.status();
        log::debug!("{} -> {}", path, status);

        if status.is_success() {
            Ok(response)
        } else {
            Err(ApiError::Status {
                status: status.as_u16(),
                path: path.to_string(),
            })
        }
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T, ApiError> {
        let response = self.send(path, self.request(Method::GET, path).query(query))?;
        Ok(response.json()?)
    }
}

pub struct HttpModuleApiBuilder {
    base_url: String,
    timeout: Duration,
    user_agent: String,
    headers: Arc<dyn HeaderProvider>,
}

impl HttpModuleApiBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    pub fn headers(mut self, headers: Arc<dyn HeaderProvider>) -> Self {
        self.headers = headers;
        self
    }

    pub fn build(self) -> Result<HttpModuleApi, ApiError> {
        let client = Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent)
            .build()?;

        Ok(HttpModuleApi {
            client,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            headers: self.headers,
        })
    }
}

impl ModuleApi for HttpModuleApi {
    fn modules_by_semester(&self) -> Result<SemesterBuckets, ApiError> {
        self.get_json("/get-active-module2", &[])
    }

    fn all_modules(&self) -> Result<Vec<Module>, ApiError> {
        self.get_json("/get-all-by-username", &[])
    }

    fn seconds_for_module(&self, module_id: &str) -> Result<u64, ApiError> {
        self.get_json("/get-seconds", &[("fachId", module_id)])
    }

    fn add_seconds(&self, request: &TimerRequest) -> Result<(), ApiError> {
        let path = "/add-seconds";
        self.send(path, self.request(Method::POST, path).json(request))?;
        Ok(())
    }

    fn add_time(&self, request: &AddTimeRequest) -> Result<(), ApiError> {
        let path = "/add-seconds";
        self.send(path, self.request(Method::POST, path).json(request))?;
        Ok(())
    }

    fn create_module(&self, form: &NewModuleForm) -> Result<(), ApiError> {
        let path = "/new-modul";
        self.send(path, self.request(Method::POST, path).json(form))?;
        Ok(())
    }

    fn reset_timer(&self, module_id: &str) -> Result<(), ApiError> {
        let path = "/reset";
        self.send(
            path,
            self.request(Method::PUT, path).query(&[("fachId", module_id)]),
        )?;
        Ok(())
    }

    fn toggle_active(&self, module_id: &str) -> Result<(), ApiError> {
        let path = "/change-active";
        self.send(
            path,
            self.request(Method::PUT, path).query(&[("fachId", module_id)]),
        )?;
        Ok(())
    }

    fn delete_module(&self, module_id: &str) -> Result<(), ApiError> {
        let path = "/delete";
        self.send(
            path,
            self.request(Method::DELETE, path)
                .query(&[("fachId", module_id)]),
        )?;
        Ok(())
    }

    fn module_select_data(&self) -> Result<Vec<ModuleSelectEntry>, ApiError> {
        self.get_json("/get-modul-select-data", &[])
    }

    fn has_module(&self) -> Result<bool, ApiError> {
        self.get_json("/has-module", &[])
    }
}
