//! Client side of the confirmation page
//!
//! The page a confirmation link opens makes a single request to
//! `GET /confirm` and shows the outcome. [`ConfirmationView`] holds that
//! state: it starts out [`Loading`](ConfirmationStatus::Loading), settles on
//! the first answer and never asks again.

use reqwest::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfirmationStatus {
    #[default]
    Loading,
    Success,
    Error,
}

impl ConfirmationStatus {
    /// Text shown to the subscriber
    pub fn headline(&self) -> &'static str {
        match self {
            ConfirmationStatus::Loading => "Checking…",
            ConfirmationStatus::Success => "Email confirmed",
            ConfirmationStatus::Error => "Invalid link",
        }
    }

    pub fn is_settled(&self) -> bool {
        !matches!(self, ConfirmationStatus::Loading)
    }
}

pub struct ConfirmationView {
    http: reqwest::Client,
    endpoint: String,
    locale: Option<String>,
    status: ConfirmationStatus,
    requested: bool,
}

impl ConfirmationView {
    /// A view that confirms against the verimail server at `endpoint`,
    /// e.g. `https://cdlhelp.com/api`
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), endpoint)
    }

    pub fn with_client(http: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            locale: None,
            status: ConfirmationStatus::Loading,
            requested: false,
        }
    }

    /// Forward the page locale with the request
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn status(&self) -> ConfirmationStatus {
        self.status
    }

    /// Redeem `code` once
    ///
    /// Without a code nothing is requested and the view keeps loading, so a
    /// later call that has the code still goes through. Once a request has
    /// been made, further calls return the settled status unchanged.
    pub async fn load(&mut self, code: Option<&str>) -> ConfirmationStatus {
        if self.requested {
            return self.status;
        }
        let Some(code) = code.filter(|c| !c.is_empty()) else {
            return self.status;
        };

        self.requested = true;
        self.status = match self.request(code).await {
            Ok(true) => ConfirmationStatus::Success,
            Ok(false) => ConfirmationStatus::Error,
            Err(e) => {
                tracing::warn!(error = %e, "Confirmation request failed");
                ConfirmationStatus::Error
            }
        };
        self.status
    }

    async fn request(&self, code: &str) -> Result<bool, ClientError> {
        let url = self.confirm_url(code)?;
        let response = self.http.get(url).send().await?;
        Ok(response.status().is_success())
    }

    fn confirm_url(&self, code: &str) -> Result<Url, ClientError> {
        let mut url =
            Url::parse(&self.endpoint).map_err(|_| ClientError::Endpoint(self.endpoint.clone()))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::Endpoint(self.endpoint.clone()))?
            .pop_if_empty()
            .push("confirm");

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("code", code);
            if let Some(locale) = &self.locale {
                query.append_pair("locale", locale);
            }
        }
        Ok(url)
    }
}

#[derive(Debug, thiserror::Error)]
enum ClientError {
    #[error("unusable endpoint URL: {0}")]
    Endpoint(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}
