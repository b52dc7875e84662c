//! CSRF token lookup

/// Cookie the session framework stores its CSRF token under
pub const CSRF_COOKIE_NAME: &str = "csrftoken";
/// Header carrying the CSRF token on outgoing requests
pub const CSRF_HEADER_NAME: &str = "X-CSRFToken";

/// Source of the anti-forgery token required on state-changing requests
pub trait CsrfSource: Send + Sync + 'static {
    fn csrf_token(&self) -> Option<String>;
}

/// Never yields a token
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCsrf;

impl CsrfSource for NoCsrf {
    fn csrf_token(&self) -> Option<String> {
        None
    }
}

/// What the rendered page exposes about CSRF
///
/// Lookup order is the `csrf-token` meta tag, the `csrfmiddlewaretoken`
/// hidden form field, then the `csrftoken` cookie.
#[derive(Debug, Clone, Default)]
pub struct PageCsrf {
    meta_tag: Option<String>,
    form_field: Option<String>,
    cookie_header: Option<String>,
}

impl PageCsrf {
    pub fn new() -> Self {
        Self::default()
    }

    /// Content of `<meta name="csrf-token">`
    pub fn with_meta_tag(mut self, content: impl Into<String>) -> Self {
        self.meta_tag = Some(content.into());
        self
    }

    /// Value of the `csrfmiddlewaretoken` form input
    pub fn with_form_field(mut self, value: impl Into<String>) -> Self {
        self.form_field = Some(value.into());
        self
    }

    /// Raw `name=value; name2=value2` cookie string
    pub fn with_cookies(mut self, header: impl Into<String>) -> Self {
        self.cookie_header = Some(header.into());
        self
    }

    fn from_cookies(&self) -> Option<String> {
        self.cookie_header
            .as_deref()?
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == CSRF_COOKIE_NAME)
            .map(|(_, value)| value.to_string())
    }
}

impl CsrfSource for PageCsrf {
    fn csrf_token(&self) -> Option<String> {
        let non_empty = |v: &Option<String>| v.clone().filter(|t| !t.is_empty());

        non_empty(&self.meta_tag)
            .or_else(|| non_empty(&self.form_field))
            .or_else(|| self.from_cookies().filter(|t| !t.is_empty()))
    }
}
