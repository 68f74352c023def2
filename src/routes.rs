//! Page table and navigation. Public pages always render; protected pages go
//! through [`RouteGuard`].

use crate::auth::{AuthApi, AuthContext};
use crate::guard::{GuardOutcome, Redirect, RouteGuard, VerificationPrompt};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Dashboard,
    History,
    SegmentationResults,
    UploadData,
    MessageGeneration,
    Settings,
    CustomerSegmentation,
    Login,
    Signup,
    OtpVerification,
    ForgotPassword,
}

impl Route {
    pub const ALL: [Self; 12] = [
        Self::Home,
        Self::Dashboard,
        Self::History,
        Self::SegmentationResults,
        Self::UploadData,
        Self::MessageGeneration,
        Self::Settings,
        Self::CustomerSegmentation,
        Self::Login,
        Self::Signup,
        Self::OtpVerification,
        Self::ForgotPassword,
    ];

    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Dashboard => "/pages/dashboard",
            Self::History => "/pages/history",
            Self::SegmentationResults => "/pages/segmentation-results",
            Self::UploadData => "/pages/upload-data",
            Self::MessageGeneration => "/pages/message-generation",
            Self::Settings => "/pages/settings",
            Self::CustomerSegmentation => "/pages/customer-segmentation",
            Self::Login => "/pages/login",
            Self::Signup => "/pages/signup",
            Self::OtpVerification => "/pages/otp-verification",
            Self::ForgotPassword => "/pages/forgot-password",
        }
    }

    /// Page name shown in the layout header.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Home | Self::Dashboard => "Dashboard",
            Self::History => "History",
            Self::SegmentationResults => "Segmentation Results",
            Self::UploadData => "Upload Data",
            Self::MessageGeneration => "Message Generation",
            Self::Settings => "Settings",
            Self::CustomerSegmentation => "Customer Segmentation",
            Self::Login => "Sign In",
            Self::Signup => "Sign Up",
            Self::OtpVerification => "Verify Email",
            Self::ForgotPassword => "Forgot Password",
        }
    }

    #[must_use]
    pub const fn is_protected(self) -> bool {
        !matches!(
            self,
            Self::Login | Self::Signup | Self::OtpVerification | Self::ForgotPassword
        )
    }

    /// Case-insensitive lookup; a trailing slash is ignored.
    #[must_use]
    pub fn resolve(path: &str) -> Option<Self> {
        let trimmed = path.trim();
        let trimmed = match trimmed.trim_end_matches('/') {
            "" => "/",
            rest => rest,
        };
        Self::ALL
            .into_iter()
            .find(|route| route.path().eq_ignore_ascii_case(trimmed))
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// A requested location: path plus the raw query string (without `?`).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Location {
    pub path: String,
    pub search: String,
}

impl Location {
    #[must_use]
    pub fn parse(target: &str) -> Self {
        let target = target.trim();
        let (path, search) = target.split_once('?').unwrap_or((target, ""));
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        Self {
            path,
            search: search.to_string(),
        }
    }

    #[must_use]
    pub fn route(&self) -> Option<Route> {
        Route::resolve(&self.path)
    }
}

impl From<Route> for Location {
    fn from(route: Route) -> Self {
        Self {
            path: route.path().to_string(),
            search: String::new(),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.search.is_empty() {
            f.write_str(&self.path)
        } else {
            write!(f, "{}?{}", self.path, self.search)
        }
    }
}

/// State carried along a navigation: the sign-up email for the OTP page and
/// the location a redirect interrupted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NavigationState {
    pub email: Option<String>,
    pub from: Option<Location>,
}

impl NavigationState {
    #[must_use]
    pub fn with_email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            from: None,
        }
    }
}

/// What a navigation resolved to.
#[derive(Debug, PartialEq)]
pub enum Navigation<T> {
    Render(Route, T),
    Waiting(Route),
    Redirect(Redirect),
    VerifyEmail(VerificationPrompt),
    NotFound(Location),
}

pub struct Navigator<'a, A> {
    guard: RouteGuard<'a, A>,
}

impl<'a, A: AuthApi> Navigator<'a, A> {
    #[must_use]
    pub fn new(context: &'a AuthContext<A>) -> Self {
        Self {
            guard: RouteGuard::new(context),
        }
    }

    /// Resolves `location` against the current store snapshot. `page` builds
    /// the page and is only called when the page may be shown.
    pub fn navigate<T>(&self, location: &Location, page: impl FnOnce(Route) -> T) -> Navigation<T> {
        let Some(route) = location.route() else {
            return Navigation::NotFound(location.clone());
        };

        if !route.is_protected() {
            return Navigation::Render(route, page(route));
        }

        match self.guard.protect(location, || page(route)) {
            GuardOutcome::Waiting => Navigation::Waiting(route),
            GuardOutcome::Redirect(redirect) => Navigation::Redirect(redirect),
            GuardOutcome::VerifyEmail(prompt) => Navigation::VerifyEmail(prompt),
            GuardOutcome::Render(rendered) => Navigation::Render(route, rendered),
        }
    }

    /// Same as [`Self::navigate`] but waits for the store to finish loading.
    pub async fn navigate_resolved<T>(
        &self,
        location: &Location,
        page: impl FnOnce(Route) -> T,
    ) -> Navigation<T> {
        self.guard.context().store().resolved().await;
        self.navigate(location, page)
    }
}
