//! Client application state and its reducer.
//!
//! Each feature owns a [`Slice`] driven through request, success and fail
//! actions. The whole state is hydrated from the stored session at start and
//! reset on logout.

use crate::client::report::ReportData;
use crate::models::LoginResponse;

#[derive(Debug, Clone, PartialEq)]
pub struct Slice<T> {
    pub loading: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> Default for Slice<T> {
    fn default() -> Self {
        Self {
            loading: false,
            data: None,
            error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action<T> {
    Request,
    Success(T),
    Fail(String),
}

impl<T> Slice<T> {
    /// Request keeps the previous data visible while loading.
    pub fn apply(&mut self, action: Action<T>) {
        match action {
            Action::Request => {
                self.loading = true;
                self.error = None;
            }
            Action::Success(data) => {
                self.loading = false;
                self.data = Some(data);
                self.error = None;
            }
            Action::Fail(message) => {
                self.loading = false;
                self.error = Some(message);
            }
        }
    }
}

#[derive(Debug, Clone)]
pub enum Event {
    Login(Action<LoginResponse>),
    Report(Action<ReportData>),
    Logout,
}

#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub user_info: Slice<LoginResponse>,
    pub report: Slice<ReportData>,
}

impl AppState {
    pub fn hydrate(session: Option<LoginResponse>) -> Self {
        Self {
            user_info: Slice {
                data: session,
                ..Slice::default()
            },
            ..Self::default()
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.user_info.data.is_some()
    }

    pub fn dispatch(&mut self, event: Event) {
        match event {
            Event::Login(action) => self.user_info.apply(action),
            Event::Report(action) => self.report.apply(action),
            Event::Logout => *self = Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::role::Role;

    fn session() -> LoginResponse {
        LoginResponse {
            token: "t".to_string(),
            role: Role::Admin,
            role_id: 1,
            user_id: 1,
            name: "Admin".to_string(),
            username: "admin".to_string(),
        }
    }

    #[test]
    fn slice_follows_request_success_fail() {
        let mut slice: Slice<u32> = Slice::default();

        slice.apply(Action::Request);
        assert!(slice.loading);

        slice.apply(Action::Success(7));
        assert_eq!(slice, Slice { loading: false, data: Some(7), error: None });

        slice.apply(Action::Request);
        slice.apply(Action::Fail("boom".to_string()));
        assert_eq!(slice.data, Some(7));
        assert_eq!(slice.error.as_deref(), Some("boom"));
        assert!(!slice.loading);
    }

    #[test]
    fn logout_resets_every_slice() {
        let mut state = AppState::hydrate(Some(session()));
        assert!(state.is_logged_in());

        state.dispatch(Event::Report(Action::Fail("x".to_string())));
        state.dispatch(Event::Logout);

        assert!(!state.is_logged_in());
        assert_eq!(state.report.error, None);
    }
}
