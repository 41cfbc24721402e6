//! Request, await, then dispatch success or failure.

use crate::client::error::{ClientError, ClientResult};
use crate::client::http::ApiClient;
use crate::client::state::{Action, AppState, Event};
use crate::models::LoginResponse;

fn fail_or_logout(state: &mut AppState, err: &ClientError, fail: impl FnOnce(String) -> Event) {
    if err.is_unauthorized() {
        state.dispatch(Event::Logout);
    } else {
        state.dispatch(fail(err.to_string()));
    }
}

pub async fn login(
    client: &ApiClient,
    state: &mut AppState,
    username: &str,
    password: &str,
) -> ClientResult<LoginResponse> {
    state.dispatch(Event::Login(Action::Request));

    match client.login(username, password).await {
        Ok(session) => {
            state.dispatch(Event::Login(Action::Success(session.clone())));
            Ok(session)
        }
        Err(err) => {
            state.dispatch(Event::Login(Action::Fail(err.to_string())));
            Err(err)
        }
    }
}

pub async fn logout(client: &ApiClient, state: &mut AppState) -> ClientResult<()> {
    let result = client.logout().await;
    state.dispatch(Event::Logout);
    result
}

pub async fn load_report(
    client: &ApiClient,
    state: &mut AppState,
    month: Option<&str>,
) -> ClientResult<()> {
    state.dispatch(Event::Report(Action::Request));

    match client.fetch_report_data(month).await {
        Ok(report) => {
            state.dispatch(Event::Report(Action::Success(report)));
            Ok(())
        }
        Err(err) => {
            fail_or_logout(state, &err, |message| Event::Report(Action::Fail(message)));
            Err(err)
        }
    }
}
