//! Command entry point: parse, validate, ensure a live session, execute,
//! and wrap whatever happened into the response envelope. Errors never
//! escape as `Err`; every path produces a `Response`.

use crate::driver::Driver;
use crate::errors::{AutomationError, Result};
use crate::executor::Executor;
use crate::response::Response;
use crate::session::SessionManager;
use crate::types::{
    Action, AutomationConfig, ClickParams, Command, FillFormParams, NavigateParams, ReadParams,
    ScrollParams, SearchParams, TypeParams, WaitParams,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::info;

/// Typed view of `params`, taken before any browser work so that malformed
/// input never costs a session launch. A missing params object means
/// "all defaults".
fn typed_params<T: DeserializeOwned>(command: &Command) -> Result<T> {
    let raw = if command.params.is_null() {
        Value::Object(serde_json::Map::new())
    } else {
        command.params.clone()
    };
    serde_json::from_value(raw)
        .map_err(|e| AutomationError::Validation(format!("invalid params: {e}")))
}

pub struct Dispatcher<D: Driver> {
    session: SessionManager<D>,
    executor: Executor,
}

impl<D: Driver> Dispatcher<D> {
    pub fn new(driver: D, config: AutomationConfig) -> Self {
        Self {
            session: SessionManager::new(driver, config.browser),
            executor: Executor::new(config.timeouts),
        }
    }

    /// Handle one command end to end. Always returns an envelope.
    pub async fn handle(&mut self, command: &Command) -> Response {
        let Some(action) = Action::parse(&command.action) else {
            let err = AutomationError::Validation(format!("unknown action '{}'", command.action));
            return Response::failure(&command.action, &err);
        };
        info!(action = action.name(), "dispatching command");
        match self.dispatch(action, command).await {
            Ok(response) => response,
            Err(err) => Response::failure(action.name(), &err),
        }
    }

    async fn dispatch(&mut self, action: Action, command: &Command) -> Result<Response> {
        match action {
            Action::Navigate => {
                let params: NavigateParams = typed_params(command)?;
                let driver = self.session.ensure_ready().await?;
                let data = self.executor.navigate(driver, &params).await?;
                let url = data["url"].as_str().unwrap_or(&params.url).to_string();
                Ok(Response::success(
                    action.name(),
                    format!("opened {url}"),
                    data,
                ))
            }
            Action::Click => {
                let params: ClickParams = typed_params(command)?;
                let driver = self.session.ensure_ready().await?;
                let data = self.executor.click(driver, &params).await?;
                Ok(Response::success(
                    action.name(),
                    format!("clicked '{}' (index {})", params.selector, params.index),
                    data,
                ))
            }
            Action::Type => {
                let params: TypeParams = typed_params(command)?;
                let driver = self.session.ensure_ready().await?;
                let data = self.executor.type_text(driver, &params).await?;
                Ok(Response::success(
                    action.name(),
                    format!("typed into '{}'", params.selector),
                    data,
                ))
            }
            Action::Read => {
                let params: ReadParams = typed_params(command)?;
                let driver = self.session.ensure_ready().await?;
                let data = self.executor.read(driver, &params).await?;
                Ok(Response::success(
                    action.name(),
                    format!("read text from '{}'", params.selector),
                    data,
                ))
            }
            Action::Scroll => {
                let params: ScrollParams = typed_params(command)?;
                let driver = self.session.ensure_ready().await?;
                let data = self.executor.scroll(driver, &params).await?;
                Ok(Response::success(
                    action.name(),
                    format!(
                        "scrolled {} by {}px",
                        params.direction.name(),
                        params.amount
                    ),
                    data,
                ))
            }
            Action::Wait => {
                let params: WaitParams = typed_params(command)?;
                let driver = self.session.ensure_ready().await?;
                let data = self.executor.wait(driver, &params).await?;
                Ok(Response::success(
                    action.name(),
                    format!("element '{}' appeared", params.selector),
                    data,
                ))
            }
            Action::Search => {
                let params: SearchParams = typed_params(command)?;
                let driver = self.session.ensure_ready().await?;
                let data = self.executor.search(driver, &params).await?;
                Ok(Response::success(
                    action.name(),
                    format!("searched for '{}'", params.query),
                    data,
                ))
            }
            Action::FillForm => {
                let params: FillFormParams = typed_params(command)?;
                let driver = self.session.ensure_ready().await?;
                let report = self.executor.fill_form(driver, &params).await;
                let progress = json!({ "completed": report.completed });
                match report.failed {
                    None => Ok(Response::success(
                        action.name(),
                        format!(
                            "filled {} field(s)",
                            progress["completed"].as_array().map_or(0, Vec::len)
                        ),
                        progress,
                    )),
                    Some((field, err)) => {
                        let mut response =
                            Response::failure_with_progress(action.name(), &err, progress);
                        response.message = format!("form fill stopped at '{field}': {err}");
                        Ok(response)
                    }
                }
            }
        }
    }

    /// Tear the session down. Safe to call repeatedly.
    pub async fn close(&mut self) {
        self.session.close().await;
    }
}
