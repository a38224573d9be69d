//! In-memory transport for unit tests.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use crate::error::TransportError;
use crate::transport::{Cookies, RequestHeaders, Transport};

const PROBE_PATH: &str = "sysbus/Time:getTime";

/// One request seen by [`ScriptedTransport`].
#[derive(Debug, Clone)]
pub struct Sent {
    pub key: String,
    pub context: Option<String>,
    pub body: Option<String>,
}

/// Answers requests from a table keyed by `"METHOD path"`.
///
/// Logins hand out `ctx-1`, `ctx-2`, ... and the session cookie; the time check
/// succeeds only for contexts registered with [`ScriptedTransport::accepting`],
/// unless [`ScriptedTransport::time_answer`] scripts it for that context.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: HashMap<String, Vec<u8>>,
    time_answers: HashMap<String, Option<Vec<u8>>>,
    login_response: Option<Vec<u8>>,
    accepted: RefCell<Vec<String>>,
    accept_fresh: bool,
    logins: Cell<usize>,
    jar: RefCell<Cookies>,
    sent: RefCell<Vec<Sent>>,
}

impl ScriptedTransport {
    pub fn respond(self, key: &str, body: &str) -> Self {
        self.respond_bytes(key, body.as_bytes().to_vec())
    }

    pub fn respond_bytes(mut self, key: &str, body: Vec<u8>) -> Self {
        self.responses.insert(key.to_string(), body);
        self
    }

    /// Answer the time check for `context` with `body`, or fail the exchange
    /// when `body` is `None`.
    pub fn time_answer(mut self, context: &str, body: Option<&str>) -> Self {
        self.time_answers
            .insert(context.to_string(), body.map(|b| b.as_bytes().to_vec()));
        self
    }

    pub fn accepting(self, context: &str) -> Self {
        self.accepted.borrow_mut().push(context.to_string());
        self
    }

    /// Accept every context issued by a login.
    pub fn accepting_fresh_logins(mut self) -> Self {
        self.accept_fresh = true;
        self
    }

    pub fn login_answer(mut self, body: &str) -> Self {
        self.login_response = Some(body.as_bytes().to_vec());
        self
    }

    pub fn logins(&self) -> usize {
        self.logins.get()
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.borrow().clone()
    }

    fn record(&self, key: String, headers: &RequestHeaders, body: Option<String>) {
        self.sent.borrow_mut().push(Sent {
            key,
            context: headers.context().map(str::to_string),
            body,
        });
    }

    fn answer(&self, key: &str, headers: &RequestHeaders) -> Result<Vec<u8>, TransportError> {
        if key == format!("POST {PROBE_PATH}") {
            if let Some(scripted) = headers.context().and_then(|ctx| self.time_answers.get(ctx)) {
                return scripted.clone().ok_or_else(|| TransportError::Status {
                    status: 503,
                    body: "service unavailable".to_string(),
                });
            }
            let accepted = headers
                .context()
                .is_some_and(|ctx| self.accepted.borrow().iter().any(|a| a == ctx));
            let body = if accepted {
                r#"{"result":{"status":true,"data":{"time":"Mon, 19 Oct 2026 10:00:00 GMT+0200"}}}"#
            } else {
                r#"{"result":{"status":null,"errors":[{"error":13,"description":"Permission denied"}]}}"#
            };
            return Ok(body.as_bytes().to_vec());
        }

        self.responses
            .get(key)
            .cloned()
            .ok_or_else(|| TransportError::Status {
                status: 404,
                body: format!("no scripted answer for {key}"),
            })
    }
}

impl Transport for ScriptedTransport {
    fn get(&self, path: &str, headers: &RequestHeaders) -> Result<Vec<u8>, TransportError> {
        let key = format!("GET {path}");
        self.record(key.clone(), headers, None);
        self.answer(&key, headers)
    }

    fn post(
        &self,
        path: &str,
        headers: &RequestHeaders,
        body: String,
    ) -> Result<Vec<u8>, TransportError> {
        let key = format!("POST {path}");
        self.record(key.clone(), headers, Some(body));
        self.answer(&key, headers)
    }

    fn authenticate(&self, username: &str, _password: &str) -> Result<Vec<u8>, TransportError> {
        self.record(
            format!("AUTH {username}"),
            &RequestHeaders::unauthenticated(),
            None,
        );
        let count = self.logins.get() + 1;
        self.logins.set(count);

        if let Some(body) = &self.login_response {
            return Ok(body.clone());
        }

        let context = format!("ctx-{count}");
        if self.accept_fresh {
            self.accepted.borrow_mut().push(context.clone());
        }
        self.jar
            .borrow_mut()
            .insert("sessid".to_string(), format!("cookie-{count}"));
        Ok(format!(r#"{{"status":0,"data":{{"contextID":"{context}"}}}}"#).into_bytes())
    }

    fn cookies(&self) -> Cookies {
        self.jar.borrow().clone()
    }

    fn reset(&mut self, cookies: &Cookies) -> Result<(), TransportError> {
        *self.jar.borrow_mut() = cookies.clone();
        Ok(())
    }
}
