//! Sysbus client: builds requests, sends them and decodes the answers.

use serde_json::Value;
use tracing::{debug, error};

use crate::error::Result;
use crate::path::{Mode, RpcCall};
use crate::protocol::{self, PREVIEW_LEN, request_body, scrub, truncate};
use crate::transport::{HttpTransport, RequestHeaders, Transport};

/// Call used to check that a session is accepted.
pub const PROBE_TARGET: &str = "sysbus.Time:getTime";

/// Client for the sysbus interface of one device.
///
/// Starts unauthenticated; [`crate::Authenticator::authenticate`] installs
/// the headers of a valid session.
pub struct SysbusClient<T: Transport = HttpTransport> {
    transport: T,
    headers: RequestHeaders,
}

impl<T: Transport> SysbusClient<T> {
    /// Client sending the reduced, unauthenticated header set.
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            headers: RequestHeaders::unauthenticated(),
        }
    }

    #[must_use]
    pub fn headers(&self) -> &RequestHeaders {
        &self.headers
    }

    pub fn set_headers(&mut self, headers: RequestHeaders) {
        self.headers = headers;
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Send `call` and decode the answer.
    ///
    /// # Errors
    ///
    /// Returns `Error::Transport` when the exchange fails, `Error::Protocol`
    /// for undecodable or unexpected bodies and `Error::Remote` when the
    /// device reports errors.
    pub fn try_call(&self, call: &RpcCall) -> Result<Value> {
        let body = self.exchange(call)?;
        let value = protocol::decode(&body, call.mode)?;
        debug!("response: {}", truncate(&value.to_string(), PREVIEW_LEN));
        Ok(value)
    }

    /// Send `call`; failures are logged and yield `None`.
    pub fn call(&self, call: &RpcCall) -> Option<Value> {
        match self.try_call(call) {
            Ok(value) => Some(value),
            Err(e) => {
                error!("{}: {e}", call.target());
                None
            }
        }
    }

    /// Send `call` and return the scrubbed body without decoding it.
    ///
    /// # Errors
    ///
    /// Returns `Error::Transport` when the exchange fails.
    pub fn call_raw(&self, call: &RpcCall) -> Result<Vec<u8>> {
        self.exchange(call)
    }

    /// POST to `target` without parameters.
    pub fn request(&self, target: &str) -> Option<Value> {
        self.request_with(target, Value::Null)
    }

    /// POST to `target` with the keys of the `params` object.
    pub fn request_with(&self, target: &str, params: Value) -> Option<Value> {
        match RpcCall::parse(target) {
            Ok(call) => self.call(&call.with_params(params)),
            Err(e) => {
                error!("{target}: {e}");
                None
            }
        }
    }

    /// GET the datamodel under `target`.
    pub fn get(&self, target: &str, depth: Option<i32>) -> Option<Value> {
        match RpcCall::get(target, depth) {
            Ok(call) => self.call(&call),
            Err(e) => {
                error!("{target}: {e}");
                None
            }
        }
    }

    /// Fetch a static asset of the web interface (e.g. `scripts.js`).
    ///
    /// # Errors
    ///
    /// Returns `Error::Transport` when the exchange fails.
    pub fn fetch_text(&self, path: &str) -> Result<String> {
        let body = self
            .transport
            .get(path, &RequestHeaders::unauthenticated())?;
        Ok(String::from_utf8_lossy(&scrub(&body)).into_owned())
    }

    /// Whether the device accepts the current headers.
    #[must_use]
    pub fn probe(&self) -> bool {
        let call = match RpcCall::parse(PROBE_TARGET) {
            Ok(call) => call,
            Err(e) => {
                error!("{PROBE_TARGET}: {e}");
                return false;
            }
        };

        match self.try_call(&call) {
            Ok(result) => protocol::is_success(&result),
            Err(e) => {
                debug!("session check failed: {e}");
                false
            }
        }
    }

    fn exchange(&self, call: &RpcCall) -> Result<Vec<u8>> {
        let path = call.wire_path();
        let body = match call.mode {
            Mode::Get => {
                debug!("request: {path}");
                self.transport.get(&path, &self.headers)?
            }
            Mode::Post => {
                let body = request_body(&call.parameters);
                debug!("request: {path} with {body}");
                self.transport.post(&path, &self.headers, body)?
            }
        };
        Ok(scrub(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::fixtures::ScriptedTransport;
    use crate::protocol::VENDOR_ARTIFACT;
    use serde_json::json;

    fn client_with(transport: ScriptedTransport) -> SysbusClient<ScriptedTransport> {
        let mut client = SysbusClient::new(transport);
        client.set_headers(RequestHeaders::authenticated("ctx"));
        client
    }

    #[test]
    fn test_post_unwraps_result() {
        let transport = ScriptedTransport::default()
            .respond("POST sysbus/DeviceInfo:get", r#"{"result":{"status":{"UpTime":42}}}"#);
        let client = client_with(transport);

        let result = client.request("DeviceInfo:get").unwrap();
        assert_eq!(result, json!({"status": {"UpTime": 42}}));
    }

    #[test]
    fn test_post_sends_parameters_and_context() {
        let transport = ScriptedTransport::default()
            .respond("POST sysbus/NMC/Wifi:set", r#"{"result":{"status":true}}"#);
        let client = client_with(transport);

        client
            .request_with("sysbus.NMC.Wifi:set", json!({"Enable": true, "Status": true}))
            .unwrap();

        let sent = client.transport().sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].context.as_deref(), Some("ctx"));
        assert_eq!(
            sent[0].body.as_deref(),
            Some(r#"{"parameters":{"Enable":true,"Status":true}}"#)
        );
    }

    #[test]
    fn test_remote_error_yields_none() {
        let transport = ScriptedTransport::default().respond(
            "POST sysbus/Hosts:getDevices",
            r#"{"result":{"status":null,"errors":[{"error":196618}]}}"#,
        );
        let client = client_with(transport);

        let call = RpcCall::parse("Hosts:getDevices").unwrap();
        assert!(matches!(client.try_call(&call), Err(Error::Remote { .. })));
        assert!(client.call(&call).is_none());
    }

    #[test]
    fn test_bad_json_yields_none() {
        let transport =
            ScriptedTransport::default().respond("POST sysbus/Hosts:getDevices", "not json");
        let client = client_with(transport);

        let call = RpcCall::parse("Hosts:getDevices").unwrap();
        assert!(matches!(client.try_call(&call), Err(Error::Protocol { .. })));
        assert!(client.call(&call).is_none());
    }

    #[test]
    fn test_transport_error_yields_none() {
        let client = client_with(ScriptedTransport::default());
        let call = RpcCall::parse("Nothing:here").unwrap();

        assert!(matches!(client.try_call(&call), Err(Error::Transport(_))));
        assert!(client.call(&call).is_none());
    }

    #[test]
    fn test_get_repairs_concatenated_objects() {
        let transport = ScriptedTransport::default().respond(
            "GET sysbus/NeMo/Intf/lan?_restDepth=1",
            r#"{"objectInfo":{"key":"lan"}}{"objectInfo":{"key":"wl0"}}"#,
        );
        let client = client_with(transport);

        let value = client.get("NeMo.Intf.lan", Some(1)).unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(2));
        assert_eq!(client.transport().sent()[0].body, None);
    }

    #[test]
    fn test_raw_returns_scrubbed_body() {
        let mut body = br#"{"name":""#.to_vec();
        body.extend_from_slice(&VENDOR_ARTIFACT);
        body.extend_from_slice(br#""}"#);

        let transport = ScriptedTransport::default().respond_bytes("GET sysbus/sysbus?_restDepth=-1", body);
        let client = client_with(transport);

        let raw = client
            .call_raw(&RpcCall::get("sysbus", None).unwrap())
            .unwrap();
        assert_eq!(raw, br#"{"name":"aaaa"}"#.to_vec());
    }

    #[test]
    fn test_invalid_target_yields_none() {
        let client = client_with(ScriptedTransport::default());
        assert!(client.request("").is_none());
        assert!(client.transport().sent().is_empty());
    }

    #[test]
    fn test_fetch_text_is_unauthenticated() {
        let transport = ScriptedTransport::default().respond("GET scripts.js", "var a = 1;");
        let client = client_with(transport);

        assert_eq!(client.fetch_text("scripts.js").unwrap(), "var a = 1;");
        assert_eq!(client.transport().sent()[0].context, None);
    }

    #[test]
    fn test_probe() {
        let transport = ScriptedTransport::default().accepting("ctx");
        assert!(client_with(transport).probe());

        let transport = ScriptedTransport::default().accepting("other");
        assert!(!client_with(transport).probe());
    }
}
