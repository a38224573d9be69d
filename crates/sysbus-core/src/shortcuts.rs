//! Named calls that need no arguments.

use serde_json::Value;

use crate::Result;

/// A fixed call reachable by name from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shortcut {
    pub name: &'static str,
    pub help: &'static str,
    pub target: &'static str,
    /// JSON object sent as parameters; empty for none.
    pub params: &'static str,
}

impl Shortcut {
    /// Parameters of the call, `Value::Null` when there are none.
    ///
    /// # Errors
    ///
    /// Returns `Error::Json` if `params` is not valid JSON.
    pub fn parameters(&self) -> Result<Value> {
        if self.params.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(self.params)?)
    }
}

pub const SHORTCUTS: &[Shortcut] = &[
    Shortcut {
        name: "wifistate",
        help: "Show the Wi-Fi state",
        target: "sysbus.NMC.Wifi:get",
        params: "",
    },
    Shortcut {
        name: "phonestate",
        help: "Show the telephony trunks",
        target: "sysbus.VoiceService.VoiceApplication:listTrunks",
        params: "",
    },
    Shortcut {
        name: "tvstate",
        help: "Show the IPTV status",
        target: "sysbus.NMC.OrangeTV:getIPTVStatus",
        params: "",
    },
    Shortcut {
        name: "wifion",
        help: "Turn Wi-Fi on",
        target: "sysbus.NMC.Wifi:set",
        params: r#"{"Enable": true, "Status": true}"#,
    },
    Shortcut {
        name: "wifioff",
        help: "Turn Wi-Fi off",
        target: "sysbus.NMC.Wifi:set",
        params: r#"{"Enable": false, "Status": false}"#,
    },
    Shortcut {
        name: "devices",
        help: "List the known devices",
        target: "sysbus.Hosts:getDevices",
        params: "",
    },
    Shortcut {
        name: "wpson",
        help: "Enable Wi-Fi Protected Setup",
        target: "sysbus/NeMo/Intf/wl0:setWLANConfig",
        params: r#"{"mibs": {"wlanvap": {"wl0": {"WPS": {"Enable": true}}, "wl1": {"WPS": {"Enable": true}}}}}"#,
    },
    Shortcut {
        name: "wpsoff",
        help: "Disable Wi-Fi Protected Setup",
        target: "sysbus/NeMo/Intf/wl0:setWLANConfig",
        params: r#"{"mibs": {"wlanvap": {"wl0": {"WPS": {"Enable": false}}, "wl1": {"WPS": {"Enable": false}}}}}"#,
    },
    Shortcut {
        name: "version",
        help: "Show the device version and details",
        target: "sysbus.DeviceInfo:get",
        params: "",
    },
];

#[must_use]
pub fn find(name: &str) -> Option<&'static Shortcut> {
    SHORTCUTS.iter().find(|shortcut| shortcut.name == name)
}
