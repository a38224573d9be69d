//! Command implementations.
//!
//! Device answers are printed as pretty JSON unless a report format exists
//! for them. Failed calls are logged by the client and print nothing.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::{Value, json};
use sysbus_core::config::Config;
use sysbus_core::graph::{self, Digraph};
use sysbus_core::model;
use sysbus_core::report::{self, pretty, status_array, status_names, text_at};
use sysbus_core::scripts::{self, SCRIPTS_FILE};
use sysbus_core::shortcuts::{SHORTCUTS, Shortcut};
use sysbus_rpc::{HttpTransport, RpcCall, SysbusClient, Transport};
use tracing::{debug, info, warn};

const TIME_TARGET: &str = "sysbus.Time:getTime";
const STATIC_LEASES: &str = "sysbus.DHCPv4.Server.Pool.default";
const MIBS_DIR: &str = "mibs";
const MODEL_FILE: &str = "model.json";
const ALL_MIBS_FILE: &str = "MIBs_all";
const INTERFACE_GRAPH_FILE: &str = "nemo_intf.dot";
const TOPOLOGY_FILE: &str = "devices.dot";

fn print_result(result: Option<Value>) {
    if let Some(result) = result {
        println!("{}", pretty(&result));
    }
}

/// Default action: the device clock.
pub fn device_time(client: &SysbusClient) {
    if let Some(result) = client.request(TIME_TARGET) {
        println!("Livebox time: {}", text_at(&result, "/data/time"));
    }
}

/// Generic call: `target` in colon or call form plus `name=value` tokens.
pub fn call(client: &SysbusClient, target: &str, params: &[String], raw: bool) -> Result<()> {
    let call = RpcCall::parse(target)
        .and_then(|call| call.with_assignments(params))
        .with_context(|| format!("Invalid call '{target}'"))?;
    send(client, &call, raw)
}

pub fn shortcut(client: &SysbusClient, shortcut: &Shortcut, raw: bool) -> Result<()> {
    let call = RpcCall::parse(shortcut.target)
        .with_context(|| format!("Invalid shortcut target '{}'", shortcut.target))?
        .with_params(shortcut.parameters()?);
    send(client, &call, raw)
}

fn send<T: Transport>(client: &SysbusClient<T>, call: &RpcCall, raw: bool) -> Result<()> {
    if raw {
        let body = client
            .call_raw(call)
            .with_context(|| format!("{} failed", call.target()))?;
        let mut stdout = io::stdout().lock();
        stdout.write_all(String::from_utf8_lossy(&body).as_bytes())?;
        stdout.flush()?;
        return Ok(());
    }

    // a failed call has already been logged and leaves nothing to print
    print_result(client.call(call));
    Ok(())
}

pub fn list_shortcuts() {
    for shortcut in SHORTCUTS {
        println!(
            "{:<12} {:<40} {}",
            shortcut.name, shortcut.help, shortcut.target
        );
    }
}

pub fn write_config(path: &Path, config: &Config) -> Result<()> {
    config
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("configuration written to {}", path.display());
    println!("     url = {}", config.url);
    println!("    user = {}", config.user);
    println!("password = {}", config.password);
    Ok(())
}

pub fn info(client: &SysbusClient) {
    let mut lines = Vec::new();
    if let Some(result) = client.request("DeviceInfo:get") {
        lines.extend(report::device_info_lines(&result));
    }
    if let Some(result) = client.request("NMC:getWANStatus") {
        lines.extend(report::wan_lines(&result));
    }
    if let Some(result) = client.request("sysbus.VoiceService.VoiceApplication:listTrunks") {
        lines.extend(report::phone_number_lines(&result));
    }

    for line in lines {
        println!("{line}");
    }
}

pub fn wifi(client: &SysbusClient) {
    if let Some(result) = client.request("sysbus.NeMo.Intf.lan:getMIBs") {
        for line in report::wifi_lines(&result) {
            println!("{line}");
        }
    }
}

pub fn set_name(client: &SysbusClient, mac: &str, name: &str, sources: &[String]) {
    let mac = mac.to_uppercase();
    let target = format!("sysbus.Devices.Device.{mac}:setName");
    println!("set name {mac} {name}");

    if sources.is_empty() {
        print_result(client.request_with(&target, json!({ "name": name })));
    } else {
        for source in sources {
            print_result(client.request_with(&target, json!({ "name": name, "source": source })));
        }
    }
}

pub fn get_device(client: &SysbusClient, mac: &str) {
    let target = format!("sysbus/Devices/Device/{}:get", mac.to_uppercase());
    print_result(client.request(&target));
}

pub fn dhcp(client: &SysbusClient) {
    print_result(client.request(&format!("{STATIC_LEASES}:getStaticLeases")));
}

pub fn add_dhcp(client: &SysbusClient, mac: &str, ip: &str) {
    let mac = mac.to_uppercase();
    println!("set dhcp {mac} {ip}");
    print_result(client.request_with(
        &format!("{STATIC_LEASES}:addStaticLease"),
        json!({ "MACAddress": mac, "IPAddress": ip }),
    ));
}

/// Delete the given leases, or every lease for `all`.
pub fn delete_dhcp(client: &SysbusClient, macs: &[String]) {
    let macs: Vec<String> = if macs.first().map(String::as_str) == Some("all") {
        client
            .request(&format!("{STATIC_LEASES}:getStaticLeases"))
            .map(|leases| report::lease_macs(&leases))
            .unwrap_or_default()
    } else {
        macs.iter().map(|mac| mac.to_uppercase()).collect()
    };

    for mac in macs {
        println!("del dhcp {mac}");
        print_result(client.request_with(
            &format!("{STATIC_LEASES}:deleteStaticLease"),
            json!({ "MACAddress": mac }),
        ));
    }
}

pub fn hosts(client: &SysbusClient, filters: &[String]) {
    let Some(result) = client.request("sysbus/Hosts:getDevices") else {
        return;
    };
    let hosts = status_array(&result);

    if filters.is_empty() {
        for host in hosts {
            println!("{}", report::host_line(host));
        }
    } else {
        for host in report::filter_hosts(hosts, filters) {
            println!("{}", pretty(host));
        }
    }
}

pub fn ipv6(client: &SysbusClient) {
    if let Some(result) = client.request("sysbus.Devices:get") {
        for line in status_array(&result).iter().filter_map(report::ipv6_line) {
            println!("{line}");
        }
    }
}

/// Render the datamodel under `sysbus[.path]`, or save it whole for `raw`.
pub fn model(client: &SysbusClient, path: Option<&str>, depth: Option<i32>) -> Result<()> {
    if path == Some("raw") {
        let call = RpcCall::get("sysbus", None)?;
        let body = client
            .call_raw(&call)
            .context("Datamodel not accessible")?;
        fs::write(MODEL_FILE, body).with_context(|| format!("Failed to write {MODEL_FILE}"))?;
        println!("model written to {MODEL_FILE}");
        return Ok(());
    }

    let target = match path {
        Some(path) => format!("sysbus.{path}"),
        None => "sysbus".to_string(),
    };
    if let Some(result) = client.get(&target, depth) {
        model::render_all(&result, &mut io::stdout().lock())?;
    }
    Ok(())
}

fn get_mibs(client: &SysbusClient, intf: &str, params: Value) -> Option<Value> {
    client.request_with(&format!("sysbus.NeMo.Intf.{intf}:getMIBs"), params)
}

fn interfaces(client: &SysbusClient) -> Vec<String> {
    client
        .request_with("NeMo.Intf.lo:getIntfs", json!({ "traverse": "all" }))
        .map(|result| status_names(&result).into_iter().collect())
        .unwrap_or_default()
}

/// NeMo MIB queries: everything, `show`, `dump`, `save`, or one interface.
pub fn mibs(client: &SysbusClient, target: Option<&str>, mib: Option<&str>) -> Result<()> {
    match target {
        None => print_result(get_mibs(client, "data", json!({ "traverse": "all" }))),
        Some("show") => {
            let intfs = interfaces(client);
            let mibs: Vec<String> = get_mibs(client, "lo", json!({ "traverse": "this" }))
                .map(|result| status_names(&result).into_iter().collect())
                .unwrap_or_default();

            println!();
            println!("MIBs ({}): [{}]", mibs.len(), mibs.join(", "));
            println!();
            println!("Intf ({}): [{}]", intfs.len(), intfs.join(", "));
        }
        Some("dump") => dump_mibs(client)?,
        Some("save") => {
            if let Some(result) = get_mibs(client, "data", json!({ "traverse": "all" })) {
                fs::write(ALL_MIBS_FILE, pretty(&result))
                    .with_context(|| format!("Failed to write {ALL_MIBS_FILE}"))?;
                println!("MIBs written to {ALL_MIBS_FILE}");
            }
        }
        Some(intf) => {
            let params = match mib {
                Some(mib) => json!({ "traverse": "this", "mibs": mib }),
                None => json!({ "traverse": "this" }),
            };
            print_result(get_mibs(client, intf, params));
        }
    }
    Ok(())
}

/// Write `<intf>.dict`, `<intf>.model` and `<intf>.mib` for every interface.
fn dump_mibs(client: &SysbusClient) -> Result<()> {
    let dir = PathBuf::from(MIBS_DIR);
    fs::create_dir_all(&dir).with_context(|| format!("Failed to create {MIBS_DIR}/"))?;

    let intfs: Vec<String> = interfaces(client)
        .into_iter()
        .filter(|intf| {
            let usable = is_file_stem(intf);
            if !usable {
                warn!("Skipping interface with unusable name '{intf}'");
            }
            usable
        })
        .collect();

    for intf in &intfs {
        let Some(datamodel) = client.get(&format!("sysbus.NeMo.Intf.{intf}"), None) else {
            continue;
        };
        fs::write(dir.join(format!("{intf}.dict")), pretty(&datamodel))?;

        let mut rendered = Vec::new();
        let nodes = match &datamodel {
            Value::Array(nodes) => nodes.as_slice(),
            node => std::slice::from_ref(node),
        };
        for node in nodes {
            writeln!(
                rendered,
                "---------------------------------------------------------"
            )?;
            model::render(node, 0, &mut rendered)?;
        }
        fs::write(dir.join(format!("{intf}.model")), rendered)?;
    }

    for intf in &intfs {
        if let Some(result) = get_mibs(client, intf, json!({ "traverse": "this" })) {
            fs::write(dir.join(format!("{intf}.mib")), pretty(&result))?;
        }
    }

    info!("Dumped {} interfaces to {MIBS_DIR}/", intfs.len());
    Ok(())
}

/// Whether `name` can be used as a file name inside the dump directory.
fn is_file_stem(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

/// Forward UDP 1701 to `ip`; the web interface refuses this port.
pub fn add_l2tp_forwarding(client: &SysbusClient, ip: &str) {
    println!("adding udp1701 rule for internal address {ip}");
    print_result(client.request_with(
        "sysbus.Firewall:setPortForwarding",
        json!({
            "description": "udp1701",
            "persistent": true,
            "enable": true,
            "protocol": "17",
            "destinationIPAddress": ip,
            "internalPort": "1701",
            "externalPort": "1701",
            "origin": "webui",
            "sourceInterface": "data",
            "sourcePrefix": "",
            "id": "udp1701"
        }),
    ));
}

pub fn interface_graph(client: &SysbusClient) -> Result<()> {
    let Some(result) = client.request_with(
        "NeMo.Intf.lo:getMIBs",
        json!({ "traverse": "all", "mibs": "base" }),
    ) else {
        return Ok(());
    };
    let Some(Value::Object(base)) = result.pointer("/status/base") else {
        warn!("No base MIB in the answer");
        return Ok(());
    };

    write_graph(&graph::interface_graph(base), Path::new(INTERFACE_GRAPH_FILE))
}

pub fn topology(client: &SysbusClient, simple: bool) -> Result<()> {
    let Some(result) = client.request("Devices.Device.HGW:topology") else {
        return Ok(());
    };

    write_graph(
        &graph::topology_graph(status_array(&result), simple),
        Path::new(TOPOLOGY_FILE),
    )
}

fn write_graph(dot: &Digraph, path: &Path) -> Result<()> {
    dot.write(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    match graph::render_svg(path)? {
        Some(svg) => println!("graph written to {} and {}", path.display(), svg.display()),
        None => println!("graph written to {}", path.display()),
    }
    Ok(())
}

/// Local `scripts.js` if present, otherwise the device's copy.
fn read_scripts(config: &Config) -> Result<String> {
    let local = Path::new(SCRIPTS_FILE);
    if local.exists() {
        debug!("Reading {SCRIPTS_FILE}");
        return fs::read_to_string(local).with_context(|| format!("Failed to read {SCRIPTS_FILE}"));
    }

    debug!("Fetching {}{SCRIPTS_FILE}", config.url);
    let client = SysbusClient::new(HttpTransport::new(&config.url, config.timeout())?);
    client
        .fetch_text(SCRIPTS_FILE)
        .with_context(|| format!("Failed to fetch {}{SCRIPTS_FILE}", config.url))
}

pub fn scan(config: &Config, files: &[PathBuf]) -> Result<()> {
    let source = if files.is_empty() {
        read_scripts(config)?
    } else {
        let mut source = String::new();
        for file in files {
            if !file.exists() {
                warn!("Skipping missing file {}", file.display());
                continue;
            }
            debug!("Reading {}", file.display());
            source.push_str(
                &fs::read_to_string(file)
                    .with_context(|| format!("Failed to read {}", file.display()))?,
            );
        }
        source
    };

    for line in scripts::format_references(&scripts::scan(&source)?) {
        println!("{line}");
    }
    Ok(())
}

pub fn extract_files(config: &Config) -> Result<()> {
    let bundle = scripts::split_bundle(&read_scripts(config)?)?;
    println!("extracting {} files", bundle.modules.len());
    scripts::write_bundle(&bundle, Path::new("."))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sysbus_rpc::{Cookies, RequestHeaders, TransportError};

    /// Answers every request with the same body, or fails when there is none.
    struct Canned(Option<&'static str>);

    impl Canned {
        fn answer(&self) -> std::result::Result<Vec<u8>, TransportError> {
            self.0
                .map(|body| body.as_bytes().to_vec())
                .ok_or_else(|| TransportError::Status {
                    status: 503,
                    body: "unavailable".to_string(),
                })
        }
    }

    impl Transport for Canned {
        fn get(
            &self,
            _path: &str,
            _headers: &RequestHeaders,
        ) -> std::result::Result<Vec<u8>, TransportError> {
            self.answer()
        }

        fn post(
            &self,
            _path: &str,
            _headers: &RequestHeaders,
            _body: String,
        ) -> std::result::Result<Vec<u8>, TransportError> {
            self.answer()
        }

        fn authenticate(
            &self,
            _username: &str,
            _password: &str,
        ) -> std::result::Result<Vec<u8>, TransportError> {
            self.answer()
        }

        fn cookies(&self) -> Cookies {
            Cookies::new()
        }

        fn reset(&mut self, _cookies: &Cookies) -> std::result::Result<(), TransportError> {
            Ok(())
        }
    }

    fn time_call() -> RpcCall {
        RpcCall::parse("Time:getTime").unwrap()
    }

    #[test]
    fn test_failed_call_is_not_a_command_failure() {
        let unreachable = SysbusClient::new(Canned(None));
        assert!(send(&unreachable, &time_call(), false).is_ok());

        let refused = SysbusClient::new(Canned(Some(
            r#"{"result":{"status":null,"errors":[{"error":13}]}}"#,
        )));
        assert!(send(&refused, &time_call(), false).is_ok());

        let garbled = SysbusClient::new(Canned(Some("<html/>")));
        assert!(send(&garbled, &time_call(), false).is_ok());
    }

    #[test]
    fn test_raw_call_reports_transport_failure() {
        let unreachable = SysbusClient::new(Canned(None));
        assert!(send(&unreachable, &time_call(), true).is_err());

        let answering = SysbusClient::new(Canned(Some(r#"{"result":{"status":true}}"#)));
        assert!(send(&answering, &time_call(), true).is_ok());
    }

    #[test]
    fn test_interface_names_usable_as_files() {
        assert!(is_file_stem("wl0"));
        assert!(is_file_stem("bridge_vmulti"));
        assert!(!is_file_stem(""));
        assert!(!is_file_stem(".."));
        assert!(!is_file_stem("../etc"));
        assert!(!is_file_stem("a\\b"));
    }
}
