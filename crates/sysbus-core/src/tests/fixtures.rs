//! Test fixtures and helpers

use serde_json::{Value, json};

/// A `Time` datamodel node as returned by `GET sysbus/Time`.
pub fn time_node() -> Value {
    json!({
        "objectInfo": {
            "keyPath": "Time",
            "key": "",
            "name": "Time"
        },
        "functions": [
            {"name": "getTime", "arguments": [
                {"name": "time", "attributes": {"out": true, "mandatory": true}}
            ]},
            {"name": "setNTP", "arguments": [
                {"name": "server", "attributes": {"mandatory": true}},
                {"name": "port"}
            ]}
        ],
        "parameters": [
            {"name": "Enable", "type": "bool", "value": true},
            {"name": "Status", "type": "string", "value": "Synchronized"}
        ],
        "errors": [
            {"error": 13, "info": "Time", "description": "Permission denied"}
        ],
        "instances": [],
        "children": []
    })
}

/// A node with two instances and one child.
pub fn hosts_node() -> Value {
    json!({
        "objectInfo": {"keyPath": "sysbus", "key": "Hosts", "name": "Hosts"},
        "functions": [],
        "parameters": [],
        "instances": [
            {
                "objectInfo": {"keyPath": "Hosts.Host", "key": "1", "name": "1"},
                "functions": [{"name": "get", "arguments": []}],
                "parameters": [{"name": "HostName", "type": "string", "value": "nas"}]
            },
            {
                "objectInfo": {"keyPath": "Hosts.Host", "key": "2", "name": "2"},
                "functions": [],
                "parameters": []
            }
        ],
        "tags": ["a", "b", "c"],
        "children": [time_node()]
    })
}

/// A `Hosts:getDevices` result.
pub fn hosts_result() -> Value {
    json!({
        "status": [
            {
                "physAddress": "AA:BB:CC:DD:EE:01",
                "layer2Interface": "eth1",
                "active": true,
                "ipAddress": "192.168.1.10",
                "hostName": "nas",
                "clientID": "01:aa:bb:cc:dd:ee:01"
            },
            {
                "physAddress": "AA:BB:CC:DD:EE:02",
                "layer2Interface": "wl0",
                "active": false,
                "ipAddress": "192.168.1.11",
                "hostName": "phone",
                "clientID": ""
            }
        ]
    })
}

/// A `Devices.Device.HGW:topology` result.
pub fn topology_result() -> Value {
    json!({
        "status": [
            {
                "Key": "HGW",
                "Name": "Livebox",
                "Active": true,
                "Index": 1,
                "DeviceType": "SAH HGW",
                "LastConnection": "",
                "Tags": "lan",
                "Children": [
                    {
                        "Key": "AA:BB:CC:DD:EE:01",
                        "Name": "nas",
                        "Active": false,
                        "IPAddress": "192.168.1.10",
                        "ClientID": "ignored",
                        "Names": [],
                        "Children": []
                    }
                ]
            }
        ]
    })
}
