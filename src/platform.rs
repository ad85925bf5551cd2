use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const RC_FILE: &str = ".vantagerc";

/// Locates an executable on PATH, for availability checks before
/// shelling out to optional tools.
pub fn find_in_path(name: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// Parses the `.vantagerc` file in the current directory: KEY=VALUE
/// lines, `#` comments. Missing or unreadable files yield an empty map.
pub fn read_rc() -> HashMap<String, String> {
    let Ok(cwd) = std::env::current_dir() else {
        return HashMap::new();
    };
    read_rc_at(&cwd)
}

pub fn read_rc_at(dir: &Path) -> HashMap<String, String> {
    let Ok(contents) = fs::read_to_string(dir.join(RC_FILE)) else {
        return HashMap::new();
    };
    let mut map = HashMap::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            map.insert(key.to_string(), value.to_string());
        }
    }
    map
}

/// Resolves the target app name from the flag, falling back to
/// `APP_NAME` in `.vantagerc`.
pub fn resolve_app_name(flag: Option<&str>) -> Result<String> {
    if let Some(name) = flag {
        if !name.is_empty() {
            return Ok(name.to_string());
        }
    }
    let rc = read_rc();
    if let Some(name) = rc.get("APP_NAME") {
        if !name.is_empty() {
            return Ok(name.clone());
        }
    }
    Err(Error::Agent(format!(
        "APP_NAME not specified. Use --app <name> or set APP_NAME in {}",
        RC_FILE
    )))
}

/// Returns the simulator selector to use: the flag value as-is, or
/// "booted" when unset.
pub fn resolve_device(flag: Option<&str>) -> String {
    match flag {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => "booted".to_string(),
    }
}

/// A running app process on a simulator device.
#[derive(Clone, Debug, Serialize)]
pub struct SimProcess {
    pub pid: u32,
    pub app: String,
    pub bundle_id: String,
    pub device_udid: String,
    pub device_name: String,
}

fn core_sim_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"CoreSimulator/Devices/([0-9A-Fa-f-]+)/").expect("udid regex"))
}

fn app_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r".*/([^/]+)\.app/").expect("app name regex"))
}

fn app_path_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(/\S+\.app)/").expect("app path regex"))
}

/// Lists all app processes running on simulator devices, by scanning
/// `ps` output for simulator app paths.
pub fn list_processes() -> Result<Vec<SimProcess>> {
    let device_map = build_device_map()?;
    let output = Command::new("ps")
        .args(["-eo", "pid,args"])
        .output()
        .map_err(|err| Error::Agent(format!("failed to run ps: {}", err)))?;
    Ok(parse_processes(
        &String::from_utf8_lossy(&output.stdout),
        &device_map,
    ))
}

/// Parses `ps -eo pid,args` output into simulator app processes.
/// The system `launchd_sim` processes are excluded.
pub fn parse_processes(ps_output: &str, device_map: &HashMap<String, String>) -> Vec<SimProcess> {
    let mut procs = Vec::new();
    for line in ps_output.trim().lines() {
        let line = line.trim();
        if !line.contains("CoreSimulator/Devices/") || line.contains("launchd_sim") {
            continue;
        }
        let Some(udid) = core_sim_re()
            .captures(line)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
        else {
            continue;
        };
        let Some(app) = app_name_re()
            .captures(line)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
        else {
            continue;
        };
        let mut fields = line.split_whitespace();
        let Some(pid) = fields.next().and_then(|f| f.parse::<u32>().ok()) else {
            continue;
        };
        if fields.next().is_none() {
            continue;
        }

        let device_name = device_map
            .get(&udid)
            .cloned()
            .unwrap_or_else(|| "unknown".to_string());

        let bundle_id = app_path_re()
            .captures(line)
            .and_then(|c| c.get(1))
            .map(|m| read_bundle_id(Path::new(m.as_str())))
            .unwrap_or_default();

        procs.push(SimProcess {
            pid,
            app,
            bundle_id,
            device_udid: udid,
            device_name,
        });
    }
    procs
}

/// Reads CFBundleIdentifier from the Info.plist inside an .app bundle.
/// Degrades to an empty string on any failure.
fn read_bundle_id(app_path: &Path) -> String {
    #[derive(Deserialize)]
    struct Info {
        #[serde(rename = "CFBundleIdentifier")]
        bundle_id: String,
    }
    fs::read(app_path.join("Info.plist"))
        .ok()
        .and_then(|data| plist::from_bytes::<Info>(&data).ok())
        .map(|info| info.bundle_id)
        .unwrap_or_default()
}

fn build_device_map() -> Result<HashMap<String, String>> {
    let output = Command::new("xcrun")
        .args(["simctl", "list", "devices", "--json"])
        .output()
        .map_err(|err| Error::Agent(format!("failed to run simctl: {}", err)))?;

    #[derive(Deserialize)]
    struct DeviceList {
        devices: HashMap<String, Vec<Device>>,
    }
    #[derive(Deserialize)]
    struct Device {
        name: String,
        udid: String,
    }

    let list: DeviceList = serde_json::from_slice(&output.stdout)
        .map_err(|err| Error::Agent(format!("failed to parse simctl JSON: {}", err)))?;
    let mut map = HashMap::new();
    for devices in list.devices.into_values() {
        for device in devices {
            map.insert(device.udid, device.name);
        }
    }
    Ok(map)
}

/// Filters processes by app name and device. The device value matches
/// either UDID or name; empty or "booted" matches all devices.
pub fn match_processes<'a>(
    procs: &'a [SimProcess],
    name: &str,
    device: &str,
) -> Vec<&'a SimProcess> {
    procs
        .iter()
        .filter(|p| p.app == name)
        .filter(|p| {
            device.is_empty() || device == "booted" || p.device_udid == device || p.device_name == device
        })
        .collect()
}

/// Resolves an app name (plus optional device selector) to a PID.
/// When multiple processes match, the first is used and a warning is
/// logged.
pub fn find_process(name: &str, device: &str) -> Result<u32> {
    let procs = list_processes().map_err(|_| Error::not_found("process", name))?;
    let matched = match_processes(&procs, name, device);

    let Some(first) = matched.first() else {
        return Err(Error::not_found("process", name));
    };

    if matched.len() > 1 {
        let pids: Vec<String> = matched
            .iter()
            .map(|p| format!("{}({})", p.pid, p.device_name))
            .collect();
        tracing::warn!(name, ?pids, selected = first.pid, "multiple processes found");
    }

    Ok(first.pid)
}

/// Result of a debugger batch run. `ok` is false when lldb exited
/// non-zero; `output` carries combined stdout/stderr either way so
/// callers can inspect diagnostic sentinels.
#[derive(Debug)]
pub struct DebuggerRun {
    pub ok: bool,
    pub output: String,
}

/// Executes lldb in batch mode against the given PID, one `-o` per
/// command, always detaching afterwards.
pub fn run_debugger(pid: u32, commands: &[String]) -> Result<DebuggerRun> {
    if find_in_path("lldb").is_none() {
        return Err(Error::Dependency { tool: "lldb" });
    }

    let mut cmd = Command::new("lldb");
    cmd.args(["-p", &pid.to_string(), "--batch"]);
    for command in commands {
        cmd.args(["-o", command]);
    }
    cmd.args(["-o", "detach", "-o", "quit"]);

    let output = cmd
        .output()
        .map_err(|err| Error::Agent(format!("lldb failed to start: {}", err)))?;

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));

    Ok(DebuggerRun {
        ok: output.status.success(),
        output: combined,
    })
}
