use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::hierarchy;
use crate::model::{DetailOutput, SwiftUiOutput, TreeOutput};
use crate::platform;
use crate::resolver;
use crate::snapshot::Snapshot;
use crate::swiftui;

/// Freshness window for the on-disk hierarchy document. A capture older
/// than this is re-fetched.
pub const CACHE_TTL: Duration = Duration::from_secs(3 * 60);

/// Sentinel the agent embeds in its diagnostics when the target was not
/// launched with the view-debug instrumentation flag.
const VIEW_DEBUG_SENTINEL: &str = "SWIFTUI_VIEW_DEBUG_NOT_SET";

const HIERARCHY_SCRIPT: &str = include_str!("../scripts/fetch_hierarchy.py");
const SUBTREE_SCRIPT: &str = include_str!("../scripts/fetch_subtree.py");
const FRONTMOST_SCRIPT: &str = include_str!("../scripts/fetch_frontmost.py");

/// Target selection for a fetch: app name (or `.vantagerc` fallback)
/// plus an optional simulator device selector.
#[derive(Clone, Debug, Default)]
pub struct Target {
    pub app: Option<String>,
    pub device: Option<String>,
}

impl Target {
    fn resolve(&self) -> Result<(String, String)> {
        let name = platform::resolve_app_name(self.app.as_deref())?;
        let device = platform::resolve_device(self.device.as_deref());
        Ok((name, device))
    }
}

/// Requested declarative-subtree rendering for detail output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SubtreeRequest {
    #[default]
    None,
    Compact,
    Full,
}

pub fn hierarchy_path() -> PathBuf {
    std::env::temp_dir().join("vantage_hierarchy.bplist")
}

fn subtree_path() -> PathBuf {
    std::env::temp_dir().join("vantage_subtree.json")
}

fn frontmost_path() -> PathBuf {
    std::env::temp_dir().join("vantage_frontmost.txt")
}

/// Writes the embedded lldb command scripts to a temp directory and
/// returns it. Overwrites any previous extraction.
fn extract_scripts() -> Result<PathBuf> {
    let dir = std::env::temp_dir().join("vantage_lldb");
    fs::create_dir_all(&dir)?;
    fs::write(dir.join("fetch_hierarchy.py"), HIERARCHY_SCRIPT)?;
    fs::write(dir.join("fetch_subtree.py"), SUBTREE_SCRIPT)?;
    fs::write(dir.join("fetch_frontmost.py"), FRONTMOST_SCRIPT)?;
    Ok(dir)
}

fn attach(target: &Target) -> Result<(u32, PathBuf)> {
    let (name, device) = target.resolve()?;
    let pid = platform::find_process(&name, &device)?;
    tracing::info!(%name, pid, "attaching to process");
    let scripts = extract_scripts()?;
    Ok((pid, scripts))
}

/// Returns the cached hierarchy document when its mtime falls within
/// the freshness window.
pub fn cached_hierarchy(ttl: Duration) -> Option<PathBuf> {
    let path = hierarchy_path();
    let modified = fs::metadata(&path).ok()?.modified().ok()?;
    let age = modified.elapsed().ok()?;
    (age <= ttl).then_some(path)
}

/// Attaches to the target and captures a fresh hierarchy snapshot.
pub fn fetch_hierarchy(target: &Target) -> Result<Snapshot> {
    let (pid, scripts) = attach(target)?;
    let out = hierarchy_path();

    let run = platform::run_debugger(
        pid,
        &[
            format!("command script import {}/fetch_hierarchy.py", scripts.display()),
            format!("fetch_hierarchy {}", out.display()),
        ],
    )?;
    if !run.ok {
        return Err(Error::Agent(format!("hierarchy capture failed: {}", run.output)));
    }
    if !out.exists() {
        return Err(Error::Agent(
            "failed to fetch view hierarchy (document not created)".to_string(),
        ));
    }

    Snapshot::decode_file(&out)
}

/// Captures a hierarchy snapshot narrowed to the frontmost view
/// controller's subtree when the agent can resolve it.
pub fn fetch_hierarchy_frontmost(target: &Target) -> Result<Snapshot> {
    let (pid, scripts) = attach(target)?;
    let out = hierarchy_path();
    let front = frontmost_path();
    let _ = fs::remove_file(&front);

    let run = platform::run_debugger(
        pid,
        &[
            format!("command script import {}/fetch_hierarchy.py", scripts.display()),
            format!("command script import {}/fetch_frontmost.py", scripts.display()),
            format!("fetch_hierarchy {}", out.display()),
            format!("fetch_frontmost {}", front.display()),
        ],
    )?;
    if !run.ok {
        return Err(Error::Agent(format!("hierarchy capture failed: {}", run.output)));
    }
    if !out.exists() {
        return Err(Error::Agent(
            "failed to fetch view hierarchy (document not created)".to_string(),
        ));
    }

    let mut snapshot = Snapshot::decode_file(&out)?;
    if let Ok(raw) = fs::read_to_string(&front) {
        let address = raw.trim();
        if !address.is_empty() {
            if let Some(node) = snapshot.find_by_address(address) {
                snapshot.views = vec![node.clone()];
            }
        }
    }
    Ok(snapshot)
}

/// Fetches the declarative subtree hosted at `address` and returns the
/// raw JSON bytes. The subtree runs in its own debugger session to
/// avoid language-switch issues after ObjC expressions.
pub fn fetch_subtree(target: &Target, address: &str) -> Result<Vec<u8>> {
    let (pid, scripts) = attach(target)?;
    let out = subtree_path();

    let run = platform::run_debugger(
        pid,
        &[
            format!("command script import {}/fetch_subtree.py", scripts.display()),
            format!("fetch_subtree {} {}", address, out.display()),
        ],
    )?;
    if !run.ok {
        if run.output.contains(VIEW_DEBUG_SENTINEL) {
            return Err(Error::Protocol(
                "SWIFTUI_VIEW_DEBUG=287 is not set in the target process.\n\n\
                 Launch the app with the environment variable:\n\n\
                 \x20 export SIMCTL_CHILD_SWIFTUI_VIEW_DEBUG=287\n\
                 \x20 xcrun simctl terminate booted <BUNDLE_ID>\n\
                 \x20 xcrun simctl launch booted <BUNDLE_ID>"
                    .to_string(),
            ));
        }
        tracing::debug!(output = %run.output, "debugger output for subtree fetch");
        return Err(Error::Agent("failed to fetch declarative subtree".to_string()));
    }

    let bytes = fs::read(&out)
        .map_err(|_| Error::Agent("failed to read subtree document".to_string()))?;
    if let Some(message) = swiftui::extract_error(&bytes) {
        return Err(Error::Protocol(format!("subtree retrieval failed: {}", message)));
    }
    Ok(bytes)
}

/// Fetches the hierarchy (frontmost-narrowed when asked) and projects
/// the navigation tree.
pub fn run_tree(target: &Target, max_depth: i32, frontmost: bool) -> Result<TreeOutput> {
    let snapshot = if frontmost {
        fetch_hierarchy_frontmost(target)?
    } else {
        fetch_hierarchy(target)?
    };

    let depth = if max_depth > 0 {
        max_depth
    } else {
        hierarchy::UNBOUNDED_DEPTH
    };

    let resolved = resolver::resolve_snapshot_names(&snapshot);
    Ok(hierarchy::build_tree(&snapshot, depth, resolved.as_ref()))
}

/// Builds the detail projection for one address, reusing the on-disk
/// capture when fresh. The declarative subtree is attached only for
/// hosting nodes when requested; its failures degrade to a stderr note.
pub fn run_detail(target: &Target, address: &str, subtree: SubtreeRequest) -> Result<DetailOutput> {
    let path = match cached_hierarchy(CACHE_TTL) {
        Some(path) => {
            tracing::debug!("using cached hierarchy document");
            path
        }
        None => {
            fetch_hierarchy(target)?;
            hierarchy_path()
        }
    };

    let snapshot = Snapshot::decode_file(&path)?;
    let node = snapshot
        .find_by_address(address)
        .ok_or_else(|| Error::not_found("view", address))?;

    let resolved = resolver::resolve_snapshot_names(&snapshot);
    let uikit = hierarchy::build_detail_with_snapshot(node, &snapshot.classmap, resolved.as_ref());

    let mut detail = DetailOutput {
        uikit,
        swiftui: None,
    };

    if detail.uikit.is_hosting_view && subtree != SubtreeRequest::None {
        match fetch_subtree(target, address) {
            Ok(bytes) => {
                let compact = subtree == SubtreeRequest::Compact;
                match swiftui::parse(&bytes, compact) {
                    Ok(tree) if !tree.is_empty() => {
                        detail.swiftui = Some(SwiftUiOutput { tree });
                    }
                    Ok(_) => {}
                    Err(err) => {
                        tracing::warn!(%err, "declarative subtree is not available");
                        eprintln!("\nNote: the declarative subtree could not be parsed.");
                    }
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to fetch declarative subtree");
                eprintln!("\nNote: the declarative subtree could not be retrieved. {}", err);
            }
        }
    }

    Ok(detail)
}
