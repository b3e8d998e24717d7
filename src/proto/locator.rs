use std::path::{Path, PathBuf};

use regex::Regex;
use walkdir::{DirEntry, WalkDir};

use super::Surface;

/// Known location of a service definition, relative to the repository root
#[derive(Debug, Clone, Copy)]
pub struct ProtoMapping {
    pub service: &'static str,
    pub path: &'static str,
}

/// Proto layout of one API surface
#[derive(Debug, Clone, Copy)]
pub struct SurfaceProtos {
    pub surface: Surface,
    /// Which sibling repository holds the protos
    pub repo_key: &'static str,
    /// Directory scanned when the static table misses
    pub search_root: &'static str,
    pub services: &'static [ProtoMapping],
}

/// Manually maintained fast path, consulted before scanning the tree
pub static PROTO_FILE_MAPS: &[SurfaceProtos] = &[
    SurfaceProtos {
        surface: Surface::Admin,
        repo_key: "redpanda",
        search_root: "proto/redpanda/core/admin",
        services: &[
            ProtoMapping {
                service: "BrokerService",
                path: "proto/redpanda/core/admin/v2/broker.proto",
            },
            ProtoMapping {
                service: "ClusterService",
                path: "proto/redpanda/core/admin/v2/cluster.proto",
            },
            ProtoMapping {
                service: "ShadowLinkService",
                path: "proto/redpanda/core/admin/v2/shadow_link.proto",
            },
        ],
    },
    SurfaceProtos {
        surface: Surface::ControlPlane,
        repo_key: "cloudv2",
        search_root: "proto/public/cloud/redpanda/api/controlplane",
        services: &[
            ProtoMapping {
                service: "ClusterService",
                path: "proto/public/cloud/redpanda/api/controlplane/v1/cluster.proto",
            },
            ProtoMapping {
                service: "NetworkService",
                path: "proto/public/cloud/redpanda/api/controlplane/v1/network.proto",
            },
            ProtoMapping {
                service: "NetworkPeeringService",
                path: "proto/public/cloud/redpanda/api/controlplane/v1/network_peering.proto",
            },
            ProtoMapping {
                service: "OperationService",
                path: "proto/public/cloud/redpanda/api/controlplane/v1/operation.proto",
            },
            ProtoMapping {
                service: "RegionService",
                path: "proto/public/cloud/redpanda/api/controlplane/v1/region.proto",
            },
            ProtoMapping {
                service: "ResourceGroupService",
                path: "proto/public/cloud/redpanda/api/controlplane/v1/resource_group.proto",
            },
            ProtoMapping {
                service: "ServerlessClusterService",
                path: "proto/public/cloud/redpanda/api/controlplane/v1/serverless_cluster.proto",
            },
            ProtoMapping {
                service: "ServerlessRegionService",
                path: "proto/public/cloud/redpanda/api/controlplane/v1/serverless_region.proto",
            },
        ],
    },
];

const SKIPPED_DIRS: [&str; 4] = ["node_modules", ".git", "vendor", "bazel-out"];

pub fn surface_protos(surface: Surface) -> &'static SurfaceProtos {
    PROTO_FILE_MAPS
        .iter()
        .find(|entry| entry.surface == surface)
        .unwrap_or(&PROTO_FILE_MAPS[0])
}

fn is_skipped(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIPPED_DIRS.contains(&name))
}

/// Every `.proto` file under the surface's search root
pub fn proto_files(repo_root: &Path, surface: Surface) -> Vec<PathBuf> {
    let root = repo_root.join(surface_protos(surface).search_root);
    WalkDir::new(&root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_skipped(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && e.path().extension().is_some_and(|ext| ext == "proto"))
        .map(|e| e.into_path())
        .collect()
}

/// Find the file defining `service`, or `None` when nothing matches
pub fn find_proto_file(repo_root: &Path, surface: Surface, service: &str) -> Option<PathBuf> {
    let protos = surface_protos(surface);
    if let Some(mapping) = protos.services.iter().find(|m| m.service == service) {
        let candidate = repo_root.join(mapping.path);
        if candidate.is_file() {
            return Some(candidate);
        }
        tracing::debug!("Mapped path {:?} for {} is stale, scanning", candidate, service);
    }

    let pattern = Regex::new(&format!(r"\bservice\s+{}\s*\{{", regex::escape(service))).ok()?;
    let found = proto_files(repo_root, surface).into_iter().find(|path| {
        std::fs::read_to_string(path)
            .map(|text| pattern.is_match(&text))
            .unwrap_or(false)
    });
    if found.is_none() {
        tracing::debug!("No proto file defines service {}", service);
    }
    found
}
