use std::path::Path;

/// Role a weights file plays in the Flux pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactRole {
    Transformer,
    TextEncoder,
    Vae,
}

impl std::fmt::Display for ArtifactRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactRole::Transformer => write!(f, "transformer"),
            ArtifactRole::TextEncoder => write!(f, "text encoder"),
            ArtifactRole::Vae => write!(f, "vae"),
        }
    }
}

/// A known weights file the full pipeline can run with.
#[derive(Debug, Clone)]
pub struct ArtifactDef {
    pub role: ArtifactRole,
    pub file_name: &'static str,
}

/// Every weights file the Flux pipeline recognizes, grouped by role.
/// A role is satisfied when any one of its variants is on disk.
pub static ARTIFACT_CATALOG: &[ArtifactDef] = &[
    // Transformer variants
    ArtifactDef {
        role: ArtifactRole::Transformer,
        file_name: "flux1-dev.safetensors",
    },
    ArtifactDef {
        role: ArtifactRole::Transformer,
        file_name: "flux1-dev-fp8.safetensors",
    },
    ArtifactDef {
        role: ArtifactRole::Transformer,
        file_name: "flux1-schnell.safetensors",
    },
    // Text encoders
    ArtifactDef {
        role: ArtifactRole::TextEncoder,
        file_name: "clip_l.safetensors",
    },
    ArtifactDef {
        role: ArtifactRole::TextEncoder,
        file_name: "t5xxl_fp8_e4m3fn.safetensors",
    },
    ArtifactDef {
        role: ArtifactRole::TextEncoder,
        file_name: "t5xxl_fp16.safetensors",
    },
    // VAE
    ArtifactDef {
        role: ArtifactRole::Vae,
        file_name: "flux_vae.safetensors",
    },
];

pub const ALL_ROLES: [ArtifactRole; 3] = [
    ArtifactRole::Transformer,
    ArtifactRole::TextEncoder,
    ArtifactRole::Vae,
];

impl ArtifactDef {
    pub fn by_role(role: ArtifactRole) -> impl Iterator<Item = &'static ArtifactDef> {
        ARTIFACT_CATALOG.iter().filter(move |a| a.role == role)
    }
}

/// Roles for which no weights variant exists under `models_dir`.
pub fn missing_roles(models_dir: &Path) -> Vec<ArtifactRole> {
    ALL_ROLES
        .iter()
        .copied()
        .filter(|role| !ArtifactDef::by_role(*role).any(|a| models_dir.join(a.file_name).is_file()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_dir_is_missing_everything() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = missing_roles(tmp.path());
        assert_eq!(missing.len(), 3);
    }

    #[test]
    fn one_variant_satisfies_a_role() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("clip_l.safetensors"), b"").unwrap();
        let missing = missing_roles(tmp.path());
        assert!(!missing.contains(&ArtifactRole::TextEncoder));
        assert!(missing.contains(&ArtifactRole::Transformer));
        assert!(missing.contains(&ArtifactRole::Vae));
    }

    #[test]
    fn catalog_covers_all_roles() {
        for role in ALL_ROLES {
            assert!(ArtifactDef::by_role(role).count() > 0);
        }
    }
}
