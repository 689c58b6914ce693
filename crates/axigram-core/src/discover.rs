//! Locate the `ordered_output.nc4` files of a database directory and
//! classify them by mesh component.
//!
//! The directory tree below the root is scanned at most three levels deep.
//! Valid layouts: one or two reciprocal meshes (PX and/or PZ), or exactly
//! the four elemental moment-tensor meshes of a forward run.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ExtractError, Result};

/// File name of a wavefield database inside its component directory.
pub const DB_FILE_NAME: &str = "ordered_output.nc4";

const MAX_SCAN_DEPTH: usize = 3;

/// Mesh component of one database file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum MeshTag {
    /// Reciprocal horizontal-force mesh.
    Px,
    /// Reciprocal vertical-force mesh.
    Pz,
    /// Forward M_zz elemental mesh.
    Mzz,
    /// Forward M_xx + M_yy elemental mesh.
    MxxPMyy,
    /// Forward M_xz / M_yz elemental mesh.
    MxzMyz,
    /// Forward M_xy / (M_xx - M_yy) elemental mesh.
    MxyMxxMMyy,
}

impl MeshTag {
    const ALL: [Self; 6] = [
        Self::Px,
        Self::Pz,
        Self::Mzz,
        Self::MxxPMyy,
        Self::MxzMyz,
        Self::MxyMxxMMyy,
    ];

    /// Directory-name pattern identifying this component.
    #[must_use]
    pub const fn pattern(self) -> &'static str {
        match self {
            Self::Px => "PX",
            Self::Pz => "PZ",
            Self::Mzz => "MZZ",
            Self::MxxPMyy => "MXX_P_MYY",
            Self::MxzMyz => "MXZ_MYZ",
            Self::MxyMxxMMyy => "MXY_MXX_M_MYY",
        }
    }

    /// Whether this component belongs to a reciprocal database.
    #[must_use]
    pub const fn is_reciprocal(self) -> bool {
        matches!(self, Self::Px | Self::Pz)
    }
}

fn scan(dir: &Path, depth: usize, found: &mut Vec<PathBuf>) -> Result<()> {
    let candidate = dir.join(DB_FILE_NAME);
    if candidate.is_file() {
        found.push(candidate);
    }
    if depth >= MAX_SCAN_DEPTH {
        return Ok(());
    }
    let entries = match fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return Ok(()), // unreadable subtrees are skipped, not fatal
    };
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            scan(&entry.path(), depth + 1, found)?;
        }
    }
    Ok(())
}

/// Find and classify every database file below `root`.
///
/// # Errors
/// `NotFound` when nothing is found, `BadDatabaseLayout` for an invalid
/// cardinality, duplicate components, or a mixed/untaggable layout.
pub fn find_databases(root: &Path) -> Result<BTreeMap<MeshTag, PathBuf>> {
    let mut found = Vec::new();
    scan(root, 0, &mut found)?;

    if found.is_empty() {
        return Err(ExtractError::NotFound {
            path: root.to_path_buf(),
        });
    }
    if ![1, 2, 4].contains(&found.len()) {
        return Err(ExtractError::BadDatabaseLayout(format!(
            "expected 1, 2 or 4 database files below '{}', found {}",
            root.display(),
            found.len()
        )));
    }

    let mut tagged = BTreeMap::new();
    for file in &found {
        let tag = classify(root, file)?;
        if tagged.insert(tag, file.clone()).is_some() {
            return Err(ExtractError::BadDatabaseLayout(format!(
                "more than one file for component {}",
                tag.pattern()
            )));
        }
    }

    let reciprocal = tagged.keys().any(|t| t.is_reciprocal());
    let forward = tagged.keys().any(|t| !t.is_reciprocal());
    if reciprocal && forward {
        return Err(ExtractError::BadDatabaseLayout(
            "mixed reciprocal and forward components".into(),
        ));
    }
    if forward && tagged.len() != 4 {
        return Err(ExtractError::BadDatabaseLayout(
            "forward databases need all four elemental moment-tensor meshes".into(),
        ));
    }
    if reciprocal && tagged.len() > 2 {
        return Err(ExtractError::BadDatabaseLayout(
            "reciprocal databases have at most the PX and PZ meshes".into(),
        ));
    }
    Ok(tagged)
}

/// Identify the component of one found file from its path below the root.
fn classify(root: &Path, file: &Path) -> Result<MeshTag> {
    let rel = file.strip_prefix(root).unwrap_or(file);
    for part in rel.iter() {
        let part = part.to_string_lossy();
        // Exact component-name match; substrings ("PX" inside "MXY_…")
        // must not classify.
        for tag in MeshTag::ALL {
            if part == tag.pattern() {
                return Ok(tag);
            }
        }
    }
    Err(ExtractError::BadDatabaseLayout(format!(
        "cannot classify '{}': no component directory (PX, PZ, MZZ, …) in its path",
        file.display()
    )))
}
