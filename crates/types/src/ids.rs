//! Report and patient identifiers.
//!
//! ## Canonical report id
//! Report ids are UUID v4 values rendered as **32 lowercase hexadecimal characters** (no
//! hyphens), the same value `Uuid::new_v4().simple().to_string()` produces. Ids coming from
//! request paths must already be canonical; [`ReportId::parse`] rejects anything else.
//!
//! Persisted reports are sharded by id: `parent/<id[0..2]>/<id[2..4]>/<id>.json`.
//!
//! ## Patient id
//! Sessions are anonymous. The patient id is the first 16 hex characters of the SHA-256
//! digest of the session id, so the same browser session always maps to the same
//! record set without the server holding anything that identifies a person.

use crate::IdError;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::{fmt, str::FromStr};
use uuid::Uuid;

const PATIENT_ID_LEN: usize = 16;

/// Canonical report identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReportId(Uuid);

impl Default for ReportId {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportId {
    /// Allocates a fresh report id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Validates an externally supplied id. Hyphenated or uppercase forms are rejected.
    pub fn parse(input: &str) -> Result<Self, IdError> {
        if !Self::is_canonical(input) {
            return Err(IdError::InvalidReportId(input.to_string()));
        }
        Uuid::parse_str(input)
            .map(Self)
            .map_err(|_| IdError::InvalidReportId(input.to_string()))
    }

    pub fn is_canonical(input: &str) -> bool {
        input.len() == 32
            && input
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }

    /// Returns `parent_dir/<s1>/<s2>/<id>.json`.
    pub fn sharded_file(&self, parent_dir: &Path) -> PathBuf {
        let canonical = self.to_string();
        let s1 = &canonical[0..2];
        let s2 = &canonical[2..4];
        parent_dir
            .join(s1)
            .join(s2)
            .join(format!("{}.json", canonical))
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for ReportId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReportId::parse(s)
    }
}

impl serde::Serialize for ReportId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for ReportId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ReportId::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Pseudonymous patient identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PatientId(String);

impl PatientId {
    /// Derives the patient id for a session id.
    pub fn from_session(session_id: &str) -> Self {
        let digest = Sha256::digest(session_id.as_bytes());
        let mut hex = hex::encode(digest);
        hex.truncate(PATIENT_ID_LEN);
        Self(hex)
    }

    /// Validates a previously derived patient id, e.g. when loading persisted reports.
    pub fn parse(input: &str) -> Result<Self, IdError> {
        let ok = input.len() == PATIENT_ID_LEN
            && input
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        if ok {
            Ok(Self(input.to_string()))
        } else {
            Err(IdError::InvalidPatientId(input.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl serde::Serialize for PatientId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for PatientId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        PatientId::parse(&s).map_err(serde::de::Error::custom)
    }
}
