use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::diagram::model::{ElementData, MetadataPatch};

/// Read-only summary of one threat statement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatSummary {
    pub id: String,
    #[serde(default)]
    pub numeric_id: i64,
    #[serde(default)]
    pub statement: Option<String>,
}

impl ThreatSummary {
    pub fn caption(&self) -> String {
        let text = self.statement.as_deref().filter(|s| !s.is_empty()).unwrap_or("(no statement)");
        format!("T-{:03} {}", self.numeric_id, text)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    List(Vec<ThreatSummary>),
    Export { threats: Vec<ThreatSummary> },
}

/// Ordered list of threats the diagram elements can reference.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ThreatCatalog {
    threats: Vec<ThreatSummary>,
}

impl ThreatCatalog {
    pub fn new(threats: Vec<ThreatSummary>) -> Self {
        Self { threats }
    }

    /// Accepts a bare array or an exported workspace with a `threats` field.
    pub fn from_json(s: &str) -> anyhow::Result<Self> {
        let threats = match serde_json::from_str::<CatalogFile>(s)? {
            CatalogFile::List(list) => list,
            CatalogFile::Export { threats } => threats,
        };
        Ok(Self { threats })
    }

    pub fn load_from_path(path: &Path) -> anyhow::Result<Self> {
        let mut f = File::open(path)?;
        let mut buf = String::new();
        f.read_to_string(&mut buf)?;
        Self::from_json(&buf)
    }

    pub fn threats(&self) -> &[ThreatSummary] { &self.threats }
    pub fn len(&self) -> usize { self.threats.len() }
    pub fn is_empty(&self) -> bool { self.threats.is_empty() }

    pub fn get(&self, id: &str) -> Option<&ThreatSummary> {
        self.threats.iter().find(|t| t.id == id)
    }
}

/// Threats referenced by `data`, in catalog order. Unknown ids are skipped.
pub fn linked_threats<'a>(catalog: &'a ThreatCatalog, data: &ElementData) -> Vec<&'a ThreatSummary> {
    catalog
        .threats()
        .iter()
        .filter(|t| data.selected_threats.iter().any(|id| *id == t.id))
        .collect()
}

/// Patch that links `threat_id` to the element, or unlinks it if already linked.
pub fn toggle_threat(data: &ElementData, threat_id: &str) -> MetadataPatch {
    let mut selected = data.selected_threats.clone();
    if let Some(pos) = selected.iter().position(|id| id == threat_id) {
        selected.remove(pos);
    } else {
        selected.push(threat_id.to_string());
    }
    MetadataPatch { selected_threats: Some(selected), ..Default::default() }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = r#"{
        "schema": 1,
        "threats": [
            {"id": "a", "numericId": 1, "statement": "An attacker can spoof the user"},
            {"id": "b", "numericId": 2}
        ]
    }"#;

    #[test]
    fn loads_both_catalog_shapes() {
        let catalog = ThreatCatalog::from_json(EXPORT).unwrap();
        assert_eq!(catalog.len(), 2);
        let list = ThreatCatalog::from_json(r#"[{"id":"x"}]"#).unwrap();
        assert_eq!(list.get("x").map(|t| t.numeric_id), Some(0));
        assert!(ThreatCatalog::from_json(r#"{"nope":true}"#).is_err());
    }

    #[test]
    fn toggling_links_and_unlinks() {
        let catalog = ThreatCatalog::from_json(EXPORT).unwrap();
        let mut data = ElementData::default();
        data.apply(&toggle_threat(&data, "b"));
        data.apply(&toggle_threat(&data, "a"));
        let ids: Vec<&str> = linked_threats(&catalog, &data).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        data.apply(&toggle_threat(&data, "a"));
        assert_eq!(data.selected_threats, vec!["b".to_string()]);
    }

    #[test]
    fn caption_falls_back_without_statement() {
        let catalog = ThreatCatalog::from_json(EXPORT).unwrap();
        assert_eq!(catalog.threats()[1].caption(), "T-002 (no statement)");
    }
}
