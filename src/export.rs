use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::diagram::model::ElementData;
use crate::diagram::store::DiagramStore;

#[derive(Serialize)]
struct ElementOut<'a> {
    id: String,
    element: &'static str,
    #[serde(rename = "type")]
    kind: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    target: Option<String>,
    #[serde(flatten)]
    data: &'a ElementData,
}

fn elements(store: &DiagramStore) -> Vec<ElementOut<'_>> {
    let mut out = Vec::with_capacity(store.nodes().len() + store.edges().len());
    for n in store.nodes() {
        out.push(ElementOut { id: n.id.to_string(), element: "node", kind: n.kind.tag(), source: None, target: None, data: &n.data });
    }
    for e in store.edges() {
        out.push(ElementOut {
            id: e.id.to_string(),
            element: "edge",
            kind: &e.kind,
            source: Some(e.source.to_string()),
            target: Some(e.target.to_string()),
            data: &e.data,
        });
    }
    out
}

// Every node then every edge, with its metadata
pub fn export_elements_json(store: &DiagramStore, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() { std::fs::create_dir_all(parent)?; }
    let mut f = File::create(path)?;
    serde_json::to_writer_pretty(&mut f, &elements(store))?;
    f.write_all(b"\n")?;
    Ok(())
}

pub fn export_elements_csv(store: &DiagramStore, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() { std::fs::create_dir_all(parent)?; }
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record([
        "id", "element", "type", "source", "target", "name", "description", "out_of_scope",
        "scope_reason", "data_tags", "tech_tags", "security_tags", "tags", "threats",
    ])?;
    for el in elements(store) {
        let d = el.data;
        wtr.write_record([
            el.id,
            el.element.to_string(),
            el.kind.to_string(),
            el.source.unwrap_or_default(),
            el.target.unwrap_or_default(),
            d.name.clone(),
            d.description.clone(),
            d.out_of_scope.to_string(),
            d.scope_reason.clone(),
            d.data_tags.join(";"),
            d.tech_tags.join(";"),
            d.security_tags.join(";"),
            d.tags.join(";"),
            d.selected_threats.join(";"),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::model::{MetadataPatch, NodeKind};

    fn sample() -> DiagramStore {
        let mut store = DiagramStore::new();
        let a = store.add_node(NodeKind::Actor).id;
        let b = store.add_node(NodeKind::Datastore).id;
        let e = store.connect(a, b).unwrap().id;
        store.select(e);
        store.update_selected_metadata(&MetadataPatch {
            data_tags: Some(vec!["pii".into(), "secrets".into()]),
            ..Default::default()
        });
        store
    }

    #[test]
    fn csv_has_one_row_per_element() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("elements.csv");
        export_elements_csv(&sample(), &path).unwrap();
        let mut rdr = csv::Reader::from_path(&path).unwrap();
        let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(&rows[2][1], "edge");
        assert_eq!(&rows[2][9], "pii;secrets");
    }

    #[test]
    fn json_flattens_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("elements.json");
        export_elements_json(&sample(), &path).unwrap();
        let v: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(v[0]["type"], "actor");
        assert_eq!(v[2]["name"], "Data");
        assert!(v[0].get("source").is_none());
    }
}
