use portal_core::domains::registrants::models::SectorTable;
use uuid::Uuid;

/// A fresh prefix no other test uses, e.g. `ZQBHKDA`
pub fn unique_prefix() -> String {
    let letters: String = Uuid::new_v4()
        .as_bytes()
        .iter()
        .take(6)
        .map(|b| char::from(b'A' + b % 26))
        .collect();
    format!("Z{}", letters)
}

/// Built-in sector table with `ofw` remapped to `prefix`
pub fn sectors_with_ofw_prefix(prefix: &str) -> SectorTable {
    SectorTable::from_json_str(&format!(
        r#"{{"ofw": {{"prefix": "{}", "category": "livelihood"}}}}"#,
        prefix
    ))
    .expect("valid sector override")
}
