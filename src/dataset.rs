//! Three Kingdoms demo graph
//!
//! Loaded through the engine's upsert operations, so loading twice leaves the graph unchanged.

use crate::engine::{EngineError, EngineResult, GraphEngine};
use crate::graph::{NodeId, PropertyMap};
use crate::props;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::info;

/// Label every demo node carries
pub const CHARACTER_LABEL: &str = "Character";

/// Merge key of demo nodes
pub const CHARACTER_KEY: &str = "character_id";

struct Character {
    id: i64,
    name: &'static str,
    faction: &'static str,
    color: &'static str,
}

struct Tie {
    from: i64,
    to: i64,
    label: &'static str,
}

const SHU: (&str, &str) = ("Thục Hán", "#4CAF50");
const WEI: (&str, &str) = ("Tào Ngụy", "#2196F3");
const WU: (&str, &str) = ("Đông Ngô", "#FF9800");
const OTHER: (&str, &str) = ("Khác", "#9C27B0");

const fn character(id: i64, name: &'static str, faction: (&'static str, &'static str)) -> Character {
    Character {
        id,
        name,
        faction: faction.0,
        color: faction.1,
    }
}

const fn tie(from: i64, to: i64, label: &'static str) -> Tie {
    Tie { from, to, label }
}

const CHARACTERS: [Character; 37] = [
    character(1, "Lưu Bị", SHU),
    character(2, "Quan Vũ", SHU),
    character(3, "Trương Phi", SHU),
    character(4, "Triệu Vân", SHU),
    character(5, "Mã Siêu", SHU),
    character(6, "Hoàng Trung", SHU),
    character(7, "Gia Cát Lượng", SHU),
    character(8, "Bàng Thống", SHU),
    character(9, "Khương Duy", SHU),
    character(10, "Ngụy Diên", SHU),
    character(20, "Tào Tháo", WEI),
    character(21, "Tào Phi", WEI),
    character(22, "Tào Chân", WEI),
    character(23, "Tư Mã Ý", WEI),
    character(24, "Hạ Hầu Đôn", WEI),
    character(25, "Hạ Hầu Uyên", WEI),
    character(26, "Trương Liêu", WEI),
    character(27, "Hứa Chử", WEI),
    character(28, "Từ Hoảng", WEI),
    character(29, "Vu Cấm", WEI),
    character(40, "Tôn Kiên", WU),
    character(41, "Tôn Sách", WU),
    character(42, "Tôn Quyền", WU),
    character(43, "Chu Du", WU),
    character(44, "Lỗ Túc", WU),
    character(45, "Lữ Mông", WU),
    character(46, "Lục Tốn", WU),
    character(47, "Cam Ninh", WU),
    character(48, "Hoàng Cái", WU),
    character(49, "Đinh Phụng", WU),
    character(60, "Đổng Trác", OTHER),
    character(61, "Lữ Bố", OTHER),
    character(62, "Điêu Thuyền", OTHER),
    character(63, "Hoa Đà", OTHER),
    character(64, "Viên Thiệu", OTHER),
    character(65, "Viên Thuật", OTHER),
    character(66, "Trương Tùng", OTHER),
];

const TIES: [Tie; 36] = [
    tie(1, 2, "Nghĩa huynh"),
    tie(1, 3, "Nghĩa huynh"),
    tie(2, 3, "Nghĩa huynh"),
    tie(1, 4, "Chủ - tướng"),
    tie(1, 5, "Chủ - tướng"),
    tie(1, 6, "Chủ - tướng"),
    tie(1, 10, "Chủ - tướng"),
    tie(1, 7, "Quân sư"),
    tie(1, 8, "Quân sư"),
    tie(7, 9, "Kế thừa"),
    tie(20, 21, "Cha - con"),
    tie(20, 22, "Chủ - tướng"),
    tie(20, 23, "Quân sư"),
    tie(20, 24, "Chủ - tướng"),
    tie(20, 25, "Chủ - tướng"),
    tie(20, 26, "Chủ - tướng"),
    tie(20, 27, "Chủ - tướng"),
    tie(20, 28, "Chủ - tướng"),
    tie(20, 29, "Chủ - tướng"),
    tie(40, 41, "Cha - con"),
    tie(41, 42, "Anh - em"),
    tie(42, 43, "Chủ - tướng"),
    tie(42, 44, "Chủ - tướng"),
    tie(42, 45, "Chủ - tướng"),
    tie(42, 46, "Chủ - tướng"),
    tie(42, 47, "Chủ - tướng"),
    tie(42, 48, "Chủ - tướng"),
    tie(42, 49, "Chủ - tướng"),
    tie(60, 61, "Chủ - tướng"),
    tie(61, 62, "Tình cảm"),
    tie(64, 65, "Anh - em"),
    tie(1, 43, "Đồng minh Xích Bích"),
    tie(42, 1, "Đồng minh Xích Bích"),
    tie(1, 20, "Kẻ thù"),
    tie(20, 42, "Kẻ thù"),
    tie(61, 20, "Từng phục vụ"),
];

/// Relationship type for a Vietnamese relationship label; unknown labels map to `RELATED_TO`
pub fn relationship_type_for(label: &str) -> &'static str {
    match label {
        "Nghĩa huynh" => "SWORN_BROTHER",
        "Chủ - tướng" => "SERVES_AS_GENERAL",
        "Quân sư" => "SERVES_AS_ADVISOR",
        "Kế thừa" => "SUCCESSOR",
        "Cha - con" => "FATHER_SON",
        "Anh - em" => "SIBLINGS",
        "Tình cảm" => "ROMANTIC",
        "Đồng minh Xích Bích" => "RED_CLIFF_ALLY",
        "Kẻ thù" => "ENEMY",
        "Từng phục vụ" => "FORMERLY_SERVED",
        _ => "RELATED_TO",
    }
}

/// Counts of what a load touched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DatasetSummary {
    pub characters: usize,
    pub relationships: usize,
    pub factions: BTreeMap<String, usize>,
    pub relationship_types: BTreeMap<String, usize>,
}

/// Upsert the Three Kingdoms characters and their relationships
pub async fn load_three_kingdoms(engine: &GraphEngine) -> EngineResult<DatasetSummary> {
    info!("Loading Three Kingdoms dataset ({} characters)", CHARACTERS.len());

    let mut summary = DatasetSummary::default();
    let mut ids: HashMap<i64, NodeId> = HashMap::with_capacity(CHARACTERS.len());

    for character in &CHARACTERS {
        let properties = props! {
            CHARACTER_KEY => character.id,
            "name" => character.name,
            "faction" => character.faction,
            "color" => character.color,
        };
        let node = engine.upsert_node(CHARACTER_LABEL, CHARACTER_KEY, properties).await?;
        ids.insert(character.id, node.id);
        *summary.factions.entry(character.faction.to_string()).or_default() += 1;
        summary.characters += 1;
    }

    for tie in &TIES {
        let (Some(&from), Some(&to)) = (ids.get(&tie.from), ids.get(&tie.to)) else {
            return Err(EngineError::NotFound(format!(
                "character {} or {} missing from the dataset",
                tie.from, tie.to
            )));
        };
        let rel_type = relationship_type_for(tie.label);
        let properties: PropertyMap = props! {
            "type" => tie.label,
            "description" => tie.label,
        };
        engine.upsert_relationship(rel_type, from, to, properties).await?;
        *summary.relationship_types.entry(rel_type.to_string()).or_default() += 1;
        summary.relationships += 1;
    }

    for (faction, count) in &summary.factions {
        info!("  {}: {} characters", faction, count);
    }
    for (rel_type, count) in &summary.relationship_types {
        info!("  {}: {} relationships", rel_type, count);
    }
    info!(
        "Loaded {} characters across {} factions and {} relationships of {} types",
        summary.characters,
        summary.factions.len(),
        summary.relationships,
        summary.relationship_types.len()
    );

    Ok(summary)
}
