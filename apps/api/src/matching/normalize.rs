//! Profile Normalizer: canonical tokens for skills, sectors, stages and engagement types.
//!
//! Every function here is pure and idempotent. Synonym targets are themselves
//! canonical, so feeding a normalized token back in returns it unchanged.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::models::profile::{EngagementType, StartupStage, TokenSet};

/// Skill alias → canonical token. Canonical tokens must not appear as aliases of another entry.
static SKILL_SYNONYMS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let groups: &[(&str, &[&str])] = &[
        ("javascript", &["js", "java script", "ecmascript", "es6"]),
        ("typescript", &["ts", "type script"]),
        ("nodejs", &["node", "node.js", "node js"]),
        ("react", &["reactjs", "react.js", "react js"]),
        ("vue", &["vuejs", "vue.js", "vue js"]),
        ("angular", &["angularjs", "angular.js"]),
        ("nextjs", &["next.js", "next js"]),
        ("python", &["py", "python3", "python 3"]),
        ("golang", &["go", "go lang"]),
        ("csharp", &["c#", "c sharp", ".net", "dotnet"]),
        ("cplusplus", &["c++", "cpp"]),
        ("postgresql", &["postgres", "pg", "postgre sql"]),
        ("mongodb", &["mongo", "mongo db"]),
        ("mysql", &["my sql", "mariadb"]),
        ("kubernetes", &["k8s", "kube"]),
        ("docker", &["docker container", "containerization"]),
        ("aws", &["amazon web services"]),
        ("gcp", &["google cloud", "google cloud platform"]),
        ("azure", &["microsoft azure"]),
        ("machine learning", &["ml"]),
        ("artificial intelligence", &["ai"]),
        ("ui/ux design", &["ui/ux", "ux", "ui design", "ux design"]),
        ("flutter", &["flutter sdk"]),
        ("react native", &["react-native", "rn"]),
        ("django", &["django rest framework", "drf"]),
        ("fastapi", &["fast api"]),
        ("digital marketing", &["online marketing"]),
        ("product management", &["pm", "product manager"]),
    ];
    build_alias_map(groups)
});

static SECTOR_SYNONYMS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let groups: &[(&str, &[&str])] = &[
        ("fintech", &["fin tech", "fin-tech", "financial technology", "payments"]),
        ("edtech", &["ed tech", "ed-tech", "education technology", "education"]),
        ("healthtech", &["health tech", "health-tech", "healthcare", "medtech"]),
        ("agritech", &["agri tech", "agri-tech", "agriculture", "agtech"]),
        ("ecommerce", &["e-commerce", "e commerce", "online retail"]),
        ("saas", &["software as a service", "b2b saas"]),
        ("cleantech", &["clean tech", "climate tech", "climatetech"]),
        ("logistics", &["supply chain", "delivery"]),
        ("tourism", &["travel", "traveltech", "travel tech"]),
    ];
    build_alias_map(groups)
});

fn build_alias_map(
    groups: &[(&'static str, &'static [&'static str])],
) -> HashMap<&'static str, &'static str> {
    let mut map = HashMap::new();
    for (canonical, aliases) in groups {
        for alias in *aliases {
            map.insert(*alias, *canonical);
        }
    }
    map
}

/// Trims, lowercases and collapses internal whitespace.
fn fold(raw: &str) -> String {
    raw.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

fn canonicalize(raw: &str, table: &HashMap<&'static str, &'static str>) -> String {
    let folded = fold(raw);
    match table.get(folded.as_str()) {
        Some(canonical) => (*canonical).to_string(),
        None => folded,
    }
}

/// Canonical skill token. Unknown skills pass through folded.
pub fn normalize_skill(raw: &str) -> String {
    canonicalize(raw, &SKILL_SYNONYMS)
}

/// Canonical sector token. Unknown sectors pass through folded.
pub fn normalize_sector(raw: &str) -> String {
    canonicalize(raw, &SECTOR_SYNONYMS)
}

/// Folded label with separators unified to `_`, e.g. "Early-Traction" → "early_traction".
fn label_token(raw: &str) -> String {
    fold(raw).replace(['-', ' '], "_")
}

pub fn normalize_stage(raw: &str) -> Option<StartupStage> {
    let token = label_token(raw);
    let canonical = match token.as_str() {
        "pre_seed" | "preseed" | "ideation" | "concept" => "idea",
        "prototype" | "beta" | "minimum_viable_product" => "mvp",
        "traction" | "early_stage" | "earlytraction" | "seed" => "early_traction",
        "scale" | "scaling" | "scale_up" | "scaleup" | "series_a" => "growth",
        other => other,
    };
    StartupStage::from_token(canonical)
}

pub fn normalize_engagement(raw: &str) -> Option<EngagementType> {
    let token = label_token(raw);
    let canonical = match token.as_str() {
        "fulltime" => "full_time",
        "parttime" => "part_time",
        "freelance" | "contractor" => "contract",
        "intern" => "internship",
        "co_founder" => "cofounder",
        other => other,
    };
    EngagementType::from_token(canonical)
}

/// Normalizes a raw list into a deduplicated token set, dropping blanks.
pub fn token_set<I, S>(raw: I, normalize: fn(&str) -> String) -> TokenSet
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter()
        .map(|s| normalize(s.as_ref()))
        .filter(|t| !t.is_empty())
        .collect()
}
